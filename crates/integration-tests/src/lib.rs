//! Integration tests for Giftlink.
//!
//! Tests drive the full router in-process with `tower::ServiceExt::oneshot`.
//! Shopify is replaced by [`FakeShopify`]; everything else (sessions,
//! middleware, static files) is the real thing.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p giftlink-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use giftlink_app::config::AppConfig;
use giftlink_app::routes;
use giftlink_app::session::{MemorySessionStorage, Scopes, SessionStorage, ShopSession};
use giftlink_app::shopify::oauth::{SessionTokenClaims, sign_query};
use giftlink_app::shopify::{
    AccessTokenResponse, Checkout, NewCheckout, NewProduct, Product, ProductCount, ShopifyApi,
    ShopifyError, Variant,
};
use giftlink_app::state::AppState;
use giftlink_core::{Price, ProductId, ShopDomain, VariantId};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::SecretString;
use tower::ServiceExt;

/// App client secret used to sign callbacks and session tokens.
pub const API_SECRET: &str = "4f3c2b1a9e8d7c6b5a4f3e2d1c0b9a87";
/// App client ID.
pub const API_KEY: &str = "a1b2c3d4e5f6";
/// Public app URL.
pub const APP_URL: &str = "https://giftlink.ngrok.app";
/// Shop with an installed session in most tests.
pub const SHOP: &str = "acme.myshopify.com";
/// base64 of `admin.shopify.com/store/acme`.
pub const HOST: &str = "YWRtaW4uc2hvcGlmeS5jb20vc3RvcmUvYWNtZQ";
/// Checkout URL returned by the fake.
pub const CHECKOUT_URL: &str = "https://acme.myshopify.com/1/checkouts/b490a9220cd1";
/// Contents of the SPA shell.
pub const INDEX_HTML: &str = "<!doctype html><div id=\"app\"></div>";

// =============================================================================
// Fake Shopify
// =============================================================================

/// Scriptable [`ShopifyApi`] double.
pub struct FakeShopify {
    products: Mutex<HashMap<ProductId, Product>>,
    count: Mutex<u64>,
    failure: Mutex<Option<ShopifyError>>,
    checkout_url: Mutex<Option<String>>,
    exchange_fails: Mutex<bool>,
    exchanged_codes: Mutex<Vec<String>>,
    created: Mutex<Vec<NewProduct>>,
    checkouts: Mutex<Vec<NewCheckout>>,
}

impl Default for FakeShopify {
    fn default() -> Self {
        Self {
            products: Mutex::new(HashMap::new()),
            count: Mutex::new(0),
            failure: Mutex::new(None),
            checkout_url: Mutex::new(Some(CHECKOUT_URL.to_string())),
            exchange_fails: Mutex::new(false),
            exchanged_codes: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            checkouts: Mutex::new(Vec::new()),
        }
    }
}

impl FakeShopify {
    /// Add a product with the given variant IDs.
    pub fn add_product(&self, product_id: u64, variant_ids: &[u64]) {
        let id = ProductId::new(product_id);
        let variants = variant_ids
            .iter()
            .map(|&v| Variant {
                id: VariantId::new(v),
                product_id: Some(id),
                title: format!("Variant {v}"),
                price: Price::from_cents(2_500),
                sku: None,
                inventory_quantity: None,
                inventory_policy: None,
            })
            .collect();
        self.products.lock().unwrap().insert(
            id,
            Product {
                id,
                title: format!("Product {product_id}"),
                handle: None,
                status: Some("active".to_string()),
                vendor: None,
                product_type: None,
                variants,
            },
        );
    }

    pub fn set_count(&self, count: u64) {
        *self.count.lock().unwrap() = count;
    }

    /// Make every resource call fail with `error`.
    pub fn fail_with(&self, error: ShopifyError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn set_checkout_url(&self, url: Option<&str>) {
        *self.checkout_url.lock().unwrap() = url.map(String::from);
    }

    pub fn fail_exchange(&self) {
        *self.exchange_fails.lock().unwrap() = true;
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.exchanged_codes.lock().unwrap().clone()
    }

    pub fn created_products(&self) -> Vec<NewProduct> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_checkouts(&self) -> Vec<NewCheckout> {
        self.checkouts.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Result<(), ShopifyError> {
        match &*self.failure.lock().unwrap() {
            None => Ok(()),
            Some(ShopifyError::RateLimited(secs)) => Err(ShopifyError::RateLimited(*secs)),
            Some(ShopifyError::NotFound(what)) => Err(ShopifyError::NotFound(what.clone())),
            Some(other) => Err(ShopifyError::Api {
                status: 500,
                message: other.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ShopifyApi for FakeShopify {
    async fn exchange_code(
        &self,
        _shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, ShopifyError> {
        self.exchanged_codes.lock().unwrap().push(code.to_string());
        if *self.exchange_fails.lock().unwrap() {
            return Err(ShopifyError::OAuth("invalid_request".to_string()));
        }
        Ok(AccessTokenResponse {
            access_token: format!("shpat_{code}"),
            scope: "write_products,write_checkouts".to_string(),
        })
    }

    async fn product_count(&self, _session: &ShopSession) -> Result<ProductCount, ShopifyError> {
        self.take_failure()?;
        Ok(ProductCount {
            count: *self.count.lock().unwrap(),
        })
    }

    async fn get_product(
        &self,
        _session: &ShopSession,
        id: ProductId,
    ) -> Result<Product, ShopifyError> {
        self.take_failure()?;
        self.products
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id}")))
    }

    async fn create_product(
        &self,
        _session: &ShopSession,
        product: &NewProduct,
    ) -> Result<Product, ShopifyError> {
        self.created.lock().unwrap().push(product.clone());
        self.take_failure()?;
        Ok(Product {
            id: ProductId::new(7_000 + self.created.lock().unwrap().len() as u64),
            title: product.title.clone(),
            handle: None,
            status: Some("active".to_string()),
            vendor: None,
            product_type: None,
            variants: Vec::new(),
        })
    }

    async fn create_checkout(
        &self,
        _session: &ShopSession,
        checkout: &NewCheckout,
    ) -> Result<Checkout, ShopifyError> {
        self.checkouts.lock().unwrap().push(checkout.clone());
        self.take_failure()?;
        Ok(Checkout {
            token: "b490a9220cd14d7344024f4874f640a6".to_string(),
            web_url: self.checkout_url.lock().unwrap().clone(),
            total_price: None,
            currency: None,
        })
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A response collected into memory.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> &str {
        self.header(header::LOCATION.as_str()).unwrap()
    }

    /// `name=value` part of the session cookie, for sending back.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("giftlink_session="))
            .and_then(|v| v.split(';').next())
            .map(String::from)
    }
}

/// Router plus the fakes behind it.
pub struct TestContext {
    pub router: Router,
    pub shopify: Arc<FakeShopify>,
    pub sessions: Arc<MemorySessionStorage>,
    pub static_dir: PathBuf,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.static_dir);
    }
}

impl TestContext {
    /// Embedded app with the default scopes.
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// App configured with extra environment variables.
    pub fn with_vars(extra: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = [
            ("BACKEND_PORT", "8081"),
            ("SHOPIFY_API_KEY", API_KEY),
            ("SHOPIFY_API_SECRET", API_SECRET),
            ("SHOPIFY_APP_URL", APP_URL),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert((*k).to_string(), (*v).to_string());
        }

        let mut config = AppConfig::from_vars(|key| vars.get(key).cloned()).unwrap();
        let static_dir = create_static_dir();
        config.static_path.clone_from(&static_dir);

        let shopify = Arc::new(FakeShopify::default());
        let sessions = Arc::new(MemorySessionStorage::new());
        let state = AppState::with_services(config, shopify.clone(), sessions.clone());

        Self {
            router: routes::app(state),
            shopify,
            sessions,
            static_dir,
        }
    }

    /// Store an offline session for `shop` with the given scopes.
    pub async fn install(&self, shop: &str, scopes: &str) {
        let session = ShopSession::offline(
            ShopDomain::parse(shop).unwrap(),
            SecretString::from("shpat_installed"),
            Scopes::parse(scopes),
        );
        self.sessions.store_session(session).await.unwrap();
    }

    /// Store a fully scoped session for [`SHOP`].
    pub async fn install_default(&self) {
        self.install(SHOP, "write_products,write_checkouts").await;
    }

    pub async fn load_session(&self, shop: &str) -> Option<ShopSession> {
        let shop = ShopDomain::parse(shop).unwrap();
        self.sessions
            .load_session(&ShopSession::offline_id(&shop))
            .await
            .unwrap()
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// GET without credentials.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GET with an App Bridge session token for `shop`.
    pub async fn get_as(&self, uri: &str, shop: &str) -> TestResponse {
        self.get_with_token(uri, &session_token(shop, API_SECRET, 60))
            .await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Static directory with an SPA shell, one asset and a nested index file.
fn create_static_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("giftlink-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(dir.join("assets")).unwrap();
    std::fs::write(dir.join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(dir.join("assets/app.js"), "console.log('giftlink');").unwrap();
    std::fs::write(dir.join("assets/index.html"), "nested index").unwrap();
    dir
}

// =============================================================================
// Signing helpers
// =============================================================================

/// An App Bridge session token for `shop`, expiring `ttl_secs` from now.
pub fn session_token(shop: &str, secret: &str, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionTokenClaims {
        iss: format!("https://{shop}/admin"),
        dest: format!("https://{shop}"),
        aud: API_KEY.to_string(),
        sub: Some("42".to_string()),
        exp: now + ttl_secs,
        nbf: now - 10,
        iat: now - 10,
        jti: Some(uuid::Uuid::new_v4().to_string()),
        sid: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// OAuth callback query for `shop`, signed the way Shopify signs it.
pub fn signed_callback_query(shop: &str, state: &str, code: &str, timestamp: i64) -> String {
    let pairs: Vec<(String, String)> = [
        ("code", code.to_string()),
        ("host", HOST.to_string()),
        ("shop", shop.to_string()),
        ("state", state.to_string()),
        ("timestamp", timestamp.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let hmac = sign_query(&pairs, API_SECRET);

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &pairs {
        query.append_pair(k, v);
    }
    query.append_pair("hmac", &hmac);
    query.finish()
}

/// The `state` parameter of an authorize redirect.
pub fn state_from_authorize_url(location: &str) -> String {
    let url = url::Url::parse(location).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}
