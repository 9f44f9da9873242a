//! App configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_PORT` or `PORT` - Listen port (`BACKEND_PORT` wins when both are set)
//! - `SHOPIFY_API_KEY` - App client ID from the Partner Dashboard
//! - `SHOPIFY_API_SECRET` - App client secret (signs OAuth callbacks and session tokens)
//! - `SHOPIFY_APP_URL` (or `HOST`) - Public URL the app is served from
//!
//! ## Optional
//! - `BACKEND_HOST` - Bind address (default: 0.0.0.0)
//! - `NODE_ENV` - `production` serves `frontend/dist`, anything else serves `frontend/`
//! - `SCOPES` - Comma-separated access scopes (default: `write_products,write_checkouts`)
//! - `SHOPIFY_API_VERSION` - REST Admin API version (default: 2024-01)
//! - `SHOPIFY_EMBEDDED` - Whether the app renders inside Shopify admin (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sample rates (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use crate::session::Scopes;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
/// Entropy floor for Shopify-issued hex secrets; hex tops out at 4 bits/char.
const MIN_HEX_ENTROPY_BITS_PER_CHAR: f64 = 2.5;
/// Hex digits in a Shopify-issued app secret.
const SHOPIFY_SECRET_HEX_LEN: usize = 32;
const DEFAULT_API_VERSION: &str = "2024-01";
const DEFAULT_SCOPES: &str = "write_products,write_checkouts";

/// Default path that begins the OAuth flow.
pub const DEFAULT_AUTH_PATH: &str = "/api/auth";
/// Default path Shopify redirects back to after authorization.
pub const DEFAULT_CALLBACK_PATH: &str = "/api/auth/callback";
/// Frontend route that breaks out of the admin iframe before starting OAuth.
pub const EXIT_IFRAME_PATH: &str = "/exitiframe";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Runtime environment, selected by `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Directory the frontend is served from in this environment.
    #[must_use]
    pub fn static_path(self) -> PathBuf {
        match self {
            Self::Production => PathBuf::from("frontend/dist"),
            Self::Development => PathBuf::from("frontend/"),
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// App configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Runtime environment
    pub environment: Environment,
    /// Directory holding the built frontend (`index.html` + assets)
    pub static_path: PathBuf,
    /// Shopify app configuration
    pub shopify: ShopifyAppConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app credentials and OAuth settings.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID (a.k.a. API key)
    pub api_key: String,
    /// App client secret
    pub api_secret: SecretString,
    /// Public app URL, without trailing slash
    pub app_url: String,
    /// Scopes requested during OAuth and required of stored sessions
    pub scopes: Scopes,
    /// REST Admin API version (e.g., 2024-01)
    pub api_version: String,
    /// Path that begins OAuth
    pub auth_path: String,
    /// OAuth callback path
    pub callback_path: String,
    /// Whether the app is embedded in Shopify admin
    pub embedded: bool,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("app_url", &self.app_url)
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field("auth_path", &self.auth_path)
            .field("callback_path", &self.callback_path)
            .field("embedded", &self.embedded)
            .finish()
    }
}

impl ShopifyAppConfig {
    /// Absolute OAuth callback URL registered with Shopify.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.app_url, self.callback_path)
    }

    /// Absolute URL that (re)starts OAuth for a shop.
    #[must_use]
    pub fn auth_url_for(&self, shop: &giftlink_core::ShopDomain) -> String {
        format!(
            "{}{}?shop={}",
            self.app_url,
            self.auth_path,
            urlencoding::encode(shop.as_str())
        )
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_vars<F>(vars: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get_env_or_default(&vars, "BACKEND_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_HOST".to_string(), e.to_string()))?;
        let port = get_port(&vars)?;
        let environment = Environment::from_node_env(vars("NODE_ENV").as_deref());

        let shopify = ShopifyAppConfig::from_vars(&vars)?;
        let sentry_dsn = vars("SENTRY_DSN");
        let sentry_environment = vars("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = vars("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = vars("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            environment,
            static_path: environment.static_path(),
            shopify,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the path of the SPA entry point.
    #[must_use]
    pub fn index_html_path(&self) -> PathBuf {
        self.static_path.join("index.html")
    }
}

impl ShopifyAppConfig {
    fn from_vars<F>(vars: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_url = vars("SHOPIFY_APP_URL")
            .or_else(|| vars("HOST"))
            .ok_or_else(|| ConfigError::MissingEnvVar("SHOPIFY_APP_URL".to_string()))?;
        let app_url = url::Url::parse(&app_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_APP_URL".to_string(), e.to_string()))?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let embedded = match get_env_or_default(vars, "SHOPIFY_EMBEDDED", "true")
            .to_ascii_lowercase()
            .as_str()
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "SHOPIFY_EMBEDDED".to_string(),
                    format!("expected true/false, got '{other}'"),
                ));
            }
        };

        Ok(Self {
            api_key: get_required_env(vars, "SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret(vars, "SHOPIFY_API_SECRET")?,
            app_url,
            scopes: Scopes::parse(&get_env_or_default(vars, "SCOPES", DEFAULT_SCOPES)),
            api_version: get_env_or_default(vars, "SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            embedded,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get the listen port from `BACKEND_PORT`, falling back to `PORT`.
///
/// Empty values count as unset.
fn get_port<F>(vars: &F) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let set = |key: &str| vars(key).filter(|v| !v.trim().is_empty());
    let (key, value) = match set("BACKEND_PORT") {
        Some(value) => ("BACKEND_PORT", value),
        None => (
            "PORT",
            set("PORT").ok_or_else(|| ConfigError::MissingEnvVar("BACKEND_PORT".to_string()))?,
        ),
    };

    value
        .trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required environment variable.
fn get_required_env<F>(vars: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    vars(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default<F>(vars: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    vars(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let min_entropy = if is_shopify_issued_secret(secret) {
        MIN_HEX_ENTROPY_BITS_PER_CHAR
    } else {
        MIN_ENTROPY_BITS_PER_CHAR
    };
    let entropy = shannon_entropy(secret);
    if entropy < min_entropy {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {min_entropy:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Whether `secret` has the shape of a Shopify app secret: 32 lowercase
/// hex digits, optionally behind an `shpss_` prefix.
fn is_shopify_issued_secret(secret: &str) -> bool {
    let hex = secret.strip_prefix("shpss_").unwrap_or(secret);
    hex.len() == SHOPIFY_SECRET_HEX_LEN
        && hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Load and validate a secret from environment.
fn get_validated_secret<F>(vars: &F, key: &str) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = get_required_env(vars, key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
