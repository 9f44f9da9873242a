//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not a `*.myshopify.com` hostname.
    #[error("shop domain must look like your-store.myshopify.com")]
    Invalid,
}

/// A sanitized `*.myshopify.com` shop domain.
///
/// Every shop-scoped URL the app builds (OAuth redirects, REST endpoints,
/// CSP `frame-ancestors`) interpolates this value, so it only ever holds a
/// bare hostname.
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Shop handle starts with an ASCII letter or digit, then letters, digits, `-` or `_`
/// - Ends with `.myshopify.com`
/// - Stored lowercase; a leading `https://` / `http://` and trailing `/` are stripped
///
/// ## Examples
///
/// ```
/// use giftlink_core::ShopDomain;
///
/// assert!(ShopDomain::parse("my-store.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("https://My-Store.myshopify.com/").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("evil.com").is_err());
/// assert!(ShopDomain::parse("a.myshopify.com.evil.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a hostname.
    pub const MAX_LENGTH: usize = 255;

    /// Required hostname suffix.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or not a
    /// `*.myshopify.com` hostname.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        let handle = lower
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::Invalid)?;

        let mut chars = handle.chars();
        let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !starts_ok || !rest_ok {
            return Err(ShopDomainError::Invalid);
        }

        Ok(Self(lower))
    }

    /// Returns the shop domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `https://{shop}`.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("https://{}", self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_shops() {
        assert!(ShopDomain::parse("shop.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-shop.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my_shop1.myshopify.com").is_ok());
        assert!(ShopDomain::parse("1shop.myshopify.com").is_ok());
    }

    #[test]
    fn test_parse_normalizes() {
        let shop = ShopDomain::parse(" https://My-Shop.MyShopify.com/ ").unwrap();
        assert_eq!(shop.as_str(), "my-shop.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(ShopDomain::parse("https://"), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(250));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        assert_eq!(ShopDomain::parse("example.com"), Err(ShopDomainError::Invalid));
        assert_eq!(
            ShopDomain::parse("shop.myshopify.com.evil.com"),
            Err(ShopDomainError::Invalid)
        );
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::Invalid)
        );
        assert_eq!(
            ShopDomain::parse("-shop.myshopify.com"),
            Err(ShopDomainError::Invalid)
        );
        assert_eq!(
            ShopDomain::parse("sh op.myshopify.com"),
            Err(ShopDomainError::Invalid)
        );
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::Invalid)
        );
    }

    #[test]
    fn test_origin() {
        let shop = ShopDomain::parse("acme.myshopify.com").unwrap();
        assert_eq!(shop.origin(), "https://acme.myshopify.com");
    }

    #[test]
    fn test_serde_validates() {
        let shop: ShopDomain = serde_json::from_str("\"acme.myshopify.com\"").unwrap();
        assert_eq!(shop.as_str(), "acme.myshopify.com");
        assert!(serde_json::from_str::<ShopDomain>("\"evil.com\"").is_err());
        assert_eq!(
            serde_json::to_string(&shop).unwrap(),
            "\"acme.myshopify.com\""
        );
    }
}
