//! Newtype IDs for Shopify resource references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different resource types.

/// Errors that can occur when parsing a resource ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input is neither a positive integer nor a GID.
    #[error("id must be a positive integer or a Shopify GID")]
    Invalid,
    /// The input is a GID for a different resource type.
    #[error("expected a {expected} GID, got {actual}")]
    WrongResource {
        /// Resource type this ID wraps.
        expected: &'static str,
        /// Resource type found in the GID.
        actual: String,
    },
}

/// Prefix shared by all Shopify global IDs.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Macro to define a type-safe Shopify resource ID.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]` (plain JSON number)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` accepting `"123"` or `"gid://shopify/<Resource>/123"`
/// - `gid()` rendering the global ID form
/// - `From<u64>`, `Into<u64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use giftlink_core::define_id;
/// define_id!(OrderId, "Order");
///
/// let id = OrderId::parse("gid://shopify/Order/42").unwrap();
/// assert_eq!(id.as_u64(), 42);
/// assert_eq!(id.gid(), "gid://shopify/Order/42");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Shopify resource name used in GIDs.
            pub const RESOURCE: &'static str = $resource;

            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Parse a numeric ID or a GID for this resource.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty, not a positive
            /// integer, or a GID for another resource type.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::parse_resource_id(s, Self::RESOURCE).map(Self)
            }

            /// Render the Shopify global ID (`gid://shopify/<Resource>/<id>`).
            #[must_use]
            pub fn gid(&self) -> String {
                format!("{}{}/{}", $crate::types::id::GID_PREFIX, Self::RESOURCE, self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Shared parsing logic for `define_id!` types.
///
/// # Errors
///
/// See [`IdError`].
pub fn parse_resource_id(s: &str, resource: &'static str) -> Result<u64, IdError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(IdError::Empty);
    }

    let numeric = match s.strip_prefix(GID_PREFIX) {
        Some(rest) => {
            let (kind, id) = rest.split_once('/').ok_or(IdError::Invalid)?;
            if kind != resource {
                return Err(IdError::WrongResource {
                    expected: resource,
                    actual: kind.to_string(),
                });
            }
            // GIDs may carry query params, e.g. `?inventory_item_id=...`
            id.split('?').next().unwrap_or_default()
        }
        None => s,
    };

    match numeric.parse::<u64>() {
        Ok(0) | Err(_) => Err(IdError::Invalid),
        Ok(id) => Ok(id),
    }
}

define_id!(ProductId, "Product");
define_id!(VariantId, "ProductVariant");
