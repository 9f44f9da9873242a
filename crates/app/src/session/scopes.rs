//! Access scope sets.

use std::collections::BTreeSet;
use std::fmt;

/// A set of Shopify access scopes.
///
/// Shopify grants `read_x` implicitly with `write_x` and may return the
/// narrower form in the token response, so comparisons go through
/// [`Scopes::covers`] rather than string equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes {
    /// Scopes in request order, deduplicated.
    scopes: Vec<String>,
}

impl Scopes {
    /// Parse a comma-separated scope list. Whitespace and empty items are ignored.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut scopes: Vec<String> = Vec::new();
        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scopes.iter().any(|existing| existing == scope) {
                scopes.push(scope.to_string());
            }
        }
        Self { scopes }
    }

    /// Whether no scopes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterate over the scopes.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// Whether this set grants every scope in `required`.
    #[must_use]
    pub fn covers(&self, required: &Self) -> bool {
        let granted = self.expanded();
        required.expanded().is_subset(&granted)
    }

    /// Scopes plus the `read_` scopes implied by `write_` scopes.
    fn expanded(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for scope in &self.scopes {
            // `unauthenticated_write_x` implies `unauthenticated_read_x` the same way
            let (prefix, rest) = scope
                .strip_prefix("unauthenticated_")
                .map_or(("", scope.as_str()), |rest| ("unauthenticated_", rest));
            if let Some(resource) = rest.strip_prefix("write_") {
                set.insert(format!("{prefix}read_{resource}"));
            }
            set.insert(scope.clone());
        }
        set
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scopes.join(","))
    }
}
