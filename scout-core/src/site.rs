//! Target site registry
//!
//! Describes the retail site the scout talks to: its origin, the search URL
//! template, and the link categories its URL scheme uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A retail site with a searchable product catalogue
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    /// Human-readable name
    pub name: &'static str,
    /// Scheme and host, without a trailing slash
    pub origin: &'static str,
    /// Search URL template with {query} placeholder
    pub search_template: &'static str,
}

/// The only site the scout supports
pub static HOME_DEPOT: Site = Site {
    name: "Home Depot",
    origin: "https://homedepot.com",
    search_template: "https://homedepot.com/s/{query}?NCNI-5",
};

impl Site {
    /// Build the search-results URL for a free-text query
    ///
    /// The query becomes a single path segment, so it is percent-encoded.
    pub fn search_url(&self, query: &str) -> String {
        self.search_template
            .replace("{query}", &urlencoding::encode(query.trim()))
    }

    /// Turn a site-relative path into a fully-qualified URL
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    /// Host part of the origin (`homedepot.com`)
    pub fn host(&self) -> &'static str {
        self.origin
            .split_once("://")
            .map(|(_, host)| host)
            .unwrap_or(self.origin)
    }

    /// Whether a host belongs to this site (`www.` and other subdomains included)
    pub fn owns_host(&self, host: &str) -> bool {
        let own = self.host();
        host == own || host.ends_with(&format!(".{}", own))
    }
}

/// Single-character URL path segment that distinguishes link types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryCode {
    /// `/b/...` category browse pages
    Browse,
    /// `/p/...` product pages
    Product,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown category code '{0}' (expected 'b' or 'p')")]
pub struct UnknownCategory(pub String);

impl CategoryCode {
    pub fn as_char(self) -> char {
        match self {
            CategoryCode::Browse => 'b',
            CategoryCode::Product => 'p',
        }
    }

    /// Path prefix links of this category start with, e.g. `/p/`
    pub fn path_prefix(self) -> String {
        format!("/{}/", self.as_char())
    }
}

impl TryFrom<char> for CategoryCode {
    type Error = UnknownCategory;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'b' => Ok(CategoryCode::Browse),
            'p' => Ok(CategoryCode::Product),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

impl std::str::FromStr for CategoryCode {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => CategoryCode::try_from(c),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let url = HOME_DEPOT.search_url("propane grill");
        assert_eq!(url, "https://homedepot.com/s/propane%20grill?NCNI-5");
    }

    #[test]
    fn test_owns_host() {
        assert!(HOME_DEPOT.owns_host("homedepot.com"));
        assert!(HOME_DEPOT.owns_host("www.homedepot.com"));
        assert!(!HOME_DEPOT.owns_host("nothomedepot.com"));
        assert!(!HOME_DEPOT.owns_host("example.com"));
    }

    #[test]
    fn test_category_code_parsing() {
        assert_eq!("p".parse::<CategoryCode>(), Ok(CategoryCode::Product));
        assert_eq!(CategoryCode::try_from('b'), Ok(CategoryCode::Browse));
        assert!("x".parse::<CategoryCode>().is_err());
        assert!("pb".parse::<CategoryCode>().is_err());
        assert_eq!(CategoryCode::Product.path_prefix(), "/p/");
    }
}
