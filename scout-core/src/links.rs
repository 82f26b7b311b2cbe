//! Candidate product links found on search-result pages

use serde::Serialize;

/// A fully-qualified link split into the path segments after the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateLink {
    /// Absolute URL as found (or made absolute)
    pub url: String,
    /// First path segment, the category code (`p`, `b`)
    pub page_type: String,
    /// Second path segment, a dash-separated slug of the product name
    pub slug: Option<String>,
}

impl CandidateLink {
    /// Split an absolute URL into its page type and name slug
    ///
    /// Returns `None` when the URL has no path after the host.
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
        let path = rest.split_once('/').map(|(_, path)| path)?;
        let path = path.split(['?', '#']).next().unwrap_or(path);

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let page_type = segments.next()?.to_string();
        let slug = segments.next().map(str::to_string);

        Some(Self {
            url: url.to_string(),
            page_type,
            slug,
        })
    }

    /// Human-readable product name (dashes become spaces)
    pub fn display_name(&self) -> String {
        match &self.slug {
            Some(slug) => slug.replace('-', " "),
            None => "an unnamed product".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_link() {
        let link = CandidateLink::parse("https://homedepot.com/p/Foo-Grill/123").unwrap();
        assert_eq!(link.page_type, "p");
        assert_eq!(link.slug.as_deref(), Some("Foo-Grill"));
        assert_eq!(link.display_name(), "Foo Grill");
    }

    #[test]
    fn test_parse_ignores_query_string() {
        let link = CandidateLink::parse("https://homedepot.com/b/Grills?NCNI-5").unwrap();
        assert_eq!(link.page_type, "b");
        assert_eq!(link.slug.as_deref(), Some("Grills"));
    }

    #[test]
    fn test_parse_without_path() {
        assert!(CandidateLink::parse("https://homedepot.com").is_none());
        assert!(CandidateLink::parse("https://homedepot.com/").is_none());

        let bare = CandidateLink::parse("https://homedepot.com/p/").unwrap();
        assert_eq!(bare.display_name(), "an unnamed product");
    }
}
