//! Link extractor
//!
//! Queries the site's search page and collects anchors of one link category.

use reqwest::Url;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::{browser_headers, FetchError, PageFetcher, SEARCH_USER_AGENT};
use scout_core::{CategoryCode, Site};

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Search the site and return every link of the given category
///
/// Links come back in document order and are not de-duplicated.
pub async fn find_links(
    fetcher: &dyn PageFetcher,
    site: &Site,
    query: &str,
    code: CategoryCode,
) -> Result<Vec<String>, FetchError> {
    let url = site.search_url(query);

    debug!("Searching '{}' for /{}/ links", query, code);

    let html = fetcher.fetch(&url, browser_headers(SEARCH_USER_AGENT)?).await?;
    let links = extract_links(&html, site, code);

    debug!("Search for '{}' returned {} links", query, links.len());
    Ok(links)
}

/// Collect anchors whose path starts with `/{code}/`, made absolute
pub fn extract_links(html: &str, site: &Site, code: CategoryCode) -> Vec<String> {
    let document = Html::parse_document(html);
    let prefix = code.path_prefix();

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| {
            if href.starts_with('/') {
                // Protocol-relative `//host/...` never matches the prefix
                return href.starts_with(&prefix).then(|| site.absolute(href));
            }

            let parsed = Url::parse(href).ok()?;
            let same_site = parsed.host_str().is_some_and(|host| site.owns_host(host));
            if same_site && parsed.path().starts_with(&prefix) {
                Some(href.to_string())
            } else {
                None
            }
        })
        .collect()
}
