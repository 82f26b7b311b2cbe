//! Tools the agent can call
//!
//! The set is closed: the model names a tool, [`Tool::from_name`] resolves it,
//! and [`Toolbox::invoke`] dispatches with a plain `match`.

use rand::seq::SliceRandom;
use scraper::Html;
use thiserror::Error;
use tracing::{debug, info};

use scout_core::{CandidateLink, CategoryCode, Site, HOME_DEPOT};
use scout_web::{browser_headers, extract_facts, find_links, FetchError, SharedFetcher, PRODUCT_USER_AGENT};

/// Errors from running a tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// The agent's tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Search the site for a product page
    LocateProduct,
    /// Summarize one product page
    DescribeProduct,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::LocateProduct, Tool::DescribeProduct];

    pub fn name(self) -> &'static str {
        match self {
            Tool::LocateProduct => "locate_product",
            Tool::DescribeProduct => "describe_product",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

/// Tool behaviour switches
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Append the star rating and review count to product descriptions
    pub include_reviews: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            include_reviews: true,
        }
    }
}

/// Runs tools against the site
#[derive(Clone)]
pub struct Toolbox {
    fetcher: SharedFetcher,
    site: &'static Site,
    config: ToolConfig,
}

impl Toolbox {
    pub fn new(fetcher: SharedFetcher, config: ToolConfig) -> Self {
        Self {
            fetcher,
            site: &HOME_DEPOT,
            config,
        }
    }

    /// Run a tool and return its observation
    pub async fn invoke(&self, tool: Tool, input: &str) -> Result<String, ToolError> {
        info!("Invoking {} with input: {}", tool.name(), input);

        match tool {
            Tool::LocateProduct => self.locate_product(input).await,
            Tool::DescribeProduct => self.describe_product(input).await,
        }
    }

    /// Search for a product and suggest one result, picked at random
    pub async fn locate_product(&self, query: &str) -> Result<String, ToolError> {
        let links = find_links(self.fetcher.as_ref(), self.site, query, CategoryCode::Product).await?;

        let picked = links
            .choose(&mut rand::thread_rng())
            .and_then(|url| CandidateLink::parse(url));

        let Some(link) = picked else {
            debug!("No product links for '{}'", query);
            return Ok(no_results(query));
        };

        Ok(format!(
            "A product with name {} is available at the url {}.",
            link.display_name(),
            link.url
        ))
    }

    /// Fetch a product page and describe it in one sentence
    pub async fn describe_product(&self, url: &str) -> Result<String, ToolError> {
        let html = self
            .fetcher
            .fetch(url, browser_headers(PRODUCT_USER_AGENT)?)
            .await?;

        let facts = extract_facts(&Html::parse_document(&html));
        debug!("Extracted facts from {}: {:?}", url, facts);

        Ok(facts.describe(url, self.config.include_reviews))
    }
}

/// Observation for a search with no product links
pub fn no_results(query: &str) -> String {
    format!(
        "No products were found for \"{}\". Try a different, more specific product name.",
        query
    )
}
