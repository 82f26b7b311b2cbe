//! Product facts scraped from a product page
//!
//! Every field is found or not found on its own. Missing fields render as a
//! fixed sentinel so a description sentence can always be composed.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

pub const NAME_NOT_FOUND: &str = "Name not found";
pub const COMPANY_NOT_FOUND: &str = "Company not found";
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";
pub const PRICE_NOT_FOUND: &str = "Price information not found";
pub const REVIEWS_NOT_FOUND: &str = "Could not find review information";

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Star rating and review count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rating {
    /// 0.0 - 5.0, one decimal place
    pub stars: f64,
    pub reviews: u64,
}

impl Rating {
    /// Combine the star bar's inline style with the review-count text
    ///
    /// Both parts must yield a value, otherwise there is no rating.
    pub fn from_parts(star_style: &str, review_text: &str) -> Option<Self> {
        let width = width_percent(star_style)?;
        let reviews = review_count(review_text)?;
        Some(Self {
            stars: stars_from_width(width),
            reviews,
        })
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The product gets {:.1} stars over {} reviews",
            self.stars, self.reviews
        )
    }
}

/// First decimal number in an inline style, e.g. `width: 86.4%` -> 86.4
pub fn width_percent(style: &str) -> Option<f64> {
    DECIMAL_RE
        .find(style)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// The star bar is a percentage of a five-star (100%) bar
pub fn stars_from_width(width: f64) -> f64 {
    let stars = (width / 20.0 * 10.0).round() / 10.0;
    stars.clamp(0.0, 5.0)
}

/// Keep only the digits of a review-count label such as `(1,024)`
pub fn review_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Everything the describe tool reports about one product page
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductFacts {
    pub name: Option<String>,
    pub company: Option<String>,
    /// Bullet items, boilerplate already removed
    pub description: Option<Vec<String>>,
    /// Price text with the decimal point repaired
    pub price: Option<String>,
    pub rating: Option<Rating>,
}

impl ProductFacts {
    pub fn name_text(&self) -> &str {
        self.name.as_deref().unwrap_or(NAME_NOT_FOUND)
    }

    pub fn company_text(&self) -> &str {
        self.company.as_deref().unwrap_or(COMPANY_NOT_FOUND)
    }

    pub fn description_text(&self) -> String {
        match &self.description {
            Some(items) => {
                let mut text = String::from("Item Description:");
                for item in items {
                    text.push(' ');
                    text.push_str(item);
                }
                text
            }
            None => DESCRIPTION_NOT_FOUND.to_string(),
        }
    }

    pub fn price_text(&self) -> String {
        match &self.price {
            Some(price) => format!("Price: {}", price),
            None => PRICE_NOT_FOUND.to_string(),
        }
    }

    pub fn rating_text(&self) -> String {
        match &self.rating {
            Some(rating) => rating.to_string(),
            None => REVIEWS_NOT_FOUND.to_string(),
        }
    }

    /// Compose the one-sentence summary handed back to the agent
    pub fn describe(&self, url: &str, include_reviews: bool) -> String {
        let mut out = format!(
            "At url {} is the item named {} from company {}. {}. {}.",
            url,
            self.name_text(),
            self.company_text(),
            self.description_text(),
            self.price_text(),
        );
        if include_reviews {
            out.push(' ');
            out.push_str(&self.rating_text());
            out.push('.');
        }
        out
    }
}
