//! Product page field extractors
//!
//! Each extractor looks for one field in a parsed product page and returns
//! `None` when the element is missing or empty. They never fail.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use scout_core::{repair_price, Rating, ProductFacts};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static DETAILS: LazyLock<Selector> = LazyLock::new(|| selector("div.product-details"));
static NAME: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static COMPANY: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static BULLETS: LazyLock<Selector> = LazyLock::new(|| selector("ul.sui-list-disc"));
static BULLET_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[class^="price"]"#));
static STARS: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[class^="stars--"]"#));
static REVIEW_COUNT: LazyLock<Selector> =
    LazyLock::new(|| selector("span.product-details__review-count"));

/// Run every extractor over a product page
pub fn extract_facts(document: &Html) -> ProductFacts {
    ProductFacts {
        name: extract_name(document),
        company: extract_company(document),
        description: extract_description(document),
        price: extract_price(document),
        rating: extract_rating(document),
    }
}

/// Parse raw markup and run every extractor
pub fn parse_product_page(html: &str) -> ProductFacts {
    extract_facts(&Html::parse_document(html))
}

/// First `h1` inside the product-details container
pub fn extract_name(document: &Html) -> Option<String> {
    details_heading(document, &NAME)
}

/// First `h2` inside the product-details container (the brand)
pub fn extract_company(document: &Html) -> Option<String> {
    details_heading(document, &COMPANY)
}

fn details_heading(document: &Html, heading: &Selector) -> Option<String> {
    let details = document.select(&DETAILS).next()?;
    let element = details.select(heading).next()?;
    non_empty(element_text(element))
}

/// Bullet list items, minus the last one
///
/// The last bullet on the site's product pages is a legal/boilerplate line
/// (e.g. a California Prop 65 notice), so it is always dropped. This is a
/// heuristic: a list without such a line loses a real bullet.
pub fn extract_description(document: &Html) -> Option<Vec<String>> {
    let list = document.select(&BULLETS).next()?;

    let mut items: Vec<String> = list.select(&BULLET_ITEM).map(element_text).collect();
    items.pop();

    Some(items)
}

/// Price text with its decimal point restored
///
/// The price is split over several spans (`$`, dollars, cents), so the text
/// nodes are joined without separators before repair.
pub fn extract_price(document: &Html) -> Option<String> {
    let element = document.select(&PRICE).next()?;
    let text: String = element.text().map(str::trim).collect();

    if text.chars().count() <= 1 {
        return None;
    }

    Some(repair_price(&text))
}

/// Star rating from the star bar width plus the review count
pub fn extract_rating(document: &Html) -> Option<Rating> {
    let style = document
        .select(&STARS)
        .next()
        .and_then(|stars| stars.value().attr("style"))?;
    let count = document.select(&REVIEW_COUNT).next()?;

    Rating::from_parts(style, &element_text(count))
}

/// Text content with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r#"
        <html>
        <head><title>Nexgrill 4-Burner</title></head>
        <body>
            <div class="product-details">
                <h1 class="sui-h4-bold">Nexgrill 4-Burner Propane Gas Grill
                    in Black</h1>
                <h2>Nexgrill</h2>
                <span class="stars--c43xm" style="width: 86.4%"></span>
                <span class="product-details__review-count">(1,204)</span>
            </div>
            <div class="price-format__main-price">
                <span>$</span>
                <span>299</span>
                <span>00</span>
            </div>
            <ul class="sui-list-disc">
                <li>4 stainless steel burners</li>
                <li>Side burner for
                    sauces</li>
                <li>California residents: see Proposition 65 information</li>
            </ul>
        </body>
        </html>
    "#;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_extract_full_page() {
        let facts = parse_product_page(PRODUCT_PAGE);

        assert_eq!(
            facts.name.as_deref(),
            Some("Nexgrill 4-Burner Propane Gas Grill in Black")
        );
        assert_eq!(facts.company.as_deref(), Some("Nexgrill"));
        assert_eq!(
            facts.description,
            Some(vec![
                "4 stainless steel burners".to_string(),
                "Side burner for sauces".to_string(),
            ])
        );
        assert_eq!(facts.price.as_deref(), Some("$299.00"));

        let rating = facts.rating.unwrap();
        assert_eq!(rating.stars, 4.3);
        assert_eq!(rating.reviews, 1204);
    }

    #[test]
    fn test_name_without_company() {
        let page = doc(r#"<div class="product-details"><h1>Acme Widget</h1></div>"#);

        assert_eq!(extract_name(&page).as_deref(), Some("Acme Widget"));
        assert_eq!(extract_company(&page), None);

        let facts = extract_facts(&page);
        assert_eq!(facts.company_text(), "Company not found");
    }

    #[test]
    fn test_headings_outside_container_ignored() {
        let page = doc(r#"<h1>Site banner</h1><div class="product-details"></div>"#);
        assert_eq!(extract_name(&page), None);

        let no_container = doc("<h1>Acme Widget</h1><h2>Acme</h2>");
        assert_eq!(extract_name(&no_container), None);
        assert_eq!(extract_company(&no_container), None);
    }

    #[test]
    fn test_price_missing_decimal() {
        let page = doc(r#"<div class="price">1999</div>"#);
        let price = extract_price(&page).unwrap();
        assert!(price.contains("19.99"));
    }

    #[test]
    fn test_price_ignores_non_div_badges() {
        let page = doc(
            r#"<span class="price-badge">Save 20%</span>
               <div class="price-format__main-price"><span>$</span><span>49</span><span>98</span></div>"#,
        );
        assert_eq!(extract_price(&page).as_deref(), Some("$49.98"));
    }

    #[test]
    fn test_price_too_short() {
        let page = doc(r#"<div class="price-wrapper">  $ </div>"#);
        assert_eq!(extract_price(&page), None);

        let missing = doc(r#"<div class="was-price">$1999</div>"#);
        assert_eq!(extract_price(&missing), None);
    }

    #[test]
    fn test_description_drops_last_item() {
        let page = doc(r#"<ul class="sui-list-disc"><li>Only line</li></ul>"#);
        assert_eq!(extract_description(&page), Some(vec![]));

        let other_list = doc(r#"<ul class="plain"><li>a</li><li>b</li></ul>"#);
        assert_eq!(extract_description(&other_list), None);
    }

    #[test]
    fn test_rating_requires_count() {
        let page = doc(r#"<span class="stars--c43xm" style="width: 90%"></span>"#);
        assert_eq!(extract_rating(&page), None);

        let no_style = doc(
            r#"<span class="stars--c43xm"></span>
               <span class="product-details__review-count">(12)</span>"#,
        );
        assert_eq!(extract_rating(&no_style), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        let input = "  hello   world  \n\t  test  ";
        assert_eq!(normalize_whitespace(input), "hello world test");
    }
}
