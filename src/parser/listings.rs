use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::LookupError;
use crate::parser::price::normalize_price;
use crate::types::Listing;

/// Listing card on a category page. The markup is unversioned; if the marketplace
/// renames these classes the extractor simply finds nothing.
const CARD_SELECTOR: &str = ".tc-item";
const NAME_SELECTOR: &str = ".tc-desc-text";
const PRICE_SELECTOR: &str = ".tc-price";
/// Raw numeric price carried on the price node; the visible text is the fallback.
const PRICE_ATTR: &str = "data-s";

struct Selectors {
    card: Selector,
    name: Selector,
    price: Selector,
}

impl Selectors {
    fn new() -> Result<Self, LookupError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| LookupError::Selector(format!("{css}: {e}")))
        };
        Ok(Self {
            card: parse(CARD_SELECTOR)?,
            name: parse(NAME_SELECTOR)?,
            price: parse(PRICE_SELECTOR)?,
        })
    }
}

/// Extract the listings on a category page whose name contains `name_filter`
/// (case-insensitive; empty matches everything), in document order.
///
/// Cards without a name or a usable positive price are skipped one by one. An empty result is
/// `LookupError::NoMatchingListings`, which callers treat as "nothing this cycle".
pub fn extract_listings(
    html: &str,
    category: &str,
    name_filter: &str,
    base_url: &str,
) -> Result<Vec<Listing>, LookupError> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);
    let needle = collapse_whitespace(name_filter).to_lowercase();

    let mut listings = Vec::new();
    let mut cards = 0usize;
    let mut rejected_price = 0usize;

    for card in document.select(&selectors.card) {
        cards += 1;

        let Some(name) = card_name(&card, &selectors.name) else {
            continue;
        };
        if !needle.is_empty() && !name.to_lowercase().contains(&needle) {
            continue;
        }

        let price = match card_price(&card, &selectors.price) {
            Some(p) if p > 0.0 => p,
            _ => {
                rejected_price += 1;
                continue;
            }
        };

        let url = card
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| absolute_url(base_url, href))
            .unwrap_or_default();

        listings.push(Listing {
            name,
            price,
            url,
            category: category.to_string(),
        });
    }

    debug!(
        category,
        name_filter,
        cards,
        matched = listings.len(),
        rejected_price,
        "Extracted {} of {cards} listing cards",
        listings.len(),
    );

    if listings.is_empty() {
        return Err(LookupError::NoMatchingListings);
    }
    Ok(listings)
}

/// Trimmed display name with inner whitespace runs collapsed. `None` when blank or missing.
fn card_name(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let node = card.select(selector).next()?;
    let name = collapse_whitespace(&node.text().collect::<String>());
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Trim and fold every whitespace run to one space. Names and the filter both go through
/// this so they compare on the same footing.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn card_price(card: &ElementRef<'_>, selector: &Selector) -> Option<f64> {
    let node = card.select(selector).next()?;
    match node.value().attr(PRICE_ATTR) {
        Some(raw) => normalize_price(raw),
        None => normalize_price(&node.text().collect::<String>()),
    }
}

/// Rewrite a site-relative link against the marketplace origin.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{}{href}", base_url.trim_end_matches('/'))
    } else {
        format!("{}/{href}", base_url.trim_end_matches('/'))
    }
}
