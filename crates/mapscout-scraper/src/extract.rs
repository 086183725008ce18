//! Field extraction from a listing's detail view.
//!
//! Maps class names churn with frontend releases, so every field is read
//! through an ordered chain of selectors — the current class, the previous
//! generation, and a structural fallback. Each of the optional fields is
//! read in isolation: a missing node or a malformed value costs that field,
//! never the record. Only an unopenable detail view or an unreadable name
//! fails the whole extraction.

use std::time::Duration;

use mapscout_core::{AppConfig, BusinessRecord};

use crate::dom::{DomError, DomReader};
use crate::error::ScraperError;
use crate::navigator::ListingHandle;
use crate::parse::{parse_rating, parse_review_count};

/// Present on every loaded detail view; used to detect that the panel
/// rendered at all.
const DETAIL_ANCHOR: &str = "h1";

pub(crate) const NAME_SELECTORS: &[&str] = &["h1.DUwDvf", "h1.fontHeadlineLarge", "h1"];
pub(crate) const RATING_SELECTORS: &[&str] =
    &["div.F7nice span:first-child", "span.ceNzKf", "span.MW4etd"];
pub(crate) const REVIEW_COUNT_SELECTORS: &[&str] = &[
    "div.F7nice span:last-child",
    "span.UY7F9",
    "button[jsaction*='reviews']",
];
pub(crate) const CATEGORY_SELECTORS: &[&str] = &["button[jsaction*='category']", "span.DkEaL"];
pub(crate) const ADDRESS_SELECTORS: &[&str] = &[
    "button[data-item-id='address']",
    "div.rogA2c div.fontBodyMedium",
];
pub(crate) const PHONE_SELECTORS: &[&str] =
    &["button[data-item-id*='phone:tel']", "a[href^='tel:']"];
pub(crate) const WEBSITE_SELECTORS: &[(&str, &str)] = &[
    ("a[data-item-id='authority']", "href"),
    ("a[aria-label*='Website']", "href"),
];

/// Reads [`BusinessRecord`]s out of listing detail views.
pub struct Extractor<'a, D: DomReader> {
    dom: &'a D,
    detail_timeout: Duration,
}

impl<'a, D: DomReader> Extractor<'a, D> {
    #[must_use]
    pub fn new(dom: &'a D, config: &AppConfig) -> Self {
        Self {
            dom,
            detail_timeout: config.detail_timeout(),
        }
    }

    /// Opens the listing's detail view and extracts one record.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Extraction`] when the detail view cannot be opened
    /// within the timeout window or the business name cannot be read. All
    /// other field failures degrade to `None` on the record.
    pub async fn extract(&self, handle: &ListingHandle) -> Result<BusinessRecord, ScraperError> {
        let fail = |source: DomError| ScraperError::Extraction {
            url: handle.url.clone(),
            source,
        };

        self.dom.goto(&handle.url).await.map_err(fail)?;
        self.dom
            .wait_for_selector(DETAIL_ANCHOR, self.detail_timeout)
            .await
            .map_err(fail)?;

        let name = self.first_text(NAME_SELECTORS).await.ok_or_else(|| {
            fail(DomError::NotFound {
                selector: NAME_SELECTORS.join(", "),
            })
        })?;

        // The canonical place URL after any redirect; the handle URL is an
        // acceptable stand-in if the browser cannot report one.
        let map_url = self
            .dom
            .current_url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| handle.url.clone());

        let rating = self
            .first_text(RATING_SELECTORS)
            .await
            .and_then(|raw| parse_rating(&raw));
        let review_count = self
            .first_text(REVIEW_COUNT_SELECTORS)
            .await
            .and_then(|raw| parse_review_count(&raw));
        let category = self.first_text(CATEGORY_SELECTORS).await;
        let address = self.first_text(ADDRESS_SELECTORS).await.map(|s| flatten_lines(&s, ", "));
        let phone = self.first_text(PHONE_SELECTORS).await.map(|s| clean_phone(&s));
        let website = self.first_attribute(WEBSITE_SELECTORS).await;

        Ok(BusinessRecord {
            name,
            rating,
            review_count,
            category,
            address,
            phone,
            website,
            map_url,
        })
    }

    /// First non-empty text among `selectors`, trimmed. Read failures on a
    /// selector fall through to the next one; a fully dry chain is `None`.
    async fn first_text(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            match self.dom.text_of(selector).await {
                Ok(Some(text)) if !text.trim().is_empty() => return Some(text.trim().to_owned()),
                Ok(_) | Err(_) => {}
            }
        }
        None
    }

    /// First non-empty attribute among `(selector, attribute)` pairs.
    async fn first_attribute(&self, selectors: &[(&str, &str)]) -> Option<String> {
        for (selector, attribute) in selectors {
            match self.dom.attribute_of(selector, attribute).await {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    return Some(value.trim().to_owned());
                }
                Ok(_) | Err(_) => {}
            }
        }
        None
    }
}

/// Joins the non-empty lines of multi-line panel text with `separator`
/// (addresses render as stacked lines in the detail panel).
fn flatten_lines(s: &str, separator: &str) -> String {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Normalizes phone text: strips a `tel:` scheme picked up from href-based
/// fallbacks and flattens line breaks.
fn clean_phone(s: &str) -> String {
    let s = s.strip_prefix("tel:").unwrap_or(s);
    flatten_lines(s, " ")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
