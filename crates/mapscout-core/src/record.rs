//! The business record extracted from one Google Maps listing.
//!
//! ## Observed shape from live listings
//!
//! Only `name` and `map_url` can be relied on: Maps renders the header and
//! the page URL for every place, but every other panel section is optional
//! (unclaimed businesses routinely lack a website, service-area businesses
//! lack a street address, brand-new places lack ratings). Each optional
//! field is therefore `Option` and an extraction miss on it is not an
//! error.
//!
//! ### `rating`
//! Rendered as a localized decimal next to the star widget — `"4.6"` on
//! en-US pages, `"4,6"` on comma-decimal locales. Always within 0–5 when
//! Maps shows it at all.
//!
//! ### `review_count`
//! Rendered with thousands separators and often wrapped in parentheses,
//! e.g. `"(1,234)"`. Stored as the plain integer.

use serde::{Deserialize, Serialize};

/// One scraped business listing, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Display name of the business. Always present.
    pub name: String,

    /// Star rating in `[0, 5]`, when the listing has one.
    pub rating: Option<f64>,

    /// Number of reviews behind the rating.
    pub review_count: Option<u32>,

    /// Primary category string (e.g., `"Coffee shop"`).
    pub category: Option<String>,

    /// Street address, newline-joined parts flattened to `", "`.
    pub address: Option<String>,

    /// Phone number as displayed, without any `tel:` scheme prefix.
    pub phone: Option<String>,

    /// Business website URL, when the listing links one.
    pub website: Option<String>,

    /// Canonical Google Maps place URL. Always present.
    pub map_url: String,
}
