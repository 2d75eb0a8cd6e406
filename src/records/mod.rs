//! Collected entities and the values flowing into them
//!
//! A [`Record`] is what the store keeps. [`DetailFields`] is what an extractor pulls out of a
//! detail page and [`ItemLink`] is one entry enumerated from a listing page.

mod import;

pub use import::{parse_import, ImportBatch, ImportError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored for any field that could not be extracted
pub const NOT_FOUND: &str = "N/A";

/// A collected entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub website: String,
    pub industry: String,
    pub phone: String,
    pub headquarters: String,
    /// Canonical detail-page URL
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    /// Builds a record from extracted fields, substituting the sentinel for anything missing
    ///
    /// `fallback_name` is used when the page yielded no name (typically the listing's display
    /// name) and `url` is the canonical detail URL.
    pub fn from_detail(
        fields: DetailFields,
        fallback_name: Option<&str>,
        url: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let name = fields
            .name
            .or_else(|| fallback_name.map(str::to_string))
            .and_then(clean_field);

        Self {
            name: or_sentinel(name),
            website: or_sentinel(fields.website.and_then(clean_field)),
            industry: or_sentinel(fields.industry.and_then(clean_field)),
            phone: or_sentinel(fields.phone.and_then(clean_field)),
            headquarters: or_sentinel(fields.headquarters.and_then(clean_field)),
            url: url.to_string(),
            timestamp,
        }
    }

    /// Record-shaped view of a listing entry, used for duplicate checks before visiting it
    pub fn from_link(link: &ItemLink) -> Self {
        Self {
            name: link
                .display_name
                .clone()
                .and_then(clean_field)
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            website: NOT_FOUND.to_string(),
            industry: NOT_FOUND.to_string(),
            phone: NOT_FOUND.to_string(),
            headquarters: NOT_FOUND.to_string(),
            url: link.url.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Number of optional fields that carry a real value
    pub fn populated_fields(&self) -> usize {
        [&self.website, &self.industry, &self.phone, &self.headquarters]
            .iter()
            .filter(|value| is_present(value))
            .count()
    }
}

/// Fields pulled from a detail page; `None` means every strategy failed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailFields {
    pub name: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub phone: Option<String>,
    pub headquarters: Option<String>,
}

/// One entity link enumerated from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLink {
    pub url: String,
    pub display_name: Option<String>,
}

impl ItemLink {
    pub fn new(url: &str, display_name: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            display_name: display_name.map(str::to_string),
        }
    }
}

/// Returns true if the value is neither empty nor the sentinel
pub fn is_present(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != NOT_FOUND
}

fn clean_field(value: String) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    is_present(&collapsed).then_some(collapsed)
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_FOUND.to_string())
}
