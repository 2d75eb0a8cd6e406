//! URL handling module for Listing-Harvest
//!
//! This module describes the target site's URL scheme and provides identity normalization,
//! slug extraction, listing-page recognition and page-number detection.

mod domain;
mod normalize;

use crate::config::TargetConfig;

// Re-export main functions
pub use domain::{extract_domain, host_matches, page_number_from_url, parse_lenient};
pub use normalize::normalize_url;

/// The site being harvested and the shape of its URLs
///
/// Detail pages live at `https://<domain>/<entity_path>/<slug>/...` and listing pages under
/// `https://<domain>/<listing_path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSite {
    domain: String,
    entity_path: String,
    detail_subpath: Option<String>,
    listing_path: String,
}

impl TargetSite {
    /// Creates a site description with no detail sub-page and a listing path of
    /// `search/results/<entity_path>`
    pub fn new(domain: &str, entity_path: &str) -> Self {
        let entity_path = entity_path.trim_matches('/').to_lowercase();
        Self {
            domain: domain.trim().to_lowercase(),
            listing_path: format!("search/results/{}", pluralize(&entity_path)),
            entity_path,
            detail_subpath: None,
        }
    }

    /// Sets the sub-page opened for extraction
    pub fn with_detail_subpath(mut self, subpath: &str) -> Self {
        let subpath = subpath.trim_matches('/');
        self.detail_subpath = (!subpath.is_empty()).then(|| subpath.to_lowercase());
        self
    }

    /// Sets the path prefix that identifies listing pages
    pub fn with_listing_path(mut self, listing_path: &str) -> Self {
        self.listing_path = listing_path.trim_matches('/').to_lowercase();
        self
    }

    pub fn from_config(config: &TargetConfig) -> Self {
        let site = Self::new(&config.domain, &config.entity_path)
            .with_listing_path(&config.listing_path);
        match &config.detail_subpath {
            Some(subpath) => site.with_detail_subpath(subpath),
            None => site,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    pub fn listing_path(&self) -> &str {
        &self.listing_path
    }

    /// Normalized identity form of a URL, see [`normalize_url`]
    pub fn normalize_url(&self, raw: &str) -> Option<String> {
        normalize_url(self, raw)
    }

    /// Extracts the entity slug from a detail-page URL on the target domain
    pub fn extract_slug(&self, raw: &str) -> Option<String> {
        let normalized = self.normalize_url(raw)?;
        let prefix = format!("{}/{}/", self.domain, self.entity_path);
        normalized
            .strip_prefix(&prefix)
            .filter(|slug| !slug.is_empty() && !slug.contains('/'))
            .map(str::to_string)
    }

    /// Stable, canonical URL recorded for an entity
    pub fn canonical_url(&self, raw: &str) -> Option<String> {
        self.extract_slug(raw)
            .map(|slug| format!("https://www.{}/{}/{}/", self.domain, self.entity_path, slug))
    }

    /// URL of the sub-page opened when extracting an entity
    pub fn detail_url(&self, raw: &str) -> Option<String> {
        let canonical = self.canonical_url(raw)?;
        Some(match &self.detail_subpath {
            Some(subpath) => format!("{}{}/", canonical, subpath),
            None => canonical,
        })
    }

    /// Returns true if the URL is a listing page of the target domain
    pub fn is_listing_url(&self, raw: &str) -> bool {
        let Some(url) = parse_lenient(raw) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        if !host_matches(host, &self.domain) {
            return false;
        }

        let path = url.path().trim_matches('/').to_lowercase();
        path == self.listing_path || path.starts_with(&format!("{}/", self.listing_path))
    }
}

impl Default for TargetSite {
    fn default() -> Self {
        Self::new("linkedin.com", "company").with_detail_subpath("about")
    }
}

fn pluralize(segment: &str) -> String {
    match segment.strip_suffix('y') {
        Some(stem) => format!("{}ies", stem),
        None => format!("{}s", segment),
    }
}
