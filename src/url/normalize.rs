use crate::records::NOT_FOUND;
use crate::url::domain::{extract_domain, host_matches, parse_lenient};
use crate::url::TargetSite;

/// Normalizes a URL into the identity form used for duplicate detection
///
/// # Normalization Steps
///
/// 1. Reject empty input and the "N/A" sentinel
/// 2. Parse (a missing scheme is read as https); drop query and fragment
/// 3. Lowercase host and path, drop the protocol and a leading `www.`
/// 4. Detail URLs on the target domain (any subdomain) collapse to
///    `domain/entity/<slug>`, discarding sub-pages such as `/about` or `/jobs`
/// 5. Every other URL keeps its path with trailing slashes removed
///
/// # Examples
///
/// ```
/// use listing_harvest::url::{normalize_url, TargetSite};
///
/// let site = TargetSite::new("linkedin.com", "company");
/// assert_eq!(
///     normalize_url(&site, "https://www.LinkedIn.com/company/Acme/about/?trk=x").as_deref(),
///     Some("linkedin.com/company/acme")
/// );
/// assert_eq!(
///     normalize_url(&site, "http://www.acme.com/contact/").as_deref(),
///     Some("acme.com/contact")
/// );
/// ```
pub fn normalize_url(site: &TargetSite, raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_FOUND) {
        return None;
    }

    let url = parse_lenient(trimmed)?;
    let host = extract_domain(&url)?;
    let path = url.path().to_lowercase();

    if host_matches(&host, site.domain()) {
        if let Some(slug) = slug_from_path(&path, site.entity_path()) {
            return Some(format!("{}/{}/{}", site.domain(), site.entity_path(), slug));
        }
    }

    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    };

    Some(format!("{}{}", authority, path).trim_end_matches('/').to_string())
}

/// Returns the slug segment following the entity segment of a lowercase path
pub(crate) fn slug_from_path<'a>(path: &'a str, entity_path: &str) -> Option<&'a str> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if !segments.next()?.eq_ignore_ascii_case(entity_path) {
        return None;
    }
    segments.next()
}
