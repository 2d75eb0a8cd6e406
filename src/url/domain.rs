use url::Url;

/// Parses a URL, tolerating a missing scheme
///
/// Listing markup and imported files frequently carry scheme-less links such as
/// `www.example.com/company/acme`; those are read as https.
pub fn parse_lenient(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", trimmed.trim_start_matches('/'))).ok()
        }
        Err(_) => None,
    }
}

/// Extracts the domain from a URL, lowercased and without a leading `www.`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use listing_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(stripped) => stripped.to_string(),
            None => host,
        }
    })
}

/// Returns true if `host` is `domain` or one of its subdomains
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.');
    host.eq_ignore_ascii_case(domain)
        || (host.len() > domain.len()
            && host.to_lowercase().ends_with(&format!(".{}", domain.to_lowercase())))
}

/// Reads the results-page number from a listing URL's `page` query parameter
pub fn page_number_from_url(raw: &str) -> Option<u32> {
    let url = parse_lenient(raw)?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
}
