//! HTML heuristics for listing and detail pages
//!
//! These functions work on a snapshot of a page's HTML, never on a live tab, so they can be
//! tested against fixtures. Each detail field is looked up through a fallback chain:
//!
//! 1. structured metadata (JSON-LD `Organization` blocks)
//! 2. labeled sections (`<dt>`/`<dd>` pairs)
//! 3. global heuristics over the whole document
//!
//! A field every strategy misses is left as `None`.

use crate::records::{DetailFields, ItemLink};
use crate::url::TargetSite;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Controls that move a results listing to its next page, most specific first
pub const NEXT_BUTTON_SELECTORS: &[&str] = &[
    "button[aria-label='Next']",
    "button.artdeco-pagination__button--next",
    "a[rel='next']",
];

/// Phrases shown by interstitials that block automated visits
const BLOCK_PHRASES: &[&str] = &[
    "too many requests",
    "unusual activity",
    "let's do a quick security check",
    "security verification",
    "you've reached the commercial use limit",
];

/// Enumerates the entity links on a listing page, in display order
///
/// Several anchors often point at the same entity (logo and name); they collapse into one entry
/// that keeps the first non-empty display name.
pub fn extract_item_links(html: &str, site: &TargetSite) -> Vec<ItemLink> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let Ok(base) = Url::parse(&format!("https://www.{}/", site.domain())) else {
        return Vec::new();
    };

    let mut links: Vec<ItemLink> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let Some(canonical) = site.canonical_url(resolved.as_str()) else {
            continue;
        };

        let name = display_name(&element);
        match positions.get(&canonical) {
            Some(&index) => {
                if links[index].display_name.is_none() {
                    links[index].display_name = name;
                }
            }
            None => {
                positions.insert(canonical.clone(), links.len());
                links.push(ItemLink {
                    url: canonical,
                    display_name: name,
                });
            }
        }
    }

    links
}

/// Pulls the structured fields out of a detail page
pub fn extract_detail(html: &str) -> DetailFields {
    let document = Html::parse_document(html);

    let metadata = structured_metadata(&document);
    let labeled = labeled_sections(&document);

    DetailFields {
        name: metadata
            .name
            .or_else(|| first_text(&document, "h1"))
            .or_else(|| title_name(&document)),
        website: metadata
            .website
            .or(labeled.website)
            .or_else(|| displayed_website(&document)),
        industry: metadata.industry.or(labeled.industry),
        phone: metadata
            .phone
            .or(labeled.phone)
            .or_else(|| telephone_link(&document)),
        headquarters: metadata.headquarters.or(labeled.headquarters),
    }
}

/// Current page number as shown by the pagination control
pub fn detect_page_number(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    ["[aria-current='page']", "[aria-current='true']", "li.active"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .find_map(|element| text_of(&element).parse::<u32>().ok())
        })
        .filter(|page| *page >= 1)
}

/// Returns true if an enabled next-page control is present
pub fn has_next_button(html: &str) -> bool {
    let document = Html::parse_document(html);
    NEXT_BUTTON_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .any(|selector| {
            document.select(&selector).any(|element| {
                let element = element.value();
                control_enabled(element.attr("disabled"), element.attr("aria-disabled"))
            })
        })
}

/// Whether a pagination control with these attribute values can be clicked
pub fn control_enabled(disabled: Option<&str>, aria_disabled: Option<&str>) -> bool {
    disabled.is_none()
        && !aria_disabled.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// Returns true if the page is a rate-limit or verification wall instead of content
pub fn looks_rate_limited(html: &str) -> bool {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    BLOCK_PHRASES.iter().any(|phrase| text.contains(phrase))
}

// ===== Structured metadata =====

fn structured_metadata(document: &Html) -> DetailFields {
    let Ok(selector) = Selector::parse("script[type='application/ld+json']") else {
        return DetailFields::default();
    };

    document
        .select(&selector)
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find_map(|value| find_organization(&value).map(organization_fields))
        .unwrap_or_default()
}

fn find_organization(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_organization),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                return find_organization(graph);
            }
            let is_org = match map.get("@type") {
                Some(Value::String(kind)) => is_organization_type(kind),
                Some(Value::Array(kinds)) => kinds
                    .iter()
                    .filter_map(Value::as_str)
                    .any(is_organization_type),
                _ => false,
            };
            is_org.then_some(value)
        }
        _ => None,
    }
}

fn is_organization_type(kind: &str) -> bool {
    matches!(kind, "Organization" | "Corporation" | "LocalBusiness")
}

fn organization_fields(org: &Value) -> DetailFields {
    let string = |key: &str| {
        org.get(key)
            .and_then(Value::as_str)
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
    };

    DetailFields {
        name: string("name"),
        website: string("sameAs").or_else(|| string("url")),
        industry: string("industry"),
        phone: string("telephone"),
        headquarters: org.get("address").and_then(postal_address),
    }
}

fn postal_address(address: &Value) -> Option<String> {
    if let Some(text) = address.as_str() {
        return Some(collapse_whitespace(text)).filter(|s| !s.is_empty());
    }
    let parts: Vec<&str> = ["addressLocality", "addressRegion", "addressCountry"]
        .iter()
        .filter_map(|key| address.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

// ===== Labeled sections =====

fn labeled_sections(document: &Html) -> DetailFields {
    let mut fields = DetailFields::default();
    let Ok(terms) = Selector::parse("dt") else {
        return fields;
    };

    for term in document.select(&terms) {
        let label = text_of(&term).to_lowercase();
        let Some(value) = following_definition(&term) else {
            continue;
        };

        let slot = if label.contains("website") {
            &mut fields.website
        } else if label.contains("industr") {
            &mut fields.industry
        } else if label.contains("phone") {
            &mut fields.phone
        } else if label.contains("headquarters") || label.contains("location") {
            &mut fields.headquarters
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fields
}

fn following_definition(term: &ElementRef<'_>) -> Option<String> {
    term.next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|sibling| sibling.value().name() != "dt")
        .find(|sibling| sibling.value().name() == "dd")
        .map(|dd| text_of(&dd))
        .filter(|text| !text.is_empty())
}

// ===== Global heuristics =====

fn title_name(document: &Html) -> Option<String> {
    let from_meta = Selector::parse("meta[property='og:title']")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .find_map(|meta| meta.value().attr("content").map(str::to_string))
        });

    from_meta
        .or_else(|| first_text(document, "title"))
        .and_then(|title| {
            title
                .split(" | ")
                .next()
                .map(collapse_whitespace)
                .filter(|s| !s.is_empty())
        })
}

fn displayed_website(document: &Html) -> Option<String> {
    let selector = Selector::parse("a[href^='http']").ok()?;
    document.select(&selector).find_map(|anchor| {
        let text = text_of(&anchor);
        let looks_like_url = !text.is_empty()
            && !text.contains(' ')
            && text.contains('.')
            && anchor
                .value()
                .attr("href")
                .is_some_and(|href| href.contains(text.trim_start_matches("www.")));
        looks_like_url.then_some(text)
    })
}

fn telephone_link(document: &Html) -> Option<String> {
    let selector = Selector::parse("a[href^='tel:']").ok()?;
    document
        .select(&selector)
        .find_map(|anchor| anchor.value().attr("href"))
        .map(|href| href.trim_start_matches("tel:").trim().to_string())
        .filter(|phone| !phone.is_empty())
}

// ===== Helpers =====

fn display_name(element: &ElementRef<'_>) -> Option<String> {
    let text = text_of(element);
    if !text.is_empty() {
        return Some(text);
    }
    element
        .value()
        .attr("aria-label")
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|element| text_of(&element))
        .find(|text| !text.is_empty())
}

fn text_of(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
