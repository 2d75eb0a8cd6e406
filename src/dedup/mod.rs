//! Duplicate detection for collected records
//!
//! The record store behaves as a set keyed by the equivalence defined here rather than by
//! field equality. A candidate is a duplicate of an existing record when, checking the rules
//! in order across the whole set:
//!
//! 1. their normalized URLs are equal
//! 2. their slugs are equal and the existing record belongs to the target domain
//! 3. their normalized names are equal
//! 4. their names are equal once legal-entity suffixes are removed, provided the cleaned
//!    name is longer than three characters
//!
//! Everything in this module is pure: no I/O, identical inputs give identical answers.

mod name;

pub use name::{normalize_name, strip_legal_suffixes, MIN_FUZZY_LENGTH};

use crate::records::Record;
use crate::url::TargetSite;

/// Which rule identified a duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Url,
    Slug,
    Name,
    FuzzyName,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Slug => "slug",
            Self::Name => "name",
            Self::FuzzyName => "fuzzy_name",
        }
    }
}

/// The existing record a candidate collides with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateMatch {
    pub kind: MatchKind,
    /// Position of the matching record in the existing set
    pub index: usize,
}

/// Identity keys derived from a record, computed once per comparison pass
struct Identity {
    url: Option<String>,
    slug: Option<String>,
    name: Option<String>,
    fuzzy_name: Option<String>,
}

/// Answers "is this record already known?"
#[derive(Debug, Clone, Default)]
pub struct DuplicateMatcher {
    site: TargetSite,
}

impl DuplicateMatcher {
    pub fn new(site: TargetSite) -> Self {
        Self { site }
    }

    /// Canonical identity string of a URL, or `None` if it has none
    pub fn normalize_url(&self, url: &str) -> Option<String> {
        self.site.normalize_url(url)
    }

    /// Slug of a target-domain detail URL
    pub fn extract_slug(&self, url: &str) -> Option<String> {
        self.site.extract_slug(url)
    }

    /// Returns true if `candidate` is equivalent to any record in `existing`
    pub fn is_duplicate(&self, candidate: &Record, existing: &[Record]) -> bool {
        self.find_duplicate(candidate, existing).is_some()
    }

    /// Finds the first record in `existing` equivalent to `candidate`, by rule precedence
    pub fn find_duplicate(&self, candidate: &Record, existing: &[Record]) -> Option<DuplicateMatch> {
        let candidate = self.identity(candidate);
        let existing: Vec<Identity> = existing.iter().map(|r| self.identity(r)).collect();

        let rules: [(MatchKind, fn(&Identity, &Identity) -> bool); 4] = [
            (MatchKind::Url, |c, e| same(&c.url, &e.url)),
            (MatchKind::Slug, |c, e| same(&c.slug, &e.slug)),
            (MatchKind::Name, |c, e| same(&c.name, &e.name)),
            (MatchKind::FuzzyName, |c, e| {
                c.fuzzy_name
                    .as_ref()
                    .is_some_and(|name| name.chars().count() > MIN_FUZZY_LENGTH)
                    && same(&c.fuzzy_name, &e.fuzzy_name)
            }),
        ];

        rules.iter().find_map(|(kind, rule)| {
            existing
                .iter()
                .position(|other| rule(&candidate, other))
                .map(|index| DuplicateMatch { kind: *kind, index })
        })
    }

    /// Keeps only the records that are unique against `existing` and against each other
    ///
    /// Returns the accepted records and the number rejected.
    pub fn filter_new(&self, incoming: Vec<Record>, existing: &[Record]) -> (Vec<Record>, usize) {
        let mut known: Vec<Record> = existing.to_vec();
        let mut accepted = Vec::new();
        let mut rejected = 0;

        for record in incoming {
            if self.is_duplicate(&record, &known) {
                rejected += 1;
            } else {
                known.push(record.clone());
                accepted.push(record);
            }
        }

        (accepted, rejected)
    }

    fn identity(&self, record: &Record) -> Identity {
        Identity {
            url: self.site.normalize_url(&record.url),
            slug: self.site.extract_slug(&record.url),
            name: normalize_name(&record.name),
            fuzzy_name: strip_legal_suffixes(&record.name),
        }
    }
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
