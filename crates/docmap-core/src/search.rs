//! Pattern search over the aggregated entry table.
//!
//! Each query field is either a `/regex/` (searched anywhere in the value) or a
//! glob (matched against the whole value, `{a,b}` alternation included).
//! Matching is case-insensitive and all present fields must match.

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::{Entry, EntryMap};

/// Errors raised while compiling a search query.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid {field} pattern '{pattern}': {reason}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        reason: String,
    },
}

/// Optional predicates over the queryable entry fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Matched against `type` (or `type.raw`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SearchQuery {
    /// Returns true if no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().all(|(_, pattern)| pattern.is_none())
    }

    /// Overlay the predicates set in `other`.
    pub fn merge(&mut self, other: SearchQuery) {
        if other.kind.is_some() {
            self.kind = other.kind;
        }
        if other.id.is_some() {
            self.id = other.id;
        }
        if other.slug.is_some() {
            self.slug = other.slug;
        }
        if other.namespace.is_some() {
            self.namespace = other.namespace;
        }
    }

    fn fields(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> {
        [
            ("type", self.kind.as_deref()),
            ("id", self.id.as_deref()),
            ("slug", self.slug.as_deref()),
            ("namespace", self.namespace.as_deref()),
        ]
        .into_iter()
    }
}

/// Entries matching a query, alongside the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub search: SearchQuery,
    pub items: EntryMap,
}

/// A compiled field pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(Regex),
    Glob(GlobMatcher),
}

impl Pattern {
    /// Compile `/regex/` or glob syntax.
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, SearchError> {
        let invalid = |reason: String| SearchError::InvalidPattern {
            field,
            pattern: raw.to_string(),
            reason,
        };

        match raw.strip_prefix('/').and_then(|r| r.strip_suffix('/')) {
            Some(body) => RegexBuilder::new(body)
                .case_insensitive(true)
                .build()
                .map(Self::Regex)
                .map_err(|e| invalid(e.to_string())),
            None => GlobBuilder::new(raw)
                .literal_separator(true)
                .case_insensitive(true)
                .build()
                .map(|glob| Self::Glob(glob.compile_matcher()))
                .map_err(|e| invalid(e.to_string())),
        }
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(value),
            Self::Glob(matcher) => matcher.is_match(value),
        }
    }
}

/// A query with every pattern compiled once.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    predicates: Vec<(&'static str, Pattern)>,
}

impl CompiledQuery {
    pub fn new(query: &SearchQuery) -> Result<Self, SearchError> {
        let predicates = query
            .fields()
            .filter_map(|(field, raw)| raw.map(|raw| (field, raw)))
            .map(|(field, raw)| Pattern::parse(field, raw).map(|p| (field, p)))
            .collect::<Result<_, _>>()?;
        Ok(Self { predicates })
    }

    /// Returns true if the entry satisfies every predicate. A missing field never matches.
    #[must_use]
    pub fn matches(&self, entry: &Entry) -> bool {
        self.predicates.iter().all(|(field, pattern)| {
            entry
                .query_value(field)
                .is_some_and(|value| pattern.is_match(&value))
        })
    }
}

/// Select the entries of `map` matching `query`, in table order.
pub fn search(map: &EntryMap, query: &SearchQuery) -> Result<SearchResult, SearchError> {
    let compiled = CompiledQuery::new(query)?;
    let items = map
        .iter()
        .filter(|(_, entry)| compiled.matches(entry))
        .map(|(id, entry)| (id.clone(), entry.clone()))
        .collect();
    Ok(SearchResult {
        search: query.clone(),
        items,
    })
}
