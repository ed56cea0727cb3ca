use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CmrError;

static CONCEPT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,3}\d+(-[A-Za-z0-9_]+)?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Collections,
    Granules,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Collections => "collections",
            ResourceType::Granules => "granules",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a result set is paged out of the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PagingStrategy {
    /// Follow the `CMR-Scroll-Id` handle for `ceil(hits / page_size) - 1` more pages.
    #[default]
    Scroll,
    /// Request `page_num` 1, 2, ... until a page comes back empty.
    PageNumber,
}

/// How a [`QueryIdentity`] is turned into a cache file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStyle {
    /// `<resource>_<value>_<value>...`, in the order the parameters were supplied.
    #[default]
    Positional,
    /// `<resource>_<name>-<value>_...`, sorted by parameter name.
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConceptId {
    type Err = CmrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !CONCEPT_ID_RE.is_match(trimmed) {
            return Err(CmrError::InvalidConceptId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// A search query: the resource being searched plus its parameters, in caller order.
#[derive(Debug, Clone, Eq)]
pub struct QueryIdentity {
    resource: ResourceType,
    params: Vec<(String, String)>,
}

impl QueryIdentity {
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(_, value)| value.as_str())
    }
}

// Parameter names do not take part in identity; only the positional values do.
impl PartialEq for QueryIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource && self.values().eq(other.values())
    }
}

/// One record of a search feed. Only `id` is required; everything else rides along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(name.to_string(), Value::String(value.into()));
        self
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_str())
    }

    pub fn short_name(&self) -> Option<&str> {
        self.field_str("short_name")
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("title")
    }

    pub fn concept_id(&self) -> Result<ConceptId, CmrError> {
        self.id.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub entry: Vec<Entry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The JSON document returned by a search request: `{ "feed": { "entry": [...] } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub feed: Feed,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResponse {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            feed: Feed {
                entry: entries,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }
}

/// A fully reassembled search result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub response: SearchResponse,
    /// Server-side hit count, or the entry count when no hint was available.
    pub total_hits: u64,
}

impl ResultSet {
    pub fn new(response: SearchResponse, total_hits: u64) -> Self {
        Self {
            response,
            total_hits,
        }
    }

    /// Wraps a stored document, whose only count is its own entry list.
    pub fn from_stored(response: SearchResponse) -> Self {
        let total_hits = response.feed.entry.len() as u64;
        Self {
            response,
            total_hits,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.response.feed.entry
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.response.feed.entry
    }

    pub fn len(&self) -> usize {
        self.response.feed.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.response.feed.entry.is_empty()
    }
}
