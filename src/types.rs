//! Common types used throughout feed-pager
//!
//! This module contains the feed data model (items, pages, fetch
//! parameters) and small enums shared across modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: u32 = 5;

// ============================================================================
// Items
// ============================================================================

/// Identifier of a feed item. Backends use either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for ItemId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// A single feed record: an identifier plus opaque display fields.
///
/// Serialized flat, so `{"id": 1, "title": "hi"}` round-trips with `title`
/// landing in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(flatten)]
    pub fields: JsonObject,
}

impl Item {
    /// Create an item with no display fields
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            fields: JsonObject::new(),
        }
    }

    /// Add a display field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Stable list key for rendering
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

// ============================================================================
// Pages
// ============================================================================

/// One batch of items returned by a single fetch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    /// Items in server order
    pub rows: Vec<Item>,
    /// Total number of items available server-side across all pages
    pub count: u64,
}

impl Page {
    /// Create a page
    pub fn new(rows: Vec<Item>, count: u64) -> Self {
        Self { rows, count }
    }

    /// Number of rows in this page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether this page has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parameters of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    /// Number of items to skip
    pub offset: u64,
    /// Maximum number of items to return
    pub limit: u32,
    /// Optional scope, e.g. restrict to one owner
    pub filter: Option<ItemId>,
}

impl FetchParams {
    /// Create params without a filter
    pub fn new(offset: u64, limit: u32) -> Self {
        Self {
            offset,
            limit,
            filter: None,
        }
    }

    /// Restrict the request to a filter value
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<ItemId>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

// ============================================================================
// Load Mode
// ============================================================================

/// How a load folds its page into the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Start over from offset 0 and replace the list
    Refresh,
    /// Continue from the current offset and append
    Append,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh => f.write_str("refresh"),
            Self::Append => f.write_str("append"),
        }
    }
}

// ============================================================================
// Backoff Strategy
// ============================================================================

/// Backoff strategy for HTTP retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}
