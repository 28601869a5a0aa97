//! In-memory feed source

use super::DataSource;
use crate::error::Result;
use crate::types::{FetchParams, Item, ItemId, JsonValue, Page};
use async_trait::async_trait;
use std::time::Duration;

/// Serves offset/limit slices of a fixed item list
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<Item>,
    owner_field: Option<String>,
    delay: Option<Duration>,
}

impl StaticSource {
    /// Create a source over `items`
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            owner_field: None,
            delay: None,
        }
    }

    /// Generate `count` items with ids `1..=count` and a `title` field
    pub fn numbered(count: usize) -> Self {
        let items = (1..=count as i64)
            .map(|id| Item::new(id).with_field("title", format!("Item {id}")))
            .collect();
        Self::new(items)
    }

    /// Apply `FetchParams::filter` by matching it against this field
    #[must_use]
    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = Some(field.into());
        self
    }

    /// Simulate network latency
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of items served without a filter
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the source holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn matches(&self, item: &Item, filter: &ItemId) -> bool {
        let Some(ref field) = self.owner_field else {
            return true;
        };
        match (item.fields.get(field), filter) {
            (Some(JsonValue::Number(n)), ItemId::Int(id)) => n.as_i64() == Some(*id),
            (Some(JsonValue::String(s)), ItemId::Str(id)) => s == id,
            _ => false,
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scoped: Vec<&Item> = match params.filter {
            Some(ref filter) => self.items.iter().filter(|i| self.matches(i, filter)).collect(),
            None => self.items.iter().collect(),
        };

        let rows = scoped
            .iter()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .map(|item| (*item).clone())
            .collect();

        Ok(Page::new(rows, scoped.len() as u64))
    }
}
