//! Data sources
//!
//! A [`DataSource`] performs the actual retrieval of one page. The pager
//! never talks to the network itself.
//!
//! - [`HttpFeedSource`] - `GET /feed?offset=..&limit=..` against a backend
//! - [`StaticSource`] - in-memory list, for demos and tests

mod http;
mod memory;

pub use http::{HttpFeedSource, PageBody};
pub use memory::StaticSource;

use crate::error::Result;
use crate::types::{FetchParams, Page};
use async_trait::async_trait;
use std::sync::Arc;

/// Retrieves pages of feed items
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch `params.limit` items starting at `params.offset`.
    ///
    /// Implementations return `Error::MalformedResponse` when the backend
    /// answers without a `rows` list.
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page>;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page> {
        (**self).fetch_page(params).await
    }
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Box<T> {
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page> {
        (**self).fetch_page(params).await
    }
}
