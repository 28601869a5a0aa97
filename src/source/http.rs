//! HTTP feed source
//!
//! Wire format:
//!
//! ```text
//! GET {base_url}{path}?offset=10&limit=5&userId=42
//! -> { "rows": [ { "id": 11, ... }, ... ], "count": 37 }
//! ```

use super::DataSource;
use crate::config::FeedConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, RequestConfig};
use crate::types::{FetchParams, Item, JsonValue, Page};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Response body of the feed endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PageBody {
    #[serde(default)]
    pub rows: Option<Vec<Item>>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl PageBody {
    /// Validate into a page. A missing `count` means nothing lies past this page.
    pub fn into_page(self, offset: u64) -> Result<Page> {
        let rows = self
            .rows
            .ok_or_else(|| Error::malformed("response has no `rows` list"))?;
        let count = self.count.unwrap_or(offset + rows.len() as u64);
        Ok(Page::new(rows, count))
    }
}

/// Feed source backed by an HTTP endpoint
#[derive(Debug)]
pub struct HttpFeedSource {
    client: HttpClient,
    path: String,
    filter_param: String,
}

impl HttpFeedSource {
    /// Create a source for `path`, relative to the client's base URL
    pub fn new(client: HttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            filter_param: "userId".to_string(),
        }
    }

    /// Build the client and source from a feed config
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        let client =
            HttpClient::with_config(config.http_client_config()).context("building HTTP client")?;
        Ok(Self::new(client, config.path.clone()).with_filter_param(config.filter_param.clone()))
    }

    /// Name of the query parameter carrying the filter
    #[must_use]
    pub fn with_filter_param(mut self, name: impl Into<String>) -> Self {
        self.filter_param = name.into();
        self
    }

    /// Endpoint path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query for one page. The filter is omitted when unset.
    pub fn request_config(&self, params: &FetchParams) -> RequestConfig {
        let mut request = RequestConfig::new()
            .query("offset", params.offset)
            .query("limit", params.limit);
        if let Some(ref filter) = params.filter {
            request = request.query(self.filter_param.clone(), filter);
        }
        request
    }
}

#[async_trait]
impl DataSource for HttpFeedSource {
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page> {
        let body: JsonValue = self
            .client
            .get_json_with_config(&self.path, self.request_config(params))
            .await?;

        let body: PageBody = serde_json::from_value(body)?;
        let page = body.into_page(params.offset)?;
        debug!(
            "GET {} offset={} -> {} rows of {}",
            self.path,
            params.offset,
            page.len(),
            page.count
        );
        Ok(page)
    }
}
