//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::FeedConfig;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::{FetchOptions, LoadOutcome, PageFetcher};
use crate::source::{DataSource, HttpFeedSource, StaticSource};
use crate::types::ItemId;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                pages,
                page_size,
                filter,
                token,
            } => {
                let mut config = self.load_config()?;
                if let Some(size) = page_size {
                    config.page_size = *size;
                }
                if let Some(filter) = filter {
                    config.filter = Some(parse_filter(filter));
                }
                if let Some(token) = token {
                    config.bearer_token = Some(token.clone());
                }
                self.fetch(&config, *pages).await
            }
            Commands::Demo {
                items,
                page_size,
                latency_ms,
            } => self.demo(*items, *page_size, *latency_ms).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load the feed config from file, environment and flags
    fn load_config(&self) -> Result<FeedConfig> {
        let config = match &self.cli.config {
            Some(path) => FeedConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FeedConfig::default(),
        };
        let mut config = config.with_env_overrides();
        if let Some(ref base_url) = self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        Ok(config)
    }

    async fn fetch(&self, config: &FeedConfig, pages: Option<usize>) -> Result<()> {
        config.validate()?;
        let source = HttpFeedSource::from_config(config)?;
        info!("Fetching {}{}", config.base_url, source.path());

        let fetcher = PageFetcher::with_options(source, config.fetch_options());
        self.page_through(&fetcher, pages).await
    }

    async fn demo(&self, items: usize, page_size: u32, latency_ms: u64) -> Result<()> {
        if page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        let mut source = StaticSource::numbered(items);
        if latency_ms > 0 {
            source = source.with_delay(Duration::from_millis(latency_ms));
        }

        let fetcher = PageFetcher::with_options(source, FetchOptions::new(page_size));
        self.page_through(&fetcher, None).await
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;

        self.output(&json!({
            "type": "config",
            "valid": true,
            "base_url": config.base_url,
            "path": config.path,
            "page_size": config.page_size,
        }));
        Ok(())
    }

    /// Load every page through [`PageFetcher::load_all`], print the items,
    /// why paging stopped if it was not the end, then a summary
    async fn page_through<S: DataSource>(
        &self,
        fetcher: &PageFetcher<S>,
        pages: Option<usize>,
    ) -> Result<()> {
        let started = Instant::now();
        let outcomes = fetcher.load_all(pages).await;
        let loaded_pages = outcomes.iter().filter(|o| o.is_loaded()).count();

        let view = fetcher.view();
        for item in &view.items {
            self.output(&json!({
                "type": "item",
                "key": item.key(),
                "item": item,
            }));
        }

        match outcomes.last() {
            Some(LoadOutcome::Failed { failure }) => {
                self.output(&json!({"type": "error", "error": failure}));
            }
            Some(LoadOutcome::Loaded { end_reached: true, .. }) | None => {}
            Some(last) if pages.is_some_and(|max| outcomes.len() >= max) && last.has_more() => {}
            Some(other) => self.output(&json!({"type": "stopped", "outcome": other})),
        }

        let state = fetcher.snapshot();
        self.output(&json!({
            "type": "summary",
            "pages": loaded_pages,
            "items": state.len(),
            "end_reached": state.end_reached,
            "last_error": state.last_error,
            "elapsed_ms": started.elapsed().as_millis() as u64,
        }));

        match state.last_error {
            Some(failure) => Err(Error::Other(format!("feed fetch failed: {failure}"))),
            None => Ok(()),
        }
    }

    fn output(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => println!("{}", render_pretty(msg)),
        }
    }
}

/// Numeric filters are sent as numbers, anything else as a string
fn parse_filter(raw: &str) -> ItemId {
    raw.parse::<i64>()
        .map_or_else(|_| ItemId::Str(raw.to_string()), ItemId::Int)
}

fn render_pretty(msg: &Value) -> String {
    match msg["type"].as_str() {
        Some("item") => {
            let title = msg["item"]["title"]
                .as_str()
                .or_else(|| msg["item"]["content"].as_str())
                .unwrap_or("");
            format!("  #{:<6} {}", msg["key"].as_str().unwrap_or(""), title)
        }
        Some("summary") => format!(
            "{} items in {} pages{} ({}ms)",
            msg["items"],
            msg["pages"],
            if msg["end_reached"] == true {
                ", end reached"
            } else {
                ""
            },
            msg["elapsed_ms"]
        ),
        _ => serde_json::to_string_pretty(msg).unwrap_or_default(),
    }
}
