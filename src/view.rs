//! What the hosting UI renders, and what it sends back
//!
//! The list layout itself lives in the host. This module only maps state
//! to a render snapshot and UI events to load modes.

use crate::error::FetchFailure;
use crate::pagination::PaginationState;
use crate::types::{Item, LoadMode};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which loading indicator to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingKind {
    /// Pull-to-refresh spinner at the top
    Refresh,
    /// Footer spinner below the last item
    More,
}

impl From<LoadMode> for LoadingKind {
    fn from(mode: LoadMode) -> Self {
        match mode {
            LoadMode::Refresh => Self::Refresh,
            LoadMode::Append => Self::More,
        }
    }
}

/// Events from the hosting UI that request data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The screen gained focus
    ScreenActivated,
    /// The user pulled the list down
    PullToRefresh,
    /// The list scrolled near its end
    ScrolledNearEnd,
}

impl Trigger {
    /// Load mode this trigger maps to
    pub fn mode(self) -> LoadMode {
        match self {
            Self::ScreenActivated | Self::PullToRefresh => LoadMode::Refresh,
            Self::ScrolledNearEnd => LoadMode::Append,
        }
    }
}

/// Render snapshot of a feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedView {
    pub items: Vec<Item>,
    pub loading: Option<LoadingKind>,
    pub end_reached: bool,
    pub last_error: Option<FetchFailure>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl FeedView {
    /// Build a snapshot from pagination state
    pub fn from_state(state: &PaginationState) -> Self {
        Self {
            items: state.accumulated.clone(),
            loading: state.loading.map(LoadingKind::from),
            end_reached: state.end_reached,
            last_error: state.last_error.clone(),
            last_fetched_at: state.last_fetched_at,
        }
    }

    /// Whether the pull-to-refresh spinner is active
    pub fn is_refreshing(&self) -> bool {
        self.loading == Some(LoadingKind::Refresh)
    }

    /// Whether the footer spinner is shown
    pub fn shows_footer_spinner(&self) -> bool {
        self.loading == Some(LoadingKind::More)
    }

    /// List keys in display order
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(item_key).collect()
    }
}

/// Stable list key of an item
pub fn item_key(item: &Item) -> String {
    item.key()
}
