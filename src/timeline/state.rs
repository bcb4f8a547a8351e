//! Timeline state
//!
//! What presentation layers read: the current timeline id, its posts, and
//! loading / error status.

use serde::Serialize;

use crate::post::Post;

/// Module name of the on-chain contract
pub const MODULE_NAME: &str = "timeline";

/// Shared clock object passed to `create_post`
pub const CLOCK_OBJECT_ID: &str = "0x6";

/// Published timeline state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimelineState {
    pub timeline_id: Option<String>,
    /// Posts, newest first
    pub posts: Vec<Post>,
    /// A create-timeline or create-post action is in progress
    pub is_loading: bool,
    /// A reconciliation run is in progress
    pub is_fetching_posts: bool,
    /// Message from the last failed action or fetch
    pub error: Option<String>,
    /// Digest of the last submitted transaction
    pub last_digest: Option<String>,
}

impl TimelineState {
    pub fn has_timeline(&self) -> bool {
        self.timeline_id.is_some()
    }
}

/// Configuration for the timeline service
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Published contract package; required for write actions
    pub package_id: Option<String>,
    /// Pause between a confirmed post and the refresh that follows it
    pub settle_delay_ms: u64,
    /// Background refresh interval; `None` disables polling
    pub poll_interval_ms: Option<u64>,
    /// Upper bound on concurrent post fetches
    pub max_concurrent_fetches: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            package_id: None,
            settle_delay_ms: 1000,
            poll_interval_ms: None,
            max_concurrent_fetches: 8,
        }
    }
}
