//! Core types for playback control

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Sentinel for `load_timeout_ms` that disables the stall timer
pub const LOAD_TIMEOUT_DISABLED: i64 = -1;

/// Default stall timeout in milliseconds
pub const DEFAULT_LOAD_TIMEOUT_MS: i64 = 15_000;

/// Remaining time under which the before-end lookahead synthesizes the end of a track
pub const BEFORE_END_THRESHOLD_SECS: f64 = 0.5;

/// Elapsed time above which smart-previous rewinds instead of stepping back
pub const SMART_PREVIOUS_THRESHOLD_SECS: f64 = 10.0;

/// One playable unit in the queue
///
/// The controller never keeps its own copy beyond the item currently loaded;
/// the queue store owns the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Identity that survives list mutations
    pub id: String,

    /// Media locator handed to the primitive
    pub url: String,

    /// Optional display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl QueueItem {
    /// Create an item with a fresh identity
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            title: None,
        }
    }

    /// Create an item with a caller-chosen identity
    pub fn with_id(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: None,
        }
    }

    /// Attach a display title
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded, or the queue ran out
    #[default]
    Stopped,

    /// Waiting for the primitive to become playable
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// The current attempt failed; resolves immediately into advance or stop
    Error,
}

/// Configuration for the playback controller
///
/// Defaults are applied by serde and by `Default`; `validate` runs once when the
/// controller is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Stall timeout in milliseconds (default: 15000, -1 disables)
    pub load_timeout_ms: i64,

    /// Emit `progress` every 5% (default: true)
    pub progress_events: bool,

    /// Emit `minutes` on each minute boundary (default: true)
    pub minute_events: bool,

    /// Heartbeat interval in seconds (default: 0 = off)
    pub heartbeat_secs: u64,

    /// Synthesize track end 0.5s early for gapless-style transitions (default: false)
    pub notify_before_end: bool,

    /// Allow an explicit `next` at the last item to stop playback (default: false)
    pub user_can_stop: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            progress_events: true,
            minute_events: true,
            heartbeat_secs: 0,
            notify_before_end: false,
            user_can_stop: false,
        }
    }
}

impl PlaybackConfig {
    /// Check values that serde cannot constrain
    pub fn validate(&self) -> Result<()> {
        if self.load_timeout_ms != LOAD_TIMEOUT_DISABLED && self.load_timeout_ms <= 0 {
            return Err(PlaybackError::invalid_config(format!(
                "load_timeout_ms must be positive or {} to disable, got {}",
                LOAD_TIMEOUT_DISABLED, self.load_timeout_ms
            )));
        }
        Ok(())
    }

    /// Stall timeout, or `None` when disabled
    pub fn load_timeout(&self) -> Option<Duration> {
        if self.load_timeout_ms == LOAD_TIMEOUT_DISABLED {
            None
        } else {
            u64::try_from(self.load_timeout_ms)
                .ok()
                .map(Duration::from_millis)
        }
    }

    /// Heartbeat interval, or `None` when off
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_secs > 0).then(|| Duration::from_secs(self.heartbeat_secs))
    }

    /// Whether any feature needs periodic position samples
    pub fn wants_time_updates(&self) -> bool {
        self.notify_before_end
            || self.progress_events
            || self.minute_events
            || self.heartbeat_secs > 0
    }
}
