//! Playback notifications
//!
//! Every notification carries the same envelope regardless of kind:
//! the current item, its position, a fresh snapshot of the primitive,
//! and the last derived progress/minute values.

use crate::types::QueueItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of notification observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A play attempt started; carries the candidate item
    Preloading,
    /// The primitive was told to load an item
    Loading,
    /// Playback resumed after a pause or stop
    Play,
    /// The primitive became playable and was started
    Playing,
    /// Playback paused
    Pause,
    /// The current item failed to load or play
    Error,
    /// Every 5% of the current item
    Progress,
    /// Every full minute of the current item
    Minutes,
    /// Periodic wall-clock heartbeat while playing
    Heartbeat,
    /// Moved forward in the queue
    NextTrack,
    /// Moved backward in the queue
    PreviousTrack,
    /// Playback stopped and position reset
    Stop,
    /// First time the current attempt became playable
    TrackStart,
}

impl EventKind {
    /// Every kind, in declaration order
    pub const ALL: [EventKind; 13] = [
        EventKind::Preloading,
        EventKind::Loading,
        EventKind::Play,
        EventKind::Playing,
        EventKind::Pause,
        EventKind::Error,
        EventKind::Progress,
        EventKind::Minutes,
        EventKind::Heartbeat,
        EventKind::NextTrack,
        EventKind::PreviousTrack,
        EventKind::Stop,
        EventKind::TrackStart,
    ];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Preloading => "preloading",
            EventKind::Loading => "loading",
            EventKind::Play => "play",
            EventKind::Playing => "playing",
            EventKind::Pause => "pause",
            EventKind::Error => "error",
            EventKind::Progress => "progress",
            EventKind::Minutes => "minutes",
            EventKind::Heartbeat => "heartbeat",
            EventKind::NextTrack => "nextTrack",
            EventKind::PreviousTrack => "previousTrack",
            EventKind::Stop => "stop",
            EventKind::TrackStart => "trackStart",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only projection of the primitive, sampled at emission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioProperties {
    pub paused: bool,
    pub is_stopped: bool,
    /// Seconds
    pub current_time: f64,
    /// Seconds, `None` while unknown
    pub duration: Option<f64>,
    pub src: Option<String>,
    pub volume: f64,
}

/// Notification envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: EventKind,
    pub song: Option<QueueItem>,
    pub position: usize,
    pub audio: AudioProperties,
    /// Last computed percentage (0-100)
    pub progress: u32,
    /// Last computed minute index
    pub minute: u64,
}
