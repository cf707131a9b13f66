//! Cadence - Queue-driven playback control
//!
//! Platform-agnostic playback controller for a single-stream media primitive.
//!
//! This crate provides:
//! - Playback state machine (Stopped, Loading, Playing, Paused, Error)
//! - Auto-advance and smart-previous queue navigation
//! - Stalled-load detection with a configurable timeout
//! - Progress, per-minute and heartbeat notifications derived from position samples
//! - Typed notification bus with per-handler failure isolation
//! - Optional async pre-play validation with stale-result protection
//! - Optional host media-control integration
//!
//! # Architecture
//!
//! `cadence-playback` knows nothing about decoding or output:
//! - The media resource is abstracted by [`PlaybackPrimitive`]
//! - The list of items is abstracted by [`QueueStore`] ([`MemoryQueue`] is provided)
//! - Observers subscribe on a [`NotificationBus`] the caller constructs
//!
//! [`PlaybackController`] is a synchronous state machine. [`PlayerService`]
//! runs one on a tokio task and feeds it commands, primitive signals, host
//! media actions, validation results and stall timeouts.
//!
//! # Example: Driving the controller
//!
//! ```rust
//! use cadence_playback::{
//!     EventKind, MemoryQueue, NotificationBus, PlaybackConfig, PlaybackController,
//!     PlaybackPrimitive, PlaybackState, PrimitiveSignal, QueueItem,
//! };
//!
//! #[derive(Default)]
//! struct Silent {
//!     src: Option<String>,
//!     paused: bool,
//! }
//!
//! impl PlaybackPrimitive for Silent {
//!     fn load(&mut self, url: &str) { self.src = Some(url.to_string()); self.paused = true; }
//!     fn play(&mut self) { self.paused = false; }
//!     fn pause(&mut self) { self.paused = true; }
//!     fn current_time(&self) -> f64 { 0.0 }
//!     fn set_current_time(&mut self, _seconds: f64) {}
//!     fn duration(&self) -> Option<f64> { Some(180.0) }
//!     fn paused(&self) -> bool { self.paused }
//!     fn volume(&self) -> f64 { 1.0 }
//!     fn source(&self) -> Option<String> { self.src.clone() }
//! }
//!
//! let bus = NotificationBus::new();
//! bus.subscribe(EventKind::TrackStart, |n| println!("started {:?}", n.song));
//!
//! let queue = MemoryQueue::from_items(vec![
//!     QueueItem::new("https://example.com/one.mp3"),
//!     QueueItem::new("https://example.com/two.mp3"),
//! ]);
//! let mut controller =
//!     PlaybackController::new(Silent::default(), queue, bus, PlaybackConfig::default()).unwrap();
//!
//! controller.play(0).unwrap();
//! assert_eq!(controller.state(), PlaybackState::Loading);
//!
//! controller.handle_signal(PrimitiveSignal::CanPlay);
//! assert_eq!(controller.state(), PlaybackState::Playing);
//!
//! controller.next().unwrap();
//! assert_eq!(controller.position(), 1);
//! ```

mod bus;
mod controller;
mod error;
mod events;
mod media_session;
mod primitive;
mod queue;
mod service;
pub mod timing;
pub mod types;
mod validate;

// Public exports
pub use bus::{NotificationBus, Subscription};
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::{AudioProperties, EventKind, Notification};
pub use media_session::{HostAction, MediaControls, MediaSession};
pub use primitive::{PlaybackPrimitive, PrimitiveSignal, SignalSender};
pub use queue::{MemoryQueue, QueueStore};
pub use service::{PlayerHandle, PlayerService, PlayerSnapshot, ServiceOptions};
pub use types::{PlaybackConfig, PlaybackState, QueueItem};
pub use validate::{FnValidator, PendingValidation, PlayValidator};
