//! Playback primitive contract
//!
//! Abstracts the single-stream media resource (an HTML audio element, a
//! platform player, a simulated clock). The controller is its only mutator.

use tokio::sync::mpsc;

/// Lifecycle signals a primitive reports back to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveSignal {
    /// Enough data is buffered to start playing
    CanPlay,
    /// Loading or playback failed
    Error(String),
    /// Playback started or resumed
    Play,
    /// Playback paused
    Pause,
    /// Periodic position sample
    TimeUpdate,
    /// The media reached its natural end
    Ended,
    /// Remote "previous" control (e.g. headset button)
    RemotePrevious,
    /// Remote "next" control
    RemoteNext,
}

/// Sending half of the primitive's signal subscription
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<PrimitiveSignal>,
}

impl SignalSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PrimitiveSignal>) -> Self {
        Self { tx }
    }

    /// Report a signal. Returns false once the controller is gone.
    pub fn emit(&self, signal: PrimitiveSignal) -> bool {
        self.tx.send(signal).is_ok()
    }

    /// Whether the controller is still listening
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single-stream playback resource
///
/// Only the operations the controller invokes are modelled. Times are in
/// seconds.
pub trait PlaybackPrimitive: Send {
    /// Point the primitive at a new locator and start loading it
    fn load(&mut self, url: &str);

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Current playback position
    fn current_time(&self) -> f64;

    /// Jump to a position
    fn set_current_time(&mut self, seconds: f64);

    /// Total duration, `None` while unknown
    fn duration(&self) -> Option<f64>;

    /// Whether playback is paused
    fn paused(&self) -> bool;

    /// Output volume (0.0 - 1.0)
    fn volume(&self) -> f64;

    /// Locator currently loaded
    fn source(&self) -> Option<String>;

    /// Begin delivering signals. Called once when the service starts.
    fn attach(&mut self, signals: SignalSender) {
        let _ = signals;
    }

    /// Stop delivering signals. Called once when the service shuts down.
    fn detach(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = SignalSender::new(tx);
        assert!(sender.emit(PrimitiveSignal::CanPlay));
        drop(rx);
        assert!(sender.is_closed());
        assert!(!sender.emit(PrimitiveSignal::Play));
    }
}
