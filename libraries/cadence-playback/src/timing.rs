//! Per-tick timing derivation
//!
//! Each tracker is fed one position sample per tick and answers whether the
//! corresponding notification should fire. All of them are attempt-scoped:
//! the controller resets them whenever a new item is loaded.

use std::time::Duration;
use tokio::time::Instant;

/// Announces each positive 5% multiple once
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    percent: u32,
    /// Bit `n` set once `n * 5` percent has been announced
    fired: u32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a sample. Returns true if `progress` should fire.
    ///
    /// Samples with an unknown, non-finite or zero duration are ignored.
    pub fn update(&mut self, current_time: f64, duration: Option<f64>) -> bool {
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return false;
        };
        if !current_time.is_finite() || current_time < 0.0 {
            return false;
        }

        let percent = ((current_time / duration) * 100.0).floor().min(100.0) as u32;
        self.percent = percent;

        if percent == 0 || percent % 5 != 0 {
            return false;
        }

        // A jittering duration can bounce between 9% and 10%; announce 10% once
        let bit = 1u32 << (percent / 5);
        if self.fired & bit != 0 {
            return false;
        }
        self.fired |= bit;
        true
    }

    /// Last computed percentage
    pub fn percent(&self) -> u32 {
        self.percent
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Announces each minute boundary after the first
#[derive(Debug, Clone, Default)]
pub struct MinuteTracker {
    minute: u64,
    last_remainder: Option<u64>,
}

impl MinuteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a sample. Returns true if `minutes` should fire.
    pub fn update(&mut self, current_time: f64) -> bool {
        if !current_time.is_finite() || current_time < 0.0 {
            return false;
        }

        let minute = (current_time / 60.0).floor() as u64;
        let remainder = (current_time % 60.0).floor() as u64;
        self.minute = minute;

        // Minute 0 is the track start, not a boundary
        let crossed = remainder == 0 && self.last_remainder != Some(0) && minute != 0;
        self.last_remainder = Some(remainder);
        crossed
    }

    /// Last computed minute index
    pub fn minute(&self) -> u64 {
        self.minute
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Wall-clock heartbeat while playing
///
/// The reference point is taken lazily on the first sample after a reset, so
/// a freshly started track never fires immediately.
#[derive(Debug, Clone)]
pub struct HeartbeatTracker {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl HeartbeatTracker {
    /// `None` disables the heartbeat
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Feed a sample taken at `now`. Returns true if `heartbeat` should fire.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let Some(last) = self.last else {
            self.last = Some(now);
            return false;
        };

        if now.saturating_duration_since(last).as_secs() > interval.as_secs() {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
