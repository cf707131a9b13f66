//! Playback controller - core state machine
//!
//! Coordinates the queue store, the playback primitive and the notification
//! bus. Every entry point runs to completion on the caller's context; the
//! only suspension point (pre-play validation) is handed back to the caller
//! as a `PendingValidation` and re-enters through `complete_validation`.

use crate::{
    bus::NotificationBus,
    error::{PlaybackError, Result},
    events::{AudioProperties, EventKind, Notification},
    media_session::HostAction,
    primitive::{PlaybackPrimitive, PrimitiveSignal},
    queue::QueueStore,
    timing::{HeartbeatTracker, MinuteTracker, ProgressTracker},
    types::{
        PlaybackConfig, PlaybackState, QueueItem, BEFORE_END_THRESHOLD_SECS,
        SMART_PREVIOUS_THRESHOLD_SECS,
    },
    validate::{PendingValidation, PlayValidator},
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Why the queue is moving forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    /// Natural end, load error, stall, or before-end lookahead
    Ended,
    /// Explicit caller navigation
    User,
}

/// Item handed to the primitive, with the attempt and index it was loaded for
#[derive(Debug, Clone)]
struct LoadedItem {
    generation: u64,
    index: usize,
    item: QueueItem,
}

/// Attempt parked on the validation hook
#[derive(Debug, Clone)]
struct AwaitedValidation {
    generation: u64,
    /// Identity of the candidate, used to find it again if the queue shifted
    id: String,
}

#[derive(Debug, Clone, Copy)]
struct StallTimer {
    generation: u64,
    deadline: Instant,
}

/// Attempt-scoped guards and derived timing state
#[derive(Debug)]
struct AttemptSession {
    has_become_playable: bool,
    before_end_notified: bool,
    progress: ProgressTracker,
    minutes: MinuteTracker,
    heartbeat: HeartbeatTracker,
}

impl AttemptSession {
    fn new(config: &PlaybackConfig) -> Self {
        Self {
            has_become_playable: false,
            before_end_notified: false,
            progress: ProgressTracker::new(),
            minutes: MinuteTracker::new(),
            heartbeat: HeartbeatTracker::new(config.heartbeat_interval()),
        }
    }

    fn reset(&mut self) {
        self.has_become_playable = false;
        self.before_end_notified = false;
        self.progress.reset();
        self.minutes.reset();
        self.heartbeat.reset();
    }
}

/// Queue-driven playback controller
///
/// Owns the primitive (as its sole mutator) and the queue store handed in by
/// the caller, and publishes every lifecycle change on the shared bus.
pub struct PlaybackController<P, Q> {
    primitive: P,
    queue: Q,
    bus: NotificationBus,
    config: PlaybackConfig,
    validator: Option<Arc<dyn PlayValidator>>,

    state: PlaybackState,
    session: AttemptSession,

    /// Incremented by every `play`; tags stall timers and validations
    generation: u64,
    loaded: Option<LoadedItem>,
    stall: Option<StallTimer>,
    awaiting_validation: Option<AwaitedValidation>,
    pending_validations: Vec<PendingValidation>,
}

impl<P, Q> PlaybackController<P, Q>
where
    P: PlaybackPrimitive,
    Q: QueueStore,
{
    /// Create a controller. Fails if the configuration is invalid.
    pub fn new(
        primitive: P,
        queue: Q,
        bus: NotificationBus,
        config: PlaybackConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            primitive,
            queue,
            bus,
            session: AttemptSession::new(&config),
            config,
            validator: None,
            state: PlaybackState::Stopped,
            generation: 0,
            loaded: None,
            stall: None,
            awaiting_validation: None,
            pending_validations: Vec::new(),
        })
    }

    /// Install a pre-play validation hook
    pub fn with_validator(mut self, validator: Arc<dyn PlayValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    // ===== Navigation =====

    /// Start playing the item at `index`
    ///
    /// Fails with `IndexOutOfRange` without publishing anything when `index`
    /// is not in the queue. With a validator installed the load is deferred
    /// until `complete_validation`.
    pub fn play(&mut self, index: usize) -> Result<()> {
        let Some(item) = self.queue.get(index).cloned() else {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.queue.len(),
            });
        };

        self.generation += 1;
        self.cancel_stall_timer();
        debug!("Play attempt {} for position {}", self.generation, index);

        self.publish_with(EventKind::Preloading, Some(item.clone()), index);

        if let Some(validator) = &self.validator {
            self.awaiting_validation = Some(AwaitedValidation {
                generation: self.generation,
                id: item.id.clone(),
            });
            self.pending_validations.push(PendingValidation {
                generation: self.generation,
                index,
                item,
                validator: Arc::clone(validator),
            });
            return Ok(());
        }

        self.start_load(item, index);
        Ok(())
    }

    /// Resume a deferred `play` once its validation resolved
    ///
    /// Results for superseded attempts are dropped. A rejected validation, a
    /// result without a locator, or a candidate that left the queue aborts
    /// the attempt and leaves playback state untouched. If the queue shifted
    /// meanwhile, the candidate is loaded at its new position.
    pub fn complete_validation(
        &mut self,
        generation: u64,
        index: usize,
        result: anyhow::Result<QueueItem>,
    ) -> Result<()> {
        let awaited = match self.awaiting_validation.take() {
            Some(awaited) if awaited.generation == generation => awaited,
            other => {
                self.awaiting_validation = other;
                debug!(
                    "Discarding validation for attempt {} (current attempt {})",
                    generation, self.generation
                );
                return Ok(());
            }
        };

        let item = result.map_err(|e| PlaybackError::validation(index, format!("{:#}", e)))?;
        if item.url.trim().is_empty() {
            return Err(PlaybackError::validation(index, "validated item has no locator"));
        }

        let resolved = match self.queue.get(index) {
            Some(current) if current.id == awaited.id => Some(index),
            _ => self.queue.index_of(&awaited.id),
        };
        let Some(resolved) = resolved else {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.queue.len(),
            });
        };
        if resolved != index {
            debug!("Candidate moved from position {} to {} while validating", index, resolved);
        }

        self.start_load(item, resolved);
        Ok(())
    }

    /// Skip to the next item (user-initiated)
    ///
    /// At the last item this stops only when `user_can_stop` is configured.
    pub fn next(&mut self) -> Result<()> {
        self.advance(Advance::User)
    }

    /// Go back one item, or rewind the current one under smart-previous
    pub fn previous(&mut self) -> Result<()> {
        if self.queue.smart_previous()
            && self.primitive.current_time() > SMART_PREVIOUS_THRESHOLD_SECS
        {
            debug!("Smart previous: rewinding position {}", self.queue.position());
            self.primitive.set_current_time(0.0);
            return Ok(());
        }

        let position = self.queue.position();
        if position == 0 {
            return Ok(());
        }

        self.queue.set_position(position - 1);
        self.play(position - 1)?;
        self.publish(EventKind::PreviousTrack);
        Ok(())
    }

    /// Stop playback and rewind the queue to its first item
    pub fn stop(&mut self) {
        self.cancel_stall_timer();
        self.awaiting_validation = None;
        self.state = PlaybackState::Stopped;
        self.queue.set_position(0);
        if !self.primitive.paused() {
            self.primitive.pause();
        }
        self.session.heartbeat.reset();

        info!("Playback stopped");
        self.publish(EventKind::Stop);
    }

    // ===== Transport =====

    /// Pause if playing, resume if paused, start at the stored position if
    /// stopped or failed
    ///
    /// Returns whether the primitive is paused afterwards.
    pub fn toggle_play(&mut self) -> Result<bool> {
        if matches!(self.state, PlaybackState::Stopped | PlaybackState::Error) {
            self.play(self.queue.position())?;
        } else if self.primitive.paused() {
            self.primitive.play();
        } else {
            self.primitive.pause();
        }
        Ok(self.primitive.paused())
    }

    /// Pause the primitive; state follows its `Pause` signal
    pub fn pause(&mut self) {
        self.primitive.pause();
    }

    /// Resume the primitive; state follows its `Play` signal
    pub fn resume(&mut self) {
        self.primitive.play();
    }

    /// Seek to a fraction (0.0 - 1.0) of the current item
    ///
    /// No-op while the duration is unknown.
    pub fn seek(&mut self, fraction: f64) -> Result<()> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(PlaybackError::InvalidSeekFraction(fraction));
        }

        if let Some(duration) = self.known_duration() {
            self.primitive.set_current_time((fraction * duration).floor());
        }
        Ok(())
    }

    // ===== Signals =====

    /// Feed a lifecycle signal from the primitive
    pub fn handle_signal(&mut self, signal: PrimitiveSignal) {
        match signal {
            PrimitiveSignal::CanPlay => self.on_can_play(),
            PrimitiveSignal::Error(reason) => self.on_error(reason),
            PrimitiveSignal::Play => self.on_play(),
            PrimitiveSignal::Pause => self.on_pause(),
            PrimitiveSignal::TimeUpdate => self.on_time_update(),
            PrimitiveSignal::Ended => self.on_ended(),
            PrimitiveSignal::RemotePrevious => {
                if let Err(e) = self.previous() {
                    warn!("Remote previous failed: {}", e);
                }
            }
            PrimitiveSignal::RemoteNext => {
                if let Err(e) = self.next() {
                    warn!("Remote next failed: {}", e);
                }
            }
        }
    }

    /// Feed an action from the host media surface
    pub fn handle_host_action(&mut self, action: HostAction) {
        let result = match action {
            HostAction::Play => {
                self.resume();
                Ok(())
            }
            HostAction::Pause => {
                self.pause();
                Ok(())
            }
            HostAction::PreviousTrack => self.previous(),
            HostAction::NextTrack => self.next(),
        };
        if let Err(e) = result {
            warn!("Host action {:?} failed: {}", action, e);
        }
    }

    /// Fire the stall timer if its deadline has passed
    ///
    /// Returns true if the timer fired against the current attempt.
    pub fn check_stall(&mut self, now: Instant) -> bool {
        let Some(timer) = self.stall else {
            return false;
        };
        if now < timer.deadline {
            return false;
        }
        self.stall = None;

        if timer.generation != self.generation
            || self.session.has_become_playable
            || self.state != PlaybackState::Loading
        {
            debug!("Ignoring stall timer for attempt {}", timer.generation);
            return false;
        }

        self.fail_attempt(format!(
            "load timed out after {} ms",
            self.config.load_timeout_ms
        ));
        true
    }

    fn on_can_play(&mut self) {
        if !matches!(self.state, PlaybackState::Loading | PlaybackState::Playing) {
            debug!("Ignoring ready signal while {:?}", self.state);
            return;
        }

        self.cancel_stall_timer();
        let first_ready = !self.session.has_become_playable;
        self.session.has_become_playable = true;
        self.state = PlaybackState::Playing;

        if first_ready {
            info!("Track started at position {}", self.queue.position());
            self.publish(EventKind::TrackStart);
        }
        self.primitive.play();
        self.publish(EventKind::Playing);
    }

    fn on_error(&mut self, reason: String) {
        if !matches!(
            self.state,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        ) {
            debug!("Ignoring primitive error while {:?}: {}", self.state, reason);
            return;
        }
        if self.is_superseded() {
            // The outgoing item failed; the newer attempt decides where the queue goes
            self.cancel_stall_timer();
            self.state = PlaybackState::Error;
            warn!("Outgoing item failed while the next one validates: {}", reason);
            self.publish(EventKind::Error);
            return;
        }
        self.fail_attempt(reason);
    }

    fn on_play(&mut self) {
        if matches!(self.state, PlaybackState::Paused | PlaybackState::Stopped) {
            self.state = PlaybackState::Playing;
            self.session.heartbeat.reset();
            self.publish(EventKind::Play);
        }
    }

    fn on_pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.publish(EventKind::Pause);
        }
    }

    fn on_ended(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!("Ignoring end signal while {:?}", self.state);
            return;
        }
        if self.session.before_end_notified {
            // Lookahead already advanced for this attempt
            return;
        }
        if self.is_superseded() {
            debug!("Ignoring end of an item a newer attempt replaces");
            return;
        }
        if let Err(e) = self.advance(Advance::Ended) {
            warn!("Advancing after end of track failed: {}", e);
        }
    }

    fn on_time_update(&mut self) {
        if self.state != PlaybackState::Playing || !self.config.wants_time_updates() {
            return;
        }

        let current_time = self.primitive.current_time();
        let duration = self.known_duration();

        if self.config.notify_before_end && !self.session.before_end_notified {
            if let Some(duration) = duration {
                if duration - current_time < BEFORE_END_THRESHOLD_SECS {
                    self.session.before_end_notified = true;
                    debug!("Before-end lookahead at {:.2}s of {:.2}s", current_time, duration);
                    if let Err(e) = self.advance(Advance::Ended) {
                        warn!("Advancing before end of track failed: {}", e);
                    }
                    return;
                }
            }
        }

        if self.config.progress_events && self.session.progress.update(current_time, duration) {
            self.publish(EventKind::Progress);
        }
        if self.config.minute_events && self.session.minutes.update(current_time) {
            self.publish(EventKind::Minutes);
        }
        if self.session.heartbeat.update(Instant::now()) {
            self.publish(EventKind::Heartbeat);
        }
    }

    // ===== Internals =====

    fn start_load(&mut self, item: QueueItem, index: usize) {
        self.cancel_stall_timer();
        self.session.reset();
        self.state = PlaybackState::Loading;
        self.queue.set_position(index);
        self.primitive.load(&item.url);
        debug!("Loading {} at position {}", item.url, index);
        self.loaded = Some(LoadedItem {
            generation: self.generation,
            index,
            item,
        });

        if let Some(timeout) = self.config.load_timeout() {
            self.stall = Some(StallTimer {
                generation: self.generation,
                deadline: Instant::now() + timeout,
            });
        }

        self.publish(EventKind::Loading);
    }

    fn fail_attempt(&mut self, reason: String) {
        self.cancel_stall_timer();
        self.state = PlaybackState::Error;

        let error = PlaybackError::PlaybackFailed {
            position: self.queue.position(),
            reason,
        };
        warn!("{}", error);
        self.publish(EventKind::Error);

        if let Err(e) = self.advance(Advance::Ended) {
            warn!("Advancing after playback failure failed: {}", e);
        }
    }

    fn advance(&mut self, cause: Advance) -> Result<()> {
        let position = self.queue.position();
        let has_next = position + 1 < self.queue.len();

        match cause {
            Advance::Ended if has_next && self.queue.auto_next() => self.step_forward(position + 1),
            Advance::Ended => {
                self.stop();
                Ok(())
            }
            Advance::User if has_next => self.step_forward(position + 1),
            Advance::User if self.config.user_can_stop => {
                self.stop();
                Ok(())
            }
            Advance::User => {
                debug!("Already at the last item; ignoring next");
                Ok(())
            }
        }
    }

    fn step_forward(&mut self, index: usize) -> Result<()> {
        self.queue.set_position(index);
        self.play(index)?;
        self.publish(EventKind::NextTrack);
        Ok(())
    }

    /// Whether a newer attempt is validating while an older one is loaded
    fn is_superseded(&self) -> bool {
        match (&self.awaiting_validation, &self.loaded) {
            (Some(awaited), Some(loaded)) => loaded.generation < awaited.generation,
            _ => false,
        }
    }

    fn cancel_stall_timer(&mut self) {
        self.stall = None;
    }

    fn known_duration(&self) -> Option<f64> {
        self.primitive
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    fn publish(&self, kind: EventKind) {
        self.publish_with(kind, self.current_item(), self.queue.position());
    }

    fn publish_with(&self, kind: EventKind, song: Option<QueueItem>, position: usize) {
        let notification = Notification {
            kind,
            song,
            position,
            audio: self.audio_properties(),
            progress: self.session.progress.percent(),
            minute: self.session.minutes.minute(),
        };
        self.bus.publish(&notification);
    }

    // ===== Accessors =====

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current queue position
    pub fn position(&self) -> usize {
        self.queue.position()
    }

    /// Item at the current position, as loaded (after validation) when available
    pub fn current_item(&self) -> Option<QueueItem> {
        match &self.loaded {
            Some(loaded) if loaded.index == self.queue.position() => Some(loaded.item.clone()),
            _ => self.queue.current().cloned(),
        }
    }

    /// Fresh snapshot of the primitive
    pub fn audio_properties(&self) -> AudioProperties {
        AudioProperties {
            paused: self.primitive.paused(),
            is_stopped: self.state == PlaybackState::Stopped,
            current_time: self.primitive.current_time(),
            duration: self.known_duration(),
            src: self.primitive.source(),
            volume: self.primitive.volume(),
        }
    }

    /// Last computed progress percentage
    pub fn progress(&self) -> u32 {
        self.session.progress.percent()
    }

    /// Last computed minute index
    pub fn minute(&self) -> u64 {
        self.session.minutes.minute()
    }

    /// Deadline of the armed stall timer
    pub fn stall_deadline(&self) -> Option<Instant> {
        self.stall.map(|timer| timer.deadline)
    }

    /// Validations queued by `play` since the last call
    pub fn take_pending_validations(&mut self) -> Vec<PendingValidation> {
        std::mem::take(&mut self.pending_validations)
    }

    /// Current attempt generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    pub fn primitive_mut(&mut self) -> &mut P {
        &mut self.primitive
    }
}
