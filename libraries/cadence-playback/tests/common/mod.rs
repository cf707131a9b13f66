//! Shared test infrastructure: a scriptable primitive and a notification recorder

#![allow(dead_code)]

use cadence_playback::{
    EventKind, MemoryQueue, Notification, NotificationBus, PlaybackConfig, PlaybackController,
    PlaybackPrimitive, QueueItem, SignalSender,
};
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// Mock primitive
// ============================================================================

/// State of the mock primitive, shared with the test body
#[derive(Debug)]
pub struct MockState {
    pub src: Option<String>,
    pub loads: Vec<String>,
    pub paused: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
    /// Duration reported after each load
    pub duration_on_load: Option<f64>,
    pub volume: f64,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub signals: Option<SignalSender>,
    pub detached: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            src: None,
            loads: Vec::new(),
            paused: true,
            current_time: 0.0,
            duration: None,
            duration_on_load: Some(180.0),
            volume: 1.0,
            play_calls: 0,
            pause_calls: 0,
            signals: None,
            detached: false,
        }
    }
}

/// Primitive whose state lives behind a shared lock
#[derive(Debug, Clone, Default)]
pub struct MockPrimitive {
    state: Arc<Mutex<MockState>>,
}

impl MockPrimitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_time(&self, seconds: f64) {
        self.state().current_time = seconds;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        self.state().duration = duration;
    }

    pub fn loads(&self) -> Vec<String> {
        self.state().loads.clone()
    }
}

impl PlaybackPrimitive for MockPrimitive {
    fn load(&mut self, url: &str) {
        let mut state = self.state();
        state.src = Some(url.to_string());
        state.loads.push(url.to_string());
        state.paused = true;
        state.current_time = 0.0;
        state.duration = state.duration_on_load;
    }

    fn play(&mut self) {
        let mut state = self.state();
        state.paused = false;
        state.play_calls += 1;
    }

    fn pause(&mut self) {
        let mut state = self.state();
        state.paused = true;
        state.pause_calls += 1;
    }

    fn current_time(&self) -> f64 {
        self.state().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.state().current_time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.state().duration
    }

    fn paused(&self) -> bool {
        self.state().paused
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }

    fn source(&self) -> Option<String> {
        self.state().src.clone()
    }

    fn attach(&mut self, signals: SignalSender) {
        self.state().signals = Some(signals);
    }

    fn detach(&mut self) {
        let mut state = self.state();
        state.signals = None;
        state.detached = true;
    }
}

// ============================================================================
// Notification recorder
// ============================================================================

/// Records every notification published on a bus
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl Recorder {
    pub fn attach(bus: &NotificationBus) -> Self {
        let recorder = Self::default();
        for kind in EventKind::ALL {
            let events = Arc::clone(&recorder.events);
            bus.subscribe(kind, move |notification| {
                events.lock().unwrap().push(notification.clone());
            });
        }
        recorder
    }

    pub fn all(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.all().iter().map(|n| n.kind).collect()
    }

    pub fn of(&self, kind: EventKind) -> Vec<Notification> {
        self.all().into_iter().filter(|n| n.kind == kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of(kind).len()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn url(index: usize) -> String {
    format!("https://example.com/track{}.mp3", index)
}

pub fn items(count: usize) -> Vec<QueueItem> {
    (0..count)
        .map(|i| QueueItem::with_id(format!("track{}", i), url(i)))
        .collect()
}

pub struct Harness {
    pub controller: PlaybackController<MockPrimitive, MemoryQueue>,
    pub primitive: MockPrimitive,
    pub recorder: Recorder,
    pub bus: NotificationBus,
}

pub fn harness_with(queue: MemoryQueue, config: PlaybackConfig) -> Harness {
    let bus = NotificationBus::new();
    let recorder = Recorder::attach(&bus);
    let primitive = MockPrimitive::new();
    let controller = PlaybackController::new(primitive.clone(), queue, bus.clone(), config)
        .expect("valid config");

    Harness {
        controller,
        primitive,
        recorder,
        bus,
    }
}

pub fn harness(count: usize) -> Harness {
    harness_with(
        MemoryQueue::from_items(items(count)),
        PlaybackConfig::default(),
    )
}
