/// Simulated playback primitive
///
/// Plays every locator as a silent track of fixed length, driven by the tokio
/// clock. Locators containing `fail` report a load error and locators
/// containing `stall` never become ready.
use crate::config::SimulationSettings;
use cadence_playback::{PlaybackPrimitive, PrimitiveSignal, SignalSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Locator marker that makes the load fail
pub const FAIL_MARKER: &str = "fail";

/// Locator marker that makes the load hang
pub const STALL_MARKER: &str = "stall";

#[derive(Debug)]
struct SimState {
    src: Option<String>,
    paused: bool,
    current_time: f64,
    duration: Option<f64>,
    volume: f64,
    /// Bumped on every load; background tasks for older loads exit
    load_id: u64,
    /// Bumped on every play; at most one ticker runs
    run_id: u64,
    signals: Option<SignalSender>,
}

impl SimState {
    fn emit(&self, signal: PrimitiveSignal) {
        if let Some(signals) = &self.signals {
            signals.emit(signal);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedPrimitive {
    state: Arc<Mutex<SimState>>,
    settings: SimulationSettings,
}

impl SimulatedPrimitive {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                src: None,
                paused: true,
                current_time: 0.0,
                duration: None,
                volume: 1.0,
                load_id: 0,
                run_id: 0,
                signals: None,
            })),
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_loader(&self, load_id: u64, url: String) {
        let state = Arc::clone(&self.state);
        let delay = Duration::from_millis(self.settings.load_delay_ms);
        let track_secs = self.settings.track_secs;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut sim = state.lock().unwrap_or_else(PoisonError::into_inner);
            if sim.load_id != load_id {
                return;
            }

            if url.contains(FAIL_MARKER) {
                debug!("Simulating load failure for {}", url);
                sim.emit(PrimitiveSignal::Error(format!("cannot decode {}", url)));
            } else if url.contains(STALL_MARKER) {
                debug!("Simulating stalled load for {}", url);
            } else {
                sim.duration = Some(track_secs);
                sim.emit(PrimitiveSignal::CanPlay);
            }
        });
    }

    fn spawn_ticker(&self, load_id: u64, run_id: u64) {
        let state = Arc::clone(&self.state);
        let tick = Duration::from_millis(self.settings.tick_ms);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let mut sim = state.lock().unwrap_or_else(PoisonError::into_inner);
                if sim.load_id != load_id || sim.run_id != run_id || sim.paused {
                    break;
                }

                sim.current_time += tick.as_secs_f64();
                let current_time = sim.current_time;
                if let Some(duration) = sim.duration.filter(|d| current_time >= *d) {
                    sim.current_time = duration;
                    sim.paused = true;
                    sim.emit(PrimitiveSignal::TimeUpdate);
                    sim.emit(PrimitiveSignal::Ended);
                    break;
                }
                sim.emit(PrimitiveSignal::TimeUpdate);
            }
        });
    }
}

impl PlaybackPrimitive for SimulatedPrimitive {
    fn load(&mut self, url: &str) {
        let load_id = {
            let mut state = self.lock();
            state.load_id += 1;
            state.src = Some(url.to_string());
            state.paused = true;
            state.current_time = 0.0;
            state.duration = None;
            state.load_id
        };
        self.spawn_loader(load_id, url.to_string());
    }

    fn play(&mut self) {
        let (load_id, run_id) = {
            let mut state = self.lock();
            if state.src.is_none() || !state.paused {
                return;
            }
            state.paused = false;
            state.run_id += 1;
            state.emit(PrimitiveSignal::Play);
            (state.load_id, state.run_id)
        };
        self.spawn_ticker(load_id, run_id);
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        if !state.paused {
            state.paused = true;
            state.emit(PrimitiveSignal::Pause);
        }
    }

    fn current_time(&self) -> f64 {
        self.lock().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = self.lock();
        state.current_time = match state.duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        };
    }

    fn duration(&self) -> Option<f64> {
        self.lock().duration
    }

    fn paused(&self) -> bool {
        self.lock().paused
    }

    fn volume(&self) -> f64 {
        self.lock().volume
    }

    fn source(&self) -> Option<String> {
        self.lock().src.clone()
    }

    fn attach(&mut self, signals: SignalSender) {
        self.lock().signals = Some(signals);
    }

    fn detach(&mut self) {
        let mut state = self.lock();
        state.signals = None;
        // Stop background tasks
        state.load_id += 1;
        state.paused = true;
    }
}
