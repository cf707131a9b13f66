//! Host media-control integration
//!
//! Some hosts expose a system-level media surface (lock screen, media keys).
//! It is an optional capability: the player registers its handlers when one
//! is present and carries on without it otherwise.

use tokio::sync::mpsc;

/// Actions a host media surface can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Play,
    Pause,
    PreviousTrack,
    NextTrack,
}

/// Handle the host invokes when the user presses a media control
#[derive(Debug, Clone)]
pub struct MediaControls {
    tx: mpsc::UnboundedSender<HostAction>,
}

impl MediaControls {
    pub(crate) fn new(tx: mpsc::UnboundedSender<HostAction>) -> Self {
        Self { tx }
    }

    fn send(&self, action: HostAction) -> bool {
        self.tx.send(action).is_ok()
    }

    pub fn play(&self) -> bool {
        self.send(HostAction::Play)
    }

    pub fn pause(&self) -> bool {
        self.send(HostAction::Pause)
    }

    pub fn previous_track(&self) -> bool {
        self.send(HostAction::PreviousTrack)
    }

    pub fn next_track(&self) -> bool {
        self.send(HostAction::NextTrack)
    }
}

/// Host media surface
pub trait MediaSession: Send {
    /// Install action handlers. Hosts without support return an error.
    fn set_action_handlers(&mut self, controls: MediaControls) -> Result<(), String>;

    /// Remove previously installed handlers
    fn clear_action_handlers(&mut self) {}
}
