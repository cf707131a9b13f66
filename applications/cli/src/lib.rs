//! Cadence CLI Library
//!
//! Runs a queue of locators through the playback controller on a simulated
//! primitive and reports every notification.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod error;
pub mod session;
pub mod simulator;

// Re-export commonly used types for convenience
pub use config::{CliConfig, QueueSettings, SimulationSettings};
pub use error::{CliError, Result};
pub use session::{Output, SessionSummary};
pub use simulator::SimulatedPrimitive;
