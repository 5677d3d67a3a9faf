//! State management module
//!
//! This module contains the timer state machine, its settings, the commands
//! clients send, and the shared application state tying them to the clock
//! and the push channel.

pub mod app_state;
pub mod command;
pub mod machine;
pub mod settings;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, LastAction, RuntimeOptions};
pub use command::{Command, StartOptions};
pub use machine::{TickOutcome, TimerMachine};
pub use settings::{Settings, SettingsUpdate, SettingsView};
pub use timer_state::{Phase, Snapshot, TimerState};
