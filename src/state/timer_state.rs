//! Timer state structure and the snapshot sent to clients

use std::fmt;

use serde::{Deserialize, Serialize};

use super::settings::SettingsView;

/// The two alternating interval types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    /// The phase that follows this one
    pub fn next(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }

    pub fn is_break(self) -> bool {
        self == Phase::Break
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Countdown state for the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub remaining_seconds: u64,
    pub phase: Phase,
    pub running: bool,
}

impl TimerState {
    /// An idle focus timer with the given duration left
    pub fn new(focus_seconds: u64) -> Self {
        Self {
            remaining_seconds: focus_seconds,
            phase: Phase::Focus,
            running: false,
        }
    }
}

/// Serialized state pushed to and returned to UI clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub remaining_seconds: u64,
    pub phase: Phase,
    pub running: bool,
    pub settings: SettingsView,
}

impl Snapshot {
    /// `MM:SS` rendering of the remaining time
    pub fn clock_face(&self) -> String {
        format!("{:02}:{:02}", self.remaining_seconds / 60, self.remaining_seconds % 60)
    }

    /// Whether the countdown position differs from `other`, ignoring settings
    pub fn differs_from(&self, other: &Snapshot) -> bool {
        self.remaining_seconds != other.remaining_seconds
            || self.phase != other.phase
            || self.running != other.running
    }
}
