//! Pomodoro state machine.
//!
//! The machine is purely synchronous. It does not own a clock: the caller
//! registers a clock while the machine reports `running` and feeds it
//! `tick()` once per period.
//!
//! ```text
//! Idle(Focus) <-> Running(Focus) --expiry--> Idle(Break) <-> Running(Break)
//!      ^                                                          |
//!      +-------------------------- expiry ------------------------+
//! ```

use super::{
    settings::{Settings, ValidUpdate},
    timer_state::{Phase, Snapshot, TimerState},
};

/// Remaining seconds at which the advance warning fires
pub const WARNING_AT_SECONDS: u64 = 3;

/// Result of a single clock tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second counted down, timer still running
    Counting { remaining_seconds: u64 },
    /// One second counted down and the phase is about to end
    Warning { phase: Phase, remaining_seconds: u64 },
    /// The phase ran out; the machine flipped to the next phase and went idle
    Expired { ended: Phase },
    /// The tick came from a registration that is no longer active
    Stale,
}

impl TickOutcome {
    /// Whether the clock that produced this tick should stop
    pub fn stops_clock(&self) -> bool {
        matches!(self, TickOutcome::Expired { .. } | TickOutcome::Stale)
    }
}

#[derive(Debug, Clone)]
pub struct TimerMachine {
    settings: Settings,
    state: TimerState,
}

impl TimerMachine {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: TimerState::new(settings.focus_duration_seconds),
            settings,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            remaining_seconds: self.state.remaining_seconds,
            phase: self.state.phase,
            running: self.state.running,
            settings: self.settings.view(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Transition to running. A forced phase different from the current one
    /// switches phase and loads that phase's full duration.
    pub fn start(&mut self, force: Option<Phase>) {
        if let Some(phase) = force {
            if phase != self.state.phase {
                self.state.phase = phase;
                self.state.remaining_seconds = self.settings.duration_for(phase);
            }
        }
        if self.state.remaining_seconds == 0 {
            self.state.remaining_seconds = self.settings.duration_for(self.state.phase);
        }
        self.state.running = true;
    }

    pub fn pause(&mut self) {
        self.state.running = false;
    }

    pub fn reset(&mut self) {
        self.state = TimerState::new(self.settings.focus_duration_seconds);
    }

    /// Count one second down. Ticks while idle are stale.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.running {
            return TickOutcome::Stale;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        match self.state.remaining_seconds {
            0 => {
                let ended = self.state.phase;
                let next = ended.next();
                self.state = TimerState {
                    remaining_seconds: self.settings.duration_for(next),
                    phase: next,
                    running: false,
                };
                TickOutcome::Expired { ended }
            }
            WARNING_AT_SECONDS => TickOutcome::Warning {
                phase: self.state.phase,
                remaining_seconds: WARNING_AT_SECONDS,
            },
            remaining_seconds => TickOutcome::Counting { remaining_seconds },
        }
    }

    /// Merge a validated update. While idle, editing the active phase's
    /// duration also reloads the remaining time.
    pub fn configure(&mut self, update: ValidUpdate) {
        update.apply(&mut self.settings);
        if !self.state.running && update.touches(self.state.phase) {
            self.state.remaining_seconds = self.settings.duration_for(self.state.phase);
        }
    }
}
