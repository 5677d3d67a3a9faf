//! Focus/break duration settings and validation of update requests

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Phase;

/// Accepted range for the focus duration, in minutes
pub const FOCUS_MINUTES_RANGE: std::ops::RangeInclusive<u64> = 1..=59;
/// Accepted range for the break duration, in minutes
pub const BREAK_MINUTES_RANGE: std::ops::RangeInclusive<u64> = 1..=20;

pub const DEFAULT_FOCUS_MINUTES: u64 = 50;
pub const DEFAULT_BREAK_MINUTES: u64 = 10;

/// Configured phase durations, held in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub focus_duration_seconds: u64,
    pub break_duration_seconds: u64,
}

impl Settings {
    pub fn from_minutes(focus_minutes: u64, break_minutes: u64) -> Self {
        Self::from_seconds(focus_minutes * 60, break_minutes * 60)
    }

    /// Build settings directly from seconds. Zero durations are bumped to one
    /// second so every phase has something to count down.
    pub fn from_seconds(focus_seconds: u64, break_seconds: u64) -> Self {
        Self {
            focus_duration_seconds: focus_seconds.max(1),
            break_duration_seconds: break_seconds.max(1),
        }
    }

    /// Configured duration for the given phase
    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_duration_seconds,
            Phase::Break => self.break_duration_seconds,
        }
    }

    /// Minute view sent to clients
    pub fn view(&self) -> SettingsView {
        SettingsView {
            focus_minutes: round_minutes(self.focus_duration_seconds),
            break_minutes: round_minutes(self.break_duration_seconds),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_FOCUS_MINUTES, DEFAULT_BREAK_MINUTES)
    }
}

fn round_minutes(seconds: u64) -> u64 {
    (seconds + 30) / 60
}

/// Settings as reported inside a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub focus_minutes: u64,
    pub break_minutes: u64,
}

/// Raw `UPDATE_SETTINGS` payload.
///
/// Values are kept as raw JSON so that a non-numeric field does not fail the
/// whole request; it is rejected during [`SettingsUpdate::validate`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, alias = "focusTime", skip_serializing_if = "Option::is_none")]
    pub focus_minutes: Option<Value>,
    #[serde(default, alias = "breakTime", skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<Value>,
}

/// A settings update whose every field passed validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidUpdate {
    pub focus_minutes: Option<u64>,
    pub break_minutes: Option<u64>,
}

impl SettingsUpdate {
    pub fn new(focus_minutes: Option<u64>, break_minutes: Option<u64>) -> Self {
        Self {
            focus_minutes: focus_minutes.map(Value::from),
            break_minutes: break_minutes.map(Value::from),
        }
    }

    /// Validate every present field. Any malformed or out-of-range field
    /// rejects the whole update.
    pub fn validate(&self) -> Option<ValidUpdate> {
        let focus_minutes = match &self.focus_minutes {
            Some(value) => Some(parse_minutes(value, &FOCUS_MINUTES_RANGE)?),
            None => None,
        };
        let break_minutes = match &self.break_minutes {
            Some(value) => Some(parse_minutes(value, &BREAK_MINUTES_RANGE)?),
            None => None,
        };
        Some(ValidUpdate { focus_minutes, break_minutes })
    }
}

impl ValidUpdate {
    pub fn is_empty(&self) -> bool {
        self.focus_minutes.is_none() && self.break_minutes.is_none()
    }

    /// Whether this update edits the duration of `phase`
    pub fn touches(&self, phase: Phase) -> bool {
        match phase {
            Phase::Focus => self.focus_minutes.is_some(),
            Phase::Break => self.break_minutes.is_some(),
        }
    }

    pub fn apply(&self, settings: &mut Settings) {
        if let Some(minutes) = self.focus_minutes {
            settings.focus_duration_seconds = minutes * 60;
        }
        if let Some(minutes) = self.break_minutes {
            settings.break_duration_seconds = minutes * 60;
        }
    }
}

/// Accept whole numbers, either as JSON numbers or numeric strings
fn parse_minutes(value: &Value, range: &std::ops::RangeInclusive<u64>) -> Option<u64> {
    let minutes = match value {
        Value::Number(number) => match number.as_u64() {
            Some(minutes) => minutes,
            None => {
                let float = number.as_f64()?;
                if float.fract() != 0.0 || float < 0.0 {
                    return None;
                }
                float as u64
            }
        },
        Value::String(text) => text.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    range.contains(&minutes).then_some(minutes)
}
