//! Client commands and their `{type, payload}` message form

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{settings::SettingsUpdate, timer_state::Phase};

/// Optional `START_TIMER` payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// `true` forces a focus phase, `false` a break phase
    #[serde(default, alias = "resetMode", skip_serializing_if = "Option::is_none")]
    pub force_focus: Option<bool>,
}

impl StartOptions {
    pub fn forced_phase(&self) -> Option<Phase> {
        self.force_focus
            .map(|focus| if focus { Phase::Focus } else { Phase::Break })
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    GetState,
    StartTimer(StartOptions),
    PauseTimer,
    ResetTimer,
    UpdateSettings(SettingsUpdate),
    /// Pause when running, start otherwise
    ToggleTimer,
}

impl Command {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetState => "GET_STATE",
            Command::StartTimer(_) => "START_TIMER",
            Command::PauseTimer => "PAUSE_TIMER",
            Command::ResetTimer => "RESET_TIMER",
            Command::UpdateSettings(_) => "UPDATE_SETTINGS",
            Command::ToggleTimer => "TOGGLE_TIMER",
        }
    }

    /// Interpret a `{type, payload}` message. Unknown or malformed messages
    /// read as `GET_STATE` so the sender still gets the current state back.
    pub fn from_message(message: &Value) -> Self {
        let payload = message.get("payload").cloned().unwrap_or(Value::Null);
        match message.get("type").and_then(Value::as_str) {
            Some("START_TIMER") => Command::StartTimer(serde_json::from_value(payload).unwrap_or_default()),
            Some("PAUSE_TIMER") => Command::PauseTimer,
            Some("RESET_TIMER") => Command::ResetTimer,
            Some("UPDATE_SETTINGS") => {
                Command::UpdateSettings(serde_json::from_value(payload).unwrap_or_default())
            }
            Some("TOGGLE_TIMER") => Command::ToggleTimer,
            _ => Command::GetState,
        }
    }

    pub fn to_message(&self) -> Value {
        match self {
            Command::StartTimer(options) if options.force_focus.is_some() => {
                json!({ "type": self.name(), "payload": options })
            }
            Command::UpdateSettings(update) => json!({ "type": self.name(), "payload": update }),
            _ => json!({ "type": self.name() }),
        }
    }
}
