//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::windows::TrackedWindows,
    state::{LastAction, Snapshot},
};

/// Status response with timer, window and server information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub timer: Snapshot,
    pub active_clocks: usize,
    pub windows: TrackedWindows,
    pub uptime: String,
    pub last_action: Option<LastAction>,
}

/// Answer to a notification button press
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonResponse {
    pub accepted: bool,
}

/// Answer to the status window toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusWindowResponse {
    pub open: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
