//! Platform collaborator interface: displays, popup windows and notifications

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{error::PlatformError, state::Phase};

use super::geometry::{Display, Placement};

/// Opaque identifier of a platform window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a platform notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request to open a popup window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub url: String,
    pub placement: Placement,
}

/// What the platform reports about an existing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Removed(WindowId),
}

/// Why a notification is raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "phase", rename_all = "camelCase")]
pub enum NotificationKind {
    /// A few seconds remain in the phase
    NearExpiry(Phase),
    /// The phase ran out
    PhaseEnded(Phase),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub buttons: Vec<String>,
}

/// Platform windowing, notification and display APIs.
///
/// Every call may fail; callers log and absorb failures.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn displays(&self) -> Result<Vec<Display>, PlatformError>;

    async fn create_window(&self, spec: WindowSpec) -> Result<WindowInfo, PlatformError>;

    /// `Ok(None)` when the window no longer exists
    async fn get_window(&self, id: WindowId) -> Result<Option<WindowInfo>, PlatformError>;

    async fn move_window(&self, id: WindowId, left: i32, top: i32) -> Result<(), PlatformError>;

    async fn remove_window(&self, id: WindowId) -> Result<(), PlatformError>;

    /// Stream of window lifecycle events, closures in particular
    fn window_events(&self) -> broadcast::Receiver<WindowEvent>;

    async fn create_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<NotificationId, PlatformError>;

    /// Wait until a button is clicked. `Ok(None)` when the notification was
    /// dismissed or cleared without a button.
    async fn wait_for_button(&self, id: &NotificationId) -> Result<Option<usize>, PlatformError>;

    async fn clear_notification(&self, id: &NotificationId) -> Result<(), PlatformError>;

    /// Feed a button click coming from outside the platform (e.g. an HTTP
    /// client). Returns `false` when the platform collects clicks itself or
    /// the notification is unknown.
    fn press_button(&self, _id: &NotificationId, _index: usize) -> bool {
        false
    }
}
