//! Headless platform: windows and notifications live in memory.
//!
//! Used for tests and for running the daemon without a desktop session.
//! Buttons are pressed through [`Platform::press_button`], which the HTTP API
//! exposes to clients.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::error::PlatformError;

use super::{
    geometry::Display,
    platform::{
        NotificationId, NotificationRequest, Platform, WindowEvent, WindowId, WindowInfo,
        WindowSpec,
    },
    registry::{PendingNotifications, WindowRegistry},
};

/// A notification raised on the headless platform
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub request: NotificationRequest,
    pub cleared: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    displays: Vec<Display>,
    /// Offset applied to every created window, mimicking a window manager
    /// that does not honor the requested position
    placement_offset: (i32, i32),
    windows: WindowRegistry,
    created: Mutex<Vec<WindowSpec>>,
    moves: Mutex<Vec<(WindowId, i32, i32)>>,
    pending: PendingNotifications,
    notifications: Mutex<Vec<NotificationRecord>>,
}

impl HeadlessPlatform {
    pub fn new(displays: Vec<Display>) -> Self {
        Self {
            displays,
            ..Self::default()
        }
    }

    pub fn with_placement_offset(mut self, dx: i32, dy: i32) -> Self {
        self.placement_offset = (dx, dy);
        self
    }

    /// Every window creation request seen so far
    pub fn created_windows(&self) -> Vec<WindowSpec> {
        self.created.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every corrective move issued so far
    pub fn moves(&self) -> Vec<(WindowId, i32, i32)> {
        self.moves.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulate the user dismissing a notification without a button
    pub fn dismiss(&self, id: &NotificationId) -> bool {
        self.pending.resolve(id, None)
    }
}

#[async_trait]
impl Platform for HeadlessPlatform {
    async fn displays(&self) -> Result<Vec<Display>, PlatformError> {
        Ok(self.displays.clone())
    }

    async fn create_window(&self, spec: WindowSpec) -> Result<WindowInfo, PlatformError> {
        let info = self.windows.open(&spec, self.placement_offset);
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(spec);
        Ok(info)
    }

    async fn get_window(&self, id: WindowId) -> Result<Option<WindowInfo>, PlatformError> {
        Ok(self.windows.get(id))
    }

    async fn move_window(&self, id: WindowId, left: i32, top: i32) -> Result<(), PlatformError> {
        self.windows.move_to(id, left, top)?;
        self.moves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, left, top));
        Ok(())
    }

    async fn remove_window(&self, id: WindowId) -> Result<(), PlatformError> {
        self.windows.remove(id)
    }

    fn window_events(&self) -> broadcast::Receiver<WindowEvent> {
        self.windows.subscribe()
    }

    async fn create_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<NotificationId, PlatformError> {
        let id = self.pending.register("pomodoro-notification");
        info!("Notification {}: {} - {}", id, request.title, request.message);
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(NotificationRecord {
                id: id.clone(),
                request,
                cleared: false,
            });
        Ok(id)
    }

    async fn wait_for_button(&self, id: &NotificationId) -> Result<Option<usize>, PlatformError> {
        self.pending.wait(id).await
    }

    async fn clear_notification(&self, id: &NotificationId) -> Result<(), PlatformError> {
        self.pending.clear(id);
        let mut notifications = self.notifications.lock().unwrap_or_else(PoisonError::into_inner);
        let record = notifications
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| PlatformError::UnknownNotification(id.to_string()))?;
        record.cleared = true;
        Ok(())
    }

    fn press_button(&self, id: &NotificationId, index: usize) -> bool {
        self.pending.resolve(id, Some(index))
    }
}
