//! In-memory bookkeeping shared by the platform implementations

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use tokio::sync::{broadcast, oneshot};
use tracing::debug;

use crate::error::PlatformError;

use super::platform::{NotificationId, WindowEvent, WindowId, WindowInfo, WindowSpec};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks open windows and announces their removal
#[derive(Debug)]
pub struct WindowRegistry {
    next_id: AtomicU64,
    windows: Mutex<HashMap<WindowId, WindowInfo>>,
    events_tx: broadcast::Sender<WindowEvent>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(32);
        Self {
            next_id: AtomicU64::new(1),
            windows: Mutex::new(HashMap::new()),
            events_tx,
        }
    }

    /// Register a window. `offset` simulates window managers that ignore the
    /// requested position.
    pub fn open(&self, spec: &WindowSpec, offset: (i32, i32)) -> WindowInfo {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let info = WindowInfo {
            id,
            left: spec.placement.left + offset.0,
            top: spec.placement.top + offset.1,
            width: spec.placement.width,
            height: spec.placement.height,
        };
        lock(&self.windows).insert(id, info);
        debug!("Window {} registered for {}", id, spec.url);
        info
    }

    pub fn get(&self, id: WindowId) -> Option<WindowInfo> {
        lock(&self.windows).get(&id).copied()
    }

    pub fn move_to(&self, id: WindowId, left: i32, top: i32) -> Result<(), PlatformError> {
        let mut windows = lock(&self.windows);
        let window = windows.get_mut(&id).ok_or(PlatformError::UnknownWindow(id))?;
        window.left = left;
        window.top = top;
        Ok(())
    }

    pub fn remove(&self, id: WindowId) -> Result<(), PlatformError> {
        lock(&self.windows)
            .remove(&id)
            .ok_or(PlatformError::UnknownWindow(id))?;
        // Nobody listening is fine
        let _ = self.events_tx.send(WindowEvent::Removed(id));
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.events_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        lock(&self.windows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications waiting for a button click
#[derive(Debug, Default)]
pub struct PendingNotifications {
    next_id: AtomicU64,
    senders: Mutex<HashMap<NotificationId, oneshot::Sender<Option<usize>>>>,
    receivers: Mutex<HashMap<NotificationId, oneshot::Receiver<Option<usize>>>>,
}

impl PendingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and the channel its button click travels through
    pub fn register(&self, prefix: &str) -> NotificationId {
        let id = NotificationId(format!(
            "{}-{}",
            prefix,
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        ));
        let (tx, rx) = oneshot::channel();
        lock(&self.senders).insert(id.clone(), tx);
        lock(&self.receivers).insert(id.clone(), rx);
        id
    }

    /// Resolve a notification with the clicked button, or `None` on dismissal
    pub fn resolve(&self, id: &NotificationId, button: Option<usize>) -> bool {
        match lock(&self.senders).remove(id) {
            Some(tx) => tx.send(button).is_ok(),
            None => false,
        }
    }

    pub async fn wait(&self, id: &NotificationId) -> Result<Option<usize>, PlatformError> {
        let rx = lock(&self.receivers)
            .remove(id)
            .ok_or_else(|| PlatformError::UnknownNotification(id.to_string()))?;
        // A dropped sender means the notification was cleared
        Ok(rx.await.unwrap_or(None))
    }

    /// Drop the pending click channel; a waiter sees a dismissal
    pub fn clear(&self, id: &NotificationId) {
        lock(&self.senders).remove(id);
    }

    pub fn is_pending(&self, id: &NotificationId) -> bool {
        lock(&self.senders).contains_key(id)
    }
}
