//! Desktop platform backed by system helpers
//!
//! Notifications go through `notify-send --wait --action`, popup windows are
//! launched with `xdg-open` when a UI URL is configured. Window geometry is
//! tracked in memory since the launched UI owns its real window.

use std::{
    collections::HashMap,
    process::{Output, Stdio},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::{process::Command, sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::error::PlatformError;

use super::{
    geometry::Display,
    platform::{
        NotificationId, NotificationRequest, Platform, WindowEvent, WindowId, WindowInfo,
        WindowSpec,
    },
    registry::{PendingNotifications, WindowRegistry},
};

const NOTIFY_SEND: &str = "notify-send";
const XDG_OPEN: &str = "xdg-open";

#[derive(Debug)]
pub struct SystemPlatform {
    display: Option<Display>,
    ui_url: Option<String>,
    windows: WindowRegistry,
    pending: Arc<PendingNotifications>,
    waiters: Mutex<HashMap<NotificationId, JoinHandle<()>>>,
}

impl SystemPlatform {
    pub fn new(display: Option<Display>, ui_url: Option<String>) -> Self {
        Self {
            display,
            ui_url,
            windows: WindowRegistry::new(),
            pending: Arc::new(PendingNotifications::new()),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    async fn launch_ui(&self, path: &str) -> Result<(), PlatformError> {
        let Some(base) = &self.ui_url else {
            debug!("No UI URL configured, popup {} stays virtual", path);
            return Ok(());
        };
        let url = format!("{}/{}", base.trim_end_matches('/'), path);

        Command::new(XDG_OPEN)
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlatformError::Spawn { program: XDG_OPEN, source })?;

        info!("Opened popup {}", url);
        Ok(())
    }
}

#[async_trait]
impl Platform for SystemPlatform {
    async fn displays(&self) -> Result<Vec<Display>, PlatformError> {
        Ok(self.display.into_iter().collect())
    }

    async fn create_window(&self, spec: WindowSpec) -> Result<WindowInfo, PlatformError> {
        self.launch_ui(&spec.url).await?;
        Ok(self.windows.open(&spec, (0, 0)))
    }

    async fn get_window(&self, id: WindowId) -> Result<Option<WindowInfo>, PlatformError> {
        Ok(self.windows.get(id))
    }

    async fn move_window(&self, id: WindowId, left: i32, top: i32) -> Result<(), PlatformError> {
        self.windows.move_to(id, left, top)
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
        let mut command = Command::new(NOTIFY_SEND);
        command
            .arg("--app-name=pomodoro")
            .arg("--urgency=critical")
            .arg("--wait");
        for (index, label) in request.buttons.iter().enumerate() {
            command.arg(format!("--action=b{}={}", index, label));
        }
        command
            .arg(&request.title)
            .arg(&request.message)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|source| PlatformError::Spawn { program: NOTIFY_SEND, source })?;

        let id = self.pending.register("pomodoro-notification");
        let pending = Arc::clone(&self.pending);
        let waiter_id = id.clone();
        let waiter = tokio::spawn(async move {
            let button = match chosen_button(child.wait_with_output().await) {
                Ok(button) => button,
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            pending.resolve(&waiter_id, button);
        });

        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.insert(id.clone(), waiter);
        }
        info!("Notification {} raised: {}", id, request.title);
        Ok(id)
    }

    async fn wait_for_button(&self, id: &NotificationId) -> Result<Option<usize>, PlatformError> {
        self.pending.wait(id).await
    }

    async fn clear_notification(&self, id: &NotificationId) -> Result<(), PlatformError> {
        self.pending.clear(id);
        let waiter = self.waiters.lock().ok().and_then(|mut waiters| waiters.remove(id));
        // Aborting the waiter drops the child, which kills notify-send
        if let Some(waiter) = waiter {
            waiter.abort();
        }
        Ok(())
    }

    /// Buttons rendered by the UI popup answer the same pending notification
    fn press_button(&self, id: &NotificationId, index: usize) -> bool {
        self.pending.resolve(id, Some(index))
    }
}

/// Button chosen in a finished `notify-send --wait`; `None` when dismissed
fn chosen_button(output: std::io::Result<Output>) -> Result<Option<usize>, PlatformError> {
    let output = output.map_err(|source| PlatformError::Spawn { program: NOTIFY_SEND, source })?;
    if !output.status.success() {
        return Err(PlatformError::CommandFailed {
            program: NOTIFY_SEND,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(parse_action(&String::from_utf8_lossy(&output.stdout)))
}

/// Map `notify-send` action output (`b0`, `b1`, ...) to a button index
fn parse_action(stdout: &str) -> Option<usize> {
    stdout.trim().strip_prefix('b')?.parse().ok()
}

/// Check if notify-send is available on the system
pub async fn check_notify_send_available() -> Result<(), String> {
    Command::new(NOTIFY_SEND)
        .arg("--version")
        .output()
        .await
        .map_err(|_| format!("{} is not available, desktop notifications are disabled", NOTIFY_SEND))?;

    info!("{} is available", NOTIFY_SEND);
    Ok(())
}
