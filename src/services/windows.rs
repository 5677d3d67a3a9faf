//! Popup windows: end-of-phase and status windows

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{error::PlatformError, state::{AppState, Phase}};

use super::{
    geometry::{centered_placement, primary_display, Placement},
    platform::{Platform, WindowId, WindowInfo, WindowSpec},
};

pub const POPUP_WIDTH: u32 = 400;
pub const POPUP_HEIGHT: u32 = 600;
pub const DEFAULT_CORRECTION_DELAY: Duration = Duration::from_millis(100);

const STATUS_WINDOW_URL: &str = "index.html?source=shortcut";

/// Windows owned by the daemon, at most one of each kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedWindows {
    pub status: Option<WindowId>,
    pub end_of_phase: Option<WindowId>,
}

impl TrackedWindows {
    /// Stop tracking `id`. Returns whether it was tracked.
    pub fn forget(&mut self, id: WindowId) -> bool {
        let mut forgotten = false;
        if self.status == Some(id) {
            self.status = None;
            forgotten = true;
        }
        if self.end_of_phase == Some(id) {
            self.end_of_phase = None;
            forgotten = true;
        }
        forgotten
    }
}

fn end_of_phase_url(ended: Phase) -> String {
    format!(
        "index.html?autoplay={ended}&mode={ended}&isBreak={}&isEndScreen=true",
        ended.next().is_break()
    )
}

/// Open a popup centered on the primary display and schedule one position
/// check
pub async fn open_centered(state: &AppState, url: String) -> Result<WindowInfo, PlatformError> {
    let platform = state.platform();
    let displays = match platform.displays().await {
        Ok(displays) => displays,
        Err(e) => {
            warn!("Failed to query displays, assuming default screen: {}", e);
            Vec::new()
        }
    };
    let placement = centered_placement(POPUP_WIDTH, POPUP_HEIGHT, primary_display(&displays));

    let window = platform.create_window(WindowSpec { url, placement }).await?;
    debug!("Window {} created at {},{}", window.id, window.left, window.top);

    let platform = Arc::clone(platform);
    let delay = state.options().correction_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        correct_position(platform.as_ref(), window.id, placement).await;
    });

    Ok(window)
}

/// Move the window back to `placement` if it landed elsewhere. One attempt
/// only; returns whether a move was issued.
pub async fn correct_position(platform: &dyn Platform, id: WindowId, placement: Placement) -> bool {
    match platform.get_window(id).await {
        Ok(Some(window)) if window.left != placement.left || window.top != placement.top => {
            info!(
                "Window {} landed at {},{} instead of {},{}, moving it",
                id, window.left, window.top, placement.left, placement.top
            );
            if let Err(e) = platform.move_window(id, placement.left, placement.top).await {
                warn!("Failed to correct window {} position: {}", id, e);
            }
            true
        }
        Ok(Some(_)) => false,
        Ok(None) => {
            debug!("Window {} closed before its position check", id);
            false
        }
        Err(e) => {
            warn!("Failed to query window {}: {}", id, e);
            false
        }
    }
}

/// Open the end-of-phase window, replacing a previous one
pub async fn open_end_of_phase_window(state: &AppState, ended: Phase) -> Result<WindowId, PlatformError> {
    let window = open_centered(state, end_of_phase_url(ended)).await?;
    if let Some(previous) = state.track_end_of_phase_window(window.id) {
        if let Err(e) = state.platform().remove_window(previous).await {
            debug!("Previous end-of-phase window {} already gone: {}", previous, e);
        }
    }
    info!("End-of-phase window {} opened", window.id);
    Ok(window.id)
}

/// Close the status window if it is open, otherwise open it. Returns whether
/// the window is open afterwards.
pub async fn toggle_status_window(state: &AppState) -> Result<bool, PlatformError> {
    let platform = state.platform();

    if let Some(id) = state.tracked_windows().status {
        match platform.get_window(id).await {
            Ok(Some(_)) => {
                info!("Closing status window {}", id);
                if let Err(e) = platform.remove_window(id).await {
                    warn!("Failed to close status window {}: {}", id, e);
                }
                state.on_window_removed(id);
                return Ok(false);
            }
            Ok(None) => debug!("Status window {} was closed by the user", id),
            Err(e) => warn!("Failed to query status window {}: {}", id, e),
        }
        state.on_window_removed(id);
    }

    let window = open_centered(state, STATUS_WINDOW_URL.to_string()).await?;
    adopt_status_window(state, window.id).await;
    info!("Status window {} opened", window.id);
    Ok(true)
}

/// Track `id` as the status window, closing any window it replaces
pub async fn adopt_status_window(state: &AppState, id: WindowId) {
    if let Some(previous) = state.track_status_window(id) {
        if previous == id {
            return;
        }
        if let Err(e) = state.platform().remove_window(previous).await {
            debug!("Previous status window {} already gone: {}", previous, e);
        }
    }
}
