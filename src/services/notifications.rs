//! Notification surface: phase-end popups and the continue/pause decision

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    error::PlatformError,
    state::{AppState, Phase},
};

use super::{
    platform::{NotificationKind, NotificationRequest, Platform},
    windows,
};

pub const CONTINUE_BUTTON: &str = "Start next phase";
pub const PAUSE_BUTTON: &str = "Pause";

/// What the user chose once a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Pause,
}

impl Decision {
    /// The first button continues; anything else, dismissal included, pauses
    pub fn from_button(button: Option<usize>) -> Self {
        match button {
            Some(0) => Decision::Continue,
            _ => Decision::Pause,
        }
    }
}

fn buttons() -> Vec<String> {
    vec![CONTINUE_BUTTON.to_string(), PAUSE_BUTTON.to_string()]
}

pub fn phase_ended_request(ended: Phase) -> NotificationRequest {
    let (title, message) = match ended {
        Phase::Focus => ("Focus session complete!", "Time to take a break."),
        Phase::Break => ("Break is over!", "Ready to start a new focus session?"),
    };
    NotificationRequest {
        kind: NotificationKind::PhaseEnded(ended),
        title: title.to_string(),
        message: message.to_string(),
        buttons: buttons(),
    }
}

pub fn near_expiry_request(phase: Phase) -> NotificationRequest {
    let title = match phase {
        Phase::Focus => "Focus session ending soon",
        Phase::Break => "Break ending soon",
    };
    NotificationRequest {
        kind: NotificationKind::NearExpiry(phase),
        title: title.to_string(),
        message: "3 seconds left".to_string(),
        buttons: buttons(),
    }
}

/// Raise a notification and wait for its answer, clearing it afterwards
pub async fn ask(
    platform: &dyn Platform,
    request: NotificationRequest,
) -> Result<Option<usize>, PlatformError> {
    let id = platform.create_notification(request).await?;
    let button = platform.wait_for_button(&id).await?;
    if let Err(e) = platform.clear_notification(&id).await {
        debug!("Failed to clear notification {}: {}", id, e);
    }
    Ok(button)
}

/// End-of-phase flow. The state has already flipped to the next phase; this
/// plays the sound, opens the popup and applies the user's decision.
pub async fn phase_completed(state: Arc<AppState>, ended: Phase) -> Decision {
    if let Some(warning) = state.take_warning(ended) {
        debug!("Clearing near-expiry warning {}", warning);
        if let Err(e) = state.platform().clear_notification(&warning).await {
            debug!("Failed to clear near-expiry warning {}: {}", warning, e);
        }
    }

    state.broadcaster().play_sound(ended);

    if let Err(e) = windows::open_end_of_phase_window(&state, ended).await {
        warn!("Failed to open end-of-phase window: {}", e);
    }

    let decision = match ask(state.platform().as_ref(), phase_ended_request(ended)).await {
        Ok(button) => Decision::from_button(button),
        Err(e) => {
            warn!("Failed to collect end-of-{} decision: {}", ended, e);
            Decision::Pause
        }
    };

    match decision {
        Decision::Continue => {
            info!("User chose to start the next phase");
            if let Err(e) = state.start(None) {
                error!("Failed to start next phase: {}", e);
            }
        }
        Decision::Pause => info!("User chose to pause after {} phase", ended),
    }
    decision
}

/// Advance warning. Informational: its buttons only dismiss it. The end of
/// the phase clears it if it is still showing.
pub async fn near_expiry(state: Arc<AppState>, phase: Phase) {
    let platform = state.platform();
    let id = match platform.create_notification(near_expiry_request(phase)).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Failed to show near-expiry notification: {}", e);
            return;
        }
    };
    if let Some(previous) = state.track_warning(phase, id.clone()) {
        if let Err(e) = platform.clear_notification(&previous).await {
            debug!("Failed to clear stale warning {}: {}", previous, e);
        }
    }

    match platform.wait_for_button(&id).await {
        Ok(Some(button)) => debug!("Warning notification button {} ignored", button),
        Ok(None) => {}
        Err(e) => debug!("Warning notification {} gone: {}", id, e),
    }
    state.forget_warning(&id);
    if let Err(e) = platform.clear_notification(&id).await {
        debug!("Failed to clear notification {}: {}", id, e);
    }
}
