//! HTTP endpoint handlers
//!
//! Every timer endpoint answers with a snapshot. Bodies are parsed leniently:
//! a malformed body never turns into an error response.

use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::{
    services::platform::{NotificationId, WindowId},
    state::{AppState, Command, SettingsUpdate, Snapshot, StartOptions},
};
use super::responses::{ButtonResponse, HealthResponse, StatusResponse, StatusWindowResponse};

fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Ignoring malformed request body: {}", e);
        T::default()
    })
}

/// Handle POST /command - `{type, payload}` message protocol
pub async fn command_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Snapshot> {
    let message: Value = parse_body(&body);
    Json(state.dispatch(Command::from_message(&message)))
}

/// Handle GET /state - Current snapshot, also used for client polling
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.dispatch(Command::GetState))
}

/// Handle POST /start - Start the timer, optionally forcing a phase
pub async fn start_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Snapshot> {
    let options: StartOptions = parse_body(&body);
    Json(state.dispatch(Command::StartTimer(options)))
}

/// Handle POST /pause - Pause the timer
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.dispatch(Command::PauseTimer))
}

/// Handle POST /reset - Reset to an idle focus phase
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.dispatch(Command::ResetTimer))
}

/// Handle POST /toggle - Pause when running, start otherwise
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.dispatch(Command::ToggleTimer))
}

/// Handle POST /settings - Update focus/break minutes
pub async fn settings_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Snapshot> {
    let update: SettingsUpdate = parse_body(&body);
    Json(state.dispatch(Command::UpdateSettings(update)))
}

/// Handle POST /status-window - Show or hide the status window
pub async fn status_window_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusWindowResponse>, StatusCode> {
    match state.toggle_status_window().await {
        Ok(open) => Ok(Json(StatusWindowResponse { open })),
        Err(e) => {
            error!("Failed to toggle status window: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /windows/:id/close - A surface reports its window closed
pub async fn close_window_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> StatusCode {
    match state.platform().remove_window(WindowId(id)).await {
        Ok(()) => {
            info!("Window {} closed by client", id);
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            warn!("Failed to close window {}: {}", id, e);
            StatusCode::NOT_FOUND
        }
    }
}

/// Handle POST /notifications/:id/buttons/:index - A notification button click
pub async fn button_handler(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
) -> Json<ButtonResponse> {
    let accepted = state.platform().press_button(&NotificationId(id.clone()), index);
    if accepted {
        info!("Button {} pressed on notification {}", index, id);
    } else {
        debug!("Button press for unknown notification {}", id);
    }
    Json(ButtonResponse { accepted })
}

/// Handle GET /events - Server-sent `TIME_UPDATE` / `PLAY_SOUND` pushes
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    debug!("Surface subscribed to push events");

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(push) => match Event::default().event(push.name()).json_data(&push) {
                    Ok(event) => return Some((Ok(event), rx)),
                    Err(e) => warn!("Failed to encode push event: {}", e),
                },
                // Missed pushes are covered by the next tick and client polling
                Err(RecvError::Lagged(skipped)) => debug!("Surface lagged by {} events", skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Timer, windows and server information
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        timer: state.best_effort_snapshot(),
        active_clocks: state.active_clocks(),
        windows: state.tracked_windows(),
        uptime: state.uptime(),
        last_action: state.last_action(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
