//! Window closure watcher task

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{services::platform::WindowEvent, state::AppState};

/// Background task that forgets tracked windows once the platform reports
/// them closed
pub async fn window_watch_task(state: Arc<AppState>) {
    info!("Starting window watch task");

    let mut events = state.platform().window_events();
    loop {
        match events.recv().await {
            Ok(WindowEvent::Removed(id)) => state.on_window_removed(id),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Window watcher lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Window event stream closed");
                break;
            }
        }
    }
}
