//! Pomodoro Daemon - A background focus/break timer for UI surfaces
//!
//! This is the main entry point: it either serves the timer or, given a
//! subcommand, talks to an already running daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use pomodoro_daemon::{
    api::create_router,
    client,
    config::{Config, PlatformKind},
    services::{check_notify_send_available, HeadlessPlatform, Platform, SystemPlatform},
    state::AppState,
    tasks::window_watch_task,
    utils::shutdown_signal,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_daemon={},tower_http=info", config.log_level()))
        .init();

    if let Some(command) = &config.command {
        client::run(&config, command).await?;
        return Ok(());
    }

    info!("Starting pomodoro-daemon v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, focus={}min, break={}min, platform={:?}",
        config.host, config.port, config.focus_minutes, config.break_minutes, config.platform
    );

    let platform: Arc<dyn Platform> = match config.platform {
        PlatformKind::System => {
            // Notifications still degrade to dismissals without notify-send
            if let Err(e) = check_notify_send_available().await {
                warn!("{}", e);
            }
            Arc::new(SystemPlatform::new(config.display, config.ui_url.clone()))
        }
        PlatformKind::Headless => {
            let displays = config.display.into_iter().collect();
            Arc::new(HeadlessPlatform::new(displays))
        }
    };

    // Create application state
    let state = AppState::new(config.settings(), platform, config.runtime_options());

    // Forget tracked windows once the platform reports them closed
    tokio::spawn(window_watch_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /command        - {{type, payload}} message protocol");
    info!("  GET  /state          - Current timer snapshot");
    info!("  POST /start|/pause|/reset|/toggle|/settings");
    info!("  POST /status-window  - Show or hide the status window");
    info!("  GET  /events         - Server-sent TIME_UPDATE / PLAY_SOUND pushes");
    info!("  GET  /status         - Timer, windows and server information");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
