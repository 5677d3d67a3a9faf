//! Pomodoro Daemon - A background focus/break timer for UI surfaces
//!
//! This library provides the timer state machine, the push channel towards
//! connected surfaces, the end-of-phase notification flow and the HTTP
//! command protocol, plus a small client for talking to a running daemon.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
