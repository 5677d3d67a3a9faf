//! Error types shared across the daemon and the client

use thiserror::Error;

use crate::services::platform::WindowId;

/// Failures reported by a platform collaborator (windows, notifications, displays)
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The helper program could not be spawned at all
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The helper program ran but reported failure
    #[error("{program} failed: {stderr}")]
    CommandFailed { program: &'static str, stderr: String },

    #[error("window {0} does not exist")]
    UnknownWindow(WindowId),

    #[error("notification {0} does not exist")]
    UnknownNotification(String),
}

/// Failures while touching the shared timer state
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to lock {0}: lock poisoned")]
    Poisoned(&'static str),
}

/// Failures of the HTTP client used by the control subcommands
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request to daemon failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("daemon answered with status {0}")]
    Status(reqwest::StatusCode),
}
