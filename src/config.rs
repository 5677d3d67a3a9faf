//! Configuration and CLI argument handling

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    services::geometry::Display,
    state::{RuntimeOptions, Settings},
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomodoro-daemon")]
#[command(about = "A background Pomodoro timer that pushes focus/break state to UI clients")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554", global = true)]
    pub port: u16,

    /// Host address to bind to (or connect to, for client commands)
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Focus phase duration in minutes
    #[arg(short, long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..=59))]
    pub focus_minutes: u64,

    /// Break phase duration in minutes
    #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=20))]
    pub break_minutes: u64,

    /// Window and notification backend
    #[arg(long, value_enum, default_value_t = PlatformKind::System)]
    pub platform: PlatformKind,

    /// Display geometry used to center popups, as WIDTHxHEIGHT+LEFT+TOP
    #[arg(long)]
    pub display: Option<Display>,

    /// Base URL of the UI pages opened in popup windows
    #[arg(long)]
    pub ui_url: Option<String>,

    /// Delay before every push is repeated, in milliseconds
    #[arg(long, default_value = "100")]
    pub republish_delay_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Talk to a running daemon instead of starting one
    #[command(subcommand)]
    pub command: Option<ClientCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformKind {
    /// Desktop notifications through notify-send, pages through xdg-open
    System,
    /// In-memory windows and notifications
    Headless,
}

/// Client subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Print the current timer state
    State,
    /// Start the timer
    Start {
        /// true forces a focus phase, false a break phase
        #[arg(long)]
        force_focus: Option<bool>,
    },
    /// Pause the timer
    Pause,
    /// Reset to an idle focus phase
    Reset,
    /// Change phase durations
    Settings {
        /// Focus duration in minutes (1-59)
        #[arg(long = "focus")]
        focus: Option<u64>,
        /// Break duration in minutes (1-20)
        #[arg(long = "break")]
        rest: Option<u64>,
    },
    /// Pause when running, start otherwise
    Toggle,
    /// Follow the timer by polling
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the daemon for client commands
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn settings(&self) -> Settings {
        Settings::from_minutes(self.focus_minutes, self.break_minutes)
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            republish_delay: Duration::from_millis(self.republish_delay_ms),
            ..RuntimeOptions::default()
        }
    }
}
