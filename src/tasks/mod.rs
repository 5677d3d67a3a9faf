//! Background tasks module
//!
//! This module contains the clock driver and the tasks that run alongside the
//! HTTP server.

pub mod clock;
pub mod window_watch;

// Re-export main items
pub use clock::{ClockHandle, DEFAULT_TICK_PERIOD};
pub use window_watch::window_watch_task;
