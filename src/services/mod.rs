//! Collaborator services module
//!
//! This module contains the push channel towards UI surfaces, the platform
//! abstraction for windows and notifications, and its implementations.

pub mod broadcast;
pub mod geometry;
pub mod headless;
pub mod notifications;
pub mod platform;
pub mod registry;
pub mod system;
pub mod windows;

// Re-export main types
pub use broadcast::{Broadcaster, PushEvent};
pub use headless::HeadlessPlatform;
pub use platform::Platform;
pub use system::{check_notify_send_available, SystemPlatform};
