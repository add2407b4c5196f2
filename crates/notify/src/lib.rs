//! Alert delivery for detected anomalies.
//!
//! This crate provides:
//! - `Notifier` trait with an SNS implementation
//! - Minijinja rendering of alert, status and error messages
//! - `HeartbeatGate`, the throttle for "all clear" notices

pub mod compose;
pub mod heartbeat;
pub mod sns;
pub mod templating;
pub mod traits;

pub use compose::{sanitize_subject, Composer, MAX_SUBJECT_CHARS};
pub use heartbeat::HeartbeatGate;
pub use sns::SnsNotifier;
pub use traits::{Notification, Notifier, NotifyError};
