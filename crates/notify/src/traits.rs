//! Notifier trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SNS request failed: {0}")]
    Sns(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Notification {
    /// One-line subject.
    pub subject: String,
    /// The rendered body content.
    pub body: String,
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification, returning the channel's message id.
    async fn publish(&self, notification: &Notification) -> Result<String, NotifyError>;

    /// Verify the channel is reachable without sending anything.
    async fn check(&self) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "sns").
    fn channel_name(&self) -> &str;
}
