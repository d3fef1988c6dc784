use std::time::Duration;

/// A rendered document attached to a notification. The bytes are exactly
/// what the renderer produced; no re-rendering happens downstream.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

/// One outbound confirmation message.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<EmailAttachment>,
}

/// Outbound notification seam. Implementations send at most once per call
/// and never retry internally; transient transport failures surface as
/// [`DispatchError`] for the orchestrator to handle.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, message: EmailMessage) -> Result<(), DispatchError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("mail transport failed: {0}")]
    Transport(String),
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
    #[error("recipient address rejected: {0}")]
    Recipient(String),
}
