#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Subscriber {subscriber} rejected notification: {message}")]
    Rejected { subscriber: String, message: String },

    #[error("Notification channel closed")]
    Closed,
}
