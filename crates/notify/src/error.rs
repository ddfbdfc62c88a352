/// Errors returned while building or delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The template object does not exist in the template source.
    #[error("email template not found: {bucket}/{key}")]
    TemplateNotFound { bucket: String, key: String },

    #[error("failed to read email template {bucket}/{key}: {message}")]
    TemplateRead {
        bucket: String,
        key: String,
        message: String,
    },

    /// A notification was requested with no usable recipient addresses.
    #[error("no recipients for {event} notification")]
    NoRecipients { event: String },

    /// The email transport rejected or failed to deliver the message.
    #[error("failed to send email via {transport}: {message}")]
    Send { transport: String, message: String },
}
