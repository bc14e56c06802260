/// Why an outbox event could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("unknown event kind \"{0}\"")]
    UnknownKind(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("invalid address \"{0}\"")]
    InvalidAddress(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl MailerError {
    /// Retrying cannot fix these; the event is failed at once.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind(_) | Self::MalformedPayload(_) | Self::InvalidAddress(_)
        )
    }
}
