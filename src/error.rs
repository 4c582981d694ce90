use thiserror::Error;

/// Failure taxonomy for the client. Nothing here is fatal to the process:
/// every variant leaves the system idle and retryable.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Microphone could not be acquired (no device, unsupported config,
    /// or the platform denied access). Aborts startup only.
    #[error("microphone unavailable: {0}")]
    Permission(String),

    /// Session-level failure: connect, frame send, or an error event from
    /// the service. Triggers full episode teardown.
    #[error("session transport error: {0}")]
    Transport(String),

    /// The one-shot reply could not be used: not valid JSON, missing
    /// fields, or blank in both fields. No teardown needed.
    #[error("unusable service response: {0}")]
    ResponseFormat(String),
}

impl ClientError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::Transport(err.to_string())
    }
}
