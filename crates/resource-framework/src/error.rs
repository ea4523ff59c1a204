//! # Framework Errors
//!
//! Whole-call failures. Anything in here unwinds to the caller; per-item
//! failures inside a batch are data and live in [`Errors`](crate::Errors) instead.

/// Errors that abort a remote call.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    /// The login call failed or was rejected. Never retried.
    #[error("Authentication failed: {0}")]
    Authentication(String),
    /// The remote service rejected the session header. Triggers one renewal and retry.
    #[error("Session expired: {0}")]
    SessionExpired(String),
    /// The transport failed for a reason unrelated to authentication.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response from {procedure}: {reason}")]
    MalformedResponse { procedure: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Service closed")]
    ServiceClosed,
    #[error("Service dropped response channel")]
    ServiceDropped,
}

impl FrameworkError {
    pub(crate) fn malformed(procedure: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            procedure: procedure.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = FrameworkError> = std::result::Result<T, E>;
