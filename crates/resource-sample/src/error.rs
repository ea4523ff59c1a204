//! Error types for the mailing clients.

use resource_framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during list, contact and field operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MailingError {
    /// The requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote service rejected the record.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The API key was missing or rejected.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// An error occurred while talking to the remote service.
    #[error("Communication error: {0}")]
    CommunicationError(String),
}

impl From<FrameworkError> for MailingError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::Authentication(msg) => MailingError::AuthenticationError(msg),
            other => MailingError::CommunicationError(other.to_string()),
        }
    }
}
