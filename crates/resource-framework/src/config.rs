//! Client configuration.
//!
//! The API key is the only required value. The two policies decide what happens in the places
//! where the remote batch protocol reports more than the classic client surfaced; both default
//! to the classic behavior.

use crate::error::{FrameworkError, Result};

/// Environment variable read by [`ClientConfig::from_env`].
pub const API_KEY_ENV: &str = "RESOURCE_API_KEY";

/// What `update` does with per-item error results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateErrors {
    /// Results are not reconciled; instances never learn that their update failed.
    #[default]
    Ignore,
    /// Error results are recorded on the matching instance, like `create` does.
    Record,
}

/// What `destroy` does with instances that have no id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsavedDestroy {
    /// They are left out of the batch without any trace.
    #[default]
    Skip,
    /// They are left out of the batch and get a `base` error explaining why.
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub update_errors: UpdateErrors,
    pub unsaved_destroy: UnsavedDestroy,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            update_errors: UpdateErrors::default(),
            unsaved_destroy: UnsavedDestroy::default(),
        }
    }

    /// Reads the API key from `RESOURCE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            Ok(_) => Err(FrameworkError::Config(format!("{API_KEY_ENV} is empty"))),
            Err(_) => Err(FrameworkError::Config(format!("{API_KEY_ENV} is not set"))),
        }
    }

    pub fn with_update_errors(mut self, policy: UpdateErrors) -> Self {
        self.update_errors = policy;
        self
    }

    pub fn with_unsaved_destroy(mut self, policy: UnsavedDestroy) -> Self {
        self.unsaved_destroy = policy;
        self
    }
}
