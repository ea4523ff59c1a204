//! # Session Manager
//!
//! Acquires, caches and renews the session header attached to every authenticated call.
//!
//! One `SessionManager` lives inside each [`Client`](crate::Client) and is shared by every
//! resource type that client serves, so Lists, Contacts and Fields reuse the same session.
//!
//! ## Concurrency
//!
//! The cached header sits behind an async mutex that stays locked while a login is in flight.
//! Concurrent callers therefore never log in twice at the same time. [`SessionManager::renew`]
//! is a compare-and-swap: a caller that saw an expired header only logs in again if nobody has
//! replaced that header in the meantime.

use crate::error::{FrameworkError, Result};
use crate::operation::envelope_key;
use crate::resource::Payload;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Name of the remote authentication procedure.
pub const LOGIN_PROCEDURE: &str = "login";

/// Authentication token attached to every authenticated remote call.
///
/// Serializes to the shape the remote protocol expects:
/// `{"sessionHeader": {"session_id": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHeader {
    #[serde(rename = "sessionHeader")]
    inner: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionId {
    session_id: String,
}

impl SessionHeader {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            inner: SessionId {
                session_id: session_id.into(),
            },
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn to_payload(&self) -> Payload {
        json!({ "sessionHeader": { "session_id": self.session_id() } })
    }
}

/// Caches the session header for one API connection.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    api_key: String,
    cached: Mutex<Option<SessionHeader>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached header, logging in first when there is none or `refresh` is set.
    pub async fn header(&self, refresh: bool) -> Result<SessionHeader> {
        let mut cached = self.cached.lock().await;
        if !refresh {
            if let Some(header) = cached.as_ref() {
                return Ok(header.clone());
            }
        }
        let header = self.login().await?;
        *cached = Some(header.clone());
        Ok(header)
    }

    /// Replaces `stale` with a fresh header unless another caller already did.
    pub async fn renew(&self, stale: &SessionHeader) -> Result<SessionHeader> {
        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref() {
            if current != stale {
                debug!("Session already renewed");
                return Ok(current.clone());
            }
        }
        let header = self.login().await?;
        *cached = Some(header.clone());
        Ok(header)
    }

    /// The cached header, if any. Never touches the network.
    pub async fn current(&self) -> Option<SessionHeader> {
        self.cached.lock().await.clone()
    }

    /// Forgets the cached header; the next call logs in again.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    async fn login(&self) -> Result<SessionHeader> {
        debug!("Logging in");
        let response = self
            .transport
            .invoke(LOGIN_PROCEDURE, None, json!({ "api_token": self.api_key }))
            .await?;

        let session_id = response
            .get(envelope_key(LOGIN_PROCEDURE))
            .and_then(|body| body.get("return"))
            .and_then(|value| match value {
                Payload::String(s) if !s.is_empty() => Some(s.clone()),
                Payload::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                FrameworkError::Authentication("login response carried no session id".into())
            })?;

        info!("Session established");
        Ok(SessionHeader::new(session_id))
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
