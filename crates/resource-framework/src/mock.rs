//! # Mock Transport & Testing Guide
//!
//! The [`MockTransport`] type implements the same [`Transport`] trait as a production transport
//! but answers entirely in-memory from a queue of expectations. It lets you script the remote
//! service call by call, inject failures, and inspect exactly what the framework sent.
//!
//! ## When to use the Mock vs the Loopback Service
//!
//! | Feature | MockTransport | LoopbackService |
//! |---------|---------------|-----------------|
//! | **Speed** | Instant | Fast (one spawned task) |
//! | **Determinism** | 100% scripted | Real ids, real validation |
//! | **State** | None (expectations) | In-memory collections |
//! | **Use Case** | Reconciliation edge cases, wire shapes | End-to-end flows |
//! | **Error Injection** | Easy (`return_err`) | Only what the service models |
//!
//! ## Example
//!
//! ```rust
//! use resource_framework::mock::MockTransport;
//! use resource_framework::{Client, ClientConfig, Criteria, Errors, Resource, ResourceId};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct List {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<ResourceId>,
//!     #[serde(default)]
//!     name: String,
//!     #[serde(skip)]
//!     errors: Errors,
//! }
//!
//! impl Resource for List {
//!     fn id(&self) -> Option<&ResourceId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: Option<ResourceId>) { self.id = id; }
//!     fn errors(&self) -> &Errors { &self.errors }
//!     fn errors_mut(&mut self) -> &mut Errors { &mut self.errors }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_login("session-1");
//!     mock.expect_call("read_lists")
//!         .return_body(json!({"return": {"id": 3, "name": "Newsletter"}}));
//!
//!     let client = Client::new(mock.transport(), ClientConfig::new("key"));
//!     let lists = client.resource::<List>().find(&Criteria::new()).await.unwrap();
//!
//!     assert_eq!(lists.len(), 1);
//!     assert_eq!(lists[0].name, "Newsletter");
//!     mock.verify();
//! }
//! ```
//!
//! ## Driving a Channel Transport by Hand
//!
//! Use [`create_mock_transport`] to get a [`ChannelTransport`] and the receiver its calls arrive
//! on, then [`expect_request`] to pull the next call and answer it yourself.

use crate::error::{FrameworkError, Result};
use crate::operation::envelope_key;
use crate::resource::Payload;
use crate::session::{SessionHeader, LOGIN_PROCEDURE};
use crate::transport::{ChannelTransport, Reply, Transport, TransportRequest};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Represents an expected call and the scripted reply.
struct Expectation {
    procedure: String,
    response: Result<Payload>,
}

/// A call the framework made through the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub procedure: String,
    pub header: Option<SessionHeader>,
    pub body: Payload,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    calls: Vec<RecordedCall>,
    unexpected: Vec<String>,
}

/// A scripted transport with expectation tracking for fluent testing.
///
/// Calls are matched strictly in order. A call that does not match the next expectation is
/// answered with [`FrameworkError::Transport`] and reported by [`MockTransport::verify`].
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// A shareable handle for [`Client::new`](crate::Client::new) or
    /// [`SessionManager::new`](crate::SessionManager::new).
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    /// Expects a call to `procedure`.
    pub fn expect_call(&self, procedure: impl Into<String>) -> CallExpectationBuilder {
        CallExpectationBuilder {
            procedure: procedure.into(),
            state: self.state.clone(),
        }
    }

    /// Expects a successful login handing out `session_id`.
    pub fn expect_login(&self, session_id: &str) {
        self.expect_call(LOGIN_PROCEDURE)
            .return_body(json!({ "return": session_id }));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls made to one procedure, in order.
    pub fn calls_to(&self, procedure: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.procedure == procedure)
            .collect()
    }

    /// Verifies that all expectations were met and nothing unexpected was called.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.unexpected.is_empty() {
            panic!("Unexpected calls: {:?}", state.unexpected);
        }
        if !state.expectations.is_empty() {
            let remaining: Vec<_> = state.expectations.iter().map(|e| &e.procedure).collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                remaining.len(),
                remaining
            );
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn invoke(
        &self,
        procedure: &str,
        header: Option<&SessionHeader>,
        body: Payload,
    ) -> Result<Payload> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            procedure: procedure.to_string(),
            header: header.cloned(),
            body,
        });

        match state.expectations.pop_front() {
            Some(expectation) if expectation.procedure == procedure => expectation.response,
            Some(expectation) => {
                let message = format!("expected {}, got {procedure}", expectation.procedure);
                state.expectations.push_front(expectation);
                state.unexpected.push(message.clone());
                Err(FrameworkError::Transport(message))
            }
            None => {
                let message = format!("no expectation left for {procedure}");
                state.unexpected.push(message.clone());
                Err(FrameworkError::Transport(message))
            }
        }
    }
}

/// Builder for call expectations.
pub struct CallExpectationBuilder {
    procedure: String,
    state: Arc<Mutex<MockState>>,
}

impl CallExpectationBuilder {
    /// Replies with `response` verbatim (envelope included).
    pub fn return_ok(self, response: Payload) {
        self.push(Ok(response));
    }

    /// Replies with `body` wrapped in the `<procedure>_response` envelope.
    pub fn return_body(self, body: Payload) {
        let mut envelope = serde_json::Map::new();
        envelope.insert(envelope_key(&self.procedure), body);
        self.push(Ok(Payload::Object(envelope)));
    }

    /// Replies with an error.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Payload>) {
        let mut state = self.state.lock().unwrap();
        state.expectations.push_back(Expectation {
            procedure: self.procedure,
            response,
        });
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a channel transport and the receiver its calls arrive on.
///
/// Useful when a test needs to inspect a call *before* deciding how to answer it.
pub fn create_mock_transport(
    buffer_size: usize,
) -> (ChannelTransport, mpsc::Receiver<TransportRequest>) {
    ChannelTransport::channel(buffer_size)
}

/// Helper to pull the next call if it targets `procedure`.
pub async fn expect_request(
    receiver: &mut mpsc::Receiver<TransportRequest>,
    procedure: &str,
) -> Option<(Option<SessionHeader>, Payload, Reply)> {
    match receiver.recv().await {
        Some(request) if request.procedure == procedure => {
            Some((request.header, request.body, request.respond_to))
        }
        _ => None,
    }
}
