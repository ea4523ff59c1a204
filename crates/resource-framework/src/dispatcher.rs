//! # Request Dispatcher
//!
//! Turns an abstract [`Operation`] plus a collection into a concrete remote procedure, attaches
//! the session header, invokes the transport and strips the response envelope.
//!
//! The dispatcher itself never retries. The single session-expiry retry lives one level up, in
//! [`ResourceClient`](crate::ResourceClient), which calls [`Dispatcher::execute`] again with a
//! renewed header.

use crate::error::{FrameworkError, Result};
use crate::operation::{envelope_key, Operation};
use crate::resource::Payload;
use crate::session::{SessionHeader, SessionManager};
use crate::transport::Transport;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionManager>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Resolves `operation` against `collection`, obtains a header (refreshing it when
    /// `force_refresh` is set) and returns the unwrapped response body.
    pub async fn request(
        &self,
        operation: &Operation,
        collection: &str,
        force_refresh: bool,
        body: Payload,
    ) -> Result<Payload> {
        let procedure = operation.procedure_name(collection);
        let header = self.session.header(force_refresh).await?;
        self.execute(&procedure, &header, body).await
    }

    /// Invokes `procedure` with an explicit header and unwraps the envelope.
    pub async fn execute(
        &self,
        procedure: &str,
        header: &SessionHeader,
        body: Payload,
    ) -> Result<Payload> {
        debug!(procedure, "Dispatching");
        trace!(procedure, %body, "Request body");
        let response = self.transport.invoke(procedure, Some(header), body).await?;
        unwrap_envelope(procedure, response)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Returns the value under `<procedure>_response`, never the envelope itself.
pub fn unwrap_envelope(procedure: &str, response: Payload) -> Result<Payload> {
    let Payload::Object(mut envelope) = response else {
        return Err(FrameworkError::malformed(procedure, "response is not an object"));
    };
    let key = envelope_key(procedure);
    envelope
        .remove(&key)
        .ok_or_else(|| FrameworkError::malformed(procedure, format!("missing `{key}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{create_mock_transport, expect_request, MockTransport};
    use serde_json::json;

    fn dispatcher(transport: Arc<dyn Transport>) -> Dispatcher {
        let session = Arc::new(SessionManager::new(transport.clone(), "key"));
        Dispatcher::new(transport, session)
    }

    #[tokio::test]
    async fn test_request_resolves_verb_and_unwraps_envelope() {
        let mock = MockTransport::new();
        mock.expect_login("s-1");
        mock.expect_call("read_fields")
            .return_body(json!({"return": [{"name": "email"}]}));

        let body = dispatcher(mock.transport())
            .request(&Operation::Read, "fields", false, json!({"page_number": 1}))
            .await
            .unwrap();

        assert_eq!(body, json!({"return": [{"name": "email"}]}));
        let call = &mock.calls_to("read_fields")[0];
        assert_eq!(call.header, Some(SessionHeader::new("s-1")));
        assert_eq!(call.body, json!({"page_number": 1}));
        mock.verify();
    }

    #[tokio::test]
    async fn test_literal_procedure_is_used_unmodified() {
        let mock = MockTransport::new();
        mock.expect_login("s-1");
        mock.expect_call("get_account_status")
            .return_body(json!({"return": "ok"}));

        let body = dispatcher(mock.transport())
            .request(&Operation::procedure("get_account_status"), "lists", false, json!({}))
            .await
            .unwrap();

        assert_eq!(body, json!({"return": "ok"}));
        mock.verify();
    }

    #[tokio::test]
    async fn test_force_refresh_logs_in_again() {
        let mock = MockTransport::new();
        mock.expect_login("s-1");
        mock.expect_call("read_lists").return_body(json!({}));
        mock.expect_login("s-2");
        mock.expect_call("read_lists").return_body(json!({}));

        let dispatcher = dispatcher(mock.transport());
        dispatcher
            .request(&Operation::Read, "lists", false, json!({}))
            .await
            .unwrap();
        dispatcher
            .request(&Operation::Read, "lists", true, json!({}))
            .await
            .unwrap();

        let reads = mock.calls_to("read_lists");
        assert_eq!(reads[1].header, Some(SessionHeader::new("s-2")));
        mock.verify();
    }

    #[tokio::test]
    async fn test_session_expiry_is_not_retried_here() {
        let mock = MockTransport::new();
        mock.expect_login("s-1");
        mock.expect_call("read_lists")
            .return_err(FrameworkError::SessionExpired("stale".into()));

        let result = dispatcher(mock.transport())
            .request(&Operation::Read, "lists", false, json!({}))
            .await;

        assert!(matches!(result, Err(FrameworkError::SessionExpired(_))));
        mock.verify();
    }

    #[tokio::test]
    async fn test_missing_envelope_is_malformed() {
        let (transport, mut receiver) = create_mock_transport(4);
        let dispatcher = dispatcher(Arc::new(transport));

        let call = tokio::spawn(async move {
            let header = SessionHeader::new("s-1");
            dispatcher.execute("read_lists", &header, json!({})).await
        });

        let (_, _, responder) = expect_request(&mut receiver, "read_lists")
            .await
            .expect("Expected read_lists request");
        responder
            .send(Ok(json!({"read_contacts_response": {}})))
            .unwrap();

        let result = call.await.unwrap();
        assert!(matches!(
            result,
            Err(FrameworkError::MalformedResponse { procedure, .. }) if procedure == "read_lists"
        ));
    }

    #[test]
    fn test_non_object_response_is_malformed() {
        let result = unwrap_envelope("login", json!("nope"));
        assert!(matches!(result, Err(FrameworkError::MalformedResponse { .. })));
    }
}
