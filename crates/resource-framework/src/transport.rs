//! # Transport Seam
//!
//! The transport is the black box that turns `(procedure, header, body)` into a wire message and
//! the wire reply back into a [`Payload`]. The framework only depends on the [`Transport`]
//! trait; encoding, connection handling and timeouts belong to the implementation.
//!
//! ## Contract
//!
//! - The returned value is the **raw envelope** `{"<procedure>_response": …}`; unwrapping is the
//!   dispatcher's job.
//! - A rejected session header is reported as [`FrameworkError::SessionExpired`].
//! - A rejected login is reported as [`FrameworkError::Authentication`].
//! - Everything else is [`FrameworkError::Transport`].
//!
//! ## Channel Transport
//!
//! [`ChannelTransport`] forwards every call as a [`TransportRequest`] over a Tokio mpsc channel
//! and awaits the reply on a oneshot channel. Whatever owns the receiving end (an in-process
//! service task, a test harness) answers the calls. It is cheap to clone: it only holds a sender.

use crate::error::{FrameworkError, Result};
use crate::resource::Payload;
use crate::session::SessionHeader;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Executes a single named remote procedure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(
        &self,
        procedure: &str,
        header: Option<&SessionHeader>,
        body: Payload,
    ) -> Result<Payload>;
}

/// Type alias for the one-shot reply channel of a transport call.
pub type Reply = oneshot::Sender<Result<Payload>>;

/// A single remote call travelling over a [`ChannelTransport`].
#[derive(Debug)]
pub struct TransportRequest {
    pub procedure: String,
    pub header: Option<SessionHeader>,
    pub body: Payload,
    pub respond_to: Reply,
}

/// Transport that hands calls to whoever holds the matching receiver.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    sender: mpsc::Sender<TransportRequest>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::Sender<TransportRequest>) -> Self {
        Self { sender }
    }

    /// Creates a transport together with the receiver its calls arrive on.
    pub fn channel(buffer_size: usize) -> (Self, mpsc::Receiver<TransportRequest>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn invoke(
        &self,
        procedure: &str,
        header: Option<&SessionHeader>,
        body: Payload,
    ) -> Result<Payload> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransportRequest {
                procedure: procedure.to_string(),
                header: header.cloned(),
                body,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ServiceClosed)?;
        response.await.map_err(|_| FrameworkError::ServiceDropped)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_transport_round_trip() {
        let (transport, mut receiver) = ChannelTransport::channel(4);

        let call = tokio::spawn(async move {
            let header = SessionHeader::new("s-1");
            transport
                .invoke("read_lists", Some(&header), json!({"page_number": 1}))
                .await
        });

        let request = receiver.recv().await.expect("Expected a request");
        assert_eq!(request.procedure, "read_lists");
        assert_eq!(request.header.unwrap().session_id(), "s-1");
        assert_eq!(request.body, json!({"page_number": 1}));
        request
            .respond_to
            .send(Ok(json!({"read_lists_response": {"return": []}})))
            .unwrap();

        let reply = call.await.unwrap().unwrap();
        assert_eq!(reply, json!({"read_lists_response": {"return": []}}));
    }

    #[tokio::test]
    async fn test_channel_transport_reports_closed_service() {
        let (transport, receiver) = ChannelTransport::channel(1);
        drop(receiver);

        let result = transport.invoke("login", None, json!({})).await;
        assert!(matches!(result, Err(FrameworkError::ServiceClosed)));
    }

    #[tokio::test]
    async fn test_channel_transport_reports_dropped_reply() {
        let (transport, mut receiver) = ChannelTransport::channel(1);

        let call = tokio::spawn(async move { transport.invoke("login", None, json!({})).await });
        let request = receiver.recv().await.unwrap();
        drop(request);

        let result = call.await.unwrap();
        assert!(matches!(result, Err(FrameworkError::ServiceDropped)));
    }
}
