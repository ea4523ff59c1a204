//! # System Lifecycle & Orchestration
//!
//! [`MailingSystem`] starts an in-process mailing service, builds one authenticated
//! [`Client`] against it and hands out a domain client per resource type.
//!
//! ## Wiring
//!
//! ```rust,ignore
//! impl MailingSystem {
//!     pub fn start(config: ClientConfig) -> Self {
//!         // 1. Service task and the transport that talks to it
//!         let (service, transport, handle) = LoopbackService::new(&config.api_key, 64);
//!         let task = tokio::spawn(service.require("lists", "name").run());
//!
//!         // 2. One client, one session, shared by every resource type
//!         let client = Client::new(Arc::new(transport), config);
//!         Self { list_client: ListClient::new(client.resource()), .. }
//!     }
//! }
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Forget the session** - the cached header is dropped
//! 2. **Drop all clients** - the last transport clone closes the service's channel
//! 3. **Await the service** - its loop sees the closed channel and exits
//!
//! ## Observability & Tracing
//!
//! Call [`setup_tracing`](resource_framework::tracing::setup_tracing) once before starting the
//! system. Service-side logs (`Login`, `Added`, `Sessions expired`) interleave with the client's
//! batch summaries, which makes the request flow easy to follow at `RUST_LOG=info`.

use crate::clients::{ContactClient, FieldClient, ListClient};
use crate::error::MailingError;
use resource_framework::service::{LoopbackHandle, LoopbackService};
use resource_framework::{Client, ClientConfig};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

const SERVICE_BUFFER: usize = 64;

/// The runtime orchestrator for the mailing sample.
///
/// # Example
///
/// ```ignore
/// let system = MailingSystem::start(ClientConfig::from_env()?);
///
/// let list = system.list_client.create_list(List::new("Newsletter")).await?;
/// let mut contact = Contact::new("ada@example.com");
/// system.contact_client.subscribe(&mut contact, &list).await?;
///
/// system.shutdown().await?;
/// ```
pub struct MailingSystem {
    pub list_client: ListClient,
    pub contact_client: ContactClient,
    pub field_client: FieldClient,

    /// Control handle on the running service (session expiry, record counts)
    pub service: LoopbackHandle,

    client: Client,
    task: JoinHandle<()>,
}

impl MailingSystem {
    /// Spawns the service and builds the clients. Must be called inside a Tokio runtime.
    pub fn start(config: ClientConfig) -> Self {
        let (service, transport, handle) =
            LoopbackService::new(config.api_key.clone(), SERVICE_BUFFER);
        let service = service
            .require("lists", "name")
            .require("contacts", "email")
            .require("fields", "name")
            .require("fields", "type");
        let task = tokio::spawn(service.run());

        let client = Client::new(Arc::new(transport), config);
        info!("Mailing system started");

        Self {
            list_client: ListClient::new(client.resource()),
            contact_client: ContactClient::new(client.resource()),
            field_client: FieldClient::new(client.resource()),
            service: handle,
            client,
            task,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Gracefully shuts down the system.
    ///
    /// Returns an error if the service task panicked.
    pub async fn shutdown(self) -> Result<(), MailingError> {
        info!("Shutting down system...");
        self.client.session().invalidate().await;

        drop(self.list_client);
        drop(self.contact_client);
        drop(self.field_client);
        drop(self.client);

        if let Err(e) = self.task.await {
            error!("Service task failed: {:?}", e);
            return Err(MailingError::CommunicationError(format!(
                "service task failed: {e}"
            )));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
