//! # Resource Framework
//!
//! This crate turns a stateful, session-authenticated RPC API into typed resource clients.
//! Callers declare their entities once and get `save` / `create` / `update` / `destroy` / `find`
//! without touching session headers, procedure names or per-item result bookkeeping.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into four layers:
//!
//! 1. **Entity Layer** ([`Resource`]) - your data types and their wire shape
//! 2. **Lifecycle Layer** ([`Client`], [`ResourceClient`]) - save/find dispatch and the
//!    session-expiry retry
//! 3. **Protocol Layer** ([`Dispatcher`], [`batch`], [`SessionManager`]) - procedure naming,
//!    envelope unwrapping, batch result reconciliation, login caching
//! 4. **Transport Layer** ([`Transport`]) - the seam to whatever carries the bytes
//!
//! ## Core Abstractions
//!
//! ### [`Resource`] - The Entity
//!
//! A serde struct with an optional id and an [`Errors`] container. The id is the only signal
//! of "new" versus "existing": `save` updates instances that have one and creates the rest.
//!
//! ### [`ResourceClient`] - The Interface
//!
//! Batch operations take `&mut [T]` and hand the same slice back. Ids assigned by the remote
//! service and per-item rejections are written onto the instances you passed in; a failure of
//! one item never fails the call.
//!
//! ```rust
//! use resource_framework::service::LoopbackService;
//! use resource_framework::{Client, ClientConfig, Criteria, Errors, Resource, ResourceId};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Contact {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<ResourceId>,
//!     #[serde(default)]
//!     email: String,
//!     #[serde(skip)]
//!     errors: Errors,
//! }
//!
//! impl Resource for Contact {
//!     fn id(&self) -> Option<&ResourceId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: Option<ResourceId>) { self.id = id; }
//!     fn errors(&self) -> &Errors { &self.errors }
//!     fn errors_mut(&mut self) -> &mut Errors { &mut self.errors }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // In-process remote service
//!     let (service, transport, _handle) = LoopbackService::new("secret", 32);
//!     tokio::spawn(service.require("contacts", "email").run());
//!
//!     let client = Client::new(Arc::new(transport), ClientConfig::new("secret"));
//!     let contacts = client.resource::<Contact>();
//!
//!     let mut batch = vec![
//!         Contact { email: "ada@example.com".into(), ..Contact::default() },
//!         Contact::default(),
//!     ];
//!     contacts.save(&mut batch).await.unwrap();
//!
//!     assert!(batch[0].id.is_some());
//!     assert_eq!(batch[1].errors.full_messages(), vec!["email is required"]);
//!
//!     let found = contacts
//!         .find(&Criteria::new().eq("email", "ada@example.com"))
//!         .await
//!         .unwrap();
//!     assert_eq!(found[0].id, batch[0].id);
//! }
//! ```
//!
//! ## Sessions
//!
//! One [`SessionManager`] per [`Client`], shared by every resource type. The first call logs in
//! and caches the header. When the remote service reports the session expired, the call is
//! repeated exactly once on a renewed session; concurrent callers that hit the same expiry share
//! a single login.
//!
//! ## Testing
//!
//! The [`mock`] module scripts the remote service call by call; the [`service`] module runs an
//! in-memory one. See the [`mock`] module docs for when to use which.

pub mod batch;
pub mod client;
pub mod client_trait;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod mock;
pub mod operation;
pub mod registry;
pub mod resource;
pub mod service;
pub mod session;
pub mod tracing;
pub mod transport;

// Re-export core types for convenience
pub use batch::BatchResult;
pub use client::{Client, ResourceClient};
pub use client_trait::ResourceApi;
pub use config::{ClientConfig, UnsavedDestroy, UpdateErrors};
pub use dispatcher::Dispatcher;
pub use error::FrameworkError;
pub use filter::{Criteria, Filter};
pub use operation::Operation;
pub use resource::{Errors, Payload, Resource, ResourceId};
pub use session::{SessionHeader, SessionManager};
pub use transport::{ChannelTransport, Transport, TransportRequest};
