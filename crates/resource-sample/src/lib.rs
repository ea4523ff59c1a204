//! # Mailing Sample
//!
//! A mailing-list account managed through the resource framework.
//!
//! ## Core Components
//!
//! - **[model]**: [`List`](model::List), [`Contact`](model::Contact) and
//!   [`Field`](model::Field), each implementing [`Resource`](resource_framework::Resource).
//! - **[clients]**: domain wrappers (e.g. [`ContactClient`](clients::ContactClient)) built on
//!   [`ResourceApi`](resource_framework::ResourceApi).
//! - **[lifecycle]**: [`MailingSystem`](lifecycle::MailingSystem), which starts an in-process
//!   service and wires the clients to it.
//!
//! ## Testing
//!
//! See [`resource_framework::mock`] for scripting the remote service call by call.

pub mod clients;
pub mod error;
pub mod lifecycle;
pub mod model;

pub use error::MailingError;
