//! # Resource Lifecycle Facade
//!
//! [`Client`] is the one object a caller constructs: it owns the transport, the session and the
//! configuration. [`ResourceClient<T>`] is the typed view of one resource type on top of it,
//! offering `save` / `create` / `update` / `destroy` / `find`.
//!
//! ## Dispatch Rules
//!
//! - **save** partitions the input by id presence: id-bearing instances go through `update`,
//!   the rest through `create`. Each group's errors are cleared right before its batch is sent.
//!   Both batches are always sent, even an empty one.
//! - **create / update / destroy** submit one batch and reconcile the results onto the same
//!   slice they were given, which is handed back.
//! - **destroy** only submits id-bearing instances.
//! - **find** reads one page and builds a fresh instance per returned hash.
//! - The `*_one` variants run a one-element batch.
//!
//! ## Session Expiry
//!
//! Every remote call goes through [`Client::call`]. When the transport reports
//! [`FrameworkError::SessionExpired`], the session is renewed and the call is repeated exactly
//! once. A second failure, or any other error, propagates.

use crate::batch::{
    apply_create_results, apply_destroy_results, apply_update_results, batch_body, destroy_body,
    normalize, parse_results, RETURN_KEY,
};
use crate::config::{ClientConfig, UnsavedDestroy};
use crate::dispatcher::Dispatcher;
use crate::error::{FrameworkError, Result};
use crate::filter::Filter;
use crate::operation::Operation;
use crate::resource::{Payload, Resource, BASE_ERROR_KIND};
use crate::session::SessionManager;
use crate::transport::Transport;
use serde_json::json;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Message recorded on id-less instances passed to `destroy` under [`UnsavedDestroy::Record`].
pub const UNSAVED_DESTROY_MESSAGE: &str = "cannot destroy a record without an id";

struct ClientInner {
    dispatcher: Dispatcher,
    config: ClientConfig,
}

/// Handle on one authenticated API connection. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let session = Arc::new(SessionManager::new(transport.clone(), config.api_key.clone()));
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Dispatcher::new(transport, session),
                config,
            }),
        }
    }

    /// Same transport and session, different policies.
    pub fn with_config(&self, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: self.inner.dispatcher.clone(),
                config,
            }),
        }
    }

    /// Typed access to one resource type.
    pub fn resource<T: Resource>(&self) -> ResourceClient<T> {
        ResourceClient::new(self.clone())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionManager {
        self.inner.dispatcher.session()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Runs `operation` against `collection`, renewing the session and retrying once if the
    /// remote service reports it expired.
    pub async fn call(
        &self,
        operation: &Operation,
        collection: &str,
        body: Payload,
    ) -> Result<Payload> {
        let procedure = operation.procedure_name(collection);
        let dispatcher = self.dispatcher();
        let header = self.session().header(false).await?;

        match dispatcher.execute(&procedure, &header, body.clone()).await {
            Err(FrameworkError::SessionExpired(reason)) => {
                warn!(procedure, %reason, "Session expired, renewing");
                let renewed = self.session().renew(&header).await?;
                dispatcher.execute(&procedure, &renewed, body).await
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("update_errors", &self.inner.config.update_errors)
            .field("unsaved_destroy", &self.inner.config.unsaved_destroy)
            .finish_non_exhaustive()
    }
}

/// A type-safe client for one resource type.
pub struct ResourceClient<T: Resource> {
    client: Client,
    collection: String,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            collection: self.collection.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> std::fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            collection: T::collection_name(),
            _resource: PhantomData,
        }
    }

    /// Remote collection name, e.g. `lists`.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // --- Lifecycle ---

    /// Updates id-bearing instances and creates the rest.
    #[instrument(skip(self, items), fields(collection = %self.collection, count = items.len()))]
    pub async fn save<'a>(&self, items: &'a mut [T]) -> Result<&'a mut [T]> {
        let (mut existing, mut fresh): (Vec<&mut T>, Vec<&mut T>) =
            items.iter_mut().partition(|item| item.is_persisted());
        debug!(existing = existing.len(), fresh = fresh.len(), "Partitioned");

        for item in existing.iter_mut() {
            item.errors_mut().clear();
        }
        self.update_batch(&mut existing).await?;

        for item in fresh.iter_mut() {
            item.errors_mut().clear();
        }
        self.create_batch(&mut fresh).await?;

        Ok(items)
    }

    #[instrument(skip(self, items), fields(collection = %self.collection, count = items.len()))]
    pub async fn create<'a>(&self, items: &'a mut [T]) -> Result<&'a mut [T]> {
        let mut refs: Vec<&mut T> = items.iter_mut().collect();
        self.create_batch(&mut refs).await?;
        Ok(items)
    }

    #[instrument(skip(self, items), fields(collection = %self.collection, count = items.len()))]
    pub async fn update<'a>(&self, items: &'a mut [T]) -> Result<&'a mut [T]> {
        let mut refs: Vec<&mut T> = items.iter_mut().collect();
        self.update_batch(&mut refs).await?;
        Ok(items)
    }

    /// Deletes id-bearing instances; id-less ones are left out of the batch.
    #[instrument(skip(self, items), fields(collection = %self.collection, count = items.len()))]
    pub async fn destroy<'a>(&self, items: &'a mut [T]) -> Result<&'a mut [T]> {
        let policy = self.client.config().unsaved_destroy;
        let mut targets = Vec::with_capacity(items.len());
        for item in items.iter_mut() {
            if item.is_persisted() {
                targets.push(item);
            } else if policy == UnsavedDestroy::Record {
                item.errors_mut().add(BASE_ERROR_KIND, UNSAVED_DESTROY_MESSAGE);
            } else {
                debug!("Skipping unsaved instance");
            }
        }
        self.destroy_batch(&mut targets).await?;
        Ok(items)
    }

    /// First page of records matching `filter`.
    pub async fn find<F: Filter + ?Sized>(&self, filter: &F) -> Result<Vec<T>> {
        self.find_page(filter, 1).await
    }

    #[instrument(skip(self, filter), fields(collection = %self.collection))]
    pub async fn find_page<F: Filter + ?Sized>(&self, filter: &F, page_number: u32) -> Result<Vec<T>> {
        let body = json!({ "filter": filter.to_hash()?, "page_number": page_number });
        let mut response = self.client.call(&Operation::Read, &self.collection, body).await?;

        let records = normalize(
            response
                .as_object_mut()
                .and_then(|map| map.remove(RETURN_KEY)),
        );
        let found = records
            .iter()
            .map(T::from_hash)
            .collect::<Result<Vec<_>>>()?;
        info!(found = found.len(), "Found");
        Ok(found)
    }

    // --- Single instance ---

    pub async fn save_one<'a>(&self, item: &'a mut T) -> Result<&'a mut T> {
        self.save(std::slice::from_mut(&mut *item)).await?;
        Ok(item)
    }

    pub async fn create_one<'a>(&self, item: &'a mut T) -> Result<&'a mut T> {
        self.create(std::slice::from_mut(&mut *item)).await?;
        Ok(item)
    }

    pub async fn update_one<'a>(&self, item: &'a mut T) -> Result<&'a mut T> {
        self.update(std::slice::from_mut(&mut *item)).await?;
        Ok(item)
    }

    pub async fn destroy_one<'a>(&self, item: &'a mut T) -> Result<&'a mut T> {
        self.destroy(std::slice::from_mut(&mut *item)).await?;
        Ok(item)
    }

    // --- Batches ---

    async fn create_batch(&self, items: &mut [&mut T]) -> Result<()> {
        let body = batch_body(&self.collection, items)?;
        let response = self.client.call(&Operation::Create, &self.collection, body).await?;
        let results = parse_results(response);
        apply_create_results(items, &results);

        let rejected = items.iter().filter(|item| !item.errors().is_empty()).count();
        info!(submitted = items.len(), rejected, "Created");
        Ok(())
    }

    async fn update_batch(&self, items: &mut [&mut T]) -> Result<()> {
        let body = batch_body(&self.collection, items)?;
        let response = self.client.call(&Operation::Update, &self.collection, body).await?;
        let results = parse_results(response);
        apply_update_results(items, &results, self.client.config().update_errors);

        info!(submitted = items.len(), "Updated");
        Ok(())
    }

    async fn destroy_batch(&self, items: &mut [&mut T]) -> Result<()> {
        let body = destroy_body(&self.collection, items);
        let response = self.client.call(&Operation::Delete, &self.collection, body).await?;
        let results = parse_results(response);
        apply_destroy_results(items, &results);

        let deleted = items.iter().filter(|item| !item.is_persisted()).count();
        info!(submitted = items.len(), deleted, "Destroyed");
        Ok(())
    }
}
