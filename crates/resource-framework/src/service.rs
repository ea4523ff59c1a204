//! # Loopback Service
//!
//! An in-process stand-in for the remote object-management API. It runs as a Tokio task,
//! receives [`TransportRequest`]s from a [`ChannelTransport`] and answers them the way the real
//! service does:
//!
//! - `login` checks `api_token` and issues a session id.
//! - `add_<collection>`, `update_<collection>`, `delete_<collection>` take a batch under the
//!   collection key and answer one result entry per item (a bare object for one-item batches,
//!   no `return` at all for empty ones).
//! - `read_<collection>` matches `filter` by field equality and pages by `page_number`.
//! - Every call except `login` must carry a live session header, otherwise it fails with
//!   [`FrameworkError::SessionExpired`].
//!
//! Records live in memory, keyed by a server-issued numeric id. Required fields configured with
//! [`LoopbackService::require`] produce per-item error results instead of stored records.
//!
//! ```rust
//! use resource_framework::service::LoopbackService;
//! use resource_framework::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (service, transport, handle) = LoopbackService::new("secret", 32);
//!     let task = tokio::spawn(service.require("contacts", "email").run());
//!
//!     let client = Client::new(std::sync::Arc::new(transport), ClientConfig::new("secret"));
//!     let header = client.session().header(false).await.unwrap();
//!     assert_eq!(header.session_id(), "loopback-1");
//!
//!     handle.expire_sessions().await.unwrap();
//!     drop(client);
//!     task.await.unwrap();
//! }
//! ```

use crate::batch::RETURN_KEY;
use crate::error::{FrameworkError, Result};
use crate::operation::{envelope_key, Operation};
use crate::resource::{Payload, ResourceId};
use crate::session::LOGIN_PROCEDURE;
use crate::transport::{ChannelTransport, TransportRequest};
use serde_json::{json, Map};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Records per `read` page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 50;

type Record = Map<String, Payload>;

/// Out-of-band requests from tests and orchestrators.
#[derive(Debug)]
enum Control {
    ExpireSessions {
        respond_to: oneshot::Sender<usize>,
    },
    Count {
        collection: String,
        respond_to: oneshot::Sender<usize>,
    },
}

/// Handle for poking a running [`LoopbackService`] from outside the transport.
#[derive(Clone, Debug)]
pub struct LoopbackHandle {
    control: mpsc::Sender<Control>,
}

impl LoopbackHandle {
    /// Invalidates every issued session; returns how many were live.
    pub async fn expire_sessions(&self) -> Result<usize> {
        let (respond_to, response) = oneshot::channel();
        self.control
            .send(Control::ExpireSessions { respond_to })
            .await
            .map_err(|_| FrameworkError::ServiceClosed)?;
        response.await.map_err(|_| FrameworkError::ServiceDropped)
    }

    /// Number of stored records in `collection`.
    pub async fn count(&self, collection: &str) -> Result<usize> {
        let (respond_to, response) = oneshot::channel();
        self.control
            .send(Control::Count {
                collection: collection.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ServiceClosed)?;
        response.await.map_err(|_| FrameworkError::ServiceDropped)
    }
}

/// The service task. Owns all state; processes one call at a time.
pub struct LoopbackService {
    calls: mpsc::Receiver<TransportRequest>,
    control: mpsc::Receiver<Control>,
    api_key: String,
    sessions: HashSet<String>,
    next_session: u32,
    collections: HashMap<String, BTreeMap<u64, Record>>,
    required: HashMap<String, Vec<String>>,
    page_size: usize,
    next_id: u64,
}

impl LoopbackService {
    /// Creates the service, the transport that talks to it and a control handle.
    pub fn new(
        api_key: impl Into<String>,
        buffer_size: usize,
    ) -> (Self, ChannelTransport, LoopbackHandle) {
        let (transport, calls) = ChannelTransport::channel(buffer_size);
        let (control_tx, control) = mpsc::channel(buffer_size);
        let service = Self {
            calls,
            control,
            api_key: api_key.into(),
            sessions: HashSet::new(),
            next_session: 1,
            collections: HashMap::new(),
            required: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            next_id: 1,
        };
        (service, transport, LoopbackHandle { control: control_tx })
    }

    /// Rejects `add`/`update` items in `collection` whose `field` is missing, null or blank.
    pub fn require(mut self, collection: impl Into<String>, field: impl Into<String>) -> Self {
        self.required
            .entry(collection.into())
            .or_default()
            .push(field.into());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Runs until every transport clone has been dropped.
    pub async fn run(mut self) {
        info!("Loopback service started");

        loop {
            tokio::select! {
                call = self.calls.recv() => match call {
                    Some(request) => {
                        let response = self.handle(&request);
                        let _ = request.respond_to.send(response);
                    }
                    None => break,
                },
                Some(control) = self.control.recv() => self.handle_control(control),
            }
        }

        let records: usize = self.collections.values().map(BTreeMap::len).sum();
        info!(records, "Loopback service stopped");
    }

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::ExpireSessions { respond_to } => {
                let expired = self.sessions.len();
                self.sessions.clear();
                info!(expired, "Sessions expired");
                let _ = respond_to.send(expired);
            }
            Control::Count {
                collection,
                respond_to,
            } => {
                let count = self.collections.get(&collection).map_or(0, BTreeMap::len);
                let _ = respond_to.send(count);
            }
        }
    }

    fn handle(&mut self, request: &TransportRequest) -> Result<Payload> {
        let procedure = request.procedure.as_str();
        debug!(procedure, "Call");

        if procedure == LOGIN_PROCEDURE {
            let session_id = self.login(&request.body)?;
            return Ok(envelope(procedure, returned(json!(session_id))));
        }

        let live = request
            .header
            .as_ref()
            .is_some_and(|header| self.sessions.contains(header.session_id()));
        if !live {
            warn!(procedure, "Rejected session");
            return Err(FrameworkError::SessionExpired(
                "invalid session header".to_string(),
            ));
        }

        let (operation, collection) = parse_procedure(procedure)?;
        let body = match operation {
            Operation::Create => self.add(collection, &request.body),
            Operation::Update => self.update(collection, &request.body),
            Operation::Delete => self.delete(collection, &request.body),
            Operation::Read => self.read(collection, &request.body),
            Operation::Procedure(_) => {
                return Err(FrameworkError::Transport(format!(
                    "unknown procedure `{procedure}`"
                )))
            }
        };
        Ok(envelope(procedure, body))
    }

    fn login(&mut self, body: &Payload) -> Result<String> {
        let token = body.get("api_token").and_then(Payload::as_str);
        if token != Some(self.api_key.as_str()) {
            warn!("Login rejected");
            return Err(FrameworkError::Authentication(
                "invalid api token".to_string(),
            ));
        }
        let session_id = format!("loopback-{}", self.next_session);
        self.next_session += 1;
        self.sessions.insert(session_id.clone());
        info!(session_id, "Login");
        Ok(session_id)
    }

    fn add(&mut self, collection: &str, body: &Payload) -> Payload {
        let mut results = Vec::new();
        for item in batch_items(collection, body) {
            let mut record = item.as_object().cloned().unwrap_or_default();
            record.remove("id");

            if let Some(field) = self.missing_field(collection, &record) {
                results.push(rejected(&field, "is required"));
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;
            record.insert("id".to_string(), json!(id));
            self.collections
                .entry(collection.to_string())
                .or_default()
                .insert(id, record);
            results.push(json!({"is_new": true, "is_error": false, "id": id}));
        }
        info!(collection, submitted = results.len(), "Added");
        wrap_results(results)
    }

    fn update(&mut self, collection: &str, body: &Payload) -> Payload {
        let mut results = Vec::new();
        for item in batch_items(collection, body) {
            let Some(id) = record_id(item) else {
                results.push(rejected("id", "is missing"));
                continue;
            };
            let Some(existing) = self.collections.get(collection).and_then(|c| c.get(&id)) else {
                results.push(rejected("base", "record not found"));
                continue;
            };

            let mut merged = existing.clone();
            if let Some(fields) = item.as_object() {
                for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != "id") {
                    merged.insert(key.clone(), value.clone());
                }
            }
            if let Some(field) = self.missing_field(collection, &merged) {
                results.push(rejected(&field, "is required"));
                continue;
            }

            self.collections
                .entry(collection.to_string())
                .or_default()
                .insert(id, merged);
            results.push(json!({"is_new": false, "is_error": false, "id": id}));
        }
        info!(collection, submitted = results.len(), "Updated");
        wrap_results(results)
    }

    fn delete(&mut self, collection: &str, body: &Payload) -> Payload {
        let mut results = Vec::new();
        for item in batch_items(collection, body) {
            let removed = record_id(item).and_then(|id| {
                self.collections
                    .get_mut(collection)
                    .and_then(|c| c.remove(&id))
                    .map(|_| id)
            });
            match removed {
                Some(id) => results.push(json!({"is_new": false, "is_error": false, "id": id})),
                None => results.push(rejected("base", "record not found")),
            }
        }
        info!(collection, submitted = results.len(), "Deleted");
        wrap_results(results)
    }

    fn read(&self, collection: &str, body: &Payload) -> Payload {
        let filter = body
            .get("filter")
            .and_then(Payload::as_object)
            .cloned()
            .unwrap_or_default();
        let page = body
            .get("page_number")
            .and_then(Payload::as_u64)
            .unwrap_or(1)
            .max(1);
        let offset = usize::try_from(page - 1)
            .unwrap_or(usize::MAX)
            .saturating_mul(self.page_size);

        let matches: Vec<Payload> = self
            .collections
            .get(collection)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|record| matches_filter(record, &filter))
            .skip(offset)
            .take(self.page_size)
            .map(|record| Payload::Object(record.clone()))
            .collect();
        debug!(collection, page, found = matches.len(), "Read");
        wrap_results(matches)
    }

    fn missing_field(&self, collection: &str, record: &Record) -> Option<String> {
        self.required.get(collection)?.iter().find_map(|field| {
            let blank = match record.get(field) {
                None | Some(Payload::Null) => true,
                Some(Payload::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            blank.then(|| field.clone())
        })
    }
}

fn envelope(procedure: &str, body: Payload) -> Payload {
    let mut map = Map::new();
    map.insert(envelope_key(procedure), body);
    Payload::Object(map)
}

fn returned(value: Payload) -> Payload {
    let mut map = Map::new();
    map.insert(RETURN_KEY.to_string(), value);
    Payload::Object(map)
}

/// `add_contacts` → (`Create`, `contacts`).
fn parse_procedure(procedure: &str) -> Result<(Operation, &str)> {
    let unknown = || FrameworkError::Transport(format!("unknown procedure `{procedure}`"));
    let (verb, collection) = procedure.split_once('_').ok_or_else(unknown)?;
    let operation = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ]
    .into_iter()
    .find(|op| op.verb() == Some(verb))
    .ok_or_else(unknown)?;
    Ok((operation, collection))
}

fn batch_items<'a>(collection: &str, body: &'a Payload) -> Vec<&'a Payload> {
    match body.get(collection) {
        Some(Payload::Array(items)) => items.iter().collect(),
        Some(Payload::Null) | None => Vec::new(),
        Some(item) => vec![item],
    }
}

fn record_id(item: &Payload) -> Option<u64> {
    let id = ResourceId::from_payload(item.get("id")?)?;
    id.as_str().parse().ok()
}

fn rejected(code: &str, message: &str) -> Payload {
    json!({"is_new": false, "is_error": true, "error_code": code, "error_string": message})
}

/// No results → no `return`; one → bare object; more → list.
fn wrap_results(mut results: Vec<Payload>) -> Payload {
    match results.len() {
        0 => json!({}),
        1 => returned(results.remove(0)),
        _ => returned(Payload::Array(results)),
    }
}

fn matches_filter(record: &Record, filter: &Map<String, Payload>) -> bool {
    filter.iter().all(|(field, expected)| match record.get(field) {
        Some(Payload::Array(values)) if !expected.is_array() => {
            values.iter().any(|value| loose_eq(value, expected))
        }
        Some(actual) => loose_eq(actual, expected),
        None => expected.is_null(),
    })
}

/// Ids travel as strings but are stored as numbers.
fn loose_eq(actual: &Payload, expected: &Payload) -> bool {
    if actual == expected {
        return true;
    }
    match (ResourceId::from_payload(actual), ResourceId::from_payload(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
