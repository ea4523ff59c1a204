//! # Resource Trait
//!
//! The `Resource` trait is the contract every remote entity (List, Contact, Field, …) implements
//! to be driven by a [`ResourceClient`](crate::ResourceClient). It answers four questions the
//! framework cannot answer generically:
//!
//! - **Identity**: does this instance exist remotely? (`id` present ⇔ yes)
//! - **Error storage**: where do per-item batch failures go? (`errors`)
//! - **Wire shape**: what does this instance look like on the wire? (`to_hash`)
//! - **Construction**: how is an instance built from an untyped attribute map? (`from_hash`)
//!
//! The last two have serde-backed default implementations, so a typical resource is a
//! `#[derive(Serialize, Deserialize)]` struct with `#[serde(skip)]` on its `errors` field.
//!
//! There is no dirty/clean tracking: `id` is the only signal separating new from existing
//! instances in `save`, `create` and `destroy`.

use crate::error::Result;
use crate::registry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Display};

/// Untyped wire-level value exchanged with the transport.
pub type Payload = serde_json::Value;

/// Server-issued identifier of a remote record.
///
/// The remote service hands out ids as numbers or strings; both are kept in textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of a wire value. Only strings and numbers qualify.
    pub fn from_payload(value: &Payload) -> Option<Self> {
        match value {
            Payload::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Payload::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Payload::deserialize(deserializer)?;
        ResourceId::from_payload(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid resource id: {value}")))
    }
}

/// `deserialize_with` helper that reads an explicit `null` as the field's default.
///
/// ```
/// use resource_framework::resource::null_as_default;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(default, deserialize_with = "null_as_default")]
///     email: String,
/// }
///
/// let row: Row = serde_json::from_value(serde_json::json!({"email": null})).unwrap();
/// assert_eq!(row.email, "");
/// ```
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered multimap from error kind to message, owned by a single resource instance.
///
/// Insertion order is preserved across kinds, so `iter()` replays errors in the order the
/// batch results reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    entries: Vec<(String, String)>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.entries.push((kind.into(), message.into()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All messages recorded under `kind`, oldest first.
    pub fn get(&self, kind: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m.as_str()))
    }

    /// Messages prefixed with their kind, except for the catch-all `base` kind.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .map(|(kind, message)| {
                if kind == BASE_ERROR_KIND {
                    message.to_string()
                } else {
                    format!("{kind} {message}")
                }
            })
            .collect()
    }
}

/// Error kind used when the remote service does not supply an error code.
pub const BASE_ERROR_KIND: &str = "base";

/// Trait that any remote entity must implement to be managed by a `ResourceClient`.
///
/// # Example
///
/// ```rust
/// use resource_framework::{Errors, Resource, ResourceId};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Field {
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     id: Option<ResourceId>,
///     #[serde(default)]
///     name: String,
///     #[serde(skip)]
///     errors: Errors,
/// }
///
/// impl Resource for Field {
///     fn id(&self) -> Option<&ResourceId> { self.id.as_ref() }
///     fn set_id(&mut self, id: Option<ResourceId>) { self.id = id; }
///     fn errors(&self) -> &Errors { &self.errors }
///     fn errors_mut(&mut self) -> &mut Errors { &mut self.errors }
/// }
///
/// assert_eq!(Field::collection_name(), "fields");
/// ```
pub trait Resource: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    fn id(&self) -> Option<&ResourceId>;

    fn set_id(&mut self, id: Option<ResourceId>);

    fn errors(&self) -> &Errors;

    fn errors_mut(&mut self) -> &mut Errors;

    /// Whether the instance is believed to exist on the remote service.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    /// Simple type name, namespace stripped. Override when the Rust name differs from the
    /// remote one.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        registry::simple_type_name(std::any::type_name::<Self>())
    }

    /// Pluralized, lowercased remote collection name (e.g. `Field` → `fields`).
    fn collection_name() -> String
    where
        Self: Sized,
    {
        registry::plural_name(Self::type_name())
    }

    /// Wire-level representation of this instance.
    fn to_hash(&self) -> Result<Payload> {
        Ok(serde_json::to_value(self)?)
    }

    /// Builds an instance from an attribute map. Unknown keys are ignored.
    fn from_hash(hash: &Payload) -> Result<Self>
    where
        Self: Sized,
    {
        Ok(Self::deserialize(hash)?)
    }
}
