//! # Operations
//!
//! Abstract CRUD verbs and how they turn into concrete remote procedure names.

use std::borrow::Cow;
use std::fmt;

/// A remote operation, either an abstract CRUD verb resolved against a collection or a
/// literal procedure name used as-is.
///
/// | variant | wire verb | example (`fields`) |
/// |---------|-----------|--------------------|
/// | `Create` | `add` | `add_fields` |
/// | `Read` | `read` | `read_fields` |
/// | `Update` | `update` | `update_fields` |
/// | `Delete` | `delete` | `delete_fields` |
/// | `Procedure("login")` | – | `login` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Procedure(Cow<'static, str>),
}

impl Operation {
    pub fn procedure(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Procedure(name.into())
    }

    /// The verb prefix sent on the wire, `None` for literal procedures.
    pub fn verb(&self) -> Option<&'static str> {
        match self {
            Self::Create => Some("add"),
            Self::Read => Some("read"),
            Self::Update => Some("update"),
            Self::Delete => Some("delete"),
            Self::Procedure(_) => None,
        }
    }

    pub fn procedure_name(&self, collection: &str) -> String {
        match self {
            Self::Procedure(name) => name.to_string(),
            _ => format!("{}_{collection}", self.verb().unwrap_or_default()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Procedure(name) => f.write_str(name),
            _ => f.write_str(self.verb().unwrap_or_default()),
        }
    }
}

/// Key under which the remote service wraps every response body.
pub fn envelope_key(procedure: &str) -> String {
    format!("{procedure}_response")
}
