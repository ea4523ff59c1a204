//! Query filters for `find`.
//!
//! The framework never interprets a filter; it only asks for its wire shape.

use crate::error::Result;
use crate::resource::Payload;
use serde::Serialize;
use serde_json::Map;

/// Anything that can describe `find` criteria on the wire.
pub trait Filter: Send + Sync {
    fn to_hash(&self) -> Result<Payload>;
}

/// Raw JSON is sent verbatim.
impl Filter for Payload {
    fn to_hash(&self) -> Result<Payload> {
        Ok(self.clone())
    }
}

/// Equality criteria keyed by field name.
///
/// ```rust
/// use resource_framework::{Criteria, Filter};
/// use serde_json::json;
///
/// let filter = Criteria::new().eq("email", "ada@example.com").eq("status", "active");
/// assert_eq!(
///     filter.to_hash().unwrap(),
///     json!({"email": "ada@example.com", "status": "active"})
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: Map<String, Payload>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an equality criterion. Values that fail to serialize become `null`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Payload::Null);
        self.fields.insert(field.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Filter for Criteria {
    fn to_hash(&self) -> Result<Payload> {
        Ok(Payload::Object(self.fields.clone()))
    }
}
