//! # Batch Reconciler
//!
//! A batch call submits an ordered collection of instances in one request; the remote service
//! answers with an ordered collection of [`BatchResult`] entries. The n-th entry describes the
//! n-th submitted instance. This module maps those entries back onto the instances.
//!
//! ## Result Shapes
//!
//! The `return` field of a batch response comes in three shapes, all normalized by
//! [`normalize`]:
//!
//! | shape | when | normalized |
//! |-------|------|------------|
//! | list | usually | as-is |
//! | single object | exactly one instance was submitted | one-element list |
//! | absent / `null` | nothing to report | empty list |
//!
//! ## Outcomes per Entry
//!
//! | operation | `is_error` | `is_new`, no error | neither |
//! |-----------|------------|--------------------|---------|
//! | create | error recorded, id untouched | id assigned | untouched |
//! | update | ignored (or recorded, see [`UpdateErrors`]) | untouched | untouched |
//! | destroy | error recorded, id untouched | id cleared (any non-error) | id cleared |
//!
//! Per-item failures are data. Nothing in here returns an error for them.

use crate::config::UpdateErrors;
use crate::error::Result;
use crate::resource::{Payload, Resource, ResourceId, BASE_ERROR_KIND};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::warn;

/// Field of a response body that carries the results.
pub const RETURN_KEY: &str = "return";

/// One item's outcome within a batch response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchResult {
    pub is_new: bool,
    pub is_error: bool,
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<ResourceId>,
    pub error_string: Option<String>,
    #[serde(deserialize_with = "lenient_code")]
    pub error_code: Option<String>,
}

impl BatchResult {
    pub fn created(id: impl Into<ResourceId>) -> Self {
        Self {
            is_new: true,
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn ok(id: impl Into<ResourceId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            error_string: Some(message.into()),
            ..Self::default()
        }
    }

    /// Kind under which the error is stored: the remote error code, or `base`.
    pub fn error_kind(&self) -> &str {
        self.error_code.as_deref().unwrap_or(BASE_ERROR_KIND)
    }

    pub fn error_message(&self) -> &str {
        self.error_string.as_deref().unwrap_or("unknown error")
    }
}

/// Blank or non-scalar ids count as absent instead of failing the whole batch.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ResourceId>, D::Error> {
    let value = Option::<Payload>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(ResourceId::from_payload))
}

/// Error codes arrive as strings or as numbers (`303`); both are kept as text.
fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Payload>::deserialize(deserializer)?;
    Ok(match value {
        Some(Payload::String(code)) if !code.is_empty() => Some(code),
        Some(Payload::Number(code)) => Some(code.to_string()),
        _ => None,
    })
}

/// Normalizes a possibly-absent, possibly-singleton value into a list.
pub fn normalize(value: Option<Payload>) -> Vec<Payload> {
    match value {
        None | Some(Payload::Null) => Vec::new(),
        Some(Payload::Array(items)) => items,
        Some(single) => vec![single],
    }
}

/// Extracts and parses the result entries of a batch response body.
///
/// Entries are decoded one at a time. An entry that cannot be decoded becomes an inert
/// [`BatchResult::default`] so the n-th entry still pairs with the n-th instance.
pub fn parse_results(mut body: Payload) -> Vec<BatchResult> {
    let value = body.as_object_mut().and_then(|map| map.remove(RETURN_KEY));
    normalize(value)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            BatchResult::deserialize(entry).unwrap_or_else(|e| {
                warn!(index, error = %e, "Undecodable result entry");
                BatchResult::default()
            })
        })
        .collect()
}

/// `{<collection>: [to_hash, ...]}`.
pub fn batch_body<T: Resource>(collection: &str, items: &[&mut T]) -> Result<Payload> {
    let hashes = items
        .iter()
        .map(|item| item.to_hash())
        .collect::<Result<Vec<_>>>()?;
    Ok(keyed(collection, Payload::Array(hashes)))
}

/// `{<collection>: [{"id": id}, ...]}` for id-bearing instances.
pub fn destroy_body<T: Resource>(collection: &str, items: &[&mut T]) -> Payload {
    let ids: Vec<Payload> = items
        .iter()
        .filter_map(|item| item.id())
        .map(|id| json!({ "id": id }))
        .collect();
    keyed(collection, Payload::Array(ids))
}

fn keyed(collection: &str, value: Payload) -> Payload {
    let mut body = serde_json::Map::new();
    body.insert(collection.to_string(), value);
    Payload::Object(body)
}

pub fn apply_create_results<T: Resource>(items: &mut [&mut T], results: &[BatchResult]) {
    check_lengths("create", items.len(), results.len());
    for (item, result) in items.iter_mut().zip(results) {
        if result.is_error {
            record_error(&mut **item, result);
        } else if result.is_new {
            match &result.id {
                Some(id) => item.set_id(Some(id.clone())),
                None => warn!("create result flagged new without an id"),
            }
        }
    }
}

pub fn apply_update_results<T: Resource>(
    items: &mut [&mut T],
    results: &[BatchResult],
    policy: UpdateErrors,
) {
    if policy == UpdateErrors::Ignore {
        return;
    }
    check_lengths("update", items.len(), results.len());
    for (item, result) in items.iter_mut().zip(results) {
        if result.is_error {
            record_error(&mut **item, result);
        }
    }
}

pub fn apply_destroy_results<T: Resource>(items: &mut [&mut T], results: &[BatchResult]) {
    check_lengths("destroy", items.len(), results.len());
    for (item, result) in items.iter_mut().zip(results) {
        if result.is_error {
            record_error(&mut **item, result);
        } else {
            item.set_id(None);
        }
    }
}

fn record_error<T: Resource>(item: &mut T, result: &BatchResult) {
    warn!(
        id = ?item.id(),
        kind = result.error_kind(),
        error = result.error_message(),
        "Item rejected"
    );
    item.errors_mut()
        .add(result.error_kind(), result.error_message());
}

fn check_lengths(operation: &str, submitted: usize, returned: usize) {
    if submitted != returned {
        warn!(operation, submitted, returned, "Result count mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Errors;
    use serde::Serialize;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Field {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ResourceId>,
        #[serde(default)]
        name: String,
        #[serde(skip)]
        errors: Errors,
    }

    impl Resource for Field {
        fn id(&self) -> Option<&ResourceId> {
            self.id.as_ref()
        }
        fn set_id(&mut self, id: Option<ResourceId>) {
            self.id = id;
        }
        fn errors(&self) -> &Errors {
            &self.errors
        }
        fn errors_mut(&mut self) -> &mut Errors {
            &mut self.errors
        }
    }

    fn field(id: Option<&str>, name: &str) -> Field {
        Field {
            id: id.map(ResourceId::from),
            name: name.to_string(),
            errors: Errors::new(),
        }
    }

    #[test]
    fn test_normalize_shapes() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(Payload::Null)).is_empty());
        assert_eq!(normalize(Some(json!({"id": 1}))), vec![json!({"id": 1})]);
        assert_eq!(normalize(Some(json!([1, 2]))).len(), 2);
    }

    #[test]
    fn test_parse_results_singleton() {
        let results = parse_results(json!({"return": {"is_new": true, "id": 9}}));
        assert_eq!(results, vec![BatchResult::created(9u64)]);
    }

    #[test]
    fn test_parse_results_defaults_missing_flags() {
        let results =
            parse_results(json!({"return": [{"error_string": "x", "is_error": true}, {}]}));
        assert_eq!(results[0], BatchResult::error("x"));
        assert_eq!(results[1], BatchResult::default());
        assert!(parse_results(json!({})).is_empty());
    }

    #[test]
    fn test_parse_results_tolerates_blank_ids() {
        let results = parse_results(json!({"return": [{"is_error": true, "id": ""}]}));
        assert_eq!(results[0].id, None);
    }

    #[test]
    fn test_parse_results_accepts_numeric_error_codes() {
        let results = parse_results(json!({"return": [
            {"is_new": true, "id": 10},
            {"is_error": true, "error_code": 303, "error_string": "Invalid email"}
        ]}));
        assert_eq!(results[0], BatchResult::created(10u64));
        assert_eq!(results[1].error_kind(), "303");
        assert_eq!(results[1].error_message(), "Invalid email");
    }

    #[test]
    fn test_parse_results_keeps_position_of_undecodable_entry() {
        let results = parse_results(json!({"return": [
            {"is_new": "yes", "id": 1},
            {"is_new": true, "id": 2}
        ]}));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], BatchResult::default());
        assert_eq!(results[1], BatchResult::created(2u64));
    }

    #[test]
    fn test_batch_body_keys_by_collection() {
        let mut a = field(None, "email");
        let mut b = field(Some("4"), "phone");
        let body = batch_body("fields", &[&mut a, &mut b]).unwrap();
        assert_eq!(
            body,
            json!({"fields": [{"name": "email"}, {"id": "4", "name": "phone"}]})
        );
    }

    #[test]
    fn test_destroy_body_only_carries_ids() {
        let mut a = field(Some("1"), "email");
        let mut b = field(Some("2"), "phone");
        let body = destroy_body("fields", &[&mut a, &mut b]);
        assert_eq!(body, json!({"fields": [{"id": "1"}, {"id": "2"}]}));
    }

    #[test]
    fn test_create_assigns_ids_by_index() {
        let mut items: Vec<Field> = (0..3).map(|i| field(None, &format!("f{i}"))).collect();
        let results = vec![
            BatchResult::created(10u64),
            BatchResult::created(11u64),
            BatchResult::created(12u64),
        ];

        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_create_results(&mut refs, &results);

        let ids: Vec<ResourceId> = items.iter().map(|f| f.id.clone().unwrap()).collect();
        assert_eq!(
            ids,
            vec![ResourceId::from("10"), ResourceId::from("11"), ResourceId::from("12")]
        );
    }

    #[test]
    fn test_create_records_error_and_keeps_id_absent() {
        let mut items = vec![field(None, "ok"), field(None, "bad")];
        let results = vec![
            BatchResult::created(1u64),
            BatchResult {
                error_code: Some("name".into()),
                ..BatchResult::error("is reserved")
            },
        ];

        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_create_results(&mut refs, &results);

        assert_eq!(items[0].id, Some("1".into()));
        assert!(items[0].errors.is_empty());
        assert_eq!(items[1].id, None);
        assert_eq!(items[1].errors.len(), 1);
        assert_eq!(items[1].errors.get("name"), vec!["is reserved"]);
    }

    #[test]
    fn test_create_inert_result_leaves_item_alone() {
        let mut items = vec![field(None, "x")];
        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_create_results(&mut refs, &[BatchResult::ok(5u64)]);

        assert_eq!(items[0].id, None);
        assert!(items[0].errors.is_empty());
    }

    #[test]
    fn test_create_with_short_results_only_touches_matched_items() {
        let mut items = vec![field(None, "a"), field(None, "b")];
        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_create_results(&mut refs, &[BatchResult::created(1u64)]);

        assert_eq!(items[0].id, Some("1".into()));
        assert_eq!(items[1].id, None);
    }

    #[test]
    fn test_update_errors_ignored_by_default() {
        let mut items = vec![field(Some("1"), "a")];
        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_update_results(&mut refs, &[BatchResult::error("nope")], UpdateErrors::Ignore);

        assert!(items[0].errors.is_empty());
        assert_eq!(items[0].id, Some("1".into()));
    }

    #[test]
    fn test_update_errors_recorded_when_enabled() {
        let mut items = vec![field(Some("1"), "a"), field(Some("2"), "b")];
        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_update_results(
            &mut refs,
            &[BatchResult::ok(1u64), BatchResult::error("nope")],
            UpdateErrors::Record,
        );

        assert!(items[0].errors.is_empty());
        assert_eq!(items[1].errors.get(BASE_ERROR_KIND), vec!["nope"]);
        assert_eq!(items[1].id, Some("2".into()));
    }

    #[test]
    fn test_destroy_clears_ids_unless_error() {
        let mut items = vec![field(Some("1"), "a"), field(Some("2"), "b")];
        let mut refs: Vec<&mut Field> = items.iter_mut().collect();
        apply_destroy_results(
            &mut refs,
            &[BatchResult::ok(1u64), BatchResult::error("locked")],
        );

        assert_eq!(items[0].id, None);
        assert_eq!(items[1].id, Some("2".into()));
        assert_eq!(items[1].errors.full_messages(), vec!["locked"]);
    }
}
