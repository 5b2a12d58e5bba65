//! Document-store primitives shared by every port implementation.
//!
//! Documents are schemaless JSON objects; typed models round-trip through
//! [`to_document`] / [`from_document`]. Mutations go through [`Patch`] so
//! backends can apply counter increments and timestamps atomically.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// A schemaless stored document.
pub type Document = serde_json::Map<String, Value>;

/// Collection names used by the core.
pub mod collections {
    pub const USERS: &str = "users";
    pub const IDEAS: &str = "ideas";
    pub const COMMENTS: &str = "comments";
}

/// A single field mutation inside a [`Patch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Overwrite the field with the given value.
    Set(Value),
    /// Add `delta` to a numeric field. Counters floor at zero.
    Increment(i64),
    /// Store-assigned current time.
    Timestamp,
}

/// Ordered field mutations applied atomically to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    ops: Vec<(String, FieldOp)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.ops.push((field.to_string(), FieldOp::Set(value)));
        self
    }

    pub fn increment(mut self, field: &str, delta: i64) -> Self {
        self.ops.push((field.to_string(), FieldOp::Increment(delta)));
        self
    }

    /// Stamps the field with the store's current time.
    pub fn touch(mut self, field: &str) -> Self {
        self.ops.push((field.to_string(), FieldOp::Timestamp));
        self
    }

    pub fn ops(&self) -> &[(String, FieldOp)] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Equality-filtered, optionally ordered, capped collection scan.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Order)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate on `field`.
    pub fn filter(mut self, field: &str, value: Value) -> Self {
        self.filters.push((field.to_string(), value));
        self
    }

    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        self.order_by = Some((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Serializes a model into a stored document.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Corrupt(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(err) => Err(StoreError::Corrupt(err.to_string())),
    }
}

/// Rehydrates a model from a stored document.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|err| StoreError::Corrupt(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewIdea};

    #[test]
    fn patch_builder_preserves_op_order() {
        let patch = Patch::new()
            .increment("votesCount", -1)
            .touch("updatedAt")
            .set("status", serde_json::json!("approved"));
        let fields: Vec<&str> = patch.ops().iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, ["votesCount", "updatedAt", "status"]);
    }

    #[test]
    fn models_round_trip_through_documents() {
        let input = NewIdea {
            title: "Bike racks".into(),
            description: "Covered racks by the gym entrance".into(),
            category: Category::Facility,
        };
        let doc = to_document(&input).unwrap();
        assert_eq!(doc["category"], "facility");
        let back: NewIdea = from_document(doc).unwrap();
        assert_eq!(back.title, input.title);
    }

    #[test]
    fn non_object_values_do_not_become_documents() {
        assert!(to_document(&42).is_err());
    }
}
