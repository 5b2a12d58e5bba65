//! # ib-store-memory Implementation
//!
//! In-process implementation of the `DocumentStore` port. Documents carry
//! a version that every committed write bumps; a transaction records the
//! versions it read and commit fails with `Conflict` when any of them
//! moved, which is what drives the callers' retry loops.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use ib_core::document::{Document, FieldOp, Order, Patch, Query};
use ib_core::error::{StoreError, StoreResult};
use ib_core::traits::{DocumentStore, StoreTxn};

#[derive(Debug, Clone)]
struct VersionedDoc {
    version: u64,
    data: Document,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, VersionedDoc>>,
}

impl Inner {
    fn doc(&self, collection: &str, id: &str) -> Option<&VersionedDoc> {
        self.collections.get(collection).and_then(|c| c.get(id))
    }

    fn version(&self, collection: &str, id: &str) -> u64 {
        self.doc(collection, id).map_or(0, |d| d.version)
    }

    fn put(&mut self, collection: &str, id: &str, data: Document) {
        let coll = self.collections.entry(collection.to_string()).or_default();
        let version = coll.get(id).map_or(0, |d| d.version) + 1;
        coll.insert(id.to_string(), VersionedDoc { version, data });
    }

    fn patch(&mut self, collection: &str, id: &str, patch: &Patch) -> StoreResult<()> {
        let doc = self
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::Missing(collection.to_string(), id.to_string()))?;
        apply_patch(&mut doc.data, patch);
        doc.version += 1;
        Ok(())
    }

    fn remove(&mut self, collection: &str, id: &str) {
        if let Some(coll) = self.collections.get_mut(collection) {
            coll.remove(id);
        }
    }
}

/// Applies field operations in order. Increments treat a missing or
/// non-numeric field as zero and floor the result at zero.
fn apply_patch(data: &mut Document, patch: &Patch) {
    let now = serde_json::json!(Utc::now());
    for (field, op) in patch.ops() {
        match op {
            FieldOp::Set(value) => {
                data.insert(field.clone(), value.clone());
            }
            FieldOp::Increment(delta) => {
                let current = data.get(field).and_then(Value::as_i64).unwrap_or(0);
                data.insert(field.clone(), Value::from((current + delta).max(0)));
            }
            FieldOp::Timestamp => {
                data.insert(field.clone(), now.clone());
            }
        }
    }
}

fn matches(data: &Document, filters: &[(String, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| data.get(field) == Some(expected))
}

/// Field comparison for order-by. Numbers compare numerically, RFC 3339
/// strings chronologically (their fractional seconds vary in width, so
/// lexicographic order is not enough), other strings lexicographically;
/// absent fields sort first.
fn cmp_field(a: &Document, b: &Document, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => cmp_values(x, y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(p), Some(q)) => p.cmp(&q),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn parse_instant(raw: &str) -> Option<chrono::DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Multi-writer in-process document store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner.doc(collection, id).map(|d| d.data.clone()))
    }

    async fn insert(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.put(collection, id, doc);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Patch) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.patch(collection, id, &patch)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.remove(collection, id);
        Ok(())
    }

    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<(String, Document)>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<(String, Document)> = inner
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|(_, doc)| matches(&doc.data, &query.filters))
            .map(|(id, doc)| (id.clone(), doc.data.clone()))
            .collect();

        if let Some((field, order)) = &query.order_by {
            rows.sort_by(|(_, a), (_, b)| {
                let ord = cmp_field(a, b, field);
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTxn>> {
        Ok(Box::new(MemoryTxn {
            inner: Arc::clone(&self.inner),
            reads: Vec::new(),
            writes: Vec::new(),
            committed: false,
        }))
    }
}

enum BufferedWrite {
    Insert {
        collection: String,
        id: String,
        doc: Document,
    },
    Update {
        collection: String,
        id: String,
        patch: Patch,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// One optimistic transaction over a [`MemoryStore`].
pub struct MemoryTxn {
    inner: Arc<RwLock<Inner>>,
    /// (collection, id, version seen); version 0 means "was absent".
    reads: Vec<(String, String, u64)>,
    writes: Vec<BufferedWrite>,
    committed: bool,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let inner = self.inner.read().await;
        let doc = inner.doc(collection, id);
        self.reads.push((
            collection.to_string(),
            id.to_string(),
            doc.map_or(0, |d| d.version),
        ));
        Ok(doc.map(|d| d.data.clone()))
    }

    fn insert(&mut self, collection: &str, id: &str, doc: Document) {
        self.writes.push(BufferedWrite::Insert {
            collection: collection.to_string(),
            id: id.to_string(),
            doc,
        });
    }

    fn update(&mut self, collection: &str, id: &str, patch: Patch) {
        self.writes.push(BufferedWrite::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        });
    }

    fn delete(&mut self, collection: &str, id: &str) {
        self.writes.push(BufferedWrite::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    async fn commit(&mut self) -> StoreResult<()> {
        if self.committed {
            return Err(StoreError::Backend(
                "transaction already committed".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;

        // Validate everything before touching anything: the commit is
        // all-or-nothing even when it fails.
        for (collection, id, seen) in &self.reads {
            let current = inner.version(collection, id);
            if current != *seen {
                tracing::debug!(%collection, %id, seen, current, "stale read set");
                return Err(StoreError::Conflict);
            }
        }
        // Updates must target documents that will exist at apply time,
        // accounting for inserts and deletes buffered earlier in this
        // same transaction.
        let mut present: HashMap<(&str, &str), bool> = HashMap::new();
        for write in &self.writes {
            match write {
                BufferedWrite::Insert { collection, id, .. } => {
                    present.insert((collection.as_str(), id.as_str()), true);
                }
                BufferedWrite::Delete { collection, id } => {
                    present.insert((collection.as_str(), id.as_str()), false);
                }
                BufferedWrite::Update { collection, id, .. } => {
                    let exists = present
                        .get(&(collection.as_str(), id.as_str()))
                        .copied()
                        .unwrap_or_else(|| inner.doc(collection, id).is_some());
                    if !exists {
                        return Err(StoreError::Missing(collection.clone(), id.clone()));
                    }
                }
            }
        }

        for write in std::mem::take(&mut self.writes) {
            match write {
                BufferedWrite::Insert {
                    collection,
                    id,
                    doc,
                } => inner.put(&collection, &id, doc),
                BufferedWrite::Update {
                    collection,
                    id,
                    patch,
                } => {
                    // Validated above; a miss here would be a logic error.
                    inner.patch(&collection, &id, &patch)?;
                }
                BufferedWrite::Delete { collection, id } => inner.remove(&collection, &id),
            }
        }
        self.committed = true;
        Ok(())
    }
}
