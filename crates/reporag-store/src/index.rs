//! Record-level index client: deterministic ids, metadata payloads, namespace partitioning.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::vector_store::{FieldCondition, VectorFilter, VectorPoint, VectorStore, VectorStoreError};

const RECORD_NAMESPACE: uuid::Uuid = uuid::Uuid::from_bytes([
    0x72, 0x65, 0x70, 0x6f, // "repo"
    0x72, 0x61, 0x67, 0x2d, // "rag-"
    0x72, 0x65, 0x63, 0x73, // "recs"
    0x00, 0x00, 0x00, 0x01, // version
]);

const TEXT_FIELD: &str = "text";
const SOURCE_FIELD: &str = "source";
const NAMESPACE_FIELD: &str = "namespace";

/// Metadata stored alongside every vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Full document text, returned as retrieval context.
    pub text: String,
    /// Relative path of the originating file.
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    /// Relative path of the document; the stable record key.
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Stable point id for a record key within an optional namespace.
///
/// The same `(namespace, id)` pair always yields the same UUID, so re-upserting
/// a file overwrites its previous point. The namespace is length-prefixed in the
/// seed, so a `/` in either part cannot make two pairs collide.
#[must_use]
pub fn record_point_id(namespace: Option<&str>, id: &str) -> String {
    let ns = namespace.unwrap_or_default();
    let key = format!("{}:{ns}/{id}", ns.len());
    uuid::Uuid::new_v5(&RECORD_NAMESPACE, key.as_bytes()).to_string()
}

/// Upsert/query client bound to one collection and an optional namespace.
#[derive(Clone)]
pub struct IndexClient {
    store: Arc<dyn VectorStore>,
    collection: String,
    namespace: Option<String>,
}

impl std::fmt::Debug for IndexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexClient")
            .field("collection", &self.collection)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl IndexClient {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            namespace: None,
        }
    }

    /// Scope upserts and queries to `namespace`. Empty strings mean no namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be checked or created.
    pub async fn ensure(&self, vector_size: u64) -> Result<(), VectorStoreError> {
        self.store
            .ensure_collection(&self.collection, vector_size)
            .await
    }

    /// Insert or overwrite `record`, keyed by its id and the client namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the point.
    pub async fn upsert(&self, record: VectorRecord) -> Result<(), VectorStoreError> {
        let point_id = record_point_id(self.namespace(), &record.id);
        let mut payload = HashMap::from([
            (TEXT_FIELD.to_owned(), serde_json::Value::String(record.metadata.text)),
            (
                SOURCE_FIELD.to_owned(),
                serde_json::Value::String(record.metadata.source),
            ),
        ]);
        if let Some(ns) = &self.namespace {
            payload.insert(NAMESPACE_FIELD.to_owned(), serde_json::Value::String(ns.clone()));
        }
        tracing::debug!(id = %record.id, point_id = %point_id, dim = record.embedding.len(), "upserting record");
        self.store
            .upsert(
                &self.collection,
                vec![VectorPoint {
                    id: point_id,
                    vector: record.embedding,
                    payload,
                }],
            )
            .await
    }

    /// Up to `top_k` records most similar to `vector`, best first.
    ///
    /// Matches without a `text` payload are dropped. A collection that does not
    /// exist yet has no matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check or the search fails.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        if !self.store.collection_exists(&self.collection).await? {
            tracing::debug!(collection = %self.collection, "collection not created yet, no matches");
            return Ok(Vec::new());
        }
        let hits = self
            .store
            .search(&self.collection, vector, top_k, self.namespace_filter())
            .await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let text = hit.payload.get(TEXT_FIELD)?.as_str()?.to_owned();
                let source = hit
                    .payload
                    .get(SOURCE_FIELD)
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                Some(QueryMatch {
                    score: hit.score,
                    metadata: RecordMetadata { text, source },
                })
            })
            .collect())
    }

    /// Number of records visible to this client; zero before the collection exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check or the count request fails.
    pub async fn count(&self) -> Result<u64, VectorStoreError> {
        if !self.store.collection_exists(&self.collection).await? {
            return Ok(0);
        }
        self.store
            .count(&self.collection, self.namespace_filter())
            .await
    }

    fn namespace_filter(&self) -> Option<VectorFilter> {
        self.namespace.as_ref().map(|ns| VectorFilter {
            must: vec![FieldCondition {
                field: NAMESPACE_FIELD.to_owned(),
                value: ns.clone(),
            }],
        })
    }
}
