//! Vector index client: a dyn-compatible [`VectorStore`] seam, its Qdrant and in-memory
//! implementations, and the record-level [`IndexClient`] used by ingestion and retrieval.

pub mod in_memory_store;
pub mod index;
pub mod qdrant_ops;
pub mod vector_store;

pub use in_memory_store::InMemoryVectorStore;
pub use index::{IndexClient, QueryMatch, RecordMetadata, VectorRecord, record_point_id};
pub use qdrant_ops::QdrantOps;
pub use vector_store::{
    FieldCondition, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};
