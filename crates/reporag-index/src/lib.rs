//! Ingestion path: materialize a repository, extract source documents, embed them,
//! and upsert one record per file into the vector index.

pub mod error;
pub mod extractor;
pub mod ingest;
pub mod materializer;

pub use error::{IndexError, Result};
pub use extractor::{Document, Extraction, ExtractorConfig, SkippedFile, extract};
pub use ingest::{IngestReport, Ingestor};
pub use materializer::{Materialized, Materializer, repo_dir_name};
