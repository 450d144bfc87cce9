//! Error types for reporag-index.

use std::num::TryFromIntError;

/// Errors that can occur while materializing or ingesting a repository.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error on the working directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The repository source is neither a supported URL nor a local directory.
    #[error("invalid repository source: {0}")]
    InvalidSource(String),

    /// `git clone` could not be run or exited unsuccessfully.
    #[error("git clone failed: {0}")]
    GitClone(String),

    /// Embedding provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] reporag_llm::LlmError),

    /// Vector index error.
    #[error("vector store error: {0}")]
    VectorStore(#[from] reporag_store::VectorStoreError),

    /// Integer conversion error.
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] TryFromIntError),

    /// Background extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
