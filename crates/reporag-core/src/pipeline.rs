//! Query path: embed the question, retrieve context, synthesize an answer.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reporag_llm::LlmError;
use reporag_llm::any::AnyProvider;
use reporag_llm::provider::LlmProvider;
use reporag_store::{IndexClient, VectorStoreError};

use crate::synthesizer::{Answer, AnswerSynthesizer};

pub const INVALID_QUERY_MESSAGE: &str = "Please provide a valid question.";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("index query failed: {0}")]
    Index(#[from] VectorStoreError),
}

/// Turns a user question into the response text shown to the user.
///
/// Every outcome, including validation and backend failures, is a string.
pub trait AnswerService: Send + Sync {
    fn answer<'a>(&'a self, query: &'a str, namespace: Option<&'a str>) -> BoxFuture<'a, String>;
}

pub struct RagPipeline {
    embedder: Arc<AnyProvider>,
    index: IndexClient,
    synthesizer: AnswerSynthesizer,
    top_k: u64,
}

impl RagPipeline {
    #[must_use]
    pub fn new(
        embedder: Arc<AnyProvider>,
        index: IndexClient,
        synthesizer: AnswerSynthesizer,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            synthesizer,
            top_k: u64::try_from(top_k).unwrap_or(u64::MAX),
        }
    }

    /// Context texts for `query`, best match first.
    ///
    /// `namespace` overrides the index client's default partition when non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or searching the index fails.
    pub async fn retrieve(
        &self,
        query: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<String>, PipelineError> {
        let index = match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => Cow::Owned(self.index.clone().with_namespace(Some(ns.to_owned()))),
            None => Cow::Borrowed(&self.index),
        };

        let vector = self.embedder.embed(query).await?;
        let matches = index.query(vector, self.top_k).await?;
        tracing::debug!(
            matches = matches.len(),
            namespace = index.namespace().unwrap_or("<none>"),
            "retrieved context"
        );
        Ok(matches.into_iter().map(|m| m.metadata.text).collect())
    }

    /// Answer a non-empty question. Retrieval failures become [`Answer::RetrievalFailed`].
    pub async fn ask(&self, query: &str, namespace: Option<&str>) -> Answer {
        match self.retrieve(query, namespace).await {
            Ok(contexts) => self.synthesizer.synthesize(query, &contexts).await,
            Err(e) => {
                tracing::error!("retrieval failed: {e}");
                Answer::RetrievalFailed(e.to_string())
            }
        }
    }
}

impl AnswerService for RagPipeline {
    fn answer<'a>(&'a self, query: &'a str, namespace: Option<&'a str>) -> BoxFuture<'a, String> {
        Box::pin(async move {
            if query.trim().is_empty() {
                return INVALID_QUERY_MESSAGE.to_owned();
            }
            self.ask(query, namespace).await.into_text()
        })
    }
}
