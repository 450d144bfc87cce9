pub mod embed;

pub use candle_core::Device;

use std::sync::Arc;

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

use self::embed::EmbedModel;

/// Local embedding provider backed by a Candle BERT model.
///
/// Embedding-only: `chat` always fails with [`LlmError::ChatUnsupported`].
#[derive(Clone, Debug)]
pub struct CandleEmbedder {
    model: Arc<EmbedModel>,
}

impl CandleEmbedder {
    /// Download (or reuse the hf-hub cache of) `repo_id` and load it on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be fetched or initialized.
    pub fn load(repo_id: &str, device: &Device) -> Result<Self, LlmError> {
        Ok(Self {
            model: Arc::new(EmbedModel::load(repo_id, device)?),
        })
    }

    #[must_use]
    pub fn repo_id(&self) -> &str {
        self.model.repo_id()
    }
}

impl LlmProvider for CandleEmbedder {
    async fn chat(&self, _messages: &[Message]) -> Result<String, LlmError> {
        Err(LlmError::ChatUnsupported {
            provider: "candle".into(),
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = Arc::clone(&self.model);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || model.embed_sync(&text))
            .await
            .map_err(|e| LlmError::Inference(format!("candle embedding task failed: {e}")))?
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "candle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "downloads sentence-transformers/all-MiniLM-L6-v2 from HuggingFace Hub"]
    async fn embeds_are_normalized_and_deterministic() {
        let embedder =
            CandleEmbedder::load("sentence-transformers/all-MiniLM-L6-v2", &Device::Cpu).unwrap();
        let a = embedder.embed("fn main() {}").await.unwrap();
        let b = embedder.embed("fn main() {}").await.unwrap();
        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    #[ignore = "downloads sentence-transformers/all-MiniLM-L6-v2 from HuggingFace Hub"]
    async fn long_input_is_truncated_not_rejected() {
        let embedder =
            CandleEmbedder::load("sentence-transformers/all-MiniLM-L6-v2", &Device::Cpu).unwrap();
        let long = "token ".repeat(5_000);
        assert!(embedder.embed(&long).await.is_ok());
    }
}
