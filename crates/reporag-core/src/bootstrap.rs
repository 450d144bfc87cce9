//! Application bootstrap: config resolution and construction of shared clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
#[cfg(not(feature = "candle"))]
use anyhow::bail;
use reporag_index::{Ingestor, Materializer};
use reporag_llm::any::AnyProvider;
use reporag_llm::openai::OpenAiProvider;
use reporag_store::{IndexClient, QdrantOps, VectorStore};
use tokio::sync::watch;

use crate::config::{Config, EmbeddingProviderKind};
use crate::pipeline::RagPipeline;
use crate::synthesizer::AnswerSynthesizer;
use crate::vault::VaultProvider;

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Load and validate the config at `config_path`, then resolve secrets through `vault`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed, fails validation, or the vault fails.
    pub async fn load(config_path: PathBuf, vault: &dyn VaultProvider) -> anyhow::Result<Self> {
        let mut config = Config::load(&config_path)?;
        config.validate()?;
        config.resolve_secrets(vault).await?;
        Ok(Self {
            config,
            config_path,
        })
    }

    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            config_path: PathBuf::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// # Errors
    ///
    /// Returns an error if the embedding backend cannot be constructed.
    pub fn build_embedder(&self) -> anyhow::Result<AnyProvider> {
        let provider = create_embedder(&self.config)?;
        tracing::info!(
            provider = ?self.config.embedding.provider,
            model = %self.config.embedding.model,
            "embedding model ready"
        );
        Ok(provider)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build_chat_provider(&self) -> anyhow::Result<AnyProvider> {
        create_chat_provider(&self.config)
    }

    /// Index client for the configured collection.
    ///
    /// A non-empty `namespace` replaces the configured default.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn build_index_client(&self, namespace: Option<&str>) -> anyhow::Result<IndexClient> {
        let api_key = self
            .config
            .secrets
            .qdrant_api_key
            .as_ref()
            .map(|s| s.expose().to_owned());
        let ops = QdrantOps::new(&self.config.index.qdrant_url, api_key)
            .with_context(|| format!("failed to connect to {}", self.config.index.qdrant_url))?;
        let store: Arc<dyn VectorStore> = Arc::new(ops);
        Ok(self.index_client_for(store, namespace))
    }

    #[must_use]
    pub fn index_client_for(
        &self,
        store: Arc<dyn VectorStore>,
        namespace: Option<&str>,
    ) -> IndexClient {
        let namespace = namespace
            .filter(|ns| !ns.is_empty())
            .map(str::to_owned)
            .or_else(|| self.config.index.namespace.clone());
        IndexClient::new(store, self.config.index.collection.clone()).with_namespace(namespace)
    }

    #[must_use]
    pub fn build_pipeline(
        &self,
        embedder: Arc<AnyProvider>,
        chat: Arc<AnyProvider>,
        index: IndexClient,
    ) -> RagPipeline {
        RagPipeline::new(
            embedder,
            index,
            AnswerSynthesizer::new(chat),
            self.config.index.top_k,
        )
    }

    #[must_use]
    pub fn build_ingestor(&self, embedder: Arc<AnyProvider>, index: IndexClient) -> Ingestor {
        Ingestor::new(index, embedder, self.config.ingest.extractor_config())
    }

    #[must_use]
    pub fn build_materializer(&self) -> Materializer {
        Materializer::new(self.config.ingest.workdir.clone())
    }

    #[must_use]
    pub fn build_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }
}

/// Priority: CLI `--config` > `REPORAG_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("REPORAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn openai_api_key(config: &Config) -> String {
    match &config.secrets.openai_api_key {
        Some(key) => key.expose().to_owned(),
        None => {
            tracing::warn!("REPORAG_OPENAI_API_KEY is not set; OpenAI requests will be rejected");
            String::new()
        }
    }
}

/// Chat completion provider for answer synthesis.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn create_chat_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let provider = OpenAiProvider::new(
        openai_api_key(config),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
        None,
    )?
    .with_temperature(config.llm.temperature);
    Ok(AnyProvider::OpenAi(provider))
}

/// Embedding provider selected by `embedding.provider`.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded or the backend is not compiled in.
pub fn create_embedder(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.embedding.provider {
        EmbeddingProviderKind::OpenAi => {
            let provider = OpenAiProvider::new(
                openai_api_key(config),
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                config.llm.max_tokens,
                Some(config.embedding.model.clone()),
            )?;
            Ok(AnyProvider::OpenAi(provider))
        }
        #[cfg(feature = "candle")]
        EmbeddingProviderKind::Candle => {
            let device = select_device(&config.embedding.device)?;
            let embedder =
                reporag_llm::candle_provider::CandleEmbedder::load(&config.embedding.model, &device)
                    .with_context(|| {
                        format!("failed to load embedding model {}", config.embedding.model)
                    })?;
            Ok(AnyProvider::Candle(embedder))
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingProviderKind::Candle => {
            bail!("compiled without candle feature; set embedding.provider = \"openai\"")
        }
    }
}

/// Candle device for `preference`: `cpu`, `cuda`, `metal`, or `auto`.
///
/// # Errors
///
/// Returns an error if the requested accelerator is unavailable or not compiled in.
#[cfg(feature = "candle")]
pub fn select_device(preference: &str) -> anyhow::Result<reporag_llm::candle_provider::Device> {
    use reporag_llm::candle_provider::Device;

    match preference {
        "metal" => {
            #[cfg(feature = "metal")]
            return Ok(Device::new_metal(0)?);
            #[cfg(not(feature = "metal"))]
            anyhow::bail!("candle compiled without metal feature");
        }
        "cuda" => {
            #[cfg(feature = "cuda")]
            return Ok(Device::new_cuda(0)?);
            #[cfg(not(feature = "cuda"))]
            anyhow::bail!("candle compiled without cuda feature");
        }
        "auto" => {
            #[cfg(feature = "metal")]
            if let Ok(device) = Device::new_metal(0) {
                return Ok(device);
            }
            #[cfg(feature = "cuda")]
            if let Ok(device) = Device::new_cuda(0) {
                return Ok(device);
            }
            Ok(Device::Cpu)
        }
        _ => Ok(Device::Cpu),
    }
}
