use std::path::PathBuf;

use reporag_index::ExtractorConfig;
use reporag_index::extractor::{DEFAULT_EXTENSIONS, DEFAULT_IGNORED_DIRS, DEFAULT_MAX_FILE_SIZE};
use serde::Deserialize;

use crate::vault::Secret;

/// Top-level application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Secrets resolved from the vault at startup. Never read from the config file.
#[derive(Debug, Default, Clone)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
    pub qdrant_api_key: Option<Secret>,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-4o".into()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local sentence-transformer model run through candle.
    #[default]
    Candle,
    /// `POST {base_url}/embeddings` on the OpenAI-compatible endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// `cpu`, `cuda`, `metal`, or `auto`. Only used by the candle provider.
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".into()
}

fn default_device() -> String {
    "cpu".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            device: default_device(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Partition used when neither the CLI nor the request names one.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    "codebase-rag".into()
}

fn default_top_k() -> usize {
    5
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            namespace: None,
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestConfig {
    /// Directory that remote repositories are cloned into.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_workdir() -> PathBuf {
    PathBuf::from("./repos")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_owned()).collect()
}

fn default_ignored_dirs() -> Vec<String> {
    DEFAULT_IGNORED_DIRS
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            extensions: default_extensions(),
            ignored_dirs: default_ignored_dirs(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            extensions: self.extensions.clone(),
            ignored_dirs: self.ignored_dirs.clone(),
            max_file_size: self.max_file_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    5001
}

fn default_max_body_size() -> usize {
    1_048_576
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            max_body_size: default_max_body_size(),
        }
    }
}
