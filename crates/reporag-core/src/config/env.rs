use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_index();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("REPORAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("REPORAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("REPORAG_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid REPORAG_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("REPORAG_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
    }

    fn apply_env_overrides_index(&mut self) {
        if let Ok(v) = std::env::var("REPORAG_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("REPORAG_COLLECTION") {
            self.index.collection = v;
        }
        if let Ok(v) = std::env::var("REPORAG_NAMESPACE") {
            self.index.namespace = Some(v).filter(|ns| !ns.is_empty());
        }
        if let Ok(v) = std::env::var("REPORAG_TOP_K")
            && let Ok(k) = v.parse::<usize>()
        {
            self.index.top_k = k;
        }
        if let Ok(v) = std::env::var("REPORAG_WORKDIR") {
            self.ingest.workdir = v.into();
        }
        if let Ok(v) = std::env::var("REPORAG_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("REPORAG_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
    }
}
