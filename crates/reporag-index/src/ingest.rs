//! Ingestion orchestrator: materialize → extract → embed → upsert.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reporag_llm::any::AnyProvider;
use reporag_llm::provider::LlmProvider;
use reporag_store::{IndexClient, RecordMetadata, VectorRecord};

use crate::error::Result;
use crate::extractor::{Document, ExtractorConfig, SkippedFile, extract};
use crate::materializer::Materializer;

/// Summary of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub root: PathBuf,
    pub files_indexed: usize,
    pub skipped: Vec<SkippedFile>,
    /// Records visible in the target namespace after the run.
    pub records_total: u64,
    pub duration_ms: u64,
}

/// Embeds documents one at a time and upserts one record per file.
pub struct Ingestor {
    index: IndexClient,
    provider: Arc<AnyProvider>,
    config: ExtractorConfig,
}

impl Ingestor {
    #[must_use]
    pub fn new(index: IndexClient, provider: Arc<AnyProvider>, config: ExtractorConfig) -> Self {
        Self {
            index,
            provider,
            config,
        }
    }

    /// Materialize `source` through `materializer`, then ingest the resulting tree.
    ///
    /// # Errors
    ///
    /// Returns an error if cloning fails or any embedding/upsert call fails.
    pub async fn ingest_repository(
        &self,
        materializer: &Materializer,
        source: &str,
    ) -> Result<IngestReport> {
        let materialized = materializer.materialize(source).await?;
        self.ingest_dir(materialized.path()).await
    }

    /// Ingest every extractable file under `root`.
    ///
    /// Unreadable files are reported and skipped. The first embedding or upsert
    /// failure aborts the run; records already written stay in the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding probe, collection setup, or any
    /// per-file embed/upsert fails.
    pub async fn ingest_dir(&self, root: &Path) -> Result<IngestReport> {
        let start = std::time::Instant::now();

        let probe = self.provider.embed("probe").await?;
        let vector_size = u64::try_from(probe.len())?;
        self.index.ensure(vector_size).await?;

        let walk_root = root.to_path_buf();
        let config = self.config.clone();
        let extraction = tokio::task::spawn_blocking(move || extract(&walk_root, &config)).await?;

        let total = extraction.documents.len();
        tracing::info!(
            root = %root.display(),
            total,
            skipped = extraction.skipped.len(),
            namespace = self.index.namespace().unwrap_or("<none>"),
            "ingestion started"
        );

        let mut report = IngestReport {
            root: root.to_path_buf(),
            skipped: extraction.skipped,
            ..IngestReport::default()
        };

        for (i, doc) in extraction.documents.into_iter().enumerate() {
            let identifier = doc.identifier.clone();
            self.ingest_document(doc).await?;
            report.files_indexed += 1;
            tracing::info!(
                file = %identifier,
                progress = format_args!("{}/{total}", i + 1),
                "indexed"
            );
        }

        report.records_total = self.index.count().await?;
        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        Ok(report)
    }

    async fn ingest_document(&self, doc: Document) -> Result<()> {
        let embedding = self.provider.embed(&embedding_text(&doc)).await?;
        self.index
            .upsert(VectorRecord {
                id: doc.identifier.clone(),
                embedding,
                metadata: RecordMetadata {
                    text: doc.text,
                    source: doc.identifier,
                },
            })
            .await?;
        Ok(())
    }
}

/// Text fed to the embedding model for a document: its path, a newline, then its content.
fn embedding_text(doc: &Document) -> String {
    format!("{}\n{}", doc.identifier, doc.text)
}

#[cfg(test)]
mod tests {
    use reporag_llm::mock::MockProvider;
    use reporag_store::{InMemoryVectorStore, VectorStore};

    use super::*;
    use crate::error::IndexError;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn ingestor(mock: MockProvider, namespace: Option<&str>) -> (Ingestor, IndexClient) {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        let index =
            IndexClient::new(store, "codebase-rag").with_namespace(namespace.map(str::to_owned));
        let ingestor = Ingestor::new(
            index.clone(),
            Arc::new(AnyProvider::Mock(mock)),
            ExtractorConfig::default(),
        );
        (ingestor, index)
    }

    #[test]
    fn embedding_text_prefixes_path() {
        let doc = Document {
            identifier: "src/app.py".into(),
            text: "print(1)".into(),
        };
        assert_eq!(embedding_text(&doc), "src/app.py\nprint(1)");
    }

    #[test]
    fn index_report_defaults() {
        let report = IngestReport::default();
        assert_eq!(report.files_indexed, 0);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn ingests_one_record_per_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.py", "print('hi')");
        write(dir.path(), "web/main.ts", "export {}");
        write(dir.path(), "README.md", "# docs");
        write(dir.path(), "node_modules/lib.js", "x");

        let mock = MockProvider::default().with_embedding(vec![1.0, 0.0, 0.0]);
        let (ingestor, index) = ingestor(mock.clone(), None);

        let report = ingestor.ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.files_indexed, 2);
        assert_eq!(report.records_total, 2);
        // probe + one per file
        assert_eq!(mock.embed_calls(), 3);

        let hits = index.query(vec![1.0, 0.0, 0.0], 10).await.unwrap();
        let mut sources: Vec<_> = hits.iter().map(|h| h.metadata.source.clone()).collect();
        sources.sort();
        assert_eq!(sources, ["app.py", "web/main.ts"]);
        assert!(hits.iter().all(|h| !h.metadata.source.ends_with(".md")));
    }

    #[tokio::test]
    async fn reingesting_unchanged_tree_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.go", "package a");
        write(dir.path(), "b.go", "package b");

        let (ingestor, index) =
            ingestor(MockProvider::default().with_embedding(vec![0.0, 1.0]), None);
        ingestor.ingest_dir(dir.path()).await.unwrap();
        let second = ingestor.ingest_dir(dir.path()).await.unwrap();

        assert_eq!(second.records_total, 2);
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stored_text_is_raw_file_content() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib.rs", "pub fn answer() -> u8 { 42 }");

        let (ingestor, index) = ingestor(MockProvider::default().with_embedding(vec![1.0]), None);
        ingestor.ingest_dir(dir.path()).await.unwrap();

        let hits = index.query(vec![1.0], 1).await.unwrap();
        assert_eq!(hits[0].metadata.text, "pub fn answer() -> u8 { 42 }");
        assert_eq!(hits[0].metadata.source, "lib.rs");
    }

    #[tokio::test]
    async fn unreadable_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.c", "int x;");
        std::fs::write(dir.path().join("bad.c"), [0xff, 0xfe]).unwrap();

        let (ingestor, _) = ingestor(MockProvider::default().with_embedding(vec![1.0]), None);
        let report = ingestor.ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "bad.c");
    }

    #[tokio::test]
    async fn embedding_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x = 1");

        let (ingestor, _) = ingestor(MockProvider::default().with_failing_embed(), None);
        let err = ingestor.ingest_dir(dir.path()).await.unwrap_err();
        assert!(matches!(err, IndexError::Llm(_)));
    }

    #[tokio::test]
    async fn namespace_counts_only_its_records() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.swift", "print(1)");

        let (ingestor, index) = ingestor(
            MockProvider::default().with_embedding(vec![1.0, 1.0]),
            Some("ios-app"),
        );
        let report = ingestor.ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.records_total, 1);
        assert_eq!(index.namespace(), Some("ios-app"));
    }

    #[tokio::test]
    async fn ingest_repository_uses_existing_checkout() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "flask/app.py", "from flask import Flask");

        let (ingestor, _) = ingestor(MockProvider::default().with_embedding(vec![1.0]), None);
        let materializer = Materializer::new(dir.path());
        let report = ingestor
            .ingest_repository(&materializer, "https://github.com/pallets/flask.git")
            .await
            .unwrap();
        assert_eq!(report.root, dir.path().join("flask"));
        assert_eq!(report.files_indexed, 1);
    }
}
