//! `reporag`: index a source repository into a vector store and chat with it.
//!
//! - `reporag ingest <REPO>` clones (or reuses) a repository and indexes its source files
//! - `reporag ask <QUESTION>` answers one question from the command line
//! - `reporag serve` starts the HTTP chat front end

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use reporag_core::AnswerService;
use reporag_core::bootstrap::{AppBuilder, resolve_config_path};
use reporag_core::vault::EnvVaultProvider;
use reporag_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "reporag")]
#[command(about = "Retrieval-augmented chat over a source repository")]
#[command(version)]
struct Cli {
    /// Path to config file (default: $REPORAG_CONFIG or config/default.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clone a repository (or use a local directory) and index its source files
    Ingest {
        /// Git URL or local directory
        repo: String,

        /// Namespace to write records into
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Answer a single question against the index
    Ask {
        question: String,

        /// Namespace to search
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Serve the chat page and `/chat` endpoint
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    tracing::debug!(path = %config_path.display(), "loading config");
    let app = AppBuilder::load(config_path, &EnvVaultProvider).await?;

    match cli.command {
        Command::Ingest { repo, namespace } => run_ingest(&app, &repo, namespace.as_deref()).await,
        Command::Ask {
            question,
            namespace,
        } => run_ask(&app, &question, namespace.as_deref()).await,
        Command::Serve => run_serve(&app).await,
    }
}

async fn run_ingest(app: &AppBuilder, repo: &str, namespace: Option<&str>) -> anyhow::Result<()> {
    let embedder = Arc::new(app.build_embedder()?);
    let index = app.build_index_client(namespace)?;
    let ingestor = app.build_ingestor(embedder, index);

    let report = ingestor
        .ingest_repository(&app.build_materializer(), repo)
        .await
        .with_context(|| format!("failed to ingest {repo}"))?;

    println!(
        "Indexed {} files from {} in {} ms ({} records in index)",
        report.files_indexed,
        report.root.display(),
        report.duration_ms,
        report.records_total
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path, skipped.reason);
    }
    Ok(())
}

async fn run_ask(app: &AppBuilder, question: &str, namespace: Option<&str>) -> anyhow::Result<()> {
    let embedder = Arc::new(app.build_embedder()?);
    let chat = Arc::new(app.build_chat_provider()?);
    let index = app.build_index_client(namespace)?;
    let pipeline = app.build_pipeline(embedder, chat, index);

    println!("{}", pipeline.answer(question, None).await);
    Ok(())
}

async fn run_serve(app: &AppBuilder) -> anyhow::Result<()> {
    let embedder = Arc::new(app.build_embedder()?);
    let chat = Arc::new(app.build_chat_provider()?);
    let index = app.build_index_client(None)?;
    let service: Arc<dyn AnswerService> = Arc::new(app.build_pipeline(embedder, chat, index));

    let (shutdown_tx, shutdown_rx) = AppBuilder::build_shutdown();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let gateway = &app.config().gateway;
    GatewayServer::new(&gateway.bind, gateway.port, service, shutdown_rx)
        .with_max_body_size(gateway.max_body_size)
        .serve()
        .await?;
    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
