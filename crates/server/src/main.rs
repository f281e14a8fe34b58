use clap::Parser;
use kural_core::config;
use kural_core::search::EmbeddingTable;
use kural_core::storage::load_database;
use kural_core::EnglishLexicon;
use kural_server::api::create_router;
use kural_server::api::handlers::AppState;
use kural_server::api::metrics;
use kural_server::scorer::{ScorerCommand, ScorerGateway, ScorerKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kural-server", about = "Multilingual kural query backend")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "KURAL_PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Directory holding the collection snapshots
    #[arg(short, long, env = "KURAL_DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Command line of the verse candidate scorer
    #[arg(long, env = "KURAL_VERSE_SCORER", default_value = config::DEFAULT_VERSE_SCORER)]
    verse_scorer: ScorerCommand,

    /// Command line of the question candidate scorer
    #[arg(long, env = "KURAL_QUESTION_SCORER", default_value = config::DEFAULT_QUESTION_SCORER)]
    question_scorer: ScorerCommand,

    /// Command line of the text embedding scorer
    #[arg(long, env = "KURAL_EMBED_SCORER", default_value = config::DEFAULT_EMBED_SCORER)]
    embed_scorer: ScorerCommand,

    /// Seconds to wait for a scorer before killing it
    #[arg(long, env = "KURAL_SCORER_TIMEOUT", default_value_t = config::DEFAULT_SCORER_TIMEOUT_SECS)]
    scorer_timeout: u64,

    /// Preloaded verse embeddings (defaults to <data-dir>/embeddings.json)
    #[arg(long, env = "KURAL_EMBEDDINGS_FILE")]
    embeddings_file: Option<PathBuf>,

    /// English word list (defaults to <data-dir>/english_words.txt)
    #[arg(long, env = "KURAL_LEXICON_FILE")]
    lexicon_file: Option<PathBuf>,

    /// Graceful shutdown timeout in seconds
    #[arg(long, env = "KURAL_SHUTDOWN_TIMEOUT", default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("kural_server=info".parse()?)
                .add_directive("kural_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }
    if args.scorer_timeout == 0 || args.scorer_timeout >= config::REQUEST_TIMEOUT_SECS {
        eprintln!(
            "Error: scorer-timeout must be between 1 and {} seconds",
            config::REQUEST_TIMEOUT_SECS - 1
        );
        std::process::exit(1);
    }
    let data_path = Path::new(&args.data_dir);
    if !data_path.is_dir() {
        eprintln!("Error: data_dir '{}' is not a directory", args.data_dir);
        std::process::exit(1);
    }

    let db = load_database(data_path)?;
    for (name, count) in db.collection_counts() {
        tracing::info!("Collection '{}': {} records", name, count);
    }

    let embeddings_path = args
        .embeddings_file
        .unwrap_or_else(|| data_path.join(config::DEFAULT_EMBEDDINGS_FILE));
    let embeddings = if embeddings_path.exists() {
        EmbeddingTable::load(&embeddings_path)?
    } else {
        tracing::warn!(
            "No embeddings at {}, /api/compare will score every record 0.0",
            embeddings_path.display()
        );
        EmbeddingTable::new()
    };

    let lexicon_path = args
        .lexicon_file
        .unwrap_or_else(|| data_path.join(config::DEFAULT_LEXICON_FILE));
    let lexicon = EnglishLexicon::load(&lexicon_path)?;

    let scorer = ScorerGateway::new(
        args.verse_scorer,
        args.question_scorer,
        args.embed_scorer,
        Duration::from_secs(args.scorer_timeout),
    );
    tracing::info!(
        verses = %scorer.command(ScorerKind::Verses),
        questions = %scorer.command(ScorerKind::Questions),
        embed = %scorer.command(ScorerKind::Embed),
        timeout_secs = args.scorer_timeout,
        "Scorer gateway configured"
    );

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    metrics::update_collection_metrics(&db);

    let state = AppState {
        store: Arc::new(db),
        scorer: Arc::new(scorer),
        embeddings: Arc::new(embeddings),
        lexicon: Arc::new(lexicon),
        prometheus_handle: Some(prometheus_handle),
        start_time: Instant::now(),
    };

    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("kural-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let signalled = Arc::new(Notify::new());
    let notifier = signalled.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                wait_for_signal().await;
                notifier.notify_one();
            })
            .await
    });

    tokio::select! {
        result = &mut server => result??,
        _ = signalled.notified() => {
            let grace = Duration::from_secs(args.shutdown_timeout);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!(
                        "Shutdown timeout ({}s) exceeded, dropping in-flight requests",
                        args.shutdown_timeout
                    );
                    server.abort();
                }
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}
