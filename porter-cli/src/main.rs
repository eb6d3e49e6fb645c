//! Porter process entrypoints
//!
//! `serve` runs the scheduler and a worker pool in one process against the
//! shared in-memory broker; `match-pass` and `classify` run single jobs on
//! demand.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use porter_engine::config::EngineConfig;
use porter_engine::model::ObjectId;
use porter_engine::notify::HttpNotifier;
use porter_engine::queue::{Broker, JobKind, JobRouter, Scheduler, Worker};
use porter_engine::store::Store;
use porter_nlp::{Classifier, EmbeddingProvider, HashingEmbedder, ModelCache};

#[derive(Parser)]
#[command(name = "porter", about = "Campus errand matching and assignment engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler and a worker pool
    Serve {
        /// Number of queue workers
        #[arg(long, default_value_t = 2)]
        workers: usize,
    },
    /// Run one goods-match pass immediately
    MatchPass,
    /// Classify one resource immediately
    Classify {
        /// Resource id (24 hex characters)
        resource_id: String,
    },
}

struct Runtime {
    router: Arc<JobRouter>,
}

fn build_runtime(config: &EngineConfig) -> anyhow::Result<Runtime> {
    let store = Arc::new(Store::open(&config.data_dir).context("opening store")?);
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::default());

    // One process per host performs model initialization; the others skip
    // via the recorded state or back off while the lock is held.
    let cache = ModelCache::new(&config.nlp_cache_dir);
    let warmup_provider = provider.clone();
    cache
        .ensure_initialized(move || Classifier::new(warmup_provider).warm_up())
        .context("initializing model cache")?;

    let notifier = Arc::new(
        HttpNotifier::new(&config.notification_url).context("building notification client")?,
    );
    let router = Arc::new(JobRouter::new(store, provider, notifier, config));
    Ok(Runtime { router })
}

async fn serve(config: EngineConfig, workers: usize) -> anyhow::Result<()> {
    let runtime = build_runtime(&config)?;
    let broker = Arc::new(Broker::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = Vec::new();
    for index in 0..workers.max(1) {
        let worker = Worker::new(
            format!("worker-{index}"),
            broker.clone(),
            runtime.router.clone(),
        );
        let rx = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move { worker.run(rx).await }));
    }
    let scheduler = Scheduler::new(broker.clone());
    let rx = shutdown_rx.clone();
    tasks.push(tokio::spawn(async move { scheduler.run(rx).await }));

    info!(workers, "porter serving");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("loading configuration")?;

    match cli.command {
        Command::Serve { workers } => serve(config, workers).await,
        Command::MatchPass => {
            let runtime = build_runtime(&config)?;
            runtime
                .router
                .dispatch(&JobKind::MatchResources)
                .await
                .context("running match pass")?;
            Ok(())
        }
        Command::Classify { resource_id } => {
            let runtime = build_runtime(&config)?;
            let resource_id =
                ObjectId::parse_str(&resource_id).context("parsing resource id")?;
            runtime
                .router
                .dispatch(&JobKind::ClassifyResource { resource_id })
                .await
                .context("classifying resource")?;
            Ok(())
        }
    }
}
