//! AskSphere moderation gate HTTP server entrypoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use asksphere::clock::{Clock, SystemClock};
use asksphere::config::Config;
use asksphere::embedding::{EmbedderConfig, build_embedder};
use asksphere::gate::{ContentModerationGate, EscalationPolicy};
use asksphere::gateway::{HandlerState, create_router_with_state};
use asksphere::ledger::{InMemoryLedger, ModerationLedger};
use asksphere::notify::{NOTIFICATION_LOG_TARGET, TracingNotificationSink};
use asksphere::relevance::{CommunityRelevanceAdvisor, RelevanceConfig, RelevanceScorer};
use asksphere::store::{InMemoryCommunityDirectory, InMemoryQuestionStore, SeedData};
use asksphere::toxicity::{ToxicityConfig, ToxicityScorer, build_classifier};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_SEED_PATH: &str = "data/seed.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Notices are delivered through the log, so their target stays enabled.
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("{}=info", NOTIFICATION_LOG_TARGET).parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "AskSphere moderation gate starting"
    );

    let (directory, questions) = load_stores(config.seed_path.clone())?;

    let embedder = build_embedder(EmbedderConfig::from_env())?;
    let relevance_config = RelevanceConfig::from_env();
    relevance_config.validate()?;
    let scorer = Arc::new(RelevanceScorer::new(
        embedder,
        relevance_config.reference_cache_capacity,
        relevance_config.timeout,
    ));
    let advisor = Arc::new(CommunityRelevanceAdvisor::new(
        scorer,
        Arc::new(directory),
        Arc::new(questions),
        relevance_config,
    ));

    let toxicity_config = ToxicityConfig::from_env();
    toxicity_config.validate()?;
    let classifier = build_classifier(&toxicity_config)?;
    let toxicity = Arc::new(ToxicityScorer::new(classifier, toxicity_config)?);

    let policy = EscalationPolicy::from_env();
    policy.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger: Arc<dyn ModerationLedger> = match &config.ledger_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Opening ledger snapshot");
            Arc::new(InMemoryLedger::open(path.clone(), clock.clone())?)
        }
        None => {
            tracing::warn!("No ASKSPHERE_LEDGER_PATH configured, ledger is in-memory only");
            Arc::new(InMemoryLedger::new(clock.clone()))
        }
    };

    let gate = Arc::new(ContentModerationGate::new(
        advisor,
        toxicity,
        ledger.clone(),
        Arc::new(TracingNotificationSink::new()),
        clock,
        policy,
    ));

    let app = create_router_with_state(HandlerState::new(gate));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = ledger.flush().await {
        tracing::error!("Failed to flush ledger: {}", e);
    }
    tracing::info!("AskSphere moderation gate shutdown complete");
    Ok(())
}

fn load_stores(
    seed_path: Option<PathBuf>,
) -> anyhow::Result<(InMemoryCommunityDirectory, InMemoryQuestionStore)> {
    let path = seed_path.or_else(|| {
        let fallback = PathBuf::from(DEFAULT_SEED_PATH);
        fallback.is_file().then_some(fallback)
    });

    let Some(path) = path else {
        tracing::warn!("No seed data found, starting with no communities");
        return Ok((
            InMemoryCommunityDirectory::new(),
            InMemoryQuestionStore::new(),
        ));
    };

    let seed = SeedData::load(&path)?;
    seed.validate()?;
    tracing::info!(
        path = %path.display(),
        communities = seed.communities.len(),
        questions = seed.questions.len(),
        "Loaded seed data"
    );
    Ok(seed.into_stores())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
