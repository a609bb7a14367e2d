//! Test server harness.

use asksphere::clock::{Clock, SystemClock};
use asksphere::embedding::{DEFAULT_STUB_DIM, HashingEmbedder};
use asksphere::gate::{ContentModerationGate, EscalationPolicy};
use asksphere::gateway::{HandlerState, create_router_with_state};
use asksphere::ledger::InMemoryLedger;
use asksphere::notify::InMemoryNotificationSink;
use asksphere::relevance::{CommunityRelevanceAdvisor, RelevanceConfig, RelevanceScorer};
use asksphere::store::SeedData;
use asksphere::toxicity::{LexiconClassifier, ToxicityConfig, ToxicityScorer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::fixtures::seed_path;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;
const LEDGER_FILE_NAME: &str = "ledger.json";

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub port: u16,
    pub seed_path: Option<PathBuf>,
    pub ledger_dir: Option<PathBuf>,
    pub policy: EscalationPolicy,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            seed_path: None,
            ledger_dir: None,
            policy: EscalationPolicy::default(),
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub ledger_path: PathBuf,
    pub notifications: Arc<InMemoryNotificationSink>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _temp_dir: Option<TempDir>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

fn startup_failed(e: impl std::fmt::Display) -> ServerStartupError {
    ServerStartupError::StartupFailed(e.to_string())
}

/// Spawns a server over the bundled seed data with stub scorers.
///
/// The embedder is the hashing stub and the classifier is the lexicon stub,
/// so no model files are needed. The ledger is persisted to a temp dir
/// unless `ledger_dir` is given.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let (ledger_dir, _temp_dir) = match config.ledger_dir {
        Some(dir) => (dir, None),
        None => {
            let temp_dir = TempDir::new().map_err(startup_failed)?;
            (temp_dir.path().to_path_buf(), Some(temp_dir))
        }
    };
    let ledger_path = ledger_dir.join(LEDGER_FILE_NAME);

    let seed = SeedData::load(&config.seed_path.unwrap_or_else(seed_path)).map_err(startup_failed)?;
    seed.validate().map_err(startup_failed)?;
    let (directory, questions) = seed.into_stores();

    let relevance_config = RelevanceConfig::default();
    let scorer = Arc::new(RelevanceScorer::new(
        Arc::new(HashingEmbedder::new(DEFAULT_STUB_DIM)),
        relevance_config.reference_cache_capacity,
        relevance_config.timeout,
    ));
    let advisor = Arc::new(CommunityRelevanceAdvisor::new(
        scorer,
        Arc::new(directory),
        Arc::new(questions),
        relevance_config,
    ));

    let toxicity = Arc::new(
        ToxicityScorer::new(Arc::new(LexiconClassifier::new()), ToxicityConfig::stub())
            .map_err(startup_failed)?,
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger =
        Arc::new(InMemoryLedger::open(ledger_path.clone(), clock.clone()).map_err(startup_failed)?);
    let notifications = Arc::new(InMemoryNotificationSink::new());

    let gate = Arc::new(ContentModerationGate::new(
        advisor,
        toxicity,
        ledger,
        notifications.clone(),
        clock,
        config.policy,
    ));

    let app = create_router_with_state(HandlerState::new(gate));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        ledger_path,
        notifications,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
        _temp_dir,
    })
}
