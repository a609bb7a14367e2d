//! Gate wiring over deterministic mocks.

use std::path::PathBuf;
use std::sync::Arc;

use asksphere::clock::ManualClock;
use asksphere::embedding::MockEmbedder;
use asksphere::gate::{ContentModerationGate, EscalationPolicy};
use asksphere::ledger::InMemoryLedger;
use asksphere::notify::InMemoryNotificationSink;
use asksphere::relevance::{CommunityRelevanceAdvisor, RelevanceConfig, RelevanceScorer};
use asksphere::store::{Community, InMemoryCommunityDirectory, InMemoryQuestionStore};
use asksphere::toxicity::{MockToxicityClassifier, ToxicityConfig, ToxicityScorer};
use chrono::{DateTime, TimeZone, Utc};

pub const CLEAN: &str = "How do I use Git for version control?";
pub const TOXIC: &str = "git rebase is for idiots";
pub const OFF_TOPIC_TOXIC: &str = "zelda players are idiots";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/seed.json")
}

pub struct GateFixture {
    pub gate: Arc<ContentModerationGate>,
    pub embedder: Arc<MockEmbedder>,
    pub classifier: Arc<MockToxicityClassifier>,
    pub ledger: Arc<InMemoryLedger>,
    pub sink: Arc<InMemoryNotificationSink>,
    pub clock: Arc<ManualClock>,
}

pub fn gate_fixture() -> GateFixture {
    gate_fixture_with(EscalationPolicy::default())
}

pub fn gate_fixture_with(policy: EscalationPolicy) -> GateFixture {
    let embedder = Arc::new(
        MockEmbedder::new()
            .with_topic("development", &["git", "python", "programming", "compiler"])
            .with_topic("gaming", &["game", "zelda", "console"]),
    );
    let directory = Arc::new(InMemoryCommunityDirectory::with_communities([
        Community::new(
            "dev",
            "Development",
            "Software programming, git and compiler questions",
        ),
        Community::new("games", "Gaming", "Video game talk: zelda, console hardware"),
    ]));
    let config = RelevanceConfig::default();
    let scorer = Arc::new(RelevanceScorer::new(
        embedder.clone(),
        config.reference_cache_capacity,
        config.timeout,
    ));
    let advisor = Arc::new(CommunityRelevanceAdvisor::new(
        scorer,
        directory,
        Arc::new(InMemoryQuestionStore::new()),
        config,
    ));

    let classifier = Arc::new(
        MockToxicityClassifier::new().with_rule("idiot", &[("toxicity", 0.95), ("insult", 0.7)]),
    );
    let toxicity =
        Arc::new(ToxicityScorer::new(classifier.clone(), ToxicityConfig::stub()).unwrap());

    let clock = Arc::new(ManualClock::new(start()));
    let ledger = Arc::new(InMemoryLedger::new(clock.clone()));
    let sink = Arc::new(InMemoryNotificationSink::new());

    let gate = Arc::new(ContentModerationGate::new(
        advisor,
        toxicity,
        ledger.clone(),
        sink.clone(),
        clock.clone(),
        policy,
    ));

    GateFixture {
        gate,
        embedder,
        classifier,
        ledger,
        sink,
        clock,
    }
}
