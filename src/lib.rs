//! AskSphere moderation library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by module:
//!
//! ## Moderation Core
//! - [`ContentModerationGate`], [`Submission`], [`ModerationOutcome`] - The gate and its outcomes
//! - [`EscalationPolicy`], [`BanDuration`] - Violation/ban ladder settings
//! - [`ModerationLedger`], [`InMemoryLedger`] - Per-(user, community) moderation state
//!
//! ## Scoring
//! - [`ToxicityScorer`], [`ToxicityConfig`] - Toxicity classification
//! - [`RelevanceScorer`], [`CommunityRelevanceAdvisor`] - Embedding-based topical fit
//! - [`Embedder`], [`SentenceEmbedder`], [`HashingEmbedder`] - Embedding backends
//!
//! ## Collaborators
//! - [`CommunityDirectory`], [`QuestionStore`] - Read-only forum data
//! - [`NotificationSink`] - User-visible notices
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod clock;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod gate;
pub mod gateway;
pub mod hashing;
pub mod ids;
pub mod ledger;
pub mod notify;
pub mod relevance;
pub mod scoring;
pub mod store;
pub mod text;
pub mod toxicity;

#[cfg(any(test, feature = "mock"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{
    Embedder, EmbedderConfig, EmbeddingError, HashingEmbedder, SentenceEmbedder, build_embedder,
    cosine_similarity,
};
pub use gate::{
    BanDuration, ContentModerationGate, ErrorKind, EscalationPolicy, ModerationError,
    ModerationOutcome, Submission,
};
pub use ids::{CommunityId, LedgerKey, QuestionId, UserId};
pub use ledger::{
    ActiveBan, BanCheck, BanInfo, BanStatus, InMemoryLedger, LedgerError, ModerationEvent,
    ModerationLedger, ModerationRecord, ViolationReport,
};
pub use notify::{
    InMemoryNotificationSink, Notification, NotificationKind, NotificationSink,
    TracingNotificationSink,
};
pub use relevance::{
    AdvisorError, CommunityRelevanceAdvisor, Recommendation, RelevanceConfig, RelevanceScorer,
    RelevanceVerdict, SimilarQuestion, SuggestedCommunity,
};
pub use scoring::ScoringError;
pub use store::{
    Community, CommunityDirectory, InMemoryCommunityDirectory, InMemoryQuestionStore,
    QuestionStore, QuestionSummary, SeedData, StoreError,
};
#[cfg(any(test, feature = "mock"))]
pub use toxicity::MockToxicityClassifier;
pub use toxicity::{
    ClassifierError, ToxicityClassifier, ToxicityConfig, ToxicityScorer, ToxicityVerdict,
    build_classifier,
};
