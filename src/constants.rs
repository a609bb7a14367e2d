//! Cross-cutting defaults.
//!
//! Thresholds drifted between revisions of the forum (toxicity 0.9 vs 0.5,
//! relevance 0.12 vs 0.10). They are defaults only; every one of them is
//! overridable through the owning component's config.

/// Toxicity score strictly above which a submission is a violation.
pub const DEFAULT_TOXICITY_THRESHOLD: f32 = 0.5;

/// Score above which a non-"toxicity" category is listed as offending.
pub const DEFAULT_CATEGORY_THRESHOLD: f32 = 0.5;

/// Cosine similarity at or above which a submission fits its community.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.10;

/// Cosine similarity at or above which an existing question counts as similar.
pub const DEFAULT_SIMILAR_QUESTION_THRESHOLD: f32 = 0.30;

/// Max similar questions surfaced per verdict.
pub const DEFAULT_MAX_SIMILAR_QUESTIONS: usize = 3;

/// Characters of question body kept in a similar-question snippet.
pub const DEFAULT_SNIPPET_CHARS: usize = 200;

/// Violations per (user, community) that trigger a ban.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Attempts-left value at or below which the user gets a warning.
pub const DEFAULT_WARNING_WINDOW: u32 = 2;

/// Characters of text handed to the toxicity classifier.
pub const DEFAULT_MAX_SCORED_CHARS: usize = 5000;

/// Per-call deadline for model inference.
pub const DEFAULT_SCORING_TIMEOUT_SECS: u64 = 10;

/// all-MiniLM-L6-v2 output dimension.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// all-MiniLM-L6-v2 max sequence length.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Detoxify / BERT-base max sequence length.
pub const CLASSIFIER_MAX_SEQ_LEN: usize = 512;

/// Community reference embeddings kept in memory.
pub const DEFAULT_REFERENCE_CACHE_CAPACITY: u64 = 1024;
