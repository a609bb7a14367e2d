//! Topical relevance: the embedding-backed [`RelevanceScorer`] and the
//! [`CommunityRelevanceAdvisor`] built on it.

pub mod advisor;
pub mod cache;
pub mod config;
pub mod scorer;


pub use advisor::{
    AdvisorError, CommunityRelevanceAdvisor, Recommendation, RelevanceVerdict, SimilarQuestion,
    SuggestedCommunity,
};
pub use cache::ReferenceEmbeddingCache;
pub use config::RelevanceConfig;
pub use scorer::RelevanceScorer;
