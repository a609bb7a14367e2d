//! Bundled seed data scored with the hashing embedder.

mod common;

use std::sync::Arc;

use asksphere::embedding::{DEFAULT_STUB_DIM, HashingEmbedder};
use asksphere::ids::CommunityId;
use asksphere::relevance::{
    CommunityRelevanceAdvisor, Recommendation, RelevanceConfig, RelevanceScorer,
};
use asksphere::store::SeedData;

use common::fixtures::seed_path;

fn seed_advisor() -> CommunityRelevanceAdvisor {
    let seed = SeedData::load(&seed_path()).unwrap();
    let (directory, questions) = seed.into_stores();
    let config = RelevanceConfig::default();
    let scorer = Arc::new(RelevanceScorer::new(
        Arc::new(HashingEmbedder::new(DEFAULT_STUB_DIM)),
        config.reference_cache_capacity,
        config.timeout,
    ));
    CommunityRelevanceAdvisor::new(scorer, Arc::new(directory), Arc::new(questions), config)
}

#[test]
fn test_seed_is_valid() {
    let seed = SeedData::load(&seed_path()).unwrap();
    seed.validate().unwrap();
    assert_eq!(seed.communities.len(), 6);
    assert_eq!(seed.questions.len(), 10);
}

#[tokio::test]
async fn test_git_question_fits_development() {
    let advisor = seed_advisor();
    let verdict = advisor
        .evaluate(
            "How do I use Git for version control?",
            &CommunityId::from("development"),
        )
        .await
        .unwrap();

    assert!(verdict.is_relevant);
    assert!(verdict.similarity_score >= advisor.config().relevance_threshold);
    assert!(verdict.suggested_community.is_none());
}

#[tokio::test]
async fn test_unrelated_text_is_not_relevant_anywhere_in_particular() {
    let advisor = seed_advisor();
    let verdict = advisor
        .evaluate(
            "My sourdough starter keeps dying",
            &CommunityId::from("development"),
        )
        .await
        .unwrap();

    assert!(!verdict.is_relevant);
    assert!(verdict.similar_questions.is_empty());
}

#[tokio::test]
async fn test_recommend_finds_matching_seed_question() {
    let advisor = seed_advisor();
    let recommendations = advisor
        .recommend(
            "How do I undo the last Git commit?",
            Some(&CommunityId::from("development")),
            3,
            0.30,
        )
        .await
        .unwrap();

    match recommendations.first() {
        Some(Recommendation::Question { id, .. }) => assert_eq!(id.as_str(), "q-dev-1"),
        other => panic!("expected q-dev-1 first, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recommend_unknown_community_fails() {
    let advisor = seed_advisor();
    let result = advisor
        .recommend("git", Some(&CommunityId::from("cooking")), 3, 0.30)
        .await;

    assert!(result.is_err());
}
