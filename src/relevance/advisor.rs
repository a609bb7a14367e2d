//! Topical-fit advice: is this text on topic, where else would it fit, and
//! has something like it been asked before.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::config::RelevanceConfig;
use super::scorer::RelevanceScorer;
use crate::ids::{CommunityId, QuestionId};
use crate::scoring::ScoringError;
use crate::store::{Community, CommunityDirectory, QuestionStore, QuestionSummary, StoreError};
use crate::text::truncate_chars;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("community not found: {0}")]
    CommunityNotFound(CommunityId),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedCommunity {
    pub id: CommunityId,
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarQuestion {
    pub id: QuestionId,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceVerdict {
    pub similarity_score: f32,
    pub is_relevant: bool,
    /// Only set when the text is off topic and another community fits better.
    pub suggested_community: Option<SuggestedCommunity>,
    /// Only filled when the text is on topic. Best match first.
    pub similar_questions: Vec<SimilarQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recommendation {
    Question {
        id: QuestionId,
        community_id: CommunityId,
        title: String,
        snippet: String,
        score: f32,
    },
    Community {
        id: CommunityId,
        name: String,
        score: f32,
    },
}

impl Recommendation {
    pub fn score(&self) -> f32 {
        match self {
            Recommendation::Question { score, .. } | Recommendation::Community { score, .. } => {
                *score
            }
        }
    }
}

/// Read-only relevance advice over the community directory and question store.
pub struct CommunityRelevanceAdvisor {
    scorer: Arc<RelevanceScorer>,
    directory: Arc<dyn CommunityDirectory>,
    questions: Arc<dyn QuestionStore>,
    config: RelevanceConfig,
}

impl std::fmt::Debug for CommunityRelevanceAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommunityRelevanceAdvisor")
            .field("scorer", &self.scorer)
            .field("config", &self.config)
            .finish()
    }
}

impl CommunityRelevanceAdvisor {
    pub fn new(
        scorer: Arc<RelevanceScorer>,
        directory: Arc<dyn CommunityDirectory>,
        questions: Arc<dyn QuestionStore>,
        config: RelevanceConfig,
    ) -> Self {
        Self {
            scorer,
            directory,
            questions,
            config,
        }
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    pub async fn community(&self, id: &CommunityId) -> Result<Community, AdvisorError> {
        self.directory
            .get(id)
            .await?
            .ok_or_else(|| AdvisorError::CommunityNotFound(id.clone()))
    }

    /// Judges `text` against `community_id`'s description.
    pub async fn evaluate(
        &self,
        text: &str,
        community_id: &CommunityId,
    ) -> Result<RelevanceVerdict, AdvisorError> {
        let community = self.community(community_id).await?;
        self.evaluate_for(text, &community).await
    }

    /// Same as [`evaluate`](Self::evaluate) for an already resolved community.
    pub async fn evaluate_for(
        &self,
        text: &str,
        community: &Community,
    ) -> Result<RelevanceVerdict, AdvisorError> {
        let community_id = &community.id;
        let similarity_score = self.scorer.community_similarity(text, community).await?;
        let is_relevant = similarity_score >= self.config.relevance_threshold;

        debug!(
            community = %community_id,
            similarity_score,
            threshold = self.config.relevance_threshold,
            is_relevant,
            "Relevance scored"
        );

        let (suggested_community, similar_questions) = if is_relevant {
            (None, self.similar_questions(text, community_id).await?)
        } else {
            (
                self.better_community(text, community, similarity_score).await?,
                Vec::new(),
            )
        };

        Ok(RelevanceVerdict {
            similarity_score,
            is_relevant,
            suggested_community,
            similar_questions,
        })
    }

    /// Best-scoring other community, if it strictly beats the target's score.
    async fn better_community(
        &self,
        text: &str,
        target: &Community,
        target_score: f32,
    ) -> Result<Option<SuggestedCommunity>, AdvisorError> {
        let others: Vec<Community> = self
            .directory
            .list()
            .await?
            .into_iter()
            .filter(|c| c.id != target.id)
            .collect();
        if others.is_empty() {
            return Ok(None);
        }

        let scores = self.scorer.score_communities(text, &others).await?;
        // First community wins ties.
        let best = others
            .iter()
            .zip(scores)
            .fold(None::<(&Community, f32)>, |best, (c, (_, score))| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((c, score)),
            });

        Ok(best
            .filter(|(_, score)| *score > target_score)
            .map(|(community, score)| SuggestedCommunity {
                id: community.id.clone(),
                name: community.name.clone(),
                score,
            }))
    }

    async fn similar_questions(
        &self,
        text: &str,
        community_id: &CommunityId,
    ) -> Result<Vec<SimilarQuestion>, AdvisorError> {
        let questions = self.questions.find_by_community(community_id).await?;
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = self.rank_questions(text, &questions).await?;
        Ok(ranked
            .into_iter()
            .filter(|(_, score)| *score >= self.config.similar_question_threshold)
            .take(self.config.max_similar_questions)
            .map(|(question, score)| SimilarQuestion {
                id: question.id.clone(),
                title: question.title.clone(),
                snippet: truncate_chars(&question.body, self.config.snippet_chars).to_string(),
                score,
            })
            .collect())
    }

    async fn rank_questions<'q>(
        &self,
        text: &str,
        questions: &'q [QuestionSummary],
    ) -> Result<Vec<(&'q QuestionSummary, f32)>, AdvisorError> {
        let candidates: Vec<(usize, String)> = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (idx, q.search_text()))
            .collect();
        let ranked = self.scorer.rank_against(text, &candidates).await?;
        Ok(ranked
            .into_iter()
            .map(|(idx, score)| (&questions[idx], score))
            .collect())
    }

    /// Questions similar to `query`, optionally within one community.
    ///
    /// Without a community filter, communities top up the list when fewer
    /// than `top_k` questions reach `min_score`.
    pub async fn recommend(
        &self,
        query: &str,
        community_id: Option<&CommunityId>,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<Recommendation>, AdvisorError> {
        let questions = match community_id {
            Some(id) => {
                self.community(id).await?;
                self.questions.find_by_community(id).await?
            }
            None => self.questions.list_all().await?,
        };

        let mut recommendations: Vec<Recommendation> = if questions.is_empty() {
            Vec::new()
        } else {
            self.rank_questions(query, &questions)
                .await?
                .into_iter()
                .filter(|(_, score)| *score >= min_score)
                .take(top_k)
                .map(|(q, score)| Recommendation::Question {
                    id: q.id.clone(),
                    community_id: q.community_id.clone(),
                    title: q.title.clone(),
                    snippet: truncate_chars(&q.body, self.config.snippet_chars).to_string(),
                    score,
                })
                .collect()
        };

        if community_id.is_none() && recommendations.len() < top_k {
            let communities = self.directory.list().await?;
            if !communities.is_empty() {
                let scores = self.scorer.score_communities(query, &communities).await?;
                let mut ranked: Vec<(&Community, f32)> = communities
                    .iter()
                    .zip(scores)
                    .map(|(c, (_, score))| (c, score))
                    .collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

                let room = top_k - recommendations.len();
                recommendations.extend(
                    ranked
                        .into_iter()
                        .filter(|(_, score)| *score >= min_score)
                        .take(room)
                        .map(|(c, score)| Recommendation::Community {
                            id: c.id.clone(),
                            name: c.name.clone(),
                            score,
                        }),
                );
            }
        }

        info!(
            community = ?community_id.map(CommunityId::as_str),
            top_k,
            found = recommendations.len(),
            "Recommendations computed"
        );
        Ok(recommendations)
    }
}
