//! Cosine-similarity scoring over sentence embeddings.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cache::ReferenceEmbeddingCache;
use crate::embedding::{Embedder, cosine_similarity};
use crate::ids::CommunityId;
use crate::scoring::{ScoringError, run_blocking};
use crate::store::Community;

/// Embeds texts off the async executor and compares them.
///
/// Community descriptions go through [`ReferenceEmbeddingCache`]; every other
/// text is embedded per call.
pub struct RelevanceScorer {
    embedder: Arc<dyn Embedder>,
    references: ReferenceEmbeddingCache,
    timeout: Duration,
}

impl std::fmt::Debug for RelevanceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceScorer")
            .field("stub", &self.embedder.is_stub())
            .field("references", &self.references)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RelevanceScorer {
    pub fn new(embedder: Arc<dyn Embedder>, cache_capacity: u64, timeout: Duration) -> Self {
        Self {
            embedder,
            references: ReferenceEmbeddingCache::with_capacity(cache_capacity),
            timeout,
        }
    }

    pub fn is_stub(&self) -> bool {
        self.embedder.is_stub()
    }

    pub fn references(&self) -> &ReferenceEmbeddingCache {
        &self.references
    }

    /// Forgets the cached embedding of a community (e.g. after a description edit).
    pub fn invalidate_community(&self, id: &CommunityId) {
        self.references.invalidate(id);
    }

    async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ScoringError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embedder = Arc::clone(&self.embedder);
        let expected = texts.len();
        let embeddings = run_blocking(self.timeout, move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            embedder
                .embed_batch(&refs)
                .map_err(|e| ScoringError::unavailable(e.to_string()))
        })
        .await?;

        if embeddings.len() != expected {
            return Err(ScoringError::unavailable(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                expected
            )));
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        if text.trim().is_empty() {
            return Err(ScoringError::InvalidInput {
                reason: "text is empty".to_string(),
            });
        }
        self.embed_all(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| ScoringError::unavailable("embedder returned no vector"))
    }

    /// Cosine similarity of `text` and `reference_text`, both embedded fresh.
    pub async fn similarity(&self, text: &str, reference_text: &str) -> Result<f32, ScoringError> {
        let query = self.embed_query(text).await?;
        let mut reference = self.embed_all(vec![reference_text.to_string()]).await?;
        let reference = reference
            .pop()
            .ok_or_else(|| ScoringError::unavailable("embedder returned no vector"))?;
        compare(&query, &reference)
    }

    /// Similarity of `text` to one community's description (reference cached).
    pub async fn community_similarity(
        &self,
        text: &str,
        community: &Community,
    ) -> Result<f32, ScoringError> {
        let scores = self
            .score_communities(text, std::slice::from_ref(community))
            .await?;
        scores
            .first()
            .map(|(_, score)| *score)
            .ok_or_else(|| ScoringError::unavailable("no score for community"))
    }

    /// Similarity of `text` to each community, in the order given.
    pub async fn score_communities(
        &self,
        text: &str,
        communities: &[Community],
    ) -> Result<Vec<(CommunityId, f32)>, ScoringError> {
        let query = self.embed_query(text).await?;
        let references = self.reference_embeddings(communities).await?;

        communities
            .iter()
            .zip(references)
            .map(|(community, reference)| {
                compare(&query, &reference).map(|score| (community.id.clone(), score))
            })
            .collect()
    }

    /// Ranks `candidates` against `text`, best first. Equal scores keep their
    /// input order.
    pub async fn rank_against<K: Clone>(
        &self,
        text: &str,
        candidates: &[(K, String)],
    ) -> Result<Vec<(K, f32)>, ScoringError> {
        let query = self.embed_query(text).await?;
        let embeddings = self
            .embed_all(candidates.iter().map(|(_, t)| t.clone()).collect())
            .await?;

        let mut ranked = candidates
            .iter()
            .zip(embeddings)
            .map(|((id, _), embedding)| compare(&query, &embedding).map(|s| (id.clone(), s)))
            .collect::<Result<Vec<_>, _>>()?;
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }

    /// Reference embeddings for `communities`; misses are embedded in one batch.
    async fn reference_embeddings(
        &self,
        communities: &[Community],
    ) -> Result<Vec<Arc<[f32]>>, ScoringError> {
        let mut found: Vec<Option<Arc<[f32]>>> = communities
            .iter()
            .map(|c| self.references.get(&c.id, &c.description))
            .collect();

        let missing: Vec<usize> = found
            .iter()
            .enumerate()
            .filter(|(_, hit)| hit.is_none())
            .map(|(idx, _)| idx)
            .collect();

        if !missing.is_empty() {
            debug!(
                misses = missing.len(),
                total = communities.len(),
                "Embedding community descriptions"
            );
            let texts = missing
                .iter()
                .map(|&idx| communities[idx].description.clone())
                .collect();
            let embeddings = self.embed_all(texts).await?;
            for (idx, embedding) in missing.into_iter().zip(embeddings) {
                let community = &communities[idx];
                found[idx] = Some(self.references.insert(
                    community.id.clone(),
                    &community.description,
                    embedding,
                ));
            }
        }

        found
            .into_iter()
            .map(|e| e.ok_or_else(|| ScoringError::unavailable("missing reference embedding")))
            .collect()
    }
}

fn compare(a: &[f32], b: &[f32]) -> Result<f32, ScoringError> {
    cosine_similarity(a, b).map_err(|e| ScoringError::unavailable(e.to_string()))
}
