//! JSON seed for the in-memory stores.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    Community, InMemoryCommunityDirectory, InMemoryQuestionStore, QuestionSummary, StoreError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    pub communities: Vec<Community>,
    #[serde(default)]
    pub questions: Vec<QuestionSummary>,
}

impl SeedData {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let seed: Self = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        seed.validate()?;

        info!(
            path = %path.display(),
            communities = seed.communities.len(),
            questions = seed.questions.len(),
            "Loaded seed data"
        );
        Ok(seed)
    }

    /// Ids must be unique and every question must belong to a known community.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut ids = HashSet::new();
        for community in &self.communities {
            if community.id.is_blank() {
                return Err(StoreError::InvalidSeed {
                    reason: "community with blank id".to_string(),
                });
            }
            if !ids.insert(&community.id) {
                return Err(StoreError::InvalidSeed {
                    reason: format!("duplicate community id {}", community.id),
                });
            }
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !ids.contains(&question.community_id) {
                return Err(StoreError::InvalidSeed {
                    reason: format!(
                        "question {} references unknown community {}",
                        question.id, question.community_id
                    ),
                });
            }
            if !question_ids.insert(&question.id) {
                return Err(StoreError::InvalidSeed {
                    reason: format!("duplicate question id {}", question.id),
                });
            }
        }
        Ok(())
    }

    pub fn into_stores(self) -> (InMemoryCommunityDirectory, InMemoryQuestionStore) {
        (
            InMemoryCommunityDirectory::with_communities(self.communities),
            InMemoryQuestionStore::with_questions(self.questions),
        )
    }
}
