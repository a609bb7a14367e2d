use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Community, CommunityDirectory, QuestionStore, QuestionSummary, StoreError};
use crate::ids::CommunityId;

#[derive(Debug, Default)]
pub struct InMemoryCommunityDirectory {
    communities: RwLock<Vec<Community>>,
}

impl InMemoryCommunityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_communities(communities: impl IntoIterator<Item = Community>) -> Self {
        let directory = Self::new();
        for community in communities {
            directory.upsert(community);
        }
        directory
    }

    /// Inserts or replaces by id. A replaced community keeps its position.
    pub fn upsert(&self, community: Community) {
        let mut communities = self.communities.write();
        match communities.iter_mut().find(|c| c.id == community.id) {
            Some(existing) => *existing = community,
            None => communities.push(community),
        }
    }

    pub fn remove(&self, id: &CommunityId) -> Option<Community> {
        let mut communities = self.communities.write();
        let idx = communities.iter().position(|c| &c.id == id)?;
        Some(communities.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.communities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.read().is_empty()
    }
}

#[async_trait]
impl CommunityDirectory for InMemoryCommunityDirectory {
    async fn get(&self, id: &CommunityId) -> Result<Option<Community>, StoreError> {
        Ok(self.communities.read().iter().find(|c| &c.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Community>, StoreError> {
        Ok(self.communities.read().clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryQuestionStore {
    questions: RwLock<Vec<QuestionSummary>>,
}

impl InMemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(questions: impl IntoIterator<Item = QuestionSummary>) -> Self {
        Self {
            questions: RwLock::new(questions.into_iter().collect()),
        }
    }

    pub fn insert(&self, question: QuestionSummary) {
        self.questions.write().push(question);
    }

    pub fn len(&self) -> usize {
        self.questions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.read().is_empty()
    }
}

#[async_trait]
impl QuestionStore for InMemoryQuestionStore {
    async fn find_by_community(
        &self,
        community_id: &CommunityId,
    ) -> Result<Vec<QuestionSummary>, StoreError> {
        Ok(self
            .questions
            .read()
            .iter()
            .filter(|q| &q.community_id == community_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<QuestionSummary>, StoreError> {
        Ok(self.questions.read().clone())
    }
}
