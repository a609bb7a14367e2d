//! Read-only collaborator interfaces the moderation core consumes.
//!
//! The forum's own persistence owns communities and questions; moderation
//! only ever looks them up. The in-memory implementations back the server
//! binary (seeded from JSON) and the tests.

mod error;
pub mod memory;
pub mod seed;


pub use error::StoreError;
pub use memory::{InMemoryCommunityDirectory, InMemoryQuestionStore};
pub use seed::SeedData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ids::{CommunityId, QuestionId};

/// A topic community and the description its relevance is judged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub description: String,
}

impl Community {
    pub fn new(id: impl Into<CommunityId>, name: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// The parts of a stored question the similar-question lookup needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: QuestionId,
    pub community_id: CommunityId,
    pub title: String,
    pub body: String,
}

impl QuestionSummary {
    /// Title and body joined by a space; what gets embedded.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

#[async_trait]
/// Community lookup. Listing order is registration order.
pub trait CommunityDirectory: Send + Sync {
    /// `Ok(None)` when no community has this id.
    async fn get(&self, id: &CommunityId) -> Result<Option<Community>, StoreError>;

    async fn list(&self) -> Result<Vec<Community>, StoreError>;
}

#[async_trait]
/// Question lookup. Listing order is insertion order.
pub trait QuestionStore: Send + Sync {
    async fn find_by_community(
        &self,
        community_id: &CommunityId,
    ) -> Result<Vec<QuestionSummary>, StoreError>;

    async fn list_all(&self) -> Result<Vec<QuestionSummary>, StoreError>;
}
