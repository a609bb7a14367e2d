use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ModerationError;
use crate::ids::{CommunityId, LedgerKey, QuestionId, UserId};
use crate::relevance::SuggestedCommunity;

/// A question or answer awaiting moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub author_id: UserId,
    pub community_id: CommunityId,
    pub text: String,
    /// Question an answer belongs to. `None` for new questions.
    #[serde(default)]
    pub thread_context_id: Option<QuestionId>,
}

impl Submission {
    pub fn new(
        author_id: impl Into<UserId>,
        community_id: impl Into<CommunityId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            community_id: community_id.into(),
            text: text.into(),
            thread_context_id: None,
        }
    }

    pub fn in_thread(mut self, question_id: impl Into<QuestionId>) -> Self {
        self.thread_context_id = Some(question_id.into());
        self
    }

    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::new(self.author_id.clone(), self.community_id.clone())
    }

    pub(crate) fn validate(&self) -> Result<(), ModerationError> {
        if self.author_id.is_blank() {
            return Err(ModerationError::invalid("author id is missing"));
        }
        if self.community_id.is_blank() {
            return Err(ModerationError::invalid("community id is missing"));
        }
        if self.text.trim().is_empty() {
            return Err(ModerationError::invalid("text is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CommunityNotFound,
    ScoringUnavailable,
    InvalidSubmission,
    Storage,
}

/// Result of moderating one submission. Rejections are ordinary outcomes;
/// only [`ModerationOutcome::Error`] reports a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModerationOutcome {
    Accepted {
        text: String,
    },
    RejectedOffTopic {
        suggested_community: Option<SuggestedCommunity>,
        similarity_score: f32,
        message: String,
    },
    RejectedInappropriate {
        attempts_left: u32,
        categories: Vec<String>,
        message: String,
    },
    RejectedBanned {
        expires_at: DateTime<Utc>,
        message: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
        retryable: bool,
    },
}

impl ModerationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ModerationOutcome::Accepted { .. })
    }

    /// Short machine-readable label (`accepted`, `rejected_banned`, ...).
    pub fn status(&self) -> &'static str {
        match self {
            ModerationOutcome::Accepted { .. } => "accepted",
            ModerationOutcome::RejectedOffTopic { .. } => "rejected_off_topic",
            ModerationOutcome::RejectedInappropriate { .. } => "rejected_inappropriate",
            ModerationOutcome::RejectedBanned { .. } => "rejected_banned",
            ModerationOutcome::Error { .. } => "error",
        }
    }

    /// User-facing explanation, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            ModerationOutcome::Accepted { .. } => None,
            ModerationOutcome::RejectedOffTopic { message, .. }
            | ModerationOutcome::RejectedInappropriate { message, .. }
            | ModerationOutcome::RejectedBanned { message, .. }
            | ModerationOutcome::Error { message, .. } => Some(message),
        }
    }
}

impl From<ModerationError> for ModerationOutcome {
    fn from(err: ModerationError) -> Self {
        ModerationOutcome::Error {
            kind: err.kind(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}
