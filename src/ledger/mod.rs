//! Per-(user, community) moderation state.
//!
//! Every operation is atomic for its key. The gate adds its own per-key lock
//! around the check-ban / record / issue-ban sequence, so the ledger only has
//! to make each single call linearizable.

mod error;
pub mod memory;

#[cfg(test)]
mod tests;

pub use error::LedgerError;
pub use memory::InMemoryLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommunityId, LedgerKey, UserId};

/// Ban state. The expiry exists exactly when the user is banned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BanStatus {
    #[default]
    None,
    Banned { expires_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRecord {
    pub user_id: UserId,
    pub community_id: CommunityId,
    /// Violations since the last ban.
    pub violation_count: u32,
    /// Escalation level; moves with `violation_count`, reset by a ban.
    pub restriction_level: u32,
    pub ban: BanStatus,
    /// Bans ever issued for this pair. Never decreases.
    pub ban_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl ModerationRecord {
    pub fn new(key: &LedgerKey, now: DateTime<Utc>) -> Self {
        Self {
            user_id: key.user_id.clone(),
            community_id: key.community_id.clone(),
            violation_count: 0,
            restriction_level: 0,
            ban: BanStatus::None,
            ban_count: 0,
            updated_at: now,
        }
    }

    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.user_id.clone(), self.community_id.clone())
    }

    pub fn is_banned(&self) -> bool {
        matches!(self.ban, BanStatus::Banned { .. })
    }

    pub fn ban_expires_at(&self) -> Option<DateTime<Utc>> {
        match self.ban {
            BanStatus::Banned { expires_at } => Some(expires_at),
            BanStatus::None => None,
        }
    }
}

/// What gets recorded for one toxic submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub content: String,
    pub categories: Vec<String>,
    /// Question the offending answer belonged to, if any.
    pub thread_context: Option<String>,
}

/// Audit trail entry for one violation. Purged when a ban is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEntry {
    pub content: String,
    pub categories: Vec<String>,
    pub thread_context: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ModerationEvent {
    /// The user was told a ban is close.
    Warning {
        violation_count: u32,
        attempts_left: u32,
    },
    Ban {
        duration_days: u32,
        expires_at: DateTime<Utc>,
        ban_count: u32,
        violations_cleared: usize,
    },
    BanExpired { expired_at: DateTime<Utc> },
}

/// Moderation log entry. Survives bans, unlike the violation trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationLogEntry {
    #[serde(flatten)]
    pub event: ModerationEvent,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BanInfo {
    pub expires_at: DateTime<Utc>,
    pub duration_days: u32,
    pub ban_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BanCheck {
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BanCheck {
    pub const NOT_BANNED: BanCheck = BanCheck {
        active: false,
        expires_at: None,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveBan {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub ban_count: u32,
}

#[async_trait]
/// Storage behind the escalation ladder.
pub trait ModerationLedger: Send + Sync {
    /// Current record without creating one.
    async fn get(&self, key: &LedgerKey) -> Result<Option<ModerationRecord>, LedgerError>;

    async fn get_or_create(&self, key: &LedgerKey) -> Result<ModerationRecord, LedgerError>;

    /// Appends to the violation trail and bumps both counters by one.
    async fn record_violation(
        &self,
        key: &LedgerKey,
        report: ViolationReport,
    ) -> Result<ModerationRecord, LedgerError>;

    /// Bans for `duration_days`, resets the counters and purges the violation trail.
    async fn issue_ban(&self, key: &LedgerKey, duration_days: u32)
    -> Result<BanInfo, LedgerError>;

    /// Reports the ban state, clearing a ban whose expiry has passed.
    async fn check_ban(&self, key: &LedgerKey) -> Result<BanCheck, LedgerError>;

    async fn violations(&self, key: &LedgerKey) -> Result<Vec<ViolationEntry>, LedgerError>;

    async fn moderation_log(&self, key: &LedgerKey)
    -> Result<Vec<ModerationLogEntry>, LedgerError>;

    async fn log_event(&self, key: &LedgerKey, event: ModerationEvent) -> Result<(), LedgerError>;

    /// Unexpired bans in a community, soonest expiry first.
    async fn active_bans(&self, community_id: &CommunityId)
    -> Result<Vec<ActiveBan>, LedgerError>;

    /// Writes any buffered state to durable storage.
    async fn flush(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
