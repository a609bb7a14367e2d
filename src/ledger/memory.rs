//! In-memory ledger with an optional JSON snapshot on disk.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{
    ActiveBan, BanCheck, BanInfo, BanStatus, LedgerError, ModerationEvent, ModerationLedger,
    ModerationLogEntry, ModerationRecord, ViolationEntry, ViolationReport,
};
use crate::clock::{Clock, SystemClock};
use crate::ids::{CommunityId, LedgerKey};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyState {
    record: ModerationRecord,
    violations: Vec<ViolationEntry>,
    log: Vec<ModerationLogEntry>,
}

impl KeyState {
    fn new(key: &LedgerKey, now: DateTime<Utc>) -> Self {
        Self {
            record: ModerationRecord::new(key, now),
            violations: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Clears a ban whose expiry is at or before `now`. Returns `true` if it did.
    fn expire_ban(&mut self, now: DateTime<Utc>) -> bool {
        match self.record.ban {
            BanStatus::Banned { expires_at } if expires_at <= now => {
                self.record.ban = BanStatus::None;
                self.record.updated_at = now;
                self.log.push(ModerationLogEntry {
                    event: ModerationEvent::BanExpired {
                        expired_at: expires_at,
                    },
                    created_at: now,
                });
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<KeyState>,
}

type State = HashMap<LedgerKey, KeyState>;

/// Ledger held in one async mutex; every call is atomic.
///
/// With a snapshot path, each mutation is written out (tempfile + rename)
/// before the call returns. If the write fails the change is rolled back and
/// the call fails, so callers never act on state that isn't durable.
pub struct InMemoryLedger {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    snapshot_path: Option<PathBuf>,
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("snapshot_path", &self.snapshot_path)
            .finish()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryLedger {
    /// Volatile ledger.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            clock,
            snapshot_path: None,
        }
    }

    /// Ledger persisted at `path`, loading the existing snapshot if there is one.
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        let path = path.into();
        let state = if path.exists() {
            load_snapshot(&path)?
        } else {
            info!(path = %path.display(), "No ledger snapshot yet, starting empty");
            HashMap::new()
        };

        Ok(Self {
            state: Mutex::new(state),
            clock,
            snapshot_path: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }

    /// Applies `f` to the key's state and persists. On a failed write the key
    /// is restored to what it was before.
    async fn mutate<T, F>(&self, key: &LedgerKey, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut KeyState, DateTime<Utc>) -> Result<T, LedgerError>,
    {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        let previous = state.get(key).cloned();

        let entry = state
            .entry(key.clone())
            .or_insert_with(|| KeyState::new(key, now));
        let result = f(entry, now);

        let outcome = match result {
            Ok(value) => self.persist(&state).await.map(|_| value),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            match previous {
                Some(prev) => {
                    state.insert(key.clone(), prev);
                }
                None => {
                    state.remove(key);
                }
            }
        }
        outcome
    }

    async fn persist(&self, state: &State) -> Result<(), LedgerError> {
        let Some(path) = self.snapshot_path.clone() else {
            return Ok(());
        };

        let mut entries: Vec<KeyState> = state.values().cloned().collect();
        entries.sort_by(|a, b| a.record.key().cmp(&b.record.key()));
        let bytes = serde_json::to_vec_pretty(&Snapshot {
            version: SNAPSHOT_VERSION,
            entries,
        })?;

        let written = tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| LedgerError::Task {
                reason: e.to_string(),
            })?;
        if let Err(ref e) = written {
            error!(error = %e, "Failed to persist ledger snapshot");
        }
        written
    }
}

fn load_snapshot(path: &Path) -> Result<State, LedgerError> {
    let raw = std::fs::read(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: Snapshot = serde_json::from_slice(&raw)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(LedgerError::Corrupt {
            reason: format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            ),
        });
    }

    let mut state = HashMap::with_capacity(snapshot.entries.len());
    for entry in snapshot.entries {
        let key = entry.record.key();
        if state.insert(key.clone(), entry).is_some() {
            return Err(LedgerError::Corrupt {
                reason: format!("duplicate record for {}", key),
            });
        }
    }

    info!(path = %path.display(), records = state.len(), "Loaded ledger snapshot");
    Ok(state)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let io_err = |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[async_trait]
impl ModerationLedger for InMemoryLedger {
    async fn get(&self, key: &LedgerKey) -> Result<Option<ModerationRecord>, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .get(key)
            .map(|entry| entry.record.clone()))
    }

    async fn get_or_create(&self, key: &LedgerKey) -> Result<ModerationRecord, LedgerError> {
        if let Some(record) = self.get(key).await? {
            return Ok(record);
        }
        self.mutate(key, |entry, _| Ok(entry.record.clone())).await
    }

    async fn record_violation(
        &self,
        key: &LedgerKey,
        report: ViolationReport,
    ) -> Result<ModerationRecord, LedgerError> {
        let record = self
            .mutate(key, |entry, now| {
                entry.violations.push(ViolationEntry {
                    content: report.content,
                    categories: report.categories,
                    thread_context: report.thread_context,
                    recorded_at: now,
                });
                entry.record.violation_count += 1;
                entry.record.restriction_level += 1;
                entry.record.updated_at = now;
                Ok(entry.record.clone())
            })
            .await?;

        debug!(
            key = %key,
            violation_count = record.violation_count,
            restriction_level = record.restriction_level,
            "Violation recorded"
        );
        Ok(record)
    }

    async fn issue_ban(
        &self,
        key: &LedgerKey,
        duration_days: u32,
    ) -> Result<BanInfo, LedgerError> {
        if duration_days == 0 {
            return Err(LedgerError::InvalidBanDuration {
                days: duration_days,
            });
        }

        let info = self
            .mutate(key, |entry, now| {
                let expires_at = now + Duration::days(i64::from(duration_days));
                let violations_cleared = entry.violations.len();

                entry.record.ban = BanStatus::Banned { expires_at };
                entry.record.ban_count += 1;
                entry.record.violation_count = 0;
                entry.record.restriction_level = 0;
                entry.record.updated_at = now;
                entry.violations.clear();
                entry.log.push(ModerationLogEntry {
                    event: ModerationEvent::Ban {
                        duration_days,
                        expires_at,
                        ban_count: entry.record.ban_count,
                        violations_cleared,
                    },
                    created_at: now,
                });

                Ok(BanInfo {
                    expires_at,
                    duration_days,
                    ban_count: entry.record.ban_count,
                })
            })
            .await?;

        info!(
            key = %key,
            duration_days,
            ban_count = info.ban_count,
            expires_at = %info.expires_at,
            "Ban issued"
        );
        Ok(info)
    }

    async fn check_ban(&self, key: &LedgerKey) -> Result<BanCheck, LedgerError> {
        let now = self.clock.now();
        let expires_at = {
            let state = self.state.lock().await;
            match state.get(key).map(|entry| entry.record.ban) {
                None | Some(BanStatus::None) => return Ok(BanCheck::NOT_BANNED),
                Some(BanStatus::Banned { expires_at }) => expires_at,
            }
        };

        if expires_at > now {
            return Ok(BanCheck {
                active: true,
                expires_at: Some(expires_at),
            });
        }

        let expired = self.mutate(key, |entry, now| Ok(entry.expire_ban(now))).await?;
        if expired {
            info!(key = %key, expired_at = %expires_at, "Ban expired");
        }
        Ok(BanCheck::NOT_BANNED)
    }

    async fn violations(&self, key: &LedgerKey) -> Result<Vec<ViolationEntry>, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .get(key)
            .map(|entry| entry.violations.clone())
            .unwrap_or_default())
    }

    async fn moderation_log(
        &self,
        key: &LedgerKey,
    ) -> Result<Vec<ModerationLogEntry>, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .get(key)
            .map(|entry| entry.log.clone())
            .unwrap_or_default())
    }

    async fn log_event(&self, key: &LedgerKey, event: ModerationEvent) -> Result<(), LedgerError> {
        self.mutate(key, |entry, now| {
            entry.log.push(ModerationLogEntry {
                event,
                created_at: now,
            });
            Ok(())
        })
        .await
    }

    async fn active_bans(
        &self,
        community_id: &CommunityId,
    ) -> Result<Vec<ActiveBan>, LedgerError> {
        let now = self.clock.now();
        let mut bans: Vec<ActiveBan> = self
            .state
            .lock()
            .await
            .values()
            .filter(|entry| &entry.record.community_id == community_id)
            .filter_map(|entry| match entry.record.ban {
                BanStatus::Banned { expires_at } if expires_at > now => Some(ActiveBan {
                    user_id: entry.record.user_id.clone(),
                    expires_at,
                    ban_count: entry.record.ban_count,
                }),
                _ => None,
            })
            .collect();
        bans.sort_by(|a, b| {
            a.expires_at
                .cmp(&b.expires_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(bans)
    }

    async fn flush(&self) -> Result<(), LedgerError> {
        let state = self.state.lock().await;
        self.persist(&state).await
    }
}
