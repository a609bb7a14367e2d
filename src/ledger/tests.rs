use super::*;
use crate::clock::ManualClock;
use chrono::{Duration, TimeZone};
use std::sync::Arc;

fn key() -> LedgerKey {
    LedgerKey::new(UserId::new("alice"), CommunityId::new("dev"))
}

fn report(content: &str) -> ViolationReport {
    ViolationReport {
        content: content.to_string(),
        categories: vec!["toxicity".to_string(), "insult".to_string()],
        thread_context: None,
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn ledger() -> (InMemoryLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    (InMemoryLedger::new(clock.clone()), clock)
}

#[tokio::test]
async fn test_get_or_create_is_lazy() {
    let (ledger, _) = ledger();
    assert!(ledger.get(&key()).await.unwrap().is_none());

    let record = ledger.get_or_create(&key()).await.unwrap();
    assert_eq!(record.violation_count, 0);
    assert_eq!(record.ban, BanStatus::None);
    assert_eq!(record.key(), key());
    assert!(ledger.get(&key()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_record_violation_increments_and_audits() {
    let (ledger, _) = ledger();
    ledger.record_violation(&key(), report("one")).await.unwrap();
    let record = ledger.record_violation(&key(), report("two")).await.unwrap();

    assert_eq!(record.violation_count, 2);
    assert_eq!(record.restriction_level, 2);

    let trail = ledger.violations(&key()).await.unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].content, "one");
    assert_eq!(trail[1].categories, vec!["toxicity", "insult"]);
    assert_eq!(trail[0].recorded_at, start());
}

#[tokio::test]
async fn test_keys_are_independent() {
    let (ledger, _) = ledger();
    let other = LedgerKey::new(UserId::new("alice"), CommunityId::new("games"));
    ledger.record_violation(&key(), report("x")).await.unwrap();

    assert!(ledger.get(&other).await.unwrap().is_none());
    assert_eq!(ledger.len().await, 1);
}

#[tokio::test]
async fn test_issue_ban_resets_and_logs() {
    let (ledger, _) = ledger();
    for i in 0..5 {
        ledger
            .record_violation(&key(), report(&format!("v{i}")))
            .await
            .unwrap();
    }

    let info = ledger.issue_ban(&key(), 1).await.unwrap();
    assert_eq!(info.expires_at, start() + Duration::days(1));
    assert_eq!(info.ban_count, 1);

    let record = ledger.get(&key()).await.unwrap().unwrap();
    assert_eq!(record.violation_count, 0);
    assert_eq!(record.restriction_level, 0);
    assert_eq!(record.ban_count, 1);
    assert_eq!(record.ban_expires_at(), Some(info.expires_at));
    assert!(ledger.violations(&key()).await.unwrap().is_empty());

    let log = ledger.moderation_log(&key()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert!(matches!(
        log[0].event,
        ModerationEvent::Ban {
            duration_days: 1,
            violations_cleared: 5,
            ..
        }
    ));
}

#[tokio::test]
async fn test_zero_day_ban_rejected() {
    let (ledger, _) = ledger();
    assert!(matches!(
        ledger.issue_ban(&key(), 0).await,
        Err(LedgerError::InvalidBanDuration { days: 0 })
    ));
    assert!(ledger.get(&key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_check_ban_expires_lazily() {
    let (ledger, clock) = ledger();
    assert_eq!(ledger.check_ban(&key()).await.unwrap(), BanCheck::NOT_BANNED);

    let info = ledger.issue_ban(&key(), 2).await.unwrap();
    clock.advance(Duration::hours(47));
    let check = ledger.check_ban(&key()).await.unwrap();
    assert!(check.active);
    assert_eq!(check.expires_at, Some(info.expires_at));

    clock.advance(Duration::hours(1));
    let check = ledger.check_ban(&key()).await.unwrap();
    assert!(!check.active);

    let record = ledger.get(&key()).await.unwrap().unwrap();
    assert!(!record.is_banned());
    assert_eq!(record.ban_expires_at(), None);
    assert_eq!(record.ban_count, 1);

    let log = ledger.moderation_log(&key()).await.unwrap();
    assert!(matches!(
        log.last().unwrap().event,
        ModerationEvent::BanExpired { .. }
    ));
}

#[tokio::test]
async fn test_ban_count_accumulates() {
    let (ledger, clock) = ledger();
    ledger.issue_ban(&key(), 1).await.unwrap();
    clock.advance(Duration::days(2));
    assert!(!ledger.check_ban(&key()).await.unwrap().active);

    let second = ledger.issue_ban(&key(), 2).await.unwrap();
    assert_eq!(second.ban_count, 2);
    assert_eq!(second.duration_days, 2);
}

#[tokio::test]
async fn test_active_bans_for_community() {
    let (ledger, clock) = ledger();
    let bob = LedgerKey::new(UserId::new("bob"), CommunityId::new("dev"));
    let carol = LedgerKey::new(UserId::new("carol"), CommunityId::new("games"));

    ledger.issue_ban(&key(), 3).await.unwrap();
    ledger.issue_ban(&bob, 1).await.unwrap();
    ledger.issue_ban(&carol, 1).await.unwrap();

    let bans = ledger.active_bans(&CommunityId::new("dev")).await.unwrap();
    let users: Vec<&str> = bans.iter().map(|b| b.user_id.as_str()).collect();
    assert_eq!(users, vec!["bob", "alice"]);

    clock.advance(Duration::days(1));
    let bans = ledger.active_bans(&CommunityId::new("dev")).await.unwrap();
    assert_eq!(bans.len(), 1);
}

#[tokio::test]
async fn test_log_event() {
    let (ledger, _) = ledger();
    ledger
        .log_event(
            &key(),
            ModerationEvent::Warning {
                violation_count: 3,
                attempts_left: 2,
            },
        )
        .await
        .unwrap();
    let log = ledger.moderation_log(&key()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].created_at, start());
}

mod snapshot_tests {
    use super::*;
    use crate::clock::SystemClock;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let clock = Arc::new(ManualClock::new(start()));

        {
            let ledger = InMemoryLedger::open(&path, clock.clone()).unwrap();
            ledger.record_violation(&key(), report("a")).await.unwrap();
            ledger.issue_ban(&key(), 1).await.unwrap();
            ledger
                .record_violation(
                    &LedgerKey::new(UserId::new("bob"), CommunityId::new("dev")),
                    report("b"),
                )
                .await
                .unwrap();
        }
        assert!(path.exists());

        let reopened = InMemoryLedger::open(&path, clock).unwrap();
        assert_eq!(reopened.len().await, 2);
        let record = reopened.get(&key()).await.unwrap().unwrap();
        assert_eq!(record.ban_count, 1);
        assert!(record.is_banned());
        assert_eq!(reopened.moderation_log(&key()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        std::fs::create_dir(&sub).unwrap();
        let ledger =
            InMemoryLedger::open(sub.join("ledger.json"), Arc::new(ManualClock::new(start())))
                .unwrap();

        ledger.record_violation(&key(), report("a")).await.unwrap();
        std::fs::remove_dir_all(&sub).unwrap();

        let err = ledger.record_violation(&key(), report("b")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Io { .. }));

        let record = ledger.get(&key()).await.unwrap().unwrap();
        assert_eq!(record.violation_count, 1);
        assert_eq!(ledger.violations(&key()).await.unwrap().len(), 1);

        let other = LedgerKey::new(UserId::new("bob"), CommunityId::new("dev"));
        assert!(ledger.issue_ban(&other, 1).await.is_err());
        assert!(ledger.get(&other).await.unwrap().is_none());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"version": 99, "entries": []}"#).unwrap();

        let err = InMemoryLedger::open(&path, Arc::new(SystemClock)).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            InMemoryLedger::open(&path, Arc::new(SystemClock)),
            Err(LedgerError::Serialization(_))
        ));
    }
}

#[test]
fn test_ban_status_serialization() {
    let banned = BanStatus::Banned {
        expires_at: start(),
    };
    let json = serde_json::to_value(banned).unwrap();
    assert_eq!(json["status"], "banned");
    assert!(json["expires_at"].is_string());
    assert_eq!(
        serde_json::to_value(BanStatus::None).unwrap()["status"],
        "none"
    );
}
