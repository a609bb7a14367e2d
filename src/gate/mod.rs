//! The moderation gate: relevance, then toxicity, then the escalation ladder.
//!
//! Per (user, community) a submitter is clean, warned (some violations) or
//! banned. A banned submitter is turned away before any scorer runs. Off-topic
//! text is rejected without touching the ledger. Toxic on-topic text records a
//! violation, and the violation that exhausts the attempts issues a ban.
//!
//! Scorer failures fail closed: the submission is neither accepted nor counted.

mod error;
mod locks;
mod outcome;
mod policy;


pub use error::ModerationError;
pub use locks::{KeyedGuard, KeyedLocks};
pub use outcome::{ErrorKind, ModerationOutcome, Submission};
pub use policy::{BanDuration, EscalationPolicy};

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::clock::Clock;
use crate::ids::{CommunityId, LedgerKey, QuestionId, UserId};
use crate::ledger::{BanCheck, ModerationEvent, ModerationLedger, ViolationReport};
use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::relevance::CommunityRelevanceAdvisor;
use crate::toxicity::ToxicityScorer;

const OFF_TOPIC_MESSAGE: &str = "Content is not relevant to this community";

pub struct ContentModerationGate {
    advisor: Arc<CommunityRelevanceAdvisor>,
    toxicity: Arc<ToxicityScorer>,
    ledger: Arc<dyn ModerationLedger>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    policy: EscalationPolicy,
    locks: KeyedLocks<LedgerKey>,
}

impl std::fmt::Debug for ContentModerationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentModerationGate")
            .field("advisor", &self.advisor)
            .field("toxicity", &self.toxicity)
            .field("policy", &self.policy)
            .field("locked_keys", &self.locks.len())
            .finish()
    }
}

impl ContentModerationGate {
    pub fn new(
        advisor: Arc<CommunityRelevanceAdvisor>,
        toxicity: Arc<ToxicityScorer>,
        ledger: Arc<dyn ModerationLedger>,
        notifications: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            advisor,
            toxicity,
            ledger,
            notifications,
            clock,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    pub fn advisor(&self) -> &CommunityRelevanceAdvisor {
        &self.advisor
    }

    pub fn toxicity(&self) -> &ToxicityScorer {
        &self.toxicity
    }

    pub fn ledger(&self) -> &Arc<dyn ModerationLedger> {
        &self.ledger
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Moderates a submission, folding failures into [`ModerationOutcome::Error`].
    pub async fn submit_for_moderation(
        &self,
        author_id: UserId,
        community_id: CommunityId,
        text: String,
        thread_context_id: Option<QuestionId>,
    ) -> ModerationOutcome {
        let submission = Submission {
            author_id,
            community_id,
            text,
            thread_context_id,
        };
        match self.evaluate(&submission).await {
            Ok(outcome) => outcome,
            Err(err) => {
                match &err {
                    ModerationError::Ledger(_) | ModerationError::Store(_) => {
                        error!(error = %err, key = %submission.ledger_key(), "Moderation failed");
                    }
                    _ => warn!(error = %err, key = %submission.ledger_key(), "Moderation failed"),
                }
                err.into()
            }
        }
    }

    /// Runs the full moderation pipeline for one submission.
    #[instrument(skip_all, fields(key = %submission.ledger_key()))]
    pub async fn evaluate(
        &self,
        submission: &Submission,
    ) -> Result<ModerationOutcome, ModerationError> {
        submission.validate()?;
        let key = submission.ledger_key();
        let community = self.advisor.community(&submission.community_id).await?;

        let ban = self.ledger.check_ban(&key).await?;
        if let Some(outcome) = banned_outcome(ban) {
            info!("Rejected: submitter is banned");
            return Ok(outcome);
        }

        let relevance = self
            .advisor
            .evaluate_for(&submission.text, &community)
            .await?;
        if !relevance.is_relevant {
            info!(
                similarity_score = relevance.similarity_score,
                suggested = ?relevance.suggested_community.as_ref().map(|c| c.id.as_str()),
                "Rejected: off topic"
            );
            return Ok(ModerationOutcome::RejectedOffTopic {
                suggested_community: relevance.suggested_community,
                similarity_score: relevance.similarity_score,
                message: OFF_TOPIC_MESSAGE.to_string(),
            });
        }

        let verdict = self.toxicity.score(&submission.text).await?;
        if !self.toxicity.is_toxic(&verdict) {
            debug!(toxicity = verdict.toxicity(), "Accepted");
            return Ok(ModerationOutcome::Accepted {
                text: submission.text.clone(),
            });
        }
        let categories = self.toxicity.offending_categories(&verdict);

        let _guard = self.locks.lock(key.clone()).await;

        // A concurrent submission may have crossed the threshold while this one was scored.
        let ban = self.ledger.check_ban(&key).await?;
        if let Some(outcome) = banned_outcome(ban) {
            info!("Rejected: ban issued while scoring");
            return Ok(outcome);
        }

        let report = ViolationReport {
            content: submission.text.clone(),
            categories: categories.clone(),
            thread_context: submission
                .thread_context_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
        };
        let record = self.ledger.record_violation(&key, report).await?;
        let attempts_left = self.policy.attempts_left(record.violation_count);

        if attempts_left > 0 {
            info!(
                violation_count = record.violation_count,
                attempts_left,
                categories = ?categories,
                "Rejected: inappropriate"
            );
            return Ok(self
                .reject_inappropriate(submission, record.violation_count, attempts_left, categories)
                .await);
        }

        let duration_days = self.policy.ban_duration_days(record.ban_count + 1);
        let ban = self.ledger.issue_ban(&key, duration_days).await?;
        info!(
            duration_days,
            ban_count = ban.ban_count,
            expires_at = %ban.expires_at,
            "Rejected: ban issued"
        );

        let message = format!(
            "You have been banned from this community for {} day(s). Ban expires on {}.",
            duration_days,
            iso(ban.expires_at)
        );
        self.notify(
            submission,
            NotificationKind::Ban,
            format!(
                "You have been banned from community {} for {} day(s) due to inappropriate content. Ban expires on {}.",
                submission.community_id,
                duration_days,
                iso(ban.expires_at)
            ),
        )
        .await;

        Ok(ModerationOutcome::RejectedBanned {
            expires_at: ban.expires_at,
            message,
        })
    }

    async fn reject_inappropriate(
        &self,
        submission: &Submission,
        violation_count: u32,
        attempts_left: u32,
        categories: Vec<String>,
    ) -> ModerationOutcome {
        let warning = self.policy.is_warning(attempts_left);

        // The first warning of a cycle goes to the moderation log too.
        if self.policy.opens_warning(violation_count) {
            let event = ModerationEvent::Warning {
                violation_count,
                attempts_left,
            };
            if let Err(e) = self.ledger.log_event(&submission.ledger_key(), event).await {
                warn!(error = %e, "Failed to log moderation warning");
            }
        }

        let (kind, message) = if warning {
            (
                NotificationKind::Warning,
                format!(
                    "Warning: You will be banned from this community if you reach {} inappropriate attempts ({} attempts left).",
                    self.policy.max_attempts, attempts_left
                ),
            )
        } else {
            (
                NotificationKind::Violation,
                format!(
                    "You have {} attempts left before a ban in community {}.",
                    attempts_left, submission.community_id
                ),
            )
        };

        let notice = match kind {
            NotificationKind::Warning => message.clone(),
            _ => format!("Your content was flagged as inappropriate. {message}"),
        };
        self.notify(submission, kind, notice).await;

        ModerationOutcome::RejectedInappropriate {
            attempts_left,
            categories,
            message,
        }
    }

    /// Enqueues a notice. Failures are logged; the decision already stands.
    async fn notify(&self, submission: &Submission, kind: NotificationKind, message: String) {
        let notification = Notification::new(
            submission.author_id.clone(),
            kind,
            message,
            submission
                .thread_context_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
            submission.community_id.clone(),
            self.clock.now(),
        );
        if let Err(e) = self.notifications.enqueue(notification).await {
            warn!(error = %e, kind = kind.as_str(), "Failed to enqueue notification");
        }
    }
}

fn banned_outcome(ban: BanCheck) -> Option<ModerationOutcome> {
    match (ban.active, ban.expires_at) {
        (true, Some(expires_at)) => Some(ModerationOutcome::RejectedBanned {
            expires_at,
            message: format!(
                "User is banned from this community until {}",
                iso(expires_at)
            ),
        }),
        _ => None,
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
