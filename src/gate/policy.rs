//! Escalation ladder settings.

use std::str::FromStr;

use serde::Serialize;

use crate::config::{ConfigError, parse_or_default};
use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WARNING_WINDOW};

/// How long a ban lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BanDuration {
    /// The n-th ban lasts n days.
    #[default]
    Escalating,
    /// Every ban lasts the same number of days.
    Flat { days: u32 },
}

impl FromStr for BanDuration {
    type Err = String;

    /// Accepts `escalating`, `flat` (one day) or `flat:<days>`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        match value.split_once(':') {
            None if value == "escalating" => Ok(BanDuration::Escalating),
            None if value == "flat" => Ok(BanDuration::Flat { days: 1 }),
            Some(("flat", days)) => days
                .trim()
                .parse()
                .map(|days| BanDuration::Flat { days })
                .map_err(|e| format!("invalid ban duration '{value}': {e}")),
            _ => Err(format!("invalid ban duration '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EscalationPolicy {
    pub max_attempts: u32,
    pub warning_window: u32,
    pub ban_duration: BanDuration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            warning_window: DEFAULT_WARNING_WINDOW,
            ban_duration: BanDuration::Escalating,
        }
    }
}

impl EscalationPolicy {
    pub const ENV_MAX_ATTEMPTS: &'static str = "ASKSPHERE_MAX_ATTEMPTS";
    pub const ENV_WARNING_WINDOW: &'static str = "ASKSPHERE_WARNING_WINDOW";
    pub const ENV_BAN_DURATION: &'static str = "ASKSPHERE_BAN_DURATION";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: parse_or_default(Self::ENV_MAX_ATTEMPTS, defaults.max_attempts),
            warning_window: parse_or_default(Self::ENV_WARNING_WINDOW, defaults.warning_window),
            ban_duration: match std::env::var(Self::ENV_BAN_DURATION) {
                Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                    tracing::warn!(error = %e, "Ignoring ban duration override");
                    defaults.ban_duration
                }),
                Err(_) => defaults.ban_duration,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::MustBePositive {
                name: "max_attempts",
            });
        }
        if let BanDuration::Flat { days: 0 } = self.ban_duration {
            return Err(ConfigError::MustBePositive {
                name: "ban_duration days",
            });
        }
        Ok(())
    }

    /// Attempts left after `violation_count` violations.
    pub fn attempts_left(&self, violation_count: u32) -> u32 {
        self.max_attempts.saturating_sub(violation_count)
    }

    pub fn is_warning(&self, attempts_left: u32) -> bool {
        attempts_left <= self.warning_window
    }

    /// Whether the `violation_count`-th violation is the first warning of its cycle.
    ///
    /// With a window as wide as the ladder, that is the first violation.
    pub fn opens_warning(&self, violation_count: u32) -> bool {
        let attempts_left = self.attempts_left(violation_count);
        if attempts_left == 0 || !self.is_warning(attempts_left) {
            return false;
        }
        violation_count <= 1 || !self.is_warning(self.attempts_left(violation_count - 1))
    }

    /// Length in days of the `ban_number`-th ban (1-based).
    pub fn ban_duration_days(&self, ban_number: u32) -> u32 {
        match self.ban_duration {
            BanDuration::Escalating => ban_number.max(1),
            BanDuration::Flat { days } => days,
        }
    }
}
