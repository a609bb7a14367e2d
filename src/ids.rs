//! Identifier newtypes shared across the moderation pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the identifier is empty or whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Forum member identifier.
    UserId
);
string_id!(
    /// Topic community identifier.
    CommunityId
);
string_id!(
    /// Question identifier (also used as the thread reference of an answer).
    QuestionId
);

/// Composite key for all per-(user, community) moderation state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub user_id: UserId,
    pub community_id: CommunityId,
}

impl LedgerKey {
    pub fn new(user_id: UserId, community_id: CommunityId) -> Self {
        Self {
            user_id,
            community_id,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user_id, self.community_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_ids() {
        assert!(UserId::from("").is_blank());
        assert!(UserId::from("   ").is_blank());
        assert!(!UserId::from("u1").is_blank());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = CommunityId::from("dev");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dev\"");

        let back: CommunityId = serde_json::from_str("\"dev\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ledger_key_display() {
        let key = LedgerKey::new(UserId::from("alice"), CommunityId::from("1"));
        assert_eq!(key.to_string(), "alice@1");
    }
}
