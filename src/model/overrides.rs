use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::task::Priority;

/// A temporary priority change that is still waiting to be reverted.
///
/// Persisted in the override ledger so an override made in one session is
/// reverted by a later one once it falls due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub date: NaiveDate,
    /// Priority restored when the override expires
    pub original: Priority,
    /// Priority in effect while the override is active
    pub priority: Priority,
    pub expires_at: DateTime<Utc>,
}

impl OverrideRecord {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before the revert, zero if already due
    pub fn remaining(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.expires_at - now).to_std().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn record(expires_at: DateTime<Utc>) -> OverrideRecord {
        OverrideRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            original: Priority::One,
            priority: Priority::Four,
            expires_at,
        }
    }

    #[test]
    fn due_when_expiry_passed() {
        let now = Utc::now();
        assert!(record(now - TimeDelta::seconds(1)).is_due(now));
        assert!(record(now).is_due(now));
        assert!(!record(now + TimeDelta::seconds(1)).is_due(now));
    }

    #[test]
    fn remaining_clamps_to_zero() {
        let now = Utc::now();
        assert_eq!(
            record(now - TimeDelta::minutes(5)).remaining(now),
            std::time::Duration::ZERO
        );
        assert_eq!(
            record(now + TimeDelta::seconds(90)).remaining(now),
            std::time::Duration::from_secs(90)
        );
    }
}
