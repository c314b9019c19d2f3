use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::subscription::tiers::Tier;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Option<String>,
    pub subscription_tier: Option<String>,
    pub monthly_application_count: i64,
    pub application_count_reset_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Effective tier: the stored value, reading unset or unrecognized
    /// strings as free.
    pub fn tier(&self) -> Tier {
        Tier::parse_or_free(self.subscription_tier.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(tier: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role: None,
            subscription_tier: tier.map(String::from),
            monthly_application_count: 0,
            application_count_reset_date: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tier_defaults_to_free() {
        assert_eq!(make_user(None).tier(), Tier::Free);
        assert_eq!(make_user(Some("legacy")).tier(), Tier::Free);
    }

    #[test]
    fn test_tier_reads_stored_value() {
        assert_eq!(make_user(Some("pro")).tier(), Tier::Pro);
        assert_eq!(make_user(Some("enterprise")).tier(), Tier::Enterprise);
    }
}
