use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Minimum remaining lifetime before a token is considered usable, per
/// spec §3: "usable while now + 5 min < expires_at".
const USABILITY_MARGIN: Duration = Duration::minutes(5);

/// Fallback lifetime applied when a token response's `expires_at` can't be
/// parsed in any documented format.
pub const FALLBACK_LIFETIME: Duration = Duration::hours(24);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub value: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now + USABILITY_MARGIN < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_within_margin_of_expiry_is_not_usable() {
        let now = Utc::now();
        let token = OAuthToken {
            value: "t".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: now + Duration::minutes(4),
        };
        assert!(!token.is_usable(now));
    }

    #[test]
    fn token_well_before_expiry_is_usable() {
        let now = Utc::now();
        let token = OAuthToken {
            value: "t".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: now + Duration::hours(1),
        };
        assert!(token.is_usable(now));
    }
}
