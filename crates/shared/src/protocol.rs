use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{UserId, UserRecord};

/// Path segments of the user collection endpoint (`GET /api/users/users`).
pub const USER_COLLECTION_SEGMENTS: [&str; 3] = ["api", "users", "users"];
/// Path segments preceding the id on the single-user endpoint
/// (`DELETE /api/users/{id}`).
pub const USER_ITEM_PREFIX_SEGMENTS: [&str; 2] = ["api", "users"];

/// User object as served by the users API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Kept loosely typed; see [`referral_count`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrals: Option<Value>,
}

/// Reads a referral count the way the admin table displays it: anything that
/// is not a non-negative number counts as zero, fractions are truncated.
pub fn referral_count(raw: Option<&Value>) -> u64 {
    match raw {
        Some(Value::Number(number)) => number.as_u64().unwrap_or_else(|| {
            number
                .as_f64()
                .filter(|count| count.is_finite() && *count >= 0.0)
                .map_or(0, |count| count.trunc() as u64)
        }),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

impl From<UserPayload> for UserRecord {
    fn from(value: UserPayload) -> Self {
        Self {
            referral_count: referral_count(value.referrals.as_ref()),
            id: value.id,
            display_name: value.name.unwrap_or_default(),
            email: value.email.unwrap_or_default(),
        }
    }
}
