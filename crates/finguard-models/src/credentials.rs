use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Short-lived cloud credentials as emitted by the credential tool.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialSet {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    /// Informational only. Unrecognised formats are dropped, not rejected.
    #[serde(
        rename = "Expiration",
        default,
        deserialize_with = "lenient_expiration",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<DateTime<Utc>>,
}

impl CredentialSet {
    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_key_id.trim().is_empty() {
            missing.push("AccessKeyId");
        }
        if self.secret_access_key.trim().is_empty() {
            missing.push("SecretAccessKey");
        }
        if self.session_token.trim().is_empty() {
            missing.push("SessionToken");
        }
        missing
    }

    /// Truncated session token, safe for logs.
    pub fn session_preview(&self) -> String {
        let prefix: String = self.session_token.chars().take(20).collect();
        format!("{prefix}...")
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }
}

fn lenient_expiration<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        let parsed = parse_expiration(&value);
        if parsed.is_none() {
            debug!(expiration = %value, "Ignoring unrecognised credential expiration");
        }
        parsed
    }))
}

/// RFC 3339, naive ISO 8601 (taken as UTC), or epoch seconds.
fn parse_expiration(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_preview())
            .field("expiration", &self.expiration)
            .finish()
    }
}
