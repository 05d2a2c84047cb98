//! Credentials file model
//!
//! The file is written by an external sign-in tool; this client only reads it

use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Stored access credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Access token (JWT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Expiration time (RFC3339 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl Credentials {
    /// Get default credentials file path
    pub fn default_credentials_path() -> &'static str {
        "credentials.json"
    }

    /// Load credentials from file
    ///
    /// - Returns empty credentials if file does not exist
    /// - Returns empty credentials if file content is empty
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Non-blank access token
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Effective expiry: `expiresAt` if parseable, else the JWT `exp` claim
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| self.token().and_then(extract_exp_from_jwt))
    }

    /// Check if the token expires within the given number of seconds
    ///
    /// Tokens without any known expiry never count as expiring.
    pub fn is_expiring_within(&self, seconds: i64) -> bool {
        self.expiry()
            .map(|expires| expires <= Utc::now() + Duration::seconds(seconds))
            .unwrap_or(false)
    }
}

/// Extract the `exp` claim from a JWT access token
fn extract_exp_from_jwt(access_token: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = access_token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
    let exp = payload.get("exp")?.as_i64()?;

    Utc.timestamp_opt(exp, 0).single()
}
