//! The token payload produced by every grant.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Tokens returned by the token endpoint, optionally enriched with userinfo.
///
/// Unknown response fields are ignored; missing ones take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSet {
    /// Token type, typically `Bearer`.
    pub token_type: String,

    /// Scope granted by the server.
    pub scope: String,

    /// Lifetime of the access token in seconds.
    #[serde(deserialize_with = "lenient_seconds")]
    pub expires_in: u64,

    /// The access token. Never empty in a value returned by an exchange.
    pub access_token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Claims from the userinfo endpoint, when fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo: Option<Map<String, Value>>,
}

impl TokenSet {
    /// Render as indented JSON.
    pub fn to_pretty_json(&self) -> String {
        // Serializing plain strings and maps cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Accept `expires_in` as a number, a numeric string, or null.
///
/// Some IDPs (older Azure AD endpoints among them) send it as a string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Number(n)) => n,
        Some(Seconds::Float(f)) if f.is_finite() && f >= 0.0 => f as u64,
        Some(Seconds::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
