//! Authentication payloads for the remote task API.

use serde::{Deserialize, Serialize};

/// Login credentials, sent as JSON `{email, password}`.
///
/// The gateway may re-encode these as a form body
/// (`username=<email>&password=...`) when the server rejects JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from an email/password pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration payload for `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Optional display username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Token pair returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Bearer token for authenticated requests.
    pub access_token: String,
    /// Token used to obtain a fresh access token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// User summary returned by registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Server-issued user identifier.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Optional display username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}
