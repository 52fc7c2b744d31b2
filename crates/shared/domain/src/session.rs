//! Session as issued by the identity service.
//!
//! The application never creates or edits a session on its own; it keeps the latest
//! value handed out by the provider and drops it on sign-out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Authenticated user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
}

impl User {
    /// Best human-readable label: the email, falling back to the user id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Token bundle returned by the identity service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    /// Unix timestamp (seconds). Providers omit it on some grants.
    #[serde(default)]
    pub expires_at: Option<u64>,
    pub user: User,
}

impl Session {
    /// Fills in `expires_at` from `expires_in` when the provider left it out.
    #[must_use]
    pub fn stamped(mut self, now: u64) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(now.saturating_add(self.expires_in));
        }
        self
    }

    /// Whether the access token expires within `skew` seconds of `now`.
    #[must_use]
    pub fn expires_within(&self, now: u64, skew: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now.saturating_add(skew))
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

fn bearer() -> String {
    "bearer".to_owned()
}

/// Kind of session transition pushed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
        })
    }
}

/// A session transition for one browser client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChange {
    /// Opaque id of the browser client the change belongs to.
    pub client: Arc<str>,
    pub event: AuthEvent,
    /// The new session; `None` after sign-out.
    pub session: Option<Arc<Session>>,
}
