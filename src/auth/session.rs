use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in session as held by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |exp| exp <= now)
    }
}

/// Explicit session value handed to screens that need a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub email: Option<String>,
}

impl SessionContext {
    /// `None` for sessions without a usable user id.
    pub fn from_session(session: &Session) -> Option<Self> {
        if session.user.id.trim().is_empty() {
            return None;
        }
        Some(Self {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
        })
    }
}

/// Row of the remote `users` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn greeting(&self) -> String {
        let name = self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("User");
        format!("Hello, {name}!")
    }

    pub fn email_line(&self) -> String {
        let email = self
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or("Not available");
        format!("Email: {email}")
    }
}

/// Row written to `users` right after sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserRecord {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
}
