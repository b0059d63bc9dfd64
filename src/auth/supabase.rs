//! Supabase-compatible REST adapter for `AuthProvider` and `UserDirectory`.
//!
//! Talks to GoTrue (`/auth/v1/*`) for credentials and PostgREST
//! (`/rest/v1/users`) for profile rows. The signed-in session is kept in
//! memory only.
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tokio::sync::RwLock;

use crate::auth::provider::{AuthProvider, UserDirectory};
use crate::auth::session::{NewUserRecord, Session, SessionUser, UserProfile};
use crate::config::BackendConfig;
use crate::errors::{AuthError, LensError, LensResult};

const USERS_TABLE: &str = "users";

pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    pub fn from_config(cfg: &BackendConfig) -> LensResult<Self> {
        let key = cfg
            .anon_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LensError::Config("backend.anon_key missing".into()))?;
        if cfg.url.trim().is_empty() {
            return Err(LensError::Config("backend.url is empty".into()));
        }
        Ok(Self::new(cfg.url.clone(), key))
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Bearer for PostgREST calls: the user's token when signed in, else the anon key.
    async fn bearer(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    async fn post_auth(&self, path: &str, body: serde_json::Value) -> LensResult<reqwest::Response> {
        let resp = self
            .client
            .post(self.auth_url(path))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        Ok(resp)
    }

    async fn store_session(&self, session: Session) -> SessionUser {
        let user = session.user.clone();
        *self.session.write().await = Some(session);
        user
    }

    async fn refresh(&self, refresh_token: &str) -> LensResult<Option<Session>> {
        let resp = self
            .post_auth(
                "token?grant_type=refresh_token",
                json!({ "refresh_token": refresh_token }),
            )
            .await?;
        if !resp.status().is_success() {
            tracing::warn!(status = resp.status().as_u16(), "session refresh rejected");
            return Ok(None);
        }
        let body: serde_json::Value = resp.json().await?;
        Ok(parse_token_response(&body, Utc::now()))
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn get_session(&self) -> LensResult<Option<Session>> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        tracing::debug!(user = %session.user.id, "session expired, refreshing");
        let refreshed = match session.refresh_token.as_deref() {
            Some(token) => self.refresh(token).await?,
            None => None,
        };
        let mut slot = self.session.write().await;
        *slot = refreshed.clone();
        Ok(refreshed)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> LensResult<Option<SessionUser>> {
        let resp = self
            .post_auth(
                "token?grant_type=password",
                json!({ "email": email, "password": password }),
            )
            .await?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);

        if status.is_client_error() {
            tracing::info!(status = status.as_u16(), message = %error_message(&body), "sign-in rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !status.is_success() {
            return Err(AuthError::Rejected(format!("{}: {}", status, error_message(&body))).into());
        }

        match parse_token_response(&body, Utc::now()) {
            Some(session) => {
                let user = self.store_session(session).await;
                tracing::info!(user = %user.id, "signed in");
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> LensResult<Option<SessionUser>> {
        let resp = self
            .post_auth("signup", json!({ "email": email, "password": password }))
            .await?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);

        if !status.is_success() {
            let message = error_message(&body);
            let conflict = body["error_code"].as_str() == Some("user_already_exists")
                || message.to_lowercase().contains("already registered");
            tracing::info!(status = status.as_u16(), message = %message, "sign-up rejected");
            return Err(if conflict {
                AuthError::SignupConflict(message)
            } else {
                AuthError::Rejected(message)
            }
            .into());
        }

        // Auto-confirm projects answer with a full session; confirm-by-email
        // projects answer with the bare user object.
        if let Some(session) = parse_token_response(&body, Utc::now()) {
            return Ok(Some(self.store_session(session).await));
        }
        Ok(serde_json::from_value::<SessionUser>(body).ok())
    }

    async fn sign_out(&self) -> LensResult<()> {
        let token = self.session.write().await.take().map(|s| s.access_token);
        let Some(token) = token else {
            return Ok(());
        };
        // The local session is gone from here on; the server call only
        // revokes the token and its failure does not keep the user signed in.
        let sent = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await;
        match sent {
            Ok(resp)
                if !resp.status().is_success()
                    && resp.status() != reqwest::StatusCode::UNAUTHORIZED =>
            {
                tracing::warn!(status = resp.status().as_u16(), "logout not acknowledged");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "logout request failed; local session cleared"),
        }
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> LensResult<()> {
        let resp = self.post_auth("recover", json!({ "email": email })).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
            return Err(AuthError::Rejected(format!("{}: {}", status, error_message(&body))).into());
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SupabaseClient {
    async fn fetch_profile(&self, user_id: &str) -> LensResult<Option<UserProfile>> {
        let resp = self
            .client
            .get(self.rest_url(USERS_TABLE))
            .query(&[("select", "name,email".to_string()), ("id", format!("eq.{user_id}"))])
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LensError::Backend(format!("users lookup failed: {status}: {body}")));
        }
        let mut rows: Vec<UserProfile> = resp.json().await?;
        // Exactly one row or nothing.
        Ok(if rows.len() == 1 { rows.pop() } else { None })
    }

    async fn insert_profile(&self, record: &NewUserRecord) -> LensResult<()> {
        let resp = self
            .client
            .post(self.rest_url(USERS_TABLE))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(self.bearer().await)
            .json(&[record])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
            return Err(AuthError::Rejected(format!("{}: {}", status, error_message(&body))).into());
        }
        Ok(())
    }
}

/// Build a session from a GoTrue token response; `None` if it carries no token.
fn parse_token_response(body: &serde_json::Value, now: DateTime<Utc>) -> Option<Session> {
    let access_token = body["access_token"].as_str()?.to_string();
    let user: SessionUser = serde_json::from_value(body["user"].clone()).ok()?;
    let expires_at = body["expires_at"]
        .as_i64()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .or_else(|| body["expires_in"].as_i64().map(|secs| now + Duration::seconds(secs)));
    Some(Session {
        access_token,
        refresh_token: body["refresh_token"].as_str().map(str::to_string),
        expires_at,
        user,
    })
}

/// GoTrue and PostgREST spell their error text differently.
fn error_message(body: &serde_json::Value) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| body[*k].as_str())
        .unwrap_or("unknown error")
        .to_string()
}
