use async_trait::async_trait;

use crate::auth::session::{NewUserRecord, Session, SessionUser, UserProfile};
use crate::errors::LensResult;

/// Hosted authentication service.
///
/// Credential failures come back as `LensError::Auth`; transport failures
/// as any other variant.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any.
    async fn get_session(&self) -> LensResult<Option<Session>>;

    /// `Ok(None)` when the service accepted the call but returned no user.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> LensResult<Option<SessionUser>>;

    async fn sign_up(&self, email: &str, password: &str) -> LensResult<Option<SessionUser>>;

    async fn sign_out(&self) -> LensResult<()>;

    async fn reset_password_for_email(&self, email: &str) -> LensResult<()>;
}

/// Remote `users` table keyed by auth user id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// At most one record; `Ok(None)` when the user has no row.
    async fn fetch_profile(&self, user_id: &str) -> LensResult<Option<UserProfile>>;

    async fn insert_profile(&self, record: &NewUserRecord) -> LensResult<()>;
}
