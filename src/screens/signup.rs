use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::auth::provider::{AuthProvider, UserDirectory};
use crate::auth::session::{NewUserRecord, SessionUser};
use crate::errors::{AuthError, LensError, LensResult};
use crate::screens::scope::ScreenScope;
use crate::screens::{EventSink, Route};

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupState {
    pub loading: bool,
}

pub struct SignupScreen {
    auth: Arc<dyn AuthProvider>,
    users: Arc<dyn UserDirectory>,
    events: EventSink,
    scope: ScreenScope,
    state: Mutex<SignupState>,
}

impl SignupScreen {
    pub fn new(auth: Arc<dyn AuthProvider>, users: Arc<dyn UserDirectory>, events: EventSink) -> Self {
        Self {
            auth,
            users,
            events,
            scope: ScreenScope::new(),
            state: Mutex::new(SignupState::default()),
        }
    }

    pub async fn snapshot(&self) -> SignupState {
        self.state.lock().await.clone()
    }

    /// Create the account, then write its `users` row. Every outcome is
    /// reported as an alert; the screen stays put.
    pub async fn handle_signup(&self, form: &SignupForm) -> LensResult<SessionUser> {
        if form.password != form.confirm_password {
            self.events.alert("Sign up", "Passwords do not match");
            return Err(AuthError::PasswordMismatch.into());
        }

        self.state.lock().await.loading = true;
        self.events.changed("signup");

        let result = self.scope.run(self.register(form)).await;
        if matches!(result, Err(LensError::Cancelled)) {
            return Err(LensError::Cancelled);
        }
        let result = result.and_then(|r| r);

        self.state.lock().await.loading = false;
        self.events.changed("signup");

        match &result {
            Ok(user) => {
                tracing::info!(user = %user.id, "account created");
                self.events.alert("Sign up", "Account created successfully!");
            }
            Err(LensError::Auth(e)) => {
                self.events.alert("Sign up", format!("Error signing up: {e}"));
            }
            Err(e) => {
                tracing::error!(error = %e, "sign-up failed");
                self.events.alert("Sign up", format!("Error signing up: {e}"));
            }
        }
        result
    }

    async fn register(&self, form: &SignupForm) -> LensResult<SessionUser> {
        let user = self
            .auth
            .sign_up(&form.email, &form.password)
            .await?
            .ok_or_else(|| AuthError::Rejected("User data is undefined after signup".into()))?;

        self.users
            .insert_profile(&NewUserRecord {
                id: user.id.clone(),
                email: user.email.clone(),
                name: form.name.clone(),
            })
            .await?;
        Ok(user)
    }

    pub fn back_to_login(&self) {
        self.events.navigate(Route::Login);
    }

    pub fn teardown(&self) {
        self.scope.cancel();
    }
}

impl Drop for SignupScreen {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::screens::fakes::{user, FakeAuth, FakeUsers};
    use crate::screens::UiEvent;

    fn form(pw: &str, confirm: &str) -> SignupForm {
        SignupForm {
            name: "Ada".into(),
            email: "ada@x.io".into(),
            password: pw.into(),
            confirm_password: confirm.into(),
        }
    }

    #[tokio::test]
    async fn mismatch_never_calls_provider() {
        let auth = Arc::new(FakeAuth::default());
        let (events, mut rx) = EventSink::channel();
        let screen = SignupScreen::new(auth.clone(), Arc::new(FakeUsers::default()), events);

        let err = screen.handle_signup(&form("a", "b")).await.unwrap_err();
        assert!(matches!(err, LensError::Auth(AuthError::PasswordMismatch)));
        assert_eq!(auth.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Alert { title: "Sign up".into(), message: "Passwords do not match".into() }
        );
    }

    #[tokio::test]
    async fn success_writes_users_row() {
        let auth = FakeAuth::default();
        *auth.sign_up.lock().unwrap() = Some(Ok(Some(user("u-9", "ada@x.io"))));
        let users = Arc::new(FakeUsers::default());
        let (events, _rx) = EventSink::channel();
        let screen = SignupScreen::new(Arc::new(auth), users.clone(), events);

        let created = screen.handle_signup(&form("pw", "pw")).await.unwrap();
        assert_eq!(created.id, "u-9");
        assert!(!screen.snapshot().await.loading);
        let rows = users.inserted.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ada");
    }

    #[tokio::test]
    async fn missing_user_is_error_and_clears_loading() {
        let users = Arc::new(FakeUsers::default());
        let (events, _rx) = EventSink::channel();
        let screen = SignupScreen::new(Arc::new(FakeAuth::default()), users.clone(), events);

        assert!(screen.handle_signup(&form("pw", "pw")).await.is_err());
        assert!(users.inserted.lock().unwrap().is_empty());
        assert!(!screen.snapshot().await.loading);
    }
}
