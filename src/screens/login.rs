use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::auth::provider::AuthProvider;
use crate::errors::{LensError, LensResult};
use crate::screens::scope::ScreenScope;
use crate::screens::{EventSink, Route};

const MSG_INVALID: &str = "Invalid email or password";
const MSG_NO_USER: &str = "Something went wrong. Please try again.";
const MSG_UNEXPECTED: &str = "An unexpected error occurred.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginState {
    pub loading: bool,
    pub error: Option<String>,
}

impl LoginState {
    pub fn button_label(&self) -> &'static str {
        if self.loading { "Logging In..." } else { "Login" }
    }
}

pub struct LoginScreen {
    auth: Arc<dyn AuthProvider>,
    events: EventSink,
    scope: ScreenScope,
    state: Mutex<LoginState>,
}

impl LoginScreen {
    pub fn new(auth: Arc<dyn AuthProvider>, events: EventSink) -> Self {
        Self {
            auth,
            events,
            scope: ScreenScope::new(),
            state: Mutex::new(LoginState::default()),
        }
    }

    pub async fn snapshot(&self) -> LoginState {
        self.state.lock().await.clone()
    }

    /// Sign in and move to the dashboard. Failures stay on this screen as
    /// inline text so the user can retry.
    pub async fn handle_login(&self, email: &str, password: &str) -> LensResult<()> {
        {
            let mut st = self.state.lock().await;
            st.loading = true;
            st.error = None;
        }
        self.events.changed("login");

        let result = self
            .scope
            .run(self.auth.sign_in_with_password(email, password))
            .await?;

        let outcome = match result {
            Ok(Some(user)) => {
                tracing::info!(user = %user.id, "login succeeded");
                Ok(())
            }
            Ok(None) => Err((MSG_NO_USER, LensError::SessionMissing)),
            Err(e @ LensError::Auth(_)) => Err((MSG_INVALID, e)),
            Err(e) => {
                tracing::error!(error = %e, "login failed");
                Err((MSG_UNEXPECTED, e))
            }
        };

        let mut st = self.state.lock().await;
        st.loading = false;
        match outcome {
            Ok(()) => {
                drop(st);
                self.events.navigate(Route::Dashboard);
                Ok(())
            }
            Err((message, err)) => {
                st.error = Some(message.to_string());
                drop(st);
                self.events.changed("login");
                Err(err)
            }
        }
    }

    pub fn teardown(&self) {
        self.scope.cancel();
    }
}

impl Drop for LoginScreen {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AuthError;
    use crate::screens::fakes::{user, FakeAuth};
    use crate::screens::UiEvent;

    fn screen(auth: FakeAuth) -> (LoginScreen, tokio::sync::mpsc::UnboundedReceiver<UiEvent>) {
        let (events, rx) = EventSink::channel();
        (LoginScreen::new(Arc::new(auth), events), rx)
    }

    #[tokio::test]
    async fn success_navigates_to_dashboard() {
        let auth = FakeAuth::default();
        *auth.sign_in.lock().unwrap() = Some(Ok(Some(user("u-1", "a@b.co"))));
        let (login, mut rx) = screen(auth);

        login.handle_login("a@b.co", "pw").await.unwrap();
        assert!(!login.snapshot().await.loading);

        let mut saw_nav = false;
        while let Ok(ev) = rx.try_recv() {
            saw_nav |= ev == UiEvent::Navigate { route: Route::Dashboard };
        }
        assert!(saw_nav);
    }

    #[tokio::test]
    async fn auth_error_is_inline() {
        let auth = FakeAuth::default();
        *auth.sign_in.lock().unwrap() = Some(Err(AuthError::InvalidCredentials.into()));
        let (login, _rx) = screen(auth);

        assert!(login.handle_login("a@b.co", "bad").await.is_err());
        let st = login.snapshot().await;
        assert_eq!(st.error.as_deref(), Some("Invalid email or password"));
        assert!(!st.loading);
        assert_eq!(st.button_label(), "Login");
    }

    #[tokio::test]
    async fn missing_user_asks_to_retry() {
        let (login, _rx) = screen(FakeAuth::default());
        assert!(login.handle_login("a@b.co", "pw").await.is_err());
        assert_eq!(
            login.snapshot().await.error.as_deref(),
            Some("Something went wrong. Please try again.")
        );
    }

    #[tokio::test]
    async fn transport_error_is_unexpected() {
        let auth = FakeAuth::default();
        *auth.sign_in.lock().unwrap() = Some(Err(LensError::Backend("down".into())));
        let (login, _rx) = screen(auth);
        assert!(login.handle_login("a@b.co", "pw").await.is_err());
        assert_eq!(login.snapshot().await.error.as_deref(), Some("An unexpected error occurred."));
    }
}
