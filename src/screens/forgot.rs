use std::sync::Arc;

use crate::auth::provider::AuthProvider;
use crate::errors::{AuthError, LensResult};
use crate::screens::scope::ScreenScope;
use crate::screens::{user_message, EventSink, Route};

pub struct ForgotPasswordScreen {
    auth: Arc<dyn AuthProvider>,
    events: EventSink,
    scope: ScreenScope,
}

impl ForgotPasswordScreen {
    pub fn new(auth: Arc<dyn AuthProvider>, events: EventSink) -> Self {
        Self {
            auth,
            events,
            scope: ScreenScope::new(),
        }
    }

    /// Ask the provider to mail a reset link to `email`.
    pub async fn handle_reset(&self, email: &str) -> LensResult<()> {
        let email = email.trim();
        if email.is_empty() {
            let err = AuthError::MissingEmail;
            self.events.alert("Reset Password", err.to_string());
            return Err(err.into());
        }
        tracing::info!(email = %email, "password reset requested");

        match self.scope.run(self.auth.reset_password_for_email(email)).await? {
            Ok(()) => {
                self.events.alert(
                    "Reset Password",
                    "If an account exists for this email, a reset link has been sent.",
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "password reset failed");
                self.events.alert("Reset Password", user_message(&e));
                Err(e)
            }
        }
    }

    pub fn back_to_login(&self) {
        self.events.navigate(Route::Login);
    }

    pub fn teardown(&self) {
        self.scope.cancel();
    }
}

impl Drop for ForgotPasswordScreen {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
