use crate::auth::provider::AuthProvider;
use crate::auth::session::SessionContext;
use crate::screens::{EventSink, Route};

/// Outcome of the dashboard auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthGate {
    Granted(SessionContext),
    Redirected,
}

/// Resolve the session before showing the dashboard. A missing session, a
/// session without a user id, or a failed lookup all send the user back to
/// the login route.
pub async fn check_auth(auth: &dyn AuthProvider, events: &EventSink) -> AuthGate {
    let ctx = match auth.get_session().await {
        Ok(Some(session)) => SessionContext::from_session(&session),
        Ok(None) => None,
        Err(e) => {
            tracing::error!(error = %e, "auth check failed");
            None
        }
    };

    match ctx {
        Some(ctx) => {
            tracing::debug!(user = %ctx.user_id, "dashboard access granted");
            AuthGate::Granted(ctx)
        }
        None => {
            tracing::info!("no session, redirecting to login");
            events.navigate(Route::Login);
            AuthGate::Redirected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::fakes::FakeAuth;
    use crate::screens::UiEvent;

    #[tokio::test]
    async fn session_grants_access() {
        let auth = FakeAuth::with_user("u-1", "a@b.co");
        let (events, mut rx) = EventSink::channel();
        match check_auth(&auth, &events).await {
            AuthGate::Granted(ctx) => assert_eq!(ctx.user_id, "u-1"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_session_redirects() {
        let auth = FakeAuth::default();
        let (events, mut rx) = EventSink::channel();
        assert_eq!(check_auth(&auth, &events).await, AuthGate::Redirected);
        assert_eq!(rx.try_recv().unwrap(), UiEvent::Navigate { route: Route::Login });
    }
}
