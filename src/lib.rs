pub mod auth;
pub mod config;
pub mod detection;
pub mod errors;
pub mod media;
pub mod screens;
pub mod upload;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::auth::supabase::SupabaseClient;
use crate::config::AppConfig;
use crate::errors::LensResult;
use crate::media::MediaSource;
use crate::screens::dashboard::{DashboardDeps, DashboardScreen};
use crate::screens::forgot::ForgotPasswordScreen;
use crate::screens::guard::{check_auth, AuthGate};
use crate::screens::login::LoginScreen;
use crate::screens::signup::SignupScreen;
use crate::screens::{EventSink, UiEvent};
use crate::upload::client::HttpDetectionClient;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `fallback`.
/// Calling this twice is harmless.
pub fn init_tracing(fallback: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .try_init();
}

/// Shared services for all screens, built once by the host shell.
pub struct LensApp {
    config: AppConfig,
    backend: Arc<SupabaseClient>,
    detector: Arc<HttpDetectionClient>,
    media: Arc<dyn MediaSource>,
    events: EventSink,
}

impl LensApp {
    /// Load config from the usual locations and wire up the clients. The
    /// returned receiver carries navigation, alerts and state changes for the host.
    pub fn start(media: Arc<dyn MediaSource>) -> LensResult<(Self, mpsc::UnboundedReceiver<UiEvent>)> {
        let config = config::load_config()?;
        Self::with_config(config, media)
    }

    pub fn with_config(
        config: AppConfig,
        media: Arc<dyn MediaSource>,
    ) -> LensResult<(Self, mpsc::UnboundedReceiver<UiEvent>)> {
        init_tracing(&config.logging.filter);
        config.validate()?;

        let backend = Arc::new(SupabaseClient::from_config(&config.backend)?);
        let detector = Arc::new(HttpDetectionClient::new()?);
        let (events, rx) = EventSink::channel();
        tracing::info!(backend = %config.backend.url, "lensboard started");

        Ok((
            Self {
                config,
                backend,
                detector,
                media,
                events,
            },
            rx,
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn login_screen(&self) -> LoginScreen {
        LoginScreen::new(self.backend.clone(), self.events.clone())
    }

    pub fn signup_screen(&self) -> SignupScreen {
        SignupScreen::new(self.backend.clone(), self.backend.clone(), self.events.clone())
    }

    pub fn forgot_password_screen(&self) -> ForgotPasswordScreen {
        ForgotPasswordScreen::new(self.backend.clone(), self.events.clone())
    }

    /// Run the auth gate and build the dashboard. `None` means the user was
    /// sent to the login route instead.
    pub async fn open_dashboard(&self) -> Option<DashboardScreen> {
        match check_auth(self.backend.as_ref(), &self.events).await {
            AuthGate::Granted(session) => {
                let deps = DashboardDeps {
                    auth: self.backend.clone(),
                    users: self.backend.clone(),
                    detector: self.detector.clone(),
                    media: self.media.clone(),
                };
                Some(DashboardScreen::new(
                    session,
                    deps,
                    self.events.clone(),
                    &self.config.detection,
                ))
            }
            AuthGate::Redirected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::errors::LensError;
    use crate::screens::fakes::FakeMedia;
    use crate::screens::Route;

    fn media() -> Arc<dyn MediaSource> {
        Arc::new(FakeMedia { picked: None, camera_allowed: true, captured: None })
    }

    #[tokio::test]
    async fn dashboard_without_session_redirects() {
        let config = AppConfig {
            backend: BackendConfig {
                url: "http://127.0.0.1:9".into(),
                anon_key: Some("anon".into()),
            },
            ..AppConfig::default()
        };
        let (app, mut rx) = LensApp::with_config(config, media()).unwrap();
        assert!(app.open_dashboard().await.is_none());
        assert_eq!(rx.recv().await, Some(UiEvent::Navigate { route: Route::Login }));
    }

    #[test]
    fn missing_anon_key_is_config_error() {
        let config = AppConfig {
            backend: BackendConfig { url: "http://127.0.0.1:9".into(), anon_key: None },
            ..AppConfig::default()
        };
        assert!(matches!(
            LensApp::with_config(config, media()),
            Err(LensError::Config(_))
        ));
    }
}
