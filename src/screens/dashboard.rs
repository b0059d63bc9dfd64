use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::auth::provider::{AuthProvider, UserDirectory};
use crate::auth::session::{SessionContext, UserProfile};
use crate::config::DetectionConfig;
use crate::detection::annotator::annotate_image_data_uri;
use crate::detection::overlay::{build_overlay, summarize, OverlayPlan};
use crate::detection::types::{DetectionResponse, ImageDimensions};
use crate::errors::{LensError, LensResult};
use crate::media::{measure_image, MediaSource};
use crate::screens::scope::ScreenScope;
use crate::screens::{user_message, EventSink, Route};
use crate::upload::client::DetectionService;
use crate::upload::request::{build_detection_request, read_payload_bytes};

const SCREEN: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedImage {
    pub uri: String,
    /// `None` until the header has been measured.
    pub dimensions: Option<ImageDimensions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    pub loading_profile: bool,
    pub profile: Option<UserProfile>,
    pub host: String,
    pub image: Option<SelectedImage>,
    pub response: Option<DetectionResponse>,
    /// Submit in flight; the host disables the submit button while set.
    pub busy: bool,
    pub error: Option<String>,
}

/// Collaborators the dashboard talks to.
pub struct DashboardDeps {
    pub auth: Arc<dyn AuthProvider>,
    pub users: Arc<dyn UserDirectory>,
    pub detector: Arc<dyn DetectionService>,
    pub media: Arc<dyn MediaSource>,
}

pub struct DashboardScreen {
    session: SessionContext,
    deps: DashboardDeps,
    events: EventSink,
    scope: ScreenScope,
    state: Mutex<DashboardState>,
    /// Id of the detection request whose result may still be applied.
    current_ticket: AtomicU64,
    container_width: f64,
}

impl DashboardScreen {
    pub fn new(
        session: SessionContext,
        deps: DashboardDeps,
        events: EventSink,
        config: &DetectionConfig,
    ) -> Self {
        let state = DashboardState {
            loading_profile: true,
            host: config.default_host.clone().unwrap_or_default(),
            ..DashboardState::default()
        };
        Self {
            session,
            deps,
            events,
            scope: ScreenScope::new(),
            state: Mutex::new(state),
            current_ticket: AtomicU64::new(0),
            container_width: config.container_width,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.scope.is_active()
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.lock().await.clone()
    }

    /// Overlay for the current image and response, if both exist.
    pub async fn overlay(&self) -> Option<OverlayPlan> {
        let st = self.state.lock().await;
        let image = st.image.as_ref()?;
        let response = st.response.as_ref()?;
        Some(build_overlay(response, image.dimensions, self.container_width))
    }

    /// Load the `users` row for the session user. A missing row or a failed
    /// lookup falls back to the session email.
    pub async fn load_profile(&self) -> LensResult<UserProfile> {
        let fetched = self
            .scope
            .run(self.deps.users.fetch_profile(&self.session.user_id))
            .await?;

        let profile = match fetched {
            Ok(Some(profile)) => profile,
            Ok(None) => self.session_profile(),
            Err(e) => {
                tracing::warn!(error = %e, user = %self.session.user_id, "profile lookup failed");
                self.session_profile()
            }
        };

        if !self.scope.is_active() {
            return Err(LensError::Cancelled);
        }
        let mut st = self.state.lock().await;
        st.profile = Some(profile.clone());
        st.loading_profile = false;
        drop(st);
        self.events.changed(SCREEN);
        Ok(profile)
    }

    fn session_profile(&self) -> UserProfile {
        UserProfile {
            name: None,
            email: self.session.email.clone(),
        }
    }

    pub async fn set_host(&self, host: &str) {
        self.state.lock().await.host = host.to_string();
    }

    pub async fn pick_image(&self) -> LensResult<Option<SelectedImage>> {
        let picked = self.scope.run(self.deps.media.pick_image()).await??;
        match picked {
            Some(uri) => self.select_image(&uri).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn capture_photo(&self) -> LensResult<Option<SelectedImage>> {
        let allowed = self
            .scope
            .run(self.deps.media.request_camera_permission())
            .await??;
        if !allowed {
            tracing::info!("camera permission denied");
            self.events.alert(
                "Permission required",
                "Camera access is needed to take a photo. Enable it in Settings and try again.",
            );
            return Err(LensError::PermissionDenied("camera".into()));
        }

        let captured = self.scope.run(self.deps.media.capture_photo()).await??;
        match captured {
            Some(uri) => self.select_image(&uri).await.map(Some),
            None => Ok(None),
        }
    }

    /// Replace the current image, drop any previous result, then measure
    /// the new image. A failed measurement leaves dimensions unset.
    pub async fn select_image(&self, uri: &str) -> LensResult<SelectedImage> {
        self.invalidate_requests();
        {
            let mut st = self.state.lock().await;
            st.image = Some(SelectedImage {
                uri: uri.to_string(),
                dimensions: None,
            });
            st.response = None;
            st.error = None;
            st.busy = false;
        }
        self.events.changed(SCREEN);

        let measured = self.scope.run(measure_image(uri)).await?;
        let mut st = self.state.lock().await;
        let Some(image) = st.image.as_mut().filter(|img| img.uri == uri) else {
            // Another image was selected meanwhile.
            return Err(LensError::Cancelled);
        };
        match measured {
            Ok(dims) => image.dimensions = Some(dims),
            Err(e) => tracing::warn!(error = %e, uri = %uri, "could not measure image"),
        }
        let selected = image.clone();
        drop(st);
        self.events.changed(SCREEN);
        Ok(selected)
    }

    pub async fn clear_image(&self) {
        self.invalidate_requests();
        let mut st = self.state.lock().await;
        st.image = None;
        st.response = None;
        st.error = None;
        st.busy = false;
        drop(st);
        self.events.changed(SCREEN);
    }

    fn invalidate_requests(&self) -> u64 {
        self.current_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Upload the current image to the entered host.
    ///
    /// Only the most recent submit may update state; an older request that
    /// completes later is discarded with `Cancelled`.
    pub async fn submit(&self) -> LensResult<DetectionResponse> {
        let (ticket, host, uri) = {
            let mut st = self.state.lock().await;
            let host = st.host.trim().to_string();
            let Some(uri) = st.image.as_ref().map(|img| img.uri.clone()) else {
                drop(st);
                self.events.alert("No image", user_message(&LensError::NoImageSelected));
                return Err(LensError::NoImageSelected);
            };
            if host.is_empty() {
                st.error = Some(user_message(&LensError::MissingEndpoint));
                drop(st);
                self.events.alert("Endpoint required", user_message(&LensError::MissingEndpoint));
                self.events.changed(SCREEN);
                return Err(LensError::MissingEndpoint);
            }
            let ticket = self.invalidate_requests();
            st.busy = true;
            st.error = None;
            st.response = None;
            (ticket, host, uri)
        };
        self.events.changed(SCREEN);

        let payload = build_detection_request(&uri, None);
        tracing::info!(ticket, host = %host, filename = %payload.filename, "detection submitted");
        let result = self
            .scope
            .run(self.deps.detector.submit_detection(&host, &payload))
            .await?;

        let mut st = self.state.lock().await;
        if !self.scope.is_active() || self.current_ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "stale detection result discarded");
            return Err(LensError::Cancelled);
        }
        st.busy = false;
        match result {
            Ok(response) => {
                tracing::info!(ticket, count = response.detections.len(), "detection applied");
                st.response = Some(response.clone());
                drop(st);
                self.events.changed(SCREEN);
                Ok(response)
            }
            Err(e) => {
                let message = user_message(&e);
                st.error = Some(message.clone());
                drop(st);
                if matches!(e, LensError::Network(_)) {
                    self.events.alert("Connection Error", message);
                }
                tracing::warn!(ticket, error = %e, "detection failed");
                self.events.changed(SCREEN);
                Err(e)
            }
        }
    }

    /// One-line result summary, or `None` before a result exists.
    pub async fn summary(&self) -> Option<String> {
        self.state.lock().await.response.as_ref().map(summarize)
    }

    /// PNG data URI of the current image with the boxes drawn in, for hosts
    /// that cannot stack a canvas over the preview.
    pub async fn annotated_preview(&self) -> LensResult<Option<String>> {
        let (uri, response) = {
            let st = self.state.lock().await;
            match (st.image.as_ref(), st.response.as_ref()) {
                (Some(img), Some(resp)) => (img.uri.clone(), resp.clone()),
                _ => return Ok(None),
            }
        };
        let payload = build_detection_request(&uri, None);
        let bytes = self.scope.run(read_payload_bytes(&payload)).await??;
        let detections = response.detections;
        let data_uri = tokio::task::spawn_blocking(move || annotate_image_data_uri(&bytes, &detections))
            .await
            .map_err(|e| LensError::Image(format!("join: {e}")))??;
        Ok(Some(data_uri))
    }

    /// Sign out and leave for the login route. The screen is torn down and
    /// navigation happens even when the provider reports an error.
    pub async fn logout(&self) -> LensResult<()> {
        let result = self.deps.auth.sign_out().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "sign-out failed");
        }
        self.teardown();
        self.events.navigate(Route::Login);
        result
    }

    /// Stop all pending work; nothing started earlier will touch state.
    pub fn teardown(&self) {
        self.scope.cancel();
    }
}

impl Drop for DashboardScreen {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
