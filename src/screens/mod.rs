//! Headless screen controllers. Each screen holds its own state, talks to
//! collaborators through traits, and reports navigation and alerts to the
//! host shell as `UiEvent`s.
pub mod dashboard;
pub mod forgot;
pub mod guard;
pub mod login;
pub mod scope;
pub mod signup;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::errors::{LensError, NetworkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Signup,
    ForgotPassword,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Replace the current route.
    Navigate { route: Route },
    /// Blocking alert with a single dismiss action.
    Alert { title: String, message: String },
    /// Screen state changed; the host should re-read its snapshot.
    StateChanged { screen: &'static str },
}

/// Non-blocking sender for `UiEvent`s. The channel is unbounded so a host
/// that drains slowly still sees every navigation and alert; events are only
/// lost once the host has dropped its receiver.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end for the host.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: UiEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(event = ?e.0, "ui event after host detached");
        }
    }

    pub fn navigate(&self, route: Route) {
        self.emit(UiEvent::Navigate { route });
    }

    pub fn alert(&self, title: impl Into<String>, message: impl Into<String>) {
        self.emit(UiEvent::Alert {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn changed(&self, screen: &'static str) {
        self.emit(UiEvent::StateChanged { screen });
    }
}

/// Text shown inline (and in alerts) for a failed user action.
pub fn user_message(err: &LensError) -> String {
    match err {
        LensError::Network(NetworkError::Status { endpoint, status, .. }) => format!(
            "Server error ({status}) from {endpoint}. Check the detection server logs."
        ),
        LensError::Network(NetworkError::NoResponse { endpoint, .. }) => format!(
            "No response from {endpoint}. Make sure the server is running and reachable on your network."
        ),
        LensError::Network(NetworkError::RequestSetup { endpoint, reason }) => {
            format!("Could not send the request to {endpoint}: {reason}")
        }
        LensError::MalformedResponse(_) => {
            "Unexpected response from the detection server.".to_string()
        }
        LensError::MissingEndpoint => {
            "Please enter the IP address of the detection server.".to_string()
        }
        LensError::NoImageSelected => "Please select or capture an image first.".to_string(),
        LensError::PermissionDenied(what) => format!("Permission to access the {what} is required."),
        LensError::Auth(e) => e.to_string(),
        other => format!("An unexpected error occurred: {other}"),
    }
}
