//! Lifetime token for one screen instance.
//!
//! Async work started by a screen runs inside its scope; once the scope is
//! cancelled (teardown or drop of the owning screen) pending work is dropped
//! and its results never reach screen state.
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{LensError, LensResult};

#[derive(Clone)]
pub struct ScreenScope {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ScreenScope {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn is_active(&self) -> bool {
        !*self.rx.borrow()
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run `fut` unless the scope is cancelled first.
    pub async fn run<F>(&self, fut: F) -> LensResult<F::Output>
    where
        F: Future,
    {
        if !self.is_active() {
            return Err(LensError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(LensError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Spawn `fut` on the runtime, tied to this scope.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<LensResult<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let scope = self.clone();
        tokio::spawn(async move { scope.run(fut).await })
    }
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}
