//! Refresh coordinator
//!
//! A single version counter bumped once per successful mutation. Dependents
//! hold a [`RefreshSubscription`] and re-fetch when the version moved since
//! they last looked. Because only the latest value is retained, several bumps
//! between two looks coalesce into one re-fetch.

use std::sync::Arc;
use tokio::sync::watch;

/// What caused a bump; used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    ApplicationCreated,
    LocationCreated,
    UploadCompleted,
}

#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn version(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Increment the counter. Returns the new version.
    pub fn bump(&self, reason: RefreshReason) -> u64 {
        self.tx.send_modify(|v| *v += 1);
        let version = self.version();
        tracing::debug!(?reason, version, "Refresh requested");
        version
    }

    /// Subscribe. The current version counts as already seen.
    pub fn subscribe(&self) -> RefreshSubscription {
        RefreshSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug)]
pub struct RefreshSubscription {
    rx: watch::Receiver<u64>,
}

impl RefreshSubscription {
    /// Returns the latest version if it changed since the last call, marking
    /// it seen.
    pub fn poll(&mut self) -> Option<u64> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            _ => None,
        }
    }

    /// Wait for the next change. `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Last version this subscriber acted on.
    pub fn seen(&self) -> u64 {
        *self.rx.borrow()
    }
}
