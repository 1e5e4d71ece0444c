//! FileHub synchronization engine
//!
//! Keeps client state consistent with the file service: the session, the
//! Application/Location hierarchy and its cache, the upload state machine and
//! the filterable upload registry. All network access goes through the
//! `FileService` trait from `filehub-core`.

pub mod cache;
pub mod hierarchy;
pub mod progress;
pub mod refresh;
pub mod registry;
pub mod session;
pub mod upload;
pub mod workspace;

pub use cache::ResourceCache;
pub use hierarchy::HierarchyController;
pub use progress::UploadProgress;
pub use refresh::{RefreshCoordinator, RefreshReason, RefreshSubscription};
pub use registry::{QueryOutcome, RegistryView};
pub use session::{Session, SessionTicket};
pub use upload::{FileCandidate, UploadController, UploadPhase};
pub use workspace::Workspace;

use filehub_core::{ClientError, LogLevel};

/// Log a failed operation at the level its error kind calls for.
pub(crate) fn log_failure(operation: &str, err: &ClientError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(operation, error = %err, "Operation failed"),
        LogLevel::Warn => tracing::warn!(operation, error = %err, "Operation failed"),
        LogLevel::Error => tracing::error!(operation, error = %err, "Operation failed"),
    }
}
