//! Wires the engine components around one session.

use filehub_core::{ClientConfig, ClientError, FileService, HealthStatus, IdentityProvider, User};
use std::sync::Arc;
use std::time::Duration;

use crate::hierarchy::HierarchyController;
use crate::refresh::RefreshCoordinator;
use crate::registry::RegistryView;
use crate::session::Session;
use crate::upload::{UploadController, DEFAULT_PROGRESS_TICK};

pub struct Workspace {
    service: Arc<dyn FileService>,
    session: Arc<Session>,
    refresh: RefreshCoordinator,
    hierarchy: Arc<HierarchyController>,
    registry: Arc<RegistryView>,
    progress_tick: Duration,
}

impl Workspace {
    /// Resolve the user and build the engine. An identity failure is fatal.
    pub async fn connect(
        service: Arc<dyn FileService>,
        identity: &dyn IdentityProvider,
    ) -> Result<Self, ClientError> {
        let session = Session::start(identity).await?;
        Ok(Self::with_session(service, Arc::new(session)))
    }

    pub fn with_session(service: Arc<dyn FileService>, session: Arc<Session>) -> Self {
        let refresh = RefreshCoordinator::new();
        let hierarchy = Arc::new(HierarchyController::new(
            service.clone(),
            session.clone(),
            refresh.clone(),
        ));
        let registry = Arc::new(RegistryView::new(
            service.clone(),
            session.clone(),
            &refresh,
        ));

        Self {
            service,
            session,
            refresh,
            hierarchy,
            registry,
            progress_tick: DEFAULT_PROGRESS_TICK,
        }
    }

    /// Apply client settings that affect the engine.
    pub fn configure(mut self, config: &ClientConfig) -> Self {
        self.progress_tick = config.progress_tick;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn hierarchy(&self) -> &Arc<HierarchyController> {
        &self.hierarchy
    }

    pub fn registry(&self) -> &Arc<RegistryView> {
        &self.registry
    }

    /// A fresh upload controller sharing this workspace's session and cache.
    pub fn upload_controller(&self) -> UploadController {
        UploadController::new(self.hierarchy.clone()).with_progress_tick(self.progress_tick)
    }

    pub async fn current_user(&self) -> Option<Arc<User>> {
        self.session.user().await
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.service.health().await
    }

    /// End the session and drop all state derived from it.
    pub async fn logout(&self) {
        self.session.clear().await;
        self.hierarchy.reset().await;
        self.registry.reset().await;
        tracing::info!("Logged out");
    }
}
