//! Application/Location hierarchy.
//!
//! Mutations follow confirm, invalidate, refetch. Nothing is inserted
//! optimistically: the lists only ever hold what the server returned.

use filehub_core::{
    Application, ApplicationId, ClientError, CreateApplicationRequest, CreateLocationRequest,
    FileService, Location, LocationId, ValidationError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::cache::ResourceCache;
use crate::log_failure;
use crate::refresh::{RefreshCoordinator, RefreshReason};
use crate::session::{Session, SessionTicket};

pub struct HierarchyController {
    service: Arc<dyn FileService>,
    session: Arc<Session>,
    refresh: RefreshCoordinator,
    cache: RwLock<ResourceCache>,
    /// Serializes fetches and mutations per application so concurrent first
    /// reads share one request.
    fetch_locks: Mutex<HashMap<ApplicationId, Arc<Mutex<()>>>>,
    applications: RwLock<Vec<Application>>,
}

impl HierarchyController {
    pub fn new(
        service: Arc<dyn FileService>,
        session: Arc<Session>,
        refresh: RefreshCoordinator,
    ) -> Self {
        Self {
            service,
            session,
            refresh,
            cache: RwLock::new(ResourceCache::new()),
            fetch_locks: Mutex::new(HashMap::new()),
            applications: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn service(&self) -> &Arc<dyn FileService> {
        &self.service
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Fetch the full application list and remember it as the snapshot.
    pub async fn list_applications(&self) -> Result<Vec<Application>, ClientError> {
        let ticket = self.session.ticket().await?;
        let result = self.service.list_applications(&ticket.user).await;
        let applications = self
            .session
            .settle(&ticket, result)
            .await
            .inspect_err(|err| log_failure("list_applications", err))?;

        let mut snapshot = self.applications.write().await;
        if !self.session.is_current(&ticket) {
            return Err(ClientError::SessionClosed);
        }
        *snapshot = applications.clone();

        tracing::debug!(count = applications.len(), "Applications loaded");
        Ok(applications)
    }

    pub async fn create_application(&self, name: &str) -> Result<Application, ClientError> {
        let request = CreateApplicationRequest::new(name)?;
        let ticket = self.session.ticket().await?;

        let result = self.service.create_application(&ticket.user, &request).await;
        let created = self
            .session
            .settle(&ticket, result)
            .await
            .inspect_err(|err| log_failure("create_application", err))?;

        tracing::info!(application_id = created.id, name = %created.name, "Application created");
        self.refresh.bump(RefreshReason::ApplicationCreated);

        if let Err(err) = self.list_applications().await {
            tracing::warn!(error = %err, "Application list refresh failed after create");
        }
        Ok(created)
    }

    /// Locations of one application, fetched on first need and then served
    /// from the cache until a `create_location` for the same application.
    pub async fn list_locations(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Location>, ClientError> {
        let ticket = self.session.ticket().await?;

        if let Some(locations) = self.cache.read().await.get(application_id) {
            tracing::debug!(application_id, "Location cache hit");
            return Ok(locations.to_vec());
        }

        let lock = self.fetch_lock(application_id).await;
        let _guard = lock.lock().await;

        // Another caller may have filled the entry while we waited.
        if let Some(locations) = self.cache.read().await.get(application_id) {
            tracing::debug!(application_id, "Location cache filled by concurrent fetch");
            return Ok(locations.to_vec());
        }

        self.fetch_locations(&ticket, application_id).await
    }

    pub async fn create_location(
        &self,
        application_id: ApplicationId,
        location_name: &str,
        path: &str,
    ) -> Result<Location, ClientError> {
        let request = CreateLocationRequest::new(location_name, path)?;
        let ticket = self.session.ticket().await?;
        self.ensure_application(application_id).await?;

        let lock = self.fetch_lock(application_id).await;
        let _guard = lock.lock().await;

        let result = self
            .service
            .create_location(&ticket.user, application_id, &request)
            .await;
        let created = self
            .session
            .settle(&ticket, result)
            .await
            .inspect_err(|err| log_failure("create_location", err))?;

        tracing::info!(
            application_id,
            location_id = created.id,
            name = %created.location_name,
            "Location created"
        );

        self.cache.write().await.mark_stale(application_id);
        if let Err(err) = self.fetch_locations(&ticket, application_id).await {
            tracing::warn!(application_id, error = %err, "Location refetch failed after create");
            self.cache.write().await.invalidate(application_id);
        }

        self.refresh.bump(RefreshReason::LocationCreated);
        Ok(created)
    }

    /// Last fetched application list.
    pub async fn applications(&self) -> Vec<Application> {
        self.applications.read().await.clone()
    }

    /// Case-insensitive substring match against the application snapshot.
    pub async fn find_applications(&self, fragment: &str) -> Vec<Application> {
        let needle = fragment.trim().to_lowercase();
        self.applications
            .read()
            .await
            .iter()
            .filter(|app| needle.is_empty() || app.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Cached locations without touching the network.
    pub async fn cached_locations(&self, application_id: ApplicationId) -> Option<Vec<Location>> {
        self.cache
            .read()
            .await
            .get(application_id)
            .map(|locations| locations.to_vec())
    }

    pub async fn has_location(&self, application_id: ApplicationId, location_id: LocationId) -> bool {
        self.cache
            .read()
            .await
            .get(application_id)
            .is_some_and(|locations| locations.iter().any(|l| l.id == location_id))
    }

    /// Drop everything learned under the current session.
    pub async fn reset(&self) {
        self.cache.write().await.clear();
        self.applications.write().await.clear();
        self.fetch_locks.lock().await.clear();
        tracing::debug!("Hierarchy state cleared");
    }

    async fn ensure_application(&self, application_id: ApplicationId) -> Result<(), ClientError> {
        if self
            .applications
            .read()
            .await
            .iter()
            .any(|app| app.id == application_id)
        {
            return Ok(());
        }

        let applications = self.list_applications().await?;
        if applications.iter().any(|app| app.id == application_id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownApplication(application_id).into())
        }
    }

    async fn fetch_lock(&self, application_id: ApplicationId) -> Arc<Mutex<()>> {
        self.fetch_locks
            .lock()
            .await
            .entry(application_id)
            .or_default()
            .clone()
    }

    /// Fetch and store. Stores only if the session that issued the request
    /// is still the active one.
    async fn fetch_locations(
        &self,
        ticket: &SessionTicket,
        application_id: ApplicationId,
    ) -> Result<Vec<Location>, ClientError> {
        let result = self
            .service
            .list_locations(&ticket.user, application_id)
            .await;
        let locations = self
            .session
            .settle(ticket, result)
            .await
            .inspect_err(|err| log_failure("list_locations", err))?;

        let mut cache = self.cache.write().await;
        if !self.session.is_current(ticket) {
            return Err(ClientError::SessionClosed);
        }
        cache.store(application_id, locations.clone());

        tracing::debug!(application_id, count = locations.len(), "Locations loaded");
        Ok(locations)
    }
}
