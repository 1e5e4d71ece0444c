//! Upload controller
//!
//! Drives one upload attempt at a time through
//! `Idle -> FileSelected -> Validating -> ReadyToSubmit -> Submitting ->
//! Completed | Failed`. A rejected file returns the controller to `Idle`.
//! A failed attempt is published as `Failed` and then falls back to
//! `ReadyToSubmit`, keeping its reason in `last_failure`.

use bytes::Bytes;
use filehub_core::{
    Application, ApplicationId, ClientError, FileService, Location, LocationId, UploadPolicy,
    UploadReceipt, UploadRequest, ValidationError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::hierarchy::HierarchyController;
use crate::log_failure;
use crate::progress::UploadProgress;
use crate::refresh::{RefreshReason, RefreshSubscription};
use crate::session::{Session, SessionTicket};

pub const DEFAULT_PROGRESS_TICK: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Validating,
    ReadyToSubmit,
    Submitting,
    Completed(UploadReceipt),
    /// Carries the message shown to the user. Transient: the controller
    /// moves on to `ReadyToSubmit` with the inputs still selected.
    Failed(String),
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Completed(_) | UploadPhase::Failed(_))
    }
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Bytes(Bytes),
}

/// A file picked for upload. Only its name and size are known until submit.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    name: String,
    size: u64,
    source: FileSource,
}

impl FileCandidate {
    /// Reads metadata only; content is read at submit time.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ValidationError::Invalid(format!("{} is not a file", path.display())).into());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ValidationError::Invalid(format!("Unusable file name: {}", path.display())))?
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            source: FileSource::Bytes(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> Result<Bytes, ClientError> {
        match &self.source {
            FileSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            FileSource::Bytes(content) => Ok(content.clone()),
        }
    }
}

pub struct UploadController {
    hierarchy: Arc<HierarchyController>,
    service: Arc<dyn FileService>,
    session: Arc<Session>,
    subscription: RefreshSubscription,
    progress_tick: Duration,

    /// Session epoch the selections below belong to.
    epoch: u64,
    policy: Option<UploadPolicy>,
    applications: Option<Vec<Application>>,
    applications_stale: bool,

    file: Option<FileCandidate>,
    application_id: Option<ApplicationId>,
    location_id: Option<LocationId>,
    additional_path: Option<String>,
    last_rejection: Option<String>,
    last_failure: Option<String>,

    phase: watch::Sender<UploadPhase>,
    progress: UploadProgress,
}

impl UploadController {
    pub fn new(hierarchy: Arc<HierarchyController>) -> Self {
        let service = hierarchy.service().clone();
        let session = hierarchy.session().clone();
        let subscription = hierarchy.refresh().subscribe();
        let epoch = session.epoch();
        let (phase, _rx) = watch::channel(UploadPhase::Idle);

        Self {
            hierarchy,
            service,
            session,
            subscription,
            progress_tick: DEFAULT_PROGRESS_TICK,
            epoch,
            policy: None,
            applications: None,
            applications_stale: false,
            file: None,
            application_id: None,
            location_id: None,
            additional_path: None,
            last_rejection: None,
            last_failure: None,
            phase,
            progress: UploadProgress::new(),
        }
    }

    pub fn with_progress_tick(mut self, tick: Duration) -> Self {
        self.progress_tick = tick;
        self
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase.borrow().clone()
    }

    pub fn phase_rx(&self) -> watch::Receiver<UploadPhase> {
        self.phase.subscribe()
    }

    pub fn progress(&self) -> u8 {
        self.progress.value()
    }

    pub fn progress_rx(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn selected_file(&self) -> Option<&FileCandidate> {
        self.file.as_ref()
    }

    pub fn application_id(&self) -> Option<ApplicationId> {
        self.application_id
    }

    pub fn location_id(&self) -> Option<LocationId> {
        self.location_id
    }

    pub fn additional_path(&self) -> Option<&str> {
        self.additional_path.as_deref()
    }

    /// Reason the last selected file was rejected, if it was.
    pub fn last_rejection(&self) -> Option<&str> {
        self.last_rejection.as_deref()
    }

    /// Reason the last submission failed, until the next attempt or selection.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn is_submittable(&self) -> bool {
        self.phase() == UploadPhase::ReadyToSubmit
            && self.file.is_some()
            && self.application_id.is_some()
            && self.location_id.is_some()
    }

    /// Applications to offer for selection. Re-fetched after any mutation
    /// signalled through the refresh coordinator.
    pub async fn applications(&mut self) -> Result<Vec<Application>, ClientError> {
        self.sync_session();
        if self.subscription.poll().is_some() {
            self.applications_stale = true;
        }

        match &self.applications {
            Some(applications) if !self.applications_stale => Ok(applications.clone()),
            _ => {
                let applications = self.hierarchy.list_applications().await?;
                self.applications = Some(applications.clone());
                self.applications_stale = false;
                Ok(applications)
            }
        }
    }

    /// Select (or replace) the file and validate it against the upload policy.
    pub async fn select_file(&mut self, candidate: FileCandidate) -> Result<(), ClientError> {
        self.sync_session();
        self.ensure_not_submitting()?;
        let ticket = self.session.ticket().await?;

        self.set_phase(UploadPhase::Validating);
        let policy = match self.policy(&ticket).await {
            Ok(policy) => policy,
            Err(err) => {
                self.recompute_phase();
                return Err(err);
            }
        };

        self.last_failure = None;
        if let Err(err) = policy.validate(&candidate.name, candidate.size) {
            tracing::debug!(file = %candidate.name, size = candidate.size, reason = %err, "File rejected");
            return Err(self.reject(err));
        }

        tracing::debug!(file = %candidate.name, size = candidate.size, "File accepted");
        self.file = Some(candidate);
        self.last_rejection = None;
        self.progress.reset();
        self.recompute_phase();
        Ok(())
    }

    /// Select an application. Clears the location and loads the locations
    /// of the new application.
    pub async fn select_application(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Location>, ClientError> {
        self.sync_session();
        self.ensure_not_submitting()?;

        self.application_id = Some(application_id);
        self.location_id = None;
        self.recompute_phase();

        self.hierarchy.list_locations(application_id).await
    }

    /// Select a location of the selected application.
    pub async fn select_location(&mut self, location_id: LocationId) -> Result<(), ClientError> {
        self.sync_session();
        self.ensure_not_submitting()?;
        let application_id = self
            .application_id
            .ok_or(ValidationError::NoApplicationSelected)?;

        if !self.hierarchy.has_location(application_id, location_id).await {
            return Err(ValidationError::UnknownLocation {
                application_id,
                location_id,
            }
            .into());
        }

        self.location_id = Some(location_id);
        self.recompute_phase();
        Ok(())
    }

    /// Optional sub-path under the location. Blank clears it.
    pub fn set_additional_path(&mut self, path: Option<&str>) {
        self.additional_path = path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
    }

    /// Send the selected file. Not cancellable: once started the attempt
    /// resolves to `Completed` or `Failed` (the transport timeout included).
    pub async fn submit(&mut self) -> Result<UploadReceipt, ClientError> {
        self.sync_session();
        self.ensure_not_submitting()?;

        let file = self.file.clone().ok_or(ValidationError::NoFileSelected)?;
        let application_id = self
            .application_id
            .ok_or(ValidationError::NoApplicationSelected)?;
        let location_id = self.location_id.ok_or(ValidationError::NoLocationSelected)?;
        let ticket = self.session.ticket().await?;

        // The file may have changed on disk since it was selected.
        let content = file.read().await?;
        let size = content.len() as u64;
        let policy = self.policy.clone().unwrap_or_default();
        if let Err(err) = policy.validate_size(size) {
            tracing::warn!(file = %file.name, size, reason = %err, "File rejected at submit");
            return Err(self.reject(err));
        }

        let request = UploadRequest {
            filename: file.name.clone(),
            content,
            application_id,
            location_id,
            additional_path: self.additional_path.clone(),
        };

        tracing::info!(
            file = %file.name,
            size,
            application_id,
            location_id,
            "Upload started"
        );
        self.last_failure = None;
        self.progress.reset();
        self.set_phase(UploadPhase::Submitting);

        let result = self.send(&ticket, request).await;
        match self.session.settle(&ticket, result).await {
            Ok(receipt) => {
                self.progress.complete();
                self.hierarchy.refresh().bump(RefreshReason::UploadCompleted);
                self.file = None;
                self.additional_path = None;
                tracing::info!(
                    upload_id = receipt.upload_id,
                    location = %receipt.file_location,
                    "Upload completed"
                );
                self.set_phase(UploadPhase::Completed(receipt.clone()));
                Ok(receipt)
            }
            Err(ClientError::SessionClosed) => {
                tracing::warn!("Upload finished after the session ended, result discarded");
                self.clear_selections();
                Err(ClientError::SessionClosed)
            }
            Err(err) => {
                log_failure("upload", &err);
                let message = err.user_message();
                self.last_failure = Some(message.clone());
                self.set_phase(UploadPhase::Failed(message));
                self.recompute_phase();
                Err(err)
            }
        }
    }

    /// Drop every selection and cached value.
    pub fn reset(&mut self) {
        self.clear_selections();
        self.epoch = self.session.epoch();
    }

    async fn send(
        &self,
        ticket: &SessionTicket,
        request: UploadRequest,
    ) -> Result<UploadReceipt, ClientError> {
        let service = self.service.clone();
        let user = ticket.user.clone();
        let mut task = tokio::spawn(async move { service.upload(&user, request).await });

        let mut ticker = tokio::time::interval(self.progress_tick);
        ticker.tick().await;

        let joined = loop {
            tokio::select! {
                joined = &mut task => break joined,
                _ = ticker.tick() => self.progress.advance(),
            }
        };

        joined.unwrap_or_else(|err| Err(ClientError::Network(format!("Upload aborted: {}", err))))
    }

    async fn policy(&mut self, ticket: &SessionTicket) -> Result<UploadPolicy, ClientError> {
        if let Some(policy) = &self.policy {
            return Ok(policy.clone());
        }

        let result = self.service.server_config(&ticket.user).await;
        let policy = match self.session.settle(ticket, result).await {
            Ok(config) => UploadPolicy::from(&config),
            Err(err @ (ClientError::SessionClosed | ClientError::Auth(_))) => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "Upload configuration unavailable, allowing all file types");
                UploadPolicy::allow_all()
            }
        };

        self.policy = Some(policy.clone());
        Ok(policy)
    }

    /// Forget everything chosen under a session that has since ended.
    fn sync_session(&mut self) {
        let epoch = self.session.epoch();
        if epoch != self.epoch {
            tracing::debug!(previous = self.epoch, current = epoch, "Session changed, clearing upload state");
            self.clear_selections();
            self.epoch = epoch;
        }
    }

    fn clear_selections(&mut self) {
        self.policy = None;
        self.applications = None;
        self.applications_stale = false;
        self.file = None;
        self.application_id = None;
        self.location_id = None;
        self.additional_path = None;
        self.last_rejection = None;
        self.last_failure = None;
        self.progress.reset();
        self.set_phase(UploadPhase::Idle);
    }

    /// Drop the selected file and go back to `Idle` with the reason.
    fn reject(&mut self, err: ValidationError) -> ClientError {
        self.file = None;
        self.last_rejection = Some(err.to_string());
        self.progress.reset();
        self.set_phase(UploadPhase::Idle);
        err.into()
    }

    fn ensure_not_submitting(&self) -> Result<(), ClientError> {
        if matches!(*self.phase.borrow(), UploadPhase::Submitting) {
            return Err(ValidationError::UploadInProgress.into());
        }
        Ok(())
    }

    fn recompute_phase(&mut self) {
        let next = match (&self.file, self.application_id, self.location_id) {
            (None, _, _) => UploadPhase::Idle,
            (Some(_), Some(_), Some(_)) => UploadPhase::ReadyToSubmit,
            (Some(_), _, _) => UploadPhase::FileSelected,
        };
        self.set_phase(next);
    }

    fn set_phase(&self, phase: UploadPhase) {
        self.phase.send_replace(phase);
    }
}
