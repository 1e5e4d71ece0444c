//! File registry view
//!
//! The filterable list of uploads. Queries are last-request-wins: a response
//! is dropped if a newer query was issued while it was in flight.

use chrono::NaiveDate;
use filehub_core::validation::require_non_empty;
use filehub_core::{
    ApplicationId, ClientError, FileService, FilterField, FilterSet, LocationId, ShareRequest,
    Upload, UploadId, ValidationError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::log_failure;
use crate::refresh::{RefreshCoordinator, RefreshSubscription};
use crate::session::Session;

/// What happened to the displayed list after a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Applied { count: usize },
    /// A newer query was issued before this one returned.
    Superseded,
    /// No session: the list was emptied.
    SignedOut,
}

#[derive(Debug, Default)]
struct RegistryState {
    uploads: Vec<Upload>,
    filters: FilterSet,
    search_draft: String,
    loaded: bool,
    /// A mutation was signalled and no re-query has applied since.
    refresh_pending: bool,
}

pub struct RegistryView {
    service: Arc<dyn FileService>,
    session: Arc<Session>,
    state: Mutex<RegistryState>,
    latest_request: AtomicU64,
    subscription: Mutex<RefreshSubscription>,
}

impl RegistryView {
    pub fn new(
        service: Arc<dyn FileService>,
        session: Arc<Session>,
        refresh: &RefreshCoordinator,
    ) -> Self {
        Self {
            service,
            session,
            state: Mutex::new(RegistryState::default()),
            latest_request: AtomicU64::new(0),
            subscription: Mutex::new(refresh.subscribe()),
        }
    }

    /// Run a query with the given filters and make them the active ones.
    pub async fn query(&self, filters: FilterSet) -> Result<QueryOutcome, ClientError> {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().await.filters = filters.clone();

        let ticket = match self.session.ticket().await {
            Ok(ticket) => ticket,
            Err(_) => {
                let mut state = self.state.lock().await;
                state.uploads.clear();
                state.loaded = false;
                return Ok(QueryOutcome::SignedOut);
            }
        };

        tracing::debug!(request_id, filters = ?filters.to_query_pairs(), "Querying uploads");
        let result = self.service.list_uploads(&ticket.user, &filters).await;
        let settled = self.session.settle(&ticket, result).await;

        let mut state = self.state.lock().await;
        if self.latest_request.load(Ordering::SeqCst) != request_id {
            tracing::debug!(request_id, "Discarding superseded upload listing");
            return Ok(QueryOutcome::Superseded);
        }

        match settled {
            Ok(uploads) => {
                let count = uploads.len();
                state.uploads = uploads;
                state.loaded = true;
                Ok(QueryOutcome::Applied { count })
            }
            Err(ClientError::SessionClosed) => {
                state.uploads.clear();
                state.loaded = false;
                Ok(QueryOutcome::SignedOut)
            }
            Err(err) if err.is_auth() => {
                state.uploads.clear();
                state.loaded = false;
                Err(err)
            }
            Err(err) => {
                log_failure("list_uploads", &err);
                Err(err)
            }
        }
    }

    /// Re-run the active query.
    pub async fn refresh(&self) -> Result<QueryOutcome, ClientError> {
        let filters = self.state.lock().await.filters.clone();
        self.query(filters).await
    }

    /// Re-run the active query if a mutation happened since the last look,
    /// or if nothing was loaded yet.
    ///
    /// A signalled change stays pending until a re-query is applied.
    pub async fn refresh_if_stale(&self) -> Result<Option<QueryOutcome>, ClientError> {
        let changed = self.subscription.lock().await.poll().is_some();
        let needed = {
            let mut state = self.state.lock().await;
            state.refresh_pending |= changed;
            state.refresh_pending || !state.loaded
        };
        if !needed {
            return Ok(None);
        }

        let outcome = self.refresh().await?;
        if matches!(outcome, QueryOutcome::Applied { .. }) {
            self.state.lock().await.refresh_pending = false;
        }
        Ok(Some(outcome))
    }

    pub async fn set_from_date(&self, date: Option<NaiveDate>) -> Result<QueryOutcome, ClientError> {
        self.update_filters(|filters| filters.from_date = date).await
    }

    pub async fn set_to_date(&self, date: Option<NaiveDate>) -> Result<QueryOutcome, ClientError> {
        self.update_filters(|filters| filters.to_date = date).await
    }

    /// Changing the application drops a location filter that belonged to the
    /// previous one.
    pub async fn set_application_filter(
        &self,
        application_id: Option<ApplicationId>,
    ) -> Result<QueryOutcome, ClientError> {
        self.update_filters(|filters| {
            if filters.application_id != application_id {
                filters.location_id = None;
            }
            filters.application_id = application_id;
        })
        .await
    }

    pub async fn set_location_filter(
        &self,
        location_id: Option<LocationId>,
    ) -> Result<QueryOutcome, ClientError> {
        self.update_filters(|filters| filters.location_id = location_id)
            .await
    }

    /// Edit the search text without querying.
    pub async fn set_search_draft(&self, text: &str) {
        self.state.lock().await.search_draft = text.to_string();
    }

    /// Apply the drafted search text.
    pub async fn submit_search(&self) -> Result<QueryOutcome, ClientError> {
        let draft = self.state.lock().await.search_draft.trim().to_string();
        self.update_filters(|filters| {
            filters.search = if draft.is_empty() { None } else { Some(draft) };
        })
        .await
    }

    pub async fn clear_filter(&self, field: FilterField) -> Result<QueryOutcome, ClientError> {
        if field == FilterField::Search {
            self.state.lock().await.search_draft.clear();
        }
        self.update_filters(|filters| {
            filters.clear(field);
            if field == FilterField::Application {
                filters.location_id = None;
            }
        })
        .await
    }

    pub async fn clear_all_filters(&self) -> Result<QueryOutcome, ClientError> {
        self.state.lock().await.search_draft.clear();
        self.query(FilterSet::default()).await
    }

    /// Download a listed upload into `dest_dir` and re-query so the server's
    /// download count shows up. A failed download changes nothing locally.
    pub async fn download(
        &self,
        upload_id: UploadId,
        dest_dir: impl AsRef<Path>,
    ) -> Result<PathBuf, ClientError> {
        let upload = self
            .find(upload_id)
            .await
            .ok_or(ValidationError::UnknownUpload(upload_id))?;
        let ticket = self.session.ticket().await?;

        let result = self.service.download(&ticket.user, &upload.filename).await;
        let content = self
            .session
            .settle(&ticket, result)
            .await
            .inspect_err(|err| log_failure("download", err))?;

        // The server has counted the download even if saving it fails.
        let target = dest_dir.as_ref().join(local_file_name(&upload.filename));
        let written = tokio::fs::write(&target, &content).await;

        if let Err(err) = self.refresh().await {
            tracing::warn!(error = %err, "Upload list refresh failed after download");
        }

        if let Err(err) = written {
            tracing::error!(upload_id, path = %target.display(), error = %err, "Saving download failed");
            return Err(err.into());
        }
        tracing::info!(
            upload_id,
            bytes = content.len(),
            path = %target.display(),
            "File downloaded"
        );
        Ok(target)
    }

    /// Share an upload with another user. The list is not re-fetched.
    pub async fn share(
        &self,
        upload_id: UploadId,
        recipient: &str,
        send_email: Option<bool>,
    ) -> Result<Option<String>, ClientError> {
        let request = ShareRequest {
            shared_with: require_non_empty(recipient, "shared_with")?,
            send_email,
        };
        let ticket = self.session.ticket().await?;

        let result = self.service.share(&ticket.user, upload_id, &request).await;
        let message = self
            .session
            .settle(&ticket, result)
            .await
            .inspect_err(|err| log_failure("share", err))?;

        tracing::info!(upload_id, shared_with = %request.shared_with, "Upload shared");
        Ok(message)
    }

    pub async fn uploads(&self) -> Vec<Upload> {
        self.state.lock().await.uploads.clone()
    }

    pub async fn find(&self, upload_id: UploadId) -> Option<Upload> {
        self.state
            .lock()
            .await
            .uploads
            .iter()
            .find(|upload| upload.id == upload_id)
            .cloned()
    }

    pub async fn filters(&self) -> FilterSet {
        self.state.lock().await.filters.clone()
    }

    pub async fn search_draft(&self) -> String {
        self.state.lock().await.search_draft.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    /// Forget the list and filters. In-flight queries are superseded.
    pub async fn reset(&self) {
        self.latest_request.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().await = RegistryState::default();
        tracing::debug!("Registry state cleared");
    }

    async fn update_filters(
        &self,
        apply: impl FnOnce(&mut FilterSet),
    ) -> Result<QueryOutcome, ClientError> {
        let filters = {
            let state = self.state.lock().await;
            let mut filters = state.filters.clone();
            apply(&mut filters);
            filters
        };
        self.query(filters).await
    }
}

/// Final path component of a server file name, so a crafted name cannot
/// escape the destination directory.
fn local_file_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("download")
        .to_string()
}
