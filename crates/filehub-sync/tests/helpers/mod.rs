//! Test helpers: an in-memory file service and engine setup.
//!
//! The fake counts calls per operation, can be told to fail an operation, and
//! can hold the next call of an operation until the test releases it, which
//! is how out-of-order completion is reproduced.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use bytes::Bytes;
use filehub_core::{
    Application, ApplicationId, ClientError, CreateApplicationRequest, CreateLocationRequest,
    FileService, FilterSet, HealthStatus, Location, ServerConfig, ShareRequest, Upload, UploadId,
    UploadReceipt, UploadRequest, User,
};
use filehub_sync::{Session, Workspace};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

pub const TEST_USER: &str = "jdoe";

/// How a failing operation fails.
#[derive(Debug, Clone)]
pub enum Failure {
    Server(Option<String>),
    Network,
    Auth,
}

impl Failure {
    fn to_error(&self) -> ClientError {
        match self {
            Failure::Server(message) => ClientError::server(Some(500), message.clone()),
            Failure::Network => ClientError::Network("connection refused".to_string()),
            Failure::Auth => ClientError::Auth("token expired".to_string()),
        }
    }
}

struct HeldCall {
    entered: Arc<Notify>,
    release: oneshot::Receiver<()>,
}

/// Handle on a held call. Dropping it releases the call as well.
pub struct Gate {
    entered: Arc<Notify>,
    release: Option<oneshot::Sender<()>>,
}

impl Gate {
    /// Wait until the held call reached the service.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(mut self) {
        if let Some(tx) = self.release.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Default)]
pub struct FakeService {
    next_id: AtomicI64,
    applications: Mutex<Vec<Application>>,
    locations: Mutex<HashMap<ApplicationId, Vec<Location>>>,
    uploads: Mutex<Vec<Upload>>,
    config: Mutex<Option<ServerConfig>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    held: Mutex<HashMap<&'static str, VecDeque<HeldCall>>>,
    upload_requests: Mutex<Vec<UploadRequest>>,
    share_requests: Mutex<Vec<(UploadId, ShareRequest)>>,
    queried_filters: Mutex<Vec<FilterSet>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            config: Mutex::new(Some(ServerConfig::default())),
            ..Default::default()
        }
    }

    pub fn with_application(self, id: ApplicationId, name: &str) -> Self {
        self.applications.lock().unwrap().push(Application {
            id,
            name: name.to_string(),
        });
        self.locations.lock().unwrap().entry(id).or_default();
        self
    }

    pub fn with_location(self, application_id: ApplicationId, id: i64, name: &str) -> Self {
        self.locations
            .lock()
            .unwrap()
            .entry(application_id)
            .or_default()
            .push(fixtures::location(id, name));
        self
    }

    pub fn with_upload(self, upload: Upload) -> Self {
        self.uploads.lock().unwrap().push(upload);
        self
    }

    pub fn with_allowed_extensions(self, extensions: &[&str]) -> Self {
        *self.config.lock().unwrap() = Some(ServerConfig {
            allowed_extensions: extensions.iter().map(|e| e.to_string()).collect(),
        });
        self
    }

    /// Add a location behind the engine's back.
    pub fn insert_location(&self, application_id: ApplicationId, id: i64, name: &str) {
        self.locations
            .lock()
            .unwrap()
            .entry(application_id)
            .or_default()
            .push(fixtures::location(id, name));
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn fail(&self, operation: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(operation, failure);
    }

    pub fn succeed(&self, operation: &'static str) {
        self.failures.lock().unwrap().remove(operation);
    }

    /// Hold the next call of `operation` until the returned gate is released.
    pub fn hold(&self, operation: &'static str) -> Gate {
        let entered = Arc::new(Notify::new());
        let (tx, rx) = oneshot::channel();
        self.held
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(HeldCall {
                entered: entered.clone(),
                release: rx,
            });
        Gate {
            entered,
            release: Some(tx),
        }
    }

    pub fn download_count(&self, upload_id: UploadId) -> Option<u64> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == upload_id)
            .map(|u| u.download_count)
    }

    pub fn upload_requests(&self) -> Vec<UploadRequest> {
        self.upload_requests.lock().unwrap().clone()
    }

    pub fn share_requests(&self) -> Vec<(UploadId, ShareRequest)> {
        self.share_requests.lock().unwrap().clone()
    }

    pub fn queried_filters(&self) -> Vec<FilterSet> {
        self.queried_filters.lock().unwrap().clone()
    }

    async fn enter(&self, operation: &'static str) -> Result<(), ClientError> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;

        let held = self
            .held
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(|queue| queue.pop_front());
        if let Some(held) = held {
            held.entered.notify_one();
            let _ = held.release.await;
        }

        let failure = self.failures.lock().unwrap().get(operation).cloned();
        match failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl FileService for FakeService {
    async fn server_config(&self, _user: &User) -> Result<ServerConfig, ClientError> {
        self.enter("server_config").await?;
        self.config
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::server(Some(500), None))
    }

    async fn list_applications(&self, _user: &User) -> Result<Vec<Application>, ClientError> {
        self.enter("list_applications").await?;
        Ok(self.applications.lock().unwrap().clone())
    }

    async fn create_application(
        &self,
        _user: &User,
        request: &CreateApplicationRequest,
    ) -> Result<Application, ClientError> {
        self.enter("create_application").await?;
        let application = Application {
            id: self.next_id(),
            name: request.name.clone(),
        };
        self.applications.lock().unwrap().push(application.clone());
        Ok(application)
    }

    async fn list_locations(
        &self,
        _user: &User,
        application_id: ApplicationId,
    ) -> Result<Vec<Location>, ClientError> {
        self.enter("list_locations").await?;
        Ok(self
            .locations
            .lock()
            .unwrap()
            .get(&application_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_location(
        &self,
        _user: &User,
        application_id: ApplicationId,
        request: &CreateLocationRequest,
    ) -> Result<Location, ClientError> {
        self.enter("create_location").await?;
        let location = Location {
            id: self.next_id(),
            location_name: request.location_name.clone(),
            path: request.path.clone(),
        };
        self.locations
            .lock()
            .unwrap()
            .entry(application_id)
            .or_default()
            .push(location.clone());
        Ok(location)
    }

    async fn upload(
        &self,
        user: &User,
        request: UploadRequest,
    ) -> Result<UploadReceipt, ClientError> {
        self.enter("upload").await?;
        let id = self.next_id();
        let file_location = match &request.additional_path {
            Some(sub) => format!("/srv/{}/{}/{}", request.location_id, sub, request.filename),
            None => format!("/srv/{}/{}", request.location_id, request.filename),
        };
        let receipt = UploadReceipt {
            upload_id: id,
            filename: request.filename.clone(),
            size: request.content.len() as u64,
            upload_time: "2024-03-05 10:15:00".to_string(),
            file_location: file_location.clone(),
        };
        self.uploads.lock().unwrap().push(Upload {
            id,
            filename: request.filename.clone(),
            size: receipt.size,
            upload_time: receipt.upload_time.clone(),
            user_id: user.id().to_string(),
            file_location,
            download_count: 0,
        });
        self.upload_requests.lock().unwrap().push(request);
        Ok(receipt)
    }

    async fn list_uploads(
        &self,
        _user: &User,
        filters: &FilterSet,
    ) -> Result<Vec<Upload>, ClientError> {
        self.queried_filters.lock().unwrap().push(filters.clone());
        self.enter("list_uploads").await?;
        let search = filters.search.as_deref().map(str::to_lowercase);
        Ok(self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .filter(|u| match &search {
                Some(s) => u.filename.to_lowercase().contains(s),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn share(
        &self,
        _user: &User,
        upload_id: UploadId,
        request: &ShareRequest,
    ) -> Result<Option<String>, ClientError> {
        self.enter("share").await?;
        self.share_requests
            .lock()
            .unwrap()
            .push((upload_id, request.clone()));
        Ok(Some(format!("File shared with {}", request.shared_with)))
    }

    async fn download(&self, _user: &User, filename: &str) -> Result<Bytes, ClientError> {
        self.enter("download").await?;
        let mut uploads = self.uploads.lock().unwrap();
        let upload = uploads
            .iter_mut()
            .find(|u| u.filename == filename)
            .ok_or_else(|| ClientError::server(Some(404), Some("File not found".to_string())))?;
        upload.download_count += 1;
        Ok(Bytes::from(format!("content of {}", filename)))
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.enter("health").await?;
        Ok(HealthStatus {
            server: "running".to_string(),
            debug_mode: false,
        })
    }
}

/// Engine wired to a fake service with `jdoe` signed in.
pub struct TestEngine {
    pub service: Arc<FakeService>,
    pub workspace: Workspace,
}

pub fn setup_engine(service: FakeService) -> TestEngine {
    let service = Arc::new(service);
    let session = Arc::new(Session::with_user(User::from_user_name(TEST_USER)));
    let workspace = Workspace::with_session(service.clone(), session);
    TestEngine { service, workspace }
}

/// Progress tick short enough that a held upload reaches the in-flight cap
/// quickly.
pub const FAST_TICK: Duration = Duration::from_millis(5);
