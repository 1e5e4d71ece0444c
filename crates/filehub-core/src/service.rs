//! Service traits implemented by the HTTP transport.
//!
//! The synchronization engine only talks to these traits, so it can be driven
//! by the reqwest client in production and by in-memory fakes in tests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ClientError;
use crate::models::{
    Application, ApplicationId, CreateApplicationRequest, CreateLocationRequest, FilterSet,
    HealthStatus, Location, ServerConfig, ShareRequest, Upload, UploadId, UploadReceipt,
    UploadRequest, User,
};

/// Operations of the remote file service.
///
/// Every call that acts on behalf of a user receives that user so the
/// transport can attach the identity header.
#[async_trait]
pub trait FileService: Send + Sync {
    /// `GET /config`
    async fn server_config(&self, user: &User) -> Result<ServerConfig, ClientError>;

    /// `GET /applications`
    async fn list_applications(&self, user: &User) -> Result<Vec<Application>, ClientError>;

    /// `POST /applications`
    async fn create_application(
        &self,
        user: &User,
        request: &CreateApplicationRequest,
    ) -> Result<Application, ClientError>;

    /// `GET /applications/{id}/locations`
    async fn list_locations(
        &self,
        user: &User,
        application_id: ApplicationId,
    ) -> Result<Vec<Location>, ClientError>;

    /// `POST /applications/{id}/locations`
    async fn create_location(
        &self,
        user: &User,
        application_id: ApplicationId,
        request: &CreateLocationRequest,
    ) -> Result<Location, ClientError>;

    /// `POST /upload` (multipart)
    async fn upload(&self, user: &User, request: UploadRequest)
        -> Result<UploadReceipt, ClientError>;

    /// `GET /uploads` with the non-empty filter fields as query parameters
    async fn list_uploads(&self, user: &User, filters: &FilterSet)
        -> Result<Vec<Upload>, ClientError>;

    /// `POST /share/{upload_id}`; returns the server's confirmation message
    async fn share(
        &self,
        user: &User,
        upload_id: UploadId,
        request: &ShareRequest,
    ) -> Result<Option<String>, ClientError>;

    /// `GET /download/{filename}`
    async fn download(&self, user: &User, filename: &str) -> Result<Bytes, ClientError>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthStatus, ClientError>;
}

/// External identity resolution. Called once at session start.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<User, ClientError>;
}
