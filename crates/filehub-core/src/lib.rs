//! FileHub Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! client-side validation shared by every FileHub component, plus the
//! service traits that separate the synchronization engine from the
//! HTTP transport.

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind, LogLevel};
pub use models::{
    Application, ApplicationId, CreateApplicationRequest, CreateLocationRequest, FilterField,
    FilterSet, HealthStatus, Location, LocationId, ServerConfig, ShareRequest, Upload, UploadId,
    UploadReceipt, UploadRequest, User,
};
pub use service::{FileService, IdentityProvider};
pub use validation::{UploadPolicy, ValidationError, MAX_UPLOAD_BYTES};
