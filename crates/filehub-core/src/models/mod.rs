//! Domain models and wire types for the FileHub service.

pub mod envelope;
pub mod filter;
pub mod health;
pub mod hierarchy;
pub mod upload;
pub mod user;

pub use envelope::{ApiEnvelope, EnvelopeStatus, ServerConfig};
pub use filter::{FilterField, FilterSet};
pub use health::HealthStatus;
pub use hierarchy::{
    Application, ApplicationId, CreateApplicationRequest, CreateLocationRequest, Location,
    LocationId,
};
pub use upload::{ShareRequest, Upload, UploadId, UploadReceipt, UploadRequest};
pub use user::User;
