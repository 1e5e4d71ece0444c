use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{require_non_empty, ValidationError};

pub type ApplicationId = i64;
pub type LocationId = i64;

/// Top-level namespace. Ids are assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
}

/// Named path scoped to one application; the target of uploads.
///
/// The owning application is tracked by id in the cache, not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub location_name: String,
    pub path: String,
}

/// Request DTO for creating a new application
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateApplicationRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Application name must be between 1 and 255 characters"
    ))]
    pub name: String,
}

impl CreateApplicationRequest {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let request = Self {
            name: require_non_empty(name, "name")?,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Request DTO for creating a location under an application
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Location name must be between 1 and 255 characters"
    ))]
    pub location_name: String,
    #[validate(length(min = 1, message = "Path must not be empty"))]
    pub path: String,
}

impl CreateLocationRequest {
    pub fn new(location_name: &str, path: &str) -> Result<Self, ValidationError> {
        let request = Self {
            location_name: require_non_empty(location_name, "location_name")?,
            path: require_non_empty(path, "path")?,
        };
        request.validate()?;
        Ok(request)
    }
}
