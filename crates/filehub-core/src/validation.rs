//! Client-side validation for uploads and form input.

use std::collections::HashSet;
use std::path::Path;

use crate::models::{ApplicationId, LocationId, ServerConfig, UploadId};

/// Hard upper bound for a single upload (100 MiB, inclusive).
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Errors detected locally before anything is sent to the server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("Invalid file type: {extension}. Allowed types: {}", .allowed.join(", "))]
    DisallowedExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File too large: {size} bytes exceeds the {} MB limit", .max / (1024 * 1024))]
    FileTooLarge { size: u64, max: u64 },

    #[error("Select a file to upload")]
    NoFileSelected,

    #[error("Select an application")]
    NoApplicationSelected,

    #[error("Select a location")]
    NoLocationSelected,

    #[error("Application {0} does not exist")]
    UnknownApplication(ApplicationId),

    #[error("Location {location_id} does not belong to application {application_id}")]
    UnknownLocation {
        application_id: ApplicationId,
        location_id: LocationId,
    },

    #[error("Upload {0} is not in the current listing")]
    UnknownUpload(UploadId),

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(err: validator::ValidationErrors) -> Self {
        ValidationError::Invalid(err.to_string())
    }
}

/// Reject blank input, returning the trimmed value otherwise.
pub fn require_non_empty(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

/// Upload constraints: the server-declared extension set plus the size bound.
///
/// An empty extension set allows every file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl UploadPolicy {
    pub fn new(allowed_extensions: Vec<String>, max_file_size: u64) -> Self {
        let mut seen = HashSet::new();
        let normalized: Vec<String> = allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty() && seen.insert(e.clone()))
            .collect();

        Self {
            allowed_extensions: normalized,
            max_file_size,
        }
    }

    /// Policy used when the server configuration could not be fetched.
    pub fn allow_all() -> Self {
        Self::new(Vec::new(), MAX_UPLOAD_BYTES)
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn allows_all_extensions(&self) -> bool {
        self.allowed_extensions.is_empty()
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate file extension (case-insensitive)
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        if self.allows_all_extensions() {
            return Ok(());
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::DisallowedExtension {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", extension)
                },
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate file size
    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Extension first, then size. The first failure wins.
    pub fn validate(&self, filename: &str, size: u64) -> Result<(), ValidationError> {
        self.validate_extension(filename)?;
        self.validate_size(size)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl From<&ServerConfig> for UploadPolicy {
    fn from(config: &ServerConfig) -> Self {
        Self::new(config.allowed_extensions.clone(), MAX_UPLOAD_BYTES)
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
