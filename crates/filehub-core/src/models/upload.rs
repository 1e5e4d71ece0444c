use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hierarchy::{ApplicationId, LocationId};

pub type UploadId = i64;

/// Stored file record as listed by `GET /uploads`.
///
/// `download_count` is server-authoritative; the client never increments it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub id: UploadId,
    pub filename: String,
    pub size: u64,
    pub upload_time: String,
    pub user_id: String,
    pub file_location: String,
    #[serde(default)]
    pub download_count: u64,
}

impl Upload {
    /// Parsed upload timestamp. The server emits either RFC 3339 or a naive
    /// `YYYY-MM-DD HH:MM:SS` timestamp in UTC.
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.upload_time)
    }
}

/// Result of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub upload_id: UploadId,
    pub filename: String,
    pub size: u64,
    pub upload_time: String,
    pub file_location: String,
}

/// Multipart upload payload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub content: Bytes,
    pub application_id: ApplicationId,
    pub location_id: LocationId,
    pub additional_path: Option<String>,
}

/// Body of `POST /share/{upload_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareRequest {
    pub shared_with: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_email: Option<bool>,
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
