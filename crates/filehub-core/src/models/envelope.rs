//! Response envelope used by every JSON endpoint of the file service.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// `{ "status": "success" | "error", "data"?: T, "message"?: string }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: EnvelopeStatus,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    /// Unwrap the payload. An error status, or a success without data, is a
    /// server error carrying the envelope message.
    pub fn into_data(self) -> Result<T, ClientError> {
        match (self.status, self.data) {
            (EnvelopeStatus::Success, Some(data)) => Ok(data),
            (EnvelopeStatus::Success, None) => Err(ClientError::server(
                None,
                self.message.or_else(|| Some("Response contained no data".to_string())),
            )),
            (EnvelopeStatus::Error, _) => Err(ClientError::server(None, self.message)),
        }
    }

    /// For status-only endpoints: success yields the optional server message.
    pub fn into_message(self) -> Result<Option<String>, ClientError> {
        match self.status {
            EnvelopeStatus::Success => Ok(self.message),
            EnvelopeStatus::Error => Err(ClientError::server(None, self.message)),
        }
    }
}

/// Server-declared upload configuration (`GET /config`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Application;

    #[test]
    fn success_envelope_unwraps_data() {
        let env: ApiEnvelope<Vec<Application>> = serde_json::from_str(
            r#"{"status":"success","data":[{"id":1,"name":"payroll"}]}"#,
        )
        .unwrap();
        let apps = env.into_data().unwrap();
        assert_eq!(apps[0].name, "payroll");
    }

    #[test]
    fn error_envelope_carries_message() {
        let env: ApiEnvelope<Application> =
            serde_json::from_str(r#"{"status":"error","message":"Name taken"}"#).unwrap();
        match env.into_data() {
            Err(ClientError::Server { message, .. }) => assert_eq!(message, "Name taken"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn status_only_envelope_returns_message() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"status":"success","message":"File shared"}"#).unwrap();
        assert_eq!(env.into_message().unwrap().as_deref(), Some("File shared"));
    }

    #[test]
    fn server_config_defaults_to_no_restriction() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert!(config.allowed_extensions.is_empty());
    }
}
