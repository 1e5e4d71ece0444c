//! HTTP client for the FileHub file service.
//!
//! Provides a minimal client that attaches the `X-User-Id` identity header,
//! unwraps the `{status, data, message}` envelope, and maps transport and
//! HTTP failures onto `ClientError`. Domain methods live in [`api`] and the
//! identity lookup in [`identity`].

pub mod api;
pub mod identity;

use filehub_core::models::ApiEnvelope;
use filehub_core::{ClientConfig, ClientError, User};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use identity::{IdentityClient, StaticIdentity};

/// Header carrying the acting user's identifier.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// HTTP client for the file service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_identity(&self, request: RequestBuilder, user: Option<&User>) -> RequestBuilder {
        match user {
            Some(user) => request.header(USER_ID_HEADER, user.id()),
            None => request,
        }
    }

    /// GET request with optional query parameters. Unwraps the JSON envelope.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        user: Option<&User>,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let mut request = self.apply_identity(self.client.get(self.build_url(path)), user);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = send(request).await?;
        parse_envelope(response).await?.into_data()
    }

    /// POST JSON body and unwrap the enveloped response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        user: Option<&User>,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.apply_identity(self.client.post(self.build_url(path)).json(body), user);
        let response = send(request).await?;
        parse_envelope(response).await?.into_data()
    }

    /// POST JSON body to a status-only endpoint. Returns the server message.
    pub async fn post_json_status<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        user: Option<&User>,
        body: &B,
    ) -> Result<Option<String>, ClientError> {
        let request = self.apply_identity(self.client.post(self.build_url(path)).json(body), user);
        let response = send(request).await?;
        parse_envelope::<serde_json::Value>(response)
            .await?
            .into_message()
    }

    /// POST multipart form and unwrap the enveloped response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        user: Option<&User>,
        form: reqwest::multipart::Form,
    ) -> Result<T, ClientError> {
        let request =
            self.apply_identity(self.client.post(self.build_url(path)).multipart(form), user);
        let response = send(request).await?;
        parse_envelope(response).await?.into_data()
    }

    /// GET raw bytes (no envelope).
    pub async fn get_bytes(
        &self,
        path: &str,
        user: Option<&User>,
    ) -> Result<bytes::Bytes, ClientError> {
        let request = self.apply_identity(self.client.get(self.build_url(path)), user);
        let response = send(request).await?;
        response.bytes().await.map_err(transport_error)
    }
}

/// Send a request, turning transport failures and non-2xx statuses into
/// `ClientError`s.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(response).await);
    }
    Ok(response)
}

async fn parse_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<ApiEnvelope<T>, ClientError> {
    response
        .json::<ApiEnvelope<T>>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Network("Request timed out".to_string())
    } else if err.is_decode() {
        ClientError::Decode(err.to_string())
    } else {
        ClientError::Network(err.to_string())
    }
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body);

    tracing::debug!(status = %status, message = ?message, "Request failed");

    if status == StatusCode::UNAUTHORIZED {
        return ClientError::Auth(message.unwrap_or_else(|| "Unauthorized".to_string()));
    }
    ClientError::server(Some(status.as_u16()), message)
}

/// Pull `message` (or `error`) out of a JSON error body.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
