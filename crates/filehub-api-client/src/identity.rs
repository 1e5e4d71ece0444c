//! Identity service client.
//!
//! The identity service answers a bare `GET` on its base URL with the profile
//! of the calling user. There is no envelope around the response.

use async_trait::async_trait;
use filehub_core::{ClientConfig, ClientError, IdentityProvider, User};
use reqwest::Client;
use std::time::Duration;

use crate::{send, transport_error};

#[derive(Clone, Debug)]
pub struct IdentityClient {
    client: Client,
    url: String,
}

impl IdentityClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.user_api_url.clone(), config.identity_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn current_user(&self) -> Result<User, ClientError> {
        let response = send(self.client.get(&self.url)).await?;
        let user: User = response.json().await.map_err(transport_error)?;

        if user.user_name.trim().is_empty() {
            return Err(ClientError::Auth(
                "Identity service returned a profile without a user name".to_string(),
            ));
        }

        tracing::debug!(user = %user.user_name, "Resolved current user");
        Ok(user)
    }
}

/// Fixed identity, used when the user is configured explicitly.
#[derive(Clone, Debug)]
pub struct StaticIdentity(pub User);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<User, ClientError> {
        Ok(self.0.clone())
    }
}
