//! Client for the external token and container service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service base url '{0}'")]
    InvalidBase(String),
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("token service returned an empty token")]
    EmptyToken,
}

#[async_trait]
pub trait ContainerService: Send + Sync {
    /// `POST` target that provisions a container for `email`.
    fn containers_url(&self, email: &str) -> Url;

    /// Short-lived (about ten minutes) token scoped to `email`.
    async fn authorize(&self, email: &str) -> Result<String, ServiceError>;

    /// Deprovisions the container of `email`.
    async fn delete_container(&self, email: &str, token: &str) -> Result<(), ServiceError>;
}

/// HTTP implementation rooted at the configured service base.
#[derive(Debug, Clone)]
pub struct HttpContainerService {
    client: Client,
    base: Url,
}

impl HttpContainerService {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ServiceError> {
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidBase(base.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::Build)?;
        Ok(Self { client, base })
    }

    /// `{base}/{parts...}` with each part encoded as one path segment.
    fn endpoint(&self, parts: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(parts);
        }
        url
    }
}

#[async_trait]
impl ContainerService for HttpContainerService {
    fn containers_url(&self, email: &str) -> Url {
        self.endpoint(&["containers", email])
    }

    async fn authorize(&self, email: &str) -> Result<String, ServiceError> {
        let url = self.endpoint(&["authorize", email]);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ServiceError::Request {
                url: url.to_string(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        let body = resp.text().await.map_err(|source| ServiceError::Request {
            url: url.to_string(),
            source,
        })?;
        let token = parse_token(&body);
        if token.is_empty() {
            return Err(ServiceError::EmptyToken);
        }
        Ok(token)
    }

    async fn delete_container(&self, email: &str, token: &str) -> Result<(), ServiceError> {
        let url = self.containers_url(email);
        let resp = self
            .client
            .delete(url.clone())
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(|source| ServiceError::Request {
                url: url.to_string(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        Ok(())
    }
}

/// Token bodies come back either bare or as a JSON string literal.
fn parse_token(body: &str) -> String {
    let trimmed = body.trim();
    serde_json::from_str::<String>(trimmed)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}
