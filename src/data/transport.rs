//! HTTP transport for the remote flag service
//!
//! The [`Transport`] trait is the seam between flag resolution and the
//! network. [`HttpTransport`] is the production implementation: it issues
//! authenticated GET requests, decodes JSON and classifies failures into
//! [`FlagError`] kinds.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{FlagSnapshot, FlagValue};
use crate::error::FlagError;

/// Path prefix of the flag API below the server base URL
const API_PREFIX: [&str; 3] = ["api", "v1", "environments"];

/// Source of flag values
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches one flag. `Ok(None)` means the flag exists but its value is null.
    async fn fetch_one(&self, environment: &str, flag: &str)
        -> Result<Option<FlagValue>, FlagError>;

    /// Fetches every flag of an environment in one request
    async fn fetch_all(&self, environment: &str) -> Result<FlagSnapshot, FlagError>;
}

/// Error body returned by the service alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Client for the flag service REST API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpTransport {
    /// Creates a transport for `server_url` using `timeout` for every request
    pub fn new(server_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FlagError> {
        let base_url = Url::parse(server_url)
            .map_err(|e| FlagError::Config(format!("Invalid server URL '{}': {}", server_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FlagError::Config(format!(
                "Server URL '{}' cannot be used as a base URL",
                server_url
            )));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlagError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Builds `<base>/api/v1/environments/<segments...>` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<Response, FlagError> {
        debug!(url = %url, "GET request");
        self.http_client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| FlagError::Network(e.to_string()))
    }

    /// Maps a non-success response onto the error taxonomy
    ///
    /// `flag` is set for single-flag requests, where a 404 may refer to
    /// either the flag or the environment.
    async fn classify_failure(response: Response, environment: &str, flag: Option<&str>) -> FlagError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FlagError::Authentication(message),
            StatusCode::NOT_FOUND => match flag {
                Some(flag) if !message.to_lowercase().contains("environment") => {
                    FlagError::FlagNotFound {
                        flag: flag.to_string(),
                        environment: environment.to_string(),
                    }
                }
                _ => FlagError::EnvironmentNotFound(environment.to_string()),
            },
            _ => FlagError::Service {
                status: Some(status.as_u16()),
                message,
            },
        }
    }

    fn decode_error(status: StatusCode, e: reqwest::Error) -> FlagError {
        if e.is_timeout() {
            return FlagError::Network(e.to_string());
        }
        FlagError::Service {
            status: Some(status.as_u16()),
            message: format!("Failed to parse response: {}", e),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn fetch_one(
        &self,
        environment: &str,
        flag: &str,
    ) -> Result<Option<FlagValue>, FlagError> {
        let response = self
            .get(self.endpoint(&[environment, "flags", flag]))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_failure(response, environment, Some(flag)).await);
        }

        response
            .json::<Option<FlagValue>>()
            .await
            .map_err(|e| Self::decode_error(status, e))
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self, environment: &str) -> Result<FlagSnapshot, FlagError> {
        let response = self.get(self.endpoint(&[environment, "flags"])).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_failure(response, environment, None).await);
        }

        let snapshot = response
            .json::<FlagSnapshot>()
            .await
            .map_err(|e| Self::decode_error(status, e))?;
        debug!(flags = snapshot.len(), "fetched all flags");
        Ok(snapshot)
    }
}
