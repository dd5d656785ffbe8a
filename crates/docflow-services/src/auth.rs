//! OAuth access tokens for Google APIs
//!
//! Two sources: a static token handed in through the environment, or the
//! metadata server available on GCE, GKE and Cloud Run.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use docflow_core::Secret;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

pub const METADATA_BASE_URL: &str = "http://metadata.google.internal";
const METADATA_TOKEN_PATH: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Metadata server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Metadata server returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Bearer token valid for at least the next request.
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Fixed token, typically `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Secret,
}

impl StaticTokenProvider {
    pub fn new(token: Secret) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.expose().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: DateTime<Utc>,
}

/// Service-account token from the instance metadata server, cached until
/// shortly before it expires.
pub struct MetadataTokenProvider {
    http_client: reqwest::Client,
    base_url: String,
    cached: RwLock<Option<CachedToken>>,
}

impl MetadataTokenProvider {
    pub fn new() -> Result<Self, AuthError> {
        Self::with_base_url(METADATA_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cached: RwLock::new(None),
        })
    }

    async fn fetch(&self) -> Result<CachedToken, AuthError> {
        let url = format!("{}{}", self.base_url, METADATA_TOKEN_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: MetadataToken = response.json().await?;
        let lifetime = (token.expires_in - EXPIRY_MARGIN_SECS).max(0);

        tracing::debug!(expires_in = token.expires_in, "Fetched metadata access token");

        Ok(CachedToken {
            token: token.access_token,
            refresh_at: Utc::now() + ChronoDuration::seconds(lifetime),
        })
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cached = self.cached.read().await;
            if let Some(cached) = cached.as_ref() {
                if Utc::now() < cached.refresh_at {
                    return Ok(cached.token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(current) = cached.as_ref() {
            if Utc::now() < current.refresh_at {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_token() {
        let provider = StaticTokenProvider::new(Secret::new("ya29.test"));
        assert_eq!(provider.access_token().await.unwrap(), "ya29.test");
    }

    #[tokio::test]
    async fn metadata_token_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", METADATA_TOKEN_PATH)
            .match_header("Metadata-Flavor", "Google")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.meta","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let provider = MetadataTokenProvider::with_base_url(server.url()).unwrap();
        assert_eq!(provider.access_token().await.unwrap(), "ya29.meta");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.meta");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn short_lived_token_is_refetched() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", METADATA_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.short","expires_in":30}"#)
            .expect(2)
            .create_async()
            .await;

        let provider = MetadataTokenProvider::with_base_url(server.url()).unwrap();
        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn metadata_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", METADATA_TOKEN_PATH)
            .with_status(404)
            .with_body("not on GCE")
            .create_async()
            .await;

        let provider = MetadataTokenProvider::with_base_url(server.url()).unwrap();
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Api { status: 404, .. }));
    }
}
