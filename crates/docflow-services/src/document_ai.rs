//! Document AI online processing client

use crate::auth::TokenProvider;
use crate::traits::{DocumentExtractor, ExtractionError};
use async_trait::async_trait;
use base64::Engine;
use docflow_core::Document;
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    document: Option<Document>,
}

/// Sends raw documents to one processor through the REST `:process` method.
pub struct DocumentAiClient {
    http_client: reqwest::Client,
    endpoint: String,
    processor_name: String,
    tokens: Arc<dyn TokenProvider>,
}

impl Debug for DocumentAiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DocumentAiClient")
            .field("endpoint", &self.endpoint)
            .field("processor_name", &self.processor_name)
            .finish()
    }
}

impl DocumentAiClient {
    /// # Arguments
    /// * `endpoint` - Regional endpoint, e.g. `https://us-documentai.googleapis.com`
    /// * `processor_name` - `projects/{p}/locations/{l}/processors/{id}`
    pub fn new(
        endpoint: impl Into<String>,
        processor_name: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            processor_name: processor_name.into(),
            tokens,
        })
    }

    fn process_url(&self) -> String {
        format!("{}/v1/{}:process", self.endpoint, self.processor_name)
    }
}

#[async_trait]
impl DocumentExtractor for DocumentAiClient {
    async fn process(&self, content: &[u8], mime_type: &str) -> Result<Document, ExtractionError> {
        let start = std::time::Instant::now();
        let token = self.tokens.access_token().await?;

        let request_body = json!({
            "rawDocument": {
                "content": base64::engine::general_purpose::STANDARD.encode(content),
                "mimeType": mime_type,
            }
        });

        let response = self
            .http_client
            .post(self.process_url())
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = status.as_u16(),
                processor = %self.processor_name,
                "Document AI request failed"
            );
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ProcessResponse = response.json().await?;
        let document = parsed.document.ok_or(ExtractionError::MissingDocument)?;

        tracing::info!(
            processor = %self.processor_name,
            size_bytes = content.len(),
            entities = document.entities.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document processed"
        );

        Ok(document)
    }
}
