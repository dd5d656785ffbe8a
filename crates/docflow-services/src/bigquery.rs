//! BigQuery streaming insert sink

use crate::auth::TokenProvider;
use crate::traits::{InsertError, TableRef, WarehouseError, WarehouseRow, WarehouseSink};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<RowErrors>,
}

#[derive(Debug, Deserialize)]
struct RowErrors {
    #[serde(default)]
    index: u64,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

/// Appends rows through `tabledata.insertAll`.
pub struct BigQuerySink {
    http_client: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
}

impl BigQuerySink {
    pub fn new(
        endpoint: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Result<Self, WarehouseError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn insert_all_url(&self, table: &TableRef) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/datasets/{}/tables/{}/insertAll",
            self.endpoint, table.project_id, table.dataset_id, table.table_id
        )
    }
}

#[async_trait]
impl WarehouseSink for BigQuerySink {
    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[WarehouseRow],
    ) -> Result<Vec<InsertError>, WarehouseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let token = self.tokens.access_token().await?;

        let request_body = json!({
            "rows": rows
                .iter()
                .map(|row| json!({ "insertId": row.insert_id, "json": row.record.to_json() }))
                .collect::<Vec<_>>(),
        });

        let response = self
            .http_client
            .post(self.insert_all_url(table))
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
            return Err(WarehouseError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: InsertAllResponse = response.json().await?;
        let errors: Vec<InsertError> = parsed
            .insert_errors
            .into_iter()
            .flat_map(|row| {
                let index = row.index;
                let errors = if row.errors.is_empty() {
                    vec![ErrorProto::default()]
                } else {
                    row.errors
                };
                errors.into_iter().map(move |e| InsertError {
                    index,
                    reason: e.reason,
                    message: e.message,
                })
            })
            .collect();

        tracing::info!(
            table = %table,
            rows = rows.len(),
            rejected = errors.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "BigQuery insertAll completed"
        );

        Ok(errors)
    }
}
