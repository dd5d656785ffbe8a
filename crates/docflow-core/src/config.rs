//! Configuration module
//!
//! Settings are read once at startup into [`Config`] and passed by reference
//! to every component. Nothing below this module reads the environment.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::constants::{
    documentai_endpoint, DEFAULT_BIGQUERY_ENDPOINT, DEFAULT_MIME_TYPE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TRIGGER_PORT,
};
use crate::storage_types::StorageBackend;

/// Variables that must be present for the pipeline to start.
pub const REQUIRED_VARS: [&str; 8] = [
    "PROJECT_ID",
    "LOCATION",
    "PROCESSOR_ID",
    "BUCKET_NAME",
    "DATASET_ID",
    "TABLE_ID",
    "ORIGEN",
    "DESTINO",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// A credential that must never reach the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Secret(***)")
    }
}

/// Pipeline configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub project_id: String,
    pub location: String,
    pub processor_id: String,
    pub bucket_name: String,
    pub dataset_id: String,
    pub table_id: String,
    /// Inbox prefix (`ORIGEN`), without leading or trailing `/`.
    pub source_prefix: String,
    /// Archive prefix (`DESTINO`), without leading or trailing `/`.
    pub destination_prefix: String,
    pub mime_type: String,
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub documentai_endpoint: String,
    pub bigquery_endpoint: String,
    pub access_token: Option<Secret>,
    pub request_timeout_secs: u64,
    pub max_concurrent_files: usize,
    /// When set, a file whose source object could not be deleted after the
    /// archive copy is not reported as processed.
    pub strict_archive: bool,
    pub port: u16,
    pub log_format: LogFormat,
    pub environment: String,
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(anyhow::anyhow!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ));
        }

        let required = |key: &str| get(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let location = required("LOCATION").to_lowercase();

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::default(),
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.trim().to_lowercase()) {
            None => LogFormat::Pretty,
            Some(v) if v == "pretty" || v == "text" => LogFormat::Pretty,
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) => {
                return Err(anyhow::anyhow!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                    v
                ))
            }
        };

        let config = Config {
            project_id: required("PROJECT_ID"),
            documentai_endpoint: get("DOCUMENTAI_ENDPOINT")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| documentai_endpoint(&location)),
            location,
            processor_id: required("PROCESSOR_ID"),
            bucket_name: required("BUCKET_NAME"),
            dataset_id: required("DATASET_ID"),
            table_id: required("TABLE_ID"),
            source_prefix: normalize_prefix(&required("ORIGEN")),
            destination_prefix: normalize_prefix(&required("DESTINO")),
            mime_type: get("MIME_TYPE")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            storage_backend,
            local_storage_path: get("LOCAL_STORAGE_PATH"),
            bigquery_endpoint: get("BIGQUERY_ENDPOINT")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BIGQUERY_ENDPOINT.to_string()),
            access_token: get("GOOGLE_OAUTH_ACCESS_TOKEN").map(|v| Secret::new(v.trim())),
            request_timeout_secs: parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            max_concurrent_files: parse_or(
                get("MAX_CONCURRENT_FILES"),
                "MAX_CONCURRENT_FILES",
                1,
            )?,
            strict_archive: parse_bool(get("STRICT_ARCHIVE"), "STRICT_ARCHIVE", false)?,
            port: parse_or(get("PORT"), "PORT", DEFAULT_TRIGGER_PORT)?,
            log_format,
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self
            .location
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(anyhow::anyhow!(
                "LOCATION must be a region such as 'us' or 'eu', got '{}'",
                self.location
            ));
        }

        if self.source_prefix.is_empty() || self.destination_prefix.is_empty() {
            return Err(anyhow::anyhow!(
                "ORIGEN and DESTINO must name a folder inside the bucket"
            ));
        }

        if self.source_prefix == self.destination_prefix {
            return Err(anyhow::anyhow!(
                "ORIGEN and DESTINO must differ (both are '{}')",
                self.source_prefix
            ));
        }

        if self.max_concurrent_files == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_FILES must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be at least 1"));
        }

        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when using local storage backend"
            ));
        }

        Ok(())
    }

    /// Fully-qualified processor resource name.
    pub fn processor_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/processors/{}",
            self.project_id, self.location, self.processor_id
        )
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().trim_matches('/').to_string()
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, anyhow::Error> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, v)),
    }
}

fn parse_bool(value: Option<String>, key: &str, default: bool) -> Result<bool, anyhow::Error> {
    match value.map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(anyhow::anyhow!("{} must be true or false, got '{}'", key, v)),
        },
    }
}
