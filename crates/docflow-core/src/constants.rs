/// MIME type sent to the extraction service when `MIME_TYPE` is not set.
pub const DEFAULT_MIME_TYPE: &str = "application/pdf";

/// Suffix (matched case-insensitively) of the objects picked up from the inbox prefix.
pub const PDF_EXTENSION: &str = ".pdf";

pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_TRIGGER_PORT: u16 = 8080;

/// Regional Document AI endpoint for a processor location (e.g. `us`, `eu`).
pub fn documentai_endpoint(location: &str) -> String {
    format!("https://{}-documentai.googleapis.com", location)
}
