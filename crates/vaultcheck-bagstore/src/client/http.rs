//! HTTP layer: status mapping.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use reqwest::StatusCode;
use tracing::debug;
use vaultcheck_core::{FetchError, FetchResult};

/// How a 404 is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotFound {
    /// Read as an empty body; callers treat that as "not found".
    Empty,
    /// A transport failure like any other non-success status.
    Fail,
}

/// HTTP backend for making requests (holds the reqwest client).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
}

impl HttpBackend {
    /// GET `url` once and return the body as text.
    pub(crate) async fn get_text(&self, url: &str, not_found: NotFound) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                message: format!("request to {} failed: {}", url, e),
            })?;
        let status = response.status();

        match status {
            s if s.is_success() => {
                response.text().await.map_err(|e| FetchError::Network {
                    message: format!("failed to read response body from {}: {}", url, e),
                })
            }

            StatusCode::NOT_FOUND if not_found == NotFound::Empty => {
                debug!(url = %url, "not found (404), reading as empty body");
                Ok(String::new())
            }

            _ => {
                debug!(url = %url, status = status.as_u16(), "unexpected status");
                Err(FetchError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
        }
    }
}
