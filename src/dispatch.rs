//! Outbound HTTP dispatch for extracted matches.
//!
//! [`MatchPayload::extract`] turns one [`MatchRecord`] into the JSON body of
//! one POST, and [`DispatchClient::dispatch`] performs that POST against the
//! configured endpoint. Dispatch is strictly best-effort: the outcome is
//! classified and returned for logging, never propagated as an error, and
//! there are no retries.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tracing::warn;

use crate::config::RelayConfig;
use crate::error::{ConfigError, ExtractError};
use crate::pattern::MatchRecord;

/// JSON body of one forwarded match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MatchPayload {
    /// Structured shape: `{"code": ..., "price": ...}`.
    Listing {
        /// Extracted listing code.
        code: String,
        /// Extracted price.
        price: i64,
    },
    /// Legacy compatibility shape: `{"data": ...}` with the whole matched
    /// text.
    Raw {
        /// The whole matched text.
        data: String,
    },
}

impl MatchPayload {
    /// Derives a payload from one match record.
    ///
    /// With `legacy` set the whole matched text is forwarded as-is. The
    /// structured shape prefers the `code`/`price` named captures and falls
    /// back to the first two positional captures; a record with neither, or
    /// with a non-integer price, is unusable and must be dropped by the
    /// caller.
    pub fn extract(record: &MatchRecord, legacy: bool) -> Result<Self, ExtractError> {
        if legacy {
            return Ok(Self::Raw {
                data: record.text.clone(),
            });
        }

        let (code, price) = match (record.named.get("code"), record.named.get("price")) {
            (Some(code), Some(price)) => (code.clone(), price.clone()),
            _ => match record.groups.as_slice() {
                [Some(code), Some(price), ..] => (code.clone(), price.clone()),
                _ => return Err(ExtractError::InsufficientCaptures),
            },
        };

        let price = price
            .trim()
            .parse()
            .map_err(|_| ExtractError::PriceNotInteger(price.clone()))?;

        Ok(Self::Listing { code, price })
    }
}

/// Classified result of one dispatch attempt.
///
/// Every outcome is terminal; the pipeline logs it and moves on to the next
/// match regardless of the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The backend answered with a status below 400.
    Success(u16),
    /// The backend answered with an error status.
    RemoteError {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The request never produced a response (connect failure, timeout, ...).
    TransportError(String),
}

impl DispatchOutcome {
    /// Returns `true` for [`DispatchOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Shared HTTP session used by every dispatch.
///
/// Wraps one connection-pooled [`reqwest::Client`] carrying the configured
/// timeout and headers. The client is created when the pipeline activates,
/// shared read-only by all concurrent dispatches, and dropped at terminate.
#[derive(Debug, Clone)]
pub struct DispatchClient {
    client: reqwest::Client,
    api_url: String,
    headers: HeaderMap,
}

impl DispatchClient {
    /// Builds the pooled session from the resolved configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Session(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            headers: build_header_map(&config.headers),
        })
    }

    /// Returns the configured endpoint URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Issues one best-effort POST with the JSON-encoded payload.
    pub async fn dispatch(&self, payload: &MatchPayload) -> DispatchOutcome {
        let result = self
            .client
            .post(&self.api_url)
            .headers(self.headers.clone())
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                if status < 400 {
                    DispatchOutcome::Success(status)
                } else {
                    let body = response.text().await.unwrap_or_default();
                    DispatchOutcome::RemoteError { status, body }
                }
            }
            Err(e) => DispatchOutcome::TransportError(e.to_string()),
        }
    }
}

/// Converts the resolved header list into a reqwest header map.
///
/// Entries that are not representable as HTTP header names or values are
/// skipped with a warning instead of failing the whole session.
fn build_header_map(entries: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in entries {
        match (
            HeaderName::try_from(key.as_str()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(key = %key, "Skipping header with invalid name or value"),
        }
    }
    map
}
