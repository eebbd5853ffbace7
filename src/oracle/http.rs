use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use super::{flags::scan_flags, parse::neighbors_from_response, OracleError, RelationOracle};
use crate::error::{FrontierError, Result};
use crate::search::Kind;

/// Request body shared by the `/people` and `/places` endpoints
#[derive(Serialize)]
struct LookupRequest<'a> {
    apikey: &'a str,
    query: &'a str,
}

/// HTTP client for the people/places lookup API
///
/// Querying a person hits `<base>/people` and returns places; querying a
/// place hits `<base>/places` and returns people. Rate limiting and server
/// errors are retried with exponential backoff.
pub struct HttpOracle {
    client: Client,
    base_url: Url,
    api_key: String,
    max_retries: usize,
    initial_backoff: Duration,
    flags: Mutex<Vec<String>>,
}

impl HttpOracle {
    /// Create a new oracle client
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://c3ntrala.ag3nts.org`
    /// * `api_key` - Key sent as `apikey` in every request body
    /// * `timeout` - Per-request HTTP timeout
    /// * `max_retries` - Retry attempts for retryable failures
    pub fn new(base_url: &str, api_key: String, timeout: Duration, max_retries: usize) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| FrontierError::Config(format!("invalid api.base_url '{}': {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FrontierError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            max_retries,
            initial_backoff: Duration::from_millis(500),
            flags: Mutex::new(Vec::new()),
        })
    }

    /// Override the first retry delay (doubles on every further attempt).
    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Endpoint answering queries about nodes of `kind`.
    pub fn endpoint(&self, kind: Kind) -> Result<Url> {
        let path = match kind {
            Kind::Person => "people",
            Kind::Place => "places",
        };
        self.base_url
            .join(path)
            .map_err(|e| FrontierError::Config(format!("invalid endpoint: {}", e)))
    }

    /// Single request, no retry. Returns the decoded JSON body.
    async fn fetch(&self, endpoint: &Url, query: &str) -> std::result::Result<Value, OracleError> {
        let request = LookupRequest {
            apikey: &self.api_key,
            query,
        };

        let response = self
            .client
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Network(format!("request timed out: {}", e))
                } else {
                    OracleError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Network(format!("failed to read body: {}", e)))?;

        // Error replies carry a free-text message, never a name list.
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| OracleError::Parse(e.to_string()))
    }

    fn remember_flags(&self, value: &Value) {
        let found = scan_flags(value);
        if found.is_empty() {
            return;
        }
        log::info!("Possible flags in oracle response: {:?}", found);
        if let Ok(mut flags) = self.flags.lock() {
            for flag in found {
                if !flags.contains(&flag) {
                    flags.push(flag);
                }
            }
        }
    }
}

#[async_trait]
impl RelationOracle for HttpOracle {
    async fn query(&self, kind: Kind, query: &str) -> std::result::Result<Vec<String>, OracleError> {
        let endpoint = self
            .endpoint(kind)
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = self.initial_backoff;

        loop {
            match self.fetch(&endpoint, query).await {
                Ok(value) => {
                    log::debug!(
                        "{} {} -> {} (took {:?}, attempt {})",
                        endpoint,
                        query,
                        value,
                        start.elapsed(),
                        attempt + 1
                    );
                    self.remember_flags(&value);
                    return Ok(neighbors_from_response(&value));
                }
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    log::warn!(
                        "Retry {}/{} for {} '{}' after error: {}",
                        attempt + 1,
                        self.max_retries,
                        kind,
                        query,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn flags(&self) -> Vec<String> {
        self.flags.lock().map(|f| f.clone()).unwrap_or_default()
    }
}
