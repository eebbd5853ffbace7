//! Report sink: submits the final answer to the central server.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{FrontierError, Result};

/// Body accepted by the report endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    pub task: String,
    pub apikey: String,
    pub answer: Value,
}

/// Client for the report endpoint
pub struct ReportClient {
    client: Client,
    url: String,
    api_key: String,
}

impl ReportClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FrontierError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn payload(&self, task: &str, answer: Value) -> ReportPayload {
        ReportPayload {
            task: task.to_string(),
            apikey: self.api_key.clone(),
            answer,
        }
    }

    /// POST the payload and return the server's JSON reply.
    ///
    /// A non-success status is an error; the reply body is included in it.
    pub async fn submit(&self, payload: &ReportPayload) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| FrontierError::Report(format!("Network error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        if !status.is_success() {
            return Err(FrontierError::Report(format!("{} {}: {}", self.url, status, body)));
        }

        let reply = serde_json::from_str(&body).unwrap_or(Value::String(body));
        log::info!("Report accepted: {}", reply);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let client = ReportClient::new(
            "https://c3ntrala.ag3nts.org/report",
            "secret",
            Duration::from_secs(5),
        )
        .unwrap();
        let payload = client.payload("loop", json!("ELBLAG"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"task": "loop", "apikey": "secret", "answer": "ELBLAG"})
        );
    }

    #[tokio::test]
    async fn test_unreachable_sink_is_report_error() {
        let client = ReportClient::new("http://127.0.0.1:9/report", "k", Duration::from_secs(1)).unwrap();
        let payload = client.payload("loop", json!("X"));
        let err = client.submit(&payload).await.unwrap_err();
        assert!(matches!(err, FrontierError::Report(_)));
    }
}
