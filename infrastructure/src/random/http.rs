//! Random numbers from a public HTTP API.
//!
//! The API answers `GET {url}?min=A&max=B&count=1` with a JSON array holding
//! one integer, e.g. `[42]`.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use votemute_application::{NetworkError, RandomSource};

pub struct HttpRandomSource {
    client: reqwest::Client,
    api_url: String,
}

impl HttpRandomSource {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

fn map_transport_error(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout
    } else {
        NetworkError::Unreachable(e.to_string())
    }
}

/// Pull the single integer out of a response body.
fn parse_body(body: &str) -> Result<i64, NetworkError> {
    let values: Vec<i64> = serde_json::from_str(body)
        .map_err(|e| NetworkError::MalformedResponse(e.to_string()))?;
    values
        .first()
        .copied()
        .ok_or_else(|| NetworkError::MalformedResponse("empty array".to_string()))
}

#[async_trait]
impl RandomSource for HttpRandomSource {
    async fn request_random_int(&self, min: i64, max: i64) -> Result<i64, NetworkError> {
        debug!(url = %self.api_url, min, max, "Requesting random number");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("min", min), ("max", max), ("count", 1)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(map_transport_error)?;
        parse_body(&body)
    }
}
