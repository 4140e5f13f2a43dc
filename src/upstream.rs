//! Client for the third-party weather API.
//!
//! One GET per cycle, no retries. The API key travels in the query string,
//! so transport errors are stripped of their URL before they reach a log.

use reqwest::Client;
use serde_json::Value;

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::models::WeatherObservation;

// ---

/// Used when the payload carries no `message` of its own.
pub const UNEXPECTED_PAYLOAD: &str = "unexpected JSON structure or quota exceeded";

pub struct WeatherClient {
    // ---
    http: Client,
    api_url: String,
    api_key: String,
    city: String,
}

impl WeatherClient {
    // ---
    /// Client for `cfg.api_url` with `cfg.http_timeout` applied to every request.
    ///
    /// # Returns
    /// The client, or the [`reqwest::Error`] raised when the TLS backend
    /// cannot be initialised.
    pub fn new(cfg: &CollectorConfig) -> Result<Self, reqwest::Error> {
        // ---
        let http = Client::builder().timeout(cfg.http_timeout).build()?;

        Ok(Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            city: cfg.city.clone(),
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Fetch the current conditions for the configured city.
    pub async fn fetch(&self) -> Result<WeatherObservation, CollectError> {
        // ---
        tracing::debug!("Requesting current weather for {}", self.city);

        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("format", "json"),
                ("city_name", self.city.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CollectError::Transport(e.without_url()))?;

        let text = response
            .text()
            .await
            .map_err(|e| CollectError::Transport(e.without_url()))?;

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| CollectError::UpstreamData(format!("response is not JSON: {e}")))?;

        tracing::debug!("Upstream raw response: {}", body);

        parse_payload(&body)
    }
}

/// Extract the observation from a decoded response body.
///
/// `results` must be an object holding numeric `temp` and `humidity` and a
/// string `description`. Anything else is reported with the payload's own
/// `message` when it has one.
pub fn parse_payload(body: &Value) -> Result<WeatherObservation, CollectError> {
    // ---
    let Some(results) = body.get("results").filter(|r| r.is_object()) else {
        return Err(CollectError::UpstreamData(upstream_message(body)));
    };

    serde_json::from_value::<WeatherObservation>(results.clone()).map_err(|e| {
        CollectError::UpstreamData(format!("{} ({})", upstream_message(body), e))
    })
}

fn upstream_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or(UNEXPECTED_PAYLOAD)
        .to_string()
}
