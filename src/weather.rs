//! Live temperature lookup from OpenWeatherMap.
//!
//! The network call sits behind [`TemperatureSource`] so the dashboard can
//! be driven by a stub in tests. One request per lookup: no retries and no
//! client-side timeout. Response interpretation is a pure function of the
//! status code and body.

use crate::config::WeatherConfig;
use crate::constants::UNKNOWN_FETCH_ERROR;
use crate::error::{AnalysisError, Result};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// Anything that can report the current temperature of a city
pub trait TemperatureSource {
    fn current_temperature(&self, city: &str) -> impl Future<Output = Result<f64>> + Send;
}

/// Async client for the OpenWeatherMap current-weather endpoint
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    /// Build a client from configuration; fails when no API key is set
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AnalysisError::MissingApiKey)?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: api_key.to_string(),
            units: config.units.clone(),
        })
    }

    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issue one GET for the city's current weather and extract `main.temp`
    pub async fn fetch_current_temperature(&self, city: &str) -> Result<f64> {
        debug!("Requesting current weather for {} from {}", city, self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::fetch_failed(None, format!("request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            AnalysisError::fetch_failed(Some(status), format!("failed to read response: {}", e))
        })?;

        interpret_response(status, &body)
    }
}

impl TemperatureSource for OpenWeatherClient {
    async fn current_temperature(&self, city: &str) -> Result<f64> {
        self.fetch_current_temperature(city).await
    }
}

/// Turn a status code and body into a temperature or a descriptive error
///
/// Success statuses must carry a numeric `main.temp`. Failure statuses
/// surface the body's `message` field, or a generic message when absent.
pub fn interpret_response(status: u16, body: &str) -> Result<f64> {
    let parsed = serde_json::from_str::<Value>(body);

    if (200..300).contains(&status) {
        let value = parsed.map_err(|e| AnalysisError::MalformedResponse {
            reason: format!("body is not JSON: {}", e),
        })?;
        return value
            .pointer("/main/temp")
            .and_then(Value::as_f64)
            .ok_or_else(|| AnalysisError::MalformedResponse {
                reason: "response has no numeric main.temp".to_string(),
            });
    }

    let message = parsed
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| UNKNOWN_FETCH_ERROR.to_string());

    warn!("Weather service returned HTTP {}: {}", status, message);
    Err(AnalysisError::fetch_failed(Some(status), message))
}
