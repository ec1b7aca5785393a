use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;

use crate::model::GeocodedLocation;

pub mod open_meteo;
pub mod positionstack;

pub use open_meteo::{RawDaily, RawForecast, RawHourly};

/// Inclusive date range to fetch for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFetch {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timezone: Tz,
}

pub trait GeocodingApi {
    fn geocode(&self, access_key: &str, query: &str) -> Result<GeocodedLocation, GeocodingError>;
}

pub trait ForecastApi {
    fn fetch_forecast(&self, fetch: &ForecastFetch) -> Result<RawForecast, ForecastProviderError>;
}

#[derive(Debug, Clone)]
pub struct HttpProviders {
    client: Client,
}

impl HttpProviders {
    pub fn new(timeout_secs: u64) -> Result<Self, ClientInitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|error| ClientInitError(error.to_string()))?;

        Ok(Self { client })
    }
}

impl GeocodingApi for HttpProviders {
    fn geocode(&self, access_key: &str, query: &str) -> Result<GeocodedLocation, GeocodingError> {
        positionstack::fetch_geocode(&self.client, access_key, query)
    }
}

impl ForecastApi for HttpProviders {
    fn fetch_forecast(&self, fetch: &ForecastFetch) -> Result<RawForecast, ForecastProviderError> {
        open_meteo::fetch_forecast(&self.client, fetch)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to build http client: {0}")]
pub struct ClientInitError(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodingError {
    #[error("geocoding provider rejected the access key ({status}): {detail}")]
    BadCredential { status: u16, detail: String },
    #[error("no location found for '{0}'")]
    NoMatch(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error ({status}): {detail}")]
    Http { status: u16, detail: String },
    #[error("invalid geocoding response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForecastProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error ({status}): {detail}")]
    Http { status: u16, detail: String },
    #[error("invalid forecast response: {0}")]
    InvalidResponse(String),
    #[error(
        "unit contract violated for {section}.{field}: expected {}, got {}",
        display_unit(.expected),
        display_unit(.actual)
    )]
    UnitMismatch {
        section: &'static str,
        field: String,
        expected: Option<String>,
        actual: Option<String>,
    },
}

fn display_unit(unit: &Option<String>) -> String {
    match unit {
        Some(value) => format!("\"{value}\""),
        None => "nothing".to_string(),
    }
}

/// Non-success outcome of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestFailure {
    Transport(String),
    Status { status: u16, detail: String },
}

pub(crate) fn execute_request(request: RequestBuilder) -> Result<String, RequestFailure> {
    let response = request
        .send()
        .map_err(|error| RequestFailure::Transport(error.without_url().to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| RequestFailure::Transport(error.without_url().to_string()))?;

    if status.is_success() {
        return Ok(body);
    }

    let detail = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(RequestFailure::Status {
        status: status.as_u16(),
        detail,
    })
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|json| message_from_json(&json));

    from_json.or_else(|| Some(trimmed.to_string()))
}

fn message_from_json(json: &Value) -> Option<String> {
    for key in ["reason", "message", "detail", "description"] {
        if let Some(message) = non_empty_str(json.get(key)) {
            return Some(message);
        }
    }

    let nested = json.get("error")?;
    if let Some(message) = non_empty_str(Some(nested)) {
        return Some(message);
    }
    ["message", "info"]
        .into_iter()
        .find_map(|key| non_empty_str(nested.get(key)))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_message_prefers_reason() {
        let body = r#"{"error": true, "reason": "Parameter 'start_date' is out of allowed range"}"#;
        assert_eq!(
            extract_error_message(body),
            Some("Parameter 'start_date' is out of allowed range".to_string())
        );
    }

    #[test]
    fn extract_error_message_reads_nested_error_object() {
        let body = r#"{"error": {"code": "invalid_access_key", "message": "You have not supplied a valid API Access Key."}}"#;
        assert_eq!(
            extract_error_message(body),
            Some("You have not supplied a valid API Access Key.".to_string())
        );
    }

    #[test]
    fn extract_error_message_falls_back_to_raw_body() {
        assert_eq!(
            extract_error_message("  gateway timeout  "),
            Some("gateway timeout".to_string())
        );
        assert_eq!(extract_error_message("   "), None);
    }

    #[test]
    fn unit_mismatch_message_names_field_and_units() {
        let error = ForecastProviderError::UnitMismatch {
            section: "daily_units",
            field: "temperature_2m_min".to_string(),
            expected: Some("°C".to_string()),
            actual: Some("°F".to_string()),
        };

        assert_eq!(
            error.to_string(),
            "unit contract violated for daily_units.temperature_2m_min: expected \"°C\", got \"°F\""
        );
    }
}
