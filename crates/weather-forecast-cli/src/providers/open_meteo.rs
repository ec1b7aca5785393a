use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ForecastFetch, ForecastProviderError, RequestFailure, execute_request};

const PROVIDER_NAME: &str = "open_meteo";
const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
pub const DAILY_FIELDS: &str = "temperature_2m_min,temperature_2m_max,\
apparent_temperature_min,apparent_temperature_max,precipitation_sum,precipitation_hours,\
snowfall_sum,wind_speed_10m_max,wind_direction_10m_dominant,weather_code,sunrise,sunset";
pub const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,precipitation,snowfall,\
wind_speed_10m,wind_direction_10m,weather_code";

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    timezone: &'a str,
    start_date: String,
    end_date: String,
    daily: &'a str,
    hourly: &'a str,
    temperature_unit: &'a str,
    wind_speed_unit: &'a str,
    precipitation_unit: &'a str,
    timeformat: &'a str,
}

/// Forecast payload as served: parallel arrays plus advertised units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawForecast {
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub daily_units: BTreeMap<String, String>,
    #[serde(default)]
    pub hourly_units: BTreeMap<String, String>,
    pub daily: RawDaily,
    pub hourly: RawHourly,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDaily {
    pub time: Vec<i64>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub apparent_temperature_min: Vec<Option<f64>>,
    pub apparent_temperature_max: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
    pub precipitation_hours: Vec<Option<f64>>,
    pub snowfall_sum: Vec<Option<f64>>,
    pub wind_speed_10m_max: Vec<Option<f64>>,
    pub wind_direction_10m_dominant: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i32>>,
    pub sunrise: Vec<Option<i64>>,
    pub sunset: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawHourly {
    pub time: Vec<i64>,
    pub temperature_2m: Vec<Option<f64>>,
    pub apparent_temperature: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
    pub snowfall: Vec<Option<f64>>,
    pub wind_speed_10m: Vec<Option<f64>>,
    pub wind_direction_10m: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i32>>,
}

pub fn fetch_forecast(
    client: &Client,
    fetch: &ForecastFetch,
) -> Result<RawForecast, ForecastProviderError> {
    let query = ForecastQuery {
        latitude: fetch.latitude,
        longitude: fetch.longitude,
        timezone: fetch.timezone.name(),
        start_date: fetch.start_date.format("%Y-%m-%d").to_string(),
        end_date: fetch.end_date.format("%Y-%m-%d").to_string(),
        daily: DAILY_FIELDS,
        hourly: HOURLY_FIELDS,
        temperature_unit: "celsius",
        wind_speed_unit: "ms",
        precipitation_unit: "mm",
        timeformat: "unixtime",
    };

    tracing::debug!(
        provider = PROVIDER_NAME,
        latitude = fetch.latitude,
        longitude = fetch.longitude,
        start_date = %fetch.start_date,
        end_date = %fetch.end_date,
        "requesting forecast"
    );
    let body = execute_request(client.get(FORECAST_ENDPOINT).query(&query)).map_err(
        |failure| match failure {
            RequestFailure::Transport(message) => ForecastProviderError::Transport(message),
            RequestFailure::Status { status, detail } => {
                ForecastProviderError::Http { status, detail }
            }
        },
    )?;
    parse_forecast_response(&body)
}

pub fn parse_forecast_response(body: &str) -> Result<RawForecast, ForecastProviderError> {
    serde_json::from_str(body)
        .map_err(|error| ForecastProviderError::InvalidResponse(format!("forecast payload: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_meteo_parses_positional_payload() {
        let body = r#"{
            "latitude": 52.52,
            "longitude": 13.419998,
            "timezone": "Europe/Berlin",
            "utc_offset_seconds": 3600,
            "daily_units": {"time": "unixtime", "weather_code": "wmo code"},
            "daily": {
                "time": [1704063600],
                "weather_code": [61],
                "sunrise": [1704093240],
                "sunset": [1704121740]
            },
            "hourly_units": {"time": "unixtime", "temperature_2m": "°C"},
            "hourly": {
                "time": [1704063600, 1704067200],
                "temperature_2m": [4.2, null]
            }
        }"#;

        let raw = parse_forecast_response(body).expect("payload");

        assert_eq!(raw.timezone, "Europe/Berlin");
        assert_eq!(raw.daily.time, vec![1_704_063_600]);
        assert_eq!(raw.daily.weather_code, vec![Some(61)]);
        assert!(raw.daily.temperature_2m_min.is_empty());
        assert_eq!(raw.hourly.temperature_2m, vec![Some(4.2), None]);
        assert_eq!(
            raw.daily_units.get("weather_code").map(String::as_str),
            Some("wmo code")
        );
    }

    #[test]
    fn open_meteo_rejects_payload_without_daily_block() {
        let body = r#"{"timezone": "UTC", "hourly": {"time": []}}"#;
        let error = parse_forecast_response(body).expect_err("must fail");

        assert!(
            matches!(error, ForecastProviderError::InvalidResponse(message) if message.contains("daily"))
        );
    }

    #[test]
    fn open_meteo_field_lists_are_comma_separated_without_spaces() {
        for fields in [DAILY_FIELDS, HOURLY_FIELDS] {
            assert!(!fields.contains(' '));
            assert!(fields.split(',').all(|field| !field.is_empty()));
        }
        assert_eq!(DAILY_FIELDS.split(',').count(), 12);
        assert_eq!(HOURLY_FIELDS.split(',').count(), 7);
    }
}
