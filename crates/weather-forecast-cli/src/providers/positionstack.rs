use chrono_tz::Tz;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::GeocodedLocation;

use super::{GeocodingError, RequestFailure, execute_request, extract_error_message};

const PROVIDER_NAME: &str = "positionstack";
// The free plan only serves plain http.
const GEOCODE_ENDPOINT: &str = "http://api.positionstack.com/v1/forward";

#[derive(Debug, Serialize)]
struct GeocodeQuery<'a> {
    access_key: &'a str,
    query: &'a str,
    limit: u8,
    timezone_module: u8,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    timezone_module: Option<TimezoneModule>,
}

#[derive(Debug, Deserialize)]
struct TimezoneModule {
    name: String,
}

pub fn fetch_geocode(
    client: &Client,
    access_key: &str,
    query: &str,
) -> Result<GeocodedLocation, GeocodingError> {
    let params = GeocodeQuery {
        access_key,
        query,
        limit: 1,
        timezone_module: 1,
    };

    tracing::debug!(provider = PROVIDER_NAME, query, "requesting forward geocode");
    let body = execute_request(client.get(GEOCODE_ENDPOINT).query(&params))
        .map_err(classify_failure)?;
    parse_geocode_response(&body, query)
}

fn classify_failure(failure: RequestFailure) -> GeocodingError {
    match failure {
        RequestFailure::Transport(message) => GeocodingError::Transport(message),
        RequestFailure::Status { status, detail } if matches!(status, 401 | 403) => {
            GeocodingError::BadCredential { status, detail }
        }
        RequestFailure::Status { status, detail } => GeocodingError::Http { status, detail },
    }
}

fn parse_geocode_response(body: &str, query: &str) -> Result<GeocodedLocation, GeocodingError> {
    let payload: GeocodeResponse = serde_json::from_str(body)
        .map_err(|error| GeocodingError::InvalidResponse(format!("geocode payload: {error}")))?;

    if let Some(error) = payload.error {
        return Err(classify_error_body(&error, body));
    }

    // An unmatched query comes back as `[]` or `[[]]`.
    let Some(first) = payload.data.into_iter().find(Value::is_object) else {
        return Err(GeocodingError::NoMatch(query.to_string()));
    };

    let result: GeocodeResult = serde_json::from_value(first)
        .map_err(|error| GeocodingError::InvalidResponse(format!("geocode result: {error}")))?;

    let name = result
        .name
        .or(result.label)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            GeocodingError::InvalidResponse("geocode result: empty location name".to_string())
        })?;

    let timezone_name = result
        .timezone_module
        .map(|module| module.name.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            GeocodingError::InvalidResponse("geocode result: missing timezone module".to_string())
        })?;
    if timezone_name.parse::<Tz>().is_err() {
        return Err(GeocodingError::InvalidResponse(format!(
            "geocode result: unknown timezone '{timezone_name}'"
        )));
    }

    Ok(GeocodedLocation {
        latitude: round4(result.latitude),
        longitude: round4(result.longitude),
        name,
        country_name: result.country.unwrap_or_default(),
        country_code: result.country_code.unwrap_or_default(),
        timezone_name,
    })
}

fn classify_error_body(error: &Value, body: &str) -> GeocodingError {
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();
    let detail = extract_error_message(body).unwrap_or_else(|| code.clone());

    if code.contains("access_key") || code.contains("unauthorized") {
        GeocodingError::BadCredential {
            status: 200,
            detail,
        }
    } else {
        GeocodingError::Http {
            status: 200,
            detail,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
