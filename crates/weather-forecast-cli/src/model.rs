use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weather_code;

pub const DEFAULT_FORECAST_DAYS: u32 = 4;
/// Open-Meteo serves at most 16 days ahead.
pub const MAX_FORECAST_DAYS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub country_name: String,
    pub country_code: String,
    pub timezone_name: String,
}

impl GeocodedLocation {
    pub fn timezone(&self) -> Result<Tz, ValidationError> {
        self.timezone_name
            .parse::<Tz>()
            .map_err(|_| ValidationError::UnknownTimezone(self.timezone_name.clone()))
    }

    pub fn display_name(&self) -> String {
        if self.country_name.trim().is_empty() {
            return self.name.clone();
        }
        format!("{}, {}", self.name, self.country_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeResolution {
    OneHour,
    TwoHours,
    ThreeHours,
    FourHours,
    SixHours,
    TwelveHours,
}

impl TimeResolution {
    pub const ALL: [TimeResolution; 6] = [
        Self::OneHour,
        Self::TwoHours,
        Self::ThreeHours,
        Self::FourHours,
        Self::SixHours,
        Self::TwelveHours,
    ];

    pub fn hours(self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::TwoHours => 2,
            Self::ThreeHours => 3,
            Self::FourHours => 4,
            Self::SixHours => 6,
            Self::TwelveHours => 12,
        }
    }

    pub fn step(self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.hours()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::ThreeHours => "3h",
            Self::FourHours => "4h",
            Self::SixHours => "6h",
            Self::TwelveHours => "12h",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastView {
    Summary,
    Detailed(TimeResolution),
}

impl ForecastView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "1d",
            Self::Detailed(resolution) => resolution.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub query: String,
    pub start_date: Option<NaiveDate>,
    pub days: u32,
    pub view: ForecastView,
}

impl ForecastRequest {
    pub fn new(
        query: &str,
        start_date: Option<&str>,
        days: u32,
        view: ForecastView,
    ) -> Result<Self, ValidationError> {
        let query = normalize_query(query)?;
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(ValidationError::InvalidDayCount(days));
        }
        let start_date = start_date.map(parse_start_date).transpose()?;

        Ok(Self {
            query,
            start_date,
            days,
            view,
        })
    }
}

pub fn normalize_query(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(value.to_string())
}

pub fn parse_start_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidStartDate(raw.to_string()))
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("location query must not be empty")]
    EmptyQuery,
    #[error("invalid day count: {0} (expected 1..={max})", max = MAX_FORECAST_DAYS)]
    InvalidDayCount(u32),
    #[error("invalid start date: {0} (expected YYYY-MM-DD)")]
    InvalidStartDate(String),
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error("access key must not be empty")]
    EmptyAccessKey,
}

/// Measurements valid at a single point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastInstant {
    pub time: DateTime<Tz>,
    pub temperature_c: f64,
    pub apparent_temperature_c: f64,
    pub precipitation_mm: f64,
    pub snowfall_cm: f64,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: f64,
    pub weather_code: i32,
}

/// Day aggregates plus the hourly instants whose local date is `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
    pub apparent_temperature_min_c: f64,
    pub apparent_temperature_max_c: f64,
    pub precipitation_sum_mm: f64,
    pub precipitation_hours: f64,
    pub snowfall_sum_cm: f64,
    pub wind_speed_max_ms: f64,
    pub wind_direction_dominant_deg: f64,
    pub weather_code: i32,
    pub sunrise: DateTime<Tz>,
    pub sunset: DateTime<Tz>,
    pub hours: BTreeMap<DateTime<Tz>, ForecastInstant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub timezone: Tz,
    pub days: BTreeMap<NaiveDate, ForecastDay>,
}

impl Forecast {
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.days.keys().next()?;
        let last = self.days.keys().next_back()?;
        Some((*first, *last))
    }

    pub fn instant_count(&self) -> usize {
        self.days.values().map(|day| day.hours.len()).sum()
    }

    /// Keeps only hourly entries listed in `instants`; days are never dropped.
    pub fn retain_instants(mut self, instants: &[DateTime<Tz>]) -> Self {
        let keep: BTreeSet<&DateTime<Tz>> = instants.iter().collect();
        for day in self.days.values_mut() {
            day.hours.retain(|time, _| keep.contains(time));
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutput {
    pub location: GeocodedLocation,
    pub timezone: String,
    pub resolution: String,
    pub days: Vec<ForecastDayOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDayOutput {
    pub date: String,
    pub weather_code: i32,
    pub summary: String,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
    pub apparent_temperature_min_c: f64,
    pub apparent_temperature_max_c: f64,
    pub precipitation_sum_mm: f64,
    pub precipitation_hours: f64,
    pub snowfall_sum_cm: f64,
    pub wind_speed_max_ms: f64,
    pub wind_direction_dominant_deg: f64,
    pub sunrise: String,
    pub sunset: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<ForecastHourOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastHourOutput {
    pub time: String,
    pub weather_code: i32,
    pub summary: String,
    pub temperature_c: f64,
    pub apparent_temperature_c: f64,
    pub precipitation_mm: f64,
    pub snowfall_cm: f64,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: f64,
}

impl ForecastOutput {
    pub fn new(location: &GeocodedLocation, forecast: &Forecast, view: ForecastView) -> Self {
        let include_hours = matches!(view, ForecastView::Detailed(_));
        Self {
            location: location.clone(),
            timezone: forecast.timezone.name().to_string(),
            resolution: view.as_str().to_string(),
            days: forecast
                .days
                .values()
                .map(|day| ForecastDayOutput::new(day, include_hours))
                .collect(),
        }
    }
}

impl ForecastDayOutput {
    fn new(day: &ForecastDay, include_hours: bool) -> Self {
        let hours = if include_hours {
            day.hours.values().map(ForecastHourOutput::from).collect()
        } else {
            Vec::new()
        };

        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            weather_code: day.weather_code,
            summary: weather_code::label(day.weather_code).to_string(),
            temperature_min_c: day.temperature_min_c,
            temperature_max_c: day.temperature_max_c,
            apparent_temperature_min_c: day.apparent_temperature_min_c,
            apparent_temperature_max_c: day.apparent_temperature_max_c,
            precipitation_sum_mm: day.precipitation_sum_mm,
            precipitation_hours: day.precipitation_hours,
            snowfall_sum_cm: day.snowfall_sum_cm,
            wind_speed_max_ms: day.wind_speed_max_ms,
            wind_direction_dominant_deg: day.wind_direction_dominant_deg,
            sunrise: day.sunrise.to_rfc3339(),
            sunset: day.sunset.to_rfc3339(),
            hours,
        }
    }
}

impl From<&ForecastInstant> for ForecastHourOutput {
    fn from(instant: &ForecastInstant) -> Self {
        Self {
            time: instant.time.to_rfc3339(),
            weather_code: instant.weather_code,
            summary: weather_code::label(instant.weather_code).to_string(),
            temperature_c: instant.temperature_c,
            apparent_temperature_c: instant.apparent_temperature_c,
            precipitation_mm: instant.precipitation_mm,
            snowfall_cm: instant.snowfall_cm,
            wind_speed_ms: instant.wind_speed_ms,
            wind_direction_deg: instant.wind_direction_deg,
        }
    }
}
