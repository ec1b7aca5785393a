//! Normalization of the positional Open-Meteo payload into [`Forecast`].
//!
//! The provider returns one array per field; the i-th elements across arrays
//! jointly describe one date (daily) or one instant (hourly). Nothing in the
//! payload is trusted until the advertised units, the array lengths and the
//! covered dates have been checked against the request.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate};
use chrono_tz::Tz;
use thiserror::Error;

use crate::model::{Forecast, ForecastDay, ForecastInstant};
use crate::providers::{ForecastProviderError, RawDaily, RawForecast, RawHourly};

pub const EXPECTED_DAILY_UNITS: &[(&str, &str)] = &[
    ("time", "unixtime"),
    ("temperature_2m_min", "°C"),
    ("temperature_2m_max", "°C"),
    ("apparent_temperature_min", "°C"),
    ("apparent_temperature_max", "°C"),
    ("precipitation_sum", "mm"),
    ("precipitation_hours", "h"),
    ("snowfall_sum", "cm"),
    ("wind_speed_10m_max", "m/s"),
    ("wind_direction_10m_dominant", "°"),
    ("weather_code", "wmo code"),
    ("sunrise", "unixtime"),
    ("sunset", "unixtime"),
];

pub const EXPECTED_HOURLY_UNITS: &[(&str, &str)] = &[
    ("time", "unixtime"),
    ("temperature_2m", "°C"),
    ("apparent_temperature", "°C"),
    ("precipitation", "mm"),
    ("snowfall", "cm"),
    ("wind_speed_10m", "m/s"),
    ("wind_direction_10m", "°"),
    ("weather_code", "wmo code"),
];

const DAILY: &str = "daily";
const HOURLY: &str = "hourly";

/// Provider data that contradicts the request; upstream contract drift.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataIntegrityError {
    #[error("forecast timezone mismatch: requested {expected}, provider returned '{actual}'")]
    TimezoneMismatch { expected: String, actual: String },
    #[error("{section}.{field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        section: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{section}.{field}[{index}] is null")]
    MissingValue {
        section: &'static str,
        field: &'static str,
        index: usize,
    },
    #[error("{section}.{field}[{index}] holds an unrepresentable timestamp {value}")]
    InvalidTimestamp {
        section: &'static str,
        field: &'static str,
        index: usize,
        value: i64,
    },
    #[error("daily dates {actual:?} do not match the requested range {expected:?}")]
    DateRangeMismatch {
        expected: Vec<NaiveDate>,
        actual: Vec<NaiveDate>,
    },
    #[error("hourly instant {0} falls outside the requested date range")]
    InstantOutsideRange(String),
    #[error("hourly instant {0} appears more than once")]
    DuplicateInstant(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error(transparent)]
    Provider(#[from] ForecastProviderError),
    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}

pub fn normalize(
    raw: RawForecast,
    start_date: NaiveDate,
    end_date: NaiveDate,
    timezone: Tz,
) -> Result<Forecast, NormalizeError> {
    validate_units("daily_units", &raw.daily_units, EXPECTED_DAILY_UNITS)?;
    validate_units("hourly_units", &raw.hourly_units, EXPECTED_HOURLY_UNITS)?;

    if raw.timezone != timezone.name() {
        return Err(DataIntegrityError::TimezoneMismatch {
            expected: timezone.name().to_string(),
            actual: raw.timezone,
        }
        .into());
    }

    let expected_dates = inclusive_dates(start_date, end_date);
    let mut days = build_days(&raw.daily, timezone, &expected_dates)?;
    bucket_hours(&raw.hourly, timezone, &mut days)?;

    Ok(Forecast { timezone, days })
}

fn validate_units(
    section: &'static str,
    actual: &BTreeMap<String, String>,
    expected: &[(&str, &str)],
) -> Result<(), ForecastProviderError> {
    for (field, unit) in expected {
        let found = actual.get(*field);
        if found.map(String::as_str) != Some(*unit) {
            return Err(ForecastProviderError::UnitMismatch {
                section,
                field: (*field).to_string(),
                expected: Some((*unit).to_string()),
                actual: found.cloned(),
            });
        }
    }

    if let Some((field, unit)) = actual
        .iter()
        .find(|(field, _)| !expected.iter().any(|(known, _)| known == field))
    {
        return Err(ForecastProviderError::UnitMismatch {
            section,
            field: field.clone(),
            expected: None,
            actual: Some(unit.clone()),
        });
    }

    Ok(())
}

fn inclusive_dates(start_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut cursor = Some(start_date);
    while let Some(date) = cursor.filter(|date| *date <= end_date) {
        dates.push(date);
        cursor = date.checked_add_days(Days::new(1));
    }
    dates
}

fn build_days(
    daily: &RawDaily,
    timezone: Tz,
    expected_dates: &[NaiveDate],
) -> Result<BTreeMap<NaiveDate, ForecastDay>, DataIntegrityError> {
    let length = daily.time.len();
    check_lengths(
        DAILY,
        length,
        &[
            ("temperature_2m_min", daily.temperature_2m_min.len()),
            ("temperature_2m_max", daily.temperature_2m_max.len()),
            ("apparent_temperature_min", daily.apparent_temperature_min.len()),
            ("apparent_temperature_max", daily.apparent_temperature_max.len()),
            ("precipitation_sum", daily.precipitation_sum.len()),
            ("precipitation_hours", daily.precipitation_hours.len()),
            ("snowfall_sum", daily.snowfall_sum.len()),
            ("wind_speed_10m_max", daily.wind_speed_10m_max.len()),
            (
                "wind_direction_10m_dominant",
                daily.wind_direction_10m_dominant.len(),
            ),
            ("weather_code", daily.weather_code.len()),
            ("sunrise", daily.sunrise.len()),
            ("sunset", daily.sunset.len()),
        ],
    )?;

    let dates = daily
        .time
        .iter()
        .enumerate()
        .map(|(index, value)| Ok(local_time(timezone, DAILY, "time", index, *value)?.date_naive()))
        .collect::<Result<Vec<_>, DataIntegrityError>>()?;

    if dates != expected_dates {
        return Err(DataIntegrityError::DateRangeMismatch {
            expected: expected_dates.to_vec(),
            actual: dates,
        });
    }

    let mut days = BTreeMap::new();
    for (index, date) in dates.into_iter().enumerate() {
        let sunrise = value_at(DAILY, "sunrise", &daily.sunrise, index)?;
        let sunset = value_at(DAILY, "sunset", &daily.sunset, index)?;

        let day = ForecastDay {
            date,
            temperature_min_c: value_at(
                DAILY,
                "temperature_2m_min",
                &daily.temperature_2m_min,
                index,
            )?,
            temperature_max_c: value_at(
                DAILY,
                "temperature_2m_max",
                &daily.temperature_2m_max,
                index,
            )?,
            apparent_temperature_min_c: value_at(
                DAILY,
                "apparent_temperature_min",
                &daily.apparent_temperature_min,
                index,
            )?,
            apparent_temperature_max_c: value_at(
                DAILY,
                "apparent_temperature_max",
                &daily.apparent_temperature_max,
                index,
            )?,
            precipitation_sum_mm: value_at(
                DAILY,
                "precipitation_sum",
                &daily.precipitation_sum,
                index,
            )?,
            precipitation_hours: value_at(
                DAILY,
                "precipitation_hours",
                &daily.precipitation_hours,
                index,
            )?,
            snowfall_sum_cm: value_at(DAILY, "snowfall_sum", &daily.snowfall_sum, index)?,
            wind_speed_max_ms: value_at(
                DAILY,
                "wind_speed_10m_max",
                &daily.wind_speed_10m_max,
                index,
            )?,
            wind_direction_dominant_deg: value_at(
                DAILY,
                "wind_direction_10m_dominant",
                &daily.wind_direction_10m_dominant,
                index,
            )?,
            weather_code: value_at(DAILY, "weather_code", &daily.weather_code, index)?,
            sunrise: local_time(timezone, DAILY, "sunrise", index, sunrise)?,
            sunset: local_time(timezone, DAILY, "sunset", index, sunset)?,
            hours: BTreeMap::new(),
        };
        days.insert(date, day);
    }

    Ok(days)
}

fn bucket_hours(
    hourly: &RawHourly,
    timezone: Tz,
    days: &mut BTreeMap<NaiveDate, ForecastDay>,
) -> Result<(), DataIntegrityError> {
    check_lengths(
        HOURLY,
        hourly.time.len(),
        &[
            ("temperature_2m", hourly.temperature_2m.len()),
            ("apparent_temperature", hourly.apparent_temperature.len()),
            ("precipitation", hourly.precipitation.len()),
            ("snowfall", hourly.snowfall.len()),
            ("wind_speed_10m", hourly.wind_speed_10m.len()),
            ("wind_direction_10m", hourly.wind_direction_10m.len()),
            ("weather_code", hourly.weather_code.len()),
        ],
    )?;

    for (index, value) in hourly.time.iter().enumerate() {
        let time = local_time(timezone, HOURLY, "time", index, *value)?;
        let instant = ForecastInstant {
            time,
            temperature_c: value_at(HOURLY, "temperature_2m", &hourly.temperature_2m, index)?,
            apparent_temperature_c: value_at(
                HOURLY,
                "apparent_temperature",
                &hourly.apparent_temperature,
                index,
            )?,
            precipitation_mm: value_at(HOURLY, "precipitation", &hourly.precipitation, index)?,
            snowfall_cm: value_at(HOURLY, "snowfall", &hourly.snowfall, index)?,
            wind_speed_ms: value_at(HOURLY, "wind_speed_10m", &hourly.wind_speed_10m, index)?,
            wind_direction_deg: value_at(
                HOURLY,
                "wind_direction_10m",
                &hourly.wind_direction_10m,
                index,
            )?,
            weather_code: value_at(HOURLY, "weather_code", &hourly.weather_code, index)?,
        };

        // Bucket by the instant's own local date, never by array position.
        let Some(day) = days.get_mut(&time.date_naive()) else {
            return Err(DataIntegrityError::InstantOutsideRange(time.to_rfc3339()));
        };
        if day.hours.insert(time, instant).is_some() {
            return Err(DataIntegrityError::DuplicateInstant(time.to_rfc3339()));
        }
    }

    Ok(())
}

fn check_lengths(
    section: &'static str,
    expected: usize,
    columns: &[(&'static str, usize)],
) -> Result<(), DataIntegrityError> {
    match columns.iter().find(|(_, actual)| *actual != expected) {
        Some(&(field, actual)) => Err(DataIntegrityError::LengthMismatch {
            section,
            field,
            expected,
            actual,
        }),
        None => Ok(()),
    }
}

fn value_at<T: Copy>(
    section: &'static str,
    field: &'static str,
    values: &[Option<T>],
    index: usize,
) -> Result<T, DataIntegrityError> {
    values
        .get(index)
        .copied()
        .flatten()
        .ok_or(DataIntegrityError::MissingValue {
            section,
            field,
            index,
        })
}

fn local_time(
    timezone: Tz,
    section: &'static str,
    field: &'static str,
    index: usize,
    value: i64,
) -> Result<DateTime<Tz>, DataIntegrityError> {
    DateTime::from_timestamp(value, 0)
        .map(|utc| utc.with_timezone(&timezone))
        .ok_or(DataIntegrityError::InvalidTimestamp {
            section,
            field,
            index,
            value,
        })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use chrono::{Days, NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::Tz;

    use super::{EXPECTED_DAILY_UNITS, EXPECTED_HOURLY_UNITS};
    use crate::providers::{RawDaily, RawForecast, RawHourly};

    fn units(table: &[(&str, &str)]) -> BTreeMap<String, String> {
        table
            .iter()
            .map(|(field, unit)| ((*field).to_string(), (*unit).to_string()))
            .collect()
    }

    pub(crate) fn push_hour(hourly: &mut RawHourly, timestamp: i64, temperature: f64) {
        hourly.time.push(timestamp);
        hourly.temperature_2m.push(Some(temperature));
        hourly.apparent_temperature.push(Some(temperature - 2.0));
        hourly.precipitation.push(Some(0.1));
        hourly.snowfall.push(Some(0.0));
        hourly.wind_speed_10m.push(Some(3.5));
        hourly.wind_direction_10m.push(Some(225.0));
        hourly.weather_code.push(Some(2));
    }

    pub(crate) fn fixture(timezone: Tz, start: NaiveDate, day_count: u32) -> RawForecast {
        let mut daily = RawDaily::default();
        let mut hourly = RawHourly::default();

        for offset in 0..day_count {
            let day = start + Days::new(u64::from(offset));
            let midnight = timezone
                .from_local_datetime(&day.and_time(NaiveTime::MIN))
                .earliest()
                .expect("midnight")
                .timestamp();
            let offset = f64::from(offset);

            daily.time.push(midnight);
            daily.temperature_2m_min.push(Some(-2.0 + offset));
            daily.temperature_2m_max.push(Some(6.0 + offset));
            daily.apparent_temperature_min.push(Some(-5.0 + offset));
            daily.apparent_temperature_max.push(Some(3.0 + offset));
            daily.precipitation_sum.push(Some(1.2));
            daily.precipitation_hours.push(Some(3.0));
            daily.snowfall_sum.push(Some(0.0));
            daily.wind_speed_10m_max.push(Some(7.4));
            daily.wind_direction_10m_dominant.push(Some(270.0));
            daily.weather_code.push(Some(61));
            daily.sunrise.push(Some(midnight + 8 * 3_600));
            daily.sunset.push(Some(midnight + 16 * 3_600));

            for hour in 0..24 {
                push_hour(&mut hourly, midnight + hour * 3_600, offset + hour as f64 / 4.0);
            }
        }

        RawForecast {
            timezone: timezone.name().to_string(),
            daily_units: units(EXPECTED_DAILY_UNITS),
            hourly_units: units(EXPECTED_HOURLY_UNITS),
            daily,
            hourly,
        }
    }
}
