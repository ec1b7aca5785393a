//! Console rendering for forecast reports.

use chrono::Timelike;

use crate::model::{Forecast, ForecastDay, ForecastView, GeocodedLocation, TimeResolution};
use crate::service::ForecastReport;
use crate::weather_code;

pub mod style;
pub mod table;

pub use style::{Palette, Style, TemperatureBand, strip_ansi, wind_direction_label};
pub use table::Table;

const DAY_TITLE_FORMAT: &str = "%A %d %B";
const CLOCK_FORMAT: &str = "%H:%M";
const EMPTY_DAY_NOTICE: &str = "  no remaining forecast hours";

pub fn render_report(report: &ForecastReport, palette: Palette) -> String {
    match report.view {
        ForecastView::Summary => render_summary(&report.location, &report.forecast, palette),
        ForecastView::Detailed(resolution) => {
            render_detailed(&report.location, &report.forecast, resolution, palette)
        }
    }
}

pub fn render_summary(
    location: &GeocodedLocation,
    forecast: &Forecast,
    palette: Palette,
) -> String {
    let mut blocks = vec![location_header(location, forecast, palette)];
    blocks.extend(forecast.days.values().map(|day| summary_table(day, palette).render()));
    blocks.join("\n\n")
}

pub fn render_detailed(
    location: &GeocodedLocation,
    forecast: &Forecast,
    resolution: TimeResolution,
    palette: Palette,
) -> String {
    let mut blocks = vec![location_header(location, forecast, palette)];
    for day in forecast.days.values() {
        let title = palette.paint(Style::Bold, &day.date.format(DAY_TITLE_FORMAT).to_string());
        let table = detailed_table(day, resolution, palette);
        let body = if table.row_count() == 0 {
            palette.paint(Style::Dim, EMPTY_DAY_NOTICE)
        } else {
            table.render()
        };
        blocks.push(format!("{title}\n{body}"));
    }
    blocks.join("\n\n")
}

fn location_header(location: &GeocodedLocation, forecast: &Forecast, palette: Palette) -> String {
    let place = palette.paint(Style::Bold, &location.display_name());
    let details = palette.paint(
        Style::Dim,
        &format!(
            "({:.4}, {:.4}) {}",
            location.latitude,
            location.longitude,
            forecast.timezone.name()
        ),
    );
    format!("{place} {details}")
}

fn summary_table(day: &ForecastDay, palette: Palette) -> Table {
    let mut table = Table::new([
        palette.paint(Style::Bold, &day.date.format(DAY_TITLE_FORMAT).to_string()),
        weather_code::label(day.weather_code).to_string(),
    ]);
    table.push_row([
        "Temperature".to_string(),
        format!(
            "{} .. {} °C (feels {} .. {})",
            palette.temperature(day.temperature_min_c),
            palette.temperature(day.temperature_max_c),
            palette.temperature(day.apparent_temperature_min_c),
            palette.temperature(day.apparent_temperature_max_c)
        ),
    ]);
    table.push_row([
        "Precipitation".to_string(),
        format!(
            "{:.1} mm over {:.0} h",
            day.precipitation_sum_mm, day.precipitation_hours
        ),
    ]);
    table.push_row(["Snowfall".to_string(), format!("{:.1} cm", day.snowfall_sum_cm)]);
    table.push_row([
        "Wind".to_string(),
        format!(
            "{:.1} m/s {}",
            day.wind_speed_max_ms,
            wind_direction_label(day.wind_direction_dominant_deg)
        ),
    ]);
    table.push_row([
        "Sunrise / sunset".to_string(),
        format!(
            "{} / {}",
            day.sunrise.format(CLOCK_FORMAT),
            day.sunset.format(CLOCK_FORMAT)
        ),
    ]);
    table
}

fn detailed_table(day: &ForecastDay, resolution: TimeResolution, palette: Palette) -> Table {
    let mut table = Table::new([
        "Time",
        "Conditions",
        "Temp °C (apparent)",
        "Precip mm",
        "Snow cm",
        "Wind",
    ]);

    // Filter on the hour only; minutes are ignored.
    for instant in day
        .hours
        .values()
        .filter(|instant| instant.time.hour() % resolution.hours() == 0)
    {
        table.push_row([
            instant.time.format(CLOCK_FORMAT).to_string(),
            weather_code::label(instant.weather_code).to_string(),
            format!(
                "{} ({})",
                palette.temperature(instant.temperature_c),
                palette.temperature(instant.apparent_temperature_c)
            ),
            format!("{:.1}", instant.precipitation_mm),
            format!("{:.1}", instant.snowfall_cm),
            format!(
                "{:.1} m/s {}",
                instant.wind_speed_ms,
                wind_direction_label(instant.wind_direction_deg)
            ),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone};
    use chrono_tz::Tz;

    use super::*;
    use crate::forecast::fixtures::fixture;
    use crate::forecast::normalize;
    use crate::model::ForecastInstant;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn london() -> GeocodedLocation {
        GeocodedLocation {
            latitude: 51.5072,
            longitude: -0.1276,
            name: "London".to_string(),
            country_name: "United Kingdom".to_string(),
            country_code: "GBR".to_string(),
            timezone_name: "UTC".to_string(),
        }
    }

    fn two_days() -> Forecast {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 2);
        normalize(fixture(Tz::UTC, start, 2), start, end, Tz::UTC).expect("forecast")
    }

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        Tz::UTC
            .with_ymd_and_hms(2024, 1, 1, hour, minute, 0)
            .single()
            .expect("time")
    }

    #[test]
    fn render_summary_lists_every_day_with_aggregates() {
        let output = render_summary(&london(), &two_days(), Palette::plain());

        assert!(output.starts_with("London, United Kingdom (51.5072, -0.1276) UTC"));
        assert!(output.contains("Monday 01 January"));
        assert!(output.contains("Tuesday 02 January"));
        assert!(output.contains("Light rain"));
        assert!(output.contains("-2.0 .. 6.0 °C (feels -5.0 .. 3.0)"));
        assert!(output.contains("1.2 mm over 3 h"));
        assert!(output.contains("7.4 m/s W"));
        assert!(output.contains("08:00 / 16:00"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn render_detailed_keeps_hours_on_resolution_boundaries() {
        let output = render_detailed(
            &london(),
            &two_days(),
            TimeResolution::SixHours,
            Palette::plain(),
        );

        for clock in ["00:00", "06:00", "12:00", "18:00"] {
            assert!(output.contains(&format!("│ {clock} │")), "missing {clock}");
        }
        for clock in ["01:00", "05:00", "13:00", "23:00"] {
            assert!(!output.contains(&format!("│ {clock} │")), "unexpected {clock}");
        }
        assert!(output.contains("Partly cloudy"));
    }

    #[test]
    fn render_detailed_ignores_minutes_when_filtering() {
        let mut forecast = two_days().retain_instants(&[]);
        let day = forecast
            .days
            .get_mut(&date(2024, 1, 1))
            .expect("day");
        for (hour, minute) in [(6, 30), (7, 0)] {
            let time = at(hour, minute);
            day.hours.insert(
                time,
                ForecastInstant {
                    time,
                    temperature_c: 31.0,
                    apparent_temperature_c: 33.0,
                    precipitation_mm: 0.0,
                    snowfall_cm: 0.0,
                    wind_speed_ms: 1.0,
                    wind_direction_deg: 0.0,
                    weather_code: 0,
                },
            );
        }

        let output = render_detailed(&london(), &forecast, TimeResolution::SixHours, Palette::plain());

        assert!(output.contains("│ 06:30 │"));
        assert!(!output.contains("│ 07:00 │"));
        assert!(output.contains("31.0 (33.0)"));
    }

    #[test]
    fn render_detailed_marks_days_without_remaining_hours() {
        let forecast = two_days().retain_instants(&[]);
        let output =
            render_detailed(&london(), &forecast, TimeResolution::OneHour, Palette::plain());

        assert_eq!(output.matches(EMPTY_DAY_NOTICE).count(), 2);
    }

    #[test]
    fn render_colors_strip_to_plain_output() {
        let forecast = two_days();
        let colored = render_summary(&london(), &forecast, Palette::new(true));
        let plain = render_summary(&london(), &forecast, Palette::plain());

        assert!(colored.contains('\u{1b}'));
        assert_eq!(strip_ansi(&colored), plain);
    }
}
