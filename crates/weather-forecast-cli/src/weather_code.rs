/// WMO weather interpretation codes as reported by Open-Meteo.
const WMO_LABELS: &[(i32, &str)] = &[
    (0, "Clear sky"),
    (1, "Mostly clear"),
    (2, "Partly cloudy"),
    (3, "Overcast"),
    (45, "Fog"),
    (48, "Fog + rime"),
    (51, "Light drizzle"),
    (53, "Moderate drizzle"),
    (55, "Dense drizzle"),
    (56, "Light, freezing drizzle"),
    (57, "Dense, freezing drizzle"),
    (61, "Light rain"),
    (63, "Moderate rain"),
    (65, "Heavy rain"),
    (66, "Light, freezing rain"),
    (67, "Heavy, freezing rain"),
    (71, "Light snowfall"),
    (73, "Moderate snowfall"),
    (75, "Heavy snowfall"),
    (77, "Snow grains"),
    (80, "Light rain showers"),
    (81, "Moderate rain showers"),
    (82, "Heavy rain showers"),
    (85, "Light snow showers"),
    (86, "Heavy snow showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm + light hail"),
    (99, "Thunderstorm + heavy hail"),
];

pub const UNKNOWN_LABEL: &str = "-";

pub fn lookup(code: i32) -> Option<&'static str> {
    WMO_LABELS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
}

pub fn label(code: i32) -> &'static str {
    lookup(code).unwrap_or(UNKNOWN_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_code_maps_clear_sky() {
        assert_eq!(label(0), "Clear sky");
    }

    #[test]
    fn weather_code_maps_rain_family() {
        assert_eq!(label(63), "Moderate rain");
        assert_eq!(label(81), "Moderate rain showers");
    }

    #[test]
    fn weather_code_unknown_code_renders_placeholder() {
        assert_eq!(lookup(999), None);
        assert_eq!(label(999), "-");
        assert_eq!(label(-1), "-");
    }

    #[test]
    fn weather_code_table_has_unique_codes() {
        let mut codes: Vec<i32> = WMO_LABELS.iter().map(|(code, _)| *code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), WMO_LABELS.len());
    }
}
