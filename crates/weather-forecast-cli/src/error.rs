use crate::config::ConfigError;
use crate::forecast::NormalizeError;
use crate::model::ValidationError;
use crate::providers::{ForecastProviderError, GeocodingError};
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    User,
    ConfigMissing,
    ConfigCorrupted,
    Geocoding,
    ForecastProvider,
    DataIntegrity,
    Runtime,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ConfigMissing | Self::ConfigCorrupted => "config",
            Self::Geocoding => "geocoding",
            Self::ForecastProvider => "forecast_provider",
            Self::DataIntegrity => "data_integrity",
            Self::Runtime => "runtime",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::Runtime => 1,
            Self::User => 2,
            Self::ConfigMissing | Self::ConfigCorrupted => 3,
            Self::Geocoding => 4,
            Self::ForecastProvider => 5,
            Self::DataIntegrity => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    pub fn geocoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Geocoding, message)
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::user(value.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        let kind = match &value {
            ConfigError::Missing => ErrorKind::ConfigMissing,
            ConfigError::Corrupted(_) => ErrorKind::ConfigCorrupted,
            ConfigError::Io(_) => ErrorKind::Runtime,
        };
        Self::new(kind, value.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::runtime(value.to_string())
    }
}

impl From<GeocodingError> for AppError {
    fn from(value: GeocodingError) -> Self {
        Self::geocoding(format!("geocoding failed: {value}"))
    }
}

impl From<ForecastProviderError> for AppError {
    fn from(value: ForecastProviderError) -> Self {
        Self::new(
            ErrorKind::ForecastProvider,
            format!("forecast provider failed: {value}"),
        )
    }
}

impl From<NormalizeError> for AppError {
    fn from(value: NormalizeError) -> Self {
        match value {
            NormalizeError::Provider(error) => error.into(),
            NormalizeError::Integrity(error) => Self::new(
                ErrorKind::DataIntegrity,
                format!("forecast data integrity violated: {error}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::DataIntegrityError;

    #[test]
    fn exit_codes_are_stable_per_kind() {
        assert_eq!(AppError::runtime("x").exit_code(), 1);
        assert_eq!(AppError::user("x").exit_code(), 2);
        assert_eq!(AppError::from(ConfigError::Missing).exit_code(), 3);
        assert_eq!(
            AppError::from(ConfigError::Corrupted("bad".to_string())).exit_code(),
            3
        );
        assert_eq!(AppError::geocoding("x").exit_code(), 4);
        assert_eq!(
            AppError::from(ForecastProviderError::Transport("timeout".to_string())).exit_code(),
            5
        );
        assert_eq!(
            AppError::from(NormalizeError::Integrity(
                DataIntegrityError::DuplicateInstant("t".to_string())
            ))
            .exit_code(),
            6
        );
    }

    #[test]
    fn config_errors_keep_missing_and_corrupted_apart() {
        assert_eq!(
            AppError::from(ConfigError::Missing).kind,
            ErrorKind::ConfigMissing
        );
        assert_eq!(
            AppError::from(ConfigError::Corrupted("bad".to_string())).kind,
            ErrorKind::ConfigCorrupted
        );
    }

    #[test]
    fn unit_mismatch_maps_to_forecast_provider_kind() {
        let error = AppError::from(NormalizeError::Provider(
            ForecastProviderError::UnitMismatch {
                section: "daily_units",
                field: "temperature_2m_min".to_string(),
                expected: Some("°C".to_string()),
                actual: Some("°F".to_string()),
            },
        ));

        assert_eq!(error.kind, ErrorKind::ForecastProvider);
        assert!(error.message.contains("temperature_2m_min"));
    }

    #[test]
    fn validation_errors_are_user_errors() {
        let error = AppError::from(ValidationError::EmptyQuery);
        assert_eq!(error.kind, ErrorKind::User);
        assert_eq!(error.to_string(), "location query must not be empty");
    }
}
