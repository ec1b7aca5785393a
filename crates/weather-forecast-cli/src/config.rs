use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Loaded, Store, StoreError};

pub const HTTP_TIMEOUT_SECS: u64 = 10;

pub const WEATHER_APP_DIR_ENV: &str = "WEATHER_APP_DIR";
pub const WEATHER_HTTP_TIMEOUT_SECS_ENV: &str = "WEATHER_HTTP_TIMEOUT_SECS";
pub const WEATHER_LOG_ENV: &str = "WEATHER_LOG";
const NO_COLOR_ENV: &str = "NO_COLOR";
const HOME_ENV: &str = "HOME";

const APP_DIR_NAME: &str = ".weather";
const CONFIG_FILE_NAME: &str = "config.json";
const GEOCODING_CACHE_FILE_NAME: &str = "geocodingdb.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub app_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub color: bool,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            app_dir: resolve_app_dir(&map),
            http_timeout_secs: resolve_http_timeout_secs(&map),
            color: !map.contains_key(NO_COLOR_ENV),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.app_dir.join(CONFIG_FILE_NAME)
    }

    pub fn geocoding_cache_path(&self) -> PathBuf {
        self.app_dir.join(GEOCODING_CACHE_FILE_NAME)
    }
}

fn resolve_app_dir(env_map: &HashMap<String, String>) -> PathBuf {
    let home = env_map
        .get(HOME_ENV)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let explicit = env_map
        .get(WEATHER_APP_DIR_ENV)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| PathBuf::from(expand_home_path(value, home)));

    explicit.unwrap_or_else(|| match home {
        Some(home) => PathBuf::from(home).join(APP_DIR_NAME),
        None => std::env::temp_dir().join("weather-forecast-cli"),
    })
}

fn expand_home_path(raw: &str, home: Option<&str>) -> String {
    let trimmed = raw.trim();
    let Some(home) = home else {
        return trimmed.to_string();
    };

    let home = home.trim_end_matches('/');
    let mut expanded = trimmed.replace("$HOME", home);

    if expanded == "~" {
        expanded = home.to_string();
    } else if let Some(rest) = expanded.strip_prefix("~/") {
        expanded = format!("{home}/{rest}");
    }

    expanded
}

fn resolve_http_timeout_secs(env_map: &HashMap<String, String>) -> u64 {
    env_map
        .get(WEATHER_HTTP_TIMEOUT_SECS_ENV)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(HTTP_TIMEOUT_SECS)
}

/// Persisted credential record (`config.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub positionstack_access_key: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing config: run `weather init` to create it")]
    Missing,
    #[error("corrupted config ({0}): run `weather init` to re-create it")]
    Corrupted(String),
    #[error(transparent)]
    Io(#[from] StoreError),
}

pub fn load_credentials<S>(store: &S) -> Result<Credentials, ConfigError>
where
    S: Store<Credentials>,
{
    match store.load()? {
        Loaded::Found(credentials) => {
            if credentials.positionstack_access_key.trim().is_empty() {
                return Err(ConfigError::Corrupted("empty access key".to_string()));
            }
            Ok(credentials)
        }
        Loaded::Missing => Err(ConfigError::Missing),
        Loaded::Corrupted(detail) => Err(ConfigError::Corrupted(detail)),
    }
}
