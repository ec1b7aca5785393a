use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::config::{Credentials, RuntimeConfig, load_credentials};
use crate::error::AppError;
use crate::forecast::normalize;
use crate::geocoding::{GeocodingCache, resolve_location};
use crate::model::{
    Forecast, ForecastOutput, ForecastRequest, ForecastView, GeocodedLocation, ValidationError,
};
use crate::providers::{ForecastApi, ForecastFetch, GeocodingApi};
use crate::store::{JsonFileStore, Store};
use crate::time_window::build_time_window;

/// Credential and geocoding cache persistence used by a command run.
#[derive(Debug, Clone)]
pub struct Stores<C, K> {
    pub credentials: C,
    pub geocoding_cache: K,
}

pub type FileStores = Stores<JsonFileStore<Credentials>, JsonFileStore<GeocodingCache>>;

impl FileStores {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            credentials: JsonFileStore::new(config.config_path()),
            geocoding_cache: JsonFileStore::new(config.geocoding_cache_path()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastReport {
    pub location: GeocodedLocation,
    pub forecast: Forecast,
    pub view: ForecastView,
}

impl ForecastReport {
    pub fn to_output(&self) -> ForecastOutput {
        ForecastOutput::new(&self.location, &self.forecast, self.view)
    }
}

pub fn run_forecast<P, C, K>(
    providers: &P,
    stores: &Stores<C, K>,
    now: DateTime<Utc>,
    request: &ForecastRequest,
) -> Result<ForecastReport, AppError>
where
    P: GeocodingApi + ForecastApi,
    C: Store<Credentials>,
    K: Store<GeocodingCache>,
{
    let credentials = load_credentials(&stores.credentials)?;

    let mut cache = GeocodingCache::load_from(&stores.geocoding_cache)?;
    let location = resolve_location(
        providers,
        &mut cache,
        &stores.geocoding_cache,
        &credentials.positionstack_access_key,
        &request.query,
    )?;
    let timezone = location
        .timezone()
        .map_err(|error| AppError::geocoding(format!("unusable location record: {error}")))?;

    let start_date = request
        .start_date
        .unwrap_or_else(|| now.with_timezone(&timezone).date_naive());
    let end_date = range_end(start_date, request.days)?;

    let raw = providers.fetch_forecast(&ForecastFetch {
        latitude: location.latitude,
        longitude: location.longitude,
        start_date,
        end_date,
        timezone,
    })?;
    let forecast = normalize(raw, start_date, end_date, timezone)?;

    let forecast = match request.view {
        ForecastView::Summary => forecast,
        ForecastView::Detailed(resolution) => {
            let window = build_time_window(start_date, request.days, resolution, timezone, now);
            forecast.retain_instants(&window)
        }
    };

    tracing::debug!(
        location = %location.display_name(),
        timezone = timezone.name(),
        %start_date,
        %end_date,
        view = request.view.as_str(),
        instants = forecast.instant_count(),
        "forecast ready"
    );

    Ok(ForecastReport {
        location,
        forecast,
        view: request.view,
    })
}

fn range_end(start_date: NaiveDate, days: u32) -> Result<NaiveDate, AppError> {
    start_date
        .checked_add_days(Days::new(u64::from(days.saturating_sub(1))))
        .ok_or_else(|| AppError::user(format!("forecast range from {start_date} is out of bounds")))
}

pub fn save_credentials<S>(store: &S, access_key: &str) -> Result<Credentials, AppError>
where
    S: Store<Credentials>,
{
    let access_key = access_key.trim();
    if access_key.is_empty() {
        return Err(ValidationError::EmptyAccessKey.into());
    }

    let credentials = Credentials {
        positionstack_access_key: access_key.to_string(),
    };
    store.save(&credentials)?;
    tracing::info!("credentials saved");
    Ok(credentials)
}
