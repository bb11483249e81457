use crate::{
    Config,
    config::Endpoints,
    error::ForecastError,
    model::{Coordinates, LocationSearchResult, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

pub mod openweather;

/// Geocoding and one-day forecast lookups.
///
/// Implementations return typed errors; [`crate::ForecastClient`] turns them
/// into notifications and "no data" for the manager.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn search_location(&self, query: &str)
    -> Result<Vec<LocationSearchResult>, ForecastError>;

    async fn day_summary(
        &self,
        at: Coordinates,
        date: NaiveDate,
    ) -> Result<WeatherSnapshot, ForecastError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn ForecastProvider>, ForecastError> {
    build_provider(config.api_key(), &config.endpoints)
}

fn build_provider(
    api_key: Option<String>,
    endpoints: &Endpoints,
) -> Result<Box<dyn ForecastProvider>, ForecastError> {
    let api_key = api_key.ok_or(ForecastError::MissingApiKey)?;

    let provider = OpenWeatherProvider::new(api_key)?
        .with_endpoints(&endpoints.geo_base_url, &endpoints.forecast_base_url);

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_provider_errors_when_missing_api_key() {
        let err = build_provider(None, &Endpoints::default()).unwrap_err();
        assert!(matches!(err, ForecastError::MissingApiKey));
        assert!(err.to_string().contains("Hint: run `hike configure`"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }
}
