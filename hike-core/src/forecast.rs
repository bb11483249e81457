use chrono::NaiveDate;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    Config,
    error::ForecastError,
    model::{Coordinates, LocationSearchResult, WeatherSnapshot},
    notify::{Notification, Notifier},
    provider::{ForecastProvider, provider_from_config},
};

/// UI-facing wrapper around a [`ForecastProvider`].
///
/// Failures are logged and notified here and reach the caller only as
/// "no data": an empty result list or `None`.
#[derive(Debug)]
pub struct ForecastClient {
    provider: Option<Box<dyn ForecastProvider>>,
    notifier: Arc<dyn Notifier>,
    missing_key_reported: AtomicBool,
}

impl ForecastClient {
    pub fn new(provider: Box<dyn ForecastProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider: Some(provider),
            notifier,
            missing_key_reported: AtomicBool::new(false),
        }
    }

    /// A client without credentials; every lookup degrades to "no data".
    pub fn unconfigured(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider: None,
            notifier,
            missing_key_reported: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        match provider_from_config(config) {
            Ok(provider) => Self::new(provider, notifier),
            Err(e) => {
                tracing::warn!("forecast provider unavailable: {e}");
                Self::unconfigured(notifier)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn search_location(&self, query: &str) -> Vec<LocationSearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let Some(provider) = self.provider() else {
            return Vec::new();
        };

        match provider.search_location(query).await {
            Ok(results) => {
                tracing::debug!(query, count = results.len(), "location search");
                results
            }
            Err(e) => {
                self.report("Location search failed", &e);
                Vec::new()
            }
        }
    }

    pub async fn get_forecast(&self, at: Coordinates, date: NaiveDate) -> Option<WeatherSnapshot> {
        let provider = self.provider()?;

        match provider.day_summary(at, date).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                self.report("Failed to fetch weather data", &e);
                None
            }
        }
    }

    fn provider(&self) -> Option<&dyn ForecastProvider> {
        if self.provider.is_none() && !self.missing_key_reported.swap(true, Ordering::Relaxed) {
            self.report("OpenWeather API key not configured", &ForecastError::MissingApiKey);
        }
        self.provider.as_deref()
    }

    fn report(&self, title: &str, err: &ForecastError) {
        tracing::error!("{title}: {err}");
        self.notifier
            .notify(Notification::error(title).with_description(err.to_string()));
    }
}
