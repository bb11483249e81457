//! Owner of the hiking-day collection.
//!
//! Every mutation goes through [`HikingDayManager`], which keeps the
//! collection in sync with the forecast provider and writes it through to
//! storage once the initial load has run.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use futures::future::join_all;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use crate::{
    Config,
    error::ImportError,
    forecast::ForecastClient,
    import::{self, ImportSource},
    model::{Coordinates, HikingDay, Location, WeatherSnapshot},
    notify::{Notification, Notifier},
    storage::{FileStore, Storage, is_weather_data_valid},
};

/// Pause between two requests of a backfill pass.
pub const BACKFILL_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct HikingDayManager {
    days: Vec<HikingDay>,
    forecast: ForecastClient,
    storage: Storage,
    notifier: Arc<dyn Notifier>,
    import_timeout: Duration,
    initialized: bool,
}

impl HikingDayManager {
    pub fn new(forecast: ForecastClient, storage: Storage, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            days: Vec::new(),
            forecast,
            storage,
            notifier,
            import_timeout: import::IMPORT_TIMEOUT,
            initialized: false,
        }
    }

    pub fn with_import_timeout(mut self, timeout: Duration) -> Self {
        self.import_timeout = timeout;
        self
    }

    /// File-backed manager using the configured data directory and API key.
    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let store = FileStore::new(config.data_dir()?);
        tracing::debug!(dir = %store.dir().display(), "using file store");

        let storage = Storage::new(Arc::new(store), notifier.clone());
        let forecast = ForecastClient::from_config(config, notifier.clone());
        Ok(Self::new(forecast, storage, notifier))
    }

    pub fn hiking_days(&self) -> &[HikingDay] {
        &self.days
    }

    pub fn get(&self, id: &str) -> Option<&HikingDay> {
        self.days.iter().find(|d| d.id == id)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn forecast(&self) -> &ForecastClient {
        &self.forecast
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Load the stored collection and backfill forecasts.
    ///
    /// With a stamp older than the freshness window (or none at all) every
    /// day with coordinates is refetched; otherwise only days without weather.
    pub async fn initialize(&mut self) {
        let (days, last_updated) = self.storage.load();
        self.days = days;

        let stale = !last_updated.is_some_and(|ts| is_weather_data_valid(ts, Utc::now()));
        let pending: Vec<String> = self
            .days
            .iter()
            .filter(|d| d.coordinates().is_some() && (stale || d.weather.is_none()))
            .map(|d| d.id.clone())
            .collect();

        if stale && !self.days.is_empty() {
            tracing::info!("stored weather data expired, refreshing");
        }
        self.backfill(&pending).await;

        self.initialized = true;
        self.persist();
    }

    /// Sequential fetches, one in flight, with a fixed pause in between.
    async fn backfill(&mut self, ids: &[String]) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(BACKFILL_DELAY).await;
            }
            self.fetch_weather_for(id).await;
        }
    }

    /// Plan a new day and fetch its forecast right away.
    ///
    /// Returns the id, or `None` when that (date, location) is already planned.
    pub async fn add(&mut self, date: DateTime<Local>, location: Location) -> Option<String> {
        let day = HikingDay::new(date, location);
        let id = day.id.clone();

        if self.get(&id).is_some() {
            self.notifier.notify(
                Notification::error("Hiking day already planned")
                    .with_description(format!("{} on {}", day.location.name, day.day())),
            );
            return None;
        }

        tracing::info!(%id, location = %day.location.name, "hiking day added");
        self.days.push(day);
        self.persist();

        self.fetch_weather_for(&id).await;
        Some(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.days.len();
        self.days.retain(|d| d.id != id);

        if self.days.len() == before {
            self.notifier
                .notify(Notification::info("No hiking day with that id").with_description(id));
            return false;
        }

        self.persist();
        self.notifier.notify(Notification::success("Hiking day removed"));
        true
    }

    /// Refetch the forecast of one day. Returns whether weather was attached.
    pub async fn refresh_weather(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            self.notifier
                .notify(Notification::info("No hiking day with that id").with_description(id));
            return false;
        }

        let updated = self.fetch_weather_for(id).await;
        if updated {
            self.notifier.notify(Notification::success("Weather data updated"));
        }
        updated
    }

    /// Refetch every day with coordinates, all requests in flight at once.
    ///
    /// Results are matched back by id, never by position.
    pub async fn refresh_all(&mut self) -> usize {
        let targets: Vec<(String, Coordinates, NaiveDate)> = self
            .days
            .iter()
            .filter_map(|d| d.coordinates().map(|at| (d.id.clone(), at, d.day())))
            .collect();

        if targets.is_empty() {
            self.notifier.notify(Notification::info("Nothing to refresh"));
            return 0;
        }

        let forecast = &self.forecast;
        let results = join_all(targets.iter().map(|(id, at, date)| async move {
            (id.as_str(), forecast.get_forecast(*at, *date).await)
        }))
        .await;

        let mut updated: HashMap<String, WeatherSnapshot> = results
            .into_iter()
            .filter_map(|(id, snapshot)| snapshot.map(|s| (id.to_string(), s)))
            .collect();
        let count = updated.len();

        for day in &mut self.days {
            if let Some(snapshot) = updated.remove(&day.id) {
                day.weather = Some(snapshot);
            }
        }

        if count > 0 {
            self.persist();
            self.notifier
                .notify(Notification::success(format!("{count} hiking days updated")));
        }
        count
    }

    pub fn clear_all(&mut self) {
        self.days.clear();
        self.storage.clear_hiking_days();
        self.notifier
            .notify(Notification::success("All data has been deleted"));
    }

    /// Merge a bundle into the collection, skipping ids already present.
    ///
    /// Returns how many days were added.
    pub async fn import(&mut self, source: &ImportSource) -> usize {
        let loaded = match import::http_client(self.import_timeout) {
            Ok(http) => source.load(&http).await,
            Err(e) => Err(e),
        };
        let imported = match loaded {
            Ok(days) => days,
            Err(e) => {
                tracing::error!("import from {source} failed: {e}");
                let title = match e {
                    ImportError::InvalidFormat { .. } => "Invalid import format",
                    ImportError::Fetch { .. } => "Import failed",
                };
                self.notifier
                    .notify(Notification::error(title).with_description(e.to_string()));
                return 0;
            }
        };

        let total = imported.len();
        let mut known: HashSet<String> = self.days.iter().map(|d| d.id.clone()).collect();
        let fresh: Vec<HikingDay> = imported
            .into_iter()
            .filter(|d| known.insert(d.id.clone()))
            .collect();
        let added = fresh.len();

        self.days.extend(fresh);
        if added > 0 {
            self.persist();
        }

        tracing::info!(%source, total, added, "import finished");
        self.notifier.notify(
            Notification::success("Import successful")
                .with_description(format!("{total} hiking days read, {added} new")),
        );
        added
    }

    /// Fetch and attach the forecast of `id`; errors are already notified.
    async fn fetch_weather_for(&mut self, id: &str) -> bool {
        let Some(day) = self.get(id) else {
            return false;
        };
        let Some(at) = day.coordinates() else {
            let name = day.location.name.clone();
            self.notifier.notify(
                Notification::error("Missing coordinates")
                    .with_description(format!("Unable to fetch weather for {name}")),
            );
            return false;
        };
        let date = day.day();

        let Some(snapshot) = self.forecast.get_forecast(at, date).await else {
            return false;
        };

        match self.days.iter_mut().find(|d| d.id == id) {
            Some(day) => {
                day.weather = Some(snapshot);
                self.persist();
                true
            }
            None => false,
        }
    }

    /// Write-through; skipped until the first load so storage is not
    /// overwritten with an empty collection.
    fn persist(&self) {
        if self.initialized {
            self.storage.save_hiking_days(&self.days);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, Temperature, Wind, noon_local};
    use crate::notify::{Level, RecordingNotifier};
    use crate::provider::ForecastProvider;
    use crate::storage::MemoryStore;
    use crate::{error::ForecastError, model::LocationSearchResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Answers from a fixed table and records every request.
    #[derive(Debug, Default)]
    struct FakeProvider {
        calls: Mutex<Vec<(Coordinates, NaiveDate)>>,
        failing_lat: Option<f64>,
    }

    fn snapshot_for(date: NaiveDate, lat: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            date: date.to_string(),
            temperature: Temperature {
                current: lat,
                min: 0.0,
                max: 20.0,
            },
            condition: Condition {
                main: "Clear".into(),
                description: "Clear sky".into(),
                icon: "01d".into(),
            },
            precipitation: 0.0,
            humidity: 50.0,
            pressure: 1013.0,
            wind: Wind {
                speed: 2.0,
                direction: 0.0,
            },
        }
    }

    #[async_trait]
    impl ForecastProvider for Arc<FakeProvider> {
        async fn search_location(
            &self,
            _query: &str,
        ) -> Result<Vec<LocationSearchResult>, ForecastError> {
            Ok(Vec::new())
        }

        async fn day_summary(
            &self,
            at: Coordinates,
            date: NaiveDate,
        ) -> Result<WeatherSnapshot, ForecastError> {
            self.calls.lock().push((at, date));
            if self.failing_lat == Some(at.lat) {
                return Err(ForecastError::MissingApiKey);
            }
            Ok(snapshot_for(date, at.lat))
        }
    }

    struct Harness {
        manager: HikingDayManager,
        provider: Arc<FakeProvider>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness_with(provider: FakeProvider) -> Harness {
        let provider = Arc::new(provider);
        let notifier = Arc::new(RecordingNotifier::new());
        let storage = Storage::new(Arc::new(MemoryStore::new()), notifier.clone());
        let forecast = ForecastClient::new(Box::new(provider.clone()), notifier.clone());
        Harness {
            manager: HikingDayManager::new(forecast, storage, notifier.clone()),
            provider,
            notifier,
        }
    }

    fn june(day: u32) -> DateTime<Local> {
        noon_local(NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date"))
    }

    #[tokio::test]
    async fn add_attaches_weather_and_persists() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.initialize().await;

        let id = h
            .manager
            .add(june(1), Location::at("Annecy, FR", 45.0, 6.0))
            .await
            .expect("added");

        let day = h.manager.get(&id).expect("present");
        assert_eq!(day.weather.as_ref().map(|w| w.temperature.current), Some(45.0));
        assert_eq!(h.manager.storage().load_hiking_days(), h.manager.hiking_days());
    }

    #[tokio::test]
    async fn add_rejects_duplicate_ids() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.initialize().await;

        assert!(h.manager.add(june(1), Location::at("A", 45.0, 6.0)).await.is_some());
        assert!(h.manager.add(june(1), Location::at("A again", 45.0, 6.0)).await.is_none());

        assert_eq!(h.manager.hiking_days().len(), 1);
        assert!(h.notifier.contains_title("already planned"));
    }

    #[tokio::test]
    async fn day_without_coordinates_never_gets_weather() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.initialize().await;

        let id = h.manager.add(june(2), Location::named("Somewhere")).await.unwrap();
        assert!(!h.manager.refresh_weather(&id).await);

        assert!(h.manager.get(&id).unwrap().weather.is_none());
        assert!(h.provider.calls.lock().is_empty());
        assert!(h.notifier.contains_title("Missing coordinates"));
    }

    #[tokio::test]
    async fn remove_keeps_order_of_others() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.initialize().await;

        let a = h.manager.add(june(1), Location::at("A", 1.0, 1.0)).await.unwrap();
        let b = h.manager.add(june(2), Location::at("B", 2.0, 2.0)).await.unwrap();
        let c = h.manager.add(june(3), Location::at("C", 3.0, 3.0)).await.unwrap();

        assert!(h.manager.remove(&b));
        assert!(!h.manager.remove(&b));

        let ids: Vec<&str> = h.manager.hiking_days().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), c.as_str()]);
        assert_eq!(h.manager.storage().load_hiking_days().len(), 2);
    }

    #[tokio::test]
    async fn refresh_all_assigns_results_by_id() {
        let mut h = harness_with(FakeProvider {
            failing_lat: Some(2.0),
            ..FakeProvider::default()
        });
        h.manager.initialize().await;

        h.manager.add(june(1), Location::at("A", 1.0, 1.0)).await;
        h.manager.add(june(2), Location::named("No coords")).await;
        h.manager.add(june(3), Location::at("B", 2.0, 2.0)).await;
        h.manager.add(june(4), Location::at("C", 3.0, 3.0)).await;
        h.provider.calls.lock().clear();

        let updated = h.manager.refresh_all().await;

        assert_eq!(updated, 2);
        assert_eq!(h.provider.calls.lock().len(), 3);
        for day in h.manager.hiking_days() {
            match day.coordinates() {
                Some(at) if at.lat != 2.0 => {
                    let weather = day.weather.as_ref().expect("refreshed");
                    assert_eq!(weather.temperature.current, at.lat);
                    assert_eq!(weather.date, day.day().to_string());
                }
                _ => assert!(day.weather.is_none()),
            }
        }
    }

    #[tokio::test]
    async fn refresh_all_with_nothing_to_do_informs() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.initialize().await;

        assert_eq!(h.manager.refresh_all().await, 0);
        assert!(h.notifier.contains_title("Nothing to refresh"));
    }

    #[tokio::test]
    async fn failures_are_absorbed_and_notified() {
        let mut h = harness_with(FakeProvider {
            failing_lat: Some(9.0),
            ..FakeProvider::default()
        });
        h.manager.initialize().await;

        let id = h.manager.add(june(1), Location::at("Bad", 9.0, 9.0)).await.unwrap();

        assert!(h.manager.get(&id).unwrap().weather.is_none());
        assert_eq!(h.notifier.count(Level::Error), 1);
    }

    #[tokio::test]
    async fn mutations_before_initialize_do_not_touch_storage() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.add(june(1), Location::at("Early", 1.0, 1.0)).await;

        assert!(!h.manager.is_initialized());
        assert!(h.manager.storage().last_updated().is_none());
    }

    #[tokio::test]
    async fn clear_all_then_initialize_is_empty() {
        let mut h = harness_with(FakeProvider::default());
        h.manager.initialize().await;
        h.manager.add(june(1), Location::at("A", 1.0, 1.0)).await;

        h.manager.clear_all();
        assert!(h.manager.hiking_days().is_empty());

        h.manager.initialize().await;
        assert!(h.manager.hiking_days().is_empty());
    }
}
