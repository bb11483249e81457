//! Core library for the `hike` planner.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather geocoding / day-summary provider
//! - Local persistence of planned hiking days
//! - The hiking-day manager and the view shell driving it
//!
//! It is used by `hike-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod forecast;
pub mod import;
pub mod manager;
pub mod model;
pub mod notify;
pub mod provider;
pub mod shell;
pub mod storage;

pub use config::{Config, Endpoints};
pub use error::{ForecastError, ImportError, StorageError};
pub use forecast::ForecastClient;
pub use import::ImportSource;
pub use manager::HikingDayManager;
pub use model::{
    Coordinates, HikingDay, Location, LocationSearchResult, SkyCover, ViewMode, WeatherSnapshot,
};
pub use notify::{Level, LogNotifier, Notification, Notifier, RecordingNotifier};
pub use provider::{ForecastProvider, openweather::OpenWeatherProvider};
pub use shell::{Intent, ViewShell};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage};
