use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::{ForecastError, truncate_body},
    model::{Coordinates, LocationSearchResult, SkyCover, Temperature, WeatherSnapshot, Wind},
};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const GEO_PATH: &str = "/geo/1.0/direct";
const DAY_SUMMARY_PATH: &str = "/data/3.0/onecall/day_summary";
const SEARCH_LIMIT: &str = "5";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    geo_base_url: String,
    forecast_base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ForecastError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| ForecastError::Http {
                endpoint: "OpenWeather client",
                source,
            })?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            geo_base_url: DEFAULT_BASE_URL.to_string(),
            forecast_base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point geocoding and forecast lookups at other hosts (mirrors, mock servers).
    pub fn with_endpoints(mut self, geo_base_url: &str, forecast_base_url: &str) -> Self {
        self.geo_base_url = geo_base_url.trim_end_matches('/').to_string();
        self.forecast_base_url = forecast_base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, ForecastError> {
        tracing::debug!(%url, "OpenWeather {endpoint} request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ForecastError::Http { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ForecastError::Http { endpoint, source })?;

        if !status.is_success() {
            return Err(ForecastError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ForecastError::Parse { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwTemperature {
    min: f64,
    max: f64,
    afternoon: f64,
}

#[derive(Debug, Deserialize)]
struct OwAfternoon {
    afternoon: f64,
}

#[derive(Debug, Deserialize)]
struct OwPrecipitation {
    total: f64,
}

#[derive(Debug, Deserialize)]
struct OwWindMax {
    speed: f64,
    direction: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    max: OwWindMax,
}

#[derive(Debug, Deserialize)]
struct OwDaySummary {
    temperature: OwTemperature,
    cloud_cover: OwAfternoon,
    precipitation: OwPrecipitation,
    humidity: OwAfternoon,
    pressure: OwAfternoon,
    wind: OwWind,
}

impl OwDaySummary {
    fn into_snapshot(self, date: NaiveDate) -> WeatherSnapshot {
        WeatherSnapshot {
            date: date.format("%Y-%m-%d").to_string(),
            temperature: Temperature {
                current: self.temperature.afternoon,
                min: self.temperature.min,
                max: self.temperature.max,
            },
            condition: SkyCover::from_cloud_cover(self.cloud_cover.afternoon).condition(),
            precipitation: self.precipitation.total,
            humidity: self.humidity.afternoon,
            pressure: self.pressure.afternoon,
            wind: Wind {
                speed: self.wind.max.speed,
                direction: self.wind.max.direction,
            },
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn search_location(
        &self,
        query: &str,
    ) -> Result<Vec<LocationSearchResult>, ForecastError> {
        let url = format!("{}{}", self.geo_base_url, GEO_PATH);
        let entries: Vec<OwGeoEntry> = self
            .get_json("geocoding", url, &[("q", query), ("limit", SEARCH_LIMIT)])
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| LocationSearchResult {
                name: e.name,
                country: e.country,
                state: e.state,
                lat: e.lat,
                lon: e.lon,
            })
            .collect())
    }

    async fn day_summary(
        &self,
        at: Coordinates,
        date: NaiveDate,
    ) -> Result<WeatherSnapshot, ForecastError> {
        let url = format!("{}{}", self.forecast_base_url, DAY_SUMMARY_PATH);
        let lat = at.lat.to_string();
        let lon = at.lon.to_string();
        let date_str = date.format("%Y-%m-%d").to_string();

        let summary: OwDaySummary = self
            .get_json(
                "day summary",
                url,
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("date", date_str.as_str()),
                    ("units", "metric"),
                ],
            )
            .await?;

        Ok(summary.into_snapshot(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn day_summary_body(cloud_cover: f64, afternoon: f64) -> serde_json::Value {
        serde_json::json!({
            "lat": 45.0,
            "lon": 6.0,
            "tz": "+02:00",
            "date": "2025-06-01",
            "units": "metric",
            "cloud_cover": { "afternoon": cloud_cover },
            "humidity": { "afternoon": 55.0 },
            "precipitation": { "total": 1.2 },
            "temperature": {
                "min": 8.5, "max": 21.0, "afternoon": afternoon,
                "night": 9.0, "evening": 15.0, "morning": 10.0
            },
            "pressure": { "afternoon": 1015.0 },
            "wind": { "max": { "speed": 6.2, "direction": 230.0 } }
        })
    }

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new("TEST_KEY")
            .expect("client builds")
            .with_endpoints(&server.uri(), &server.uri())
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    #[tokio::test]
    async fn search_location_maps_geocoding_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Annecy"))
            .and(query_param("limit", "5"))
            .and(query_param("appid", "TEST_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "Annecy", "lat": 45.899, "lon": 6.129, "country": "FR",
                  "state": "Auvergne-Rhône-Alpes", "local_names": { "fr": "Annecy" } },
                { "name": "Annecy-le-Vieux", "lat": 45.92, "lon": 6.14, "country": "FR" }
            ])))
            .mount(&server)
            .await;

        let results = provider(&server).search_location("Annecy").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].display_name(), "Annecy, FR");
        assert_eq!(results[0].state.as_deref(), Some("Auvergne-Rhône-Alpes"));
        assert!(results[1].state.is_none());
    }

    #[tokio::test]
    async fn day_summary_maps_payload_into_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall/day_summary"))
            .and(query_param("lat", "45"))
            .and(query_param("lon", "6"))
            .and(query_param("date", "2025-06-01"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(day_summary_body(15.0, 18.4)))
            .mount(&server)
            .await;

        let snapshot = provider(&server)
            .day_summary(Coordinates { lat: 45.0, lon: 6.0 }, june_first())
            .await
            .unwrap();

        assert_eq!(snapshot.date, "2025-06-01");
        assert_eq!(snapshot.temperature.current, 18.4);
        assert_eq!(snapshot.temperature.min, 8.5);
        assert_eq!(snapshot.condition.main, "Clear");
        assert_eq!(snapshot.condition.icon, "01d");
        assert_eq!(snapshot.precipitation, 1.2);
        assert_eq!(snapshot.pressure, 1015.0);
        assert_eq!(snapshot.wind.direction_label(), "SW");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall/day_summary"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .day_summary(Coordinates { lat: 45.0, lon: 6.0 }, june_first())
            .await
            .unwrap_err();

        match err {
            ForecastError::Status { status, body, .. } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "Invalid API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"oops\": true}"))
            .mount(&server)
            .await;

        let err = provider(&server).search_location("Nowhere").await.unwrap_err();
        assert!(matches!(err, ForecastError::Parse { .. }));
    }
}
