use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One planned outing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikingDay {
    /// Recomputed from (date, coordinates) on add and import, so may be absent in bundles.
    #[serde(default)]
    pub id: String,
    #[serde(with = "noon_date")]
    pub date: DateTime<Local>,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

impl HikingDay {
    /// Build a day with its date normalized to noon and a deterministic id.
    pub fn new(date: DateTime<Local>, location: Location) -> Self {
        let date = normalize_to_noon(date);
        let id = hiking_day_id(date, location.coordinates);
        Self {
            id,
            date,
            location,
            weather: None,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.coordinates
    }

    /// Renormalize the date and recompute the id, as done for imported entries.
    pub fn normalized(mut self) -> Self {
        self.date = normalize_to_noon(self.date);
        self.id = hiking_day_id(self.date, self.location.coordinates);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinates: None,
        }
    }

    pub fn at(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            coordinates: Some(Coordinates { lat, lon }),
        }
    }
}

impl From<&LocationSearchResult> for Location {
    fn from(result: &LocationSearchResult) -> Self {
        Location::at(result.display_name(), result.lat, result.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSearchResult {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl LocationSearchResult {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

/// One-day forecast attached to a hiking day. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub date: String,
    pub temperature: Temperature,
    pub condition: Condition,
    pub precipitation: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind: Wind,
}

impl WeatherSnapshot {
    pub fn icon_url(&self) -> String {
        format!(
            "https://openweathermap.org/img/wn/{}@2x.png",
            self.condition.icon
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub direction: f64,
}

impl Wind {
    pub fn direction_label(&self) -> &'static str {
        wind_direction_label(self.direction)
    }
}

/// Sky category approximated from afternoon cloud cover (percent).
///
/// The day summary endpoint carries no discrete condition, so this is
/// derived from fixed thresholds rather than passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyCover {
    Clear,
    LightlyCloudy,
    Cloudy,
    VeryCloudy,
}

impl SkyCover {
    pub fn from_cloud_cover(percent: f64) -> Self {
        if percent < 20.0 {
            SkyCover::Clear
        } else if percent < 50.0 {
            SkyCover::LightlyCloudy
        } else if percent < 80.0 {
            SkyCover::Cloudy
        } else {
            SkyCover::VeryCloudy
        }
    }

    pub fn main(&self) -> &'static str {
        match self {
            SkyCover::Clear => "Clear",
            _ => "Clouds",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SkyCover::Clear => "Clear sky",
            SkyCover::LightlyCloudy => "Lightly cloudy",
            SkyCover::Cloudy => "Cloudy",
            SkyCover::VeryCloudy => "Very cloudy",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SkyCover::Clear => "01d",
            SkyCover::LightlyCloudy => "02d",
            SkyCover::Cloudy => "03d",
            SkyCover::VeryCloudy => "04d",
        }
    }

    pub fn condition(&self) -> Condition {
        Condition {
            main: self.main().to_string(),
            description: self.description().to_string(),
            icon: self.icon().to_string(),
        }
    }
}

/// Which projection of the collection is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    List,
    Calendar,
    Map,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Calendar => "calendar",
            ViewMode::Map => "map",
        }
    }

    pub const fn all() -> &'static [ViewMode] {
        &[ViewMode::List, ViewMode::Calendar, ViewMode::Map]
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "calendar" => Ok(ViewMode::Calendar),
            "map" => Ok(ViewMode::Map),
            _ => Err(anyhow::anyhow!(
                "Unknown view mode '{value}'. Supported modes: list, calendar, map."
            )),
        }
    }
}

/// `"{epoch_millis}-{lat}-{lon}"`, with `none` in place of missing coordinates.
pub fn hiking_day_id(date: DateTime<Local>, coordinates: Option<Coordinates>) -> String {
    match coordinates {
        Some(Coordinates { lat, lon }) => format!("{}-{}-{}", date.timestamp_millis(), lat, lon),
        None => format!("{}-none-none", date.timestamp_millis()),
    }
}

/// Noon local time on `day`.
pub fn noon_local(day: NaiveDate) -> DateTime<Local> {
    let naive = day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Keep the local calendar day, move the time of day to noon.
pub fn normalize_to_noon(date: DateTime<Local>) -> DateTime<Local> {
    noon_local(date.date_naive())
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn wind_direction_label(degrees: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = (degrees.rem_euclid(360.0) / 45.0).round() as usize % 8;
    DIRECTIONS[index]
}

/// Serialized as RFC 3339; deserialized leniently and renormalized to noon local.
mod noon_date {
    use chrono::{DateTime, Local, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, false))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_day(&raw)
            .map(super::noon_local)
            .ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn ids_are_deterministic() {
        let date = noon_local(day(2025, 6, 1));
        let a = hiking_day_id(date, Some(Coordinates { lat: 45.0, lon: 6.0 }));
        let b = hiking_day_id(date, Some(Coordinates { lat: 45.0, lon: 6.0 }));
        assert_eq!(a, b);
        assert!(a.ends_with("-45-6"));
    }

    #[test]
    fn ids_differ_on_any_component() {
        let d1 = noon_local(day(2025, 6, 1));
        let d2 = noon_local(day(2025, 6, 2));
        let base = hiking_day_id(d1, Some(Coordinates { lat: 45.0, lon: 6.0 }));

        assert_ne!(base, hiking_day_id(d2, Some(Coordinates { lat: 45.0, lon: 6.0 })));
        assert_ne!(base, hiking_day_id(d1, Some(Coordinates { lat: 45.1, lon: 6.0 })));
        assert_ne!(base, hiking_day_id(d1, Some(Coordinates { lat: 45.0, lon: 6.1 })));
        assert_ne!(base, hiking_day_id(d1, None));
    }

    #[test]
    fn new_day_is_normalized_to_noon() {
        let morning = Local
            .from_local_datetime(&day(2025, 6, 1).and_hms_opt(7, 30, 0).expect("valid time"))
            .earliest()
            .expect("local time exists");
        let hiking_day = HikingDay::new(morning, Location::at("Annecy, FR", 45.9, 6.1));

        assert_eq!(hiking_day.date.hour(), 12);
        assert_eq!(hiking_day.date.minute(), 0);
        assert_eq!(hiking_day.day(), day(2025, 6, 1));
        assert!(hiking_day.weather.is_none());
    }

    #[test]
    fn sky_cover_thresholds() {
        assert_eq!(SkyCover::from_cloud_cover(10.0), SkyCover::Clear);
        assert_eq!(SkyCover::from_cloud_cover(35.0), SkyCover::LightlyCloudy);
        assert_eq!(SkyCover::from_cloud_cover(65.0), SkyCover::Cloudy);
        assert_eq!(SkyCover::from_cloud_cover(90.0), SkyCover::VeryCloudy);

        assert_eq!(SkyCover::from_cloud_cover(20.0), SkyCover::LightlyCloudy);
        assert_eq!(SkyCover::from_cloud_cover(80.0), SkyCover::VeryCloudy);
    }

    #[test]
    fn sky_cover_condition_fields() {
        let clear = SkyCover::Clear.condition();
        assert_eq!(clear.main, "Clear");
        assert_eq!(clear.icon, "01d");

        let very = SkyCover::VeryCloudy.condition();
        assert_eq!(very.main, "Clouds");
        assert_eq!(very.description, "Very cloudy");
    }

    #[test]
    fn view_mode_parses_and_rejects() {
        for mode in ViewMode::all() {
            assert_eq!(mode.as_str().parse::<ViewMode>().expect("roundtrip"), *mode);
        }
        assert_eq!("  Calendar ".parse::<ViewMode>().expect("trimmed"), ViewMode::Calendar);

        let err = "grid".parse::<ViewMode>().unwrap_err();
        assert!(err.to_string().contains("Unknown view mode"));
    }

    #[test]
    fn parse_day_accepts_both_shapes() {
        assert_eq!(parse_day("2025-06-01"), Some(day(2025, 6, 1)));
        assert!(parse_day("2025-06-01T12:00:00+00:00").is_some());
        assert_eq!(parse_day("June 1st"), None);
    }

    #[test]
    fn deserialized_dates_are_renormalized() {
        let json = r#"{
            "date": "2025-06-01",
            "location": { "name": "Chamonix, FR", "coordinates": { "lat": 45.92, "lon": 6.87 } }
        }"#;
        let parsed: HikingDay = serde_json::from_str(json).expect("valid day");
        assert_eq!(parsed.date.hour(), 12);
        assert!(parsed.id.is_empty());

        let normalized = parsed.normalized();
        assert_eq!(
            normalized.id,
            hiking_day_id(noon_local(day(2025, 6, 1)), Some(Coordinates { lat: 45.92, lon: 6.87 }))
        );
    }

    #[test]
    fn wind_direction_labels() {
        assert_eq!(wind_direction_label(0.0), "N");
        assert_eq!(wind_direction_label(44.0), "NE");
        assert_eq!(wind_direction_label(180.0), "S");
        assert_eq!(wind_direction_label(350.0), "N");
        assert_eq!(wind_direction_label(-90.0), "W");
    }
}
