use geojson::{Feature, FeatureCollection, Geometry, Value};
use hike_core::HikingDay;
use serde_json::{Map, Value as JsonValue};

use super::sorted_by_date;

/// GeoJSON `FeatureCollection` with one point per day that has coordinates.
pub fn render(days: &[HikingDay]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&to_feature_collection(days))?)
}

pub fn to_feature_collection(days: &[HikingDay]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: sorted_by_date(days)
            .into_iter()
            .filter_map(day_to_feature)
            .collect(),
        foreign_members: None,
    }
}

fn day_to_feature(day: &HikingDay) -> Option<Feature> {
    let at = day.coordinates()?;
    let geometry = Geometry::new(Value::Point(vec![at.lon, at.lat]));

    let mut props = Map::new();
    props.insert("id".to_string(), JsonValue::from(day.id.clone()));
    props.insert("name".to_string(), JsonValue::from(day.location.name.clone()));
    props.insert("date".to_string(), JsonValue::from(day.day().to_string()));

    if let Some(w) = &day.weather {
        props.insert("condition".to_string(), JsonValue::from(w.condition.main.clone()));
        props.insert(
            "description".to_string(),
            JsonValue::from(w.condition.description.clone()),
        );
        props.insert("icon".to_string(), JsonValue::from(w.icon_url()));
        props.insert("temperature".to_string(), JsonValue::from(w.temperature.current));
        props.insert("min".to_string(), JsonValue::from(w.temperature.min));
        props.insert("max".to_string(), JsonValue::from(w.temperature.max));
    }

    Some(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    })
}
