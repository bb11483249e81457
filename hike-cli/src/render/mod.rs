//! Projections of the planned days. Pure functions over a borrowed slice.

use hike_core::{HikingDay, ViewMode};

pub mod calendar;
pub mod list;
pub mod map;

pub fn render(mode: ViewMode, days: &[HikingDay]) -> anyhow::Result<String> {
    match mode {
        ViewMode::List => Ok(list::render(days)),
        ViewMode::Calendar => Ok(calendar::render(days)),
        ViewMode::Map => map::render(days),
    }
}

pub(crate) fn condition_emoji(main: &str) -> &'static str {
    match main.to_lowercase().as_str() {
        "clear" => "☀️",
        "clouds" => "☁️",
        "rain" | "drizzle" => "🌧️",
        "snow" => "❄️",
        "thunderstorm" => "⛈️",
        _ => "🌤️",
    }
}

/// Days ordered by date; ties keep collection order.
pub(crate) fn sorted_by_date(days: &[HikingDay]) -> Vec<&HikingDay> {
    let mut sorted: Vec<&HikingDay> = days.iter().collect();
    sorted.sort_by_key(|d| d.date);
    sorted
}
