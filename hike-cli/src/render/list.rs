use hike_core::HikingDay;

use super::{condition_emoji, sorted_by_date};

pub fn render(days: &[HikingDay]) -> String {
    if days.is_empty() {
        return "No hiking days planned yet. Add one with `hike add <date> <place>`.\n".to_string();
    }

    sorted_by_date(days)
        .into_iter()
        .map(render_day)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One card: header line, id, then the weather line.
pub fn render_day(day: &HikingDay) -> String {
    let mut lines = vec![
        format!("{}  {}", day.date.format("%a %d %b %Y"), day.location.name),
        format!("  id: {}", day.id),
    ];

    match &day.weather {
        Some(w) => {
            lines.push(format!(
                "  {} {}  {:.1}°C ({:.1}° / {:.1}°)",
                condition_emoji(&w.condition.main),
                w.condition.description,
                w.temperature.current,
                w.temperature.min,
                w.temperature.max,
            ));
            lines.push(format!(
                "  precip {:.1} mm  humidity {:.0}%  pressure {:.0} hPa  wind {:.1} m/s {}",
                w.precipitation,
                w.humidity,
                w.pressure,
                w.wind.speed,
                w.wind.direction_label(),
            ));
        }
        None if day.coordinates().is_none() => lines.push("  no coordinates, no forecast".into()),
        None => lines.push("  no weather yet".into()),
    }

    lines.iter().map(|line| format!("{line}\n")).collect()
}
