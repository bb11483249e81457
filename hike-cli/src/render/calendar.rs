use chrono::{Datelike, Months, NaiveDate};
use hike_core::HikingDay;
use std::collections::BTreeMap;

use super::{condition_emoji, sorted_by_date};

const WEEK_HEADER: &str = "Mo  Tu  We  Th  Fr  Sa  Su";

/// One Monday-first grid per month that has a planned day; planned days are
/// marked with `*` and listed under the grid.
pub fn render(days: &[HikingDay]) -> String {
    if days.is_empty() {
        return "No hiking days planned yet.\n".to_string();
    }

    let mut months: BTreeMap<(i32, u32), Vec<&HikingDay>> = BTreeMap::new();
    for day in sorted_by_date(days) {
        let date = day.day();
        months.entry((date.year(), date.month())).or_default().push(day);
    }

    months
        .into_iter()
        .filter_map(|((year, month), planned)| render_month(year, month, &planned))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_month(year: i32, month: u32, planned: &[&HikingDay]) -> Option<String> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = (first + Months::new(1)).pred_opt()?;
    let is_planned = |d: u32| planned.iter().any(|p| p.day().day() == d);

    let mut out = format!("{}\n{WEEK_HEADER}\n", first.format("%B %Y"));

    let mut cells: Vec<String> = (0..first.weekday().num_days_from_monday())
        .map(|_| "   ".to_string())
        .collect();
    cells.extend((1..=last.day()).map(|d| format!("{d:>2}{}", if is_planned(d) { '*' } else { ' ' })));

    for week in cells.chunks(7) {
        out.push_str(week.join(" ").trim_end());
        out.push('\n');
    }

    out.push('\n');
    for day in planned {
        let weather = day
            .weather
            .as_ref()
            .map(|w| {
                format!(
                    "  {} {:.0}°C",
                    condition_emoji(&w.condition.main),
                    w.temperature.current
                )
            })
            .unwrap_or_default();
        out.push_str(&format!(
            "  {} {}{}\n",
            day.date.format("%d %a"),
            day.location.name,
            weather
        ));
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hike_core::{Location, model::noon_local};

    fn planned(y: i32, m: u32, d: u32, name: &str) -> HikingDay {
        let date = noon_local(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        HikingDay::new(date, Location::named(name))
    }

    #[test]
    fn june_2025_grid_starts_on_sunday() {
        let out = render(&[planned(2025, 6, 14, "Semnoz")]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "June 2025");
        assert_eq!(lines[1], WEEK_HEADER);
        assert_eq!(lines[2].trim_start(), "1");
        assert_eq!(lines[2].len(), 6 * 4 + 2);
        assert!(lines[3].starts_with(" 2 "));
        assert!(out.contains("14*"));
        assert!(out.contains("  14 Sat Semnoz"));
    }

    #[test]
    fn one_grid_per_month_in_order() {
        let out = render(&[
            planned(2025, 8, 2, "August"),
            planned(2025, 7, 20, "July"),
            planned(2025, 7, 21, "July again"),
        ]);

        let july = out.find("July 2025").unwrap();
        let august = out.find("August 2025").unwrap();
        assert!(july < august);
        assert_eq!(out.matches("Mo  Tu").count(), 2);
        assert!(out.contains("20*") && out.contains("21*") && out.contains(" 2*"));
    }

    #[test]
    fn december_rolls_over_year() {
        let out = render(&[planned(2025, 12, 31, "New Year's Eve")]);
        assert!(out.contains("December 2025"));
        assert!(out.contains("31*"));
    }
}
