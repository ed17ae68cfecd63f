//! Per-page series built from the output file.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::io::PlotRecord;

/// One page's views over time, ordered by day.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub key: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl PlotSeries {
    /// `(day number, value)` pairs; days are counted from 0001-01-01 (CE).
    pub fn numeric_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|&(day, value)| (day_number(day), value))
            .collect()
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let first = self.points.first().map(|(d, _)| day_number(*d)).unwrap_or(0.0);
        let last = self.points.last().map(|(d, _)| day_number(*d)).unwrap_or(first);
        if last > first {
            [first, last]
        } else {
            [first - 1.0, first + 1.0]
        }
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(_, y) in &self.points {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            return [0.0, 1.0];
        }
        if y_max <= y_min {
            return [y_min - 1.0, y_max + 1.0];
        }
        let pad = (y_max - y_min) * 0.05;
        [y_min - pad, y_max + pad]
    }
}

/// Group records by their leading key; keys sorted, each series sorted by day.
pub fn group_series(records: &[PlotRecord]) -> Vec<PlotSeries> {
    let mut by_key: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for rec in records {
        by_key.entry(rec.key.as_str()).or_default().push((rec.day, rec.value));
    }

    by_key
        .into_iter()
        .map(|(key, mut points)| {
            // Stable: same-day duplicates keep file order.
            points.sort_by_key(|(day, _)| *day);
            PlotSeries {
                key: key.to_string(),
                points,
            }
        })
        .collect()
}

/// Series whose key contains `needle`.
pub fn filter_series(series: Vec<PlotSeries>, needle: &str) -> Vec<PlotSeries> {
    series.into_iter().filter(|s| s.key.contains(needle)).collect()
}

/// File stem for a key: path separators removed, `root` when nothing is left.
pub fn series_file_stem(key: &str) -> String {
    let stem: String = key.chars().filter(|&c| c != '/' && c != '\\').collect();
    if stem.trim().is_empty() {
        "root".to_string()
    } else {
        stem
    }
}

pub fn day_number(day: NaiveDate) -> f64 {
    f64::from(day.num_days_from_ce())
}

/// Inverse of `day_number`, for axis labels.
pub fn day_from_number(value: f64) -> Option<NaiveDate> {
    if !value.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
}

/// Axis label for a day number, `MM-DD-YY`.
pub fn fmt_day_label(value: f64) -> String {
    day_from_number(value)
        .map(|d| d.format("%m-%d-%y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(key: &str, value: f64, d: NaiveDate) -> PlotRecord {
        PlotRecord {
            key: key.to_string(),
            value,
            day: d,
        }
    }

    #[test]
    fn groups_by_key_and_orders_by_day() {
        let records = vec![
            rec("/services/", 5.0, day(2015, 1, 3)),
            rec("/about/", 1.0, day(2015, 1, 2)),
            rec("/services/", 3.0, day(2015, 1, 1)),
            rec("/about/", 2.0, day(2015, 1, 1)),
        ];

        let series = group_series(&records);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, "/about/");
        assert_eq!(series[0].points, vec![(day(2015, 1, 1), 2.0), (day(2015, 1, 2), 1.0)]);
        assert_eq!(series[1].key, "/services/");
        assert_eq!(series[1].points, vec![(day(2015, 1, 1), 3.0), (day(2015, 1, 3), 5.0)]);
    }

    #[test]
    fn file_stem_strips_separators() {
        assert_eq!(series_file_stem("/services/"), "services");
        assert_eq!(series_file_stem("/high-performance-computing/"), "high-performance-computing");
        assert_eq!(series_file_stem("/"), "root");
    }

    #[test]
    fn day_numbers_round_trip_to_labels() {
        let d = day(2015, 3, 2);
        assert_eq!(day_from_number(day_number(d)), Some(d));
        assert_eq!(fmt_day_label(day_number(d)), "03-02-15");
        assert_eq!(day_number(day(2015, 3, 3)) - day_number(d), 1.0);
    }

    #[test]
    fn filter_keeps_substring_matches() {
        let records = vec![
            rec("/services/", 1.0, day(2015, 1, 1)),
            rec("/services/faq/", 1.0, day(2015, 1, 1)),
            rec("/about/", 1.0, day(2015, 1, 1)),
        ];
        let kept = filter_series(group_series(&records), "services");
        let keys: Vec<&str> = kept.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["/services/", "/services/faq/"]);
    }

    #[test]
    fn degenerate_bounds_are_widened() {
        let single = PlotSeries {
            key: "/a/".to_string(),
            points: vec![(day(2015, 1, 1), 4.0)],
        };
        let [x0, x1] = single.x_bounds();
        let [y0, y1] = single.y_bounds();
        assert!(x1 > x0);
        assert!(y1 > y0);
    }
}
