use crate::classifier::ClassifiedDataset;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Parses a period value into the first day of its calendar month.
///
/// Accepted forms: ISO month ("2024-01"), full date ("2024-01-15"),
/// abbreviated month name ("Jan 2024", "Jan-2024") and full month name
/// ("January 2024"). Returns `None` for anything else.
pub fn parse_period(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.with_day(1);
    }

    // Month-name forms, with "Jan-2024" normalized to "Jan 2024".
    let spaced = value.replace('-', " ");
    for fmt in ["%d %b %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("01 {}", spaced), fmt) {
            return Some(date);
        }
    }

    None
}

/// Renders a period as its display label, e.g. "Jan 2024".
pub fn period_label(period: NaiveDate) -> String {
    period.format("%b %Y").to_string()
}

/// Partitions a dataset by calendar month.
///
/// Rows without a period are absent from every segment; each sub-dataset can
/// be fed to the metrics and recommendation engines independently. Keys are
/// first-of-month dates so iteration is chronological; `period_label` renders
/// the user-facing form.
pub fn segment(dataset: &ClassifiedDataset) -> BTreeMap<NaiveDate, ClassifiedDataset> {
    let mut segments: BTreeMap<NaiveDate, Vec<_>> = BTreeMap::new();

    for row in dataset.rows() {
        if let Some(period) = row.period {
            segments.entry(period).or_default().push(row.clone());
        }
    }

    segments
        .into_iter()
        .map(|(period, rows)| (period, ClassifiedDataset::from_rows(rows)))
        .collect()
}
