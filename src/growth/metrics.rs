//! Growth factor and doubling time for each date/region pair.

use tracing::debug;

use crate::growth::math::{averaged_doubling_time, growth_factor};
use crate::growth::series::{CaseSeries, SeriesSet};
use crate::growth::types::{CaseMap, CaseRecord, DATE_FORMAT, GrowthConfig};

/// The `growth_metric_days` counts ending at `offset` (newest first), if the
/// window is eligible for growth metrics: fully inside the series, no
/// missing days, and starting from at least `min_case_count` cases.
pub fn trailing_window(series: &CaseSeries, offset: usize, config: &GrowthConfig) -> Option<Vec<u64>> {
    let window = series.window(offset, config.growth_metric_days)?;
    let counts = window.iter().copied().collect::<Option<Vec<u64>>>()?;
    let oldest = *counts.last()?;
    (oldest >= config.min_case_count).then_some(counts)
}

/// Builds the output record for the report at `offset`, with growth metrics
/// attached when its trailing window allows. `None` if nothing was reported
/// that day.
pub fn case_record(series: &CaseSeries, offset: usize, config: &GrowthConfig) -> Option<CaseRecord> {
    let mut record = CaseRecord::new(series.get(offset)?);

    if let Some(window) = trailing_window(series, offset, config) {
        record.growth_factor = growth_factor(&window);
        record.doubling_time = averaged_doubling_time(&window);
    }

    Some(record)
}

/// Writes a record for every reported date/region pair in `set` into `map`.
///
/// Must run after the whole file has been ingested: a window can reach back
/// to days that were only corrected by later rows.
pub fn record_growth_metrics(mut map: CaseMap, set: &SeriesSet, config: &GrowthConfig) -> CaseMap {
    let mut records = 0usize;
    let mut with_growth_factor = 0usize;
    let mut with_doubling_time = 0usize;

    for (fips, series) in set.regions() {
        for offset in 0..series.len() {
            let Some(record) = case_record(series, offset, config) else {
                continue;
            };

            records += 1;
            with_growth_factor += usize::from(record.growth_factor.is_some());
            with_doubling_time += usize::from(record.doubling_time.is_some());

            let date = set.date_at(offset).format(DATE_FORMAT).to_string();
            map.insert(&date, fips, record);
        }
    }

    debug!(
        kind = set.kind().name(),
        records,
        with_growth_factor,
        with_doubling_time,
        "Recorded growth metrics"
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(days: usize) -> GrowthConfig {
        GrowthConfig {
            growth_metric_days: days,
            ..GrowthConfig::default()
        }
    }

    fn series(counts: &[Option<u64>]) -> CaseSeries {
        CaseSeries::from_counts(counts.to_vec())
    }

    #[test]
    fn test_trailing_window_requires_full_length() {
        let s = series(&[Some(90), Some(80), Some(70)]);
        assert_eq!(trailing_window(&s, 0, &config(3)), Some(vec![90, 80, 70]));
        assert_eq!(trailing_window(&s, 1, &config(3)), None);
    }

    #[test]
    fn test_trailing_window_rejects_gaps() {
        let s = series(&[Some(90), None, Some(70)]);
        assert_eq!(trailing_window(&s, 0, &config(3)), None);
    }

    #[test]
    fn test_trailing_window_threshold_applies_to_oldest_entry() {
        let s = series(&[Some(200), Some(100), Some(49)]);
        assert_eq!(trailing_window(&s, 0, &config(3)), None);

        let s = series(&[Some(200), Some(100), Some(50)]);
        assert_eq!(trailing_window(&s, 0, &config(3)), Some(vec![200, 100, 50]));
    }

    #[test]
    fn test_case_record_with_gap_has_no_metrics() {
        let s = series(&[Some(150), Some(120), None, Some(90), Some(80)]);
        let record = case_record(&s, 0, &config(5)).unwrap();
        assert_eq!(record, CaseRecord::new(150));
    }

    #[test]
    fn test_case_record_with_metrics() {
        let s = series(&[Some(150), Some(120), Some(100), Some(90), Some(80)]);
        let record = case_record(&s, 0, &config(5)).unwrap();
        assert_eq!(record.cases, 150);
        assert!((record.growth_factor.unwrap() - 1.5).abs() < 1e-9);
        assert!(record.doubling_time.unwrap() > 0.0);

        // Older entries do not have a full window behind them.
        assert_eq!(case_record(&s, 1, &config(5)), Some(CaseRecord::new(120)));
    }

    #[test]
    fn test_case_record_for_unreported_day() {
        let s = series(&[Some(150), None]);
        assert_eq!(case_record(&s, 1, &config(2)), None);
    }
}
