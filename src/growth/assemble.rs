//! Assembles the two published datasets from state and county rows.

use tracing::info;

use crate::error::Result;
use crate::growth::increases::daily_increases;
use crate::growth::metrics::record_growth_metrics;
use crate::growth::series::{CaseSeries, SeriesSet, build_series};
use crate::growth::types::{CaseMap, CaseRow, GrowthConfig, NewCaseMap, SourceKind};

/// Runs one source file through series building and growth metrics, adding
/// its records to `map`.
pub fn generate_covid_data(
    rows: &[CaseRow],
    kind: SourceKind,
    map: CaseMap,
    config: &GrowthConfig,
) -> Result<CaseMap> {
    let set = build_series(rows, kind)?;
    Ok(record_growth_metrics(map, &set, config))
}

/// Builds the cases dataset: state records first, then county records layered
/// into the same map. State and county FIPS codes differ in length, so
/// neither overwrites the other.
#[tracing::instrument(skip_all, fields(states = states.len(), counties = counties.len()))]
pub fn generate_case_data(
    states: &[CaseRow],
    counties: &[CaseRow],
    config: &GrowthConfig,
) -> Result<CaseMap> {
    let map = CaseMap::new(config.axis);
    let map = generate_covid_data(states, SourceKind::State, map, config)?;
    let map = generate_covid_data(counties, SourceKind::County, map, config)?;

    info!(
        records = map.len(),
        growth_metric_days = config.growth_metric_days,
        "Case dataset assembled"
    );
    Ok(map)
}

/// Drops the run of exactly-zero increases at the front of a newest-first
/// sequence. Zeros at the live edge usually mean the latest day has not been
/// reported yet.
pub fn trim_leading_zeros(increases: &[f64]) -> &[f64] {
    let start = increases
        .iter()
        .position(|&increase| increase != 0.0)
        .unwrap_or(increases.len());
    &increases[start..]
}

/// Chronological smoothed daily new cases for one region, counted from the
/// first day its cumulative total reached `min_case_count`.
///
/// Returns `None` when the region never produced a single increase.
pub fn new_case_sequence(series: &CaseSeries, min_case_count: u64) -> Option<Vec<f64>> {
    let counts: Vec<u64> = series
        .counts()
        .iter()
        .flatten()
        .copied()
        .filter(|&count| count >= min_case_count)
        .collect();

    let increases = daily_increases(&counts);
    if increases.is_empty() {
        return None;
    }

    let mut sequence = trim_leading_zeros(&increases).to_vec();
    sequence.reverse();
    Some(sequence)
}

/// New-case sequences for every region in one source file.
pub fn generate_new_case_data(set: &SeriesSet, min_case_count: u64) -> NewCaseMap {
    set.regions()
        .filter_map(|(fips, series)| {
            new_case_sequence(series, min_case_count).map(|sequence| (fips.to_string(), sequence))
        })
        .collect()
}

/// Builds the new-case dataset from both source files.
#[tracing::instrument(skip_all, fields(states = states.len(), counties = counties.len()))]
pub fn generate_new_case_json(
    states: &[CaseRow],
    counties: &[CaseRow],
    min_case_count: u64,
) -> Result<NewCaseMap> {
    let state_set = build_series(states, SourceKind::State)?;
    let county_set = build_series(counties, SourceKind::County)?;

    let mut data = generate_new_case_data(&state_set, min_case_count);
    data.extend(generate_new_case_data(&county_set, min_case_count));

    info!(regions = data.len(), min_case_count, "New case dataset assembled");
    Ok(data)
}
