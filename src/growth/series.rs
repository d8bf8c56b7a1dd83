//! Per-region case series with retroactive revision correction.
//!
//! A [`SeriesSet`] is the single source of truth for one source file: every
//! region gets a fixed-length, newest-first vector of cumulative counts
//! covering the file's whole date range. The nested output map is projected
//! from it once ingestion has finished.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::error::{IngestError, Result};
use crate::growth::types::{CaseRow, DATE_FORMAT, NYC_FIPS, SourceKind};

/// Cumulative counts for one region, newest first. Index `i` holds the count
/// reported `i` days before the file's latest date; `None` means no report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSeries {
    counts: Vec<Option<u64>>,
}

impl CaseSeries {
    fn with_len(len: usize) -> Self {
        Self {
            counts: vec![None; len],
        }
    }

    pub fn from_counts(counts: Vec<Option<u64>>) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> &[Option<u64>] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, offset: usize) -> Option<u64> {
        self.counts.get(offset).copied().flatten()
    }

    /// The `len` slots starting at `offset`, or `None` if the series ends
    /// before that.
    pub fn window(&self, offset: usize, len: usize) -> Option<&[Option<u64>]> {
        self.counts.get(offset..offset.checked_add(len)?)
    }

    /// Records `cases` at `offset`, then lowers any directly preceding days
    /// that report more than `cases`. Returns how many days were lowered.
    ///
    /// A later, lower count means the earlier ones were wrong: a case was
    /// retracted or reassigned elsewhere. The walk stops at the first day
    /// that is missing or not higher.
    fn record(&mut self, offset: usize, cases: u64) -> usize {
        self.counts[offset] = Some(cases);

        let mut lowered = 0;
        for slot in self.counts.iter_mut().skip(offset + 1) {
            match slot {
                Some(previous) if *previous > cases => {
                    *previous = cases;
                    lowered += 1;
                }
                _ => break,
            }
        }
        lowered
    }
}

/// All region series built from one source file.
#[derive(Debug, Clone)]
pub struct SeriesSet {
    kind: SourceKind,
    latest: NaiveDate,
    total_days: usize,
    series: BTreeMap<String, CaseSeries>,
}

impl SeriesSet {
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The most recent date reported anywhere in the file.
    pub fn latest(&self) -> NaiveDate {
        self.latest
    }

    /// Days between the earliest and latest report, inclusive.
    pub fn total_days(&self) -> usize {
        self.total_days
    }

    pub fn get(&self, fips: &str) -> Option<&CaseSeries> {
        self.series.get(fips)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &CaseSeries)> + '_ {
        self.series.iter().map(|(fips, series)| (fips.as_str(), series))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Calendar date for a series offset.
    pub fn date_at(&self, offset: usize) -> NaiveDate {
        self.latest - Duration::days(offset as i64)
    }

    /// Series offset for a calendar date, if it falls inside the file's range.
    pub fn offset_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = usize::try_from((self.latest - date).num_days()).ok()?;
        (offset < self.total_days).then_some(offset)
    }
}

struct ParsedRow {
    date: NaiveDate,
    fips: Option<String>,
    cases: u64,
}

fn parse_row(row: &CaseRow, kind: SourceKind) -> Result<ParsedRow> {
    let date = NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT).map_err(|source| {
        IngestError::InvalidDate {
            line: row.line,
            value: row.date.clone(),
            source,
        }
    })?;

    let cases_text = row.cases.trim();
    let cases = if cases_text.is_empty() {
        0
    } else {
        cases_text
            .parse::<u64>()
            .map_err(|source| IngestError::InvalidCount {
                line: row.line,
                value: row.cases.clone(),
                source,
            })?
    };

    let fips = match row.fips.trim() {
        "" if kind == SourceKind::County && row.county == "New York City" => {
            Some(NYC_FIPS.to_string())
        }
        "" => None,
        code => Some(code.to_string()),
    };

    Ok(ParsedRow { date, fips, cases })
}

/// Builds the per-region series for one source file, applying revision
/// correction as each row lands.
///
/// Rows are expected in chronological order. Any malformed date or count
/// fails the whole file. Rows without a FIPS code are dropped, except New
/// York City in the county file, which gets [`NYC_FIPS`].
pub fn build_series(rows: &[CaseRow], kind: SourceKind) -> Result<SeriesSet> {
    let parsed = rows
        .iter()
        .map(|row| parse_row(row, kind))
        .collect::<Result<Vec<_>>>()?;

    let earliest = parsed.iter().map(|r| r.date).min().ok_or(IngestError::NoReports)?;
    let latest = parsed.iter().map(|r| r.date).max().ok_or(IngestError::NoReports)?;
    let total_days = (latest - earliest).num_days() as usize + 1;

    let mut series: BTreeMap<String, CaseSeries> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut corrected_days = 0usize;

    for row in parsed {
        let Some(fips) = row.fips else {
            dropped += 1;
            continue;
        };

        let offset = (latest - row.date).num_days() as usize;
        let lowered = series
            .entry(fips.clone())
            .or_insert_with(|| CaseSeries::with_len(total_days))
            .record(offset, row.cases);

        if lowered > 0 {
            trace!(
                fips = %fips,
                date = %row.date,
                cases = row.cases,
                lowered,
                "Lowered over-reported preceding days"
            );
            corrected_days += lowered;
        }
    }

    debug!(
        kind = kind.name(),
        rows = rows.len(),
        regions = series.len(),
        dropped,
        corrected_days,
        %earliest,
        %latest,
        "Built case series"
    );

    Ok(SeriesSet {
        kind,
        latest,
        total_days,
        series,
    })
}
