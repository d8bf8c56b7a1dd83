//! Data types shared by the growth pipeline.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Minimum cumulative count a window must start from before growth metrics
/// are estimated for it.
pub const MIN_CASE_COUNT: u64 = 50;

/// Trailing days used for growth metrics unless configured otherwise.
pub const DEFAULT_GROWTH_METRIC_DAYS: usize = 5;

/// Stand-in FIPS code for New York City, which the county file reports as a
/// single aggregate with no FIPS code.
pub const NYC_FIPS: &str = "-10003";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which granularity a source file reports at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    State,
    County,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::State => "state",
            SourceKind::County => "county",
        }
    }
}

/// One raw report row, exactly as read from a state or county CSV.
///
/// Values are kept as text; they are parsed by the series builder, which is
/// where a malformed date or count becomes a fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseRow {
    /// 1-based line number in the source file (the header is line 1).
    pub line: usize,
    pub date: String,
    pub county: String,
    pub state: String,
    pub fips: String,
    pub cases: String,
    pub deaths: String,
}

impl CaseRow {
    /// Builds a state-file row.
    pub fn state(date: &str, fips: &str, cases: &str) -> Self {
        Self {
            date: date.to_string(),
            fips: fips.to_string(),
            cases: cases.to_string(),
            ..Default::default()
        }
    }

    /// Builds a county-file row.
    pub fn county(date: &str, county: &str, fips: &str, cases: &str) -> Self {
        Self {
            date: date.to_string(),
            county: county.to_string(),
            fips: fips.to_string(),
            cases: cases.to_string(),
            ..Default::default()
        }
    }
}

/// Major axis of the nested case map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Axis {
    /// `date -> fips -> record`
    #[default]
    DateFirst,
    /// `fips -> date -> record`
    FipsFirst,
}

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct GrowthConfig {
    pub growth_metric_days: usize,
    pub min_case_count: u64,
    pub axis: Axis,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            growth_metric_days: DEFAULT_GROWTH_METRIC_DAYS,
            min_case_count: MIN_CASE_COUNT,
            axis: Axis::DateFirst,
        }
    }
}

/// The output leaf for one date/region pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    pub cases: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doubling_time: Option<f64>,
}

impl CaseRecord {
    pub fn new(cases: u64) -> Self {
        Self {
            cases,
            growth_factor: None,
            doubling_time: None,
        }
    }
}

/// Two-level ordered map of case records. Serializes as a plain nested JSON
/// object keyed according to its [`Axis`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseMap {
    axis: Axis,
    entries: BTreeMap<String, BTreeMap<String, CaseRecord>>,
}

impl CaseMap {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            entries: BTreeMap::new(),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    fn keys<'a>(&self, date: &'a str, fips: &'a str) -> (&'a str, &'a str) {
        match self.axis {
            Axis::DateFirst => (date, fips),
            Axis::FipsFirst => (fips, date),
        }
    }

    pub fn insert(&mut self, date: &str, fips: &str, record: CaseRecord) {
        let (outer, inner) = self.keys(date, fips);
        self.entries
            .entry(outer.to_string())
            .or_default()
            .insert(inner.to_string(), record);
    }

    pub fn get(&self, date: &str, fips: &str) -> Option<&CaseRecord> {
        let (outer, inner) = self.keys(date, fips);
        self.entries.get(outer)?.get(inner)
    }

    /// Number of date/region records.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(date, fips, record)` regardless of axis.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str, &CaseRecord)> + '_ {
        self.entries.iter().flat_map(move |(outer, inner_map)| {
            inner_map.iter().map(move |(inner, record)| match self.axis {
                Axis::DateFirst => (outer.as_str(), inner.as_str(), record),
                Axis::FipsFirst => (inner.as_str(), outer.as_str(), record),
            })
        })
    }
}

impl Serialize for CaseMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// `fips -> chronological smoothed daily new cases`.
pub type NewCaseMap = BTreeMap<String, Vec<f64>>;
