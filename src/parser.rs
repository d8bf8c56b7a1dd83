//! CSV parser for state and county case report files.
//!
//! Expected layouts (header row required and skipped):
//!
//! ```text
//! date,state,fips,cases,deaths
//! date,county,state,fips,cases,deaths
//! ```

use csv::{ReaderBuilder, StringRecord};

use crate::error::{IngestError, Result};
use crate::growth::types::{CaseRow, SourceKind};

/// Column offsets for one source layout.
struct Layout {
    date: usize,
    county: Option<usize>,
    state: usize,
    fips: usize,
    cases: usize,
    deaths: usize,
}

fn layout(kind: SourceKind) -> Layout {
    match kind {
        SourceKind::State => Layout {
            date: 0,
            county: None,
            state: 1,
            fips: 2,
            cases: 3,
            deaths: 4,
        },
        SourceKind::County => Layout {
            date: 0,
            county: Some(1),
            state: 2,
            fips: 3,
            cases: 4,
            deaths: 5,
        },
    }
}

fn required(record: &StringRecord, index: usize, column: &'static str, line: usize) -> Result<String> {
    record
        .get(index)
        .map(str::to_string)
        .ok_or(IngestError::MissingColumn { line, column })
}

/// Decodes CSV bytes into report rows. Values are not interpreted here.
///
/// # Errors
///
/// Fails on malformed CSV or when a row lacks the date, state, FIPS or cases
/// column.
pub fn parse_case_csv(bytes: &[u8], kind: SourceKind) -> Result<Vec<CaseRow>> {
    let layout = layout(kind);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(index + 2);

        let county = match layout.county {
            Some(column) => required(&record, column, "county", line)?,
            None => String::new(),
        };

        rows.push(CaseRow {
            line,
            date: required(&record, layout.date, "date", line)?,
            county,
            state: required(&record, layout.state, "state", line)?,
            fips: required(&record, layout.fips, "fips", line)?,
            cases: required(&record, layout.cases, "cases", line)?,
            deaths: record.get(layout.deaths).unwrap_or_default().to_string(),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_file() {
        let csv = "date,state,fips,cases,deaths\n\
                   2020-01-21,Washington,53,1,0\n\
                   2020-01-22,Washington,53,1,0\n";
        let rows = parse_case_csv(csv.as_bytes(), SourceKind::State).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[0].date, "2020-01-21");
        assert_eq!(rows[0].state, "Washington");
        assert_eq!(rows[0].fips, "53");
        assert_eq!(rows[0].cases, "1");
        assert_eq!(rows[0].county, "");
    }

    #[test]
    fn test_parse_county_file_keeps_blank_fips() {
        let csv = "date,county,state,fips,cases,deaths\n\
                   2020-03-01,New York City,New York,,1,0\n\
                   2020-03-01,Snohomish,Washington,53061,912,23\n";
        let rows = parse_case_csv(csv.as_bytes(), SourceKind::County).unwrap();

        assert_eq!(rows[0].county, "New York City");
        assert_eq!(rows[0].fips, "");
        assert_eq!(rows[1].fips, "53061");
        assert_eq!(rows[1].cases, "912");
        assert_eq!(rows[1].deaths, "23");
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let csv = "date,state,fips,cases,deaths\n";
        let rows = parse_case_csv(csv.as_bytes(), SourceKind::State).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_short_row_is_rejected() {
        let csv = "date,state,fips,cases,deaths\n\
                   2020-01-21,Washington,53,1,0\n\
                   2020-01-22,Washington\n";
        let err = parse_case_csv(csv.as_bytes(), SourceKind::State).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn {
                line: 3,
                column: "fips"
            }
        ));
    }
}
