//! FIPS reference lookup built from the census county population estimates.
//!
//! The census file (`co-est2019-alldata.csv`) is Latin-1 encoded and holds
//! one row per county plus one summary row per state (county code `000`).

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::mem::decode_latin1;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

const STATE_CODE: usize = 3;
const COUNTY_CODE: usize = 4;
const STATE_NAME: usize = 5;
const COUNTY_NAME: usize = 6;
const POPULATION: usize = 18;

/// Reference attributes for one state or county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionInfo {
    /// Empty for states.
    pub county: String,
    pub state: String,
    pub population: u64,
}

/// `fips -> RegionInfo`; two-digit keys for states, five-digit for counties.
pub type FipsLookup = BTreeMap<String, RegionInfo>;

fn column<'r>(record: &'r StringRecord, index: usize, line: usize) -> Result<&'r str> {
    record
        .get(index)
        .with_context(|| format!("line {line}: missing column {index}"))
}

fn number(record: &StringRecord, index: usize, line: usize) -> Result<u64> {
    let value = column(record, index, line)?;
    value
        .trim()
        .parse()
        .with_context(|| format!("line {line}: invalid number {value:?} in column {index}"))
}

/// Parses the census CSV bytes into a FIPS lookup.
pub fn read_census(bytes: &[u8]) -> Result<FipsLookup> {
    let text = decode_latin1(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut lookup = FipsLookup::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = index + 2;

        let state_code = number(&record, STATE_CODE, line)?;
        let county_code = number(&record, COUNTY_CODE, line)?;
        let is_state = county_code == 0;

        let fips = if is_state {
            format!("{state_code:02}")
        } else {
            format!("{state_code:02}{county_code:03}")
        };

        let county = if is_state {
            String::new()
        } else {
            column(&record, COUNTY_NAME, line)?.to_string()
        };

        lookup.insert(
            fips,
            RegionInfo {
                county,
                state: column(&record, STATE_NAME, line)?.to_string(),
                population: number(&record, POPULATION, line)?,
            },
        );
    }

    debug!(regions = lookup.len(), "Read census reference data");
    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "SUMLEV,REGION,DIVISION,STATE,COUNTY,STNAME,CTYNAME,\
                          C7,C8,C9,C10,C11,C12,C13,C14,C15,C16,C17,POPESTIMATE2019";

    fn row(state: &str, county: &str, st_name: &str, cty_name: &str, pop: &str) -> String {
        format!("050,1,2,{state},{county},{st_name},{cty_name},0,0,0,0,0,0,0,0,0,0,0,{pop}")
    }

    #[test]
    fn test_state_and_county_keys() {
        let csv = [
            HEADER.to_string(),
            row("34", "000", "New Jersey", "New Jersey", "8882190"),
            row("34", "003", "New Jersey", "Bergen County", "932202"),
            row("2", "13", "Alaska", "Aleutians East Borough", "3337"),
        ]
        .join("\n");

        let lookup = read_census(csv.as_bytes()).unwrap();

        assert_eq!(
            lookup["34"],
            RegionInfo {
                county: String::new(),
                state: "New Jersey".to_string(),
                population: 8882190,
            }
        );
        assert_eq!(lookup["34003"].county, "Bergen County");
        assert_eq!(lookup["34003"].population, 932202);
        assert_eq!(lookup["02013"].state, "Alaska");
    }

    #[test]
    fn test_latin1_names_are_decoded() {
        let mut csv = format!("{HEADER}\n").into_bytes();
        csv.extend_from_slice(b"050,1,2,35,013,New Mexico,Do\xf1a Ana County,0,0,0,0,0,0,0,0,0,0,0,218195");

        let lookup = read_census(&csv).unwrap();
        assert_eq!(lookup["35013"].county, "Doña Ana County");
    }

    #[test]
    fn test_bad_population_is_an_error() {
        let csv = [HEADER.to_string(), row("34", "003", "New Jersey", "Bergen", "n/a")].join("\n");
        assert!(read_census(csv.as_bytes()).is_err());
    }
}
