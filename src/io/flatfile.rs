//! Semicolon-delimited flat-file ingestion: PUN index and zonal load
//! forecast.
//!
//! These exports come from different portals with inconsistent header names
//! and an Italian decimal locale, so:
//!
//! - headers match case/whitespace-insensitively against a synonym table
//! - decimal commas are rewritten to dots before numeric parsing
//! - dates resolve day-first (`31/01/2021` -> `2021-01-31`)
//!
//! A file missing required columns after synonym resolution is a
//! [`Error::SchemaMismatch`] and aborts that file's ingestion wholesale; a
//! row with an unparseable date or value is dropped (and counted), never
//! fatal. Both families are authoritative snapshots: the caller writes them
//! with full-replace semantics.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::data::{FetchOutcome, SourceAdapter};
use crate::domain::{IndexPrice, LoadForecast};
use crate::error::Error;
use crate::normalize::{aggregate_load, canonical_header, parse_day_first_date, parse_decimal};

const DATE_SYNONYMS: [&str; 3] = ["date", "data", "giorno"];
const PRICE_SYNONYMS: [&str; 3] = ["price", "prezzo", "€/mwh"];
const ZONE_SYNONYMS: [&str; 2] = ["zone", "zona"];
const LOAD_SYNONYMS: [&str; 3] = ["load [mw]", "load_mw", "load"];

/// Daily national index price export (one price per day).
pub struct IndexPriceFile;

/// Zonal load-forecast export (sub-daily readings, aggregated on ingest).
pub struct LoadForecastFile;

impl SourceAdapter for IndexPriceFile {
    type Params = PathBuf;
    type Row = IndexPrice;

    fn fetch(&self, path: &PathBuf) -> Result<FetchOutcome<IndexPrice>, Error> {
        let file = open(path)?;
        parse_index(file, path)
    }
}

impl SourceAdapter for LoadForecastFile {
    type Params = PathBuf;
    type Row = LoadForecast;

    fn fetch(&self, path: &PathBuf) -> Result<FetchOutcome<LoadForecast>, Error> {
        let file = open(path)?;
        parse_load(file, path)
    }
}

fn open(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse the index-price file: requires `date` and `price` columns.
///
/// Rows are returned sorted by date. Duplicate dates are possible in sloppy
/// exports; the writer keeps the last occurrence.
pub fn parse_index<R: Read>(reader: R, path: &Path) -> Result<FetchOutcome<IndexPrice>, Error> {
    let mut rdr = semicolon_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = HeaderColumns::resolve(
        &headers,
        path,
        &[("date", &DATE_SYNONYMS[..]), ("price", &PRICE_SYNONYMS[..])],
    )?;

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    for record in rdr.records() {
        let record = record?;
        let Some(date) = columns.get(&record, "date").and_then(parse_day_first_date) else {
            malformed += 1;
            continue;
        };
        let Some(price) = columns.get(&record, "price").and_then(parse_decimal) else {
            malformed += 1;
            continue;
        };
        rows.push(IndexPrice { date, price });
    }

    rows.sort_by_key(|r| r.date);
    Ok(FetchOutcome::Rows { rows, malformed })
}

/// Parse the load-forecast file: requires `date`, `zone` and `load_mw`
/// columns. Raw readings are summed by (date, zone) before returning.
pub fn parse_load<R: Read>(reader: R, path: &Path) -> Result<FetchOutcome<LoadForecast>, Error> {
    let mut rdr = semicolon_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = HeaderColumns::resolve(
        &headers,
        path,
        &[
            ("date", &DATE_SYNONYMS[..]),
            ("zone", &ZONE_SYNONYMS[..]),
            ("load_mw", &LOAD_SYNONYMS[..]),
        ],
    )?;

    let mut raw = Vec::new();
    let mut malformed = 0usize;
    for record in rdr.records() {
        let record = record?;
        let Some(date) = columns.get(&record, "date").and_then(parse_day_first_date) else {
            malformed += 1;
            continue;
        };
        let Some(zone) = columns.get(&record, "zone").filter(|z| !z.is_empty()) else {
            malformed += 1;
            continue;
        };
        let Some(load_mw) = columns.get(&record, "load_mw").and_then(parse_decimal) else {
            malformed += 1;
            continue;
        };
        raw.push(LoadForecast {
            date,
            zone: zone.to_string(),
            load_mw,
        });
    }

    Ok(FetchOutcome::Rows {
        rows: aggregate_load(raw),
        malformed,
    })
}

fn semicolon_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Canonical column name -> index, after synonym resolution.
struct HeaderColumns {
    by_name: HashMap<&'static str, usize>,
}

impl HeaderColumns {
    /// Resolve every required canonical column against the file's headers.
    /// Any unresolved column fails the whole file.
    fn resolve(
        headers: &StringRecord,
        path: &Path,
        required: &[(&'static str, &[&str])],
    ) -> Result<Self, Error> {
        let canonical: Vec<String> = headers.iter().map(canonical_header).collect();

        let mut by_name = HashMap::new();
        let mut missing = Vec::new();
        for (name, synonyms) in required {
            match canonical
                .iter()
                .position(|h| synonyms.contains(&h.as_str()))
            {
                Some(idx) => {
                    by_name.insert(*name, idx);
                }
                None => missing.push((*name).to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::SchemaMismatch {
                path: path.to_path_buf(),
                missing,
                found: headers.iter().map(str::to_string).collect(),
            });
        }
        Ok(Self { by_name })
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &'static str) -> Option<&'r str> {
        let idx = *self.by_name.get(name)?;
        record.get(idx).map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_rows(csv: &str) -> Result<FetchOutcome<IndexPrice>, Error> {
        parse_index(csv.as_bytes(), Path::new("test.csv"))
    }

    fn load_rows(csv: &str) -> Result<FetchOutcome<LoadForecast>, Error> {
        parse_load(csv.as_bytes(), Path::new("test.csv"))
    }

    fn unwrap_rows<T>(outcome: FetchOutcome<T>) -> (Vec<T>, usize) {
        match outcome {
            FetchOutcome::Rows { rows, malformed } => (rows, malformed),
            FetchOutcome::Empty => panic!("expected rows"),
        }
    }

    #[test]
    fn index_parses_italian_headers_and_locale() {
        let (rows, malformed) =
            unwrap_rows(index_rows("Data;€/MWh\n31/01/2021;12,34\n01/02/2021;56,78\n").unwrap());
        assert_eq!(malformed, 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date.to_string(), "2021-01-31");
        assert!((rows[0].price - 12.34).abs() < 1e-12);
        assert_eq!(rows[1].date.to_string(), "2021-02-01");
    }

    #[test]
    fn index_accepts_synonym_headers() {
        let (rows, _) = unwrap_rows(index_rows("giorno;Prezzo\n05/03/2021;70,1\n").unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date.to_string(), "2021-03-05");
    }

    #[test]
    fn index_rows_come_back_sorted_by_date() {
        let (rows, _) =
            unwrap_rows(index_rows("data;prezzo\n02/01/2021;2,0\n01/01/2021;1,0\n").unwrap());
        assert_eq!(rows[0].date.to_string(), "2021-01-01");
        assert_eq!(rows[1].date.to_string(), "2021-01-02");
    }

    #[test]
    fn index_missing_column_is_a_schema_mismatch() {
        let err = index_rows("Data;Volume\n31/01/2021;100\n").unwrap_err();
        match err {
            Error::SchemaMismatch { missing, found, .. } => {
                assert_eq!(missing, vec!["price".to_string()]);
                assert_eq!(found, vec!["Data".to_string(), "Volume".to_string()]);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn index_bad_dates_are_dropped_not_fatal() {
        let (rows, malformed) = unwrap_rows(
            index_rows("data;prezzo\nnot-a-date;1,0\n31/01/2021;2,0\n31/01/2021;\n").unwrap(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(malformed, 2);
    }

    #[test]
    fn index_handles_bom_header() {
        let (rows, _) = unwrap_rows(index_rows("\u{feff}Data;€/MWh\n31/01/2021;1,5\n").unwrap());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn load_sums_subdaily_readings_per_date_zone() {
        let (rows, malformed) = unwrap_rows(
            load_rows(
                "Date;Zone;Load [MW]\n\
                 01/01/2021;NORD;100,0\n\
                 01/01/2021;NORD;50,5\n\
                 01/01/2021;NORD;25,25\n\
                 01/01/2021;SUD;10,0\n",
            )
            .unwrap(),
        );
        assert_eq!(malformed, 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].zone, "NORD");
        assert!((rows[0].load_mw - 175.75).abs() < 1e-12);
        assert!((rows[1].load_mw - 10.0).abs() < 1e-12);
    }

    #[test]
    fn load_missing_zone_column_is_a_schema_mismatch() {
        let err = load_rows("Date;Load [MW]\n01/01/2021;100\n").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn load_rows_with_blank_zone_or_value_are_dropped() {
        let (rows, malformed) = unwrap_rows(
            load_rows(
                "Date;Zone;Load [MW]\n\
                 01/01/2021;;100,0\n\
                 01/01/2021;NORD;abc\n\
                 01/01/2021;NORD;42,0\n",
            )
            .unwrap(),
        );
        assert_eq!(rows.len(), 1);
        assert!((rows[0].load_mw - 42.0).abs() < 1e-12);
        assert_eq!(malformed, 2);
    }

    #[test]
    fn headers_only_file_yields_no_rows() {
        let (rows, malformed) = unwrap_rows(index_rows("data;prezzo\n").unwrap());
        assert!(rows.is_empty());
        assert_eq!(malformed, 0);
    }
}
