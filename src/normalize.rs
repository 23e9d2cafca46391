//! Locale-aware parsing helpers and the load-forecast aggregation.
//!
//! Everything here is pure and deterministic: the same raw input always
//! yields the same canonical output, independent of call order. Source
//! adapters depend on this module; it depends on nothing but `chrono`.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::LoadForecast;

/// Canonicalize a header cell for synonym matching: trim, strip a UTF-8 BOM,
/// lowercase.
///
/// Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
/// first header (e.g. "﻿Data"). If we don't strip it, schema resolution will
/// incorrectly report missing columns.
pub fn canonical_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parse a decimal that may use a comma as the decimal separator
/// (`"12,34"` -> `12.34`). Non-finite values are rejected.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let v = trimmed.replace(',', ".").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Parse a date with explicit day-first resolution.
///
/// Flat-file sources write ambiguous numeric dates (`31/01/2021`); day must
/// resolve before month. ISO input is accepted as well, so already-normalized
/// data round-trips.
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];
    let trimmed = raw.trim();
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Sum raw load readings by (date, zone).
///
/// Raw zonal exports are sub-daily; the store only keeps daily granularity.
/// A `BTreeMap` keeps the output order deterministic (date, then zone).
pub fn aggregate_load(rows: Vec<LoadForecast>) -> Vec<LoadForecast> {
    let mut totals: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();
    for row in rows {
        *totals.entry((row.date, row.zone)).or_insert(0.0) += row.load_mw;
    }
    totals
        .into_iter()
        .map(|((date, zone), load_mw)| LoadForecast { date, zone, load_mw })
        .collect()
}
