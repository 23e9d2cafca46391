//! Shared domain types.
//!
//! Canonical row shapes mirror the store's tables one field per column, so
//! the writer stays a straight mapping with no renaming left to do.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Commodity series available from the historical-price API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Commodity {
    CrudeOil,
    TtfGas,
    Gasoline,
    Brent,
    Coal,
}

impl Commodity {
    pub const ALL: [Self; 5] = [
        Self::CrudeOil,
        Self::TtfGas,
        Self::Gasoline,
        Self::Brent,
        Self::Coal,
    ];

    /// Series identifier as the remote API (and the store) spells it.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::CrudeOil => "crude_oil",
            Self::TtfGas => "ttf_gas",
            Self::Gasoline => "gasoline",
            Self::Brent => "brent",
            Self::Coal => "coal",
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// A tracked city with the coordinates used for weather pulls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// The nine cities covered by the weather table.
pub const CITIES: [City; 9] = [
    City { name: "milano", lat: 45.4642, lon: 9.19 },
    City { name: "roma", lat: 41.9028, lon: 12.4964 },
    City { name: "bologna", lat: 44.4949, lon: 11.3426 },
    City { name: "torino", lat: 45.0703, lon: 7.6869 },
    City { name: "venezia", lat: 45.4408, lon: 12.3155 },
    City { name: "napoli", lat: 40.8518, lon: 14.2681 },
    City { name: "bari", lat: 41.1171, lon: 16.8719 },
    City { name: "palermo", lat: 38.1157, lon: 13.3615 },
    City { name: "cagliari", lat: 39.2238, lon: 9.1217 },
];

impl City {
    pub fn by_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        CITIES.iter().copied().find(|c| c.name == wanted)
    }
}

/// A closed calendar-date range (`start <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::Config(format!(
                "invalid date range: {start} is after {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The full calendar year `Jan 1 ..= Dec 31`.
    pub fn calendar_year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self { start, end })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One commodity closing price for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityPrice {
    pub commodity: String,
    pub date: NaiveDate,
    pub price: f64,
    pub unit: String,
}

/// One day of the national electricity-price index (PUN, EUR/MWh).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPrice {
    pub date: NaiveDate,
    pub price: f64,
}

/// Total forecast load for one (day, market zone), in MW.
///
/// Raw exports carry sub-daily readings; rows of this type are always the
/// per-day sum (see `normalize::aggregate_load`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadForecast {
    pub date: NaiveDate,
    pub zone: String,
    pub load_mw: f64,
}

/// One day of observed weather for one city. Every measurement is optional;
/// stations report different subsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherDaily {
    pub city: String,
    pub date: NaiveDate,
    pub tavg: Option<f64>,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub prcp: Option<f64>,
    pub snow: Option<f64>,
    pub wdir: Option<f64>,
    pub wspd: Option<f64>,
    pub wpgt: Option<f64>,
    pub pres: Option<f64>,
    pub tsun: Option<f64>,
}

/// Everything one ingestion run needs, resolved up front.
///
/// API keys are read from the environment exactly once (in `app`) and carried
/// here; adapters never touch the environment themselves.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub db_path: PathBuf,
    pub tradefeeds_key: Option<String>,
    pub meteostat_key: Option<String>,
    pub commodities: Vec<Commodity>,
    /// One closed range per calendar year, fetched pair-by-pair.
    pub year_ranges: Vec<DateRange>,
    pub cities: Vec<City>,
    pub weather_range: DateRange,
    pub index_csv: PathBuf,
    pub load_csv: PathBuf,
    /// Minimum delay between successive calls to a rate-limited API.
    pub rate_limit: Duration,
}

impl IngestConfig {
    pub fn tradefeeds_key(&self) -> Result<&str, Error> {
        self.tradefeeds_key.as_deref().ok_or_else(|| {
            Error::Config("TRADEFEEDS_API_KEY is not set (environment or .env)".to_string())
        })
    }

    pub fn meteostat_key(&self) -> Result<&str, Error> {
        self.meteostat_key.as_deref().ok_or_else(|| {
            Error::Config("METEOSTAT_API_KEY is not set (environment or .env)".to_string())
        })
    }
}
