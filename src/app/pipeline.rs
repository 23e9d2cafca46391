//! The run orchestrator: adapters -> normalized rows -> store.
//!
//! One ingestion run is a sequential walk over (series, range) pairs or
//! files. A pair's failure is logged and recorded, and the loop continues;
//! only store and configuration errors end a run, since those are local and
//! every subsequent write would fail the same way. A blocking sleep between
//! network pairs keeps us inside the providers' rate limits.

use std::thread;

use crate::data::{
    CommodityQuery, FetchOutcome, MeteostatClient, SourceAdapter, TradefeedsClient, WeatherQuery,
};
use crate::domain::IngestConfig;
use crate::error::Error;
use crate::io::flatfile::{IndexPriceFile, LoadForecastFile};
use crate::store::{Store, WritePolicy};

/// Outcome of one (series, range) pair or one file.
#[derive(Debug, Clone, PartialEq)]
pub enum PairStatus {
    /// Rows were fetched and written (post-dedup count).
    Written {
        fetched: usize,
        written: usize,
        malformed: usize,
    },
    /// The source had no data for this pair.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome {
    pub label: String,
    pub status: PairStatus,
}

/// Accumulated outcomes of one ingestion job.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job: &'static str,
    /// How this family's table absorbs the batch.
    pub policy: WritePolicy,
    pub pairs: Vec<PairOutcome>,
}

impl RunReport {
    pub fn new(job: &'static str, policy: WritePolicy) -> Self {
        Self { job, policy, pairs: Vec::new() }
    }

    pub fn push(&mut self, label: String, status: PairStatus) {
        self.pairs.push(PairOutcome { label, status });
    }

    /// Total rows written across all pairs.
    pub fn written(&self) -> usize {
        self.pairs
            .iter()
            .map(|p| match p.status {
                PairStatus::Written { written, .. } => written,
                _ => 0,
            })
            .sum()
    }

    /// Pairs skipped because the source had no data.
    pub fn skipped(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.status == PairStatus::Empty)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p.status, PairStatus::Failed(_)))
            .count()
    }
}

/// Pull commodity prices for every (commodity, year-range) pair.
pub fn run_commodities(config: &IngestConfig, store: &mut Store) -> Result<RunReport, Error> {
    let client = TradefeedsClient::new(config.tradefeeds_key()?);
    let mut report = RunReport::new("commodity prices", WritePolicy::InsertIfAbsent);
    let mut first = true;

    for &commodity in &config.commodities {
        for &range in &config.year_ranges {
            if !first {
                thread::sleep(config.rate_limit);
            }
            first = false;

            let label = format!("{commodity} {range}");
            log::info!("fetching {label}");
            let status = match client.fetch(&CommodityQuery { commodity, range }) {
                Ok(FetchOutcome::Rows { rows, malformed }) => {
                    let written = store.insert_commodity_prices(&rows)?;
                    PairStatus::Written { fetched: rows.len(), written, malformed }
                }
                Ok(FetchOutcome::Empty) => {
                    log::warn!("{label}: no data");
                    PairStatus::Empty
                }
                Err(err) => {
                    log::error!("{label}: {err}");
                    PairStatus::Failed(err.to_string())
                }
            };
            report.push(label, status);
        }
    }
    Ok(report)
}

/// Ingest the index-price file (full replace of `pun_prices`).
pub fn run_index(config: &IngestConfig, store: &mut Store) -> Result<RunReport, Error> {
    let mut report = RunReport::new("index price (PUN)", WritePolicy::FullReplace);
    let label = config.index_csv.display().to_string();
    let status = match IndexPriceFile.fetch(&config.index_csv) {
        Ok(FetchOutcome::Rows { rows, malformed }) => {
            let written = store.replace_index_prices(&rows)?;
            PairStatus::Written { fetched: rows.len(), written, malformed }
        }
        Ok(FetchOutcome::Empty) => PairStatus::Empty,
        Err(err) => {
            log::error!("{label}: {err}");
            PairStatus::Failed(err.to_string())
        }
    };
    report.push(label, status);
    Ok(report)
}

/// Ingest the load-forecast file (aggregate, then full replace of
/// `load_forecast`).
pub fn run_load(config: &IngestConfig, store: &mut Store) -> Result<RunReport, Error> {
    let mut report = RunReport::new("load forecast", WritePolicy::FullReplace);
    let label = config.load_csv.display().to_string();
    let status = match LoadForecastFile.fetch(&config.load_csv) {
        Ok(FetchOutcome::Rows { rows, malformed }) => {
            let written = store.replace_load_forecast(&rows)?;
            PairStatus::Written { fetched: rows.len(), written, malformed }
        }
        Ok(FetchOutcome::Empty) => PairStatus::Empty,
        Err(err) => {
            log::error!("{label}: {err}");
            PairStatus::Failed(err.to_string())
        }
    };
    report.push(label, status);
    Ok(report)
}

/// Pull daily weather for every configured city.
///
/// A city with no coverage (or a failing pull) never aborts the remaining
/// cities.
pub fn run_weather(config: &IngestConfig, store: &mut Store) -> Result<RunReport, Error> {
    let client = MeteostatClient::new(config.meteostat_key()?);
    let mut report = RunReport::new("weather observations", WritePolicy::InsertIfAbsent);
    let range = config.weather_range;
    let mut first = true;

    for &city in &config.cities {
        if !first {
            thread::sleep(config.rate_limit);
        }
        first = false;

        let label = format!("{} {range}", city.name);
        log::info!("fetching {label}");
        let status = match client.fetch(&WeatherQuery { city, range }) {
            Ok(FetchOutcome::Rows { rows, malformed }) => {
                let written = store.insert_weather(&rows)?;
                PairStatus::Written { fetched: rows.len(), written, malformed }
            }
            Ok(FetchOutcome::Empty) => {
                log::warn!("{label}: no data");
                PairStatus::Empty
            }
            Err(err) => {
                log::error!("{label}: {err}");
                PairStatus::Failed(err.to_string())
            }
        };
        report.push(label, status);
    }
    Ok(report)
}

/// Run every source family in sequence against the same store.
pub fn run_all(config: &IngestConfig, store: &mut Store) -> Result<Vec<RunReport>, Error> {
    Ok(vec![
        run_commodities(config, store)?,
        run_index(config, store)?,
        run_load(config, store)?,
        run_weather(config, store)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_totals_account_for_every_status() {
        let mut report = RunReport::new("test", WritePolicy::InsertIfAbsent);
        report.push(
            "a".to_string(),
            PairStatus::Written { fetched: 10, written: 8, malformed: 1 },
        );
        report.push("b".to_string(), PairStatus::Empty);
        report.push("c".to_string(), PairStatus::Failed("HTTP 500".to_string()));
        report.push(
            "d".to_string(),
            PairStatus::Written { fetched: 3, written: 3, malformed: 0 },
        );

        assert_eq!(report.written(), 11);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.pairs.len(), 4);
    }

    #[test]
    fn one_empty_city_does_not_touch_the_others_rows() {
        // Store-level half of the partial-failure property: committing the
        // fetched cities and writing nothing for the empty one.
        use crate::domain::WeatherDaily;
        use chrono::NaiveDate;

        let mut store = Store::open_in_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let row = |city: &str| WeatherDaily {
            city: city.to_string(),
            date: day,
            tavg: Some(1.0),
            tmin: None,
            tmax: None,
            prcp: None,
            snow: None,
            wdir: None,
            wspd: None,
            wpgt: None,
            pres: None,
            tsun: None,
        };

        let mut report = RunReport::new("weather observations", WritePolicy::InsertIfAbsent);
        for (city, outcome) in [
            ("milano", FetchOutcome::Rows { rows: vec![row("milano")], malformed: 0 }),
            ("atlantis", FetchOutcome::Empty),
            ("roma", FetchOutcome::Rows { rows: vec![row("roma")], malformed: 0 }),
        ] {
            let status = match outcome {
                FetchOutcome::Rows { rows, malformed } => {
                    let written = store.insert_weather(&rows).unwrap();
                    PairStatus::Written { fetched: rows.len(), written, malformed }
                }
                FetchOutcome::Empty => PairStatus::Empty,
            };
            report.push(city.to_string(), status);
        }

        assert_eq!(report.written(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(store.count("weather_data").unwrap(), 2);
    }
}
