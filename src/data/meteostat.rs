//! Meteostat point/daily client: daily weather observations per coordinate.
//!
//! One GET per (city, range). A location with no coverage returns an empty
//! `data` list; that is a skip, not a failure, so one silent city never
//! aborts the remaining cities.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::{FetchOutcome, SourceAdapter};
use crate::domain::{City, DateRange, WeatherDaily};
use crate::error::Error;

const BASE_URL: &str = "https://meteostat.p.rapidapi.com/point/daily";
const RAPIDAPI_HOST: &str = "meteostat.p.rapidapi.com";

/// One per-location pull: a city over a closed date range.
#[derive(Debug, Clone, Copy)]
pub struct WeatherQuery {
    pub city: City,
    pub range: DateRange,
}

pub struct MeteostatClient {
    client: Client,
    api_key: String,
}

impl MeteostatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

impl SourceAdapter for MeteostatClient {
    type Params = WeatherQuery;
    type Row = WeatherDaily;

    fn fetch(&self, params: &WeatherQuery) -> Result<FetchOutcome<WeatherDaily>, Error> {
        let resp = self
            .client
            .get(BASE_URL)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .query(&[
                ("lat", params.city.lat.to_string()),
                ("lon", params.city.lon.to_string()),
                ("start", params.range.start.to_string()),
                ("end", params.range.end.to_string()),
            ])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let body: DailyResponse = resp.json()?;
        Ok(normalize_payload(params.city.name, body))
    }
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(default)]
    data: Option<Vec<DailyEntry>>,
}

/// One day as the provider reports it. Measurements are nullable across the
/// board; stations report different subsets.
#[derive(Debug, Deserialize)]
struct DailyEntry {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    tavg: Option<f64>,
    #[serde(default)]
    tmin: Option<f64>,
    #[serde(default)]
    tmax: Option<f64>,
    #[serde(default)]
    prcp: Option<f64>,
    #[serde(default)]
    snow: Option<f64>,
    #[serde(default)]
    wdir: Option<f64>,
    #[serde(default)]
    wspd: Option<f64>,
    #[serde(default)]
    wpgt: Option<f64>,
    #[serde(default)]
    pres: Option<f64>,
    #[serde(default)]
    tsun: Option<f64>,
}

fn normalize_payload(city: &str, body: DailyResponse) -> FetchOutcome<WeatherDaily> {
    let entries = match body.data {
        Some(entries) if !entries.is_empty() => entries,
        _ => return FetchOutcome::Empty,
    };

    let mut rows = Vec::with_capacity(entries.len());
    let mut malformed = 0usize;
    for entry in entries {
        let Some(date) = entry
            .date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        else {
            log::warn!("{city}: skipping weather entry with missing/invalid date");
            malformed += 1;
            continue;
        };
        rows.push(WeatherDaily {
            city: city.to_string(),
            date,
            tavg: entry.tavg,
            tmin: entry.tmin,
            tmax: entry.tmax,
            prcp: entry.prcp,
            snow: entry.snow,
            wdir: entry.wdir,
            wspd: entry.wspd,
            wpgt: entry.wpgt,
            pres: entry.pres,
            tsun: entry.tsun,
        });
    }

    if rows.is_empty() && malformed == 0 {
        FetchOutcome::Empty
    } else {
        FetchOutcome::Rows { rows, malformed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> DailyResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn daily_entries_keep_null_measurements_as_none() {
        let body = decode(
            r#"{"data":[
                {"date":"2020-01-01","tavg":3.9,"tmin":0.2,"tmax":7.1,"prcp":null,
                 "snow":null,"wdir":230.0,"wspd":7.6,"wpgt":null,"pres":1035.2,"tsun":null},
                {"date":"2020-01-02","tavg":null}
            ]}"#,
        );
        match normalize_payload("milano", body) {
            FetchOutcome::Rows { rows, malformed } => {
                assert_eq!(rows.len(), 2);
                assert_eq!(malformed, 0);
                assert_eq!(rows[0].city, "milano");
                assert_eq!(rows[0].date.to_string(), "2020-01-01");
                assert_eq!(rows[0].tavg, Some(3.9));
                assert_eq!(rows[0].prcp, None);
                assert_eq!(rows[1].tavg, None);
            }
            FetchOutcome::Empty => panic!("expected rows"),
        }
    }

    #[test]
    fn empty_or_missing_data_is_a_skip() {
        assert_eq!(normalize_payload("bari", decode(r#"{"data":[]}"#)), FetchOutcome::Empty);
        assert_eq!(normalize_payload("bari", decode(r#"{}"#)), FetchOutcome::Empty);
    }

    #[test]
    fn entry_without_date_is_counted_malformed() {
        let body = decode(r#"{"data":[{"tavg":1.0},{"date":"2020-01-02","tavg":2.0}]}"#);
        match normalize_payload("roma", body) {
            FetchOutcome::Rows { rows, malformed } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(malformed, 1);
            }
            FetchOutcome::Empty => panic!("expected rows"),
        }
    }
}
