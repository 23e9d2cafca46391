//! Tradefeeds commodity-historical API client.
//!
//! The endpoint's payload shape is irregular: `result.output` is sometimes a
//! single object and sometimes a one-element list, and `prices` inside it is
//! an object for single-day ranges but a list otherwise. Both shapes decode
//! through [`OneOrMany`] into the same row sequence. A missing or empty
//! `prices` field is not an error; it means the range simply has no data.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::{FetchOutcome, SourceAdapter};
use crate::domain::{Commodity, CommodityPrice, DateRange};
use crate::error::Error;

const BASE_URL: &str = "https://data.tradefeeds.com/api/v1/commodity_historical";

/// One ranged pull: a commodity series over a closed date range.
#[derive(Debug, Clone, Copy)]
pub struct CommodityQuery {
    pub commodity: Commodity,
    pub range: DateRange,
}

pub struct TradefeedsClient {
    client: Client,
    api_key: String,
}

impl TradefeedsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

impl SourceAdapter for TradefeedsClient {
    type Params = CommodityQuery;
    type Row = CommodityPrice;

    fn fetch(&self, params: &CommodityQuery) -> Result<FetchOutcome<CommodityPrice>, Error> {
        let date_from = params.range.start.to_string();
        let date_to = params.range.end.to_string();

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("name", params.commodity.api_name()),
                ("date_from", &date_from),
                ("date_to", &date_to),
                ("frequency", "day"),
            ])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let body: ApiResponse = resp.json()?;
        Ok(normalize_payload(params.commodity, body))
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    result: Option<ResultBlock>,
}

#[derive(Debug, Deserialize)]
struct ResultBlock {
    #[serde(default)]
    output: Option<OneOrMany<Output>>,
}

/// A value the feed wraps in a singleton list inconsistently.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(v) => v.into_iter().next(),
        }
    }

    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Output {
    #[serde(default)]
    prices: Option<OneOrMany<PriceEntry>>,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    price: Option<RawNumber>,
}

/// Prices arrive as JSON numbers or as quoted strings depending on the feed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(f64),
    Str(String),
}

impl RawNumber {
    fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Self::Num(v) => *v,
            Self::Str(s) => s.trim().parse::<f64>().ok()?,
        };
        if v.is_finite() { Some(v) } else { None }
    }
}

fn normalize_payload(commodity: Commodity, body: ApiResponse) -> FetchOutcome<CommodityPrice> {
    let Some(output) = body
        .result
        .and_then(|r| r.output)
        .and_then(OneOrMany::into_first)
    else {
        return FetchOutcome::Empty;
    };
    let Some(prices) = output.prices else {
        return FetchOutcome::Empty;
    };

    let unit = output.unit.unwrap_or_else(|| "unknown".to_string());

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    for entry in prices.into_vec() {
        let Some(date) = entry
            .date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        else {
            log::warn!("{commodity}: skipping entry with missing/invalid date");
            malformed += 1;
            continue;
        };
        let Some(price) = entry.price.as_ref().and_then(RawNumber::as_f64) else {
            log::warn!("{commodity}: skipping {date}: missing/invalid price");
            malformed += 1;
            continue;
        };
        rows.push(CommodityPrice {
            commodity: commodity.api_name().to_string(),
            date,
            price,
            unit: unit.clone(),
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

    fn decode(json: &str) -> ApiResponse {
        serde_json::from_str(json).unwrap()
    }

    fn rows_of(outcome: FetchOutcome<CommodityPrice>) -> Vec<CommodityPrice> {
        match outcome {
            FetchOutcome::Rows { rows, .. } => rows,
            FetchOutcome::Empty => panic!("expected rows, got Empty"),
        }
    }

    #[test]
    fn prices_object_and_singleton_list_normalize_identically() {
        let object = decode(
            r#"{"result":{"output":{"prices":{"date":"2021-01-31","price":"12.34"},"unit":"USD/bbl"}}}"#,
        );
        let list = decode(
            r#"{"result":{"output":{"prices":[{"date":"2021-01-31","price":"12.34"}],"unit":"USD/bbl"}}}"#,
        );

        let a = rows_of(normalize_payload(Commodity::Brent, object));
        let b = rows_of(normalize_payload(Commodity::Brent, list));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].date.to_string(), "2021-01-31");
        assert!((a[0].price - 12.34).abs() < 1e-12);
        assert_eq!(a[0].unit, "USD/bbl");
    }

    #[test]
    fn output_wrapped_in_list_is_unwrapped() {
        let body = decode(
            r#"{"result":{"output":[{"prices":[{"date":"2020-06-01","price":40.5}],"unit":"USD/bbl"}]}}"#,
        );
        let rows = rows_of(normalize_payload(Commodity::CrudeOil, body));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commodity, "crude_oil");
        assert!((rows[0].price - 40.5).abs() < 1e-12);
    }

    #[test]
    fn missing_prices_field_is_empty_not_an_error() {
        for json in [
            r#"{}"#,
            r#"{"result":{}}"#,
            r#"{"result":{"output":[]}}"#,
            r#"{"result":{"output":{"unit":"USD/bbl"}}}"#,
        ] {
            assert_eq!(
                normalize_payload(Commodity::Coal, decode(json)),
                FetchOutcome::Empty,
                "payload: {json}"
            );
        }
    }

    #[test]
    fn unit_defaults_to_unknown() {
        let body = decode(r#"{"result":{"output":{"prices":[{"date":"2020-01-02","price":1.0}]}}}"#);
        let rows = rows_of(normalize_payload(Commodity::TtfGas, body));
        assert_eq!(rows[0].unit, "unknown");
    }

    #[test]
    fn malformed_price_skips_that_row_only() {
        let body = decode(
            r#"{"result":{"output":{"prices":[
                {"date":"2020-01-02","price":"oops"},
                {"date":"2020-01-03","price":50.0},
                {"date":"bad-date","price":51.0}
            ],"unit":"USD/t"}}}"#,
        );
        match normalize_payload(Commodity::Coal, body) {
            FetchOutcome::Rows { rows, malformed } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].date.to_string(), "2020-01-03");
                assert_eq!(malformed, 2);
            }
            FetchOutcome::Empty => panic!("expected rows"),
        }
    }
}
