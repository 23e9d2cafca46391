//! Source adapters: everything that pulls raw records from outside.
//!
//! Each external source implements [`SourceAdapter`]: one parameterized
//! fetch yielding canonical rows. The flat-file parsers in `io::flatfile`
//! implement the same trait, so the orchestrator treats every source family
//! uniformly.

pub mod meteostat;
pub mod tradefeeds;

pub use meteostat::{MeteostatClient, WeatherQuery};
pub use tradefeeds::{CommodityQuery, TradefeedsClient};

use crate::error::Error;

/// Outcome of one fetch against a source.
///
/// `Empty` is deliberately distinct from an error: "no data for this key"
/// and "source degraded" are different conditions. The orchestrator reports
/// the former as a skip and the latter as a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Usable rows, plus the count of sibling records skipped as malformed.
    Rows { rows: Vec<T>, malformed: usize },
    /// The source has no data for the requested key/range.
    Empty,
}

/// Common capability of every ingestion source.
pub trait SourceAdapter {
    type Params;
    type Row;

    fn fetch(&self, params: &Self::Params) -> Result<FetchOutcome<Self::Row>, Error>;
}
