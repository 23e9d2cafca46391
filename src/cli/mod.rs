//! Command-line parsing for the ingestion tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Commodity;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "efeed",
    version,
    about = "Energy-market time-series ingestion into a single SQLite store"
)]
pub struct Cli {
    /// Path of the SQLite store shared by every series family.
    #[arg(long, default_value = "db/data.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands, one per source family plus `all`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pull commodity prices from the historical-price API (insert-if-absent).
    Commodities(FetchArgs),
    /// Ingest the PUN index-price CSV (full replace).
    Index(FetchArgs),
    /// Ingest the zonal load-forecast CSV (aggregate + full replace).
    Load(FetchArgs),
    /// Pull daily weather observations per city (insert-if-absent).
    Weather(FetchArgs),
    /// Run every source family in sequence against the same store.
    All(FetchArgs),
}

impl Command {
    pub fn args(&self) -> &FetchArgs {
        match self {
            Self::Commodities(a) | Self::Index(a) | Self::Load(a) | Self::Weather(a) | Self::All(a) => a,
        }
    }
}

/// Common options shared by every subcommand.
#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// First calendar year to ingest (API-backed sources).
    #[arg(long, default_value_t = 2020)]
    pub from_year: i32,

    /// Last calendar year to ingest, inclusive.
    #[arg(long, default_value_t = 2024)]
    pub to_year: i32,

    /// Commodity series to pull (repeatable; defaults to all five).
    #[arg(long = "commodity", value_enum)]
    pub commodities: Vec<Commodity>,

    /// Cities to pull weather for (repeatable; defaults to all nine tracked
    /// cities).
    #[arg(long = "city")]
    pub cities: Vec<String>,

    /// Minimum delay between successive calls to a rate-limited API, in
    /// milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// PUN index CSV path.
    #[arg(long, default_value = "data/pun_index_gme.csv")]
    pub index_file: PathBuf,

    /// Load-forecast CSV path.
    #[arg(long, default_value = "data/load_forecast.csv")]
    pub load_file: PathBuf,
}
