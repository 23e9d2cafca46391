//! Error taxonomy for ingestion runs.
//!
//! The variants map one-to-one onto how failures propagate:
//!
//! - `SourceUnavailable` / `Network` abort the current (series, range) pair;
//!   the orchestrator logs it and moves on to the next pair.
//! - `MalformedRecord` covers a payload that cannot be decoded at all.
//!   Individual bad rows inside an otherwise healthy payload are skipped and
//!   counted, never raised.
//! - `SchemaMismatch` is fatal for one file's ingestion (no partial ingest of
//!   an unparseable file), but not for the run as a whole.
//! - `Store` / `Config` are local problems and end the run.
//!
//! "No data for this key" is *not* an error; see `data::FetchOutcome::Empty`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote source answered with a non-success HTTP status.
    #[error("source unavailable (HTTP {status}): {body}")]
    SourceUnavailable { status: u16, body: String },

    /// The remote source could not be reached or its response not decoded.
    #[error("source unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// A payload that should carry records could not be decoded at all.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A flat file is missing required columns after synonym resolution.
    #[error("schema mismatch in '{}': missing column(s) {missing:?}, found {found:?}", path.display())]
    SchemaMismatch {
        path: PathBuf,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::SchemaMismatch { .. } | Self::Io { .. } | Self::Csv(_) => 3,
            Self::SourceUnavailable { .. } | Self::Network(_) | Self::MalformedRecord(_) => 4,
            Self::Store(_) => 5,
        }
    }
}
