//! `energy-feeds` library crate.
//!
//! The binary (`efeed`) is a thin wrapper around this library so that:
//!
//! - the ingestion pipeline is testable without spawning processes
//! - modules are reusable (e.g., scheduled jobs, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod normalize;
pub mod report;
pub mod store;
