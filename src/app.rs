//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into an explicit [`IngestConfig`]
//! - opens the store once for the run
//! - dispatches to the ingestion pipeline
//! - prints the per-run outcome summaries

use clap::Parser;

use crate::cli::{Cli, Command, FetchArgs};
use crate::domain::{City, Commodity, DateRange, IngestConfig};
use crate::error::Error;
use crate::store::Store;

pub mod pipeline;

/// Entry point for the `efeed` binary.
pub fn run() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = ingest_config_from_args(&cli)?;
    let mut store = Store::open(&config.db_path)?;

    let reports = match cli.command {
        Command::Commodities(_) => vec![pipeline::run_commodities(&config, &mut store)?],
        Command::Index(_) => vec![pipeline::run_index(&config, &mut store)?],
        Command::Load(_) => vec![pipeline::run_load(&config, &mut store)?],
        Command::Weather(_) => vec![pipeline::run_weather(&config, &mut store)?],
        Command::All(_) => pipeline::run_all(&config, &mut store)?,
    };

    for report in &reports {
        println!("{}", crate::report::format_run_report(report));
    }
    println!("{}", crate::report::format_completion(&reports));
    Ok(())
}

/// Resolve CLI arguments + environment into the run configuration.
///
/// API keys are read here, once; nothing below `app` touches the
/// environment.
pub fn ingest_config_from_args(cli: &Cli) -> Result<IngestConfig, Error> {
    let args: &FetchArgs = cli.command.args();

    if args.from_year > args.to_year {
        return Err(Error::Config(format!(
            "--from-year {} is after --to-year {}",
            args.from_year, args.to_year
        )));
    }

    let year_ranges = (args.from_year..=args.to_year)
        .map(|year| {
            DateRange::calendar_year(year)
                .ok_or_else(|| Error::Config(format!("year {year} is out of range")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // The weather pull spans the same years as one closed range.
    let (Some(first), Some(last)) = (year_ranges.first(), year_ranges.last()) else {
        return Err(Error::Config("no years selected".to_string()));
    };
    let weather_range = DateRange::new(first.start, last.end)?;

    let commodities = if args.commodities.is_empty() {
        Commodity::ALL.to_vec()
    } else {
        args.commodities.clone()
    };

    let cities = if args.cities.is_empty() {
        crate::domain::CITIES.to_vec()
    } else {
        args.cities
            .iter()
            .map(|name| {
                City::by_name(name)
                    .ok_or_else(|| Error::Config(format!("unknown city '{name}'")))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(IngestConfig {
        db_path: cli.db.clone(),
        tradefeeds_key: std::env::var("TRADEFEEDS_API_KEY").ok(),
        meteostat_key: std::env::var("METEOSTAT_API_KEY").ok(),
        commodities,
        year_ranges,
        cities,
        weather_range,
        index_csv: args.index_file.clone(),
        load_csv: args.load_file.clone(),
        rate_limit: std::time::Duration::from_millis(args.delay_ms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(args.iter().copied())
    }

    #[test]
    fn default_config_covers_2020_through_2024() {
        let config = ingest_config_from_args(&cli(&["efeed", "all"])).unwrap();
        assert_eq!(config.year_ranges.len(), 5);
        assert_eq!(config.year_ranges[0].start.to_string(), "2020-01-01");
        assert_eq!(config.weather_range.end.to_string(), "2024-12-31");
        assert_eq!(config.commodities.len(), 5);
        assert_eq!(config.cities.len(), 9);
        assert_eq!(config.rate_limit.as_millis(), 1000);
    }

    #[test]
    fn inverted_year_span_is_a_config_error() {
        let parsed = cli(&["efeed", "commodities", "--from-year", "2023", "--to-year", "2021"]);
        assert!(matches!(
            ingest_config_from_args(&parsed),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn unknown_city_is_a_config_error() {
        let parsed = cli(&["efeed", "weather", "--city", "atlantis"]);
        assert!(matches!(
            ingest_config_from_args(&parsed),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn explicit_selections_narrow_the_run() {
        let parsed = cli(&[
            "efeed",
            "all",
            "--commodity",
            "brent",
            "--city",
            "milano",
            "--from-year",
            "2022",
            "--to-year",
            "2022",
        ]);
        let config = ingest_config_from_args(&parsed).unwrap();
        assert_eq!(config.commodities, vec![Commodity::Brent]);
        assert_eq!(config.cities.len(), 1);
        assert_eq!(config.cities[0].name, "milano");
        assert_eq!(config.year_ranges.len(), 1);
    }
}
