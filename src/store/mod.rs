//! Canonical store: one SQLite file, four tables, explicit write policies.
//!
//! Dates are stored as ISO `YYYY-MM-DD` text, so lexicographic order equals
//! chronological order and the read-only dashboard can sort/filter with plain
//! `SELECT`s. The connection is opened once per run and every write goes
//! through it; full-replace writes run in a single transaction so an
//! interrupted run leaves the prior table intact.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, params};

use crate::domain::{CommodityPrice, IndexPrice, LoadForecast, WeatherDaily};
use crate::error::Error;

/// How a table absorbs a new batch of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Keep existing rows on natural-key collision; only new keys land.
    /// Used by incremental, additive sources (commodities, weather).
    InsertIfAbsent,
    /// The incoming batch is an authoritative snapshot: truncate and
    /// rewrite wholesale. Used by file-backed sources (index, load).
    FullReplace,
}

impl WritePolicy {
    pub fn label(self) -> &'static str {
        match self {
            Self::InsertIfAbsent => "insert-if-absent",
            Self::FullReplace => "full-replace",
        }
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS commodity_prices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    commodity TEXT,
    date TEXT,
    price REAL,
    unit TEXT,
    UNIQUE(commodity, date)
);
CREATE TABLE IF NOT EXISTS pun_prices (
    date TEXT PRIMARY KEY,
    price REAL
);
CREATE TABLE IF NOT EXISTS load_forecast (
    date TEXT,
    zone TEXT,
    load_mw REAL,
    PRIMARY KEY (date, zone)
);
CREATE TABLE IF NOT EXISTS weather_data (
    city TEXT,
    time TEXT,
    tavg REAL,
    tmin REAL,
    tmax REAL,
    prcp REAL,
    snow REAL,
    wdir REAL,
    wspd REAL,
    wpgt REAL,
    pres REAL,
    tsun REAL,
    PRIMARY KEY (city, time)
);
";

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the store file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, Error> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| Error::Io {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, Error> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), Error> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert-if-absent write of commodity prices. Returns the number of
    /// rows actually inserted (collisions with existing keys are skipped).
    pub fn insert_commodity_prices(&mut self, rows: &[CommodityPrice]) -> Result<usize, Error> {
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO commodity_prices (commodity, date, price, unit)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in rows {
                written += stmt.execute(params![r.commodity, r.date.to_string(), r.price, r.unit])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Insert-if-absent write of weather observations. The table is shared
    /// by every city, so it is never replaced wholesale.
    pub fn insert_weather(&mut self, rows: &[WeatherDaily]) -> Result<usize, Error> {
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO weather_data
                 (city, time, tavg, tmin, tmax, prcp, snow, wdir, wspd, wpgt, pres, tsun)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for r in rows {
                written += stmt.execute(params![
                    r.city,
                    r.date.to_string(),
                    r.tavg,
                    r.tmin,
                    r.tmax,
                    r.prcp,
                    r.snow,
                    r.wdir,
                    r.wspd,
                    r.wpgt,
                    r.pres,
                    r.tsun,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Full-replace write of the index-price table.
    ///
    /// Runs in one transaction: if anything fails before commit, the prior
    /// table survives untouched. Duplicate dates in the batch resolve
    /// last-wins (`INSERT OR REPLACE` against the date primary key).
    pub fn replace_index_prices(&mut self, rows: &[IndexPrice]) -> Result<usize, Error> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM pun_prices", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO pun_prices (date, price) VALUES (?1, ?2)")?;
            for r in rows {
                stmt.execute(params![r.date.to_string(), r.price])?;
            }
        }
        let written = tx.query_row("SELECT COUNT(*) FROM pun_prices", [], |row| {
            row.get::<_, i64>(0)
        })?;
        tx.commit()?;
        Ok(written as usize)
    }

    /// Full-replace write of the load-forecast table. Rows are expected to
    /// be pre-aggregated by (date, zone); the primary key enforces it.
    pub fn replace_load_forecast(&mut self, rows: &[LoadForecast]) -> Result<usize, Error> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM load_forecast", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO load_forecast (date, zone, load_mw) VALUES (?1, ?2, ?3)",
            )?;
            for r in rows {
                stmt.execute(params![r.date.to_string(), r.zone, r.load_mw])?;
            }
        }
        let written = tx.query_row("SELECT COUNT(*) FROM load_forecast", [], |row| {
            row.get::<_, i64>(0)
        })?;
        tx.commit()?;
        Ok(written as usize)
    }

    /// Row count of one of the four tables.
    pub fn count(&self, table: &str) -> Result<i64, Error> {
        // Fixed table set; the name never reaches SQL unchecked.
        let sql = match table {
            "commodity_prices" => "SELECT COUNT(*) FROM commodity_prices",
            "pun_prices" => "SELECT COUNT(*) FROM pun_prices",
            "load_forecast" => "SELECT COUNT(*) FROM load_forecast",
            "weather_data" => "SELECT COUNT(*) FROM weather_data",
            other => return Err(Error::Config(format!("unknown table '{other}'"))),
        };
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    /// All index prices in date order (the dashboard's main query).
    pub fn index_prices(&self) -> Result<Vec<IndexPrice>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, price FROM pun_prices ORDER BY date")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (date_raw, price) = row?;
            let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|e| {
                Error::MalformedRecord(format!("stored date '{date_raw}' is not ISO: {e}"))
            })?;
            out.push(IndexPrice { date, price });
        }
        Ok(out)
    }

    /// Stored load for one (date, zone), if present.
    pub fn load_mw(&self, date: NaiveDate, zone: &str) -> Result<Option<f64>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT load_mw FROM load_forecast WHERE date = ?1 AND zone = ?2")?;
        let mut rows = stmt.query(params![date.to_string(), zone])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}
