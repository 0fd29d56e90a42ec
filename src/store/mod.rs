//! Row source for the `Clothes` table.
//!
//! - [`RecordStore`]: one full-table fetch per call
//! - [`SqliteStore`]: rusqlite-backed implementation
//! - [`cache`]: time-bounded cache in front of any store

pub mod cache;

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OpenFlags, Row};
use thiserror::Error;

use crate::connection::{Backend, CONNECT_TIMEOUT, ConnectionDescriptor};
use crate::model::{Price, Record, RecordSet};

pub use cache::{CachedRowSource, Clock, DEFAULT_TTL, SystemClock};

/// Table the dashboard reads and the seeder appends to.
pub const TABLE: &str = "Clothes";

/// The only query the dashboard issues.
pub const SELECT_ALL: &str = "SELECT * FROM Clothes";

/// Idempotent DDL for the inventory table.
pub const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS Clothes (
    ItemID        INTEGER PRIMARY KEY AUTOINCREMENT,
    Category      NVARCHAR(50),
    Brand         NVARCHAR(50),
    Size          NVARCHAR(5),
    Colour        NVARCHAR(20),
    Price         DECIMAL(10,2),
    UnitsInStock  INT,
    CreatedUtc    DATETIME
)";

/// Timestamp layout written by the seeder.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Failures talking to the backing store.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("row {item_id:?}: column {column} could not be decoded: {detail}")]
    Decode {
        item_id: Option<i64>,
        column: &'static str,
        detail: String,
    },

    #[error("driver '{0}' is not supported by this build (use a SQLite driver)")]
    UnsupportedDriver(String),
}

/// Something that can return the full inventory table.
pub trait RecordStore {
    /// Run the full-table query once and return every row in retrieval order.
    fn fetch_all(&self) -> Result<RecordSet, DataSourceError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn fetch_all(&self) -> Result<RecordSet, DataSourceError> {
        (**self).fetch_all()
    }
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store a descriptor points at, read-only.
    pub fn open(descriptor: &ConnectionDescriptor) -> Result<Self, DataSourceError> {
        Self::open_with(descriptor, OpenFlags::SQLITE_OPEN_READ_ONLY)
    }

    /// Open the store for writing, creating the database file if needed.
    pub fn open_writable(descriptor: &ConnectionDescriptor) -> Result<Self, DataSourceError> {
        Self::open_with(
            descriptor,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
    }

    fn open_with(
        descriptor: &ConnectionDescriptor,
        flags: OpenFlags,
    ) -> Result<Self, DataSourceError> {
        match descriptor.backend() {
            Backend::Sqlite { path } => {
                tracing::debug!(descriptor = %descriptor.redacted(), "opening store");
                Self::open_path(&path, flags)
            }
            Backend::Odbc { driver } => Err(DataSourceError::UnsupportedDriver(driver)),
        }
    }

    pub fn open_path(path: &Path, flags: OpenFlags) -> Result<Self, DataSourceError> {
        let connect_err = |source| DataSourceError::Connect {
            target: path.display().to_string(),
            source,
        };
        let conn = Connection::open_with_flags(path, flags).map_err(connect_err)?;
        conn.busy_timeout(CONNECT_TIMEOUT).map_err(connect_err)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, DataSourceError> {
        let conn = Connection::open_in_memory().map_err(|source| DataSourceError::Connect {
            target: ":memory:".into(),
            source,
        })?;
        Ok(Self { conn })
    }

    /// Create the inventory table if it does not exist.
    pub fn ensure_schema(&self) -> Result<(), DataSourceError> {
        self.conn.execute_batch(CREATE_TABLE)?;
        Ok(())
    }

    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    pub fn raw_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl RecordStore for SqliteStore {
    fn fetch_all(&self) -> Result<RecordSet, DataSourceError> {
        let mut stmt = self.conn.prepare(SELECT_ALL)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(decode_row(row)?);
        }
        tracing::debug!(rows = records.len(), table = TABLE, "fetched inventory");
        Ok(RecordSet::new(records))
    }
}

const MAX_UNITS: i64 = i32::MAX as i64;

fn decode_row(row: &Row<'_>) -> Result<Record, DataSourceError> {
    let item_id: Option<i64> = row.get("ItemID").ok();

    let field = |column: &'static str| -> Result<String, DataSourceError> {
        match row.get::<_, Option<String>>(column) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(null_cell(item_id, column)),
            Err(e) => Err(bad_cell(item_id, column, e)),
        }
    };

    let price = match row.get::<_, Option<f64>>("Price") {
        Ok(Some(p)) => Price::from_f64(p).ok_or_else(|| DataSourceError::Decode {
            item_id,
            column: "Price",
            detail: format!("price {p} outside 0.00..={}", Price::MAX),
        })?,
        Ok(None) => return Err(null_cell(item_id, "Price")),
        Err(e) => return Err(bad_cell(item_id, "Price", e)),
    };

    // UnitsInStock is an INT column: 0..=i32::MAX keeps every sum exact.
    let units_in_stock = match row.get::<_, Option<i64>>("UnitsInStock") {
        Ok(Some(u)) if (0..=MAX_UNITS).contains(&u) => u,
        Ok(Some(u)) => {
            return Err(DataSourceError::Decode {
                item_id,
                column: "UnitsInStock",
                detail: format!("units {u} outside 0..={MAX_UNITS}"),
            });
        }
        Ok(None) => return Err(null_cell(item_id, "UnitsInStock")),
        Err(e) => return Err(bad_cell(item_id, "UnitsInStock", e)),
    };

    let created_raw = field("CreatedUtc")?;
    let created_utc =
        parse_timestamp(&created_raw).ok_or_else(|| DataSourceError::Decode {
            item_id,
            column: "CreatedUtc",
            detail: format!("unrecognized timestamp '{created_raw}'"),
        })?;

    Ok(Record {
        item_id: item_id.ok_or_else(|| null_cell(None, "ItemID"))?,
        category: field("Category")?,
        brand: field("Brand")?,
        size: field("Size")?,
        colour: field("Colour")?,
        price,
        units_in_stock,
        created_utc,
    })
}

fn null_cell(item_id: Option<i64>, column: &'static str) -> DataSourceError {
    DataSourceError::Decode {
        item_id,
        column,
        detail: "NULL value".into(),
    }
}

fn bad_cell(item_id: Option<i64>, column: &'static str, err: rusqlite::Error) -> DataSourceError {
    DataSourceError::Decode {
        item_id,
        column,
        detail: err.to_string(),
    }
}

/// Parse the timestamp layouts a `DATETIME` column can hold: the seeder's
/// `YYYY-MM-DD HH:MM:SS[.fff]`, ISO `T`-separated, or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
