use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use chrono::{TimeZone, Utc};
use inventory_dashboard::model::{Price, Record, RecordSet};
use rusqlite::Connection;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }

    pub fn assert_not_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            !out.contains(needle),
            "expected logs not to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sets (or clears) an env var for the guard's lifetime.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }

    pub fn unset(key: &str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

/// The two-row inventory used throughout the filter scenarios.
#[allow(dead_code)]
pub fn jeans_and_hoodie() -> RecordSet {
    let at = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    RecordSet::new(vec![
        Record {
            item_id: 1,
            category: "Jeans".into(),
            brand: "Acme".into(),
            size: "M".into(),
            colour: "Blue".into(),
            price: Price::from_cents(4500),
            units_in_stock: 10,
            created_utc: at,
        },
        Record {
            item_id: 2,
            category: "Hoodie".into(),
            brand: "Contoso".into(),
            size: "L".into(),
            colour: "Red".into(),
            price: Price::from_cents(4000),
            units_in_stock: 20,
            created_utc: at,
        },
    ])
}

/// A temp dir holding `inventory.db` with a `Clothes` table.
#[allow(dead_code)]
pub struct InventoryDb {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl InventoryDb {
    /// Create the table and insert `rows` as
    /// (category, brand, size, colour, price, units).
    pub fn with_rows(rows: &[(&str, &str, &str, &str, f64, i64)]) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let conn = Connection::open(dir.path().join("inventory.db")).expect("open db");
        conn.execute_batch(inventory_dashboard::store::CREATE_TABLE)
            .expect("create table");
        for (category, brand, size, colour, price, units) in rows {
            conn.execute(
                "INSERT INTO Clothes (Category, Brand, Size, Colour, Price, UnitsInStock, CreatedUtc)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, '2025-05-01 09:00:00')",
                rusqlite::params![category, brand, size, colour, price, units],
            )
            .expect("insert row");
        }
        Self { dir }
    }

    pub fn empty_dir() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("inventory.db")
    }

    /// A secrets file location inside the temp dir that does not exist.
    pub fn no_secrets(&self) -> PathBuf {
        self.dir.path().join("absent-secrets.toml")
    }

    pub fn write_secrets(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("secrets.toml");
        std::fs::write(&path, body).expect("write secrets");
        path
    }
}

/// `invdash` with a scrubbed environment pointing at `db`.
#[allow(dead_code)]
pub fn invdash(db: &Path, secrets: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("invdash");
    cmd.env_clear()
        .env("INVDASH_SECRETS", secrets)
        .env("DRIVER", "SQLite3")
        .env("SERVER", "localhost")
        .env("DATABASE", db)
        .env("UID", "reader")
        .env("PWD", "s3cret");
    cmd
}
