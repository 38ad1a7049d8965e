//! SQLite persistence for poll-cycle measurements.
//!
//! Database location: `./data/rws_monitor.db` by default (see
//! [`MonitorConfig`](crate::config::MonitorConfig)). The directory is created
//! automatically if it doesn't exist.
//!
//! A connection is opened for every operation and closed when it returns;
//! nothing is pooled and no transaction spans a write and a later read.
//!
//! `measured_at` is local wall-clock time with millisecond precision, the
//! same clock the histories and the "last updated" line use.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{params, Connection};

use crate::errors::StoreError;
use crate::models::{Measurement, NewMeasurement};

/// Matches SQLite's `%Y-%m-%d %H:%M:%f` so text order is time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Handle to the measurements database.
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    path: PathBuf,
}

impl MeasurementStore {
    /// Create or open the database at the given path and make sure the
    /// `measurements` table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS measurements (
                id INTEGER PRIMARY KEY,
                measured_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now', 'localtime')),
                gripper INTEGER,
                tcp_speed REAL,
                pos_x REAL,
                pos_y REAL,
                pos_z REAL
            );

            CREATE INDEX IF NOT EXISTS idx_measurements_measured_at
                ON measurements (measured_at DESC);",
        )?;
        Ok(())
    }

    /// Insert one measurement. Returns the new row id.
    pub fn insert(&self, measurement: &NewMeasurement) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        let measured_at = Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
        conn.execute(
            "INSERT INTO measurements (measured_at, gripper, tcp_speed, pos_x, pos_y, pos_z)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                measured_at,
                measurement.gripper,
                measurement.tcp_speed,
                measurement.pos_x,
                measurement.pos_y,
                measurement.pos_z,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The `limit` most recent measurements, newest first.
    pub fn latest(&self, limit: usize) -> Result<Vec<Measurement>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, measured_at, gripper, tcp_speed, pos_x, pos_y, pos_z
             FROM measurements
             ORDER BY measured_at DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Measurement {
                id: row.get(0)?,
                measured_at: row.get(1)?,
                gripper: row.get(2)?,
                tcp_speed: row.get(3)?,
                pos_x: row.get(4)?,
                pos_y: row.get(5)?,
                pos_z: row.get(6)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Total number of stored measurements.
    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?)
    }
}
