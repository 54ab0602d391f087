#![allow(dead_code)]

use std::path::{Path, PathBuf};

use atm_data::prelude::*;
use tempfile::TempDir;

pub const SQLITE_SCHEMA: &str = include_str!("../sql/sqlite_schema.sql");

/// A scratch `SQLite` database file with the ATM schema, removed on drop.
pub struct ScratchDb {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl ScratchDb {
    pub fn target(&self) -> SqliteTarget {
        SqliteTarget::new(self.path.clone())
    }
}

pub fn scratch_db() -> Result<ScratchDb, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("atm.db");
    apply_schema(&path)?;
    Ok(ScratchDb { dir, path })
}

/// A database file with no tables yet.
pub fn empty_db() -> Result<ScratchDb, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("empty.db");
    Ok(ScratchDb { dir, path })
}

pub fn apply_schema(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch(SQLITE_SCHEMA)?;
    Ok(())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
