//! Initialize the tiercat database.
//!
//! tiercat keeps one database shared by every project. `tiercat init`
//! creates it at the resolved path (`--db`, `TIERCAT_TEST_DB`, `TIERCAT_DB`,
//! or `~/.tiercat/data/tiercat.db`) and applies the schema.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the file cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path()))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    let exists = db_path.exists();
    if exists && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if exists {
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = PathBuf::from(format!("{}{suffix}", db_path.display()));
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
    }

    // Opening applies the schema and migrations
    SqliteStorage::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
            recreated: exists,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized tiercat database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: run 'tiercat template seed' or 'tiercat preset apply --project <id> home-builder'.");
    }

    Ok(())
}
