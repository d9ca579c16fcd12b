//! Configuration management.
//!
//! This module provides functions for locating the tiercat directory,
//! resolving the database path, and picking the actor recorded in audit
//! events. Presentation defaults live in [`settings`].
//!
//! # Layout
//!
//! tiercat keeps one global database shared by every project:
//! - **Database**: `~/.tiercat/data/tiercat.db`
//! - **Settings**: `~/.tiercat/config.json`
//!
//! Projects are identified by the id callers pass in; nothing is discovered
//! from the working directory.

mod settings;

pub use settings::{load_settings, load_settings_from, settings_path, Settings};

use std::path::{Path, PathBuf};

/// Get the global tiercat directory (`~/.tiercat/`).
#[must_use]
pub fn global_tiercat_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tiercat"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `TIERCAT_TEST_DB=1` (or any non-empty
/// value other than `0`/`false`). It redirects the database to an isolated
/// file.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("TIERCAT_TEST_DB").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test database path (`~/.tiercat/test/tiercat.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_tiercat_dir().map(|dir| dir.join("test").join("tiercat.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `TIERCAT_TEST_DB` environment variable → uses test database
/// 3. `TIERCAT_DB` environment variable
/// 4. Global location: `~/.tiercat/data/tiercat.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no home directory
/// can be found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("TIERCAT_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_tiercat_dir().map(|dir| dir.join("data").join("tiercat.db"))
}

/// Get the default actor name.
///
/// Priority:
/// 1. `TIERCAT_ACTOR` environment variable
/// 2. Git user name
/// 3. System username
/// 4. "unknown"
#[must_use]
pub fn default_actor() -> String {
    if let Ok(actor) = std::env::var("TIERCAT_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    if let Ok(user) = std::env::var("USER") {
        return user;
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_actor() {
        assert!(!default_actor().is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/tiercat.db");
        assert_eq!(resolve_db_path(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_tiercat_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.to_string_lossy().contains("test"));
        assert!(test.ends_with("tiercat.db"));
        assert_ne!(global.join("data").join("tiercat.db"), test);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
    }
}
