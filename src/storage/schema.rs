//! Database schema definitions.
//!
//! This module contains the complete SQLite schema for tiercat.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the tiercat database.
///
/// Note: Timestamps are stored as INTEGER (Unix milliseconds).
/// `parent_id` columns are deliberately not foreign keys: deleting a tier1
/// row must not cascade to, or be blocked by, its tier2 children.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Template Registry
-- ====================

-- Global, project-independent category templates
CREATE TABLE IF NOT EXISTS category_templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    tier TEXT NOT NULL,
    parent_id TEXT,
    color TEXT,
    description TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(tier, name),
    CHECK (tier IN ('tier1', 'tier2'))
);

CREATE INDEX IF NOT EXISTS idx_category_templates_tier ON category_templates(tier, sort_order);
CREATE INDEX IF NOT EXISTS idx_category_templates_parent ON category_templates(parent_id);

-- ====================
-- Project Category Store
-- ====================

-- Project-owned categories; template_id is provenance only
CREATE TABLE IF NOT EXISTS project_categories (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    tier TEXT NOT NULL,
    parent_id TEXT,
    color TEXT,
    description TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    template_id TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(project_id, tier, name),
    CHECK (tier IN ('tier1', 'tier2'))
);

CREATE INDEX IF NOT EXISTS idx_project_categories_project ON project_categories(project_id, tier, sort_order);
CREATE INDEX IF NOT EXISTS idx_project_categories_parent ON project_categories(parent_id);
CREATE INDEX IF NOT EXISTS idx_project_categories_template ON project_categories(project_id, template_id);

-- Theme preference per project (intent only, never applied implicitly)
CREATE TABLE IF NOT EXISTS project_theme_settings (
    project_id TEXT PRIMARY KEY,
    color_theme TEXT NOT NULL,
    use_global_theme INTEGER NOT NULL DEFAULT 1,
    updated_at INTEGER NOT NULL
);

-- ====================
-- Task Category Assignments
-- ====================

-- Junction between external tasks and categories (by name)
CREATE TABLE IF NOT EXISTS task_category_assignments (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL,
    tier1_category TEXT NOT NULL,
    tier2_category TEXT,
    is_primary INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_task_assignments_task ON task_category_assignments(task_id, created_at);

-- ====================
-- Audit Events
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at DESC);
";

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // Set pragmas before schema creation
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", "-16000")?; // 16MB cache
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    // Apply schema
    conn.execute_batch(SCHEMA_SQL)?;

    // Run migrations for existing databases
    super::migrations::run_migrations(conn)?;

    // Record schema version
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"category_templates".to_string()));
        assert!(tables.contains(&"project_categories".to_string()));
        assert!(tables.contains(&"project_theme_settings".to_string()));
        assert!(tables.contains(&"task_category_assignments".to_string()));
        assert!(tables.contains(&"events".to_string()));
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_unique_name_per_project_and_tier() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let insert = |id: &str, project: &str, tier: &str| {
            conn.execute(
                "INSERT INTO project_categories (id, project_id, name, tier, created_at, updated_at)
                 VALUES (?1, ?2, 'Framing', ?3, 0, 0)",
                rusqlite::params![id, project, tier],
            )
        };

        assert!(insert("c1", "p1", "tier1").is_ok());
        // Same name, other tier
        assert!(insert("c2", "p1", "tier2").is_ok());
        // Same name, other project
        assert!(insert("c3", "p2", "tier1").is_ok());
        // Duplicate
        assert!(insert("c4", "p1", "tier1").is_err());
    }

    #[test]
    fn test_tier_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO category_templates (id, name, tier, created_at, updated_at)
             VALUES ('t1', 'Bad', 'tier3', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
