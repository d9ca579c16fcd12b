//! SQLite storage implementation.
//!
//! This module provides the storage backend for tiercat using SQLite.
//! It follows the MutationContext pattern for transaction discipline and
//! audit logging: every write goes through [`SqliteStorage::mutate`], which
//! opens an IMMEDIATE transaction, runs the closure, writes the recorded
//! events and commits.
//!
//! Row-level SQL lives here as free functions over `&Connection` so that
//! the taxonomy layer can compose several of them inside one transaction.

use crate::error::{Error, Result};
use crate::model::{
    CategoryTemplate, CategoryTier, CategoryUpdate, NewCategory, ProjectCategory,
    ProjectThemeSetting, TaskCategoryAssignment,
};
use crate::storage::events::{get_events, insert_event, Event, EventType};
use crate::storage::schema::apply_schema;
use crate::validate::{normalize_color, normalize_name, normalize_optional_color};
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, tracking side effects.
///
/// Passed to mutation closures to record audit events, which are written
/// just before the transaction commits.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor).with_comment(&self.op_name),
        );
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor)
                .with_values(old_value, new_value)
                .with_comment(&self.op_name),
        );
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        Ok(result)
    }

    // ==================
    // Read Operations
    // ==================

    /// Get a template by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_template(&self, id: &str) -> Result<Option<CategoryTemplate>> {
        Ok(select_template(&self.conn, id)?)
    }

    /// List global templates, optionally filtered by tier.
    ///
    /// Ordered by tier, sort order, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_templates(&self, tier: Option<CategoryTier>) -> Result<Vec<CategoryTemplate>> {
        Ok(select_templates(&self.conn, tier)?)
    }

    /// Get a project category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_category(&self, id: &str) -> Result<Option<ProjectCategory>> {
        Ok(select_category(&self.conn, id)?)
    }

    /// List all category rows of a project, tier1 first, then by sort order and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_categories(&self, project_id: &str) -> Result<Vec<ProjectCategory>> {
        Ok(select_categories(&self.conn, project_id)?)
    }

    /// Get the stored theme setting of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_theme_setting(&self, project_id: &str) -> Result<Option<ProjectThemeSetting>> {
        Ok(select_theme_setting(&self.conn, project_id)?)
    }

    /// Get an assignment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_assignment(&self, id: &str) -> Result<Option<TaskCategoryAssignment>> {
        Ok(select_assignment(&self.conn, id)?)
    }

    /// List a task's assignments in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_assignments(&self, task_id: &str) -> Result<Vec<TaskCategoryAssignment>> {
        Ok(select_assignments(&self.conn, task_id)?)
    }

    /// Recent audit events for one entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn history(&self, entity_type: &str, entity_id: &str, limit: u32) -> Result<Vec<Event>> {
        Ok(get_events(&self.conn, entity_type, entity_id, Some(limit))?)
    }

    // ==================
    // Project Category Store
    // ==================

    /// Create a project category.
    ///
    /// The name must be unique within the project and tier. A tier2 row
    /// needs a tier1 parent of the same project, given by id or name.
    ///
    /// # Errors
    ///
    /// Returns a validation error for duplicate names, malformed colors or
    /// an unresolved parent.
    pub fn create_category(&mut self, new: &NewCategory, actor: &str) -> Result<ProjectCategory> {
        let name = normalize_name(&new.name)?;
        let color = normalize_optional_color(new.color.as_deref())?;

        self.mutate("create_category", actor, |tx, ctx| {
            ensure_unique_name(tx, &new.project_id, new.tier, &name, None)?;
            let parent = check_parent(tx, &new.project_id, new.tier, new.parent.as_deref(), &name)?;

            let mut row = ProjectCategory::new(
                new.project_id.clone(),
                name.clone(),
                new.tier,
                parent.map(|p| p.id),
            );
            row.color = color;
            row.description = new.description.clone().filter(|d| !d.trim().is_empty());
            row.sort_order = new.sort_order;

            insert_category(tx, &row)?;
            ctx.record_change("category", &row.id, EventType::CategoryCreated, None, Some(row.name.clone()));
            debug!(id = %row.id, name = %row.name, tier = %row.tier, "Created category");
            Ok(row)
        })
    }

    /// Apply a partial update (rename, recolor, description, sort order).
    ///
    /// Renames never touch name strings held by tasks or other records.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` for an unknown id, or a validation error.
    pub fn update_category(
        &mut self,
        id: &str,
        update: &CategoryUpdate,
        actor: &str,
    ) -> Result<ProjectCategory> {
        let name = update.name.as_deref().map(normalize_name).transpose()?;
        let color = update.color.as_deref().map(normalize_color).transpose()?;

        self.mutate("update_category", actor, |tx, ctx| {
            let current = select_category(tx, id)?.ok_or_else(|| Error::CategoryNotFound {
                id: id.to_string(),
            })?;
            let mut row = current.clone();

            if let Some(name) = name.filter(|n| *n != current.name) {
                ensure_unique_name(tx, &row.project_id, row.tier, &name, Some(&row.id))?;
                ctx.record_change(
                    "category",
                    &row.id,
                    EventType::CategoryRenamed,
                    Some(current.name.clone()),
                    Some(name.clone()),
                );
                row.name = name;
            }
            if let Some(color) = color.filter(|c| current.color.as_deref() != Some(c.as_str())) {
                ctx.record_change(
                    "category",
                    &row.id,
                    EventType::CategoryRecolored,
                    current.color.clone(),
                    Some(color.clone()),
                );
                row.color = Some(color);
            }
            if let Some(description) = &update.description {
                row.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
            }
            if let Some(sort_order) = update.sort_order {
                row.sort_order = sort_order;
            }
            if row.description != current.description || row.sort_order != current.sort_order {
                ctx.record_event("category", &row.id, EventType::CategoryUpdated);
            }

            row.updated_at = chrono::Utc::now().timestamp_millis();
            update_category_row(tx, &row)?;
            Ok(row)
        })
    }

    /// Set a single row's color. Used by theme application, one row per call.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if the row disappeared.
    pub fn set_category_color(&mut self, id: &str, color: &str, actor: &str) -> Result<()> {
        let color = normalize_color(color)?;
        self.mutate("set_category_color", actor, |tx, ctx| {
            let current = select_category(tx, id)?.ok_or_else(|| Error::CategoryNotFound {
                id: id.to_string(),
            })?;
            update_category_color(tx, id, &color, chrono::Utc::now().timestamp_millis())?;
            ctx.record_change("category", id, EventType::CategoryRecolored, current.color, Some(color.clone()));
            Ok(())
        })
    }

    /// Delete a category row.
    ///
    /// Deletion is row-local: tier2 children stay in storage as orphans and
    /// no referencing record is touched.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` for an unknown id.
    pub fn delete_category(&mut self, id: &str, actor: &str) -> Result<ProjectCategory> {
        self.mutate("delete_category", actor, |tx, ctx| {
            let row = select_category(tx, id)?.ok_or_else(|| Error::CategoryNotFound {
                id: id.to_string(),
            })?;
            delete_category_row(tx, id)?;
            ctx.record_change("category", id, EventType::CategoryDeleted, Some(row.name.clone()), None);
            Ok(row)
        })
    }
}

// ======================
// Template Rows
// ======================

const TEMPLATE_COLUMNS: &str =
    "id, name, tier, parent_id, color, description, sort_order, created_at, updated_at";

fn map_template_row(row: &Row) -> rusqlite::Result<CategoryTemplate> {
    let tier: String = row.get(2)?;
    Ok(CategoryTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        tier: CategoryTier::from_stored(&tier),
        parent_id: row.get(3)?,
        color: row.get(4)?,
        description: row.get(5)?,
        sort_order: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert_template(conn: &Connection, t: &CategoryTemplate) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO category_templates (id, name, tier, parent_id, color, description, sort_order, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            t.id,
            t.name,
            t.tier.as_str(),
            t.parent_id,
            t.color,
            t.description,
            t.sort_order,
            t.created_at,
            t.updated_at,
        ],
    )?;
    Ok(())
}

pub fn select_template(conn: &Connection, id: &str) -> rusqlite::Result<Option<CategoryTemplate>> {
    conn.query_row(
        &format!("SELECT {TEMPLATE_COLUMNS} FROM category_templates WHERE id = ?1"),
        [id],
        map_template_row,
    )
    .optional()
}

pub fn select_template_by_name(
    conn: &Connection,
    tier: CategoryTier,
    name: &str,
) -> rusqlite::Result<Option<CategoryTemplate>> {
    conn.query_row(
        &format!("SELECT {TEMPLATE_COLUMNS} FROM category_templates WHERE tier = ?1 AND name = ?2"),
        [tier.as_str(), name],
        map_template_row,
    )
    .optional()
}

pub fn select_templates(
    conn: &Connection,
    tier: Option<CategoryTier>,
) -> rusqlite::Result<Vec<CategoryTemplate>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM category_templates
         WHERE ?1 IS NULL OR tier = ?1
         ORDER BY tier, sort_order, name"
    ))?;
    let rows = stmt.query_map([tier.map(|t| t.as_str())], map_template_row)?;
    rows.collect()
}

pub fn delete_template_row(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM category_templates WHERE id = ?1", [id])
}

pub fn count_template_children(conn: &Connection, id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM category_templates WHERE parent_id = ?1",
        [id],
        |row| row.get(0),
    )
}

// ======================
// Project Category Rows
// ======================

const CATEGORY_COLUMNS: &str = "id, project_id, name, tier, parent_id, color, description, sort_order, template_id, created_at, updated_at";

fn map_category_row(row: &Row) -> rusqlite::Result<ProjectCategory> {
    let tier: String = row.get(3)?;
    Ok(ProjectCategory {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        tier: CategoryTier::from_stored(&tier),
        parent_id: row.get(4)?,
        color: row.get(5)?,
        description: row.get(6)?,
        sort_order: row.get(7)?,
        template_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub fn insert_category(conn: &Connection, c: &ProjectCategory) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO project_categories (id, project_id, name, tier, parent_id, color, description, sort_order, template_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            c.id,
            c.project_id,
            c.name,
            c.tier.as_str(),
            c.parent_id,
            c.color,
            c.description,
            c.sort_order,
            c.template_id,
            c.created_at,
            c.updated_at,
        ],
    )?;
    Ok(())
}

/// Overwrite every mutable column of an existing row.
pub fn update_category_row(conn: &Connection, c: &ProjectCategory) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE project_categories
         SET name = ?2, parent_id = ?3, color = ?4, description = ?5, sort_order = ?6,
             template_id = ?7, updated_at = ?8
         WHERE id = ?1",
        rusqlite::params![
            c.id,
            c.name,
            c.parent_id,
            c.color,
            c.description,
            c.sort_order,
            c.template_id,
            c.updated_at,
        ],
    )
}

pub fn update_category_color(
    conn: &Connection,
    id: &str,
    color: &str,
    now: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE project_categories SET color = ?2, updated_at = ?3 WHERE id = ?1",
        rusqlite::params![id, color, now],
    )
}

pub fn select_category(conn: &Connection, id: &str) -> rusqlite::Result<Option<ProjectCategory>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM project_categories WHERE id = ?1"),
        [id],
        map_category_row,
    )
    .optional()
}

pub fn select_category_by_name(
    conn: &Connection,
    project_id: &str,
    tier: CategoryTier,
    name: &str,
) -> rusqlite::Result<Option<ProjectCategory>> {
    conn.query_row(
        &format!(
            "SELECT {CATEGORY_COLUMNS} FROM project_categories
             WHERE project_id = ?1 AND tier = ?2 AND name = ?3"
        ),
        [project_id, tier.as_str(), name],
        map_category_row,
    )
    .optional()
}

/// Tier1 row of a project loaded from the given template.
pub fn select_category_by_template(
    conn: &Connection,
    project_id: &str,
    template_id: &str,
) -> rusqlite::Result<Option<ProjectCategory>> {
    conn.query_row(
        &format!(
            "SELECT {CATEGORY_COLUMNS} FROM project_categories
             WHERE project_id = ?1 AND template_id = ?2 AND tier = 'tier1'
             ORDER BY created_at LIMIT 1"
        ),
        [project_id, template_id],
        map_category_row,
    )
    .optional()
}

pub fn select_categories(
    conn: &Connection,
    project_id: &str,
) -> rusqlite::Result<Vec<ProjectCategory>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM project_categories
         WHERE project_id = ?1
         ORDER BY tier, sort_order, name"
    ))?;
    let rows = stmt.query_map([project_id], map_category_row)?;
    rows.collect()
}

pub fn delete_category_row(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM project_categories WHERE id = ?1", [id])
}

/// Reject a name already used by another row of the same project and tier.
pub fn ensure_unique_name(
    conn: &Connection,
    project_id: &str,
    tier: CategoryTier,
    name: &str,
    except_id: Option<&str>,
) -> Result<()> {
    match select_category_by_name(conn, project_id, tier, name)? {
        Some(existing) if Some(existing.id.as_str()) != except_id => Err(Error::DuplicateCategory {
            scope: format!("project {project_id}"),
            tier: tier.to_string(),
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Find a tier1 row of the project by id, falling back to its name.
pub fn find_tier1(
    conn: &Connection,
    project_id: &str,
    reference: &str,
) -> rusqlite::Result<Option<ProjectCategory>> {
    if let Some(row) = select_category(conn, reference)? {
        if row.project_id == project_id && row.tier == CategoryTier::Tier1 {
            return Ok(Some(row));
        }
    }
    select_category_by_name(conn, project_id, CategoryTier::Tier1, reference.trim())
}

/// Validate the parent of a row about to be written.
///
/// Tier1 rows take no parent. Tier2 rows need a tier1 row of the same
/// project, which is returned.
pub fn check_parent(
    conn: &Connection,
    project_id: &str,
    tier: CategoryTier,
    parent: Option<&str>,
    name: &str,
) -> Result<Option<ProjectCategory>> {
    match (tier, parent) {
        (CategoryTier::Tier1, None) => Ok(None),
        (CategoryTier::Tier1, Some(_)) => Err(Error::InvalidArgument(
            "tier1 categories cannot have a parent".to_string(),
        )),
        (CategoryTier::Tier2, None) => Err(Error::UnresolvedParent {
            name: name.to_string(),
            reason: "tier2 categories need a tier1 parent".to_string(),
        }),
        (CategoryTier::Tier2, Some(reference)) => find_tier1(conn, project_id, reference)?
            .map(Some)
            .ok_or_else(|| Error::UnresolvedParent {
                name: name.to_string(),
                reason: format!("no tier1 category '{reference}' in project {project_id}"),
            }),
    }
}

/// Insert `desired`, or update the row already holding its
/// `(project, tier, name)`.
///
/// On update, the existing id and creation time are kept and the
/// presentation fields are taken from `desired`; a missing color or
/// description or template id on `desired` keeps the stored one.
/// Returns the written row and whether it was created.
pub fn upsert_category(
    conn: &Connection,
    ctx: &mut MutationContext,
    desired: ProjectCategory,
) -> Result<(ProjectCategory, bool)> {
    let Some(existing) =
        select_category_by_name(conn, &desired.project_id, desired.tier, &desired.name)?
    else {
        insert_category(conn, &desired)?;
        ctx.record_change("category", &desired.id, EventType::CategoryCreated, None, Some(desired.name.clone()));
        return Ok((desired, true));
    };

    let row = ProjectCategory {
        id: existing.id.clone(),
        parent_id: desired.parent_id.or(existing.parent_id),
        color: desired.color.or(existing.color),
        description: desired.description.or(existing.description),
        template_id: desired.template_id.or(existing.template_id),
        created_at: existing.created_at,
        updated_at: chrono::Utc::now().timestamp_millis(),
        ..desired
    };
    update_category_row(conn, &row)?;
    ctx.record_event("category", &row.id, EventType::CategoryUpdated);
    Ok((row, false))
}

// ======================
// Theme Setting Rows
// ======================

pub fn select_theme_setting(
    conn: &Connection,
    project_id: &str,
) -> rusqlite::Result<Option<ProjectThemeSetting>> {
    conn.query_row(
        "SELECT project_id, color_theme, use_global_theme, updated_at
         FROM project_theme_settings WHERE project_id = ?1",
        [project_id],
        |row| {
            Ok(ProjectThemeSetting {
                project_id: row.get(0)?,
                color_theme: row.get(1)?,
                use_global_theme: row.get(2)?,
                updated_at: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn upsert_theme_setting(conn: &Connection, s: &ProjectThemeSetting) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO project_theme_settings (project_id, color_theme, use_global_theme, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(project_id) DO UPDATE SET
           color_theme = excluded.color_theme,
           use_global_theme = excluded.use_global_theme,
           updated_at = excluded.updated_at",
        rusqlite::params![s.project_id, s.color_theme, s.use_global_theme, s.updated_at],
    )?;
    Ok(())
}

// ======================
// Assignment Rows
// ======================

const ASSIGNMENT_COLUMNS: &str =
    "id, task_id, tier1_category, tier2_category, is_primary, created_at";

fn map_assignment_row(row: &Row) -> rusqlite::Result<TaskCategoryAssignment> {
    Ok(TaskCategoryAssignment {
        id: row.get(0)?,
        task_id: row.get(1)?,
        tier1_category: row.get(2)?,
        tier2_category: row.get(3)?,
        is_primary: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert_assignment(conn: &Connection, a: &TaskCategoryAssignment) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO task_category_assignments (id, task_id, tier1_category, tier2_category, is_primary, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            a.id,
            a.task_id,
            a.tier1_category,
            a.tier2_category,
            a.is_primary,
            a.created_at,
        ],
    )?;
    Ok(())
}

pub fn select_assignment(
    conn: &Connection,
    id: &str,
) -> rusqlite::Result<Option<TaskCategoryAssignment>> {
    conn.query_row(
        &format!("SELECT {ASSIGNMENT_COLUMNS} FROM task_category_assignments WHERE id = ?1"),
        [id],
        map_assignment_row,
    )
    .optional()
}

pub fn select_assignments(
    conn: &Connection,
    task_id: &str,
) -> rusqlite::Result<Vec<TaskCategoryAssignment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM task_category_assignments
         WHERE task_id = ?1
         ORDER BY created_at, id"
    ))?;
    let rows = stmt.query_map([task_id], map_assignment_row)?;
    rows.collect()
}

/// Clear the primary flag on every assignment of a task.
pub fn clear_primary(conn: &Connection, task_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE task_category_assignments SET is_primary = 0 WHERE task_id = ?1 AND is_primary = 1",
        [task_id],
    )
}

pub fn mark_primary(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE task_category_assignments SET is_primary = 1 WHERE id = ?1",
        [id],
    )
}

pub fn delete_assignment_row(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM task_category_assignments WHERE id = ?1", [id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tiercat.db");
        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            let row = ProjectCategory::new("p1".into(), "Structural".into(), CategoryTier::Tier1, None);
            storage
                .mutate("test", "actor", |tx, _| Ok(insert_category(tx, &row)?))
                .unwrap();
        }
        let reopened = SqliteStorage::open(&path).unwrap();
        assert_eq!(reopened.list_categories("p1").unwrap().len(), 1);
    }

    #[test]
    fn test_category_row_crud() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut row = ProjectCategory::new("p1".into(), "Structural".into(), CategoryTier::Tier1, None);
        row.color = Some("#b45309".into());

        storage
            .mutate("create", "actor", |tx, ctx| {
                insert_category(tx, &row)?;
                ctx.record_event("category", &row.id, EventType::CategoryCreated);
                Ok(())
            })
            .unwrap();

        let fetched = storage.get_category(&row.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Structural");
        assert_eq!(fetched.color.as_deref(), Some("#b45309"));

        let by_name = select_category_by_name(storage.conn(), "p1", CategoryTier::Tier1, "Structural")
            .unwrap();
        assert_eq!(by_name.map(|c| c.id), Some(row.id.clone()));

        let mut renamed = fetched.clone();
        renamed.name = "Framing Core".into();
        storage
            .mutate("rename", "actor", |tx, _| Ok(update_category_row(tx, &renamed)?))
            .unwrap();
        assert_eq!(storage.get_category(&row.id).unwrap().unwrap().name, "Framing Core");

        let history = storage.history("category", &row.id, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, EventType::CategoryCreated);

        storage
            .mutate("delete", "actor", |tx, _| Ok(delete_category_row(tx, &row.id)?))
            .unwrap();
        assert!(storage.get_category(&row.id).unwrap().is_none());
    }

    #[test]
    fn test_mutation_rolls_back_on_error() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let row = ProjectCategory::new("p1".into(), "Systems".into(), CategoryTier::Tier1, None);

        let result: Result<()> = storage.mutate("failing", "actor", |tx, _| {
            insert_category(tx, &row)?;
            Err(crate::Error::Other("boom".into()))
        });
        assert!(result.is_err());
        assert!(storage.list_categories("p1").unwrap().is_empty());
    }

    #[test]
    fn test_template_listing_filters_by_tier() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let parent = CategoryTemplate::new("Systems".into(), CategoryTier::Tier1, None);
        let child = CategoryTemplate::new("Plumbing".into(), CategoryTier::Tier2, Some(parent.id.clone()));

        storage
            .mutate("seed", "actor", |tx, _| {
                insert_template(tx, &parent)?;
                insert_template(tx, &child)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(storage.list_templates(None).unwrap().len(), 2);
        let tier2 = storage.list_templates(Some(CategoryTier::Tier2)).unwrap();
        assert_eq!(tier2.len(), 1);
        assert_eq!(tier2[0].name, "Plumbing");
        assert_eq!(count_template_children(storage.conn(), &parent.id).unwrap(), 1);
    }

    #[test]
    fn test_theme_setting_upsert() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        assert!(storage.get_theme_setting("p1").unwrap().is_none());

        let mut setting = ProjectThemeSetting::default_for("p1", "default");
        storage
            .mutate("set", "actor", |tx, _| Ok(upsert_theme_setting(tx, &setting)?))
            .unwrap();

        setting.color_theme = "earth".into();
        setting.use_global_theme = false;
        storage
            .mutate("set", "actor", |tx, _| Ok(upsert_theme_setting(tx, &setting)?))
            .unwrap();

        let stored = storage.get_theme_setting("p1").unwrap().unwrap();
        assert_eq!(stored.color_theme, "earth");
        assert!(!stored.use_global_theme);
    }

    fn new_category(name: &str, tier: CategoryTier, parent: Option<&str>) -> NewCategory {
        NewCategory {
            project_id: "p1".into(),
            name: name.into(),
            tier,
            parent: parent.map(str::to_string),
            color: None,
            description: None,
            sort_order: 0,
        }
    }

    #[test]
    fn test_create_category_validates_parent() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let structural = storage
            .create_category(&new_category("Structural", CategoryTier::Tier1, None), "actor")
            .unwrap();

        // Parent by name
        let foundation = storage
            .create_category(&new_category("Foundation", CategoryTier::Tier2, Some("Structural")), "actor")
            .unwrap();
        assert_eq!(foundation.parent_id.as_deref(), Some(structural.id.as_str()));

        // Parent by id
        let framing = storage
            .create_category(&new_category("Framing", CategoryTier::Tier2, Some(&structural.id)), "actor")
            .unwrap();
        assert_eq!(framing.parent_id, Some(structural.id.clone()));

        let missing = storage.create_category(&new_category("Roofing", CategoryTier::Tier2, Some("Nope")), "actor");
        assert!(matches!(missing, Err(Error::UnresolvedParent { .. })));

        let no_parent = storage.create_category(&new_category("Roofing", CategoryTier::Tier2, None), "actor");
        assert!(matches!(no_parent, Err(Error::UnresolvedParent { .. })));

        // A tier2 row is not a valid parent
        let nested = storage.create_category(&new_category("Rebar", CategoryTier::Tier2, Some(&foundation.id)), "actor");
        assert!(matches!(nested, Err(Error::UnresolvedParent { .. })));

        assert_eq!(storage.list_categories("p1").unwrap().len(), 3);
    }

    #[test]
    fn test_duplicate_name_is_validation_error() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .create_category(&new_category("Systems", CategoryTier::Tier1, None), "actor")
            .unwrap();
        let dup = storage.create_category(&new_category("Systems", CategoryTier::Tier1, None), "actor");
        assert!(matches!(dup, Err(Error::DuplicateCategory { .. })));
    }

    #[test]
    fn test_update_category_renames_and_recolors() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let row = storage
            .create_category(&new_category("Structural", CategoryTier::Tier1, None), "actor")
            .unwrap();
        storage
            .create_category(&new_category("Systems", CategoryTier::Tier1, None), "actor")
            .unwrap();

        let update = CategoryUpdate {
            name: Some("Framing Core".into()),
            color: Some("#ABC".into()),
            ..CategoryUpdate::default()
        };
        let updated = storage.update_category(&row.id, &update, "actor").unwrap();
        assert_eq!(updated.name, "Framing Core");
        assert_eq!(updated.color.as_deref(), Some("#aabbcc"));

        let history = storage.history("category", &row.id, 10).unwrap();
        let renamed = history
            .iter()
            .find(|e| e.event_type == EventType::CategoryRenamed)
            .unwrap();
        assert_eq!(renamed.old_value.as_deref(), Some("Structural"));

        let clash = CategoryUpdate {
            name: Some("Systems".into()),
            ..CategoryUpdate::default()
        };
        assert!(matches!(
            storage.update_category(&row.id, &clash, "actor"),
            Err(Error::DuplicateCategory { .. })
        ));
        assert!(matches!(
            storage.update_category("cat_missing", &update, "actor"),
            Err(Error::CategoryNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_tier1_leaves_children_in_storage() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let parent = storage
            .create_category(&new_category("Systems", CategoryTier::Tier1, None), "actor")
            .unwrap();
        let child = storage
            .create_category(&new_category("Plumbing", CategoryTier::Tier2, Some("Systems")), "actor")
            .unwrap();

        storage.delete_category(&parent.id, "actor").unwrap();
        let orphan = storage.get_category(&child.id).unwrap().unwrap();
        assert_eq!(orphan.parent_id, Some(parent.id));
    }

    #[test]
    fn test_upsert_updates_existing_row() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let original = storage
            .create_category(&new_category("Finishes", CategoryTier::Tier1, None), "actor")
            .unwrap();

        let mut desired = ProjectCategory::new("p1".into(), "Finishes".into(), CategoryTier::Tier1, None);
        desired.sort_order = 7;
        desired.description = Some("Paint and trim".into());
        let (row, created) = storage
            .mutate("upsert", "actor", |tx, ctx| upsert_category(tx, ctx, desired))
            .unwrap();

        assert!(!created);
        assert_eq!(row.id, original.id);
        assert_eq!(row.sort_order, 7);
        assert_eq!(storage.list_categories("p1").unwrap().len(), 1);
    }
}
