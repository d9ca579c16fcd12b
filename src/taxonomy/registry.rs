//! Template registry: global templates and loading them into projects.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::fallback::FALLBACK_CATEGORIES;
use super::themes::THEMES;
use crate::error::{Error, Result};
use crate::model::{BatchResult, CategoryTemplate, CategoryTier, ProjectCategory};
use crate::storage::events::EventType;
use crate::storage::sqlite::{
    count_template_children, delete_template_row, find_tier1, insert_template,
    select_category_by_template, select_template, select_template_by_name, upsert_category,
};
use crate::storage::{MutationContext, SqliteStorage};
use crate::validate::{normalize_name, normalize_optional_color};

/// Input for a new global template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub tier: CategoryTier,
    /// Parent tier1 template id (tier2 only)
    pub parent_id: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

/// Global templates, optionally of one tier.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_templates(
    storage: &SqliteStorage,
    tier: Option<CategoryTier>,
) -> Result<Vec<CategoryTemplate>> {
    storage.list_templates(tier)
}

/// Create a global template.
///
/// # Errors
///
/// Returns a validation error for a duplicate `(tier, name)`, a malformed
/// color, or a parent that is missing or not tier1.
pub fn create_template(
    storage: &mut SqliteStorage,
    new: &NewTemplate,
    actor: &str,
) -> Result<CategoryTemplate> {
    let name = normalize_name(&new.name)?;
    let color = normalize_optional_color(new.color.as_deref())?;

    storage.mutate("create_template", actor, |tx, ctx| {
        if select_template_by_name(tx, new.tier, &name)?.is_some() {
            return Err(Error::DuplicateCategory {
                scope: "the template registry".to_string(),
                tier: new.tier.to_string(),
                name,
            });
        }

        match (new.tier, new.parent_id.as_deref()) {
            (CategoryTier::Tier1, Some(_)) => {
                return Err(Error::InvalidArgument(
                    "tier1 templates cannot have a parent".to_string(),
                ));
            }
            (CategoryTier::Tier2, None) => {
                return Err(Error::UnresolvedParent {
                    name,
                    reason: "tier2 templates need a tier1 parent template".to_string(),
                });
            }
            (CategoryTier::Tier2, Some(parent_id)) => match select_template(tx, parent_id)? {
                Some(parent) if parent.tier == CategoryTier::Tier1 => {}
                Some(_) => {
                    return Err(Error::UnresolvedParent {
                        name,
                        reason: format!("template {parent_id} is not tier1"),
                    });
                }
                None => {
                    return Err(Error::UnresolvedParent {
                        name,
                        reason: format!("no template {parent_id}"),
                    });
                }
            },
            (CategoryTier::Tier1, None) => {}
        }

        let mut template = CategoryTemplate::new(name, new.tier, new.parent_id.clone());
        template.color = color;
        template.description = new.description.clone().filter(|d| !d.trim().is_empty());
        template.sort_order = new.sort_order;

        insert_template(tx, &template)?;
        ctx.record_change("template", &template.id, EventType::TemplateCreated, None, Some(template.name.clone()));
        Ok(template)
    })
}

/// Delete a template.
///
/// Project rows loaded from it keep their `template_id`; tier2 templates
/// under it become orphans that resolution skips.
///
/// # Errors
///
/// Returns `TemplateNotFound` for an unknown id.
pub fn delete_template(storage: &mut SqliteStorage, id: &str, actor: &str) -> Result<CategoryTemplate> {
    storage.mutate("delete_template", actor, |tx, ctx| {
        let template = select_template(tx, id)?.ok_or_else(|| Error::TemplateNotFound {
            id: id.to_string(),
        })?;
        let children = count_template_children(tx, id)?;
        if children > 0 {
            warn!(template = id, children, "Deleting tier1 template with children");
        }
        delete_template_row(tx, id)?;
        ctx.record_change("template", id, EventType::TemplateDeleted, Some(template.name.clone()), None);
        Ok(template)
    })
}

/// Fill an empty registry with the built-in categories.
///
/// Returns the number of templates inserted; zero when the registry
/// already had templates.
///
/// # Errors
///
/// Returns an error if the inserts fail.
pub fn seed_default_templates(storage: &mut SqliteStorage, actor: &str) -> Result<usize> {
    if !storage.list_templates(None)?.is_empty() {
        debug!("Template registry not empty, skipping seed");
        return Ok(0);
    }

    let theme = &THEMES[0];
    storage.mutate("seed_default_templates", actor, |tx, ctx| {
        let mut ids_by_name = std::collections::HashMap::new();
        let mut inserted = 0;

        // Tier1 entries come first in the fallback set
        for entry in &FALLBACK_CATEGORIES {
            let parent_id = entry
                .parent
                .and_then(|p| ids_by_name.get(p).cloned());
            let mut template = CategoryTemplate::new(entry.name.to_string(), entry.tier, parent_id);
            template.color = theme.slot_color(entry.tier, entry.name).map(str::to_string);
            template.description = Some(entry.description.to_string());
            template.sort_order = entry.sort_order;

            insert_template(tx, &template)?;
            ctx.record_event("template", &template.id, EventType::TemplateCreated);
            if entry.tier == CategoryTier::Tier1 {
                ids_by_name.insert(entry.name, template.id);
            }
            inserted += 1;
        }

        info!(count = inserted, "Seeded default templates");
        Ok(inserted)
    })
}

/// Copy templates into a project.
///
/// Each distinct id is processed once, tier1 templates before tier2 ones,
/// each in its own transaction. A tier2 template needs its parent in the
/// project already: a tier1 row loaded from the parent template or carrying
/// the parent template's name. Items that cannot be loaded are reported in
/// `failed` and leave no row behind; the rest still load.
///
/// Existing rows with the same `(tier, name)` are updated in place.
/// A template id whose lookup fails is reported like any other item.
#[must_use]
pub fn load_templates_into_project(
    storage: &mut SqliteStorage,
    project_id: &str,
    template_ids: &[String],
    actor: &str,
) -> BatchResult<ProjectCategory> {
    let mut batch = BatchResult::default();
    let mut seen = HashSet::new();
    let mut templates = Vec::new();

    for id in template_ids {
        let id = id.trim();
        if !seen.insert(id.to_string()) {
            continue;
        }
        match storage.get_template(id) {
            Ok(Some(template)) => templates.push(template),
            Ok(None) => batch.push_err(id, &Error::TemplateNotFound { id: id.to_string() }),
            Err(e) => {
                warn!(template = id, error = %e, "Template lookup failed");
                batch.push_err(id, &e);
            }
        }
    }

    // Stable: input order is kept within a tier
    templates.sort_by_key(|t| t.tier);

    for template in &templates {
        let result = storage.mutate("load_template", actor, |tx, ctx| {
            load_one(tx, ctx, project_id, template)
        });
        match result {
            Ok(row) => {
                debug!(template = %template.id, category = %row.id, "Loaded template");
                batch.push_ok(row);
            }
            Err(e) => {
                warn!(template = %template.id, error = %e, "Template load failed");
                batch.push_err(&template.id, &e);
            }
        }
    }

    info!(
        project = project_id,
        loaded = batch.succeeded.len(),
        failed = batch.failed.len(),
        "Loaded templates"
    );
    batch
}

fn load_one(
    tx: &rusqlite::Connection,
    ctx: &mut MutationContext,
    project_id: &str,
    template: &CategoryTemplate,
) -> Result<ProjectCategory> {
    let mut row = ProjectCategory::from_template(project_id, template);

    if template.tier == CategoryTier::Tier2 {
        let parent = template_parent_row(tx, project_id, template)?;
        row.parent_id = Some(parent.id);
    }

    let (row, created) = upsert_category(tx, ctx, row)?;
    debug!(category = %row.name, created, "Upserted category from template");
    Ok(row)
}

/// The project's tier1 row standing in for a tier2 template's parent.
fn template_parent_row(
    conn: &rusqlite::Connection,
    project_id: &str,
    template: &CategoryTemplate,
) -> Result<ProjectCategory> {
    let unresolved = |reason: String| Error::UnresolvedParent {
        name: template.name.clone(),
        reason,
    };

    let parent_id = template
        .parent_id
        .as_deref()
        .ok_or_else(|| unresolved("template has no parent".to_string()))?;

    if let Some(row) = select_category_by_template(conn, project_id, parent_id)? {
        return Ok(row);
    }

    let parent_name = select_template(conn, parent_id)?.map(|p| p.name);
    if let Some(name) = &parent_name {
        if let Some(row) = find_tier1(conn, project_id, name)? {
            return Ok(row);
        }
    }

    Err(unresolved(format!(
        "parent template {} is not loaded in project {project_id}",
        parent_name.as_deref().unwrap_or(parent_id)
    )))
}
