//! Built-in presets: named tier1/tier2 trees applied to a project in one go.
//!
//! Children reference their parent by name; ids only exist once the rows
//! are written.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::themes::THEMES;
use crate::error::{Error, Result};
use crate::model::{BatchFailure, CategoryTier, ProjectCategory};
use crate::storage::sqlite::{find_tier1, select_category_by_name, upsert_category};
use crate::storage::SqliteStorage;
use crate::validate::find_similar;

/// A node of a preset tree.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetNode {
    pub name: &'static str,
    pub description: &'static str,
    pub sort_order: i32,
    pub children: &'static [PresetChild],
}

/// A tier2 node of a preset.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetChild {
    pub name: &'static str,
    pub description: &'static str,
    pub sort_order: i32,
}

/// A named preset.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub categories: &'static [PresetNode],
}

impl Preset {
    #[must_use]
    pub fn tier2_count(&self) -> usize {
        self.categories.iter().map(|c| c.children.len()).sum()
    }
}

const fn child(name: &'static str, description: &'static str, sort_order: i32) -> PresetChild {
    PresetChild {
        name,
        description,
        sort_order,
    }
}

pub static PRESETS: [Preset; 3] = [
    Preset {
        id: "home-builder",
        name: "Home Builder",
        description: "New single-family construction from permits to paint",
        categories: &[
            PresetNode {
                name: "Planning",
                description: "Design, approvals and budget",
                sort_order: 0,
                children: &[
                    child("Design", "Plans, drawings and selections", 0),
                    child("Permits", "Building permits and inspections", 1),
                    child("Budgeting", "Estimates, draws and change orders", 2),
                ],
            },
            PresetNode {
                name: "Structural",
                description: "Foundation to roof",
                sort_order: 1,
                children: &[
                    child("Foundation", "Footings, slab and stem walls", 0),
                    child("Framing", "Walls, floors and trusses", 1),
                    child("Roofing", "Sheathing, underlayment and shingles", 2),
                ],
            },
            PresetNode {
                name: "Systems",
                description: "Mechanical, electrical and plumbing",
                sort_order: 2,
                children: &[
                    child("Electrical", "Service, rough-in and trim-out", 0),
                    child("Plumbing", "Supply, drain and fixtures rough-in", 1),
                    child("HVAC", "Equipment, ductwork and controls", 2),
                ],
            },
            PresetNode {
                name: "Finishes",
                description: "Everything you see and touch",
                sort_order: 3,
                children: &[
                    child("Drywall", "Hang, tape and texture", 0),
                    child("Flooring", "Tile, hardwood and carpet", 1),
                    child("Painting", "Interior and exterior paint", 2),
                    child("Cabinetry", "Kitchen and bath cabinets", 3),
                ],
            },
        ],
    },
    Preset {
        id: "remodel",
        name: "Remodel",
        description: "Renovation of an occupied home",
        categories: &[
            PresetNode {
                name: "Demolition",
                description: "Tear-out and haul-away",
                sort_order: 0,
                children: &[
                    child("Interior Demo", "Walls, finishes and fixtures", 0),
                    child("Disposal", "Dumpsters and hauling", 1),
                ],
            },
            PresetNode {
                name: "Systems",
                description: "Updates to existing services",
                sort_order: 1,
                children: &[
                    child("Electrical", "Panel upgrades and new circuits", 0),
                    child("Plumbing", "Re-piping and fixture moves", 1),
                ],
            },
            PresetNode {
                name: "Finishes",
                description: "New surfaces and fixtures",
                sort_order: 2,
                children: &[
                    child("Drywall", "Patching and new walls", 0),
                    child("Painting", "Walls, trim and ceilings", 1),
                    child("Fixtures", "Lighting, faucets and hardware", 2),
                ],
            },
        ],
    },
    Preset {
        id: "landscaping",
        name: "Landscaping",
        description: "Outdoor and site projects",
        categories: &[
            PresetNode {
                name: "Site Work",
                description: "Preparing the ground",
                sort_order: 0,
                children: &[
                    child("Grading", "Slopes and drainage", 0),
                    child("Utilities", "Irrigation and lighting lines", 1),
                ],
            },
            PresetNode {
                name: "Hardscape",
                description: "Paths, patios and walls",
                sort_order: 1,
                children: &[
                    child("Masonry", "Retaining walls and pavers", 0),
                    child("Decking", "Wood and composite decks", 1),
                ],
            },
            PresetNode {
                name: "Softscape",
                description: "Living material",
                sort_order: 2,
                children: &[
                    child("Landscaping", "Planting beds, trees and shrubs", 0),
                    child("Lawn", "Sod and seed", 1),
                ],
            },
        ],
    },
];

/// All presets in catalog order.
#[must_use]
pub fn list_presets() -> &'static [Preset] {
    &PRESETS
}

/// Look up a preset by id, ignoring case.
///
/// # Errors
///
/// Returns `PresetNotFound` (with close ids when there are any).
pub fn get_preset(id: &str) -> Result<&'static Preset> {
    let wanted = id.trim();
    if let Some(preset) = PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(wanted)) {
        return Ok(preset);
    }

    let ids: Vec<&str> = PRESETS.iter().map(|p| p.id).collect();
    let similar = find_similar(wanted, &ids, 3);
    if similar.is_empty() {
        Err(Error::PresetNotFound { id: id.to_string() })
    } else {
        Err(Error::PresetNotFoundSimilar {
            id: id.to_string(),
            similar,
        })
    }
}

/// Result of applying a preset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PresetOutcome {
    pub created: Vec<ProjectCategory>,
    pub updated: Vec<ProjectCategory>,
    pub failed: Vec<BatchFailure>,
}

impl PresetOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.failed.len()
    }

    /// Convert to `Err(PartialBatchFailure)` when any node failed.
    ///
    /// # Errors
    ///
    /// Returns `PartialBatchFailure` if at least one node failed.
    pub fn check(&self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(Error::PartialBatchFailure {
                failed: self.failed.len(),
                total: self.total(),
            })
        }
    }
}

/// Seed a project from a preset.
///
/// Tier1 nodes are written first, then tier2 nodes with their parent
/// looked up by name. Each node is its own transaction. Rows that already
/// exist with the same `(tier, name)` are updated rather than duplicated.
///
/// # Errors
///
/// Returns `PresetNotFound` for an unknown preset. Node failures are
/// reported in the outcome.
pub fn apply_preset(
    storage: &mut SqliteStorage,
    project_id: &str,
    preset_id: &str,
    actor: &str,
) -> Result<PresetOutcome> {
    let preset = get_preset(preset_id)?;
    let theme = &THEMES[0];
    let mut outcome = PresetOutcome::default();

    let record = |outcome: &mut PresetOutcome, name: &str, result: Result<(ProjectCategory, bool)>| {
        match result {
            Ok((row, true)) => outcome.created.push(row),
            Ok((row, false)) => outcome.updated.push(row),
            Err(e) => {
                warn!(preset = preset.id, node = name, error = %e, "Preset node failed");
                outcome.failed.push(BatchFailure::from_error(name, &e));
            }
        }
    };

    for node in preset.categories {
        let mut row = ProjectCategory::new(
            project_id.to_string(),
            node.name.to_string(),
            CategoryTier::Tier1,
            None,
        );
        row.description = Some(node.description.to_string());
        row.sort_order = node.sort_order;
        row.color = theme.slot_color(CategoryTier::Tier1, node.name).map(str::to_string);

        let result = storage.mutate("apply_preset", actor, |tx, ctx| {
            let row = keep_existing_color(tx, row)?;
            upsert_category(tx, ctx, row)
        });
        record(&mut outcome, node.name, result);
    }

    for node in preset.categories {
        for leaf in node.children {
            let result = storage.mutate("apply_preset", actor, |tx, ctx| {
                let parent = find_tier1(tx, project_id, node.name)?.ok_or_else(|| {
                    Error::UnresolvedParent {
                        name: leaf.name.to_string(),
                        reason: format!("tier1 category '{}' was not created", node.name),
                    }
                })?;

                let mut row = ProjectCategory::new(
                    project_id.to_string(),
                    leaf.name.to_string(),
                    CategoryTier::Tier2,
                    Some(parent.id),
                );
                row.description = Some(leaf.description.to_string());
                row.sort_order = leaf.sort_order;
                row.color = theme.slot_color(CategoryTier::Tier2, leaf.name).map(str::to_string);
                let row = keep_existing_color(tx, row)?;
                upsert_category(tx, ctx, row)
            });
            record(&mut outcome, leaf.name, result);
        }
    }

    debug!(preset = preset.id, "Preset nodes processed");
    info!(
        project = project_id,
        preset = preset.id,
        created = outcome.created.len(),
        updated = outcome.updated.len(),
        failed = outcome.failed.len(),
        "Applied preset"
    );
    Ok(outcome)
}

/// Preset colors only paint new rows.
fn keep_existing_color(conn: &Connection, mut row: ProjectCategory) -> Result<ProjectCategory> {
    if select_category_by_name(conn, &row.project_id, row.tier, &row.name)?.is_some() {
        row.color = None;
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryUpdate, NewCategory};
    use crate::taxonomy::{ResolveOptions, Resolver};

    #[test]
    fn test_preset_catalog_names_are_unique_per_tier() {
        for preset in list_presets() {
            let mut tier1: Vec<&str> = preset.categories.iter().map(|c| c.name).collect();
            tier1.sort_unstable();
            tier1.dedup();
            assert_eq!(tier1.len(), preset.categories.len(), "{}", preset.id);
        }
    }

    #[test]
    fn test_get_preset_suggestions() {
        assert_eq!(get_preset("Home-Builder").unwrap().id, "home-builder");
        assert!(matches!(
            get_preset("remodle"),
            Err(Error::PresetNotFoundSimilar { .. })
        ));
        assert!(matches!(
            get_preset("spaceship-hangar"),
            Err(Error::PresetNotFound { .. })
        ));
    }

    #[test]
    fn test_home_builder_on_empty_project() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let outcome = apply_preset(&mut storage, "p1", "home-builder", "test").unwrap();

        let preset = get_preset("home-builder").unwrap();
        assert!(outcome.failed.is_empty());
        assert!(outcome.updated.is_empty());
        assert_eq!(outcome.created.len(), 4 + preset.tier2_count());

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.tier1_count(), 4);

        for (group, node) in tree.groups.iter().zip(preset.categories) {
            assert_eq!(group.category.name, node.name);
            assert_eq!(group.category.sort_order, node.sort_order);
            let children: Vec<(&str, i32)> = group
                .children
                .iter()
                .map(|c| (c.name.as_str(), c.sort_order))
                .collect();
            let declared: Vec<(&str, i32)> =
                node.children.iter().map(|c| (c.name, c.sort_order)).collect();
            assert_eq!(children, declared);
        }
    }

    #[test]
    fn test_reapply_updates_instead_of_duplicating() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let existing = storage
            .create_category(
                &NewCategory {
                    project_id: "p1".into(),
                    name: "Systems".into(),
                    tier: CategoryTier::Tier1,
                    parent: None,
                    color: Some("#000000".into()),
                    description: None,
                    sort_order: 9,
                },
                "test",
            )
            .unwrap();

        let outcome = apply_preset(&mut storage, "p1", "remodel", "test").unwrap();
        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.updated[0].id, existing.id);
        // Existing color is kept, sort order follows the preset
        assert_eq!(outcome.updated[0].color.as_deref(), Some("#000000"));
        assert_eq!(outcome.updated[0].sort_order, 1);

        let again = apply_preset(&mut storage, "p1", "remodel", "test").unwrap();
        assert!(again.created.is_empty());
        let total: usize = get_preset("remodel")
            .map(|p| p.categories.len() + p.tier2_count())
            .unwrap();
        assert_eq!(storage.list_categories("p1").unwrap().len(), total);
    }

    #[test]
    fn test_reapply_after_rename_recreates_parent() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        apply_preset(&mut storage, "p1", "landscaping", "test").unwrap();

        let rows = storage.list_categories("p1").unwrap();
        let site = rows.iter().find(|r| r.name == "Site Work").unwrap();
        storage
            .update_category(
                &site.id,
                &CategoryUpdate {
                    name: Some("Lot Prep".into()),
                    ..CategoryUpdate::default()
                },
                "test",
            )
            .unwrap();

        let outcome = apply_preset(&mut storage, "p1", "landscaping", "test").unwrap();
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].name, "Site Work");
    }
}
