//! Reference consistency guard.
//!
//! Tasks, materials and labor entries hold category names, not ids, and
//! nothing updates them when a category is renamed or deleted. Reading such
//! a name goes through here: a name that still matches the resolved tree
//! renders with the category's color; anything else renders as its raw text
//! in the neutral color. Stored strings are never rewritten.

use serde::Serialize;

use super::resolver::{ResolvedCategory, ResolvedTree};
use crate::model::{CategoryReference, CategoryTier, RecordKind};

/// Display data for one category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgePart {
    pub label: String,
    pub color: String,
    /// Slug of the matched category
    pub category_id: Option<String>,
    pub matched: bool,
}

impl BadgePart {
    fn matched(category: &ResolvedCategory) -> Self {
        Self {
            label: category.name.clone(),
            color: category.color.clone(),
            category_id: Some(category.id.clone()),
            matched: true,
        }
    }

    fn unmatched(raw: &str, neutral_color: &str) -> Self {
        Self {
            label: raw.to_string(),
            color: neutral_color.to_string(),
            category_id: None,
            matched: false,
        }
    }
}

/// A rendered tier1 (and optional tier2) reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBadge {
    pub tier1: BadgePart,
    pub tier2: Option<BadgePart>,
}

impl CategoryBadge {
    /// True when every part matched a resolved category.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.tier1.matched && self.tier2.as_ref().is_none_or(|p| p.matched)
    }
}

fn same_name(stored: &str, name: &str) -> bool {
    stored.trim().to_lowercase() == name.trim().to_lowercase()
}

fn find_tier1<'t>(tree: &'t ResolvedTree, name: &str) -> Option<&'t ResolvedCategory> {
    tree.groups
        .iter()
        .map(|g| &g.category)
        .find(|c| same_name(name, &c.name))
}

fn find_tier2<'t>(
    tree: &'t ResolvedTree,
    parent: Option<&ResolvedCategory>,
    name: &str,
) -> Option<&'t ResolvedCategory> {
    let under_parent = parent.and_then(|p| {
        tree.groups
            .iter()
            .find(|g| g.category.id == p.id)
            .and_then(|g| g.children.iter().find(|c| same_name(name, &c.name)))
    });
    under_parent.or_else(|| {
        tree.iter()
            .filter(|c| c.tier == CategoryTier::Tier2)
            .find(|c| same_name(name, &c.name))
    })
}

/// Render a stored tier1/tier2 name pair against a resolved tree.
///
/// Never fails. Blank tier2 strings are treated as absent.
#[must_use]
pub fn render_reference(
    tree: &ResolvedTree,
    tier1: &str,
    tier2: Option<&str>,
    neutral_color: &str,
) -> CategoryBadge {
    let parent = find_tier1(tree, tier1);
    let tier1_part = parent.map_or_else(
        || BadgePart::unmatched(tier1, neutral_color),
        BadgePart::matched,
    );

    let tier2_part = tier2.filter(|t| !t.trim().is_empty()).map(|name| {
        find_tier2(tree, parent, name).map_or_else(
            || BadgePart::unmatched(name, neutral_color),
            BadgePart::matched,
        )
    });

    CategoryBadge {
        tier1: tier1_part,
        tier2: tier2_part,
    }
}

/// A stored reference that no longer matches the resolved tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanReference {
    pub kind: RecordKind,
    pub record_id: String,
    pub tier: CategoryTier,
    pub name: String,
}

/// List references whose tier1 or tier2 name matches nothing. Read-only.
#[must_use]
pub fn audit_references(tree: &ResolvedTree, refs: &[CategoryReference]) -> Vec<OrphanReference> {
    let mut orphans = Vec::new();
    for reference in refs {
        let tier1 = reference
            .tier1_category
            .as_deref()
            .filter(|t| !t.trim().is_empty());
        let parent = tier1.and_then(|name| find_tier1(tree, name));

        if let (Some(name), None) = (tier1, parent) {
            orphans.push(OrphanReference {
                kind: reference.kind,
                record_id: reference.record_id.clone(),
                tier: CategoryTier::Tier1,
                name: name.to_string(),
            });
        }

        if let Some(name) = reference
            .tier2_category
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            if find_tier2(tree, parent, name).is_none() {
                orphans.push(OrphanReference {
                    kind: reference.kind,
                    record_id: reference.record_id.clone(),
                    tier: CategoryTier::Tier2,
                    name: name.to_string(),
                });
            }
        }
    }
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryUpdate, NewCategory};
    use crate::storage::SqliteStorage;
    use crate::taxonomy::{ResolveOptions, Resolver};

    const NEUTRAL: &str = "#9ca3af";

    fn project_with_structural() -> (SqliteStorage, String) {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let structural = storage
            .create_category(
                &NewCategory {
                    project_id: "p1".into(),
                    name: "Structural".into(),
                    tier: CategoryTier::Tier1,
                    parent: None,
                    color: Some("#b45309".into()),
                    description: None,
                    sort_order: 0,
                },
                "test",
            )
            .unwrap();
        storage
            .create_category(
                &NewCategory {
                    project_id: "p1".into(),
                    name: "Foundation".into(),
                    tier: CategoryTier::Tier2,
                    parent: Some("Structural".into()),
                    color: None,
                    description: None,
                    sort_order: 0,
                },
                "test",
            )
            .unwrap();
        (storage, structural.id)
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let (storage, _) = project_with_structural();
        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");

        let badge = render_reference(&tree, "  structural ", Some("FOUNDATION"), NEUTRAL);
        assert!(badge.is_consistent());
        assert_eq!(badge.tier1.label, "Structural");
        assert_eq!(badge.tier1.color, "#b45309");
        assert_eq!(badge.tier2.unwrap().category_id.as_deref(), Some("foundation"));
    }

    #[test]
    fn test_rename_leaves_stale_reference() {
        let (mut storage, structural_id) = project_with_structural();
        storage
            .update_category(
                &structural_id,
                &CategoryUpdate {
                    name: Some("Framing Core".into()),
                    ..CategoryUpdate::default()
                },
                "test",
            )
            .unwrap();

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.groups[0].category.name, "Framing Core");
        assert_eq!(tree.groups[0].children[0].name, "Foundation");

        let badge = render_reference(&tree, "Structural", None, NEUTRAL);
        assert!(!badge.tier1.matched);
        assert_eq!(badge.tier1.label, "Structural");
        assert_eq!(badge.tier1.color, NEUTRAL);

        // The subcategory is still found anywhere in the tree
        let badge = render_reference(&tree, "Structural", Some("Foundation"), NEUTRAL);
        assert!(badge.tier2.unwrap().matched);
    }

    #[test]
    fn test_blank_tier2_is_absent() {
        let (storage, _) = project_with_structural();
        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert!(render_reference(&tree, "Structural", Some(" "), NEUTRAL).tier2.is_none());
    }

    #[test]
    fn test_audit_lists_only_orphans() {
        let (storage, _) = project_with_structural();
        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");

        let refs = vec![
            CategoryReference {
                kind: RecordKind::Task,
                record_id: "t1".into(),
                tier1_category: Some("Structural".into()),
                tier2_category: Some("Foundation".into()),
            },
            CategoryReference {
                kind: RecordKind::Material,
                record_id: "m1".into(),
                tier1_category: Some("Old Name".into()),
                tier2_category: Some("Gone".into()),
            },
            CategoryReference {
                kind: RecordKind::Labor,
                record_id: "l1".into(),
                tier1_category: None,
                tier2_category: None,
            },
        ];

        let orphans = audit_references(&tree, &refs);
        assert_eq!(orphans.len(), 2);
        assert!(orphans.iter().all(|o| o.record_id == "m1"));
        assert_eq!(orphans[0].tier, CategoryTier::Tier1);
        assert_eq!(orphans[1].name, "Gone");
    }
}
