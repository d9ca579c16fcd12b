//! Category resolution.
//!
//! Turns whatever a project has into one ordered tier1/tier2 tree. Sources
//! are tried in order and the first one producing at least one tier1 entry
//! wins:
//!
//! 1. the project's own category rows
//! 2. the global template registry
//! 3. the built-in fallback set
//!
//! A source that fails is logged and skipped, so resolution always returns
//! a non-empty tree. Resolution never writes.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::fallback::{self, FALLBACK_CATEGORIES};
use super::themes::{self, choose_colors, palette_order};
use super::CategorySource;
use crate::model::{CategoryTemplate, CategoryTier, ColorTheme, ProjectCategory};

/// Where a resolved tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Project,
    Templates,
    Fallback,
}

impl ResolutionSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Templates => "templates",
            Self::Fallback => "fallback",
        }
    }
}

/// Presentation defaults used while resolving.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Theme coloring rows that have no stored color
    pub theme: &'static ColorTheme,
    pub neutral_color: String,
    /// Description for rows with none stored and no built-in one
    pub generic_description: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            theme: &themes::THEMES[0],
            neutral_color: "#9ca3af".to_string(),
            generic_description: "Custom category".to_string(),
        }
    }
}

/// One resolved category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCategory {
    /// Slug of the name
    pub id: String,
    /// Storage id of the row or template (none for fallbacks)
    pub row_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub tier: CategoryTier,
    /// Slug of the parent's current name (tier2 only)
    pub parent_id: Option<String>,
    pub color: String,
    pub description: String,
    pub sort_order: i32,
}

/// A tier1 category with its children.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedGroup {
    pub category: ResolvedCategory,
    pub children: Vec<ResolvedCategory>,
}

/// The resolved tree of a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTree {
    pub project_id: String,
    pub source: ResolutionSource,
    pub groups: Vec<ResolvedGroup>,
}

impl ResolvedTree {
    fn new(project_id: &str, source: ResolutionSource, groups: Vec<ResolvedGroup>) -> Self {
        Self {
            project_id: project_id.to_string(),
            source,
            groups,
        }
    }

    /// Tier1 entries in order, each followed by its children.
    #[must_use]
    pub fn flatten(&self) -> Vec<ResolvedCategory> {
        self.groups
            .iter()
            .flat_map(|g| std::iter::once(g.category.clone()).chain(g.children.iter().cloned()))
            .collect()
    }

    #[must_use]
    pub fn tier1_count(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn tier2_count(&self) -> usize {
        self.groups.iter().map(|g| g.children.len()).sum()
    }

    /// Every resolved category, tier1 and tier2, in tree order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedCategory> {
        self.groups
            .iter()
            .flat_map(|g| std::iter::once(&g.category).chain(g.children.iter()))
    }
}

/// Resolves category trees from a [`CategorySource`].
pub struct Resolver<'a> {
    source: &'a dyn CategorySource,
    options: &'a ResolveOptions,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(source: &'a dyn CategorySource, options: &'a ResolveOptions) -> Self {
        Self { source, options }
    }

    /// Resolve the category tree of a project. Never fails.
    #[must_use]
    pub fn resolve(&self, project_id: &str) -> ResolvedTree {
        let project_rows = match self.source.project_categories(project_id) {
            Ok(rows) => rows.into_iter().map(SourceRow::from).collect(),
            Err(e) => {
                warn!(project = project_id, error = %e, "Project categories unavailable, skipping");
                Vec::new()
            }
        };
        if let Some(groups) = self.build(project_rows) {
            return ResolvedTree::new(project_id, ResolutionSource::Project, groups);
        }

        let template_rows = match self.source.global_templates() {
            Ok(rows) => rows.into_iter().map(SourceRow::from).collect(),
            Err(e) => {
                warn!(error = %e, "Templates unavailable, skipping");
                Vec::new()
            }
        };
        if let Some(groups) = self.build(template_rows) {
            return ResolvedTree::new(project_id, ResolutionSource::Templates, groups);
        }

        debug!(project = project_id, "Resolving from built-in fallback");
        let fallback_rows = FALLBACK_CATEGORIES.iter().map(SourceRow::from).collect();
        let groups = self.build(fallback_rows).unwrap_or_default();
        ResolvedTree::new(project_id, ResolutionSource::Fallback, groups)
    }

    /// Build groups from one source's rows; `None` when there is no tier1.
    fn build(&self, rows: Vec<SourceRow>) -> Option<Vec<ResolvedGroup>> {
        let (mut tier1, tier2): (Vec<SourceRow>, Vec<SourceRow>) =
            rows.into_iter().partition(|r| r.tier == CategoryTier::Tier1);
        if tier1.is_empty() {
            return None;
        }
        tier1.sort_by(SourceRow::order);

        let mut children: HashMap<String, Vec<SourceRow>> = HashMap::new();
        for row in tier2 {
            let attached = row
                .parent_key
                .as_ref()
                .filter(|key| tier1.iter().any(|p| &p.key == *key))
                .cloned();
            match attached {
                Some(key) => children.entry(key).or_default().push(row),
                None => debug!(name = %row.name, "Dropping tier2 with no resolved parent"),
            }
        }

        let mut ordered: Vec<(SourceRow, Vec<SourceRow>)> = tier1
            .into_iter()
            .map(|parent| {
                let mut kids = children.remove(&parent.key).unwrap_or_default();
                kids.sort_by(SourceRow::order);
                (parent, kids)
            })
            .collect();

        // Theme colors for rows without a stored one, handed out in the
        // same order `apply_theme` uses
        let mut uncolored: Vec<&SourceRow> = ordered
            .iter()
            .flat_map(|(p, kids)| std::iter::once(p).chain(kids.iter()))
            .filter(|r| r.color.is_none())
            .collect();
        uncolored.sort_by(|a, b| {
            palette_order(a.tier, a.sort_order, &a.name)
                .cmp(&palette_order(b.tier, b.sort_order, &b.name))
        });
        let choices = choose_colors(self.options.theme, uncolored.iter().map(|r| (r.tier, r.name.as_str())));
        let theme_colors: HashMap<String, themes::ColorChoice> = uncolored
            .iter()
            .zip(choices)
            .filter_map(|(row, choice)| choice.map(|c| (row.key.clone(), c)))
            .collect();

        let mut groups = Vec::with_capacity(ordered.len());
        for (parent, kids) in &mut ordered {
            let parent_slug = slugify(&parent.name);
            let category = self.resolve_row(parent, None, &theme_colors);
            let children = kids
                .iter_mut()
                .map(|kid| self.resolve_row(kid, Some(parent_slug.clone()), &theme_colors))
                .collect();
            groups.push(ResolvedGroup { category, children });
        }
        Some(groups)
    }

    fn resolve_row(
        &self,
        row: &mut SourceRow,
        parent_id: Option<String>,
        theme_colors: &HashMap<String, themes::ColorChoice>,
    ) -> ResolvedCategory {
        let color = match row.color.take() {
            Some(color) => color,
            None => theme_colors
                .get(&row.key)
                .map_or_else(|| self.options.neutral_color.clone(), |c| c.color.to_string()),
        };

        let description = row
            .description
            .take()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| fallback::description_for(&row.name).map(str::to_string))
            .unwrap_or_else(|| self.options.generic_description.clone());

        ResolvedCategory {
            id: slugify(&row.name),
            row_id: row.row_id.take(),
            name: row.name.clone(),
            tier: row.tier,
            parent_id,
            color,
            description,
            sort_order: row.sort_order,
        }
    }
}

/// Lowercase slug of a name: runs of anything but letters and digits become `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}

/// A row from any source, reduced to what resolution needs.
///
/// `key` identifies the row within its source and `parent_key` points at
/// another row's key: storage ids for project rows and templates, names for
/// fallbacks.
#[derive(Debug)]
struct SourceRow {
    key: String,
    row_id: Option<String>,
    name: String,
    tier: CategoryTier,
    parent_key: Option<String>,
    color: Option<String>,
    description: Option<String>,
    sort_order: i32,
}

impl SourceRow {
    fn order(a: &Self, b: &Self) -> std::cmp::Ordering {
        (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name))
    }
}

impl From<ProjectCategory> for SourceRow {
    fn from(row: ProjectCategory) -> Self {
        Self {
            key: row.id.clone(),
            row_id: Some(row.id),
            name: row.name,
            tier: row.tier,
            parent_key: row.parent_id,
            color: row.color,
            description: row.description,
            sort_order: row.sort_order,
        }
    }
}

impl From<CategoryTemplate> for SourceRow {
    fn from(t: CategoryTemplate) -> Self {
        Self {
            key: t.id.clone(),
            row_id: Some(t.id),
            name: t.name,
            tier: t.tier,
            parent_key: t.parent_id,
            color: t.color,
            description: t.description,
            sort_order: t.sort_order,
        }
    }
}

impl From<&fallback::FallbackCategory> for SourceRow {
    fn from(c: &fallback::FallbackCategory) -> Self {
        Self {
            key: c.name.to_string(),
            row_id: None,
            name: c.name.to_string(),
            tier: c.tier,
            parent_key: c.parent.map(str::to_string),
            color: None,
            description: Some(c.description.to_string()),
            sort_order: c.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::{CategoryUpdate, NewCategory};
    use crate::storage::SqliteStorage;

    struct BrokenSource;

    impl CategorySource for BrokenSource {
        fn project_categories(&self, _project_id: &str) -> Result<Vec<ProjectCategory>> {
            Err(Error::Other("disk on fire".into()))
        }

        fn global_templates(&self) -> Result<Vec<CategoryTemplate>> {
            Err(Error::Database(rusqlite::Error::InvalidQuery))
        }
    }

    fn create(storage: &mut SqliteStorage, name: &str, tier: CategoryTier, parent: Option<&str>, sort: i32) -> ProjectCategory {
        storage
            .create_category(
                &NewCategory {
                    project_id: "p1".into(),
                    name: name.into(),
                    tier,
                    parent: parent.map(str::to_string),
                    color: None,
                    description: None,
                    sort_order: sort,
                },
                "test",
            )
            .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Site Work"), "site-work");
        assert_eq!(slugify("  HVAC / Ducts!! "), "hvac-ducts");
        assert_eq!(slugify("***"), "category");
        assert_eq!(slugify("Framing Core"), "framing-core");
    }

    #[test]
    fn test_failing_sources_fall_back() {
        let options = ResolveOptions::default();
        let tree = Resolver::new(&BrokenSource, &options).resolve("p1");

        assert_eq!(tree.source, ResolutionSource::Fallback);
        assert_eq!(tree.tier1_count(), 5);
        assert_eq!(tree.tier2_count(), 8);
        assert!(tree.iter().all(|c| c.row_id.is_none()));
    }

    #[test]
    fn test_empty_storage_falls_back() {
        let storage = SqliteStorage::open_memory().unwrap();
        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.source, ResolutionSource::Fallback);
        assert_eq!(tree.groups[0].category.name, "Planning");
    }

    #[test]
    fn test_templates_used_when_project_empty() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let parent = CategoryTemplate::new("Exterior".into(), CategoryTier::Tier1, None);
        let child = CategoryTemplate::new("Siding".into(), CategoryTier::Tier2, Some(parent.id.clone()));
        storage
            .mutate("seed", "test", |tx, _| {
                crate::storage::sqlite::insert_template(tx, &parent)?;
                crate::storage::sqlite::insert_template(tx, &child)?;
                Ok(())
            })
            .unwrap();

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.source, ResolutionSource::Templates);
        assert_eq!(tree.groups.len(), 1);
        assert_eq!(tree.groups[0].children[0].parent_id.as_deref(), Some("exterior"));
        assert_eq!(tree.groups[0].category.description, "Custom category");
    }

    #[test]
    fn test_project_with_only_tier2_falls_through() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let parent = create(&mut storage, "Systems", CategoryTier::Tier1, None, 0);
        create(&mut storage, "Plumbing", CategoryTier::Tier2, Some("Systems"), 0);
        storage.delete_category(&parent.id, "test").unwrap();

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.source, ResolutionSource::Fallback);
    }

    #[test]
    fn test_orphans_hidden_but_kept() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        create(&mut storage, "Structural", CategoryTier::Tier1, None, 0);
        let systems = create(&mut storage, "Systems", CategoryTier::Tier1, None, 1);
        create(&mut storage, "Plumbing", CategoryTier::Tier2, Some("Systems"), 0);
        storage.delete_category(&systems.id, "test").unwrap();

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.source, ResolutionSource::Project);
        assert_eq!(tree.tier2_count(), 0);
        assert_eq!(storage.list_categories("p1").unwrap().len(), 2);

        let tier1_ids: Vec<&str> = tree.groups.iter().map(|g| g.category.id.as_str()).collect();
        for entry in tree.flatten().iter().filter(|c| c.tier == CategoryTier::Tier2) {
            assert!(tier1_ids.contains(&entry.parent_id.as_deref().unwrap()));
        }
    }

    #[test]
    fn test_ordering_by_sort_order_then_name() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        create(&mut storage, "Zeta", CategoryTier::Tier1, None, 0);
        create(&mut storage, "Alpha", CategoryTier::Tier1, None, 0);
        create(&mut storage, "First", CategoryTier::Tier1, None, -1);
        create(&mut storage, "b-child", CategoryTier::Tier2, Some("Alpha"), 2);
        create(&mut storage, "a-child", CategoryTier::Tier2, Some("Alpha"), 2);
        create(&mut storage, "z-child", CategoryTier::Tier2, Some("Alpha"), 1);

        let options = ResolveOptions::default();
        let flat: Vec<String> = Resolver::new(&storage, &options)
            .resolve("p1")
            .flatten()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(flat, ["First", "Alpha", "z-child", "a-child", "b-child", "Zeta"]);
    }

    #[test]
    fn test_color_and_description_cascade() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let painted = create(&mut storage, "Structural", CategoryTier::Tier1, None, 0);
        create(&mut storage, "Systems", CategoryTier::Tier1, None, 1);
        create(&mut storage, "Pool House", CategoryTier::Tier1, None, 2);
        storage
            .update_category(
                &painted.id,
                &CategoryUpdate {
                    color: Some("#123456".into()),
                    description: Some("Our shell".into()),
                    ..CategoryUpdate::default()
                },
                "test",
            )
            .unwrap();

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        let by_name = |n: &str| tree.iter().find(|c| c.name == n).unwrap().clone();

        let structural = by_name("Structural");
        assert_eq!(structural.color, "#123456");
        assert_eq!(structural.description, "Our shell");

        let systems = by_name("Systems");
        assert_eq!(systems.color, options.theme.tier1.systems);
        assert_eq!(systems.description, fallback::description_for("Systems").unwrap());

        let custom = by_name("Pool House");
        assert_eq!(custom.color, options.theme.tier1.planning);
        assert_eq!(custom.description, "Custom category");
    }

    #[test]
    fn test_positional_colors_agree_with_theme_plan() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        create(&mut storage, "Alpha", CategoryTier::Tier1, None, 0);
        create(&mut storage, "Beta", CategoryTier::Tier1, None, 1);
        create(&mut storage, "Zed", CategoryTier::Tier2, Some("Alpha"), 1);
        create(&mut storage, "Aardvark", CategoryTier::Tier2, Some("Beta"), 0);
        create(&mut storage, "Yak", CategoryTier::Tier2, Some("Beta"), 0);

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        let rows = storage.list_categories("p1").unwrap();
        let plan = themes::plan_theme(&rows, options.theme);

        assert_eq!(plan.entries.len(), 5);
        for entry in &plan.entries {
            let resolved = tree.iter().find(|c| c.name == entry.name).unwrap();
            assert_eq!(resolved.color, entry.new_color, "{}", entry.name);
        }
        let tier2 = options.theme.palette(CategoryTier::Tier2);
        let color_of = |n: &str| tree.iter().find(|c| c.name == n).unwrap().color.clone();
        assert_eq!(color_of("Aardvark"), tier2[0]);
        assert_eq!(color_of("Zed"), tier2[2]);
    }

    #[test]
    fn test_rename_keeps_children_attached() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let structural = create(&mut storage, "Structural", CategoryTier::Tier1, None, 0);
        create(&mut storage, "Foundation", CategoryTier::Tier2, Some("Structural"), 0);

        storage
            .update_category(
                &structural.id,
                &CategoryUpdate {
                    name: Some("Framing Core".into()),
                    ..CategoryUpdate::default()
                },
                "test",
            )
            .unwrap();

        let options = ResolveOptions::default();
        let tree = Resolver::new(&storage, &options).resolve("p1");
        assert_eq!(tree.groups.len(), 1);
        assert_eq!(tree.groups[0].category.name, "Framing Core");
        assert_eq!(tree.groups[0].children[0].name, "Foundation");
        assert_eq!(tree.groups[0].children[0].parent_id.as_deref(), Some("framing-core"));
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        create(&mut storage, "Structural", CategoryTier::Tier1, None, 0);
        let options = ResolveOptions::default();
        let resolver = Resolver::new(&storage, &options);
        assert_eq!(resolver.resolve("p1").flatten(), resolver.resolve("p1").flatten());
    }
}
