//! Theme engine.
//!
//! Themes are a static, closed catalog. Colors reach project rows only
//! through [`apply_theme`]; storing a theme preference never recolors
//! anything.
//!
//! Color choice for a category, in order:
//! 1. the slot whose label matches the trimmed category name, ignoring
//!    case, within the category's tier;
//! 2. otherwise the tier palette color at the category's position among the
//!    unmatched categories of that tier, cycling through the palette.
//!    Positions follow [`palette_order`] both when resolving and when
//!    applying a theme.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    AliasColors, CategoryTier, ColorTheme, ProjectCategory, ProjectThemeSetting, Tier1Palette,
    Tier2Palette,
};
use crate::storage::events::EventType;
use crate::storage::sqlite::upsert_theme_setting;
use crate::storage::SqliteStorage;
use crate::validate::find_similar;

/// Name of the theme used when nothing else is configured.
pub const DEFAULT_THEME: &str = "default";

/// The theme catalog.
pub static THEMES: [ColorTheme; 5] = [
    ColorTheme {
        name: "default",
        description: "Balanced blues, ambers and teals",
        tier1: Tier1Palette {
            planning: "#3b82f6",
            site_work: "#a16207",
            structural: "#b45309",
            systems: "#0d9488",
            finishes: "#8b5cf6",
        },
        tier2: Tier2Palette {
            design: "#60a5fa",
            permits: "#2563eb",
            budgeting: "#1d4ed8",
            excavation: "#ca8a04",
            grading: "#eab308",
            utilities: "#854d0e",
            landscaping: "#16a34a",
            foundation: "#d97706",
            framing: "#f59e0b",
            roofing: "#92400e",
            masonry: "#78350f",
            electrical: "#14b8a6",
            plumbing: "#0891b2",
            hvac: "#0e7490",
            insulation: "#5eead4",
            drywall: "#a78bfa",
            flooring: "#7c3aed",
            painting: "#c084fc",
            cabinetry: "#6d28d9",
            fixtures: "#ddd6fe",
        },
        aliases: AliasColors {
            primary: "#3b82f6",
            secondary: "#64748b",
            accent: "#f59e0b",
            muted: "#e5e7eb",
            border: "#d1d5db",
        },
    },
    ColorTheme {
        name: "earth",
        description: "Soil, clay and moss tones",
        tier1: Tier1Palette {
            planning: "#6b8e23",
            site_work: "#8b5a2b",
            structural: "#a0522d",
            systems: "#556b2f",
            finishes: "#cd853f",
        },
        tier2: Tier2Palette {
            design: "#9acd32",
            permits: "#808000",
            budgeting: "#6b705c",
            excavation: "#7f5539",
            grading: "#9c6644",
            utilities: "#b08968",
            landscaping: "#4f772d",
            foundation: "#8d6346",
            framing: "#bc6c25",
            roofing: "#6f4518",
            masonry: "#9d4edd",
            electrical: "#606c38",
            plumbing: "#283618",
            hvac: "#3a5a40",
            insulation: "#a3b18a",
            drywall: "#dda15e",
            flooring: "#b5838d",
            painting: "#e6ccb2",
            cabinetry: "#7f4f24",
            fixtures: "#c9ada7",
        },
        aliases: AliasColors {
            primary: "#6b8e23",
            secondary: "#8b5a2b",
            accent: "#cd853f",
            muted: "#ede0d4",
            border: "#ddb892",
        },
    },
    ColorTheme {
        name: "ocean",
        description: "Deep blues, teals and sea greens",
        tier1: Tier1Palette {
            planning: "#0077b6",
            site_work: "#00b4d8",
            structural: "#023e8a",
            systems: "#2a9d8f",
            finishes: "#48cae4",
        },
        tier2: Tier2Palette {
            design: "#90e0ef",
            permits: "#0096c7",
            budgeting: "#03045e",
            excavation: "#caf0f8",
            grading: "#52b69a",
            utilities: "#168aad",
            landscaping: "#76c893",
            foundation: "#1e6091",
            framing: "#184e77",
            roofing: "#1a759f",
            masonry: "#34a0a4",
            electrical: "#99d98c",
            plumbing: "#264653",
            hvac: "#287271",
            insulation: "#8ab17d",
            drywall: "#ade8f4",
            flooring: "#5e60ce",
            painting: "#4ea8de",
            cabinetry: "#5390d9",
            fixtures: "#64dfdf",
        },
        aliases: AliasColors {
            primary: "#0077b6",
            secondary: "#2a9d8f",
            accent: "#48cae4",
            muted: "#e0fbfc",
            border: "#a8dadc",
        },
    },
    ColorTheme {
        name: "sunset",
        description: "Warm oranges, reds and magentas",
        tier1: Tier1Palette {
            planning: "#f4a261",
            site_work: "#e76f51",
            structural: "#d62828",
            systems: "#9d0208",
            finishes: "#c9184a",
        },
        tier2: Tier2Palette {
            design: "#ffb703",
            permits: "#fb8500",
            budgeting: "#f77f00",
            excavation: "#e85d04",
            grading: "#dc2f02",
            utilities: "#d00000",
            landscaping: "#e9c46a",
            foundation: "#ba181b",
            framing: "#a4161a",
            roofing: "#660708",
            masonry: "#ff758f",
            electrical: "#ff4d6d",
            plumbing: "#c77dff",
            hvac: "#7b2cbf",
            insulation: "#ffccd5",
            drywall: "#ff8fa3",
            flooring: "#800f2f",
            painting: "#ffa62b",
            cabinetry: "#6a040f",
            fixtures: "#ffd166",
        },
        aliases: AliasColors {
            primary: "#e76f51",
            secondary: "#f4a261",
            accent: "#c9184a",
            muted: "#fff1e6",
            border: "#fcd5ce",
        },
    },
    ColorTheme {
        name: "slate",
        description: "Muted grays with cool accents",
        tier1: Tier1Palette {
            planning: "#475569",
            site_work: "#64748b",
            structural: "#334155",
            systems: "#1e293b",
            finishes: "#94a3b8",
        },
        tier2: Tier2Palette {
            design: "#cbd5e1",
            permits: "#6b7280",
            budgeting: "#4b5563",
            excavation: "#78716c",
            grading: "#a8a29e",
            utilities: "#57534e",
            landscaping: "#71717a",
            foundation: "#3f3f46",
            framing: "#52525b",
            roofing: "#27272a",
            masonry: "#44403c",
            electrical: "#374151",
            plumbing: "#1f2937",
            hvac: "#111827",
            insulation: "#d1d5db",
            drywall: "#e2e8f0",
            flooring: "#9ca3af",
            painting: "#d4d4d8",
            cabinetry: "#a1a1aa",
            fixtures: "#e7e5e4",
        },
        aliases: AliasColors {
            primary: "#475569",
            secondary: "#94a3b8",
            accent: "#0ea5e9",
            muted: "#f1f5f9",
            border: "#e2e8f0",
        },
    },
];

/// All themes in catalog order.
#[must_use]
pub fn list_themes() -> &'static [ColorTheme] {
    &THEMES
}

/// Look up a theme by name, ignoring case.
///
/// # Errors
///
/// Returns `ThemeNotFound` (with close names when there are any).
pub fn get_theme(name: &str) -> Result<&'static ColorTheme> {
    let wanted = name.trim();
    if let Some(theme) = THEMES.iter().find(|t| t.name.eq_ignore_ascii_case(wanted)) {
        return Ok(theme);
    }

    let names: Vec<&str> = THEMES.iter().map(|t| t.name).collect();
    let similar = find_similar(wanted, &names, 3);
    if similar.is_empty() {
        Err(Error::ThemeNotFound {
            name: name.to_string(),
        })
    } else {
        Err(Error::ThemeNotFoundSimilar {
            name: name.to_string(),
            similar,
        })
    }
}

// ── Color planning ───────────────────────────────────────────

/// The color picked for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorChoice {
    pub color: &'static str,
    /// True when the color came from a name-matched slot
    pub matched: bool,
}

/// Sort key for handing out positional colors: tier1 first, then sort
/// order, then name.
#[must_use]
pub fn palette_order(tier: CategoryTier, sort_order: i32, name: &str) -> (CategoryTier, i32, &str) {
    (tier, sort_order, name)
}

/// Pick theme colors for `(tier, name)` pairs.
///
/// Pairs must already be in display order; positional colors are handed
/// out in that order, separately per tier. Returns `None` for a pair only
/// if its tier palette is empty.
pub fn choose_colors<'a, I>(theme: &ColorTheme, items: I) -> Vec<Option<ColorChoice>>
where
    I: IntoIterator<Item = (CategoryTier, &'a str)>,
{
    let mut next_tier1 = 0usize;
    let mut next_tier2 = 0usize;

    items
        .into_iter()
        .map(|(tier, name)| {
            if let Some(color) = theme.slot_color(tier, name) {
                return Some(ColorChoice {
                    color,
                    matched: true,
                });
            }
            let palette = theme.palette(tier);
            if palette.is_empty() {
                return None;
            }
            let cursor = match tier {
                CategoryTier::Tier1 => &mut next_tier1,
                CategoryTier::Tier2 => &mut next_tier2,
            };
            let color = palette[*cursor % palette.len()];
            *cursor += 1;
            Some(ColorChoice {
                color,
                matched: false,
            })
        })
        .collect()
}

/// One row of a theme plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedColor {
    pub category_id: String,
    pub name: String,
    pub tier: CategoryTier,
    pub old_color: Option<String>,
    pub new_color: &'static str,
    pub matched: bool,
}

impl PlannedColor {
    /// True when applying this entry would change the stored color.
    #[must_use]
    pub fn changes(&self) -> bool {
        self.old_color.as_deref() != Some(self.new_color)
    }
}

/// The colors a theme would give a project's rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePlan {
    pub theme: &'static str,
    pub entries: Vec<PlannedColor>,
}

impl ThemePlan {
    /// Rows colored by a name-matched slot.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.matched).count()
    }

    /// Rows colored positionally.
    #[must_use]
    pub fn positional_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.matched).count()
    }
}

/// Plan theme colors for a project's rows without writing anything.
///
/// Rows are considered in [`palette_order`].
#[must_use]
pub fn plan_theme(rows: &[ProjectCategory], theme: &'static ColorTheme) -> ThemePlan {
    let mut ordered: Vec<&ProjectCategory> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        palette_order(a.tier, a.sort_order, &a.name).cmp(&palette_order(b.tier, b.sort_order, &b.name))
    });

    let choices = choose_colors(theme, ordered.iter().map(|r| (r.tier, r.name.as_str())));

    let entries = ordered
        .into_iter()
        .zip(choices)
        .filter_map(|(row, choice)| {
            choice.map(|c| PlannedColor {
                category_id: row.id.clone(),
                name: row.name.clone(),
                tier: row.tier,
                old_color: row.color.clone(),
                new_color: c.color,
                matched: c.matched,
            })
        })
        .collect();

    ThemePlan {
        theme: theme.name,
        entries,
    }
}

/// Result of applying a theme to a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeApplyOutcome {
    pub theme: &'static str,
    /// Rows whose name matched a theme slot
    pub categories_updated: usize,
    /// Rows colored by position instead
    pub positional_updates: usize,
    /// Rows whose stored color actually changed
    pub rows_written: usize,
}

/// Recolor every category of a project from a theme.
///
/// Rows are written one at a time. A failure stops the loop; rows already
/// written keep their new color.
///
/// # Errors
///
/// Returns `ThemeNotFound` for an unknown theme, or the first storage error.
pub fn apply_theme(
    storage: &mut SqliteStorage,
    project_id: &str,
    theme_name: &str,
    actor: &str,
) -> Result<ThemeApplyOutcome> {
    let theme = get_theme(theme_name)?;
    let rows = storage.list_categories(project_id)?;
    let plan = plan_theme(&rows, theme);

    let mut rows_written = 0;
    for entry in plan.entries.iter().filter(|e| e.changes()) {
        storage.set_category_color(&entry.category_id, entry.new_color, actor)?;
        debug!(category = %entry.name, color = entry.new_color, matched = entry.matched, "Recolored");
        rows_written += 1;
    }

    let outcome = ThemeApplyOutcome {
        theme: theme.name,
        categories_updated: plan.matched_count(),
        positional_updates: plan.positional_count(),
        rows_written,
    };
    info!(
        project = project_id,
        theme = theme.name,
        matched = outcome.categories_updated,
        positional = outcome.positional_updates,
        "Applied theme"
    );
    Ok(outcome)
}

// ── Preferences ──────────────────────────────────────────────

/// Stored theme preference of a project, or the default one.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn theme_preference(
    storage: &SqliteStorage,
    project_id: &str,
    default_theme: &str,
) -> Result<ProjectThemeSetting> {
    Ok(storage
        .get_theme_setting(project_id)?
        .unwrap_or_else(|| ProjectThemeSetting::default_for(project_id, default_theme)))
}

/// Store a project's theme preference. Colors are left untouched.
///
/// # Errors
///
/// Returns `ThemeNotFound` for an unknown theme.
pub fn set_theme_preference(
    storage: &mut SqliteStorage,
    project_id: &str,
    color_theme: &str,
    use_global_theme: bool,
    actor: &str,
) -> Result<ProjectThemeSetting> {
    let theme = get_theme(color_theme)?;
    let setting = ProjectThemeSetting {
        project_id: project_id.to_string(),
        color_theme: theme.name.to_string(),
        use_global_theme,
        updated_at: chrono::Utc::now().timestamp_millis(),
    };

    storage.mutate("set_theme_preference", actor, |tx, ctx| {
        let old = crate::storage::sqlite::select_theme_setting(tx, project_id)?
            .map(|s| s.color_theme);
        upsert_theme_setting(tx, &setting)?;
        ctx.record_change(
            "project",
            project_id,
            EventType::ThemePreferenceSet,
            old,
            Some(setting.color_theme.clone()),
        );
        Ok(())
    })?;

    Ok(setting)
}

/// The theme that should color a project, given the global theme name.
///
/// # Errors
///
/// Returns `ThemeNotFound` if the chosen name is not in the catalog.
pub fn effective_theme(
    setting: &ProjectThemeSetting,
    global_theme: &str,
) -> Result<&'static ColorTheme> {
    get_theme(setting.effective_theme(global_theme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::theme::{TIER1_SLOTS, TIER2_SLOTS};
    use crate::model::NewCategory;
    use crate::validate::normalize_color;

    fn add(storage: &mut SqliteStorage, name: &str, tier: CategoryTier, parent: Option<&str>, sort: i32) -> ProjectCategory {
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
    fn test_catalog_is_well_formed() {
        assert_eq!(list_themes().len(), 5);
        for theme in list_themes() {
            for color in theme.tier1.colors().iter().chain(theme.tier2.colors().iter()) {
                assert_eq!(normalize_color(color).unwrap(), *color, "{}", theme.name);
            }
            assert_eq!(theme.slots(CategoryTier::Tier1).len(), TIER1_SLOTS.len());
            assert_eq!(theme.slots(CategoryTier::Tier2).len(), TIER2_SLOTS.len());
        }
    }

    #[test]
    fn test_get_theme_suggests_close_names() {
        assert_eq!(get_theme("Ocean").unwrap().name, "ocean");
        match get_theme("erth") {
            Err(Error::ThemeNotFoundSimilar { similar, .. }) => {
                assert_eq!(similar.first().map(String::as_str), Some("earth"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(get_theme("zzzzzzzzzz"), Err(Error::ThemeNotFound { .. })));
    }

    #[test]
    fn test_choose_colors_positional_cycles_per_tier() {
        let theme = get_theme("default").unwrap();
        let names: Vec<String> = (0..7).map(|i| format!("Custom {i}")).collect();
        let choices = choose_colors(theme, names.iter().map(|n| (CategoryTier::Tier1, n.as_str())));

        let palette = theme.palette(CategoryTier::Tier1);
        for (i, choice) in choices.iter().enumerate() {
            let choice = choice.unwrap();
            assert!(!choice.matched);
            assert_eq!(choice.color, palette[i % palette.len()]);
        }
    }

    #[test]
    fn test_near_miss_names_stay_positional() {
        let theme = get_theme("default").unwrap();
        let rows: Vec<ProjectCategory> = ["SiteWork", "Planning (計画)", "Structurål"]
            .into_iter()
            .map(|name| ProjectCategory::new("p1".into(), name.into(), CategoryTier::Tier1, None))
            .collect();

        let plan = plan_theme(&rows, theme);
        assert_eq!(plan.entries.len(), 3);
        assert_eq!(plan.matched_count(), 0);
        assert_eq!(plan.positional_count(), 3);
    }

    #[test]
    fn test_apply_theme_matches_slots_by_name() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        add(&mut storage, "structural", CategoryTier::Tier1, None, 0);
        add(&mut storage, "SITE WORK", CategoryTier::Tier1, None, 1);
        add(&mut storage, "Wine Cellar", CategoryTier::Tier1, None, 2);
        add(&mut storage, "Plumbing", CategoryTier::Tier2, Some("structural"), 0);

        let outcome = apply_theme(&mut storage, "p1", "earth", "test").unwrap();
        assert_eq!(outcome.categories_updated, 3);
        assert_eq!(outcome.positional_updates, 1);

        let earth = get_theme("earth").unwrap();
        let rows = storage.list_categories("p1").unwrap();
        let color_of = |name: &str| {
            rows.iter()
                .find(|r| r.name == name)
                .and_then(|r| r.color.clone())
                .unwrap()
        };
        assert_eq!(color_of("structural"), earth.tier1.structural);
        assert_eq!(color_of("SITE WORK"), earth.tier1.site_work);
        assert_eq!(color_of("Plumbing"), earth.tier2.plumbing);
        // Unmatched rows still get a color
        assert_eq!(color_of("Wine Cellar"), earth.tier1.planning);
    }

    #[test]
    fn test_reapplying_writes_nothing() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        add(&mut storage, "Systems", CategoryTier::Tier1, None, 0);

        let first = apply_theme(&mut storage, "p1", "ocean", "test").unwrap();
        assert_eq!(first.rows_written, 1);
        let second = apply_theme(&mut storage, "p1", "ocean", "test").unwrap();
        assert_eq!(second.rows_written, 0);
        assert_eq!(second.categories_updated, 1);
    }

    #[test]
    fn test_unknown_theme_writes_nothing() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        add(&mut storage, "Systems", CategoryTier::Tier1, None, 0);
        assert!(apply_theme(&mut storage, "p1", "neon", "test").is_err());
        assert!(storage.list_categories("p1").unwrap()[0].color.is_none());
    }

    #[test]
    fn test_preference_does_not_recolor() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        add(&mut storage, "Systems", CategoryTier::Tier1, None, 0);

        let setting = set_theme_preference(&mut storage, "p1", "Sunset", false, "test").unwrap();
        assert_eq!(setting.color_theme, "sunset");
        assert!(storage.list_categories("p1").unwrap()[0].color.is_none());

        let stored = theme_preference(&storage, "p1", DEFAULT_THEME).unwrap();
        assert_eq!(stored.color_theme, "sunset");
        assert_eq!(effective_theme(&stored, "slate").unwrap().name, "sunset");

        let fresh = theme_preference(&storage, "p2", DEFAULT_THEME).unwrap();
        assert!(fresh.use_global_theme);
        assert_eq!(effective_theme(&fresh, "slate").unwrap().name, "slate");

        assert!(set_theme_preference(&mut storage, "p1", "neon", true, "test").is_err());
    }
}
