//! Color theme models.
//!
//! A theme is a closed record: five named tier1 slots, twenty named tier2
//! slots and five alias colors. The slot set is fixed, so it is modelled as
//! struct fields rather than a map.

use serde::{Deserialize, Serialize};

use super::CategoryTier;

/// Display names of the tier1 slots, in palette order.
pub const TIER1_SLOTS: [&str; 5] = ["Planning", "Site Work", "Structural", "Systems", "Finishes"];

/// Display names of the tier2 slots, in palette order.
pub const TIER2_SLOTS: [&str; 20] = [
    "Design",
    "Permits",
    "Budgeting",
    "Excavation",
    "Grading",
    "Utilities",
    "Landscaping",
    "Foundation",
    "Framing",
    "Roofing",
    "Masonry",
    "Electrical",
    "Plumbing",
    "HVAC",
    "Insulation",
    "Drywall",
    "Flooring",
    "Painting",
    "Cabinetry",
    "Fixtures",
];

/// Tier1 slot colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier1Palette {
    pub planning: &'static str,
    pub site_work: &'static str,
    pub structural: &'static str,
    pub systems: &'static str,
    pub finishes: &'static str,
}

impl Tier1Palette {
    /// Colors in slot order (matches [`TIER1_SLOTS`]).
    #[must_use]
    pub const fn colors(&self) -> [&'static str; 5] {
        [
            self.planning,
            self.site_work,
            self.structural,
            self.systems,
            self.finishes,
        ]
    }
}

/// Tier2 slot colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier2Palette {
    pub design: &'static str,
    pub permits: &'static str,
    pub budgeting: &'static str,
    pub excavation: &'static str,
    pub grading: &'static str,
    pub utilities: &'static str,
    pub landscaping: &'static str,
    pub foundation: &'static str,
    pub framing: &'static str,
    pub roofing: &'static str,
    pub masonry: &'static str,
    pub electrical: &'static str,
    pub plumbing: &'static str,
    pub hvac: &'static str,
    pub insulation: &'static str,
    pub drywall: &'static str,
    pub flooring: &'static str,
    pub painting: &'static str,
    pub cabinetry: &'static str,
    pub fixtures: &'static str,
}

impl Tier2Palette {
    /// Colors in slot order (matches [`TIER2_SLOTS`]).
    #[must_use]
    pub const fn colors(&self) -> [&'static str; 20] {
        [
            self.design,
            self.permits,
            self.budgeting,
            self.excavation,
            self.grading,
            self.utilities,
            self.landscaping,
            self.foundation,
            self.framing,
            self.roofing,
            self.masonry,
            self.electrical,
            self.plumbing,
            self.hvac,
            self.insulation,
            self.drywall,
            self.flooring,
            self.painting,
            self.cabinetry,
            self.fixtures,
        ]
    }
}

/// Non-category colors a theme supplies to the surrounding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AliasColors {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub muted: &'static str,
    pub border: &'static str,
}

/// A named color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorTheme {
    pub name: &'static str,
    pub description: &'static str,
    pub tier1: Tier1Palette,
    pub tier2: Tier2Palette,
    pub aliases: AliasColors,
}

impl ColorTheme {
    /// Slot `(label, color)` pairs for a tier, in palette order.
    #[must_use]
    pub fn slots(&self, tier: CategoryTier) -> Vec<(&'static str, &'static str)> {
        match tier {
            CategoryTier::Tier1 => TIER1_SLOTS
                .iter()
                .copied()
                .zip(self.tier1.colors())
                .collect(),
            CategoryTier::Tier2 => TIER2_SLOTS
                .iter()
                .copied()
                .zip(self.tier2.colors())
                .collect(),
        }
    }

    /// Palette colors for a tier, used for positional assignment.
    #[must_use]
    pub fn palette(&self, tier: CategoryTier) -> Vec<&'static str> {
        match tier {
            CategoryTier::Tier1 => self.tier1.colors().to_vec(),
            CategoryTier::Tier2 => self.tier2.colors().to_vec(),
        }
    }

    /// Color of the slot whose label matches `name`.
    ///
    /// Matching ignores case and surrounding whitespace, so " site work" and
    /// "SITE WORK" hit the Site Work slot while "SiteWork" does not.
    #[must_use]
    pub fn slot_color(&self, tier: CategoryTier, name: &str) -> Option<&'static str> {
        let key = slot_key(name);
        if key.is_empty() {
            return None;
        }
        self.slots(tier)
            .into_iter()
            .find(|(label, _)| slot_key(label) == key)
            .map(|(_, color)| color)
    }
}

/// Normalize a category or slot name for matching.
#[must_use]
pub fn slot_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Stored theme preference for a project.
///
/// Records intent only. Changing it never recolors categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectThemeSetting {
    pub project_id: String,

    /// Name of the project's chosen theme
    pub color_theme: String,

    /// Follow the globally configured theme instead of `color_theme`
    pub use_global_theme: bool,

    /// Last update timestamp (Unix milliseconds); 0 when never stored
    pub updated_at: i64,
}

impl ProjectThemeSetting {
    /// The setting a project has before anyone stores one.
    #[must_use]
    pub fn default_for(project_id: &str, default_theme: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            color_theme: default_theme.to_string(),
            use_global_theme: true,
            updated_at: 0,
        }
    }

    /// Name of the theme that should color this project.
    #[must_use]
    pub fn effective_theme<'a>(&'a self, global_theme: &'a str) -> &'a str {
        if self.use_global_theme {
            global_theme
        } else {
            &self.color_theme
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::themes::THEMES;

    #[test]
    fn test_slot_key_ignores_case_only() {
        assert_eq!(slot_key("  Site Work "), "site work");
        assert_eq!(slot_key("STRUCTURÅL"), "structurål");
        assert_ne!(slot_key("site-work"), slot_key("Site Work"));

        let theme = &THEMES[0];
        assert!(theme.slot_color(CategoryTier::Tier1, " SITE WORK ").is_some());
        assert!(theme.slot_color(CategoryTier::Tier1, "SiteWork").is_none());
        assert!(theme.slot_color(CategoryTier::Tier1, "Structurål").is_none());
    }

    #[test]
    fn test_effective_theme_respects_global_flag() {
        let mut setting = ProjectThemeSetting::default_for("proj_1", "default");
        setting.color_theme = "earth".into();
        assert_eq!(setting.effective_theme("ocean"), "ocean");

        setting.use_global_theme = false;
        assert_eq!(setting.effective_theme("ocean"), "earth");
    }
}
