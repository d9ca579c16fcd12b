//! Built-in fallback categories.
//!
//! Used by the resolver when neither the project nor the template registry
//! yields a tier1 category, and as the seed set for an empty registry.
//! Names line up with the theme slots so fallback rows pick up slot colors.

use crate::model::theme::slot_key;
use crate::model::CategoryTier;

/// One built-in category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackCategory {
    pub name: &'static str,
    pub tier: CategoryTier,
    /// Name of the tier1 parent (tier2 only)
    pub parent: Option<&'static str>,
    pub description: &'static str,
    pub sort_order: i32,
}

const fn tier1(name: &'static str, description: &'static str, sort_order: i32) -> FallbackCategory {
    FallbackCategory {
        name,
        tier: CategoryTier::Tier1,
        parent: None,
        description,
        sort_order,
    }
}

const fn tier2(
    name: &'static str,
    parent: &'static str,
    description: &'static str,
    sort_order: i32,
) -> FallbackCategory {
    FallbackCategory {
        name,
        tier: CategoryTier::Tier2,
        parent: Some(parent),
        description,
        sort_order,
    }
}

/// The fallback set: 5 tier1 and 8 tier2 categories.
pub const FALLBACK_CATEGORIES: [FallbackCategory; 13] = [
    tier1("Planning", "Design, permits and budgeting before work starts", 0),
    tier1("Site Work", "Clearing, excavation and utilities on the lot", 1),
    tier1("Structural", "Foundation, framing and the load-bearing shell", 2),
    tier1("Systems", "Electrical, plumbing and HVAC rough-in", 3),
    tier1("Finishes", "Interior surfaces, trim and fixtures", 4),
    tier2("Permits", "Planning", "Permit applications and inspections", 0),
    tier2("Excavation", "Site Work", "Digging, grading and soil removal", 0),
    tier2("Foundation", "Structural", "Footings, slabs and foundation walls", 0),
    tier2("Framing", "Structural", "Wall, floor and roof framing", 1),
    tier2("Electrical", "Systems", "Wiring, panels and lighting circuits", 0),
    tier2("Plumbing", "Systems", "Supply, drain and vent piping", 1),
    tier2("Drywall", "Finishes", "Hanging, taping and finishing wallboard", 0),
    tier2("Painting", "Finishes", "Primer, paint and stain", 1),
];

/// Descriptions for well-known names outside the fallback set.
const EXTRA_DESCRIPTIONS: [(&str, &str); 12] = [
    ("Design", "Architectural and engineering drawings"),
    ("Budgeting", "Estimates, bids and cost tracking"),
    ("Grading", "Shaping and compacting the site"),
    ("Utilities", "Water, sewer, gas and power connections"),
    ("Landscaping", "Planting, hardscape and final grading"),
    ("Roofing", "Underlayment, shingles and flashing"),
    ("Masonry", "Brick, block and stone work"),
    ("HVAC", "Heating, ventilation and air conditioning"),
    ("Insulation", "Thermal and acoustic insulation"),
    ("Flooring", "Subfloor prep and finished floors"),
    ("Cabinetry", "Cabinets, vanities and built-ins"),
    ("Fixtures", "Lighting, plumbing and hardware fixtures"),
];

/// Iterate the fallback tier1 entries in declaration order.
pub fn tier1_categories() -> impl Iterator<Item = &'static FallbackCategory> {
    FALLBACK_CATEGORIES
        .iter()
        .filter(|c| c.tier == CategoryTier::Tier1)
}

/// Built-in description for a category name, ignoring case.
#[must_use]
pub fn description_for(name: &str) -> Option<&'static str> {
    let key = slot_key(name);
    if key.is_empty() {
        return None;
    }
    FALLBACK_CATEGORIES
        .iter()
        .map(|c| (c.name, c.description))
        .chain(EXTRA_DESCRIPTIONS)
        .find(|(n, _)| slot_key(n) == key)
        .map(|(_, d)| d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        assert_eq!(tier1_categories().count(), 5);
        let tier2: Vec<_> = FALLBACK_CATEGORIES
            .iter()
            .filter(|c| c.tier == CategoryTier::Tier2)
            .collect();
        assert_eq!(tier2.len(), 8);

        // Every tier2 points at a declared tier1
        for child in tier2 {
            let parent = child.parent.unwrap();
            assert!(tier1_categories().any(|p| p.name == parent), "{parent}");
        }
    }

    #[test]
    fn test_description_lookup_ignores_case() {
        assert_eq!(
            description_for(" SITE WORK "),
            Some("Clearing, excavation and utilities on the lot")
        );
        assert!(description_for("hvac").is_some());
        assert_eq!(description_for("site-work"), None);
        assert_eq!(description_for("Wine Cellar"), None);
        assert_eq!(description_for("  "), None);
    }
}
