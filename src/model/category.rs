//! Category models: global templates and project-owned category rows.
//!
//! Both share the same two-tier shape. A tier1 row has no parent; a tier2
//! row points at a tier1 row of the same scope (the template registry for
//! templates, the project for project categories).

use serde::{Deserialize, Serialize};

/// Category tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTier {
    /// Main category.
    Tier1,
    /// Subcategory nested under exactly one tier1 category.
    Tier2,
}

impl CategoryTier {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tier1 => "tier1",
            Self::Tier2 => "tier2",
        }
    }

    /// Parse the stored representation. Unknown values read as tier1.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        match s {
            "tier2" => Self::Tier2,
            _ => Self::Tier1,
        }
    }
}

impl std::fmt::Display for CategoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A global, project-independent category template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTemplate {
    /// Unique identifier (`tpl_` prefix)
    pub id: String,

    /// Display name
    pub name: String,

    /// Tier of the template
    pub tier: CategoryTier,

    /// Parent tier1 template (tier2 only)
    pub parent_id: Option<String>,

    /// Hex color (`#rrggbb`)
    pub color: Option<String>,

    pub description: Option<String>,

    pub sort_order: i32,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl CategoryTemplate {
    /// Create a new template with a fresh ID.
    pub fn new(name: String, tier: CategoryTier, parent_id: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: format!("tpl_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            name,
            tier,
            parent_id,
            color: None,
            description: None,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A category row owned by a project.
///
/// `template_id` records which template the row was loaded from. It is
/// provenance only: editing the template does not touch the row and
/// editing the row does not touch the template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCategory {
    /// Unique identifier (`cat_` prefix)
    pub id: String,

    /// Owning project
    pub project_id: String,

    pub name: String,

    pub tier: CategoryTier,

    /// Parent tier1 row in the same project (tier2 only)
    pub parent_id: Option<String>,

    pub color: Option<String>,

    pub description: Option<String>,

    pub sort_order: i32,

    /// Template this row was loaded from, if any
    pub template_id: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl ProjectCategory {
    /// Create a new project category with a fresh ID.
    pub fn new(
        project_id: String,
        name: String,
        tier: CategoryTier,
        parent_id: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: format!("cat_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            project_id,
            name,
            tier,
            parent_id,
            color: None,
            description: None,
            sort_order: 0,
            template_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy a template's presentation fields into a new project row.
    ///
    /// The parent is left to the caller: template parent ids point into the
    /// registry, not into the project.
    pub fn from_template(project_id: &str, template: &CategoryTemplate) -> Self {
        let mut row = Self::new(
            project_id.to_string(),
            template.name.clone(),
            template.tier,
            None,
        );
        row.color.clone_from(&template.color);
        row.description.clone_from(&template.description);
        row.sort_order = template.sort_order;
        row.template_id = Some(template.id.clone());
        row
    }
}

/// Input for a manually created project category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub project_id: String,
    pub name: String,
    pub tier: CategoryTier,
    /// Parent tier1 row, by id or by name (tier2 only)
    pub parent: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

/// Partial update for a project category.
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

impl CategoryUpdate {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.description.is_none()
            && self.sort_order.is_none()
    }
}
