//! Task-category assignment model.
//!
//! A task can carry several category assignments. At most one of them is
//! primary; the primary drives default display and filtering.

use serde::{Deserialize, Serialize};

/// A task's link to a tier1 (and optionally tier2) category, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCategoryAssignment {
    /// Unique identifier (`asg_` prefix)
    pub id: String,

    /// External task identifier
    pub task_id: String,

    /// Tier1 category name (weak reference)
    pub tier1_category: String,

    /// Tier2 category name (weak reference)
    pub tier2_category: Option<String>,

    pub is_primary: bool,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl TaskCategoryAssignment {
    /// Create a new assignment with a fresh ID.
    pub fn new(
        task_id: String,
        tier1_category: String,
        tier2_category: Option<String>,
        is_primary: bool,
    ) -> Self {
        Self {
            id: format!("asg_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            task_id,
            tier1_category,
            tier2_category,
            is_primary,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Human-readable "Tier1 / Tier2" label.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.tier2_category {
            Some(tier2) => format!("{} / {}", self.tier1_category, tier2),
            None => self.tier1_category.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let a = TaskCategoryAssignment::new("task_1".into(), "Structural".into(), None, true);
        assert_eq!(a.label(), "Structural");

        let b = TaskCategoryAssignment::new(
            "task_1".into(),
            "Structural".into(),
            Some("Framing".into()),
            false,
        );
        assert_eq!(b.label(), "Structural / Framing");
        assert!(b.id.starts_with("asg_"));
    }
}
