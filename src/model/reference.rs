//! Category references held by external records.
//!
//! Tasks, materials and labor entries store their categories as plain name
//! strings. Nothing keeps these strings in step with category renames or
//! deletes; readers go through the consistency guard instead.

use serde::{Deserialize, Serialize};

/// Kind of record holding a category reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Task,
    Material,
    Labor,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Material => "material",
            Self::Labor => "labor",
        }
    }
}

/// The category fields of one external record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReference {
    pub kind: RecordKind,
    pub record_id: String,
    pub tier1_category: Option<String>,
    #[serde(default)]
    pub tier2_category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_camel_case_records() {
        let json = r#"[
            {"kind": "task", "recordId": "t1", "tier1Category": "Structural"},
            {"kind": "labor", "recordId": "l9", "tier1Category": "Systems", "tier2Category": "Plumbing"}
        ]"#;
        let refs: Vec<CategoryReference> = serde_json::from_str(json).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, RecordKind::Task);
        assert_eq!(refs[0].tier2_category, None);
        assert_eq!(refs[1].tier2_category.as_deref(), Some("Plumbing"));
    }
}
