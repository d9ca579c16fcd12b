//! Error types for tiercat.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 3=not_found, 4=validation, 5=partial batch, etc.)
//! - Retryability flags for callers that correct input and try again
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tiercat operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Programs match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Storage (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    TemplateNotFound,
    CategoryNotFound,
    ThemeNotFound,
    PresetNotFound,
    AssignmentNotFound,

    // Validation (exit 4)
    DuplicateName,
    DuplicateAssignment,
    UnresolvedParent,
    InvalidColor,
    InvalidTier,
    InvalidArgument,

    // Batch (exit 5)
    PartialBatchFailure,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::TemplateNotFound => "TEMPLATE_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::ThemeNotFound => "THEME_NOT_FOUND",
            Self::PresetNotFound => "PRESET_NOT_FOUND",
            Self::AssignmentNotFound => "ASSIGNMENT_NOT_FOUND",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::DuplicateAssignment => "DUPLICATE_ASSIGNMENT",
            Self::UnresolvedParent => "UNRESOLVED_PARENT",
            Self::InvalidColor => "INVALID_COLOR",
            Self::InvalidTier => "INVALID_TIER",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::PartialBatchFailure => "PARTIAL_BATCH_FAILURE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::TemplateNotFound
            | Self::CategoryNotFound
            | Self::ThemeNotFound
            | Self::PresetNotFound
            | Self::AssignmentNotFound => 3,
            Self::DuplicateName
            | Self::DuplicateAssignment
            | Self::UnresolvedParent
            | Self::InvalidColor
            | Self::InvalidTier
            | Self::InvalidArgument => 4,
            Self::PartialBatchFailure => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry with corrected input.
    ///
    /// True for validation errors and for busy databases. False for
    /// not-found, I/O, or internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName
                | Self::DuplicateAssignment
                | Self::UnresolvedParent
                | Self::InvalidColor
                | Self::InvalidTier
                | Self::InvalidArgument
                | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in tiercat operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `tiercat init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("Category not found: {id}")]
    CategoryNotFound { id: String },

    #[error("Theme not found: {name}")]
    ThemeNotFound { name: String },

    #[error("Theme not found: {name} (did you mean: {}?)", similar.join(", "))]
    ThemeNotFoundSimilar { name: String, similar: Vec<String> },

    #[error("Preset not found: {id}")]
    PresetNotFound { id: String },

    #[error("Preset not found: {id} (did you mean: {}?)", similar.join(", "))]
    PresetNotFoundSimilar { id: String, similar: Vec<String> },

    #[error("Assignment not found: {id}")]
    AssignmentNotFound { id: String },

    #[error("A {tier} category named '{name}' already exists in {scope}")]
    DuplicateCategory {
        scope: String,
        tier: String,
        name: String,
    },

    #[error("Task {task_id} is already assigned to {label}")]
    DuplicateAssignment { task_id: String, label: String },

    #[error("Unresolved parent for '{name}': {reason}")]
    UnresolvedParent { name: String, reason: String },

    #[error("Invalid color: {value}")]
    InvalidColor { value: String },

    #[error("Invalid tier: {value}")]
    InvalidTier {
        value: String,
        suggestion: Option<String>,
    },

    #[error("{failed} of {total} batch items failed")]
    PartialBatchFailure { failed: usize, total: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::TemplateNotFound { .. } => ErrorCode::TemplateNotFound,
            Self::CategoryNotFound { .. } => ErrorCode::CategoryNotFound,
            Self::ThemeNotFound { .. } | Self::ThemeNotFoundSimilar { .. } => {
                ErrorCode::ThemeNotFound
            }
            Self::PresetNotFound { .. } | Self::PresetNotFoundSimilar { .. } => {
                ErrorCode::PresetNotFound
            }
            Self::AssignmentNotFound { .. } => ErrorCode::AssignmentNotFound,
            Self::DuplicateCategory { .. } => ErrorCode::DuplicateName,
            Self::DuplicateAssignment { .. } => ErrorCode::DuplicateAssignment,
            Self::UnresolvedParent { .. } => ErrorCode::UnresolvedParent,
            Self::InvalidColor { .. } => ErrorCode::InvalidColor,
            Self::InvalidTier { .. } => ErrorCode::InvalidTier,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::PartialBatchFailure { .. } => ErrorCode::PartialBatchFailure,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `tiercat init` to initialize the database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::TemplateNotFound { id } => Some(format!(
                "No template with ID '{id}'. Use `tiercat template list` to see available templates."
            )),

            Self::CategoryNotFound { id } => Some(format!(
                "No category with ID '{id}'. Use `tiercat category list --project <id>` to see categories."
            )),

            Self::ThemeNotFound { .. } => {
                Some("Use `tiercat theme list` to see available themes.".to_string())
            }
            Self::ThemeNotFoundSimilar { similar, .. }
            | Self::PresetNotFoundSimilar { similar, .. } => {
                Some(format!("Did you mean: {}?", similar.join(", ")))
            }

            Self::PresetNotFound { .. } => {
                Some("Use `tiercat preset list` to see available presets.".to_string())
            }

            Self::AssignmentNotFound { .. } => Some(
                "Use `tiercat assign list <task-id>` to see a task's assignments.".to_string(),
            ),

            Self::DuplicateCategory { .. } => Some(
                "Category names are unique per project and tier. Rename or recolor the existing one instead."
                    .to_string(),
            ),

            Self::UnresolvedParent { .. } => Some(
                "Load or create the parent tier1 category first, or include it in the same batch."
                    .to_string(),
            ),

            Self::InvalidColor { .. } => {
                Some("Colors use hex notation: #RRGGBB or #RGB (e.g. #3b82f6)".to_string())
            }

            Self::InvalidTier { suggestion, .. } => Some(match suggestion {
                Some(s) => format!("Did you mean '{s}'? Valid tiers: tier1, tier2"),
                None => "Valid tiers: tier1 (main category), tier2 (subcategory)".to_string(),
            }),

            Self::PartialBatchFailure { .. } => Some(
                "Successful items were kept. Fix the failed items and rerun them alone."
                    .to_string(),
            ),

            Self::DuplicateAssignment { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(
            Error::ThemeNotFound { name: "neon".into() }.exit_code(),
            3
        );
        assert_eq!(
            Error::InvalidColor { value: "red".into() }.exit_code(),
            4
        );
        assert_eq!(
            Error::PartialBatchFailure { failed: 1, total: 3 }.exit_code(),
            5
        );
        assert_eq!(Error::Config("bad".into()).exit_code(), 7);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::ThemeNotFoundSimilar {
            name: "erth".into(),
            similar: vec!["earth".into()],
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "THEME_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert_eq!(json["error"]["retryable"], false);
        assert!(json["error"]["hint"].as_str().unwrap().contains("earth"));
    }

    #[test]
    fn test_validation_errors_are_retryable() {
        let err = Error::UnresolvedParent {
            name: "Foundation".into(),
            reason: "parent not loaded".into(),
        };
        assert!(err.error_code().is_retryable());
        assert!(!Error::CategoryNotFound { id: "cat_x".into() }
            .error_code()
            .is_retryable());
    }
}
