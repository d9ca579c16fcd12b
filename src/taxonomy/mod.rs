//! The category taxonomy and theming engine.
//!
//! - [`resolver`] - merges project rows, templates and fallbacks into one tree
//! - [`fallback`] - the fixed category set used when storage has nothing
//! - [`registry`] - global templates and loading them into projects
//! - [`presets`] - built-in tier1/tier2 trees applied in one operation
//! - [`themes`] - theme catalog, color planning and application
//! - [`assignments`] - task/category junction with a single primary
//! - [`guard`] - rendering of name-string references that may be stale
//!
//! Everything here reads through [`CategorySource`] or writes through
//! [`SqliteStorage`](crate::storage::SqliteStorage). Nothing is cached
//! between calls.

pub mod assignments;
pub mod fallback;
pub mod guard;
pub mod presets;
pub mod registry;
pub mod resolver;
pub mod themes;

use crate::error::Result;
use crate::model::{CategoryTemplate, ProjectCategory};
use crate::storage::SqliteStorage;

pub use resolver::{ResolveOptions, ResolvedCategory, ResolvedTree, Resolver};

/// Read access to stored categories, as needed by the resolver.
///
/// Implemented by [`SqliteStorage`]. The resolver treats any error from a
/// source as "no rows" and moves on to the next source.
pub trait CategorySource {
    /// All category rows of a project.
    fn project_categories(&self, project_id: &str) -> Result<Vec<ProjectCategory>>;

    /// All global templates.
    fn global_templates(&self) -> Result<Vec<CategoryTemplate>>;
}

impl CategorySource for SqliteStorage {
    fn project_categories(&self, project_id: &str) -> Result<Vec<ProjectCategory>> {
        self.list_categories(project_id)
    }

    fn global_templates(&self) -> Result<Vec<CategoryTemplate>> {
        self.list_templates(None)
    }
}
