//! Data models for tiercat.
//!
//! This module contains all domain models:
//! - CategoryTemplate / ProjectCategory
//! - ColorTheme / ProjectThemeSetting
//! - TaskCategoryAssignment
//! - CategoryReference (external records)
//! - BatchResult

pub mod assignment;
pub mod batch;
pub mod category;
pub mod reference;
pub mod theme;

pub use assignment::TaskCategoryAssignment;
pub use batch::{BatchFailure, BatchResult};
pub use category::{CategoryTemplate, CategoryTier, CategoryUpdate, NewCategory, ProjectCategory};
pub use reference::{CategoryReference, RecordKind};
pub use theme::{
    AliasColors, ColorTheme, ProjectThemeSetting, Tier1Palette, Tier2Palette, TIER1_SLOTS,
    TIER2_SLOTS,
};
