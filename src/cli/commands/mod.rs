//! Command implementations.

pub mod assign;
pub mod category;
pub mod completions;
pub mod init;
pub mod preset;
pub mod reference;
pub mod resolve;
pub mod template;
pub mod theme;
pub mod version;

use std::path::PathBuf;

use colored::Colorize;
use tracing::warn;

use crate::config::{default_actor, load_settings, resolve_db_path, Settings};
use crate::error::{Error, Result};
use crate::model::CategoryTier;
use crate::storage::SqliteStorage;
use crate::taxonomy::themes::{effective_theme, get_theme, theme_preference, THEMES};
use crate::taxonomy::{ResolvedTree, Resolver};
use crate::validate::parse_tier;

/// Open the database, failing if `tiercat init` has not been run.
pub(crate) fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteStorage::open(&db_path)
}

pub(crate) fn actor_name(actor: Option<&str>) -> String {
    actor.map(ToString::to_string).unwrap_or_else(default_actor)
}

pub(crate) fn parse_tier_filter(tier: Option<&str>) -> Result<Option<CategoryTier>> {
    tier.map(parse_tier).transpose()
}

/// Resolve a project's tree, colored with the theme the project follows.
pub(crate) fn resolve_project(
    storage: &SqliteStorage,
    project_id: &str,
) -> Result<(ResolvedTree, Settings)> {
    let settings = load_settings()?;
    let tree = resolve_with_settings(storage, project_id, &settings);
    Ok((tree, settings))
}

/// Resolve with explicit settings.
///
/// A theme preference that cannot be read or names an unknown theme is
/// logged and replaced by the default theme.
pub(crate) fn resolve_with_settings(
    storage: &SqliteStorage,
    project_id: &str,
    settings: &Settings,
) -> ResolvedTree {
    let theme = theme_preference(storage, project_id, &settings.default_theme)
        .and_then(|setting| effective_theme(&setting, &settings.default_theme))
        .unwrap_or_else(|e| {
            warn!(project = project_id, error = %e, "Theme preference unusable, using default theme");
            get_theme(&settings.default_theme).unwrap_or(&THEMES[0])
        });
    let options = settings.resolve_options(theme);
    Resolver::new(storage, &options).resolve(project_id)
}

/// A colored block for a `#rrggbb` color, or a dim placeholder.
pub(crate) fn swatch(color: Option<&str>) -> String {
    match color.and_then(hex_rgb) {
        Some((r, g, b)) => "██".truecolor(r, g, b).to_string(),
        None => "··".dimmed().to_string(),
    }
}

fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
