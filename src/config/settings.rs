//! Presentation settings.
//!
//! Loaded from `~/.tiercat/config.json` (or the file named by
//! `TIERCAT_CONFIG`). A missing file means defaults; every field is
//! optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ColorTheme;
use crate::taxonomy::themes::{get_theme, DEFAULT_THEME};
use crate::taxonomy::ResolveOptions;
use crate::validate::normalize_color;

/// User-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Theme used by projects that follow the global theme
    pub default_theme: String,

    /// Color of references that match no category
    pub neutral_color: String,

    /// Description of categories with none stored or built in
    pub generic_description: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_theme: DEFAULT_THEME.to_string(),
            neutral_color: "#9ca3af".to_string(),
            generic_description: "Custom category".to_string(),
        }
    }
}

impl Settings {
    /// Check the theme name and colors, normalizing the neutral color.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an unknown theme or a malformed color.
    pub fn validated(mut self) -> Result<Self> {
        get_theme(&self.default_theme)
            .map_err(|e| Error::Config(format!("defaultTheme: {e}")))?;
        self.neutral_color = normalize_color(&self.neutral_color)
            .map_err(|e| Error::Config(format!("neutralColor: {e}")))?;
        Ok(self)
    }

    /// Resolver options coloring with `theme`.
    #[must_use]
    pub fn resolve_options(&self, theme: &'static ColorTheme) -> ResolveOptions {
        ResolveOptions {
            theme,
            neutral_color: self.neutral_color.clone(),
            generic_description: self.generic_description.clone(),
        }
    }
}

/// Path of the settings file.
///
/// # Errors
///
/// Returns `Config` if no home directory can be found.
pub fn settings_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TIERCAT_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    super::global_tiercat_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load settings from the default location.
///
/// # Errors
///
/// Returns `Config` if the file cannot be read, parsed or validated.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path()?)
}

/// Load settings from a specific file; a missing file yields defaults.
///
/// # Errors
///
/// Returns `Config` if the file cannot be read, parsed or validated.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let settings: Settings = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))?;

    settings.validated()
}
