//! Theme command implementations.

use super::{actor_name, open_storage, swatch};
use crate::cli::ThemeCommands;
use crate::config::load_settings;
use crate::error::Result;
use crate::model::{CategoryTier, ColorTheme};
use crate::taxonomy::themes::{
    apply_theme, get_theme, list_themes, plan_theme, set_theme_preference, theme_preference,
    ThemePlan,
};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ThemeSummary {
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreferenceOutput {
    project_id: String,
    color_theme: String,
    use_global_theme: bool,
    effective_theme: String,
}

/// Execute theme commands.
pub fn execute(
    command: &ThemeCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        ThemeCommands::List => list(json),
        ThemeCommands::Show { name } => show(name, json),
        ThemeCommands::Apply { project, name } => apply(project, name, db_path, actor, json),
        ThemeCommands::Set {
            project,
            theme,
            global,
        } => set(project, theme, *global, db_path, actor, json),
        ThemeCommands::Get { project } => get(project, db_path, json),
    }
}

fn list(json: bool) -> Result<()> {
    let themes = list_themes();

    if crate::is_silent() {
        for t in themes {
            println!("{}", t.name);
        }
        return Ok(());
    }

    if json {
        let summaries: Vec<ThemeSummary> = themes
            .iter()
            .map(|t| ThemeSummary {
                name: t.name,
                description: t.description,
            })
            .collect();
        println!("{}", serde_json::to_string(&summaries)?);
        return Ok(());
    }

    for t in themes {
        let strip: String = t.tier1.colors().into_iter().map(|c| swatch(Some(c))).collect();
        println!("{strip} {} {}", t.name.bold(), t.description.dimmed());
    }

    Ok(())
}

fn show(name: &str, json: bool) -> Result<()> {
    let theme = get_theme(name)?;

    if json {
        println!("{}", serde_json::to_string(theme)?);
        return Ok(());
    }

    println!("{} {}", theme.name.bold(), theme.description.dimmed());
    print_slots(theme, CategoryTier::Tier1, "Main categories");
    print_slots(theme, CategoryTier::Tier2, "Subcategories");

    println!();
    println!("Aliases:");
    let a = &theme.aliases;
    for (label, color) in [
        ("primary", a.primary),
        ("secondary", a.secondary),
        ("accent", a.accent),
        ("muted", a.muted),
        ("border", a.border),
    ] {
        println!("  {} {label:<12} {color}", swatch(Some(color)));
    }

    Ok(())
}

fn print_slots(theme: &ColorTheme, tier: CategoryTier, title: &str) {
    println!();
    println!("{title}:");
    for (label, color) in theme.slots(tier) {
        println!("  {} {label:<12} {color}", swatch(Some(color)));
    }
}

fn apply(
    project: &str,
    name: &str,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let theme = get_theme(name)?;

    if crate::is_dry_run() {
        let storage = open_storage(db_path)?;
        let rows = storage.list_categories(project)?;
        let plan = plan_theme(&rows, theme);
        return print_plan(project, &plan, json);
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let outcome = apply_theme(&mut storage, project, theme.name, &actor)?;

    if crate::is_silent() {
        println!("{}", outcome.categories_updated);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!(
            "Applied theme {} to {project}: {} matched by name, {} by position, {} rows changed",
            outcome.theme, outcome.categories_updated, outcome.positional_updates, outcome.rows_written
        );
    }

    Ok(())
}

fn print_plan(project: &str, plan: &ThemePlan, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "dry_run": true,
            "action": "apply_theme",
            "project": project,
            "plan": plan,
        });
        println!("{output}");
        return Ok(());
    }

    if plan.entries.is_empty() {
        println!("{project} has no stored categories; nothing to recolor.");
        return Ok(());
    }

    println!("Would apply theme {} to {project}:", plan.theme);
    for entry in &plan.entries {
        let how = if entry.matched { "name" } else { "position" };
        let marker = if entry.changes() { "" } else { " (unchanged)" };
        println!(
            "  {} -> {} {} {}{}",
            swatch(entry.old_color.as_deref()),
            swatch(Some(entry.new_color)),
            entry.name,
            format!("[{how}]").dimmed(),
            marker.dimmed()
        );
    }
    println!(
        "{} matched by name, {} by position",
        plan.matched_count(),
        plan.positional_count()
    );

    Ok(())
}

fn set(
    project: &str,
    theme: &str,
    use_global: bool,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if crate::is_dry_run() {
        let theme = get_theme(theme)?;
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "set_theme_preference",
                "project": project,
                "theme": theme.name,
                "use_global_theme": use_global,
            });
            println!("{output}");
        } else {
            println!("Would set theme preference of {project} to {}", theme.name);
        }
        return Ok(());
    }

    let settings = load_settings()?;
    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let setting = set_theme_preference(&mut storage, project, theme, use_global, &actor)?;

    if crate::is_silent() {
        println!("{}", setting.color_theme);
        return Ok(());
    }

    let effective = setting.effective_theme(&settings.default_theme).to_string();
    if json {
        let output = PreferenceOutput {
            project_id: setting.project_id,
            color_theme: setting.color_theme,
            use_global_theme: setting.use_global_theme,
            effective_theme: effective,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Theme preference of {project}: {}", setting.color_theme);
        if setting.use_global_theme {
            println!("  Following the global theme ({effective})");
        }
        println!(
            "{}",
            format!("Run 'tiercat theme apply --project {project} {effective}' to recolor.").dimmed()
        );
    }

    Ok(())
}

fn get(project: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = load_settings()?;
    let storage = open_storage(db_path)?;
    let setting = theme_preference(&storage, project, &settings.default_theme)?;
    let effective = setting.effective_theme(&settings.default_theme).to_string();

    if crate::is_silent() {
        println!("{effective}");
        return Ok(());
    }

    if json {
        let output = PreferenceOutput {
            project_id: setting.project_id,
            color_theme: setting.color_theme,
            use_global_theme: setting.use_global_theme,
            effective_theme: effective,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Theme preference of {project}:");
        println!("  Theme:        {}", setting.color_theme);
        println!("  Use global:   {}", setting.use_global_theme);
        println!("  Effective:    {effective}");
    }

    Ok(())
}
