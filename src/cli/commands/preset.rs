//! Preset command implementations.

use super::{actor_name, open_storage, swatch};
use crate::cli::PresetCommands;
use crate::error::Result;
use crate::model::CategoryTier;
use crate::taxonomy::presets::{apply_preset, get_preset, list_presets, Preset};
use crate::taxonomy::themes::THEMES;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetSummary {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    tier1_count: usize,
    tier2_count: usize,
}

impl From<&Preset> for PresetSummary {
    fn from(p: &Preset) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            tier1_count: p.categories.len(),
            tier2_count: p.tier2_count(),
        }
    }
}

/// Execute preset commands.
pub fn execute(
    command: &PresetCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        PresetCommands::List => list(json),
        PresetCommands::Show { id } => show(id, json),
        PresetCommands::Apply { project, id } => apply(project, id, db_path, actor, json),
    }
}

fn list(json: bool) -> Result<()> {
    let presets = list_presets();

    if crate::is_silent() {
        for p in presets {
            println!("{}", p.id);
        }
        return Ok(());
    }

    if json {
        let summaries: Vec<PresetSummary> = presets.iter().map(PresetSummary::from).collect();
        println!("{}", serde_json::to_string(&summaries)?);
        return Ok(());
    }

    println!("Presets ({} available):", presets.len());
    println!();
    for p in presets {
        println!(
            "{} {} {}",
            p.id.bold(),
            p.description,
            format!("({} main, {} sub)", p.categories.len(), p.tier2_count()).dimmed()
        );
    }

    Ok(())
}

fn show(id: &str, json: bool) -> Result<()> {
    let preset = get_preset(id)?;

    if json {
        println!("{}", serde_json::to_string(preset)?);
        return Ok(());
    }

    let theme = &THEMES[0];
    println!("{} {}", preset.name.bold(), format!("[{}]", preset.id).dimmed());
    println!("{}", preset.description);
    println!();
    for node in preset.categories {
        println!(
            "{} {}  {}",
            swatch(theme.slot_color(CategoryTier::Tier1, node.name)),
            node.name,
            node.description.dimmed()
        );
        for child in node.children {
            println!(
                "    {} {}  {}",
                swatch(theme.slot_color(CategoryTier::Tier2, child.name)),
                child.name,
                child.description.dimmed()
            );
        }
    }

    Ok(())
}

fn apply(
    project: &str,
    id: &str,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let preset = get_preset(id)?;

    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "apply_preset",
                "project": project,
                "preset": preset.id,
                "tier1": preset.categories.len(),
                "tier2": preset.tier2_count(),
            });
            println!("{output}");
        } else {
            println!(
                "Would apply preset {} to {project}: {} main, {} sub categories",
                preset.id,
                preset.categories.len(),
                preset.tier2_count()
            );
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let outcome = apply_preset(&mut storage, project, preset.id, &actor)?;

    if crate::is_silent() {
        for row in outcome.created.iter().chain(&outcome.updated) {
            println!("{}", row.id);
        }
    } else if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!(
            "Applied preset {} to {project}: {} created, {} updated, {} failed",
            preset.id,
            outcome.created.len(),
            outcome.updated.len(),
            outcome.failed.len()
        );
        for failure in &outcome.failed {
            println!("  {} {}: {}", "✗".red(), failure.item, failure.reason);
        }
    }

    outcome.check()
}
