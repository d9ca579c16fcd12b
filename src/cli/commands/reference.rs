//! Category reference command implementations.
//!
//! Records outside tiercat (tasks, materials, labor entries) keep category
//! names as plain strings. These commands show how such names render
//! against a project's current tree and which of them no longer match.

use super::{open_storage, resolve_project, swatch};
use crate::cli::RefCommands;
use crate::error::{Error, Result};
use crate::model::CategoryReference;
use crate::taxonomy::guard::{audit_references, render_reference, BadgePart, OrphanReference};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditOutput {
    project_id: String,
    checked: usize,
    orphans: Vec<OrphanReference>,
}

/// Execute reference commands.
pub fn execute(command: &RefCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        RefCommands::Render {
            project,
            tier1,
            tier2,
        } => render(project, tier1, tier2.as_deref(), db_path, json),
        RefCommands::Audit { project, file } => audit(project, file, db_path, json),
    }
}

fn render(
    project: &str,
    tier1: &str,
    tier2: Option<&str>,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let storage = open_storage(db_path)?;
    let (tree, settings) = resolve_project(&storage, project)?;
    let badge = render_reference(&tree, tier1, tier2, &settings.neutral_color);

    if crate::is_silent() {
        println!("{}", badge.is_consistent());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&badge)?);
        return Ok(());
    }

    print_part(&badge.tier1);
    if let Some(part) = &badge.tier2 {
        print!("  ");
        print_part(part);
    }
    if !badge.is_consistent() {
        println!(
            "{}",
            "Some names match no category in this project; shown as stored.".dimmed()
        );
    }

    Ok(())
}

fn print_part(part: &BadgePart) {
    let status = if part.matched {
        "matched".green()
    } else {
        "unmatched".yellow()
    };
    println!("{} {} {}", swatch(Some(part.color.as_str())), part.label, status);
}

fn read_references(path: &Path) -> Result<Vec<CategoryReference>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::InvalidArgument(format!("{}: expected a JSON array of references: {e}", path.display()))
    })
}

fn audit(project: &str, file: &Path, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let refs = read_references(file)?;
    let storage = open_storage(db_path)?;
    let (tree, _) = resolve_project(&storage, project)?;
    let orphans = audit_references(&tree, &refs);
    if !orphans.is_empty() {
        warn!(project, count = orphans.len(), "References match no category");
    }

    if crate::is_silent() {
        for o in &orphans {
            println!("{}", o.record_id);
        }
        return Ok(());
    }

    if json {
        let output = AuditOutput {
            project_id: project.to_string(),
            checked: refs.len(),
            orphans,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if orphans.is_empty() {
        println!("All {} references match a category in {project}.", refs.len());
        return Ok(());
    }

    println!(
        "{} of {} references match no category in {project}:",
        orphans.len(),
        refs.len()
    );
    for o in &orphans {
        println!(
            "  {} {} {} {}",
            o.kind.as_str(),
            o.record_id,
            o.tier,
            format!("\"{}\"", o.name).yellow()
        );
    }

    Ok(())
}
