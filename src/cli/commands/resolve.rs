//! Resolve command implementation.

use super::{open_storage, resolve_project, swatch};
use crate::error::Result;
use crate::taxonomy::ResolvedCategory;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput {
    project_id: String,
    source: &'static str,
    tier1_count: usize,
    tier2_count: usize,
    categories: Vec<ResolvedCategory>,
}

/// Print the category tree a project displays.
///
/// Storage failures never surface here: the tree falls back to templates
/// and then to the built-in set.
///
/// # Errors
///
/// Returns `NotInitialized` without a database, or a `Config` error for
/// invalid settings.
pub fn execute(project: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let (tree, _) = resolve_project(&storage, project)?;

    if crate::is_silent() {
        for category in tree.iter() {
            println!("{}", category.id);
        }
        return Ok(());
    }

    if json {
        let output = ResolveOutput {
            project_id: tree.project_id.clone(),
            source: tree.source.as_str(),
            tier1_count: tree.tier1_count(),
            tier2_count: tree.tier2_count(),
            categories: tree.flatten(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        format!("Categories for {project}").bold(),
        format!("(source: {})", tree.source.as_str()).dimmed()
    );
    println!();
    for group in &tree.groups {
        let c = &group.category;
        println!("{} {}  {}", swatch(Some(c.color.as_str())), c.name.bold(), c.description.dimmed());
        for child in &group.children {
            println!(
                "    {} {}  {}",
                swatch(Some(child.color.as_str())),
                child.name,
                child.description.dimmed()
            );
        }
    }
    println!();
    println!(
        "{} main, {} sub",
        tree.tier1_count(),
        tree.tier2_count()
    );

    Ok(())
}
