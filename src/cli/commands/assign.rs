//! Task assignment command implementations.

use super::{actor_name, open_storage};
use crate::cli::AssignCommands;
use crate::error::Result;
use crate::model::TaskCategoryAssignment;
use crate::taxonomy::assignments::{
    add_assignment, list_assignments, remove_assignment, set_primary,
};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct AssignmentListOutput {
    task_id: String,
    assignments: Vec<TaskCategoryAssignment>,
    count: usize,
}

/// Execute assignment commands.
pub fn execute(
    command: &AssignCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        AssignCommands::Add {
            task,
            tier1,
            tier2,
            primary,
        } => add(task, tier1, tier2.as_deref(), *primary, db_path, actor, json),
        AssignCommands::List { task } => list(task, db_path, json),
        AssignCommands::Primary { id } => primary(id, db_path, actor, json),
        AssignCommands::Remove { id } => remove(id, db_path, actor, json),
    }
}

fn add(
    task: &str,
    tier1: &str,
    tier2: Option<&str>,
    primary: bool,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "add_assignment",
                "task": task,
                "tier1": tier1,
                "tier2": tier2,
                "primary": primary,
            });
            println!("{output}");
        } else {
            println!("Would assign {tier1} to {task}");
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let requested = primary.then_some(true);
    let assignment = add_assignment(&mut storage, task, tier1, tier2, requested, &actor)?;

    if crate::is_silent() {
        println!("{}", assignment.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&assignment)?);
    } else {
        let flag = if assignment.is_primary { " (primary)" } else { "" };
        println!(
            "Assigned {} to {}{flag} [{}]",
            assignment.label(),
            assignment.task_id,
            assignment.id
        );
    }

    Ok(())
}

fn list(task: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let assignments = list_assignments(&storage, task)?;

    if crate::is_silent() {
        for a in &assignments {
            println!("{}", a.id);
        }
        return Ok(());
    }

    if json {
        let output = AssignmentListOutput {
            task_id: task.to_string(),
            count: assignments.len(),
            assignments,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if assignments.is_empty() {
        println!("No assignments for {task}.");
        return Ok(());
    }

    println!("Assignments for {task}:");
    for a in &assignments {
        let marker = if a.is_primary { "★".yellow().to_string() } else { " ".to_string() };
        println!("  {marker} {} {}", a.label(), format!("[{}]", a.id).dimmed());
    }

    Ok(())
}

fn primary(id: &str, db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "set_primary",
                "id": id,
            });
            println!("{output}");
        } else {
            println!("Would make {id} primary");
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let assignment = set_primary(&mut storage, id, &actor)?;

    if crate::is_silent() {
        println!("{}", assignment.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&assignment)?);
    } else {
        println!("Primary for {}: {}", assignment.task_id, assignment.label());
    }

    Ok(())
}

fn remove(id: &str, db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "remove_assignment",
                "id": id,
            });
            println!("{output}");
        } else {
            println!("Would remove assignment: {id}");
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let removed = remove_assignment(&mut storage, id, &actor)?;

    if crate::is_silent() {
        println!("{}", removed.id);
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "id": removed.id,
            "task_id": removed.task_id,
            "was_primary": removed.is_primary,
            "removed": true,
        });
        println!("{output}");
    } else {
        println!("Removed {} from {}", removed.label(), removed.task_id);
        if removed.is_primary {
            println!(
                "{}",
                format!("{} has no primary category now.", removed.task_id).dimmed()
            );
        }
    }

    Ok(())
}
