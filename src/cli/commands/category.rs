//! Project category command implementations.

use super::{actor_name, open_storage, parse_tier_filter, swatch};
use crate::cli::{CategoryCommands, CategoryCreateArgs, CategoryUpdateArgs};
use crate::error::{Error, Result};
use crate::model::{CategoryTier, CategoryUpdate, NewCategory, ProjectCategory};
use crate::validate::parse_tier;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CategoryListOutput {
    categories: Vec<ProjectCategory>,
    count: usize,
}

#[derive(Serialize)]
struct HistoryEntry {
    event: &'static str,
    actor: String,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: i64,
}

#[derive(Serialize)]
struct CategoryShowOutput {
    category: ProjectCategory,
    history: Vec<HistoryEntry>,
}

/// Execute category commands.
pub fn execute(
    command: &CategoryCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        CategoryCommands::Create(args) => create(args, db_path, actor, json),
        CategoryCommands::List { project, tier } => list(project, tier.as_deref(), db_path, json),
        CategoryCommands::Show { id, history } => show(id, *history, db_path, json),
        CategoryCommands::Rename { id, name } => {
            let update = CategoryUpdate {
                name: Some(name.clone()),
                ..CategoryUpdate::default()
            };
            apply_update(id, &update, db_path, actor, json)
        }
        CategoryCommands::Recolor { id, color } => {
            let update = CategoryUpdate {
                color: Some(color.clone()),
                ..CategoryUpdate::default()
            };
            apply_update(id, &update, db_path, actor, json)
        }
        CategoryCommands::Update(args) => update(args, db_path, actor, json),
        CategoryCommands::Delete { id } => delete(id, db_path, actor, json),
    }
}

fn create(
    args: &CategoryCreateArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let tier = parse_tier(&args.tier)?;

    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "create_category",
                "project": args.project,
                "name": args.name,
                "tier": tier,
                "parent": args.parent,
            });
            println!("{output}");
        } else {
            println!("Would create {tier} category: {} in {}", args.name, args.project);
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);

    let new = NewCategory {
        project_id: args.project.clone(),
        name: args.name.clone(),
        tier,
        parent: args.parent.clone(),
        color: args.color.clone(),
        description: args.description.clone(),
        sort_order: args.sort_order,
    };
    let row = storage.create_category(&new, &actor)?;

    if crate::is_silent() {
        println!("{}", row.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&row)?);
    } else {
        println!("Created {} category: {} [{}]", row.tier, row.name, row.id);
    }

    Ok(())
}

fn list(project: &str, tier: Option<&str>, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let tier = parse_tier_filter(tier)?;
    let storage = open_storage(db_path)?;

    let categories: Vec<ProjectCategory> = storage
        .list_categories(project)?
        .into_iter()
        .filter(|c| tier.is_none_or(|t| c.tier == t))
        .collect();

    if crate::is_silent() {
        for c in &categories {
            println!("{}", c.id);
        }
        return Ok(());
    }

    if json {
        let output = CategoryListOutput {
            count: categories.len(),
            categories,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if categories.is_empty() {
        println!("No categories stored for {project}.");
        println!("Run 'tiercat resolve --project {project}' to see what it displays.");
        return Ok(());
    }

    println!("Categories in {project} ({} found):", categories.len());
    println!();
    for c in categories.iter().filter(|c| c.tier == CategoryTier::Tier1) {
        print_row(c, "");
        for child in categories
            .iter()
            .filter(|r| r.parent_id.as_deref() == Some(c.id.as_str()))
        {
            print_row(child, "    ");
        }
    }

    let orphans: Vec<&ProjectCategory> = categories
        .iter()
        .filter(|c| c.tier == CategoryTier::Tier2)
        .filter(|c| {
            c.parent_id
                .as_deref()
                .is_none_or(|p| !categories.iter().any(|r| r.id == p))
        })
        .collect();
    if !orphans.is_empty() {
        println!();
        println!("{}", "Orphaned (hidden when resolving):".yellow());
        for c in orphans {
            print_row(c, "    ");
        }
    }

    Ok(())
}

fn print_row(c: &ProjectCategory, indent: &str) {
    println!(
        "{indent}{} {} {}",
        swatch(c.color.as_deref()),
        c.name,
        format!("[{}] #{}", c.id, c.sort_order).dimmed()
    );
}

fn show(id: &str, limit: u32, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let category = storage
        .get_category(id)?
        .ok_or_else(|| Error::CategoryNotFound { id: id.to_string() })?;
    let events = storage.history("category", id, limit)?;

    if json {
        let output = CategoryShowOutput {
            category,
            history: events
                .into_iter()
                .map(|e| HistoryEntry {
                    event: e.event_type.as_str(),
                    actor: e.actor,
                    old_value: e.old_value,
                    new_value: e.new_value,
                    created_at: e.created_at,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{} {}", swatch(category.color.as_deref()), category.name.bold());
    println!("  ID:          {}", category.id);
    println!("  Project:     {}", category.project_id);
    println!("  Tier:        {}", category.tier);
    if let Some(parent) = &category.parent_id {
        println!("  Parent:      {parent}");
    }
    println!("  Color:       {}", category.color.as_deref().unwrap_or("-"));
    println!("  Sort order:  {}", category.sort_order);
    if let Some(desc) = &category.description {
        println!("  Description: {desc}");
    }
    if let Some(template) = &category.template_id {
        println!("  Template:    {template}");
    }

    if !events.is_empty() {
        println!();
        println!("History:");
        for e in &events {
            let change = match (&e.old_value, &e.new_value) {
                (Some(old), Some(new)) => format!("{old} -> {new}"),
                (None, Some(new)) => new.clone(),
                (Some(old), None) => old.clone(),
                (None, None) => String::new(),
            };
            println!(
                "  {} {} {}",
                e.event_type.as_str(),
                change,
                format!("by {}", e.actor).dimmed()
            );
        }
    }

    Ok(())
}

fn update(
    args: &CategoryUpdateArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let update = CategoryUpdate {
        name: args.name.clone(),
        color: args.color.clone(),
        description: args.description.clone(),
        sort_order: args.sort_order,
    };
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update: pass --name, --color, --description or --sort-order".to_string(),
        ));
    }
    apply_update(&args.id, &update, db_path, actor, json)
}

fn apply_update(
    id: &str,
    update: &CategoryUpdate,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "update_category",
                "id": id,
            });
            println!("{output}");
        } else {
            println!("Would update category: {id}");
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let row = storage.update_category(id, update, &actor)?;

    if crate::is_silent() {
        println!("{}", row.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&row)?);
    } else {
        println!("Updated category: {} {} [{}]", swatch(row.color.as_deref()), row.name, row.id);
        if update.name.is_some() {
            println!(
                "{}",
                "Tasks and other records keep the old name until edited.".dimmed()
            );
        }
    }

    Ok(())
}

fn delete(id: &str, db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "delete_category",
                "id": id,
            });
            println!("{output}");
        } else {
            println!("Would delete category: {id}");
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let row = storage.delete_category(id, &actor)?;

    if crate::is_silent() {
        println!("{}", row.id);
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "id": row.id,
            "name": row.name,
            "deleted": true,
        });
        println!("{output}");
    } else {
        println!("Deleted category: {} [{}]", row.name, row.id);
    }

    Ok(())
}
