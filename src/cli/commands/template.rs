//! Template registry command implementations.

use super::{actor_name, open_storage, parse_tier_filter, swatch};
use crate::cli::{TemplateCommands, TemplateCreateArgs};
use crate::error::{Error, Result};
use crate::model::{BatchResult, CategoryTemplate, CategoryTier, ProjectCategory};
use crate::taxonomy::registry::{
    create_template, delete_template, list_templates, load_templates_into_project,
    seed_default_templates, NewTemplate,
};
use crate::validate::parse_tier;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct TemplateListOutput {
    templates: Vec<CategoryTemplate>,
    count: usize,
}

#[derive(Serialize)]
struct SeedOutput {
    inserted: usize,
}

/// Execute template commands.
pub fn execute(
    command: &TemplateCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        TemplateCommands::List { tier } => list(tier.as_deref(), db_path, json),
        TemplateCommands::Show { id } => show(id, db_path, json),
        TemplateCommands::Create(args) => create(args, db_path, actor, json),
        TemplateCommands::Delete { id } => delete(id, db_path, actor, json),
        TemplateCommands::Seed => seed(db_path, actor, json),
        TemplateCommands::Load { project, ids } => load(project, ids, db_path, actor, json),
    }
}

fn list(tier: Option<&str>, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let tier = parse_tier_filter(tier)?;
    let storage = open_storage(db_path)?;
    let templates = list_templates(&storage, tier)?;

    if crate::is_silent() {
        for t in &templates {
            println!("{}", t.id);
        }
        return Ok(());
    }

    if json {
        let output = TemplateListOutput {
            count: templates.len(),
            templates,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if templates.is_empty() {
        println!("No templates found.");
        println!("Run 'tiercat template seed' to add the built-in set.");
        return Ok(());
    }

    println!("Templates ({} found):", templates.len());
    println!();
    for t in &templates {
        let indent = if t.tier == CategoryTier::Tier2 { "    " } else { "" };
        println!(
            "{indent}{} {} {}",
            swatch(t.color.as_deref()),
            t.name,
            format!("[{}]", t.id).dimmed()
        );
    }

    Ok(())
}

fn show(id: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let template = storage
        .get_template(id)?
        .ok_or_else(|| Error::TemplateNotFound { id: id.to_string() })?;

    if json {
        println!("{}", serde_json::to_string(&template)?);
        return Ok(());
    }

    println!("{} {}", swatch(template.color.as_deref()), template.name.bold());
    println!("  ID:          {}", template.id);
    println!("  Tier:        {}", template.tier);
    if let Some(parent) = &template.parent_id {
        println!("  Parent:      {parent}");
    }
    println!("  Color:       {}", template.color.as_deref().unwrap_or("-"));
    println!("  Sort order:  {}", template.sort_order);
    if let Some(desc) = &template.description {
        println!("  Description: {desc}");
    }

    Ok(())
}

fn create(
    args: &TemplateCreateArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let tier = parse_tier(&args.tier)?;

    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "create_template",
                "name": args.name,
                "tier": tier,
            });
            println!("{output}");
        } else {
            println!("Would create {tier} template: {}", args.name);
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let new = NewTemplate {
        name: args.name.clone(),
        tier,
        parent_id: args.parent.clone(),
        color: args.color.clone(),
        description: args.description.clone(),
        sort_order: args.sort_order,
    };
    let template = create_template(&mut storage, &new, &actor)?;

    if crate::is_silent() {
        println!("{}", template.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&template)?);
    } else {
        println!("Created {} template: {} [{}]", template.tier, template.name, template.id);
    }

    Ok(())
}

fn delete(id: &str, db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "delete_template",
                "id": id,
            });
            println!("{output}");
        } else {
            println!("Would delete template: {id}");
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let template = delete_template(&mut storage, id, &actor)?;

    if crate::is_silent() {
        println!("{}", template.id);
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "id": template.id,
            "name": template.name,
            "deleted": true,
        });
        println!("{output}");
    } else {
        println!("Deleted template: {} [{}]", template.name, template.id);
    }

    Ok(())
}

fn seed(db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let inserted = seed_default_templates(&mut storage, &actor)?;

    if crate::is_silent() {
        println!("{inserted}");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&SeedOutput { inserted })?);
    } else if inserted == 0 {
        println!("Template registry already has templates; nothing seeded.");
    } else {
        println!("Seeded {inserted} templates.");
    }

    Ok(())
}

fn load(
    project: &str,
    ids: &[String],
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "load_templates",
                "project": project,
                "count": ids.len(),
            });
            println!("{output}");
        } else {
            println!("Would load {} templates into {project}:", ids.len());
            for id in ids {
                println!("  - {id}");
            }
        }
        return Ok(());
    }

    let mut storage = open_storage(db_path)?;
    let actor = actor_name(actor);
    let batch = load_templates_into_project(&mut storage, project, ids, &actor);

    print_batch(project, &batch, json)?;
    batch.check()
}

fn print_batch(project: &str, batch: &BatchResult<ProjectCategory>, json: bool) -> Result<()> {
    if crate::is_silent() {
        for row in &batch.succeeded {
            println!("{}", row.id);
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(batch)?);
        return Ok(());
    }

    println!(
        "Loaded {} of {} templates into {project}",
        batch.succeeded.len(),
        batch.total()
    );
    for row in &batch.succeeded {
        println!("  {} {} {}", "✓".green(), swatch(row.color.as_deref()), row.name);
    }
    for failure in &batch.failed {
        println!("  {} {}: {}", "✗".red(), failure.item, failure.reason);
    }

    Ok(())
}
