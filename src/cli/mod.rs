//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
}

pub mod commands;

/// tiercat - two-tier category taxonomy and theming engine
#[derive(Parser, Debug)]
#[command(name = "tiercat", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.tiercat/data/tiercat.db)
    #[arg(long, global = true, env = "TIERCAT_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "TIERCAT_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, alias = "robot", global = true)]
    pub json: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only the ID/name (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Preview changes without writing to the database
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the tiercat database
    Init {
        /// Recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Print the category tree a project displays
    Resolve {
        /// Project ID
        #[arg(long)]
        project: String,
    },

    /// Project category management
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Global template registry
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Built-in category presets
    Preset {
        #[command(subcommand)]
        command: PresetCommands,
    },

    /// Color themes and project theme preferences
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },

    /// Task category assignments
    Assign {
        #[command(subcommand)]
        command: AssignCommands,
    },

    /// Render and audit category names held by other records
    Ref {
        #[command(subcommand)]
        command: RefCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Category Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create a project category
    Create(CategoryCreateArgs),

    /// List a project's stored categories
    List {
        /// Project ID
        #[arg(long)]
        project: String,

        /// Only this tier (tier1, tier2)
        #[arg(long)]
        tier: Option<String>,
    },

    /// Show a category and its recent history
    Show {
        /// Category ID
        id: String,

        /// Maximum history events to show
        #[arg(long, default_value = "10")]
        history: u32,
    },

    /// Rename a category
    Rename {
        /// Category ID
        id: String,

        /// New name
        name: String,
    },

    /// Change a category's color
    Recolor {
        /// Category ID
        id: String,

        /// Hex color (#RRGGBB or #RGB)
        color: String,
    },

    /// Update several fields at once
    Update(CategoryUpdateArgs),

    /// Delete a category (children are kept)
    Delete {
        /// Category ID
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct CategoryCreateArgs {
    /// Category name
    pub name: String,

    /// Project ID
    #[arg(long)]
    pub project: String,

    /// Tier: tier1 (main) or tier2 (sub)
    #[arg(short, long, default_value = "tier1")]
    pub tier: String,

    /// Parent tier1 category, by ID or name (tier2 only)
    #[arg(long)]
    pub parent: Option<String>,

    /// Hex color
    #[arg(short, long)]
    pub color: Option<String>,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Display position within the tier
    #[arg(long, default_value = "0")]
    pub sort_order: i32,
}

#[derive(Args, Debug)]
pub struct CategoryUpdateArgs {
    /// Category ID
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New hex color
    #[arg(short, long)]
    pub color: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New display position
    #[arg(long)]
    pub sort_order: Option<i32>,
}

// ============================================================================
// Template Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List global templates
    List {
        /// Only this tier (tier1, tier2)
        #[arg(long)]
        tier: Option<String>,
    },

    /// Show a template
    Show {
        /// Template ID
        id: String,
    },

    /// Create a global template
    Create(TemplateCreateArgs),

    /// Delete a global template (project rows are not touched)
    Delete {
        /// Template ID
        id: String,
    },

    /// Fill an empty registry with the built-in category set
    Seed,

    /// Copy templates into a project
    Load {
        /// Project ID
        #[arg(long)]
        project: String,

        /// Template IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct TemplateCreateArgs {
    /// Template name
    pub name: String,

    /// Tier: tier1 (main) or tier2 (sub)
    #[arg(short, long, default_value = "tier1")]
    pub tier: String,

    /// Parent tier1 template ID (tier2 only)
    #[arg(long)]
    pub parent: Option<String>,

    /// Hex color
    #[arg(short, long)]
    pub color: Option<String>,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Display position within the tier
    #[arg(long, default_value = "0")]
    pub sort_order: i32,
}

// ============================================================================
// Preset Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum PresetCommands {
    /// List built-in presets
    List,

    /// Show a preset's category tree
    Show {
        /// Preset ID
        id: String,
    },

    /// Seed a project from a preset
    Apply {
        /// Project ID
        #[arg(long)]
        project: String,

        /// Preset ID
        id: String,
    },
}

// ============================================================================
// Theme Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ThemeCommands {
    /// List color themes
    List,

    /// Show a theme's palette
    Show {
        /// Theme name
        name: String,
    },

    /// Recolor a project's categories (use --dry-run to preview)
    Apply {
        /// Project ID
        #[arg(long)]
        project: String,

        /// Theme name
        name: String,
    },

    /// Store a project's theme preference (does not recolor)
    Set {
        /// Project ID
        #[arg(long)]
        project: String,

        /// Theme name
        #[arg(long)]
        theme: String,

        /// Follow the global theme instead
        #[arg(long, action = clap::ArgAction::Set, default_value_t = false)]
        global: bool,
    },

    /// Show a project's theme preference
    Get {
        /// Project ID
        #[arg(long)]
        project: String,
    },
}

// ============================================================================
// Assignment Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum AssignCommands {
    /// Assign a category to a task
    Add {
        /// Task ID
        task: String,

        /// Tier1 category name
        tier1: String,

        /// Tier2 category name
        #[arg(long)]
        tier2: Option<String>,

        /// Make this the task's primary assignment
        #[arg(long)]
        primary: bool,
    },

    /// List a task's assignments
    List {
        /// Task ID
        task: String,
    },

    /// Make an assignment its task's primary
    Primary {
        /// Assignment ID
        id: String,
    },

    /// Remove an assignment
    Remove {
        /// Assignment ID
        id: String,
    },
}

// ============================================================================
// Reference Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum RefCommands {
    /// Render a stored category name pair
    Render {
        /// Project ID
        #[arg(long)]
        project: String,

        /// Tier1 category name
        tier1: String,

        /// Tier2 category name
        #[arg(long)]
        tier2: Option<String>,
    },

    /// List references that match no category
    Audit {
        /// Project ID
        #[arg(long)]
        project: String,

        /// JSON file with an array of {kind, recordId, tier1Category, tier2Category}
        #[arg(long)]
        file: PathBuf,
    },
}
