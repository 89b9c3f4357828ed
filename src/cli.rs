use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "pdk")]
#[command(bin_name = "pdk")]
#[command(version)]
#[command(about = "A local-first prompt library with categories and search")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "PROMPTDECK_DB_PATH",
        default_value = ".promptdeck/state.sqlite",
        help = "Path to the local SQLite store."
    )]
    pub db: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Add a new prompt.")]
    Add(AddArgs),
    #[command(about = "Edit prompt fields and tags in one command.")]
    Edit(EditArgs),
    #[command(about = "Remove a prompt from its category (soft delete).")]
    Rm(RmArgs),
    #[command(about = "Delete a prompt record completely.")]
    Purge(RmArgs),
    #[command(about = "Show one prompt by id.")]
    Show(ShowArgs),
    #[command(about = "Render the category tree with prompt counts.")]
    Ls(LsArgs),
    #[command(about = "Search prompts by title, content, tags, or category name.")]
    Search(SearchArgs),
    #[command(about = "Manage categories.")]
    Cat(CatArgs),
    #[command(about = "Export prompts and categories as a JSON document.")]
    Export(ExportArgs),
    #[command(about = "Import a previously exported JSON document.")]
    Import(ImportArgs),
    #[command(about = "Show aggregate statistics.")]
    Stats(StatsArgs),
    #[command(about = "Pull from the configured remote (not implemented).")]
    Pull(SyncArgs),
    #[command(about = "Push to the configured remote (not implemented).")]
    Push(SyncArgs),
    #[command(about = "Clear everything and reseed the default dataset.")]
    Reset(ResetArgs),
    #[command(about = "Generate shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
#[command(about = "Add a prompt.")]
pub struct AddArgs {
    #[arg(help = "Prompt title.")]
    pub title: String,

    #[arg(short = 'c', long, help = "Prompt content text.")]
    pub content: Option<String>,

    #[arg(short = 'k', long = "category", help = "Category id.")]
    pub category: Option<String>,

    #[arg(short = 'g', long = "tag", help = "Add tag (repeatable).")]
    pub tags: Vec<String>,

    #[arg(long, help = "Mark this prompt as its category's guide.")]
    pub guide: bool,
}

#[derive(Debug, Args)]
#[command(about = "Edit a prompt.")]
pub struct EditArgs {
    #[arg(help = "Prompt id.")]
    pub id: String,

    #[arg(short = 't', long, help = "Set title.")]
    pub title: Option<String>,

    #[arg(short = 'c', long, help = "Set content.")]
    pub content: Option<String>,

    #[arg(
        short = 'k',
        long = "category",
        conflicts_with = "uncategorize",
        help = "Move into this category."
    )]
    pub category: Option<String>,

    #[arg(long, help = "Clear the category link.")]
    pub uncategorize: bool,

    #[arg(short = 'a', long = "add-tag", help = "Add tag (repeatable).")]
    pub add_tags: Vec<String>,

    #[arg(short = 'r', long = "remove-tag", help = "Remove tag (repeatable).")]
    pub remove_tags: Vec<String>,

    #[arg(long, conflicts_with = "no_guide", help = "Mark as the category guide.")]
    pub guide: bool,

    #[arg(long = "no-guide", help = "Unmark as the category guide.")]
    pub no_guide: bool,
}

#[derive(Debug, Args)]
#[command(about = "Target one prompt.")]
pub struct RmArgs {
    #[arg(help = "Prompt id.")]
    pub id: String,
}

#[derive(Debug, Args)]
#[command(about = "Show one prompt.")]
pub struct ShowArgs {
    #[arg(help = "Prompt id.")]
    pub id: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Render the tree.")]
pub struct LsArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Search prompts.")]
pub struct SearchArgs {
    #[arg(help = "Search term (case-insensitive substring).")]
    pub term: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Category commands.")]
pub struct CatArgs {
    #[command(subcommand)]
    pub command: CatSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum CatSubcommands {
    #[command(about = "Create a category.")]
    Add(CatAddArgs),
    #[command(about = "Update a category's fields.")]
    Set(CatSetArgs),
    #[command(about = "Delete a category; its prompts become uncategorized.")]
    Rm(CatRmArgs),
    #[command(about = "List categories.", alias = "list")]
    Ls(LsArgs),
}

#[derive(Debug, Args)]
#[command(about = "Create a category.")]
pub struct CatAddArgs {
    #[arg(help = "Category name.")]
    pub name: String,

    #[arg(short = 'D', long, help = "Description text.")]
    pub description: Option<String>,

    #[arg(short = 'i', long, help = "Icon name.")]
    pub icon: Option<String>,

    #[arg(short = 's', long = "sort-order", help = "Sort weight.")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Args)]
#[command(about = "Update a category.")]
pub struct CatSetArgs {
    #[arg(help = "Category id.")]
    pub id: String,

    #[arg(short = 'n', long, help = "Set name.")]
    pub name: Option<String>,

    #[arg(short = 'D', long, help = "Set description.")]
    pub description: Option<String>,

    #[arg(short = 'i', long, help = "Set icon.")]
    pub icon: Option<String>,

    #[arg(short = 's', long = "sort-order", help = "Set sort weight.")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Args)]
#[command(about = "Delete a category.")]
pub struct CatRmArgs {
    #[arg(help = "Category id.")]
    pub id: String,
}

#[derive(Debug, Args)]
#[command(about = "Export document options.")]
pub struct ExportArgs {
    #[arg(short = 'o', long, help = "Write to this file instead of stdout.")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[command(about = "Import document options.")]
pub struct ImportArgs {
    #[arg(help = "Path to an exported JSON document.")]
    pub file: PathBuf,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Statistics options.")]
pub struct StatsArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,

    #[arg(
        short = 'n',
        long,
        default_value_t = 5,
        help = "How many top categories to rank."
    )]
    pub top: usize,
}

#[derive(Debug, Args)]
#[command(about = "Remote sync output options.")]
pub struct SyncArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Reset options.")]
pub struct ResetArgs {
    #[arg(short = 'f', long, help = "Required; this wipes all local data.")]
    pub force: bool,
}

#[derive(Debug, Args)]
#[command(about = "Generate shell completions.")]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
