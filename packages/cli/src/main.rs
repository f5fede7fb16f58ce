mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, change_parent, change_title, convert, insert, merge_default, refresh_state, remove, reorder, show,
    ApplyArgs, ConvertArgs, InsertArgs, MergeDefaultArgs, MoveArgs, RefreshStateArgs, RemoveArgs, ReorderArgs,
    RetitleArgs, Session, ShowArgs,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Folio CLI - structural editing for book schemas
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./folio.config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log plan details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a book's schema, versions and state
    Show(ShowArgs),

    /// Apply an edit read from a JSON file
    Apply(ApplyArgs),

    /// Insert a node under a container
    Insert(InsertArgs),

    /// Remove a node and its content
    Remove(RemoveArgs),

    /// Reorder a container's children
    Reorder(ReorderArgs),

    /// Merge a single default child into its parent
    MergeDefault(MergeDefaultArgs),

    /// Turn a content root into a container with a default child
    Convert(ConvertArgs),

    /// Move a node under a new parent
    Move(MoveArgs),

    /// Replace one of a node's titles
    Retitle(RetitleArgs),

    /// Regenerate version states of a book and its commentaries
    RefreshState(RefreshStateArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let session = Session::open(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Show(args) => show(args, &session),
        Command::Apply(args) => apply(args, &session),
        Command::Insert(args) => insert(args, &session),
        Command::Remove(args) => remove(args, &session),
        Command::Reorder(args) => reorder(args, &session),
        Command::MergeDefault(args) => merge_default(args, &session),
        Command::Convert(args) => convert(args, &session),
        Command::Move(args) => change_parent(args, &session),
        Command::Retitle(args) => change_title(args, &session),
        Command::RefreshState(args) => refresh_state(args, &session),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
