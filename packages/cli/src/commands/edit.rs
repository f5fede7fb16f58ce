use super::Session;
use anyhow::{Context, Result};
use clap::Args;
use folio_editor::SchemaEdit;
use folio_schema::{NodePath, SchemaNode};
use folio_store::DocumentStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InsertArgs {
    /// Book title
    pub title: String,

    /// Parent container path (e.g. /part-one)
    pub parent: NodePath,

    /// JSON file holding the new node
    pub node: PathBuf,

    /// Position among the parent's children (defaults to last)
    #[arg(short, long, conflicts_with = "first")]
    pub position: Option<usize>,

    /// Insert as the first child
    #[arg(long)]
    pub first: bool,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn insert(args: InsertArgs, session: &Session) -> Result<()> {
    let content = std::fs::read_to_string(&args.node)
        .with_context(|| format!("Cannot read node file {}", args.node.display()))?;
    let node: SchemaNode = serde_json::from_str(&content)?;

    let position = match (args.first, args.position) {
        (true, _) => 0,
        (false, Some(position)) => position,
        (false, None) if args.dry_run => session
            .store
            .load_index(&args.title)?
            .schema
            .children(&args.parent)?
            .len(),
        (false, None) => {
            // last position is read under the book lock
            let report = session.mutator.insert_last_child(&args.title, args.parent, node)?;
            super::print_report(&report);
            return Ok(());
        }
    };

    let edit = SchemaEdit::InsertChild {
        parent: args.parent,
        node,
        position,
    };
    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Book title
    pub title: String,

    /// Path of the node to remove
    pub path: NodePath,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn remove(args: RemoveArgs, session: &Session) -> Result<()> {
    let edit = SchemaEdit::RemoveChild { path: args.path };
    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}

#[derive(Debug, Args)]
pub struct ReorderArgs {
    /// Book title
    pub title: String,

    /// Parent container path
    pub parent: NodePath,

    /// New order of child keys, comma separated
    #[arg(value_delimiter = ',', required = true)]
    pub order: Vec<String>,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn reorder(args: ReorderArgs, session: &Session) -> Result<()> {
    let edit = SchemaEdit::ReorderChildren {
        parent: args.parent,
        order: args.order,
    };
    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}

#[derive(Debug, Args)]
pub struct MergeDefaultArgs {
    /// Book title
    pub title: String,

    /// Container whose single default child is merged into it
    #[arg(default_value = "/")]
    pub parent: NodePath,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn merge_default(args: MergeDefaultArgs, session: &Session) -> Result<()> {
    let edit = SchemaEdit::MergeDefaultIntoParent { parent: args.parent };
    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Title of a book whose root is a content node
    pub title: String,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn convert(args: ConvertArgs, session: &Session) -> Result<()> {
    session.run_edit(&args.title, SchemaEdit::ConvertSimpleToComplex, args.dry_run)?;
    Ok(())
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Book title
    pub title: String,

    /// Path of the node to move
    pub path: NodePath,

    /// New parent container
    pub new_parent: NodePath,

    /// Position among the new parent's children
    #[arg(short, long, default_value_t = 0)]
    pub position: usize,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn change_parent(args: MoveArgs, session: &Session) -> Result<()> {
    let edit = SchemaEdit::ChangeParent {
        path: args.path,
        new_parent: args.new_parent,
        position: args.position,
    };
    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}

#[derive(Debug, Args)]
pub struct RetitleArgs {
    /// Book title
    pub title: String,

    /// Path of the node to retitle
    pub path: NodePath,

    /// Title to replace
    pub old_title: String,

    /// Replacement title
    pub new_title: String,

    /// Title language (defaults to the configured language)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn change_title(args: RetitleArgs, session: &Session) -> Result<()> {
    let edit = SchemaEdit::ChangeNodeTitle {
        path: args.path,
        lang: args.lang.unwrap_or_else(|| session.config.language.clone()),
        old_title: args.old_title,
        new_title: args.new_title,
    };
    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}
