use super::Session;
use anyhow::{Context, Result};
use clap::Args;
use folio_editor::SchemaEdit;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Book title
    pub title: String,

    /// JSON file holding one edit, e.g. {"op": "removeChild", "path": ["intro"]}
    pub edit: PathBuf,

    /// Plan the edit without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn apply(args: ApplyArgs, session: &Session) -> Result<()> {
    let content = std::fs::read_to_string(&args.edit)
        .with_context(|| format!("Cannot read edit file {}", args.edit.display()))?;
    let edit: SchemaEdit = serde_json::from_str(&content)
        .with_context(|| format!("Invalid edit in {}", args.edit.display()))?;

    session.run_edit(&args.title, edit, args.dry_run)?;
    Ok(())
}
