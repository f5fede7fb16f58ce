use super::Session;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct RefreshStateArgs {
    /// Base book title; its commentaries are refreshed too
    pub title: String,
}

pub fn refresh_state(args: RefreshStateArgs, session: &Session) -> Result<()> {
    let count = session.mutator.refresh_version_state(&args.title)?;
    println!(
        "{} Regenerated {} version states for {}",
        "✓".green(),
        count,
        args.title.bright_white()
    );
    Ok(())
}
