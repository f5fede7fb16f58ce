pub mod apply;
pub mod edit;
pub mod show;
pub mod state;

pub use apply::{apply, ApplyArgs};
pub use edit::{
    change_parent, change_title, convert, insert, merge_default, remove, reorder, ConvertArgs, InsertArgs,
    MergeDefaultArgs, MoveArgs, RemoveArgs, ReorderArgs, RetitleArgs,
};
pub use show::{show, ShowArgs};
pub use state::{refresh_state, RefreshStateArgs};

use crate::config::Config;
use anyhow::Result;
use colored::Colorize;
use folio_editor::{MutationReport, SchemaEdit, SchemaMutator};
use folio_store::{JsonFileStore, Library};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Library opened from the configured JSON file
pub struct Session {
    pub config: Config,
    pub store: Arc<JsonFileStore>,
    pub library: Arc<Library>,
    pub mutator: SchemaMutator,
}

impl Session {
    /// Open the library named by the config at `config_path`, or by
    /// `folio.config.json` in `cwd`
    pub fn open(config_path: Option<&Path>, cwd: &str) -> Result<Self> {
        let (config, base_dir) = match config_path {
            Some(path) => {
                let base_dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from(cwd),
                };
                (Config::load_from(path)?, base_dir)
            }
            None => (Config::load(cwd)?, PathBuf::from(cwd)),
        };
        let store_path = config.get_store_path(&base_dir);
        tracing::debug!("Opening library {}", store_path.display());

        let store = Arc::new(JsonFileStore::open(store_path)?);
        let library = Arc::new(Library::new(store.clone()));
        let mutator = SchemaMutator::new(store.clone(), library.clone()).with_config(config.editor_config());

        Ok(Self {
            config,
            store,
            library,
            mutator,
        })
    }

    /// Apply `edit`, or only plan it when `dry_run` is set
    pub fn run_edit(&self, title: &str, edit: SchemaEdit, dry_run: bool) -> Result<MutationReport> {
        let report = if dry_run {
            self.mutator.check(title, &edit)?.report(false)
        } else {
            self.mutator.apply(title, edit)?
        };
        print_report(&report);
        Ok(report)
    }
}

pub fn print_report(report: &MutationReport) {
    let verb = if report.committed { "Applied" } else { "Checked" };
    println!(
        "{} {} {} on {}",
        "✓".green(),
        verb,
        report.edit.bright_white(),
        report.title.bright_white()
    );
    println!("  indexes saved:      {}", report.indexes_saved);
    println!("  versions repaired:  {}", report.versions_repaired);
    if report.versions_skipped > 0 {
        println!(
            "  versions skipped:   {}",
            report.versions_skipped.to_string().yellow()
        );
    }
    println!("  links deleted:      {}", report.links_deleted);
    println!("  links rewritten:    {}", report.links_rewritten);
    println!("  states regenerated: {}", report.states_regenerated);
    if !report.committed {
        println!("{}", "(dry run, nothing was written)".dimmed());
    }
}
