use super::Session;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_schema::{walk_children, NodePath, SchemaNode, Visitor};
use folio_store::{CatalogIndex, DocumentStore};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Book title; lists the library when omitted
    pub title: Option<String>,

    /// Print the index as JSON
    #[arg(long)]
    pub json: bool,
}

/// Prints one line per schema node, indented by depth
struct TreePrinter<'a> {
    language: &'a str,
    lines: Vec<String>,
}

impl TreePrinter<'_> {
    fn line(&mut self, path: &NodePath, node: &SchemaNode, detail: String) {
        let indent = "  ".repeat(path.len());
        let title = node
            .titles
            .primary_title(self.language)
            .map(|t| format!(" \"{}\"", t))
            .unwrap_or_default();
        let marker = if node.default { " (default)" } else { "" };
        self.lines
            .push(format!("{}{}{}{} {}", indent, node.key, title, marker, detail.dimmed()));
    }
}

impl Visitor for TreePrinter<'_> {
    fn visit_container(&mut self, path: &NodePath, node: &SchemaNode) {
        self.line(path, node, format!("[{} children]", node.children().len()));
        walk_children(self, path, node);
    }

    fn visit_content(&mut self, path: &NodePath, node: &SchemaNode) {
        let sections = node
            .shape()
            .map(|shape| shape.section_names().join(", "))
            .unwrap_or_default();
        self.line(path, node, format!("[{}]", sections));
    }
}

pub fn show(args: ShowArgs, session: &Session) -> Result<()> {
    let Some(title) = args.title else {
        for title in session.library.titles() {
            let categories = session.library.categories(&title).unwrap_or_default();
            println!("{} {}", title.bright_white(), categories.join(" / ").dimmed());
        }
        return Ok(());
    };

    let index = session.store.load_index(&title)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&index)?);
        return Ok(());
    }

    println!("{} (revision {})", index.title.bright_white().bold(), index.revision);
    if index.is_commentary() {
        println!("  commentary on {}", index.base_text_titles.join(", "));
    }

    let mut printer = TreePrinter {
        language: &session.config.language,
        lines: Vec::new(),
    };
    printer.visit_node(&NodePath::root(), index.schema.root());
    println!();
    for line in printer.lines {
        println!("{}", line);
    }

    println!();
    for version in session.store.versions(&title)? {
        println!(
            "  {} [{}] {} segments",
            version.version_title,
            version.language,
            version.chapter.segment_count()
        );
    }

    let commentaries = session.library.commentary_titles_on_book(&title);
    if !commentaries.is_empty() {
        println!("  commentaries: {}", commentaries.join(", "));
    }
    if let Some(state) = session.store.version_state(&title)? {
        println!(
            "  state generated {} (revision {})",
            state.generated_at.to_rfc3339(),
            state.revision
        );
    }
    Ok(())
}
