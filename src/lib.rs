//! Structural editor for numbered job scripts.
//!
//! Runs a keyword-driven disable pass over a shell script in five phases:
//!
//! 1. **Scan**: index sections, subsections, functions, loops and case statements
//! 2. **Comment**: comment out every in-block line containing a keyword
//! 3. **Collapse**: comment whole blocks whose content is now all disabled
//! 4. **Renumber**: give surviving sections consecutive numbers
//! 5. **Substitute**: apply the global literal replacement table
//!
//! Every phase edits lines in place, so the indices found by the scanner stay
//! valid throughout. The changelog is spliced in only when the result is
//! rendered.

pub mod changelog;
pub mod collapse;
pub mod commenter;
pub mod document;
pub mod error;
pub mod grammar;
pub mod indent;
pub mod keywords;
pub mod model;
pub mod renumber;
pub mod scanner;
pub mod substitute;
pub mod tree;

use changelog::ChangelogFacts;
use collapse::CollapseSet;
use commenter::{CommentOptions, KeywordMatch};
use document::Document;
use indent::Reindent;
use model::{StructureIndex, UnitKind};
use renumber::RenumberMap;
use serde::Serialize;
use substitute::SubstitutionTable;
use tracing::info;
use tree::UnitTree;

pub use error::EditError;
pub use keywords::Keywords;

/// Pipeline configuration for [`edit`].
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Appended to every line the run comments out.
    pub note: Option<String>,
    /// Whole-word keyword matching inside case branches.
    pub whole_word_branches: bool,
    pub substitutions: SubstitutionTable,
}

/// Counts reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub lines_modified: usize,
    pub units_modified: usize,
    pub units_collapsed: usize,
    pub sections_collapsed: usize,
    pub sections_renumbered: usize,
    pub substitutions: usize,
}

#[derive(Debug, Clone)]
pub struct EditResult {
    pub document: Document,
    pub index: StructureIndex,
    pub matches: Vec<KeywordMatch>,
    pub collapsed: CollapseSet,
    pub renumber: RenumberMap,
    pub changelog: Vec<String>,
    pub summary: Summary,
}

impl EditResult {
    /// Materialise the output text. The indenter runs before the changelog
    /// position is chosen so the report lands against the final layout.
    pub fn render(&self, embed_changelog: bool, indenter: Option<&dyn Reindent>) -> String {
        let mut lines = self.document.texts();
        if let Some(indenter) = indenter {
            lines = indenter.reindent(&lines);
        }
        if embed_changelog {
            let placement = changelog::locate(&lines);
            lines = changelog::splice(&lines, placement, &self.changelog);
        }
        self.document
            .join(&lines, self.document.trailing_newline() || embed_changelog)
    }
}

/// Core edit pipeline.
pub fn edit(source: &str, keywords: &Keywords, options: &EditOptions) -> Result<EditResult, EditError> {
    if keywords.is_empty() {
        return Err(EditError::NoKeywords);
    }

    let mut document = Document::parse(source);
    let index = scanner::scan(&document);
    if index.is_empty() {
        return Err(EditError::NoStructure);
    }
    let tree = UnitTree::build(&index, document.len());
    info!(
        sections = index.sections.len(),
        functions = index.functions.len(),
        loops = index.loops.len(),
        cases = index.cases.len(),
        "scanned"
    );

    let note = options.note.as_deref();
    let comment_options = CommentOptions {
        note,
        whole_word_branches: options.whole_word_branches,
    };
    let commented = commenter::comment_keywords(&mut document, &tree, keywords, &comment_options);
    info!(
        keywords = keywords.len(),
        lines = commented.lines_modified(),
        units = commented.modified.len(),
        disabled = commented.disabled.len(),
        "keyword commenting"
    );

    let collapsed = collapse::collapse(&mut document, &tree, &commented.disabled, note);
    info!(units = collapsed.len(), "collapse");

    let renumber = RenumberMap::build(&index, &collapsed);
    let outcome = renumber::apply(&mut document, &index, &renumber);
    info!(
        sections = renumber.changed(),
        headers = outcome.headers,
        labels = outcome.labels,
        "renumber"
    );

    let substitutions = options.substitutions.apply(&mut document);
    info!(replacements = substitutions, "substitution");

    let changelog = changelog::build(&ChangelogFacts {
        keywords,
        matches: &commented.matches,
        modified: &commented.modified,
        collapsed: &collapsed,
        renumber: &renumber,
        substitutions,
        table: &options.substitutions,
        index: &index,
        tree: &tree,
    });

    let summary = Summary {
        lines_modified: commented.lines_modified(),
        units_modified: commented.modified.len(),
        units_collapsed: collapsed.len(),
        sections_collapsed: collapsed
            .iter()
            .filter(|id| id.kind == UnitKind::Section)
            .count(),
        sections_renumbered: renumber.changed(),
        substitutions,
    };

    Ok(EditResult {
        document,
        index,
        matches: commented.matches,
        collapsed,
        renumber,
        changelog,
        summary,
    })
}
