//! Keyword commenter.
//!
//! Each line covered by at least one unit is tested once. The first keyword
//! it contains comments the line out; the match is logged against the
//! innermost unit and every enclosing unit is marked modified. A hit on the
//! opener or closer of a block disables the whole block: it is recorded in
//! [`CommentOutcome::disabled`] and the collapse phase comments its range.

use crate::document::Document;
use crate::keywords::Keywords;
use crate::model::{UnitId, UnitKind};
use crate::tree::UnitTree;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// One line commented because of a keyword hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMatch {
    pub line: usize,
    pub keyword: String,
    pub unit: UnitId,
}

#[derive(Debug, Clone, Default)]
pub struct CommentOptions<'a> {
    /// Appended to each commented line as ` -> <note>`.
    pub note: Option<&'a str>,
    /// Require whole-word matches for lines inside case branches.
    pub whole_word_branches: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CommentOutcome {
    pub matches: Vec<KeywordMatch>,
    pub modified: BTreeSet<UnitId>,
    /// Blocks whose opener or closer line matched a keyword.
    pub disabled: BTreeSet<UnitId>,
}

impl CommentOutcome {
    pub fn lines_modified(&self) -> usize {
        self.matches.len()
    }
}

pub fn comment_keywords(
    doc: &mut Document,
    tree: &UnitTree,
    keywords: &Keywords,
    options: &CommentOptions,
) -> CommentOutcome {
    let mut outcome = CommentOutcome::default();

    for idx in 0..doc.len() {
        let Some(owner) = tree.innermost(idx) else { continue };
        if doc.line(idx).originally_commented() || doc.line(idx).is_commented() {
            continue;
        }

        let in_branch = options.whole_word_branches
            && tree
                .ancestors(owner)
                .any(|i| tree.node(i).unit.id.kind == UnitKind::CaseBranch);
        let text = doc.text(idx);
        let hit = if in_branch {
            keywords.first_word_match(text)
        } else {
            keywords.first_substring_match(text)
        };
        let Some(keyword) = hit.map(str::to_string) else { continue };

        if !doc.comment(idx, options.note) {
            continue;
        }
        let unit = tree.node(owner).unit.id;
        debug!(line = idx + 1, keyword = keyword.as_str(), ?unit, "commented");
        if is_boundary(tree, owner, idx) {
            debug!(?unit, "block boundary matched, disabling block");
            outcome.disabled.insert(unit);
        }
        outcome.modified.extend(tree.ancestors(owner).map(|i| tree.node(i).unit.id));
        outcome.matches.push(KeywordMatch {
            line: idx,
            keyword,
            unit,
        });
    }

    outcome
}

/// Opener or closer line of a block. Subsection markers are plain commands
/// and never count.
fn is_boundary(tree: &UnitTree, owner: usize, line: usize) -> bool {
    let unit = &tree.node(owner).unit;
    if unit.id.kind == UnitKind::Subsection {
        return false;
    }
    line == unit.span.start || (unit.span.closed && line == unit.span.end)
}
