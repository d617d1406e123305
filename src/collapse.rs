//! Collapse detection.
//!
//! A unit collapses when it has at least one meaningful body line and every
//! meaningful body line is commented out, or when the keyword pass disabled
//! it through its opener or closer. Units are judged children first against
//! the post-commenting snapshot; every line of a collapsed unit counts as
//! disabled content for its ancestors. Subsections are never judged on
//! their own and share the fate of their section.

use crate::document::Document;
use crate::grammar;
use crate::model::{UnitId, UnitKind};
use crate::tree::UnitTree;
use std::collections::BTreeSet;
use tracing::debug;

/// Units marked fully disabled. Members are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseSet(BTreeSet<UnitId>);

impl CollapseSet {
    /// Returns `false` when `id` was already a member.
    pub fn insert(&mut self, id: UnitId) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: &UnitId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitId> {
        self.0.iter()
    }
}

/// How a body line counts towards collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    /// Blank, or documentation that was commented before the run.
    Ignored,
    /// Structure without work; commented only as part of a collapse.
    Noise,
    Meaningful { disabled: bool },
}

fn classify(doc: &Document, idx: usize, disabled: &[bool]) -> LineClass {
    let line = doc.line(idx);
    if line.is_blank() || line.originally_commented() {
        return LineClass::Ignored;
    }
    if line.is_commented() || disabled[idx] {
        return LineClass::Meaningful { disabled: true };
    }
    if grammar::is_structural_noise(line.text()) {
        return LineClass::Noise;
    }
    LineClass::Meaningful { disabled: false }
}

/// Decide which units collapse, then comment their remaining lines.
/// Units in `forced` collapse regardless of their content.
pub fn collapse(
    doc: &mut Document,
    tree: &UnitTree,
    forced: &BTreeSet<UnitId>,
    note: Option<&str>,
) -> CollapseSet {
    let mut set = CollapseSet::default();
    // lines of collapsed units, visible to their ancestors
    let mut disabled = vec![false; doc.len()];

    for idx in tree.children_first() {
        let unit = &tree.node(idx).unit;
        if unit.id.kind == UnitKind::Subsection {
            continue;
        }
        if forced.contains(&unit.id) {
            debug!(unit = unit.label.as_str(), line = unit.span.start + 1, "disabled by keyword");
            set.insert(unit.id);
            disabled[unit.span.start..=unit.span.end].fill(true);
            continue;
        }
        let mut meaningful = 0usize;
        let mut all_disabled = true;
        for line in unit.span.body() {
            match classify(doc, line, &disabled) {
                LineClass::Ignored | LineClass::Noise => {}
                LineClass::Meaningful { disabled } => {
                    meaningful += 1;
                    if !disabled {
                        all_disabled = false;
                        break;
                    }
                }
            }
        }
        if meaningful > 0 && all_disabled {
            debug!(unit = unit.label.as_str(), line = unit.span.start + 1, "collapsed");
            set.insert(unit.id);
            disabled[unit.span.start..=unit.span.end].fill(true);
        }
    }

    // ownership implies fate
    let roots: Vec<usize> = (0..tree.len())
        .filter(|&i| set.contains(&tree.node(i).unit.id))
        .collect();
    for &root in &roots {
        for child in tree.descendants(root) {
            set.insert(tree.node(child).unit.id);
        }
    }

    for &root in &roots {
        let span = tree.node(root).unit.span;
        for line in span.start..=span.end {
            doc.comment(line, note);
        }
    }

    set
}

/// True when every meaningful line in the unit's body is commented.
pub fn fully_commented(doc: &Document, tree: &UnitTree, idx: usize) -> bool {
    let no_overlay = vec![false; doc.len()];
    tree.node(idx)
        .unit
        .span
        .body()
        .all(|line| !matches!(classify(doc, line, &no_overlay), LineClass::Meaningful { disabled: false }))
}
