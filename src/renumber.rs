//! Section renumbering.
//!
//! Surviving sections are numbered 1..K in document order. The new number
//! is written into the section opener and into every subsection label of
//! that section that embeds the section's original number.

use crate::collapse::CollapseSet;
use crate::document::Document;
use crate::model::{StructureIndex, UnitId};
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

static RE_HEADER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Section\s+)(\d+)(:)").unwrap());
static RE_LABEL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Section\s+)(\d+)(?:\.(\d+))?:").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenumberEntry {
    pub section: UnitId,
    pub old: u32,
    pub new: u32,
}

/// Original number → new number for every surviving section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenumberMap {
    entries: Vec<RenumberEntry>,
}

impl RenumberMap {
    pub fn build(index: &StructureIndex, collapsed: &CollapseSet) -> Self {
        let mut survivors: Vec<_> = index
            .sections
            .iter()
            .filter(|s| !collapsed.contains(&s.id()))
            .collect();
        survivors.sort_by_key(|s| s.span.start);
        let entries = survivors
            .into_iter()
            .zip(1u32..)
            .map(|(s, new)| RenumberEntry {
                section: s.id(),
                old: s.number,
                new,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RenumberEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sections whose number actually changes.
    pub fn changed(&self) -> usize {
        self.entries.iter().filter(|e| e.old != e.new).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenumberOutcome {
    pub headers: usize,
    pub labels: usize,
}

/// Rewrite section openers and their subsection labels.
pub fn apply(doc: &mut Document, index: &StructureIndex, map: &RenumberMap) -> RenumberOutcome {
    let mut outcome = RenumberOutcome::default();
    for entry in map.entries() {
        let Some(section) = index.section(entry.section) else { continue };

        let header = renumber_header(doc.text(section.span.start), entry.new);
        if doc.replace(section.span.start, header) {
            outcome.headers += 1;
        }

        for sub in &section.subsections {
            let line = sub.span.start;
            if let Some(label) = renumber_label(doc.text(line), entry.old, entry.new) {
                if doc.replace(line, label) {
                    outcome.labels += 1;
                }
            }
        }
        debug!(old = entry.old, new = entry.new, "renumbered section");
    }
    outcome
}

/// Replace the first `Section <N>:` number in an opener.
pub fn renumber_header(text: &str, new: u32) -> String {
    RE_HEADER_NUMBER
        .replace(text, |caps: &Captures| format!("{}{}{}", &caps[1], new, &caps[3]))
        .into_owned()
}

/// Rewrite the first `Section <N>[.<M>]:` label when `N` is `old`.
/// A bare `Section <N>:` becomes `Section <new>.1:`.
pub fn renumber_label(text: &str, old: u32, new: u32) -> Option<String> {
    let caps = RE_LABEL_NUMBER.captures(text)?;
    if caps[2].parse::<u32>().ok()? != old {
        return None;
    }
    let whole = caps.get(0)?;
    let sub = caps.get(3).map_or("1", |m| m.as_str());
    let rewritten = format!("{}{}.{}:", &caps[1], new, sub);
    Some(format!(
        "{}{}{}",
        &text[..whole.start()],
        rewritten,
        &text[whole.end()..]
    ))
}
