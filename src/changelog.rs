//! Changelog report and its insertion point.
//!
//! The report is a pure function of the facts recorded by the earlier
//! phases. Where it goes is a best-effort guess made against the finished
//! line sequence; splicing happens once, when the output is materialised.

use crate::collapse::CollapseSet;
use crate::commenter::KeywordMatch;
use crate::grammar;
use crate::keywords::Keywords;
use crate::model::{StructureIndex, UnitId, UnitKind};
use crate::renumber::RenumberMap;
use crate::substitute::SubstitutionTable;
use crate::tree::UnitTree;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

pub const HEADER: &str = "# ===== CHANGELOG SUMMARY =====";
pub const FOOTER: &str = "# ===== END OF CHANGELOG =====";
pub const NO_MODIFICATIONS: &str = "# No lines matched the keywords; no modifications were made.";

static RE_BEGIN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#\s*BEGIN\s+CHANGELOG\b").unwrap());
static RE_END_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#\s*END\s+CHANGELOG\b").unwrap());
/// First statements that mean the documentation block is over.
static RE_EXEC_BEGINS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:(?:set|shopt|trap|umask|export|readonly|declare|source|cd|if|main)\b",
        r"|\.\s",
        r"|[A-Za-z_][A-Za-z0-9_]*=)"
    ))
    .unwrap()
});

/// Without a better anchor, insert after the shebang.
const FALLBACK_OFFSET: usize = 1;

/// Everything the report is built from.
pub struct ChangelogFacts<'a> {
    pub keywords: &'a Keywords,
    pub matches: &'a [KeywordMatch],
    pub modified: &'a BTreeSet<UnitId>,
    pub collapsed: &'a CollapseSet,
    pub renumber: &'a RenumberMap,
    pub substitutions: usize,
    pub table: &'a SubstitutionTable,
    pub index: &'a StructureIndex,
    pub tree: &'a UnitTree,
}

impl ChangelogFacts<'_> {
    fn label(&self, id: UnitId) -> String {
        self.tree
            .find(id)
            .map(|i| self.tree.node(i).unit.label.clone())
            .unwrap_or_else(|| format!("{:?}", id.kind))
    }

    /// Section enclosing the unit a match was logged against.
    fn owning_section(&self, unit: UnitId) -> Option<UnitId> {
        let idx = self.tree.find(unit)?;
        self.tree
            .ancestors(idx)
            .map(|i| self.tree.node(i).unit.id)
            .find(|id| id.kind == UnitKind::Section)
    }

    /// A collapsed unit worth listing: its parent did not collapse with it.
    fn is_collapse_root(&self, id: UnitId) -> bool {
        let Some(idx) = self.tree.find(id) else { return false };
        match self.tree.node(idx).parent {
            Some(parent) => !self.collapsed.contains(&self.tree.node(parent).unit.id),
            None => true,
        }
    }
}

/// Render the report. Every line is a shell comment.
pub fn build(facts: &ChangelogFacts) -> Vec<String> {
    let mut out = vec![HEADER.to_string()];
    let keywords: Vec<&str> = facts.keywords.iter().collect();
    out.push(format!("# Keywords: {}", keywords.join(", ")));
    out.push("#".to_string());

    if facts.matches.is_empty() {
        out.push(NO_MODIFICATIONS.to_string());
    } else {
        out.push(format!(
            "# Lines commented out due to keywords: {}",
            facts.matches.len()
        ));
        report_modified_sections(facts, &mut out);
        report_modified_blocks(facts, &mut out);
        report_collapsed(facts, &mut out);
    }
    report_renumbering(facts, &mut out);
    report_substitutions(facts, &mut out);

    out.push(FOOTER.to_string());
    out
}

fn report_modified_sections(facts: &ChangelogFacts, out: &mut Vec<String>) {
    let mut per_section: BTreeMap<usize, BTreeMap<&str, usize>> = BTreeMap::new();
    for m in facts.matches {
        if let Some(section) = facts.owning_section(m.unit) {
            *per_section
                .entry(section.start)
                .or_default()
                .entry(m.keyword.as_str())
                .or_default() += 1;
        }
    }
    let active: Vec<_> = facts
        .index
        .sections
        .iter()
        .filter(|s| !facts.collapsed.contains(&s.id()))
        .filter_map(|s| per_section.get(&s.span.start).map(|kws| (s, kws)))
        .collect();
    if active.is_empty() {
        return;
    }
    out.push("# Sections with keyword-based commenting:".to_string());
    for (section, kws) in active {
        let hits: Vec<String> = kws.iter().map(|(kw, n)| format!("'{kw}' x{n}")).collect();
        out.push(format!(
            "#   - Section {} (line {}): {}",
            section.number,
            section.span.start + 1,
            hits.join(", ")
        ));
    }
}

fn report_modified_blocks(facts: &ChangelogFacts, out: &mut Vec<String>) {
    let blocks: Vec<UnitId> = facts
        .modified
        .iter()
        .filter(|id| !matches!(id.kind, UnitKind::Section | UnitKind::Subsection))
        .filter(|id| !facts.collapsed.contains(id))
        .copied()
        .collect();
    if blocks.is_empty() {
        return;
    }
    out.push("# Other blocks with keyword-based commenting:".to_string());
    for id in blocks {
        out.push(format!("#   - {} (line {})", facts.label(id), id.start + 1));
    }
}

fn report_collapsed(facts: &ChangelogFacts, out: &mut Vec<String>) {
    let sections: Vec<_> = facts
        .index
        .sections
        .iter()
        .filter(|s| facts.collapsed.contains(&s.id()))
        .collect();
    if !sections.is_empty() {
        out.push("# Sections fully commented-out and removed:".to_string());
        for s in sections {
            out.push(format!(
                "#   - Original Section {} (line {}): {}",
                s.number,
                s.span.start + 1,
                s.description
            ));
        }
    }

    let blocks: Vec<UnitId> = facts
        .collapsed
        .iter()
        .filter(|id| !matches!(id.kind, UnitKind::Section | UnitKind::Subsection))
        .filter(|id| facts.is_collapse_root(**id))
        .copied()
        .collect();
    if !blocks.is_empty() {
        out.push("# Other blocks fully commented-out:".to_string());
        for id in blocks {
            out.push(format!("#   - {} (line {})", facts.label(id), id.start + 1));
        }
    }
}

fn report_renumbering(facts: &ChangelogFacts, out: &mut Vec<String>) {
    if facts.renumber.is_empty() {
        return;
    }
    if facts.renumber.changed() == 0 {
        out.push("# Section numbering unchanged.".to_string());
        return;
    }
    out.push("# Renumbering applied to remaining sections:".to_string());
    for entry in facts.renumber.entries() {
        out.push(format!("#   - Section {} -> {}", entry.old, entry.new));
    }
}

fn report_substitutions(facts: &ChangelogFacts, out: &mut Vec<String>) {
    let rules: Vec<String> = facts
        .table
        .rules()
        .map(|(from, to)| format!("'{from}' -> '{to}'"))
        .collect();
    if rules.is_empty() {
        return;
    }
    out.push(format!(
        "# Global replacements: {} ({})",
        facts.substitutions,
        rules.join(", ")
    ));
}

// -- Placement ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Replace the lines strictly between an existing marker pair.
    BetweenMarkers { begin: usize, end: usize },
    /// Insert before this line.
    Before(usize),
}

/// Choose where the report goes in `lines`.
pub fn locate(lines: &[String]) -> Placement {
    if let Some(begin) = lines.iter().position(|l| RE_BEGIN_MARKER.is_match(l)) {
        if let Some(offset) = lines[begin + 1..].iter().position(|l| RE_END_MARKER.is_match(l)) {
            return Placement::BetweenMarkers {
                begin,
                end: begin + 1 + offset,
            };
        }
    }

    let first_code = lines
        .iter()
        .position(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'));
    if let Some(idx) = first_code {
        let text = &lines[idx];
        if RE_EXEC_BEGINS.is_match(text) || grammar::RE_FUNCTION.is_match(text) {
            return Placement::Before(idx);
        }
    }

    let offset = if lines.first().is_some_and(|l| l.starts_with("#!")) {
        FALLBACK_OFFSET
    } else {
        0
    };
    Placement::Before(offset.min(lines.len()))
}

/// Materialise `lines` with the report spliced in.
pub fn splice(lines: &[String], placement: Placement, report: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + report.len() + 1);
    match placement {
        Placement::BetweenMarkers { begin, end } => {
            out.extend_from_slice(&lines[..=begin]);
            out.extend_from_slice(report);
            out.extend_from_slice(&lines[end..]);
        }
        Placement::Before(idx) => {
            out.extend_from_slice(&lines[..idx]);
            out.extend_from_slice(report);
            out.push(String::new());
            out.extend_from_slice(&lines[idx..]);
        }
    }
    out
}
