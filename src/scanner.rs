//! Structural scanner: one pass per grammar rule over the document.
//!
//! Unterminated blocks never fail: they close on the last line of the
//! document (or, for subsections and case branches, on the last line of
//! their parent's body).

use crate::document::Document;
use crate::grammar::{self, BlockKind, BlockRule, Nesting};
use crate::model::*;
use tracing::debug;

/// Build the structural index of `doc`.
pub fn scan(doc: &Document) -> StructureIndex {
    let index = StructureIndex {
        sections: scan_sections(doc),
        functions: scan_functions(doc),
        loops: scan_loops(doc),
        cases: scan_cases(doc),
    };
    debug!(
        sections = index.sections.len(),
        functions = index.functions.len(),
        loops = index.loops.len(),
        cases = index.cases.len(),
        "scan complete"
    );
    index
}

// -- Generic closer search ----------------------------------------------------

/// Lines the recognisers look at: anything not comment-prefixed.
fn code(doc: &Document, idx: usize) -> Option<&str> {
    let line = doc.line(idx);
    if line.is_commented() {
        None
    } else {
        Some(line.text())
    }
}

/// Find the closer of the block whose opener sits on `start`.
fn close_block(doc: &Document, start: usize, rule: &BlockRule, family: Option<LoopFamily>) -> Span {
    let last = doc.len().saturating_sub(1);
    match &rule.nesting {
        Nesting::Balanced {
            nested,
            inline_close,
            closer,
        } => {
            if inline_close.is_match(doc.text(start)) {
                return Span::new(start, start, true);
            }
            let mut depth = 1usize;
            for i in start + 1..doc.len() {
                let Some(text) = code(doc, i) else { continue };
                if closer.is_match(text) {
                    depth -= 1;
                    if depth == 0 {
                        return Span::new(start, i, true);
                    }
                } else if nested.is_match(text) && !inline_close.is_match(text) {
                    depth += 1;
                }
            }
        }
        Nesting::SharedLoop => {
            let own = family.unwrap_or(LoopFamily::For);
            if grammar::loop_closes_inline(own, doc.text(start)) {
                return Span::new(start, start, true);
            }
            let mut depth = 1usize;
            for i in start + 1..doc.len() {
                let Some(text) = code(doc, i) else { continue };
                if let Some(term) = grammar::loop_terminator(text) {
                    if depth == 1 && term != own.terminator() {
                        // stray terminator of another family
                        continue;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return Span::new(start, i, true);
                    }
                } else if let Some(nested) = grammar::loop_opener(text) {
                    if !grammar::loop_closes_inline(nested, text) {
                        depth += 1;
                    }
                }
            }
        }
        Nesting::SingleLevel { closer, interrupts } => {
            for i in start + 1..doc.len() {
                let Some(text) = code(doc, i) else { continue };
                if closer.is_match(text) {
                    return Span::new(start, i, true);
                }
                if interrupts.iter().any(|re| re.is_match(text)) {
                    return Span::new(start, i - 1, false);
                }
            }
        }
    }
    Span::new(start, last.max(start), false)
}

/// Opener lines of `rule` in document order.
fn openers<'d>(doc: &'d Document, rule: &'d BlockRule) -> impl Iterator<Item = usize> + 'd {
    (0..doc.len()).filter(move |&i| code(doc, i).is_some_and(|t| rule.opener.is_match(t)))
}

// -- Sections -----------------------------------------------------------------

fn scan_sections(doc: &Document) -> Vec<Section> {
    let rule = grammar::rule(BlockKind::Section);
    let mut sections = Vec::new();
    for start in openers(doc, rule) {
        let Some(caps) = rule.opener.captures(doc.text(start)) else { continue };
        let Ok(number) = caps[1].parse::<u32>() else { continue };
        let description = caps[2].trim().to_string();
        let span = close_block(doc, start, rule, None);
        let subsections = scan_subsections(doc, span);
        debug!(number, start, end = span.end, closed = span.closed, "section");
        sections.push(Section {
            number,
            description,
            span,
            subsections,
        });
    }
    sections
}

/// Markers inside the section body; each runs to the line before the next
/// marker, the last one to the section's last body line.
fn scan_subsections(doc: &Document, section: Span) -> Vec<Subsection> {
    let body = section.body();
    if body.is_empty() {
        return Vec::new();
    }
    let body_end = *body.end();
    let markers: Vec<(usize, String)> = body
        .filter_map(|i| {
            let text = code(doc, i)?;
            let caps = grammar::RE_SUBSTEP.captures(text)?;
            Some((i, caps[1].to_string()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(n, (start, label))| {
            let end = markers.get(n + 1).map_or(body_end, |(next, _)| next - 1);
            Subsection {
                label: label.clone(),
                span: Span::new(*start, end, false),
            }
        })
        .collect()
}

// -- Functions ----------------------------------------------------------------

fn scan_functions(doc: &Document) -> Vec<Function> {
    let rule = grammar::rule(BlockKind::Function);
    openers(doc, rule)
        .filter_map(|start| {
            let name = grammar::function_name(doc.text(start))?;
            let span = close_block(doc, start, rule, None);
            debug!(name = name.as_str(), start, end = span.end, closed = span.closed, "function");
            Some(Function { name, span })
        })
        .collect()
}

// -- Loops --------------------------------------------------------------------

fn scan_loops(doc: &Document) -> Vec<Loop> {
    let rule = grammar::rule(BlockKind::Loop);
    openers(doc, rule)
        .filter_map(|start| {
            let family = grammar::loop_opener(doc.text(start))?;
            let span = close_block(doc, start, rule, Some(family));
            debug!(family = family.keyword(), start, end = span.end, "loop");
            Some(Loop { family, span })
        })
        .collect()
}

// -- Case statements ----------------------------------------------------------

fn scan_cases(doc: &Document) -> Vec<CaseStatement> {
    let rule = grammar::rule(BlockKind::Case);
    openers(doc, rule)
        .map(|start| {
            let span = close_block(doc, start, rule, None);
            let branches = scan_branches(doc, span);
            debug!(start, end = span.end, branches = branches.len(), "case statement");
            CaseStatement { span, branches }
        })
        .collect()
}

/// Branch headers and terminators at this case's own depth.
fn scan_branches(doc: &Document, case: Span) -> Vec<CaseBranch> {
    let body = case.body();
    if body.is_empty() {
        return Vec::new();
    }
    let body_end = *body.end();
    let mut branches = Vec::new();
    let mut open: Option<(usize, String)> = None;
    let mut depth = 0usize;

    for i in body {
        let Some(text) = code(doc, i) else { continue };
        if depth > 0 {
            if grammar::RE_ESAC.is_match(text) {
                depth -= 1;
            } else if grammar::RE_CASE.is_match(text) && !grammar::loop_closes_inline(LoopFamily::Case, text) {
                depth += 1;
            }
            continue;
        }
        if grammar::RE_CASE.is_match(text) && !grammar::loop_closes_inline(LoopFamily::Case, text) {
            depth += 1;
        } else if grammar::is_branch_end(text) {
            if let Some((start, pattern)) = open.take() {
                branches.push(CaseBranch {
                    pattern,
                    span: Span::new(start, i, true),
                });
            }
        } else if grammar::is_branch_header(text) {
            if let Some((start, pattern)) = open.take() {
                branches.push(CaseBranch {
                    pattern,
                    span: Span::new(start, i - 1, false),
                });
            }
            open = Some((i, text.trim().to_string()));
        }
    }
    if let Some((start, pattern)) = open {
        branches.push(CaseBranch {
            pattern,
            span: Span::new(start, body_end, false),
        });
    }
    branches
}
