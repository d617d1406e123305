//! Indentation normalisation for the edited script.
//!
//! Block openers and closers keep the text they were written with; lines
//! between them are re-indented relative to the innermost open block.

use crate::document::{is_comment, leading_whitespace};
use crate::grammar::{
    self, RE_CASE, RE_CLOSE_BRACE, RE_DONE, RE_ELSE, RE_ESAC, RE_FI, RE_IF, RE_INLINE_FI,
    RE_OPEN_BRACE,
};
use crate::model::LoopFamily;

/// Rewrites indentation of a finished line sequence.
pub trait Reindent {
    fn reindent(&self, lines: &[String]) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    If,
    Loop,
    Case,
    Branch,
    Function,
}

struct Frame {
    kind: FrameKind,
    /// Indentation given to body lines.
    body: String,
}

/// Stack-based indenter using `unit` spaces per level.
#[derive(Debug, Clone, Copy)]
pub struct BlockIndenter {
    pub unit: usize,
}

impl Default for BlockIndenter {
    fn default() -> Self {
        Self { unit: 4 }
    }
}

impl BlockIndenter {
    fn open(&self, stack: &mut Vec<Frame>, kind: FrameKind, base: &str) {
        let body = format!("{base}{}", " ".repeat(self.unit));
        stack.push(Frame { kind, body });
    }

    fn pop_to(stack: &mut Vec<Frame>, kind: FrameKind) {
        if let Some(pos) = stack.iter().rposition(|f| f.kind == kind) {
            stack.truncate(pos);
        }
    }

    fn in_case(stack: &[Frame]) -> bool {
        matches!(stack.last().map(|f| f.kind), Some(FrameKind::Case | FrameKind::Branch))
    }

    /// Returns `true` when the line is structure and keeps its text.
    fn structure(&self, stack: &mut Vec<Frame>, text: &str) -> bool {
        let indent = leading_whitespace(text);

        if RE_FI.is_match(text) {
            Self::pop_to(stack, FrameKind::If);
            return true;
        }
        if RE_DONE.is_match(text) {
            Self::pop_to(stack, FrameKind::Loop);
            return true;
        }
        if RE_ESAC.is_match(text) {
            Self::pop_to(stack, FrameKind::Case);
            return true;
        }
        if RE_CLOSE_BRACE.is_match(text) {
            Self::pop_to(stack, FrameKind::Function);
            return true;
        }
        if RE_ELSE.is_match(text) || RE_OPEN_BRACE.is_match(text) {
            return true;
        }

        if Self::in_case(stack) {
            if grammar::is_branch_end(text) {
                Self::pop_to(stack, FrameKind::Branch);
                return true;
            }
            if grammar::is_branch_header(text) {
                Self::pop_to(stack, FrameKind::Branch);
                let base = stack.last().map_or(String::new(), |f| f.body.clone());
                self.open(stack, FrameKind::Branch, &base);
                return true;
            }
        }

        if RE_IF.is_match(text) {
            if !RE_INLINE_FI.is_match(text) {
                self.open(stack, FrameKind::If, indent);
            }
            return true;
        }
        if RE_CASE.is_match(text) {
            if !grammar::loop_closes_inline(LoopFamily::Case, text) {
                self.open(stack, FrameKind::Case, indent);
            }
            return true;
        }
        if let Some(family) = grammar::loop_opener(text) {
            if !grammar::loop_closes_inline(family, text) {
                self.open(stack, FrameKind::Loop, indent);
            }
            return true;
        }
        if grammar::function_name(text).is_some() {
            self.open(stack, FrameKind::Function, indent);
            return true;
        }
        false
    }
}

impl Reindent for BlockIndenter {
    fn reindent(&self, lines: &[String]) -> Vec<String> {
        let mut stack: Vec<Frame> = Vec::new();
        lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    return line.clone();
                }
                if !is_comment(line) && self.structure(&mut stack, line) {
                    return line.clone();
                }
                match stack.last() {
                    Some(frame) => format!("{}{}", frame.body, line.trim_start()),
                    None => line.clone(),
                }
            })
            .collect()
    }
}
