//! Structural index produced by the scanner.
//!
//! Units only hold line ranges into the [`Document`](crate::document::Document),
//! never copies of the text.

use serde::Serialize;

/// Inclusive `[start, end]` line range of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Opener line.
    pub start: usize,
    /// Closer line, or the last line the block reaches when it has no closer.
    pub end: usize,
    /// Whether `end` is a real closer (`fi`, `}`, `done`, `esac`, `;;`).
    pub closed: bool,
}

impl Span {
    pub fn new(start: usize, end: usize, closed: bool) -> Self {
        Self { start, end, closed }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Lines strictly between the opener and the closer. Blocks without a
    /// closer keep their last line in the body.
    pub fn body(&self) -> std::ops::RangeInclusive<usize> {
        let last = if self.closed { self.end.saturating_sub(1) } else { self.end };
        // empty range for one-line blocks
        (self.start + 1)..=last.max(self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Section,
    Subsection,
    Function,
    Loop,
    CaseStatement,
    CaseBranch,
}

impl UnitKind {
    /// Nesting rank used to order units that share a range.
    pub fn rank(self) -> u8 {
        match self {
            UnitKind::Section => 0,
            UnitKind::Subsection => 1,
            UnitKind::Function => 2,
            UnitKind::Loop => 3,
            UnitKind::CaseStatement => 4,
            UnitKind::CaseBranch => 5,
        }
    }
}

/// Stable identity of a unit: its kind plus its opener line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId {
    pub kind: UnitKind,
    pub start: usize,
}

impl UnitId {
    pub fn new(kind: UnitKind, start: usize) -> Self {
        Self { kind, start }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFamily {
    For,
    While,
    Until,
    Select,
    Case,
}

impl LoopFamily {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "for" => Some(LoopFamily::For),
            "while" => Some(LoopFamily::While),
            "until" => Some(LoopFamily::Until),
            "select" => Some(LoopFamily::Select),
            "case" => Some(LoopFamily::Case),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            LoopFamily::For => "for",
            LoopFamily::While => "while",
            LoopFamily::Until => "until",
            LoopFamily::Select => "select",
            LoopFamily::Case => "case",
        }
    }

    pub fn terminator(self) -> &'static str {
        match self {
            LoopFamily::Case => "esac",
            _ => "done",
        }
    }
}

/// A numbered top-level block: `if JobStep "Section N: ..."; then ... fi`.
#[derive(Debug, Clone)]
pub struct Section {
    pub number: u32,
    pub description: String,
    pub span: Span,
    pub subsections: Vec<Subsection>,
}

impl Section {
    pub fn id(&self) -> UnitId {
        UnitId::new(UnitKind::Section, self.span.start)
    }
}

/// A `SubStep "label"` marker inside a section. Has no closer.
#[derive(Debug, Clone)]
pub struct Subsection {
    pub label: String,
    pub span: Span,
}

impl Subsection {
    pub fn id(&self) -> UnitId {
        UnitId::new(UnitKind::Subsection, self.span.start)
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub span: Span,
}

impl Function {
    pub fn id(&self) -> UnitId {
        UnitId::new(UnitKind::Function, self.span.start)
    }
}

#[derive(Debug, Clone)]
pub struct Loop {
    pub family: LoopFamily,
    pub span: Span,
}

impl Loop {
    pub fn id(&self) -> UnitId {
        UnitId::new(UnitKind::Loop, self.span.start)
    }
}

#[derive(Debug, Clone)]
pub struct CaseStatement {
    pub span: Span,
    pub branches: Vec<CaseBranch>,
}

impl CaseStatement {
    pub fn id(&self) -> UnitId {
        UnitId::new(UnitKind::CaseStatement, self.span.start)
    }
}

#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub pattern: String,
    pub span: Span,
}

impl CaseBranch {
    pub fn id(&self) -> UnitId {
        UnitId::new(UnitKind::CaseBranch, self.span.start)
    }
}

/// Flattened view of any structural unit.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub span: Span,
    pub label: String,
}

/// Everything the scanner found, in document order per kind.
#[derive(Debug, Default, Clone)]
pub struct StructureIndex {
    pub sections: Vec<Section>,
    pub functions: Vec<Function>,
    /// All five loop families, `case` included.
    pub loops: Vec<Loop>,
    pub cases: Vec<CaseStatement>,
}

impl StructureIndex {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
            && self.functions.is_empty()
            && self.loops.is_empty()
            && self.cases.is_empty()
    }

    /// Every unit the editing phases operate on. Case-family loops are left
    /// out: the matching [`CaseStatement`] covers the same range and carries
    /// the branches.
    pub fn units(&self) -> Vec<Unit> {
        let mut units = Vec::new();
        for section in &self.sections {
            units.push(Unit {
                id: section.id(),
                span: section.span,
                label: format!("Section {}: {}", section.number, section.description),
            });
            for sub in &section.subsections {
                units.push(Unit {
                    id: sub.id(),
                    span: sub.span,
                    label: sub.label.clone(),
                });
            }
        }
        for func in &self.functions {
            units.push(Unit {
                id: func.id(),
                span: func.span,
                label: format!("function {}", func.name),
            });
        }
        for lp in self.loops.iter().filter(|l| l.family != LoopFamily::Case) {
            units.push(Unit {
                id: lp.id(),
                span: lp.span,
                label: format!("{} loop", lp.family.keyword()),
            });
        }
        for case in &self.cases {
            units.push(Unit {
                id: case.id(),
                span: case.span,
                label: "case statement".to_string(),
            });
            for branch in &case.branches {
                units.push(Unit {
                    id: branch.id(),
                    span: branch.span,
                    label: format!("case branch {}", branch.pattern),
                });
            }
        }
        units
    }

    pub fn section(&self, id: UnitId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == id)
    }
}
