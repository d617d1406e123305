//! Block grammar for structured job scripts.
//!
//! One declarative table maps each block family to its opener signature and
//! its termination policy. The scanner walks the table instead of carrying a
//! hand-written loop per construct, and the indenter reuses the same
//! signatures.

use crate::model::LoopFamily;
use regex::Regex;
use std::sync::LazyLock;

// -- Signatures ---------------------------------------------------------------

/// `if JobStep "Section 12: Load staging tables"; then`
pub(crate) static RE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*if\s+JobStep\s+"Section\s+(\d+):\s*([^"]*)""#).unwrap()
});
/// `SubStep "Section 12.3: Refresh views"`
pub(crate) static RE_SUBSTEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^\s*(?:Job)?SubStep\s+"([^"]*)""#).unwrap());

pub(crate) static RE_IF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*if\b").unwrap());
pub(crate) static RE_INLINE_FI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";\s*fi\b").unwrap());
pub(crate) static RE_FI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*fi\b\s*(?:[;#&|<>].*)?$").unwrap());
pub(crate) static RE_ELSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:elif|else)\b").unwrap());

/// `name() {`, `name()`, `function name {`, `function name() {`
pub(crate) static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:function\s+([A-Za-z_][\w:.-]*)\s*(?:\(\s*\))?",
        r"|([A-Za-z_][\w:.-]*)\s*\(\s*\))",
        r"\s*\{?\s*$"
    ))
    .unwrap()
});
pub(crate) static RE_CLOSE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\}\s*;?\s*$").unwrap());
pub(crate) static RE_OPEN_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\{\s*$").unwrap());

pub(crate) static RE_LOOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(for|while|until|select|case)\b").unwrap());
pub(crate) static RE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*case\b").unwrap());
pub(crate) static RE_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*done\b").unwrap());
pub(crate) static RE_ESAC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*esac\b").unwrap());
static RE_INLINE_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";\s*done\b").unwrap());
static RE_INLINE_ESAC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\sesac\b").unwrap());

/// A bare case pattern: `start)`, `(stop)`, `*)`, `a|b)`.
pub(crate) static RE_BRANCH_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(?\s*[^()\s#][^()]*\)\s*$").unwrap());
pub(crate) static RE_BRANCH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:;;&|;;|;&)\s*$").unwrap());

static RE_TRIVIAL_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*return(?:\s+(?:\d+|\$\?))?\s*;?\s*$").unwrap());
static RE_NOISE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:do|then|else|\{|\})\s*;?\s*$").unwrap());

// -- Grammar table ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Section,
    Function,
    Loop,
    Case,
}

/// How a block finds its closer once its opener has matched.
#[derive(Debug)]
pub enum Nesting {
    /// Depth counter over same-family openers and closers.
    Balanced {
        nested: &'static Regex,
        /// Opener lines that also close on the same line (`if x; then y; fi`).
        inline_close: &'static Regex,
        closer: &'static Regex,
    },
    /// One counter shared across every loop family. Only the opener's own
    /// terminator may bring the counter from one to zero.
    SharedLoop,
    /// No depth tracking: the first closer wins, and the block ends on the
    /// line before any interrupting opener.
    SingleLevel {
        closer: &'static Regex,
        interrupts: [&'static Regex; 2],
    },
}

#[derive(Debug)]
pub struct BlockRule {
    pub kind: BlockKind,
    pub opener: &'static Regex,
    pub nesting: Nesting,
}

pub static GRAMMAR: LazyLock<[BlockRule; 4]> = LazyLock::new(|| {
    [
        BlockRule {
            kind: BlockKind::Section,
            opener: &RE_SECTION,
            nesting: Nesting::Balanced {
                nested: &RE_IF,
                inline_close: &RE_INLINE_FI,
                closer: &RE_FI,
            },
        },
        BlockRule {
            kind: BlockKind::Function,
            opener: &RE_FUNCTION,
            nesting: Nesting::SingleLevel {
                closer: &RE_CLOSE_BRACE,
                interrupts: [&RE_FUNCTION, &RE_SECTION],
            },
        },
        BlockRule {
            kind: BlockKind::Loop,
            opener: &RE_LOOP,
            nesting: Nesting::SharedLoop,
        },
        BlockRule {
            kind: BlockKind::Case,
            opener: &RE_CASE,
            nesting: Nesting::Balanced {
                nested: &RE_CASE,
                inline_close: &RE_INLINE_ESAC,
                closer: &RE_ESAC,
            },
        },
    ]
});

pub fn rule(kind: BlockKind) -> &'static BlockRule {
    GRAMMAR
        .iter()
        .find(|r| r.kind == kind)
        .unwrap_or_else(|| unreachable!("every block kind has a grammar rule"))
}

// -- Classifiers --------------------------------------------------------------

/// Loop family opened by `text`, if any.
pub fn loop_opener(text: &str) -> Option<LoopFamily> {
    RE_LOOP
        .captures(text)
        .and_then(|caps| LoopFamily::from_keyword(&caps[1]))
}

/// Terminator family closed by `text`: `done` or `esac`.
pub fn loop_terminator(text: &str) -> Option<&'static str> {
    if RE_DONE.is_match(text) {
        Some("done")
    } else if RE_ESAC.is_match(text) {
        Some("esac")
    } else {
        None
    }
}

/// True when a loop opener line also carries its own terminator.
pub fn loop_closes_inline(family: LoopFamily, text: &str) -> bool {
    match family {
        LoopFamily::Case => RE_INLINE_ESAC.is_match(text),
        _ => RE_INLINE_DONE.is_match(text),
    }
}

pub fn is_branch_header(text: &str) -> bool {
    RE_BRANCH_HEADER.is_match(text)
}

pub fn is_branch_end(text: &str) -> bool {
    RE_BRANCH_END.is_match(text)
}

pub fn is_subsection_marker(text: &str) -> bool {
    RE_SUBSTEP.is_match(text)
}

/// Lines that carry structure but no work: terminators, bare branch
/// patterns, subsection markers, braces, `do`/`then`/`else`, trivial returns.
pub fn is_structural_noise(text: &str) -> bool {
    loop_terminator(text).is_some()
        || is_branch_end(text)
        || is_branch_header(text)
        || is_subsection_marker(text)
        || RE_NOISE_KEYWORD.is_match(text)
        || RE_TRIVIAL_RETURN.is_match(text)
}

/// Name declared by a function opener line.
pub fn function_name(text: &str) -> Option<String> {
    let caps = RE_FUNCTION.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_opener() {
        let caps = RE_SECTION
            .captures(r#"if JobStep "Section 12: Load staging"; then"#)
            .unwrap();
        assert_eq!(&caps[1], "12");
        assert_eq!(&caps[2], "Load staging");
        assert!(RE_SECTION.is_match(r#"  IF jobstep "section 3:x"; then"#));
        assert!(!RE_SECTION.is_match(r#"# if JobStep "Section 3: x"; then"#));
    }

    #[test]
    fn fi_closer() {
        assert!(RE_FI.is_match("fi"));
        assert!(RE_FI.is_match("  fi;"));
        assert!(RE_FI.is_match("fi # end section"));
        assert!(!RE_FI.is_match("file=1"));
        assert!(!RE_FI.is_match("# fi"));
    }

    #[test]
    fn function_openers() {
        assert_eq!(function_name("load_data() {").as_deref(), Some("load_data"));
        assert_eq!(function_name("function cleanup {").as_deref(), Some("cleanup"));
        assert_eq!(function_name("function ns::run() {").as_deref(), Some("ns::run"));
        assert_eq!(function_name("main()").as_deref(), Some("main"));
        assert!(function_name("foo() { echo hi; }").is_none());
        assert!(function_name("echo foo").is_none());
    }

    #[test]
    fn loop_signatures() {
        assert_eq!(loop_opener("for f in *.csv; do"), Some(LoopFamily::For));
        assert_eq!(loop_opener("  while read -r line; do"), Some(LoopFamily::While));
        assert_eq!(loop_opener(r#"case "$1" in"#), Some(LoopFamily::Case));
        assert_eq!(loop_opener("format=csv"), None);
        assert_eq!(loop_terminator("done < input.txt"), Some("done"));
        assert_eq!(loop_terminator("  esac"), Some("esac"));
        assert_eq!(loop_terminator("donename=1"), None);
    }

    #[test]
    fn inline_loops() {
        assert!(loop_closes_inline(LoopFamily::For, "for i in 1 2; do echo $i; done"));
        assert!(!loop_closes_inline(LoopFamily::For, "for i in 1 2; do"));
        assert!(loop_closes_inline(LoopFamily::Case, "case $x in a) y;; esac"));
    }

    #[test]
    fn branch_patterns() {
        assert!(is_branch_header("  start)"));
        assert!(is_branch_header("  (stop)"));
        assert!(is_branch_header("  *)"));
        assert!(is_branch_header("  a|b)"));
        assert!(!is_branch_header("  )"));
        assert!(!is_branch_header("  start) echo hi ;;"));
        assert!(!is_branch_header("  x=$(date)"));
        assert!(is_branch_end("    ;;"));
        assert!(is_branch_end(";&"));
        assert!(is_branch_end(";;&"));
        assert!(!is_branch_end("echo ;;"));
    }

    #[test]
    fn noise_lines() {
        for line in ["done", "  esac", "    ;;", "}", "do", "then", "return", "return 0", "return $?", "  start)", r#"SubStep "Section 1.1: x""#] {
            assert!(is_structural_noise(line), "{line} should be noise");
        }
        for line in ["echo hi", "return $rc", "rm -f x", "fi"] {
            assert!(!is_structural_noise(line), "{line} should be meaningful");
        }
    }

    #[test]
    fn every_kind_has_a_rule() {
        for kind in [BlockKind::Section, BlockKind::Function, BlockKind::Loop, BlockKind::Case] {
            assert_eq!(rule(kind).kind, kind);
        }
    }
}
