//! In-memory line sequence edited by every pipeline phase.
//!
//! Lines are addressed by their index in the input; edits replace text in
//! place and never insert or remove lines, so unit ranges found by the
//! scanner stay valid for the whole run. The only insertion (the changelog
//! splice) happens when the final output is materialised.

/// A single line of the script.
#[derive(Debug, Clone)]
pub struct Line {
    text: String,
    /// Whether the line was comment-prefixed when the document was loaded.
    /// Never recomputed after edits.
    originally_commented: bool,
}

impl Line {
    fn new(text: String) -> Self {
        let originally_commented = is_comment(&text);
        Self {
            text,
            originally_commented,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn originally_commented(&self) -> bool {
        self.originally_commented
    }

    pub fn is_commented(&self) -> bool {
        is_comment(&self.text)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The whole script as an index-addressable line sequence.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<Line>,
    trailing_newline: bool,
    /// `\r\n` when the source used CRLF line endings.
    eol: &'static str,
}

impl Document {
    /// Split `source` into lines. The line ending of the first line and a
    /// final newline are remembered so that [`Document::join`] reproduces
    /// them.
    pub fn parse(source: &str) -> Self {
        let lines = source
            .lines()
            .map(|l| Line::new(l.to_string()))
            .collect();
        let eol = match source.find('\n') {
            Some(pos) if source[..pos].ends_with('\r') => "\r\n",
            _ => "\n",
        };
        Self {
            lines,
            trailing_newline: source.ends_with('\n'),
            eol,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, idx: usize) -> &Line {
        &self.lines[idx]
    }

    pub fn text(&self, idx: usize) -> &str {
        &self.lines[idx].text
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }

    pub fn trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    pub fn eol(&self) -> &'static str {
        self.eol
    }

    /// Join `lines` with this document's line ending and final newline.
    pub fn join(&self, lines: &[String], trailing_newline: bool) -> String {
        join_lines(lines, trailing_newline, self.eol)
    }

    /// Comment out line `idx`, keeping its indentation. Returns `false` when
    /// the line was already commented (or blank) and nothing changed.
    pub fn comment(&mut self, idx: usize, note: Option<&str>) -> bool {
        let line = &mut self.lines[idx];
        if line.is_commented() || line.is_blank() {
            return false;
        }
        line.text = comment_text(&line.text, note);
        true
    }

    /// Replace the text of line `idx`. Returns `true` when it changed.
    pub fn replace(&mut self, idx: usize, text: String) -> bool {
        let line = &mut self.lines[idx];
        if line.text == text {
            return false;
        }
        line.text = text;
        true
    }
}

/// True when the first non-blank character is `#`.
pub fn is_comment(text: &str) -> bool {
    text.trim_start().starts_with('#')
}

pub fn leading_whitespace(text: &str) -> &str {
    let content = text.trim_start();
    &text[..text.len() - content.len()]
}

/// `<indent># <content>[ -> note]`
pub fn comment_text(text: &str, note: Option<&str>) -> String {
    let indent = leading_whitespace(text);
    let content = text.trim_start().trim_end();
    match note {
        Some(note) if !note.is_empty() => format!("{indent}# {content} -> {note}"),
        _ => format!("{indent}# {content}"),
    }
}

/// Join lines back into a file body.
pub fn join_lines(lines: &[String], trailing_newline: bool, eol: &str) -> String {
    let mut out = lines.join(eol);
    if trailing_newline && !lines.is_empty() {
        out.push_str(eol);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_preserves_indent() {
        assert_eq!(comment_text("    rm -rf /tmp/x", None), "    # rm -rf /tmp/x");
        assert_eq!(comment_text("\techo hi", None), "\t# echo hi");
    }

    #[test]
    fn comment_with_note() {
        assert_eq!(
            comment_text("  echo hi", Some("commented due to migration")),
            "  # echo hi -> commented due to migration"
        );
    }

    #[test]
    fn comment_is_idempotent() {
        let mut doc = Document::parse("  echo hi\n");
        assert!(doc.comment(0, None));
        let once = doc.text(0).to_string();
        assert!(!doc.comment(0, None));
        assert_eq!(doc.text(0), once);
    }

    #[test]
    fn blank_lines_are_never_commented() {
        let mut doc = Document::parse("\n   \n");
        assert!(!doc.comment(0, None));
        assert!(!doc.comment(1, None));
    }

    #[test]
    fn original_comment_flag_survives_edits() {
        let mut doc = Document::parse("echo a\n# doc\n");
        doc.comment(0, None);
        assert!(doc.line(0).is_commented());
        assert!(!doc.line(0).originally_commented());
        assert!(doc.line(1).originally_commented());
    }

    #[test]
    fn trailing_newline_roundtrip() {
        let doc = Document::parse("a\nb\n");
        assert_eq!(doc.join(&doc.texts(), doc.trailing_newline()), "a\nb\n");
        let doc = Document::parse("a\nb");
        assert_eq!(doc.join(&doc.texts(), doc.trailing_newline()), "a\nb");
    }

    #[test]
    fn crlf_line_endings_survive() {
        let mut doc = Document::parse("if x; then\r\n  run_a\r\nfi\r\n");
        assert_eq!(doc.eol(), "\r\n");
        assert_eq!(doc.text(1), "  run_a");
        doc.comment(1, None);
        assert_eq!(
            doc.join(&doc.texts(), doc.trailing_newline()),
            "if x; then\r\n  # run_a\r\nfi\r\n"
        );
    }
}
