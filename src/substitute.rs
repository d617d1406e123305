//! Global literal substitution, independent of block structure.

use crate::document::Document;
use crate::error::EditError;
use tracing::{debug, warn};

/// Rules applied when the caller does not supply a table.
pub const DEFAULT_RULES: [(&str, &str); 4] = [
    ("_bdi_", "_war_"),
    ("_bdi", "_war"),
    ("bdi_", "war_"),
    ("bdi", "war"),
];

/// Upper bound on passes over one line before giving up on a fixed point.
const MAX_PASSES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionTable {
    /// Sorted longest pattern first.
    rules: Vec<(String, String)>,
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        // the default rules satisfy every check in `new`
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl SubstitutionTable {
    /// Validate and order a rule list. Patterns must be non-empty and no
    /// replacement may contain any pattern on its own. Triggers formed
    /// together with neighbouring text are handled by [`Self::apply_line`].
    pub fn new<I, S, T>(rules: I) -> Result<Self, EditError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut rules: Vec<(String, String)> =
            rules.into_iter().map(|(f, t)| (f.into(), t.into())).collect();
        for (from, to) in &rules {
            if from.is_empty() {
                return Err(EditError::InvalidSubstitution {
                    from: from.clone(),
                    to: to.clone(),
                    reason: "empty pattern",
                });
            }
        }
        for (from, to) in &rules {
            if rules.iter().any(|(trigger, _)| to.contains(trigger.as_str())) {
                return Err(EditError::InvalidSubstitution {
                    from: from.clone(),
                    to: to.clone(),
                    reason: "replacement contains a trigger pattern",
                });
            }
        }
        rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Ok(Self { rules })
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    /// Rewrite one line until no rule matches, returning the new text and
    /// the number of occurrences replaced. The result is a fixed point, so a
    /// second application changes nothing.
    pub fn apply_line(&self, text: &str) -> (String, usize) {
        let mut line = text.to_string();
        let mut count = 0;
        for _ in 0..MAX_PASSES {
            let (next, hits) = self.pass(&line);
            if hits == 0 {
                return (line, count);
            }
            line = next;
            count += hits;
        }
        warn!(line = text, "substitution did not settle");
        (line, count)
    }

    /// One longest-first pass over every rule.
    fn pass(&self, text: &str) -> (String, usize) {
        let mut line = text.to_string();
        let mut count = 0;
        for (from, to) in &self.rules {
            let hits = line.matches(from.as_str()).count();
            if hits > 0 {
                line = line.replace(from.as_str(), to);
                count += hits;
            }
        }
        (line, count)
    }

    /// Apply to every line of the document. Returns the number of
    /// occurrences replaced.
    pub fn apply(&self, doc: &mut Document) -> usize {
        let mut total = 0;
        for idx in 0..doc.len() {
            let (text, count) = self.apply_line(doc.text(idx));
            if count > 0 {
                doc.replace(idx, text);
                total += count;
            }
        }
        debug!(replacements = total, "global substitution");
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_rewrite_all_variants() {
        let table = SubstitutionTable::default();
        assert_eq!(table.apply_line("load_bdi_feed").0, "load_war_feed");
        assert_eq!(table.apply_line("run_bdi").0, "run_war");
        assert_eq!(table.apply_line("bdi_run").0, "war_run");
        assert_eq!(table.apply_line("bdi").0, "war");
        assert_eq!(table.apply_line("x_bdi_y bdi").1, 2);
    }

    #[test]
    fn untouched_lines_stay_identical() {
        let mut doc = Document::parse("echo hello\nrun_bdi\n");
        let n = SubstitutionTable::default().apply(&mut doc);
        assert_eq!(n, 1);
        assert_eq!(doc.text(0), "echo hello");
        assert_eq!(doc.text(1), "run_war");
    }

    #[test]
    fn no_trigger_survives_and_second_pass_is_a_no_op() {
        let mut doc = Document::parse("a_bdi_b bdi_ _bdi bdibdi\n");
        let table = SubstitutionTable::default();
        table.apply(&mut doc);
        let once = doc.texts();
        for (from, _) in table.rules() {
            assert!(!once[0].contains(from), "{from} left in {}", once[0]);
        }
        assert_eq!(table.apply(&mut doc), 0);
        assert_eq!(doc.texts(), once);
    }

    #[test]
    fn rules_are_sorted_longest_first() {
        let table = SubstitutionTable::new([("ab", "x"), ("abcd", "y")]).unwrap();
        let froms: Vec<&str> = table.rules().map(|(f, _)| f).collect();
        assert_eq!(froms, vec!["abcd", "ab"]);
    }

    #[test]
    fn self_triggering_rule_is_rejected() {
        let err = SubstitutionTable::new([("bdi", "bdi2")]).unwrap_err();
        assert!(matches!(err, EditError::InvalidSubstitution { .. }));
        assert!(SubstitutionTable::new([("", "x")]).is_err());
    }

    #[test]
    fn trigger_formed_with_neighbouring_text_is_replaced() {
        let table = SubstitutionTable::new([("ab", "x"), ("c", "a")]).unwrap();
        assert_eq!(table.apply_line("cb"), ("x".to_string(), 2));
        assert_eq!(table.apply_line("x"), ("x".to_string(), 0));

        let mut doc = Document::parse("echo cb\n");
        assert_eq!(table.apply(&mut doc), 2);
        assert_eq!(table.apply(&mut doc), 0);
        assert_eq!(doc.text(0), "echo x");
    }

    #[test]
    fn default_table_passes_validation() {
        assert_eq!(SubstitutionTable::new(DEFAULT_RULES).unwrap(), SubstitutionTable::default());
    }
}
