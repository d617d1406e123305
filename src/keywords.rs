//! Keyword set loading.
//!
//! The keywords file is a comma- and/or newline-separated list. Entries are
//! trimmed, empty entries dropped, duplicates removed keeping the first one.

use crate::error::EditError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords(Vec<String>);

impl Keywords {
    /// Parse the contents of a keywords file.
    pub fn parse(text: &str) -> Result<Self, EditError> {
        Self::from_iter_checked(text.split([',', '\n']))
    }

    /// Build from individual keywords with the same trimming and dedup rules.
    pub fn from_iter_checked<I, S>(items: I) -> Result<Self, EditError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = Vec::new();
        for item in items {
            let kw = item.as_ref().trim();
            if kw.is_empty() || keywords.iter().any(|k| k == kw) {
                continue;
            }
            keywords.push(kw.to_string());
        }
        if keywords.is_empty() {
            return Err(EditError::NoKeywords);
        }
        Ok(Self(keywords))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First keyword contained in `line`.
    pub fn first_substring_match(&self, line: &str) -> Option<&str> {
        self.iter().find(|kw| line.contains(kw))
    }

    /// First keyword found in `line` bounded by non-word characters.
    pub fn first_word_match(&self, line: &str) -> Option<&str> {
        self.iter().find(|kw| contains_word(line, kw))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `needle` occurs in `haystack` with no word character directly before or
/// after it.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(pos, _)| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_and_newline_lists() {
        let kw = Keywords::parse(" bdi_load, archive\nfeed_x ,,\n").unwrap();
        assert_eq!(kw.iter().collect::<Vec<_>>(), vec!["bdi_load", "archive", "feed_x"]);
    }

    #[test]
    fn dedupes_keeping_first() {
        let kw = Keywords::parse("b, a, b").unwrap();
        assert_eq!(kw.iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn empty_set_is_an_error() {
        assert_eq!(Keywords::parse(" , \n ,"), Err(EditError::NoKeywords));
        assert_eq!(Keywords::parse(""), Err(EditError::NoKeywords));
    }

    #[test]
    fn first_keyword_wins() {
        let kw = Keywords::parse("load,bdi").unwrap();
        assert_eq!(kw.first_substring_match("bdi_load.sh"), Some("load"));
        assert_eq!(kw.first_substring_match("echo"), None);
    }

    #[test]
    fn whole_word_matching() {
        assert!(contains_word("run stop now", "stop"));
        assert!(contains_word("stop", "stop"));
        assert!(contains_word("x=$(stop)", "stop"));
        assert!(!contains_word("run stopper", "stop"));
        assert!(!contains_word("run_stop", "stop"));
        assert!(contains_word("a stopper stop", "stop"));
        let kw = Keywords::parse("stop").unwrap();
        assert_eq!(kw.first_word_match("nonstop"), None);
        assert_eq!(kw.first_word_match("do stop"), Some("stop"));
    }
}
