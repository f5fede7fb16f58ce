//! Textual reference prefixes.
//!
//! Links store references as strings such as `"Sample, Part Two 3:4"`: a
//! canonical node path followed by a section address. Matching a path against
//! such a string respects token boundaries so that `"Genesis"` never matches
//! `"Genesis Rabbah 1:1"`.
//!
//! A section address is a single token with no whitespace, starting with an
//! ASCII digit or a Hebrew letter (`"3:4"`, `"2a"`, `"א:ב"`). A sibling titled
//! `"Part 2"` therefore stays apart from `"Part"` whenever its references carry
//! an address; a bare `"Sample, Part 2"` is indistinguishable from section 2
//! of `"Sample, Part"`.

use serde::{Deserialize, Serialize};

/// Canonical path used to select references underneath a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefPrefix {
    path: String,
    /// Whether `", …"` sub-paths belong to this node (containers only)
    subpaths: bool,
}

impl RefPrefix {
    /// Prefix of a container node: sub-paths and section addresses match
    pub fn container(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subpaths: true,
        }
    }

    /// Prefix of a content leaf: only section addresses match
    pub fn leaf(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subpaths: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matches(&self, reference: &str) -> bool {
        let Some(rest) = reference.strip_prefix(self.path.as_str()) else {
            return false;
        };
        let mut chars = rest.chars();
        match chars.next() {
            None => true,
            Some(' ') => is_address(chars.as_str()),
            Some(',') => self.subpaths,
            Some(_) => false,
        }
    }

    /// Replace the matched prefix with `new_path`, `None` when unmatched
    pub fn rewrite(&self, reference: &str, new_path: &str) -> Option<String> {
        if !self.matches(reference) {
            return None;
        }
        Some(format!("{}{}", new_path, &reference[self.path.len()..]))
    }
}

fn is_address(token: &str) -> bool {
    let starts_address = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || ('\u{05D0}'..='\u{05EA}').contains(&c));
    starts_address && !token.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_matches_section_addresses() {
        let prefix = RefPrefix::leaf("Sample");
        assert!(prefix.matches("Sample"));
        assert!(prefix.matches("Sample 1:1"));
        assert!(prefix.matches("Sample 2a:3"));
        assert!(!prefix.matches("Sample, Part 1"));
        assert!(!prefix.matches("Samples 1:1"));
    }

    #[test]
    fn test_respects_title_boundaries() {
        let prefix = RefPrefix::container("Genesis");
        assert!(prefix.matches("Genesis 1:1"));
        assert!(prefix.matches("Genesis, Prologue 2"));
        assert!(!prefix.matches("Genesis Rabbah 1:1"));
        assert!(!prefix.matches("Rashi on Genesis 1:1"));
    }

    #[test]
    fn test_rewrite_keeps_address() {
        let prefix = RefPrefix::container("Sample, Part One, Intro");
        assert_eq!(
            prefix.rewrite("Sample, Part One, Intro 3:4-5", "Sample, Part Two, Intro"),
            Some("Sample, Part Two, Intro 3:4-5".to_string())
        );
        assert_eq!(prefix.rewrite("Sample, Part One, Introduction 1", "x"), None);
    }

    #[test]
    fn test_numbered_sibling_title_is_not_an_address() {
        let prefix = RefPrefix::leaf("Sample, Part");
        assert!(prefix.matches("Sample, Part 1:1"));
        assert!(!prefix.matches("Sample, Part 2 1:1"));
        assert_eq!(prefix.rewrite("Sample, Part 2 1:1", "Sample, Chapter"), None);
    }

    #[test]
    fn test_matches_hebrew_addresses() {
        let prefix = RefPrefix::container("בראשית");
        assert!(prefix.matches("בראשית א:ב"));
        assert!(!prefix.matches("בראשית רבה א:א"));
        assert!(!RefPrefix::leaf("Sample").matches("Sample Étude 1"));
    }

    proptest! {
        #[test]
        fn prop_unrelated_titles_never_match(suffix in "[A-Za-z][A-Za-z ]{0,12}", address in "[0-9]{1,3}(:[0-9]{1,3})?") {
            let prefix = RefPrefix::container("Sample");
            let reference = format!("Sample{} {}", suffix, address);
            prop_assert!(!prefix.matches(&reference));
            prop_assert_eq!(prefix.rewrite(&reference, "Other"), None);
        }
    }
}
