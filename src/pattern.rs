//! Pattern compilation and per-message match extraction.
//!
//! A [`CompiledPattern`] is built once at initialization and applied to every
//! inbound message body. Each occurrence of the pattern becomes a
//! [`MatchRecord`] carrying the whole matched text, the named captures, and
//! the positional captures in order. Compilation failure is surfaced to the
//! controller, which fails closed and never activates the pipeline.

use std::collections::HashMap;

use regex::Regex;

use crate::error::ConfigError;

/// A compiled, immutable message pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
}

/// One occurrence of the pattern within a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// The whole matched text.
    pub text: String,
    /// Named captures that participated in the match.
    pub named: HashMap<String, String>,
    /// Positional captures in group order (group 0 excluded); `None` for
    /// groups that did not participate.
    pub groups: Vec<Option<String>>,
}

impl CompiledPattern {
    /// Compiles the pattern text into an executable matcher.
    pub fn compile(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern)?;
        Ok(Self { regex })
    }

    /// Returns the source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Finds all non-overlapping matches in `text`, left to right.
    ///
    /// A positive `cap` truncates the result to the first `cap` matches;
    /// zero or negative means unlimited.
    pub fn find_matches(&self, text: &str, cap: i64) -> Vec<MatchRecord> {
        let names: Vec<Option<&str>> = self.regex.capture_names().collect();
        let mut records = Vec::new();

        for caps in self.regex.captures_iter(text) {
            let mut named = HashMap::new();
            let mut groups = Vec::with_capacity(names.len().saturating_sub(1));
            for (index, name) in names.iter().enumerate().skip(1) {
                let value = caps.get(index).map(|m| m.as_str().to_string());
                if let (Some(name), Some(value)) = (name, &value) {
                    named.insert((*name).to_string(), value.clone());
                }
                groups.push(value);
            }
            records.push(MatchRecord {
                text: caps
                    .get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                named,
                groups,
            });
            if cap > 0 && records.len() as i64 >= cap {
                break;
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARE_PATTERN: &str = r"【(?P<code>[^】]+)】.*?(?P<price>\d+)块";

    #[test]
    fn invalid_pattern_fails_to_compile() {
        assert!(matches!(
            CompiledPattern::compile("【("),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn named_captures_are_extracted() {
        let pattern = CompiledPattern::compile(SHARE_PATTERN).unwrap();
        let records = pattern.find_matches("【ABC123】今天特价 88块", 1);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.named["code"], "ABC123");
        assert_eq!(record.named["price"], "88");
        assert_eq!(record.groups.len(), 2);
        assert_eq!(record.groups[0].as_deref(), Some("ABC123"));
        assert_eq!(record.groups[1].as_deref(), Some("88"));
    }

    #[test]
    fn positional_captures_keep_group_order() {
        let pattern = CompiledPattern::compile(r"(\w+)=(\w+)").unwrap();
        let records = pattern.find_matches("a=1 b=2", 0);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].groups[0].as_deref(), Some("a"));
        assert_eq!(records[0].groups[1].as_deref(), Some("1"));
        assert!(records[0].named.is_empty());
        assert_eq!(records[1].text, "b=2");
    }

    #[test]
    fn non_participating_groups_are_none() {
        let pattern = CompiledPattern::compile(r"(a)|(b)").unwrap();
        let records = pattern.find_matches("b", 0);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].groups, vec![None, Some("b".to_string())]);
    }

    #[test]
    fn positive_cap_truncates_matches() {
        let pattern = CompiledPattern::compile(SHARE_PATTERN).unwrap();
        let text = "【A1】10块 【B2】20块 【C3】30块";

        assert_eq!(pattern.find_matches(text, 1).len(), 1);
        assert_eq!(pattern.find_matches(text, 2).len(), 2);
    }

    #[test]
    fn non_positive_cap_is_unlimited() {
        let pattern = CompiledPattern::compile(SHARE_PATTERN).unwrap();
        let text = "【A1】10块 【B2】20块 【C3】30块";

        assert_eq!(pattern.find_matches(text, 0).len(), 3);
        assert_eq!(pattern.find_matches(text, -1).len(), 3);
    }

    #[test]
    fn unrelated_text_yields_no_records() {
        let pattern = CompiledPattern::compile(SHARE_PATTERN).unwrap();
        assert!(pattern.find_matches("无关内容", 0).is_empty());
    }
}
