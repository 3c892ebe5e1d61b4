//! Livereload Map
//!
//! Ordered regex → path redirects applied to a changed path before the
//! reload command is built. Lets a partial (e.g. `_vars.less`) reload the
//! stylesheet that imports it instead of the whole page.

use std::borrow::Cow;

use regex::Regex;

use super::message::LivereloadTable;
use crate::config::{ConfigError, LivereloadRule};

/// Compiled `[[livereload]]` entries. First match wins.
#[derive(Debug, Clone, Default)]
pub struct LivereloadMap {
    entries: Vec<(Regex, String)>,
}

impl LivereloadMap {
    /// Compile rules in order.
    pub fn compile(rules: &[LivereloadRule]) -> Result<Self, ConfigError> {
        let entries = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| (regex, rule.path.clone()))
                    .map_err(|source| ConfigError::Pattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    /// Path to report for `changed`: the first matching entry's path, or
    /// `changed` itself.
    pub fn apply<'a>(&'a self, changed: &'a str) -> Cow<'a, str> {
        self.entries
            .iter()
            .find(|(regex, _)| regex.is_match(changed))
            .map_or(Cow::Borrowed(changed), |(_, path)| Cow::Borrowed(path.as_str()))
    }

    /// Snapshot sent to clients in `init`.
    pub fn to_table(&self) -> LivereloadTable {
        LivereloadTable(
            self.entries
                .iter()
                .map(|(regex, path)| (regex.as_str().to_string(), path.clone()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(rules: &[(&str, &str)]) -> LivereloadMap {
        let rules: Vec<_> = rules
            .iter()
            .map(|(p, t)| LivereloadRule::new(*p, *t))
            .collect();
        LivereloadMap::compile(&rules).unwrap()
    }

    #[test]
    fn test_no_match_keeps_path() {
        let map = map(&[("\\.less$", "src/css/main.css")]);
        assert_eq!(map.apply("img/logo.png"), "img/logo.png");
    }

    #[test]
    fn test_partial_is_redirected() {
        let map = map(&[("_partial\\.less$", "src/css/main.css")]);
        assert_eq!(map.apply("src/css/_partial.less"), "src/css/main.css");
    }

    #[test]
    fn test_first_match_wins() {
        let map = map(&[("src/.+\\.less$", "first.css"), ("_partial", "second.css")]);
        assert_eq!(map.apply("src/_partial.less"), "first.css");
        assert_eq!(map.apply("lib/_partial.styl"), "second.css");
    }

    #[test]
    fn test_empty_map() {
        let map = LivereloadMap::default();
        assert!(map.is_empty());
        assert_eq!(map.apply("a.css"), "a.css");
        assert!(map.to_table().is_empty());
    }

    #[test]
    fn test_table_preserves_order() {
        let map = map(&[("b", "1"), ("a", "2")]);
        assert_eq!(
            map.to_table(),
            LivereloadTable(vec![("b".into(), "1".into()), ("a".into(), "2".into())])
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let err = LivereloadMap::compile(&[LivereloadRule::new("(", "x")]).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { ref pattern, .. } if pattern == "("));
    }
}
