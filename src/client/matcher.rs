//! Resource Matcher
//!
//! Scores loaded resources against a changed file path by comparing path
//! segments from the end.
//!
//! ```text
//! changed:  src / css / main.css
//! resource: http: / host / demo / css / main.css
//!                                  ^^^   ^^^^^^^^   2 of 3 → ratio 66
//! ```
//!
//! Selection keeps every full match (ratio 100). Without one, the single
//! best partial match wins; ties keep the earlier candidate.

use std::cell::OnceCell;

use url::Url;

use super::url::{path_segments, resolve, url_segments};

/// A stylesheet link, `@import` target or image source.
///
/// The absolute URL is resolved on first use and then cached.
#[derive(Debug)]
pub struct ResourceDescriptor<T> {
    pub target: T,
    pub href: String,
    /// Location relative hrefs resolve against (document location if `None`)
    pub base: Option<String>,
    full_href: OnceCell<Option<Url>>,
}

impl<T> ResourceDescriptor<T> {
    pub fn new(target: T, href: impl Into<String>) -> Self {
        Self::with_base(target, href, None)
    }

    pub fn with_base(target: T, href: impl Into<String>, base: Option<String>) -> Self {
        Self {
            target,
            href: href.into(),
            base,
            full_href: OnceCell::new(),
        }
    }

    /// Absolute URL of this resource, `None` if the href cannot be resolved.
    pub fn full_href(&self, location: &Url) -> Option<&Url> {
        self.full_href
            .get_or_init(|| resolve(self.base.as_deref(), &self.href, location))
            .as_ref()
    }
}

/// Score of one candidate.
#[derive(Debug)]
pub struct MatchResult<'a, T> {
    pub file: &'a ResourceDescriptor<T>,
    /// `0..=100`
    pub ratio: u8,
    pub is_full_match: bool,
}

impl<T> Clone for MatchResult<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MatchResult<'_, T> {}

/// Percentage of `changed` segments equal to the tail of `candidate`,
/// counting from the end and stopping at the first mismatch.
///
/// An empty changed path never matches.
pub fn match_ratio<A, B>(changed: &[A], candidate: &[B]) -> u8
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    if changed.is_empty() {
        return 0;
    }

    let matched = changed
        .iter()
        .rev()
        .zip(candidate.iter().rev())
        .take_while(|(a, b)| a.as_ref() == b.as_ref())
        .count();

    (matched * 100 / changed.len()) as u8
}

/// Find the resources best matching `changed_path`.
///
/// Returns every full match in candidate order; if there is none, the
/// single best partial match; empty only when there are no candidates.
pub fn find_best_matches<'a, T>(
    changed_path: &str,
    candidates: &'a [ResourceDescriptor<T>],
    location: &Url,
) -> Vec<MatchResult<'a, T>> {
    let changed = path_segments(changed_path);

    let mut best: Option<MatchResult<'a, T>> = None;
    let mut full_matches = Vec::new();

    for file in candidates {
        let segments = file.full_href(location).map(url_segments).unwrap_or_default();
        let ratio = match_ratio(&changed, &segments);
        let is_full_match = ratio == 100;

        if best.is_none_or(|b| is_full_match || b.ratio < ratio) {
            let result = MatchResult {
                file,
                ratio,
                is_full_match,
            };
            if is_full_match {
                full_matches.push(result);
            }
            best = Some(result);
        }
    }

    if full_matches.is_empty() {
        best.into_iter().collect()
    } else {
        full_matches
    }
}

/// Only the full matches of [`find_best_matches`].
pub fn find_full_matches<'a, T>(
    changed_path: &str,
    candidates: &'a [ResourceDescriptor<T>],
    location: &Url,
) -> Vec<MatchResult<'a, T>> {
    find_best_matches(changed_path, candidates, location)
        .into_iter()
        .filter(|m| m.is_full_match)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Url {
        Url::parse("http://localhost:8080/index.html").unwrap()
    }

    fn descriptors(hrefs: &[&str]) -> Vec<ResourceDescriptor<usize>> {
        hrefs
            .iter()
            .enumerate()
            .map(|(i, href)| ResourceDescriptor::new(i, *href))
            .collect()
    }

    #[test]
    fn test_ratio_counts_tail_segments() {
        assert_eq!(match_ratio(&["a", "b", "c"], &["x", "b", "c"]), 66);
        assert_eq!(match_ratio(&["a", "b", "c"], &["a", "b", "c"]), 100);
        assert_eq!(match_ratio(&["a", "b", "c"], &["b", "c", "x"]), 0);
        assert_eq!(match_ratio(&["b", "c"], &["host", "a", "b", "c"]), 100);
    }

    #[test]
    fn test_ratio_stops_at_first_mismatch() {
        // `a` matches again further up but the run is already broken
        assert_eq!(match_ratio(&["a", "x", "c"], &["a", "y", "c"]), 33);
    }

    #[test]
    fn test_empty_changed_path_never_matches() {
        let empty: [&str; 0] = [];
        assert_eq!(match_ratio(&empty, &["a"]), 0);

        let files = descriptors(&["a.css"]);
        let matches = find_best_matches("", &files, &location());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ratio, 0);
        assert!(!matches[0].is_full_match);
    }

    #[test]
    fn test_all_full_matches_are_collected() {
        let files = descriptors(&["/src/css/main.css", "/other.css", "/x/src/css/main.css?v=1"]);
        let matches = find_best_matches("src/css/main.css", &files, &location());

        let targets: Vec<_> = matches.iter().map(|m| m.file.target).collect();
        assert_eq!(targets, [0, 2]);
        assert!(matches.iter().all(|m| m.is_full_match));
    }

    #[test]
    fn test_partial_tie_keeps_first() {
        // 0, 66, 66
        let files = descriptors(&["/q/r/s.css", "/z/b/c.css", "/y/b/c.css"]);
        let matches = find_best_matches("a/b/c.css", &files, &location());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file.target, 1);
        assert_eq!(matches[0].ratio, 66);
    }

    #[test]
    fn test_partial_tie_break_law() {
        // 40, 70, 70 over ten segments
        let changed = "a/b/c/d/e/f/g/h/i/j.css";
        let files = descriptors(&[
            "/z/z/z/z/z/z/g/h/i/j.css",
            "/z/z/z/d/e/f/g/h/i/j.css",
            "/y/y/y/d/e/f/g/h/i/j.css",
        ]);
        let matches = find_best_matches(changed, &files, &location());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ratio, 70);
        assert_eq!(matches[0].file.target, 1);
    }

    #[test]
    fn test_first_candidate_is_kept_at_zero() {
        let files = descriptors(&["/a.css", "/b.css"]);
        let matches = find_best_matches("c.css", &files, &location());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file.target, 0);
        assert_eq!(matches[0].ratio, 0);
    }

    #[test]
    fn test_no_candidates() {
        let files: Vec<ResourceDescriptor<usize>> = Vec::new();
        assert!(find_best_matches("a.css", &files, &location()).is_empty());
    }

    #[test]
    fn test_matching_is_deterministic() {
        let files = descriptors(&["/a/b.css", "/c/b.css", "/b.css"]);
        let first: Vec<_> = find_best_matches("a/b.css", &files, &location())
            .iter()
            .map(|m| (m.file.target, m.ratio))
            .collect();
        for _ in 0..5 {
            let again: Vec<_> = find_best_matches("a/b.css", &files, &location())
                .iter()
                .map(|m| (m.file.target, m.ratio))
                .collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_relative_hrefs_resolve_against_base() {
        let files = vec![ResourceDescriptor::with_base(
            0,
            "../img/bg.png",
            Some("http://localhost:8080/src/css/main.css".to_string()),
        )];
        let matches = find_full_matches("src/img/bg.png", &files, &location());
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_full_href_resolved_once() {
        let file = ResourceDescriptor::new((), "a.css");
        let first = file.full_href(&location()).cloned();
        let other = Url::parse("http://elsewhere/x/").unwrap();
        assert_eq!(file.full_href(&other).cloned(), first);
    }
}
