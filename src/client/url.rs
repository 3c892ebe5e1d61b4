//! URL helpers for resource correlation.
//!
//! - Splitting hrefs into path, query and fragment
//! - Resolving hrefs against a stylesheet or document base
//! - Cache-bust query parameters
//! - `url(...)` token extraction from CSS values

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

/// Query parameter carrying the reload timestamp.
pub const CACHE_MARKER: &str = "watchreload";

/// `url(...)` token inside a CSS value, capturing the bare link.
static URL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\s*\(\s*['"]?\s*([^\s'"]*)\s*['"]?\s*\)"#).expect("valid url token regex")
});

/// Quoted import target, e.g. `"a.css" screen`.
static QUOTED_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*['"]\s*([^\s]*)\s*['"]"#).expect("valid quoted href regex"));

static MARKER_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(\?|&){CACHE_MARKER}=(\d+)")).expect("valid marker regex")
});

/// Split an href into `(path, query, fragment)`.
///
/// The query keeps its leading `?` and the fragment its leading `#`.
/// `"a.css?v=1#x"` → `("a.css", "?v=1", "#x")`
pub fn split_href(href: &str) -> (&str, &str, &str) {
    let (rest, hash) = match href.find('#') {
        Some(i) => href.split_at(i),
        None => (href, ""),
    };
    let (path, query) = match rest.find('?') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    (path, query, hash)
}

/// Non-empty `/` segments of a changed file path (query and fragment dropped).
pub fn path_segments(path: &str) -> Vec<&str> {
    let (path, _, _) = split_href(path);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Non-empty, percent-decoded path segments of a resolved URL.
pub fn url_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Resolve `href` against `base`, or against `location` when there is no base.
///
/// A relative base is itself resolved against `location`. Root-relative
/// hrefs resolve against the origin; `.` and `..` segments are collapsed.
pub fn resolve(base: Option<&str>, href: &str, location: &Url) -> Option<Url> {
    let base = match base {
        Some(base) if !base.is_empty() => location.join(base).ok()?,
        _ => location.clone(),
    };
    base.join(href.trim()).ok()
}

/// Add or refresh the cache-bust parameter of `href`.
///
/// An existing marker value is replaced in place, otherwise the marker is
/// appended to the query. Path and fragment are preserved.
pub fn cache_bust(href: &str, stamp: u64) -> String {
    let (path, query, hash) = split_href(href);
    let param = format!("{CACHE_MARKER}={stamp}");

    let query = if MARKER_PARAM.is_match(query) {
        MARKER_PARAM
            .replace(query, |caps: &regex::Captures<'_>| format!("{}{param}", &caps[1]))
            .into_owned()
    } else if query.is_empty() {
        format!("?{param}")
    } else {
        format!("{query}&{param}")
    };

    format!("{path}{query}{hash}")
}

/// Bare link of an `@import` href as reported by the stylesheet.
///
/// Older engines report `url(a.css) screen` or `"a.css" screen` instead
/// of the link alone.
pub fn extract_import_href(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(caps) = URL_TOKEN.captures(raw) {
        return caps[1].to_string();
    }
    if let Some(caps) = QUOTED_HREF.captures(raw) {
        return caps[1].to_string();
    }
    raw.to_string()
}

/// Every non-empty link inside `url(...)` tokens of a CSS value, in order.
pub fn url_tokens(value: &str) -> impl Iterator<Item = &str> {
    URL_TOKEN
        .captures_iter(value)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

/// Replace the link of every `url(...)` token whose link is exactly `link`.
///
/// Quotes and spacing inside the token are kept; other tokens and text
/// outside tokens are left alone.
pub fn replace_url_token(value: &str, link: &str, replacement: &str) -> String {
    URL_TOKEN
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let (Some(whole), Some(found)) = (caps.get(0), caps.get(1)) else {
                return caps[0].to_string();
            };
            if found.as_str() != link {
                return whole.as_str().to_string();
            }
            let token = whole.as_str();
            let start = found.start() - whole.start();
            let end = found.end() - whole.start();
            format!("{}{replacement}{}", &token[..start], &token[end..])
        })
        .into_owned()
}
