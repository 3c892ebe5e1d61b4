//! `[file_types]` section configuration.
//!
//! Maps a category name to a comma-separated extension list. The router only
//! gives special treatment to `style` and `image`; every other category
//! (including user-defined ones) reloads the page.
//!
//! # Example
//!
//! ```toml
//! [file_types]
//! style = "css,less,styl"
//! script = "js"
//! image = "jpg,jpeg,png,gif"
//! template = "html,tpl"        # extra category
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extension table for file classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTypesConfig {
    pub style: String,
    pub script: String,
    pub image: String,

    /// User-defined categories, checked after the built-in ones in name order.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for FileTypesConfig {
    fn default() -> Self {
        Self {
            style: "css,less,styl".to_string(),
            script: "js".to_string(),
            image: "jpg,jpeg,png,gif".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl FileTypesConfig {
    /// All `(category, extension list)` pairs in lookup order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        [
            ("style", self.style.as_str()),
            ("image", self.image.as_str()),
            ("script", self.script.as_str()),
        ]
        .into_iter()
        .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Check whether `ext` is listed in a comma-separated extension list.
///
/// Comparison ignores surrounding whitespace and ASCII case.
pub fn list_contains(list: &str, ext: &str) -> bool {
    !ext.is_empty()
        && list
            .split(',')
            .map(str::trim)
            .any(|item| item.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_file_types_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.file_types.style, "css,less,styl");
        assert_eq!(config.file_types.image, "jpg,jpeg,png,gif");
        assert!(config.file_types.extra.is_empty());
    }

    #[test]
    fn test_extra_categories() {
        let config = test_parse_config("[file_types]\nimage = \"png,svg\"\ntemplate = \"html\"");
        assert_eq!(config.file_types.image, "png,svg");
        assert_eq!(config.file_types.style, "css,less,styl");
        assert_eq!(
            config.file_types.extra.get("template").map(String::as_str),
            Some("html")
        );
    }

    #[test]
    fn test_list_contains() {
        assert!(list_contains("css, less ,styl", "less"));
        assert!(list_contains("jpg,PNG", "png"));
        assert!(!list_contains("css", "scss"));
        assert!(!list_contains("css,", ""));
    }

    #[test]
    fn test_entries_order() {
        let types = FileTypesConfig::default();
        let names: Vec<_> = types.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["style", "image", "script"]);
    }
}
