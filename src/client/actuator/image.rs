//! Image reload passes.
//!
//! 1. `<img>` elements whose `src` fully matches
//! 2. Inline `style` image properties
//! 3. Style rules in readable stylesheets, nested media groups included
//!
//! Only full matches are reloaded.

use rustc_hash::FxHashSet;
use url::Url;

use crate::client::log::ClientLog;
use crate::client::matcher::{ResourceDescriptor, find_full_matches};
use crate::client::surface::{CssRule, RenderSurface, SheetId};
use crate::client::url::{cache_bust, extract_import_href, replace_url_token, resolve, url_tokens};

/// Style properties that may reference images.
pub const IMAGE_PROPERTIES: [&str; 4] = [
    "background-image",
    "border-image",
    "-webkit-border-image",
    "-moz-border-image",
];

/// Per-command context shared by the passes.
pub struct ImagePass<'a> {
    pub path: &'a str,
    pub location: &'a Url,
    pub stamp: u64,
}

impl ImagePass<'_> {
    /// Rewrite the first fully matching `url(...)` token of `value`.
    ///
    /// Every `url(...)` token with that exact link gets the cache-busted
    /// absolute URL; longer links containing it are left alone.
    fn rewrite_value(&self, value: &str, base: Option<&str>) -> Option<String> {
        let candidates: Vec<_> = url_tokens(value)
            .map(|token| ResourceDescriptor::with_base(token, token, base.map(String::from)))
            .collect();

        let matches = find_full_matches(self.path, &candidates, self.location);
        let first = matches.first()?;
        let full = first.file.full_href(self.location)?;
        Some(replace_url_token(
            value,
            first.file.target,
            &cache_bust(full.as_str(), self.stamp),
        ))
    }

    pub fn img_elements<S: RenderSurface + ?Sized>(&self, surface: &mut S, log: &ClientLog) -> usize {
        let images: Vec<_> = surface
            .images()
            .into_iter()
            .map(|img| ResourceDescriptor::new(img.node, img.src))
            .collect();

        let mut updated = 0;
        for found in find_full_matches(self.path, &images, self.location) {
            let Some(full) = found.file.full_href(self.location) else {
                continue;
            };
            match surface.set_image_src(found.file.target, &cache_bust(full.as_str(), self.stamp)) {
                Ok(()) => updated += 1,
                Err(e) => log.warn(surface, &format!("image {}: {e}", found.file.target)),
            }
        }
        updated
    }

    pub fn inline_styles<S: RenderSurface + ?Sized>(&self, surface: &mut S, log: &ClientLog) -> usize {
        let mut updated = 0;
        for node in surface.styled_elements() {
            for property in IMAGE_PROPERTIES {
                let Some(value) = surface.inline_style(node, property) else {
                    continue;
                };
                let Some(rewritten) = self.rewrite_value(&value, None) else {
                    continue;
                };
                match surface.set_inline_style(node, property, &rewritten) {
                    Ok(()) => updated += 1,
                    Err(e) => log.warn(surface, &format!("style of {node}: {e}")),
                }
            }
        }
        updated
    }

    /// Document sheets use their own href as base, imported sheets the
    /// resolved href of the importing rule.
    pub fn stylesheet_rules<S: RenderSurface + ?Sized>(&self, surface: &mut S, log: &ClientLog) -> usize {
        let mut visited = FxHashSet::default();
        let mut updated = 0;
        for sheet in surface.stylesheets() {
            let base = surface.sheet_href(sheet);
            updated += self.walk_sheet(surface, log, sheet, base, &mut visited);
        }
        updated
    }

    fn walk_sheet<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        log: &ClientLog,
        sheet: SheetId,
        base: Option<String>,
        visited: &mut FxHashSet<SheetId>,
    ) -> usize {
        if !visited.insert(sheet) {
            return 0;
        }
        let rules = match surface.css_rules(sheet) {
            Ok(rules) => rules,
            Err(e) => {
                log.debug(surface, &format!("skipping {sheet}: {e}"));
                return 0;
            }
        };

        let mut path = Vec::new();
        let mut updated = self.walk_rules(surface, log, sheet, base.as_deref(), &rules, &mut path);

        for rule in &rules {
            if let CssRule::Import { href, sheet: Some(child), .. } = rule {
                let child_base = resolve(base.as_deref(), &extract_import_href(href), self.location)
                    .map(String::from)
                    .or_else(|| surface.sheet_href(*child));
                updated += self.walk_sheet(surface, log, *child, child_base, visited);
            }
        }
        updated
    }

    fn walk_rules<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        log: &ClientLog,
        sheet: SheetId,
        base: Option<&str>,
        rules: &[CssRule],
        path: &mut Vec<usize>,
    ) -> usize {
        let mut updated = 0;
        for (index, rule) in rules.iter().enumerate() {
            path.push(index);
            match rule {
                CssRule::Style { .. } => {
                    for property in IMAGE_PROPERTIES {
                        let Some(rewritten) = rule
                            .property(property)
                            .and_then(|value| self.rewrite_value(value, base))
                        else {
                            continue;
                        };
                        match surface.set_rule_property(sheet, path, property, &rewritten) {
                            Ok(()) => updated += 1,
                            Err(e) => log.warn(surface, &format!("rule in {sheet}: {e}")),
                        }
                    }
                }
                CssRule::Media { rules: nested } => {
                    updated += self.walk_rules(surface, log, sheet, base, nested, path);
                }
                CssRule::Import { .. } | CssRule::Other => {}
            }
            path.pop();
        }
        updated
    }
}
