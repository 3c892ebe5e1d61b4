//! Stylesheet candidates and the two ways of reloading them.
//!
//! - Linked sheets are swapped: a cache-busted clone is inserted after the
//!   link and the original goes away once the clone has loaded.
//! - `@import` rules are rewritten in place with a cache-busted href.

use rustc_hash::FxHashSet;
use url::Url;

use super::load::PendingSwap;
use crate::client::log::ClientLog;
use crate::client::matcher::ResourceDescriptor;
use crate::client::surface::{CssRule, MediaText, NodeId, RenderSurface, SheetId, SurfaceError};
use crate::client::url::{cache_bust, extract_import_href};

/// An `@import` rule found in a readable sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// Sheet holding the rule
    pub parent: SheetId,
    pub index: usize,
    pub media: MediaText,
    /// Imported sheet, if loaded
    pub sheet: Option<SheetId>,
}

/// Linked stylesheets that are not being swapped already.
pub fn link_pool<S: RenderSurface + ?Sized>(surface: &S) -> Vec<ResourceDescriptor<NodeId>> {
    surface
        .links()
        .into_iter()
        .filter(|link| !link.reloading)
        .map(|link| ResourceDescriptor::new(link.node, link.href))
        .collect()
}

/// Every `@import` reachable from the document's sheets.
///
/// Hrefs resolve against the sheet holding the rule. Sheets whose rules
/// cannot be read are skipped; a sheet is visited at most once, so import
/// cycles terminate.
pub fn collect_imports<S: RenderSurface + ?Sized>(
    surface: &mut S,
    log: &ClientLog,
) -> Vec<ResourceDescriptor<ImportRef>> {
    let mut visited = FxHashSet::default();
    let mut imports = Vec::new();
    for sheet in surface.stylesheets() {
        collect_from(surface, log, sheet, &mut visited, &mut imports);
    }
    imports
}

fn collect_from<S: RenderSurface + ?Sized>(
    surface: &mut S,
    log: &ClientLog,
    sheet: SheetId,
    visited: &mut FxHashSet<SheetId>,
    out: &mut Vec<ResourceDescriptor<ImportRef>>,
) {
    if !visited.insert(sheet) {
        return;
    }

    let rules = match surface.css_rules(sheet) {
        Ok(rules) => rules,
        Err(e) => {
            log.debug(surface, &format!("skipping {sheet}: {e}"));
            return;
        }
    };
    let base = surface.sheet_href(sheet);

    for (index, rule) in rules.into_iter().enumerate() {
        let CssRule::Import { href, media, sheet: child } = rule else {
            continue;
        };
        out.push(ResourceDescriptor::with_base(
            ImportRef {
                parent: sheet,
                index,
                media,
                sheet: child,
            },
            extract_import_href(&href),
            base.clone(),
        ));
        if let Some(child) = child {
            collect_from(surface, log, child, visited, out);
        }
    }
}

/// Start the link swap for `link`.
pub fn swap_link<S: RenderSurface + ?Sized>(
    surface: &mut S,
    link: NodeId,
    full_href: &Url,
    stamp: u64,
) -> Result<PendingSwap, SurfaceError> {
    let clone = surface.clone_node(link)?;
    surface.set_link_href(clone, &cache_bust(full_href.as_str(), stamp))?;
    surface.set_reloading(link, true)?;
    surface.insert_after(clone, link)?;
    Ok(PendingSwap {
        original: link,
        clone,
        started: surface.now_millis(),
    })
}

/// Replace an `@import` rule by one pointing at a cache-busted href.
pub fn rewrite_import<S: RenderSurface + ?Sized>(
    surface: &mut S,
    import: &ImportRef,
    full_href: &Url,
    stamp: u64,
) -> Result<(), SurfaceError> {
    let rule = format!(
        "@import url(\"{}\") {};",
        cache_bust(full_href.as_str(), stamp),
        import.media.to_css()
    );
    surface.insert_rule(import.parent, &rule, import.index)?;
    if surface.rule_count(import.parent)? > import.index + 1 {
        surface.delete_rule(import.parent, import.index + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemorySurface;
    use crate::client::surface::SheetProbe;

    fn surface() -> MemorySurface {
        MemorySurface::new(Url::parse("http://localhost:8080/index.html").unwrap())
    }

    fn import(href: &str, sheet: Option<SheetId>) -> CssRule {
        CssRule::Import {
            href: href.into(),
            media: MediaText::default(),
            sheet,
        }
    }

    #[test]
    fn test_link_pool_skips_reloading() {
        let mut surface = surface();
        let (a, _) = surface.add_link("a.css", Vec::new());
        let (b, _) = surface.add_link("b.css", Vec::new());
        surface.set_reloading(a, true).unwrap();

        let pool = link_pool(&surface);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].target, b);
    }

    #[test]
    fn test_imports_resolve_against_parent_sheet() {
        let mut surface = surface();
        let nested = surface.add_sheet("css/parts/colors.css", Vec::new());
        let parts = surface.add_sheet("css/parts/base.css", vec![import("colors.css", Some(nested))]);
        surface.add_link("css/main.css", vec![CssRule::Other, import("parts/base.css", Some(parts))]);

        let imports = collect_imports(&mut surface, &ClientLog::default());
        let location = surface.location();
        let hrefs: Vec<_> = imports
            .iter()
            .map(|i| i.full_href(&location).unwrap().to_string())
            .collect();
        assert_eq!(
            hrefs,
            [
                "http://localhost:8080/css/parts/base.css",
                "http://localhost:8080/css/parts/colors.css"
            ]
        );
        assert_eq!(imports[0].target.index, 1);
    }

    #[test]
    fn test_import_cycles_terminate() {
        let mut surface = surface();
        let b = surface.add_sheet("b.css", Vec::new());
        let (_, a) = surface.add_link("a.css", vec![import("b.css", Some(b))]);
        // b imports a again
        surface.push_rule(b, import("a.css", Some(a)));

        let imports = collect_imports(&mut surface, &ClientLog::default());
        let parents: Vec<_> = imports.iter().map(|i| i.target.parent).collect();
        assert_eq!(parents, [a, b]);
    }

    #[test]
    fn test_unreadable_sheets_are_skipped() {
        let mut surface = surface();
        let (_, cdn) = surface.add_link("https://cdn.example.com/x.css", vec![import("y.css", None)]);
        surface.set_cross_origin(cdn);
        surface.add_link("local.css", vec![import("z.css", None)]);

        let imports = collect_imports(&mut surface, &ClientLog::default());
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].href, "z.css");
    }

    #[test]
    fn test_swap_link_inserts_busted_clone() {
        let mut surface = surface();
        surface.set_now(42);
        let (link, _) = surface.add_link("a.css?v=1", Vec::new());
        let href = Url::parse("http://localhost:8080/a.css?v=1").unwrap();

        let swap = swap_link(&mut surface, link, &href, 42).unwrap();
        assert_eq!(swap.original, link);
        assert_eq!(swap.started, 42);
        assert_eq!(
            surface.link_hrefs(),
            [
                "http://localhost:8080/a.css?v=1",
                "http://localhost:8080/a.css?v=1&watchreload=42"
            ]
        );
        assert!(surface.links()[0].reloading);
        assert_eq!(surface.probe_stylesheet(swap.clone), SheetProbe::Missing);
    }

    #[test]
    fn test_rewrite_import_keeps_rule_count() {
        let mut surface = surface();
        let sheet = surface.add_style_element(vec![
            CssRule::Import {
                href: "theme.css".into(),
                media: MediaText::List(vec!["screen".into(), "print".into()]),
                sheet: None,
            },
            CssRule::Other,
        ]);
        let imports = collect_imports(&mut surface, &ClientLog::default());
        let location = surface.location();
        let full = imports[0].full_href(&location).unwrap().clone();

        rewrite_import(&mut surface, &imports[0].target, &full, 7).unwrap();

        let rules = surface.rules(sheet);
        assert_eq!(rules.len(), 2);
        let CssRule::Import { href, media, .. } = &rules[0] else {
            panic!("expected import, got {:?}", rules[0]);
        };
        assert_eq!(href, "http://localhost:8080/theme.css?watchreload=7");
        assert_eq!(media, &MediaText::Text("screen, print".into()));
        assert_eq!(rules[1], CssRule::Other);
    }
}
