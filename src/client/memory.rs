//! In-memory [`RenderSurface`].
//!
//! A small document model holding stylesheet links, `<style>` sheets,
//! images and inline styles. Hosts without a DOM (and the tests) drive the
//! reload engine through it; loading is simulated with [`MemorySurface::finish_load`].

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use url::Url;

use super::surface::{
    Capabilities, CssRule, ImageInfo, LinkInfo, MediaText, NodeId, RenderSurface, RuleAccess,
    SheetId, SheetProbe, SurfaceError,
};
use super::url::resolve;
use crate::logger::LogLevel;

/// `@import url("<href>") <media>;` as produced by the import rewrite.
static IMPORT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*@import\s+url\(\s*"([^"]*)"\s*\)\s*([^;]*);?\s*$"#)
        .expect("valid import rule regex")
});

#[derive(Debug, Clone)]
enum Node {
    Link {
        href: String,
        reloading: bool,
        sheet: Option<SheetId>,
        probe: SheetProbe,
    },
    StyleElement {
        sheet: SheetId,
    },
    Image {
        src: String,
    },
    Styled {
        style: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone)]
struct Sheet {
    href: Option<String>,
    rules: Vec<CssRule>,
    cross_origin: bool,
}

/// Document kept in memory.
#[derive(Debug)]
pub struct MemorySurface {
    location: Url,
    capabilities: Capabilities,
    now: u64,
    next_node: u32,
    next_sheet: u32,
    /// Attached nodes in document order
    document: Vec<NodeId>,
    nodes: FxHashMap<NodeId, Node>,
    sheets: FxHashMap<SheetId, Sheet>,
    removed: Vec<NodeId>,
    reloads: usize,
    console: Vec<(LogLevel, String)>,
}

impl MemorySurface {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            capabilities: Capabilities {
                native_load_event: true,
                ..Capabilities::default()
            },
            now: 1,
            next_node: 1,
            next_sheet: 1,
            document: Vec::new(),
            nodes: FxHashMap::default(),
            sheets: FxHashMap::default(),
            removed: Vec::new(),
            reloads: 0,
            console: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn set_now(&mut self, millis: u64) {
        self.now = millis;
    }

    // ---- building ----

    /// Attach a loaded `<link rel="stylesheet">` with `rules`.
    pub fn add_link(&mut self, href: &str, rules: Vec<CssRule>) -> (NodeId, SheetId) {
        let href = self.absolute(href);
        let sheet = self.add_sheet_inner(Some(href.clone()), rules);
        let node = self.attach(Node::Link {
            href,
            reloading: false,
            sheet: Some(sheet),
            probe: SheetProbe::Present(RuleAccess::Readable),
        });
        (node, sheet)
    }

    /// Attach a `<style>` element.
    pub fn add_style_element(&mut self, rules: Vec<CssRule>) -> SheetId {
        let sheet = self.add_sheet_inner(None, rules);
        self.attach(Node::StyleElement { sheet });
        sheet
    }

    /// A sheet outside the document, e.g. the target of an `@import`.
    pub fn add_sheet(&mut self, href: &str, rules: Vec<CssRule>) -> SheetId {
        let href = self.absolute(href);
        self.add_sheet_inner(Some(href), rules)
    }

    /// Append a rule to an existing sheet.
    pub fn push_rule(&mut self, sheet: SheetId, rule: CssRule) {
        if let Some(sheet) = self.sheets.get_mut(&sheet) {
            sheet.rules.push(rule);
        }
    }

    pub fn set_cross_origin(&mut self, sheet: SheetId) {
        if let Some(sheet) = self.sheets.get_mut(&sheet) {
            sheet.cross_origin = true;
        }
    }

    pub fn add_image(&mut self, src: &str) -> NodeId {
        let src = self.absolute(src);
        self.attach(Node::Image { src })
    }

    /// Element with inline `style` declarations.
    pub fn add_styled(&mut self, style: &[(&str, &str)]) -> NodeId {
        let style = style
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.attach(Node::Styled { style })
    }

    /// Simulate a link finishing its download: it gets a readable sheet.
    pub fn finish_load(&mut self, node: NodeId) {
        let href = match self.nodes.get(&node) {
            Some(Node::Link { href, .. }) => href.clone(),
            _ => return,
        };
        let sheet = self.add_sheet_inner(Some(href), Vec::new());
        if let Some(Node::Link { sheet: slot, probe, .. }) = self.nodes.get_mut(&node) {
            *slot = Some(sheet);
            *probe = SheetProbe::Present(RuleAccess::Readable);
        }
    }

    pub fn set_probe(&mut self, node: NodeId, state: SheetProbe) {
        if let Some(Node::Link { probe, .. }) = self.nodes.get_mut(&node) {
            *probe = state;
        }
    }

    // ---- inspection ----

    /// Hrefs of attached stylesheet links in document order.
    pub fn link_hrefs(&self) -> Vec<String> {
        self.links().into_iter().map(|l| l.href).collect()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.document.contains(&node)
    }

    /// Nodes detached by `remove_node`, in order.
    pub fn removed(&self) -> &[NodeId] {
        &self.removed
    }

    pub fn image_src(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(&node) {
            Some(Node::Image { src }) => Some(src),
            _ => None,
        }
    }

    pub fn rules(&self, sheet: SheetId) -> &[CssRule] {
        self.sheets.get(&sheet).map_or(&[], |s| s.rules.as_slice())
    }

    pub fn reload_count(&self) -> usize {
        self.reloads
    }

    pub fn console_lines(&self) -> &[(LogLevel, String)] {
        &self.console
    }

    // ---- internals ----

    fn absolute(&self, href: &str) -> String {
        resolve(None, href, &self.location).map_or_else(|| href.to_string(), String::from)
    }

    fn add_sheet_inner(&mut self, href: Option<String>, rules: Vec<CssRule>) -> SheetId {
        let id = SheetId(self.next_sheet);
        self.next_sheet += 1;
        self.sheets.insert(
            id,
            Sheet {
                href,
                rules,
                cross_origin: false,
            },
        );
        id
    }

    fn create(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, node);
        id
    }

    fn attach(&mut self, node: Node) -> NodeId {
        let id = self.create(node);
        self.document.push(id);
        id
    }

    fn sheet(&self, sheet: SheetId) -> Result<&Sheet, SurfaceError> {
        let found = self
            .sheets
            .get(&sheet)
            .ok_or(SurfaceError::UnknownSheet(sheet))?;
        if found.cross_origin {
            return Err(SurfaceError::SecurityError(sheet));
        }
        Ok(found)
    }

    fn sheet_mut(&mut self, sheet: SheetId) -> Result<&mut Sheet, SurfaceError> {
        let found = self
            .sheets
            .get_mut(&sheet)
            .ok_or(SurfaceError::UnknownSheet(sheet))?;
        if found.cross_origin {
            return Err(SurfaceError::SecurityError(sheet));
        }
        Ok(found)
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, SurfaceError> {
        self.nodes.get_mut(&node).ok_or(SurfaceError::UnknownNode(node))
    }
}

impl RenderSurface for MemorySurface {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn location(&self) -> Url {
        self.location.clone()
    }

    fn now_millis(&self) -> u64 {
        self.now
    }

    fn links(&self) -> Vec<LinkInfo> {
        self.document
            .iter()
            .filter_map(|id| match self.nodes.get(id) {
                Some(Node::Link { href, reloading, .. }) => Some(LinkInfo {
                    node: *id,
                    href: href.clone(),
                    reloading: *reloading,
                }),
                _ => None,
            })
            .collect()
    }

    fn stylesheets(&self) -> Vec<SheetId> {
        self.document
            .iter()
            .filter_map(|id| match self.nodes.get(id) {
                Some(Node::Link { sheet, .. }) => *sheet,
                Some(Node::StyleElement { sheet }) => Some(*sheet),
                _ => None,
            })
            .collect()
    }

    fn sheet_href(&self, sheet: SheetId) -> Option<String> {
        self.sheets.get(&sheet).and_then(|s| s.href.clone())
    }

    fn css_rules(&self, sheet: SheetId) -> Result<Vec<CssRule>, SurfaceError> {
        Ok(self.sheet(sheet)?.rules.clone())
    }

    fn rule_count(&self, sheet: SheetId) -> Result<usize, SurfaceError> {
        Ok(self.sheet(sheet)?.rules.len())
    }

    fn insert_rule(&mut self, sheet: SheetId, rule: &str, index: usize) -> Result<(), SurfaceError> {
        let caps = IMPORT_RULE
            .captures(rule)
            .ok_or_else(|| SurfaceError::InvalidRule(rule.to_string()))?;
        let href = caps[1].to_string();
        let media = MediaText::Text(caps[2].trim().to_string());

        let len = self.sheet(sheet)?.rules.len();
        if index > len {
            return Err(SurfaceError::IndexOutOfRange { index, len });
        }

        let imported = self.add_sheet(&href, Vec::new());
        self.sheet_mut(sheet)?.rules.insert(
            index,
            CssRule::Import {
                href,
                media,
                sheet: Some(imported),
            },
        );
        Ok(())
    }

    fn delete_rule(&mut self, sheet: SheetId, index: usize) -> Result<(), SurfaceError> {
        let rules = &mut self.sheet_mut(sheet)?.rules;
        if index >= rules.len() {
            return Err(SurfaceError::IndexOutOfRange {
                index,
                len: rules.len(),
            });
        }
        rules.remove(index);
        Ok(())
    }

    fn set_rule_property(
        &mut self,
        sheet: SheetId,
        path: &[usize],
        property: &str,
        value: &str,
    ) -> Result<(), SurfaceError> {
        let Some((&last, parents)) = path.split_last() else {
            return Err(SurfaceError::InvalidRule("empty rule path".into()));
        };

        let mut rules = &mut self.sheet_mut(sheet)?.rules;
        for &index in parents {
            let len = rules.len();
            match rules.get_mut(index) {
                Some(CssRule::Media { rules: nested }) => rules = nested,
                Some(_) => return Err(SurfaceError::InvalidRule(format!("rule {index} is not a media rule"))),
                None => return Err(SurfaceError::IndexOutOfRange { index, len }),
            }
        }

        let len = rules.len();
        match rules.get_mut(last) {
            Some(CssRule::Style { declarations }) => {
                match declarations.iter_mut().find(|(name, _)| name == property) {
                    Some((_, slot)) => *slot = value.to_string(),
                    None => declarations.push((property.to_string(), value.to_string())),
                }
                Ok(())
            }
            Some(_) => Err(SurfaceError::InvalidRule(format!("rule {last} is not a style rule"))),
            None => Err(SurfaceError::IndexOutOfRange { index: last, len }),
        }
    }

    fn clone_node(&mut self, node: NodeId) -> Result<NodeId, SurfaceError> {
        let clone = match self.nodes.get(&node) {
            Some(Node::Link { href, .. }) => Node::Link {
                href: href.clone(),
                reloading: false,
                sheet: None,
                probe: SheetProbe::Missing,
            },
            Some(other) => other.clone(),
            None => return Err(SurfaceError::UnknownNode(node)),
        };
        Ok(self.create(clone))
    }

    fn set_link_href(&mut self, node: NodeId, value: &str) -> Result<(), SurfaceError> {
        let value = self.absolute(value);
        match self.node_mut(node)? {
            Node::Link { href, .. } => {
                *href = value;
                Ok(())
            }
            _ => Err(SurfaceError::UnknownNode(node)),
        }
    }

    fn set_reloading(&mut self, node: NodeId, value: bool) -> Result<(), SurfaceError> {
        match self.node_mut(node)? {
            Node::Link { reloading, .. } => {
                *reloading = value;
                Ok(())
            }
            _ => Err(SurfaceError::UnknownNode(node)),
        }
    }

    fn insert_after(&mut self, node: NodeId, anchor: NodeId) -> Result<(), SurfaceError> {
        if !self.nodes.contains_key(&node) {
            return Err(SurfaceError::UnknownNode(node));
        }
        let position = self
            .document
            .iter()
            .position(|id| *id == anchor)
            .ok_or(SurfaceError::UnknownNode(anchor))?;
        self.document.retain(|id| *id != node);
        let position = position.min(self.document.len().saturating_sub(1));
        self.document.insert(position + 1, node);
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        if !self.nodes.contains_key(&node) {
            return Err(SurfaceError::UnknownNode(node));
        }
        let before = self.document.len();
        self.document.retain(|id| *id != node);
        if self.document.len() != before {
            self.removed.push(node);
        }
        Ok(())
    }

    fn probe_stylesheet(&self, node: NodeId) -> SheetProbe {
        match self.nodes.get(&node) {
            Some(Node::Link { probe, .. }) => *probe,
            _ => SheetProbe::Missing,
        }
    }

    fn images(&self) -> Vec<ImageInfo> {
        self.document
            .iter()
            .filter_map(|id| match self.nodes.get(id) {
                Some(Node::Image { src }) => Some(ImageInfo {
                    node: *id,
                    src: src.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn set_image_src(&mut self, node: NodeId, value: &str) -> Result<(), SurfaceError> {
        let value = self.absolute(value);
        match self.node_mut(node)? {
            Node::Image { src } => {
                *src = value;
                Ok(())
            }
            _ => Err(SurfaceError::UnknownNode(node)),
        }
    }

    fn styled_elements(&self) -> Vec<NodeId> {
        self.document
            .iter()
            .filter(|id| matches!(self.nodes.get(id), Some(Node::Styled { .. })))
            .copied()
            .collect()
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Option<String> {
        match self.nodes.get(&node) {
            Some(Node::Styled { style }) => style
                .iter()
                .find(|(name, _)| name == property)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    fn set_inline_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), SurfaceError> {
        match self.node_mut(node)? {
            Node::Styled { style } => {
                match style.iter_mut().find(|(name, _)| name == property) {
                    Some((_, slot)) => *slot = value.to_string(),
                    None => style.push((property.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(SurfaceError::UnknownNode(node)),
        }
    }

    fn reload_page(&mut self) {
        self.reloads += 1;
    }

    fn console(&mut self, level: LogLevel, message: &str) {
        self.console.push((level, message.to_string()));
    }
}
