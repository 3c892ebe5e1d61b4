//! Render Surface
//!
//! The page as the reload engine sees it: stylesheet links, the CSSOM,
//! images and inline styles. A browser host implements [`RenderSurface`]
//! over the real DOM; [`super::memory::MemorySurface`] keeps everything in
//! memory.
//!
//! Node and sheet handles are opaque ids handed out by the surface.

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::logger::LogLevel;

/// DOM element handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Stylesheet handle (document sheet or `@import` target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// Failure reported by the surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// Rule list of a cross-origin stylesheet
    #[error("security error: rules of {0} are not accessible")]
    SecurityError(SheetId),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown stylesheet {0}")]
    UnknownSheet(SheetId),
    #[error("rule rejected: {0}")]
    InvalidRule(String),
    #[error("rule index {index} out of range ({len} rules)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// `<link rel="stylesheet">` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub node: NodeId,
    pub href: String,
    /// Replaced by a clone that has not finished loading yet
    pub reloading: bool,
}

/// `<img>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub node: NodeId,
    pub src: String,
}

/// Media list of an `@import` rule.
///
/// Older engines expose a list of media queries instead of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaText {
    Text(String),
    List(Vec<String>),
}

impl MediaText {
    pub fn to_css(&self) -> String {
        match self {
            MediaText::Text(text) => text.clone(),
            MediaText::List(items) => items.join(", "),
        }
    }
}

impl Default for MediaText {
    fn default() -> Self {
        MediaText::Text(String::new())
    }
}

/// The parts of a CSS rule the reload engine looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssRule {
    Import {
        /// Href as reported by the rule
        href: String,
        media: MediaText,
        /// Imported sheet, once loaded
        sheet: Option<SheetId>,
    },
    Style {
        /// `(property, value)` in declaration order
        declarations: Vec<(String, String)>,
    },
    Media {
        rules: Vec<CssRule>,
    },
    Other,
}

impl CssRule {
    /// Value of `property` on a style rule.
    pub fn property(&self, property: &str) -> Option<&str> {
        match self {
            CssRule::Style { declarations } => declarations
                .iter()
                .find(|(name, _)| name == property)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// Rule-list readability of a loaded stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAccess {
    Readable,
    /// Still downloading (reading throws a non-security error)
    NotReady,
    /// Cross-origin
    SecurityError,
}

/// What a stylesheet element exposes while it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetProbe {
    /// No sheet object yet
    Missing,
    /// Sheet object is null (cross-origin on WebKit)
    Null,
    Present(RuleAccess),
}

/// Browser engine family, for load polling rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    Webkit,
    Gecko,
    #[default]
    Other,
}

/// What the host can do natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Link elements fire `load`/`error`
    pub native_load_event: bool,
    pub engine: Engine,
}

/// Page access used by the reload engine.
pub trait RenderSurface {
    fn capabilities(&self) -> Capabilities;

    /// Document URL
    fn location(&self) -> Url;

    /// Current time in milliseconds, used as cache-bust stamp
    fn now_millis(&self) -> u64;

    // ---- stylesheets ----

    /// Stylesheet links in document order
    fn links(&self) -> Vec<LinkInfo>;

    /// Document stylesheets (links and `<style>` elements) in order
    fn stylesheets(&self) -> Vec<SheetId>;

    /// Absolute href of a sheet; `None` for inline `<style>` sheets
    fn sheet_href(&self, sheet: SheetId) -> Option<String>;

    fn css_rules(&self, sheet: SheetId) -> Result<Vec<CssRule>, SurfaceError>;

    fn rule_count(&self, sheet: SheetId) -> Result<usize, SurfaceError>;

    fn insert_rule(&mut self, sheet: SheetId, rule: &str, index: usize) -> Result<(), SurfaceError>;

    fn delete_rule(&mut self, sheet: SheetId, index: usize) -> Result<(), SurfaceError>;

    /// Set a declaration on the style rule at `path` (indices from the
    /// sheet's rule list down through nested media rules)
    fn set_rule_property(
        &mut self,
        sheet: SheetId,
        path: &[usize],
        property: &str,
        value: &str,
    ) -> Result<(), SurfaceError>;

    // ---- link swap ----

    /// Shallow clone, not yet in the document
    fn clone_node(&mut self, node: NodeId) -> Result<NodeId, SurfaceError>;

    fn set_link_href(&mut self, node: NodeId, href: &str) -> Result<(), SurfaceError>;

    fn set_reloading(&mut self, node: NodeId, reloading: bool) -> Result<(), SurfaceError>;

    /// Insert `node` right after `anchor`
    fn insert_after(&mut self, node: NodeId, anchor: NodeId) -> Result<(), SurfaceError>;

    /// Detach `node`; a node without parent is left alone
    fn remove_node(&mut self, node: NodeId) -> Result<(), SurfaceError>;

    /// Sheet state of a link element, for load polling
    fn probe_stylesheet(&self, node: NodeId) -> SheetProbe;

    // ---- images ----

    fn images(&self) -> Vec<ImageInfo>;

    fn set_image_src(&mut self, node: NodeId, src: &str) -> Result<(), SurfaceError>;

    /// Elements carrying a `style` attribute
    fn styled_elements(&self) -> Vec<NodeId>;

    fn inline_style(&self, node: NodeId, property: &str) -> Option<String>;

    fn set_inline_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), SurfaceError>;

    // ---- page ----

    fn reload_page(&mut self);

    fn console(&mut self, level: LogLevel, message: &str);
}
