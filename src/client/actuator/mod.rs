//! Reload Actuator
//!
//! Applies reload commands to a [`RenderSurface`].
//!
//! # Styles
//!
//! ```text
//! link pool ──┐                    ┌─ link   → clone, bust, insert, wait, remove
//!             ├─ full matches ─────┤
//! @imports ───┘                    └─ import → rewrite rule in place
//!             (none) → page reload
//! ```
//!
//! # Link swap
//!
//! The original link is marked reloading and is left out of later pools
//! until its clone loads. A swap started on a clone that is itself still
//! pending completes the whole chain at once.

mod image;
mod load;
mod style;

use std::time::Duration;

pub use image::IMAGE_PROPERTIES;
pub use load::{LoadDetection, PendingSwap};
pub use style::ImportRef;

use image::ImagePass;

use super::log::ClientLog;
use super::matcher::find_full_matches;
use super::surface::{NodeId, RenderSurface};

/// What a command did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stylesheets refreshed without a page reload
    Styles { links: usize, imports: usize },
    /// Image references refreshed
    Images(usize),
    PageReload,
    /// Options replaced by `init`
    Configured,
    Ignored,
}

#[derive(Debug)]
pub struct Actuator {
    detection: LoadDetection,
    poll_timeout: Option<Duration>,
    pending: Vec<PendingSwap>,
}

impl Actuator {
    pub fn new(detection: LoadDetection, poll_timeout: Option<Duration>) -> Self {
        Self {
            detection,
            poll_timeout,
            pending: Vec::new(),
        }
    }

    pub fn detection(&self) -> LoadDetection {
        self.detection
    }

    /// Swaps still waiting for their clone.
    pub fn pending(&self) -> &[PendingSwap] {
        &self.pending
    }

    pub fn reload_page<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog, path: &str) -> Outcome {
        log.info(surface, &format!("reloading page ({path})"));
        surface.reload_page();
        Outcome::PageReload
    }

    /// Reload every stylesheet link and `@import` fully matching `path`,
    /// or the page when there is none.
    pub fn reload_css<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog, path: &str) -> Outcome {
        let location = surface.location();
        let stamp = surface.now_millis();

        let links = style::link_pool(surface);
        let imports = style::collect_imports(surface, log);

        let link_targets: Vec<_> = find_full_matches(path, &links, &location)
            .into_iter()
            .filter_map(|m| Some((m.file.target, m.file.full_href(&location)?.clone())))
            .collect();
        let import_targets: Vec<_> = find_full_matches(path, &imports, &location)
            .into_iter()
            .filter_map(|m| Some((m.file.target.clone(), m.file.full_href(&location)?.clone())))
            .collect();

        let mut swapped = 0;
        for (link, href) in &link_targets {
            match style::swap_link(surface, *link, href, stamp) {
                Ok(swap) => {
                    log.debug(surface, &format!("swapping {href}"));
                    self.pending.push(swap);
                    swapped += 1;
                }
                Err(e) => log.warn(surface, &format!("cannot reload {href}: {e}")),
            }
        }

        let mut rewritten = 0;
        for (import, href) in &import_targets {
            match style::rewrite_import(surface, import, href, stamp) {
                Ok(()) => {
                    log.debug(surface, &format!("reimporting {href}"));
                    rewritten += 1;
                }
                Err(e) => log.warn(surface, &format!("cannot reimport {href}: {e}")),
            }
        }

        if swapped + rewritten == 0 {
            log.debug(surface, &format!("no stylesheet matches {path}"));
            return self.reload_page(surface, log, path);
        }
        Outcome::Styles {
            links: swapped,
            imports: rewritten,
        }
    }

    /// Reload every image reference fully matching `path`, or the page
    /// when there is none. All passes share one timestamp.
    pub fn reload_image<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog, path: &str) -> Outcome {
        let location = surface.location();
        let pass = ImagePass {
            path,
            location: &location,
            stamp: surface.now_millis(),
        };

        let updated = pass.img_elements(surface, log)
            + pass.inline_styles(surface, log)
            + pass.stylesheet_rules(surface, log);

        if updated == 0 {
            log.debug(surface, &format!("no image matches {path}"));
            return self.reload_page(surface, log, path);
        }
        Outcome::Images(updated)
    }

    /// Native `load` of a stylesheet link.
    ///
    /// A host that fires it supports load events, so polling stops here.
    pub fn on_style_load<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog, node: NodeId) -> bool {
        if let LoadDetection::Poll(_) = self.detection {
            log.debug(surface, "stylesheet load event seen, polling off");
            self.detection = LoadDetection::NativeEvent;
        }
        self.complete(surface, log, node)
    }

    /// Native `error` of a stylesheet link; the swap completes anyway.
    pub fn on_style_error<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog, node: NodeId) -> bool {
        if !self.pending.iter().any(|p| p.clone == node) {
            return false;
        }
        log.warn(surface, &format!("stylesheet {node} failed to load"));
        self.complete(surface, log, node)
    }

    /// Poll pending clones. Returns the number of swaps completed.
    ///
    /// Does nothing under native load events. With a poll timeout set, a
    /// clone pending for longer is assumed loaded.
    pub fn tick<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog) -> usize {
        let LoadDetection::Poll(engine) = self.detection else {
            return 0;
        };
        let now = surface.now_millis();
        let timeout = self.poll_timeout.map(|t| t.as_millis() as u64);

        let ready: Vec<NodeId> = self
            .pending
            .iter()
            .filter(|p| {
                LoadDetection::is_loaded(engine, surface.probe_stylesheet(p.clone))
                    || timeout.is_some_and(|t| now.saturating_sub(p.started) >= t)
            })
            .map(|p| p.clone)
            .collect();

        ready
            .into_iter()
            .filter(|clone| self.complete(surface, log, *clone))
            .count()
    }

    /// Finish the swap whose clone is `clone`. A second signal for the same
    /// clone is a no-op.
    fn complete<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, log: &ClientLog, clone: NodeId) -> bool {
        let Some(index) = self.pending.iter().position(|p| p.clone == clone) else {
            return false;
        };
        let swap = self.pending.remove(index);

        if let Err(e) = surface.remove_node(swap.original) {
            log.warn(surface, &format!("cannot remove {}: {e}", swap.original));
        }
        log.debug(surface, &format!("{} replaced by {}", swap.original, swap.clone));

        // The removed original may itself be a clone waiting to load
        if self.pending.iter().any(|p| p.clone == swap.original) {
            self.complete(surface, log, swap.original);
        }
        true
    }
}

#[cfg(test)]
mod tests;
