//! Stylesheet load detection for the link swap.
//!
//! Hosts whose link elements fire `load`/`error` report them through the
//! reloader. Others are polled: the clone's sheet object is probed on every
//! tick until the engine-specific rule says it is loaded.

use crate::client::surface::{Capabilities, Engine, NodeId, RuleAccess, SheetProbe};

/// How the end of a stylesheet download is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDetection {
    NativeEvent,
    Poll(Engine),
}

impl LoadDetection {
    pub fn select(capabilities: Capabilities) -> Self {
        if capabilities.native_load_event {
            Self::NativeEvent
        } else {
            Self::Poll(capabilities.engine)
        }
    }

    /// Whether `probe` means the sheet finished loading.
    ///
    /// WebKit exposes a sheet object once loaded and `null` for cross-origin
    /// sheets. Elsewhere the rule list must be readable; a security error
    /// while reading it also means the download is done.
    pub fn is_loaded(engine: Engine, probe: SheetProbe) -> bool {
        match engine {
            Engine::Webkit => matches!(probe, SheetProbe::Present(_) | SheetProbe::Null),
            Engine::Gecko | Engine::Other => matches!(
                probe,
                SheetProbe::Present(RuleAccess::Readable | RuleAccess::SecurityError)
            ),
        }
    }
}

/// A link waiting for its clone to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSwap {
    pub original: NodeId,
    pub clone: NodeId,
    /// Surface time when the clone was inserted
    pub started: u64,
}
