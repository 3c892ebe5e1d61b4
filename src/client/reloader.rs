//! Client-side command handling.
//!
//! A [`Reloader`] owns a surface and turns server commands into page
//! updates. The host feeds it:
//!
//! - text frames from the WebSocket ([`Reloader::handle_message`])
//! - stylesheet `load`/`error` events, or timer ticks when polling
//!
//! and sends back what [`Reloader::register_message`] and
//! [`Reloader::event_message`] produce.

use std::time::Duration;

use serde_json::{Map, Value};

use super::actuator::{Actuator, LoadDetection, Outcome};
use super::log::ClientLog;
use super::surface::{NodeId, RenderSurface};
use crate::logger::LogLevel;
use crate::reload::message::{ClientMessage, Command, LivereloadTable};

/// Interval hosts should tick at when load events are polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct ReloaderOptions {
    /// Assume a polled stylesheet loaded after this long (`None` waits forever)
    pub poll_timeout: Option<Duration>,
}

pub struct Reloader<S: RenderSurface> {
    surface: S,
    actuator: Actuator,
    log: ClientLog,
    /// Last snapshot sent by `init`; informational only
    livereload: LivereloadTable,
}

impl<S: RenderSurface> Reloader<S> {
    pub fn new(surface: S, options: ReloaderOptions) -> Self {
        let detection = LoadDetection::select(surface.capabilities());
        Self {
            surface,
            actuator: Actuator::new(detection, options.poll_timeout),
            log: ClientLog::default(),
            livereload: LivereloadTable::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn log_level(&self) -> LogLevel {
        self.log.level()
    }

    pub fn livereload(&self) -> &LivereloadTable {
        &self.livereload
    }

    pub fn detection(&self) -> LoadDetection {
        self.actuator.detection()
    }

    /// Whether stylesheet swaps are still waiting to load.
    pub fn has_pending(&self) -> bool {
        !self.actuator.pending().is_empty()
    }

    /// First frame to send after connecting.
    pub fn register_message(user_agent: &str) -> String {
        ClientMessage::register(user_agent).to_json()
    }

    /// Frame for a named client event; the server re-emits it as is.
    pub fn event_message(kind: &str, payload: Map<String, Value>) -> String {
        ClientMessage {
            kind: kind.to_string(),
            payload,
        }
        .to_json()
    }

    /// Handle one text frame from the server.
    pub fn handle_message(&mut self, text: &str) -> Outcome {
        match Command::from_json(text) {
            Some(command) => self.apply(&command),
            None => {
                let kind = ClientMessage::from_json(text).map(|m| m.kind);
                match kind {
                    Some(kind) => self
                        .log
                        .warn(&mut self.surface, &format!("unknown command type `{kind}`")),
                    None => self
                        .log
                        .warn(&mut self.surface, &format!("malformed message: {text}")),
                }
                Outcome::Ignored
            }
        }
    }

    pub fn apply(&mut self, command: &Command) -> Outcome {
        self.log.debug(
            &mut self.surface,
            &format!("received {} {}", command.name(), command.path().unwrap_or_default()),
        );

        match command {
            Command::Init { log_level, livereload } => {
                self.log.set_level(LogLevel::parse(log_level));
                self.livereload = livereload.clone();
                Outcome::Configured
            }
            Command::ReloadPage { path, .. } => {
                self.actuator.reload_page(&mut self.surface, &self.log, path)
            }
            Command::ReloadCss { path, .. } => {
                self.actuator.reload_css(&mut self.surface, &self.log, path)
            }
            Command::ReloadImage { path, .. } => {
                self.actuator.reload_image(&mut self.surface, &self.log, path)
            }
        }
    }

    pub fn on_style_load(&mut self, node: NodeId) -> bool {
        self.actuator.on_style_load(&mut self.surface, &self.log, node)
    }

    pub fn on_style_error(&mut self, node: NodeId) -> bool {
        self.actuator.on_style_error(&mut self.surface, &self.log, node)
    }

    /// Poll pending stylesheet swaps; call every [`POLL_INTERVAL`].
    pub fn tick(&mut self) -> usize {
        self.actuator.tick(&mut self.surface, &self.log)
    }
}
