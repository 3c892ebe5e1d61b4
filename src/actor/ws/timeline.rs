//! Event Timeline
//!
//! The synchronous core of the WsActor: generation filtering, routing,
//! config reloads, the session registry and client event fan-out. The actor
//! only moves messages between channels and this type.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::registry::{ClientId, ClientTransport, Inbound, Registry};
use crate::actor::coordinator::watch_paths::collect_watch_roots;
use crate::actor::messages::{ClientEvent, FsMsg};
use crate::config::{ClientConfig, WatchConfig};
use crate::reload::classify::ChangeEvent;
use crate::reload::message::Command;
use crate::reload::router::{self, Route};

/// What handling one batch of changes produced.
#[derive(Debug)]
pub enum Batch {
    /// Tagged with an older generation; nothing was sent
    Stale,
    /// Every event routed (or the config reload failed)
    Done,
    /// Config reloaded: the watcher must be restarted with this message
    Restart(FsMsg),
}

pub struct Timeline<T> {
    registry: Arc<Mutex<Registry<T>>>,
    /// Watch set whose events are currently accepted
    generation: u64,
    /// Pass-through client messages
    events: broadcast::Sender<ClientEvent>,
}

impl<T: ClientTransport> Timeline<T> {
    pub fn new(events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
            generation: 0,
            events,
        }
    }

    pub fn registry(&self) -> &Arc<Mutex<Registry<T>>> {
        &self.registry
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Route one batch in order. A config reload ends the batch, the rest
    /// belongs to the torn-down watch set.
    pub fn handle_changes(&mut self, generation: u64, events: &[ChangeEvent], config: &WatchConfig) -> Batch {
        if generation != self.generation {
            crate::debug!("ws"; "dropping {} events from generation {}", events.len(), generation);
            return Batch::Stale;
        }

        for event in events {
            match router::route(event, config) {
                Route::Broadcast(command) => self.publish(&command),
                Route::ReloadConfig => return self.reload_config(),
            }
        }
        Batch::Done
    }

    /// Re-read the config and re-send `init`. The previous config stays
    /// active when the file cannot be loaded.
    fn reload_config(&mut self) -> Batch {
        crate::log!("config"; "config file changed, reloading");

        let config = match crate::config::reload_config() {
            Ok(config) => config,
            Err(e) => {
                crate::error!("config"; "reload failed, keeping previous config: {}", e);
                return Batch::Done;
            }
        };

        self.generation += 1;
        self.publish(&router::init_command(&config));
        Batch::Restart(restart_msg(self.generation, &config))
    }

    pub fn publish(&self, command: &Command) {
        match command.path() {
            Some(path) => crate::log!("reload"; "{} {}", command.name(), path),
            None => crate::debug!("reload"; "{}", command.name()),
        }
        self.registry.lock().broadcast(command);
    }

    /// Add a session and greet it with `init` for `config`.
    pub fn connect(&self, transport: T, config: &WatchConfig) -> Option<ClientId> {
        self.registry
            .lock()
            .connect(transport, &router::init_command(config))
    }

    pub fn disconnect(&self, id: ClientId) {
        if self.registry.lock().disconnect(id) {
            crate::log!("ws"; "client {} disconnected", id);
        }
    }

    /// Handle a text frame from `id`. Accepted events go to every subscriber.
    pub fn client_text(&self, id: ClientId, text: &str, client: &ClientConfig) {
        let inbound = self.registry.lock().handle_text(id, text, client);

        match inbound {
            Inbound::Registered(name) => crate::log!("ws"; "client {} registered: {}", id, name),
            Inbound::Disconnected => crate::log!("ws"; "client {} disconnected", id),
            Inbound::Event(message) => {
                crate::debug!("client"; "{} from {}", message.kind, id);
                // No subscribers is fine
                let _ = self.events.send(ClientEvent { client: id, message });
            }
            Inbound::Ignored => {}
        }
    }

    pub fn close_all(&self) {
        self.registry.lock().close_all();
    }
}

/// Restart request for the watch set described by `config`.
fn restart_msg(generation: u64, config: &WatchConfig) -> FsMsg {
    FsMsg::Restart {
        generation,
        roots: collect_watch_roots(config),
        filter: config.file_filter.clone(),
        config_path: config.config_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::actor::ws::memory::MemoryTransport;
    use crate::config::{Overrides, cfg, init_config, test_parse_config};
    use crate::reload::classify::ChangeKind;

    fn timeline() -> (Timeline<MemoryTransport>, broadcast::Receiver<ClientEvent>) {
        let (tx, rx) = broadcast::channel(8);
        (Timeline::new(tx), rx)
    }

    #[test]
    fn test_config_reload_sequence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watchreload.toml");
        fs::write(&path, "log_level = \"info\"\n").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();

        let overrides = Overrides {
            port: None,
            base_path: None,
            explicit: true,
        };
        let config = init_config(WatchConfig::load(&path, overrides).unwrap());

        let (mut timeline, _rx) = timeline();
        let client = MemoryTransport::default();
        timeline.connect(client.clone(), &config).unwrap();
        assert_eq!(client.frames().len(), 1);

        // Malformed rewrite: old config kept, no init, same generation
        fs::write(&path, "port = [\n").unwrap();
        let before = cfg();
        let batch = timeline.handle_changes(0, &[ChangeEvent::new(ChangeKind::Changed, &path)], &before);
        assert!(matches!(batch, Batch::Done));
        assert!(Arc::ptr_eq(&cfg(), &before));
        assert_eq!(client.frames().len(), 1);
        assert_eq!(timeline.generation(), 0);

        // Valid rewrite: new init, restart, rest of the batch dropped
        fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let css = dir.path().join("css/main.css");
        let events = [
            ChangeEvent::new(ChangeKind::Changed, &path),
            ChangeEvent::new(ChangeKind::Changed, &css),
        ];
        let (generation, config_path) = match timeline.handle_changes(0, &events, &cfg()) {
            Batch::Restart(FsMsg::Restart { generation, config_path, .. }) => (generation, config_path),
            other => panic!("expected a watcher restart, got {other:?}"),
        };
        assert_eq!(generation, 1);
        assert_eq!(config_path, cfg().config_path);
        assert_eq!(cfg().log_level, "debug");

        let frames = client.frames();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains(r#""type":"init""#));
        assert!(frames[1].contains(r#""logLevel":"debug""#));

        // Late batch from the torn-down watcher
        let stale = [ChangeEvent::new(ChangeKind::Changed, &css)];
        assert!(matches!(timeline.handle_changes(0, &stale, &cfg()), Batch::Stale));
        assert_eq!(client.frames().len(), 2);

        assert!(matches!(timeline.handle_changes(1, &stale, &cfg()), Batch::Done));
        assert!(client.frames()[2].contains(r#""type":"reloadCSS""#));
    }

    #[test]
    fn test_changes_routed_in_order() {
        let config = test_parse_config("");
        let (mut timeline, _rx) = timeline();
        let client = MemoryTransport::default();
        timeline.connect(client.clone(), &config).unwrap();

        let events = [
            ChangeEvent::new(ChangeKind::Changed, "/project/css/main.css"),
            ChangeEvent::new(ChangeKind::Deleted, "/project/index.html"),
        ];
        assert!(matches!(timeline.handle_changes(0, &events, &config), Batch::Done));

        let frames = client.frames();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].contains(r#""type":"reloadCSS""#));
        assert!(frames[2].contains(r#""type":"reloadPage""#));
    }

    #[test]
    fn test_future_generation_is_dropped() {
        let config = test_parse_config("");
        let (mut timeline, _rx) = timeline();
        let client = MemoryTransport::default();
        timeline.connect(client.clone(), &config).unwrap();

        let events = [ChangeEvent::new(ChangeKind::Changed, "/project/index.html")];
        assert!(matches!(timeline.handle_changes(3, &events, &config), Batch::Stale));
        assert_eq!(client.frames().len(), 1);
    }

    #[test]
    fn test_accepted_client_events_reach_subscribers() {
        let config = test_parse_config("[client]\nmessage_types = [\"scroll\"]");
        let (timeline, mut rx) = timeline();
        let id = timeline.connect(MemoryTransport::default(), &config).unwrap();

        timeline.client_text(id, r#"{"type":"scroll","y":1}"#, &config.client);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.client, id);
        assert_eq!(event.message.kind, "scroll");
        assert_eq!(event.message.to_json(), r#"{"type":"scroll","y":1}"#);

        timeline.client_text(id, r#"{"type":"unlisted"}"#, &config.client);
        timeline.client_text(id, r#"{"type":"register","name":"Firefox"}"#, &config.client);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_events_without_subscribers_are_dropped() {
        let config = test_parse_config("[client]\nmessage_types = [\"scroll\"]");
        let (timeline, rx) = timeline();
        drop(rx);
        let client = MemoryTransport::default();
        let id = timeline.connect(client.clone(), &config).unwrap();

        timeline.client_text(id, r#"{"type":"scroll","y":1}"#, &config.client);
        assert_eq!(timeline.registry().lock().len(), 1);
    }
}
