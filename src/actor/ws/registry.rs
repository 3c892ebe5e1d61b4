//! Session Registry
//!
//! Connected clients, in connection order. Every mutation happens on the
//! WsActor loop; broadcast walks the live sessions at dispatch time with no
//! queue and no replay.

use std::fmt;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::reload::message::{ClientMessage, Command};

/// Identifier assigned on connect, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure to deliver a frame to one client.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("client connection closed")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Outgoing side of one client connection.
pub trait ClientTransport {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;
    fn close(&mut self);
}

/// One connected client.
pub struct ClientSession<T> {
    pub id: ClientId,
    /// Reported by `register` (diagnostic only)
    pub user_agent: Option<String>,
    pub registered_at: Option<DateTime<Local>>,
    pub(super) transport: T,
}

/// What an inbound client frame turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Registered(String),
    Disconnected,
    /// Accepted message type, re-emitted as-is
    Event(ClientMessage),
    /// Not JSON, no `type`, or a type not in `[client] message_types`
    Ignored,
}

/// Connected sessions.
pub struct Registry<T> {
    sessions: Vec<ClientSession<T>>,
    next_id: u64,
}

impl<T: ClientTransport> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ClientTransport> Registry<T> {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: ClientId) -> Option<&ClientSession<T>> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub(super) fn sessions_mut(&mut self) -> impl Iterator<Item = &mut ClientSession<T>> {
        self.sessions.iter_mut()
    }

    /// Add a session and send it a targeted `init`.
    ///
    /// Returns `None` if the init could not be delivered (session dropped).
    pub fn connect(&mut self, mut transport: T, init: &Command) -> Option<ClientId> {
        let id = ClientId(self.next_id);
        self.next_id += 1;

        if let Err(e) = transport.send_text(&init.to_json()) {
            crate::debug!("ws"; "init to {} failed: {}", id, e);
            transport.close();
            return None;
        }

        self.sessions.push(ClientSession {
            id,
            user_agent: None,
            registered_at: None,
            transport,
        });
        Some(id)
    }

    /// Remove a session. Returns whether it was present.
    pub fn disconnect(&mut self, id: ClientId) -> bool {
        let Some(pos) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        let mut session = self.sessions.remove(pos);
        session.transport.close();
        true
    }

    /// Store the identity reported by `register`.
    pub fn register(&mut self, id: ClientId, user_agent: &str) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        session.user_agent = Some(user_agent.to_string());
        session.registered_at = Some(Local::now());
        true
    }

    /// Send to one session; a failed send drops it.
    pub fn send_to(&mut self, id: ClientId, command: &Command) -> bool {
        let text = command.to_json();
        let Some(pos) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        match self.sessions[pos].transport.send_text(&text) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client {} dropped: {}", id, e);
                self.sessions.remove(pos);
                false
            }
        }
    }

    /// Send to every live session. Returns how many received it.
    pub fn broadcast(&mut self, command: &Command) -> usize {
        if self.sessions.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return 0;
        }

        let text = command.to_json();
        let mut sent = 0;
        self.sessions
            .retain_mut(|session| match session.transport.send_text(&text) {
                Ok(()) => {
                    sent += 1;
                    true
                }
                Err(e) => {
                    crate::debug!("ws"; "client {} dropped: {}", session.id, e);
                    false
                }
            });
        crate::debug!("ws"; "{} sent to {} clients", command.name(), sent);
        sent
    }

    /// Interpret a text frame from `id`.
    pub fn handle_text(&mut self, id: ClientId, text: &str, client: &ClientConfig) -> Inbound {
        let Some(message) = ClientMessage::from_json(text) else {
            crate::debug!("ws"; "unreadable message from {}: {}", id, text);
            return Inbound::Ignored;
        };

        if !client.accepts(&message.kind) {
            crate::debug!("ws"; "message type `{}` not accepted", message.kind);
            return Inbound::Ignored;
        }

        match message.kind.as_str() {
            "register" => {
                let name = message.register_name().unwrap_or_default().to_string();
                self.register(id, &name);
                Inbound::Registered(name)
            }
            "disconnect" => {
                self.disconnect(id);
                Inbound::Disconnected
            }
            _ => Inbound::Event(message),
        }
    }

    /// Close every connection.
    pub fn close_all(&mut self) {
        for mut session in self.sessions.drain(..) {
            session.transport.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ws::memory::MemoryTransport;
    use crate::reload::message::LivereloadTable;

    fn init() -> Command {
        Command::init("info", LivereloadTable::default())
    }

    fn client_config() -> ClientConfig {
        let mut config = ClientConfig {
            message_types: vec!["scroll".into()],
        };
        config.merge_defaults();
        config
    }

    #[test]
    fn test_connect_sends_targeted_init() {
        let mut registry = Registry::new();
        let a = MemoryTransport::default();
        let b = MemoryTransport::default();
        registry.connect(a.clone(), &init()).unwrap();
        registry.connect(b.clone(), &init()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(a.frames().len(), 1);
        assert!(a.frames()[0].contains(r#""type":"init""#));
        assert_eq!(b.frames().len(), 1);
    }

    #[test]
    fn test_connect_failure_drops_session() {
        let mut registry = Registry::new();
        assert!(registry.connect(MemoryTransport::broken(), &init()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = Registry::new();
        let a = registry.connect(MemoryTransport::default(), &init()).unwrap();
        assert!(registry.disconnect(a));
        let b = registry.connect(MemoryTransport::default(), &init()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_broadcast_drops_failed_sessions() {
        let mut registry = Registry::new();
        let good = MemoryTransport::default();
        let flaky = MemoryTransport::default();
        registry.connect(good.clone(), &init()).unwrap();
        let flaky_id = registry.connect(flaky.clone(), &init()).unwrap();

        // Connection dies after the handshake
        *flaky.closed.borrow_mut() = true;

        let sent = registry.broadcast(&Command::reload_page("index.html"));
        assert_eq!(sent, 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(flaky_id).is_none());
        assert_eq!(good.frames().len(), 2);
    }

    #[test]
    fn test_broadcast_without_clients() {
        let mut registry: Registry<MemoryTransport> = Registry::new();
        assert_eq!(registry.broadcast(&Command::reload_page("a")), 0);
    }

    #[test]
    fn test_send_to_targets_one_session() {
        let mut registry = Registry::new();
        let a = MemoryTransport::default();
        let b = MemoryTransport::default();
        let a_id = registry.connect(a.clone(), &init()).unwrap();
        registry.connect(b.clone(), &init()).unwrap();

        assert!(registry.send_to(a_id, &init()));
        assert_eq!(a.frames().len(), 2);
        assert_eq!(b.frames().len(), 1);
    }

    #[test]
    fn test_register_stores_identity() {
        let mut registry = Registry::new();
        let id = registry.connect(MemoryTransport::default(), &init()).unwrap();

        let inbound = registry.handle_text(
            id,
            r#"{"type":"register","name":"Firefox/140"}"#,
            &client_config(),
        );
        assert_eq!(inbound, Inbound::Registered("Firefox/140".into()));

        let session = registry.get(id).unwrap();
        assert_eq!(session.user_agent.as_deref(), Some("Firefox/140"));
        assert!(session.registered_at.is_some());
    }

    #[test]
    fn test_pass_through_and_rejected_messages() {
        let mut registry = Registry::new();
        let id = registry.connect(MemoryTransport::default(), &init()).unwrap();
        let config = client_config();

        match registry.handle_text(id, r#"{"type":"scroll","y":10}"#, &config) {
            Inbound::Event(msg) => assert_eq!(msg.kind, "scroll"),
            other => panic!("expected pass-through event, got {other:?}"),
        }
        assert_eq!(
            registry.handle_text(id, r#"{"type":"unlisted"}"#, &config),
            Inbound::Ignored
        );
        assert_eq!(registry.handle_text(id, "garbage", &config), Inbound::Ignored);
    }

    #[test]
    fn test_disconnect_message_removes_session() {
        let mut registry = Registry::new();
        let transport = MemoryTransport::default();
        let id = registry.connect(transport.clone(), &init()).unwrap();

        let inbound = registry.handle_text(id, r#"{"type":"disconnect"}"#, &client_config());
        assert_eq!(inbound, Inbound::Disconnected);
        assert!(registry.is_empty());
        assert!(*transport.closed.borrow());
    }

    #[test]
    fn test_close_all() {
        let mut registry = Registry::new();
        let a = MemoryTransport::default();
        registry.connect(a.clone(), &init()).unwrap();
        registry.close_all();
        assert!(registry.is_empty());
        assert!(*a.closed.borrow());
    }
}
