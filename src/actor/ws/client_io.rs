use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::registry::{ClientTransport, Registry, TransportError};
use crate::actor::messages::WsMsg;

/// Interval between non-blocking read sweeps
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A WebSocket client in non-blocking mode.
pub struct WsClient {
    ws: WebSocket<TcpStream>,
}

/// Result of one non-blocking read.
enum ReadOutcome {
    /// Nothing buffered
    Idle,
    Text(String),
    /// Control or binary frame, nothing to forward
    Skipped,
    Closed,
}

impl WsClient {
    pub fn new(ws: WebSocket<TcpStream>) -> Self {
        Self { ws }
    }

    fn read_frame(&mut self) -> ReadOutcome {
        match self.ws.read() {
            Ok(Message::Text(text)) => ReadOutcome::Text(text.as_str().to_owned()),
            Ok(Message::Close(_)) => ReadOutcome::Closed,
            Ok(_) => ReadOutcome::Skipped,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                ReadOutcome::Idle
            }
            Err(_) => ReadOutcome::Closed,
        }
    }
}

impl ClientTransport for WsClient {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        match self.ws.send(Message::text(text.to_owned())) {
            Ok(()) => Ok(()),
            // Frame stays queued and goes out with the next write
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(TransportError::Closed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        let _ = self.ws.close(None);
        let _ = self.ws.flush();
    }
}

/// Poll every client for inbound frames and forward them to the actor.
///
/// Stops once the actor's channel is closed.
pub(super) fn client_reader_loop(registry: Arc<Mutex<Registry<WsClient>>>, tx: mpsc::Sender<WsMsg>) {
    while !tx.is_closed() {
        std::thread::sleep(POLL_INTERVAL);

        let inbound = {
            let mut registry = registry.lock();
            let mut inbound = Vec::new();
            for session in registry.sessions_mut() {
                loop {
                    match session.transport.read_frame() {
                        ReadOutcome::Text(text) => inbound.push(WsMsg::ClientText {
                            id: session.id,
                            text,
                        }),
                        ReadOutcome::Skipped => continue,
                        ReadOutcome::Closed => {
                            inbound.push(WsMsg::ClientClosed(session.id));
                            break;
                        }
                        ReadOutcome::Idle => break,
                    }
                }
            }
            inbound
        };

        for msg in inbound {
            if tx.blocking_send(msg).is_err() {
                return;
            }
        }
    }
}
