//! WebSocket Listener
//!
//! Accepts TCP connections on the configured interface, performs the
//! WebSocket handshake and hands the socket to the WsActor.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Upper bound for a client to complete the handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the listener thread. Returns the port actually bound.
pub fn start_ws_server(interface: IpAddr, base_port: u16, ws_tx: mpsc::Sender<WsMsg>) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("serve"; "tcp connection from {}", addr);

                    let Some(ws) = handshake(stream) else {
                        continue;
                    };

                    if ws_tx.blocking_send(WsMsg::AddClient(ws)).is_err() {
                        crate::debug!("serve"; "listener stopped");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if ws_tx.is_closed() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::warn!("serve"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Complete the handshake in blocking mode, then switch to non-blocking
/// reads for the client poller.
fn handshake(stream: TcpStream) -> Option<WebSocket<TcpStream>> {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));

    match tungstenite::accept(stream) {
        Ok(ws) => {
            let _ = ws.get_ref().set_read_timeout(None);
            let _ = ws.get_ref().set_nonblocking(true);
            Some(ws)
        }
        Err(e) => {
            crate::debug!("serve"; "handshake failed: {}", e);
            None
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                if actual_port != base_port {
                    crate::warn!("serve"; "port {} busy, using {}", base_port, actual_port);
                }
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind {} after {} attempts: {}",
        interface,
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
