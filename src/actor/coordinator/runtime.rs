use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::{FsMsg, WsMsg};
use crate::actor::ws::WsActor;

/// Grace period for actors to finish after `Shutdown`
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run both actors until a shutdown signal or until one of them stops.
pub(super) async fn run_actors(
    fs: FsActor,
    ws: WsActor,
    fs_tx: mpsc::Sender<FsMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let mut fs_handle = tokio::spawn(async move { fs.run().await });
    let mut ws_handle = tokio::spawn(async move { ws.run().await });

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            if fs_handle.is_finished() || ws_handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = &mut fs_handle => {}
            _ = &mut ws_handle => {}
        }
    }

    // WsActor closes every client on Shutdown
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = fs_tx.send(FsMsg::Shutdown).await;

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, ws_handle).await;
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, fs_handle).await;

    Ok(())
}
