use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::dispatch::Dispatcher;
use crate::actor::messages::WsMsg;
use crate::actor::ws::WsActor;

/// Shutdown polling interval.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Run the dispatcher and the ws actor until shutdown, or until the
/// dispatcher's sources close when no shutdown signal is given.
pub(super) async fn run_actors(
    dispatcher: Dispatcher,
    ws: WsActor,
    workers: Vec<JoinHandle<()>>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let ws_handle = tokio::spawn(ws.run());
    let mut dispatch_handle = tokio::spawn(dispatcher.run());

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::select! {
                _ = &mut dispatch_handle => break,
                () = tokio::time::sleep(SHUTDOWN_POLL) => {}
            }
        }
    } else {
        let _ = (&mut dispatch_handle).await;
    }

    dispatch_handle.abort();
    for worker in &workers {
        worker.abort();
    }

    crate::debug!("actor"; "sending shutdown to ws");
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_millis(500), ws_handle).await;
}
