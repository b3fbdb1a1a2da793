//! Rebuild coordinator: wires the actor system.
//!
//! - `dispatch` - event loop owning the debounce table
//! - `worker` - one task per rebuild action
//! - `runtime` - spawning and shutdown

mod dispatch;
mod runtime;
mod worker;

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

pub use worker::Collaborators;

use super::messages::WsMsg;
use super::ws::WsActor;
use crate::page::PageEvent;
use crate::store::StoreSignal;
use dispatch::Dispatcher;
use worker::{RebuildContext, Workers};

pub const CHANNEL_BUFFER: usize = 32;

pub struct Coordinator {
    parts: Collaborators,
    store_rx: mpsc::Receiver<StoreSignal>,
    page_rx: mpsc::Receiver<PageEvent>,
    debounce: Duration,
    ws_listener: Option<TcpListener>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        parts: Collaborators,
        store_rx: mpsc::Receiver<StoreSignal>,
        page_rx: mpsc::Receiver<PageEvent>,
        debounce: Duration,
    ) -> Self {
        Self {
            parts,
            store_rx,
            page_rx,
            debounce,
            ws_listener: None,
            shutdown_rx: None,
        }
    }

    /// Accept live clients on an already bound listener.
    pub fn with_ws_listener(mut self, listener: TcpListener) -> Self {
        self.ws_listener = Some(listener);
        self
    }

    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub async fn run(self) {
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
        if let Some(listener) = self.ws_listener {
            crate::reload::server::spawn_acceptor(listener, ws_tx.clone());
        }

        let ctx = Arc::new(RebuildContext::new(self.parts, ws_tx.clone()));
        let (workers, handles) = Workers::spawn(ctx);
        let dispatcher = Dispatcher::new(self.store_rx, self.page_rx, self.debounce, workers);

        crate::debug!("actor"; "start");
        let ws = WsActor::new(ws_rx);
        runtime::run_actors(dispatcher, ws, handles, ws_tx, self.shutdown_rx).await;
        crate::debug!("actor"; "stopped");
    }
}

#[cfg(test)]
mod tests;
