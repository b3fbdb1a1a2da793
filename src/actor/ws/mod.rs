//! WebSocket actor: owns the live client list.
//!
//! ```text
//! Workers --[Broadcast/Error/ClearError]--> WsActor --[broadcast]--> Clients
//! acceptor --[AddClient]------------------^
//! ```
//!
//! New clients receive `connected`, then the pending error if the last
//! rebuild failed.

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::reload::message::LiveMessage;

pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Shared with the reader thread that drops closed connections.
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    pending_error: Option<LiveMessage>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: None,
        }
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    pub async fn run(mut self) {
        let clients = Arc::clone(&self.clients);
        std::thread::spawn(move || Self::client_reader_loop(clients));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Broadcast(message) => {
                    crate::debug!("ws"; "broadcast {}", message.to_json());
                    self.broadcast(&message);
                }

                WsMsg::Error { path, error } => {
                    let message = LiveMessage::error(path, error);
                    self.broadcast(&message);
                    self.pending_error = Some(message);
                }

                WsMsg::ClearError => {
                    if self.pending_error.take().is_some() {
                        self.broadcast(&LiveMessage::ClearError);
                    }
                }

                WsMsg::AddClient(stream) => self.add_client(stream),

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut client in self.clients.lock().drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
