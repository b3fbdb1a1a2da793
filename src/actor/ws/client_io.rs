use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::WsActor;
use crate::reload::message::LiveMessage;

/// Reader poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on a client's upgrade request; the actor is blocked meanwhile.
pub(super) const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

impl WsActor {
    /// Complete the handshake and greet the client.
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Blocking during the handshake, non-blocking afterwards for polling
        let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_read_timeout(None);
        let _ = ws.get_ref().set_nonblocking(true);

        let mut greeting = vec![LiveMessage::connected()];
        greeting.extend(self.pending_error.clone());
        for message in greeting {
            if let Err(e) = ws.send(Message::Text(message.to_json().into())) {
                crate::log!("ws"; "failed to greet client: {}", e);
                return;
            }
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }

    /// Drop clients that closed or errored. Clients never send anything the
    /// server acts on.
    pub(super) fn client_reader_loop(clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>) {
        // Exits once the actor (the only other owner) is gone
        while Arc::strong_count(&clients) > 1 {
            std::thread::sleep(POLL_INTERVAL);

            clients.lock().retain_mut(|ws| match ws.read() {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => true,
                Err(e) => {
                    crate::debug!("ws"; "client dropped: {}", e);
                    false
                }
            });
        }
    }
}
