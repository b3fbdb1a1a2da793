use tungstenite::protocol::Message;

use super::WsActor;
use crate::reload::message::LiveMessage;

impl WsActor {
    /// Send to all clients, dropping those whose connection failed.
    pub(super) fn broadcast(&self, message: &LiveMessage) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let frame = Message::Text(message.to_json().into());
        clients.retain_mut(|ws| match ws.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
    }
}
