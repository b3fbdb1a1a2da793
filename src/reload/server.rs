//! WebSocket listener for the live-update channel.
//!
//! Accepted streams are handed to the WsActor, which owns the handshake and
//! the client list.

use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;
use crate::server::ServerError;

/// Bind the live-update port. Failure is fatal; no other port is tried.
pub fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).map_err(|e| ServerError::Bind {
        addr,
        reason: e.to_string(),
    })?;
    listener.set_nonblocking(true).map_err(|e| ServerError::Bind {
        addr,
        reason: e.to_string(),
    })?;
    Ok(listener)
}

/// Spawn the acceptor thread. It stops once the actor side hangs up.
pub fn spawn_acceptor(
    listener: TcpListener,
    ws_tx: mpsc::Sender<WsMsg>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            if crate::core::is_shutdown() || ws_tx.is_closed() {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);

                    // Handshake runs in blocking mode
                    let _ = stream.set_nonblocking(false);
                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        crate::debug!("reload"; "actor gone, acceptor stopping");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_conflict_is_error() {
        let first = bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();
        assert!(matches!(bind(addr), Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_acceptor_forwards_streams() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_acceptor(listener, tx);

        let _client = std::net::TcpStream::connect(addr).unwrap();
        let msg = rx.blocking_recv().unwrap();
        assert!(matches!(msg, WsMsg::AddClient(_)));

        drop(rx);
        handle.join().unwrap();
    }
}
