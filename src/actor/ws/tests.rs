use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use super::client_io::HANDSHAKE_TIMEOUT;
use super::*;

fn read_messages(addr: std::net::SocketAddr, count: usize) -> Vec<LiveMessage> {
    let (mut ws, _) = tungstenite::connect(format!("ws://{addr}")).unwrap();
    (0..count)
        .map(|_| {
            let frame = ws.read().unwrap();
            LiveMessage::from_json(frame.to_text().unwrap()).unwrap()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_greeting_then_broadcast() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel(8);
    let actor = tokio::spawn(WsActor::new(rx).run());

    // Failure before anyone is connected
    tx.send(WsMsg::Error {
        path: "routes".into(),
        error: "boom".into(),
    })
    .await
    .unwrap();

    let client = std::thread::spawn(move || read_messages(addr, 3));
    let (stream, _) = tokio::task::spawn_blocking(move || listener.accept().unwrap())
        .await
        .unwrap();
    tx.send(WsMsg::AddClient(stream)).await.unwrap();
    tx.send(WsMsg::Broadcast(LiveMessage::Fetch)).await.unwrap();

    let received = tokio::task::spawn_blocking(move || client.join().unwrap())
        .await
        .unwrap();
    assert!(matches!(received[0], LiveMessage::Connected { .. }));
    assert_eq!(received[1], LiveMessage::error("routes", "boom"));
    assert_eq!(received[2], LiveMessage::Fetch);

    tx.send(WsMsg::Shutdown).await.unwrap();
    actor.await.unwrap();
}

#[tokio::test]
async fn test_broadcast_without_clients() {
    let (tx, rx) = mpsc::channel(8);
    let actor = WsActor::new(rx);
    assert_eq!(actor.client_count(), 0);
    let handle = tokio::spawn(actor.run());

    tx.send(WsMsg::Broadcast(LiveMessage::Fetch)).await.unwrap();
    tx.send(WsMsg::ClearError).await.unwrap();
    tx.send(WsMsg::Shutdown).await.unwrap();
    handle.await.unwrap();
}

#[test]
fn test_stalled_handshake_is_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    // Connects but never sends the upgrade request
    let _idle = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (stream, _) = listener.accept().unwrap();

    let (_tx, rx) = mpsc::channel(1);
    let actor = WsActor::new(rx);
    let started = Instant::now();
    actor.add_client(stream);

    assert!(started.elapsed() < HANDSHAKE_TIMEOUT + Duration::from_secs(1));
    assert_eq!(actor.client_count(), 0);
}
