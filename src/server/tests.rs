use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, TcpListener, TcpStream};
use std::sync::Arc;

use parking_lot::Mutex;

use super::hooks::HookStage;
use super::middleware::{Reply, RequestInfo};
use super::*;
use crate::utils::mime::types;

fn loopback(port: u16) -> ServeConfig {
    ServeConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port,
        ws_port: 0,
    }
}

fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn test_listen_fires_hooks_then_callback() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut server = DevServer::new(&loopback(0), 35729);
    assert_eq!(server.state(), ServerState::Created);

    let o = Arc::clone(&order);
    server
        .hooks_mut()
        .tap(HookStage::AfterSetup, "develop", move |_| o.lock().push("after_setup"))
        .unwrap();
    let o = Arc::clone(&order);
    server
        .hooks_mut()
        .tap(HookStage::Setup, "develop", move |_| o.lock().push("setup"))
        .unwrap();

    let o = Arc::clone(&order);
    let listening = server.listen(move |_| o.lock().push("listen")).unwrap();

    assert_eq!(*order.lock(), vec!["setup", "after_setup", "listen"]);
    assert_eq!(listening.state(), ServerState::Listening);
    assert_ne!(listening.addr().port(), 0);
    assert!(listening.endpoints().local.url.ends_with(&format!(":{}/", listening.addr().port())));
}

#[test]
fn test_requests_pass_setup_middleware_first() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut server = DevServer::new(&loopback(0), 35729);

    let s = Arc::clone(&seen);
    server
        .hooks_mut()
        .tap(HookStage::Setup, "m1", move |setup| {
            setup.use_middleware(move |_: &RequestInfo| -> Option<Reply> {
                s.lock().push("m1");
                None
            })
        })
        .unwrap();
    let s = Arc::clone(&seen);
    server
        .hooks_mut()
        .tap(HookStage::AfterSetup, "m2", move |setup| {
            setup.use_middleware(move |req: &RequestInfo| {
                s.lock().push("m2");
                (req.path == "/hello").then(|| Reply::ok(types::PLAIN, "hi"))
            })
        })
        .unwrap();

    let listening = server.listen(|_| {}).unwrap();
    let addr = listening.addr();
    let closer = listening.closer();
    let handle = std::thread::spawn(move || {
        listening.run().unwrap();
        listening.state()
    });

    let hello = get(addr, "/hello");
    assert!(hello.starts_with("HTTP/1.1 200"), "{hello}");
    assert!(hello.ends_with("hi"));
    assert_eq!(*seen.lock(), vec!["m1", "m2"]);

    let missing = get(addr, "/missing");
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    closer.close();
    assert_eq!(handle.join().unwrap(), ServerState::Closed);
}

#[test]
fn test_bind_failure_is_fatal() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let result = DevServer::new(&loopback(port), 35729).listen(|_| panic!("must not listen"));
    match result {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr.port(), port),
        Ok(_) => panic!("bind should fail while the port is taken"),
    }
}
