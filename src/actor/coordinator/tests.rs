use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::dispatch::Dispatcher;
use super::worker::{Collaborators, RebuildContext, Workers};
use super::{CHANNEL_BUFFER, Coordinator};
use crate::actor::messages::WsMsg;
use crate::bundle::CompilerHooks;
use crate::config::PageRule;
use crate::page::source::PageError;
use crate::page::{Page, PageEvent, PageRegistry, PageSource, TemplatePages};
use crate::rebuild::RouteGenerator;
use crate::rebuild::routes::RouteManifest;
use crate::reload::message::LiveMessage;
use crate::store::{Node, Store, StoreSignal, StoreSnapshot};

const DELAY: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(200);

struct FakeRoutes {
    tx: mpsc::UnboundedSender<usize>,
}

impl RouteGenerator for FakeRoutes {
    fn generate(&self, pages: &[Page]) -> anyhow::Result<RouteManifest> {
        let _ = self.tx.send(pages.len());
        Ok(RouteManifest::from_pages(pages))
    }
}

#[derive(Default)]
struct CountingPages {
    calls: AtomicUsize,
}

impl PageSource for CountingPages {
    fn create_pages(&self, _store: &StoreSnapshot) -> Result<Vec<Page>, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

fn post(id: &str, fields: Value) -> Node {
    let Value::Object(fields) = fields else {
        unreachable!()
    };
    Node::new("post", id, fields)
}

fn blog_pages() -> Arc<dyn PageSource> {
    Arc::new(TemplatePages::new(vec![PageRule {
        path: "/blog/:slug".into(),
        collection: Some("post".into()),
        paginate: false,
        query: Some("Post.graphql".into()),
        dynamic: false,
    }]))
}

struct Harness {
    store: Arc<Store>,
    registry: Arc<PageRegistry>,
    routes_rx: mpsc::UnboundedReceiver<usize>,
    ws_rx: mpsc::Receiver<WsMsg>,
    done: Arc<AtomicUsize>,
}

/// Dispatcher and workers over a real store and registry, with the live
/// channel exposed.
fn start(pages: Arc<dyn PageSource>) -> Harness {
    let (store, store_rx) = Store::new(CHANNEL_BUFFER);
    let (registry, page_rx) = PageRegistry::new(CHANNEL_BUFFER);
    let store = Arc::new(store);
    let registry = Arc::new(registry);

    let (routes_tx, routes_rx) = mpsc::unbounded_channel();
    let done = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done);
    let mut compiler = CompilerHooks::default();
    compiler
        .tap_done("test", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let parts = Collaborators {
        store: Arc::clone(&store),
        registry: Arc::clone(&registry),
        pages,
        routes: Arc::new(FakeRoutes { tx: routes_tx }),
        compiler: Arc::new(compiler),
    };
    let (ws_tx, ws_rx) = mpsc::channel(CHANNEL_BUFFER);
    let (workers, _handles) = Workers::spawn(Arc::new(RebuildContext::new(parts, ws_tx)));
    tokio::spawn(Dispatcher::new(store_rx, page_rx, DELAY, workers).run());

    Harness {
        store,
        registry,
        routes_rx,
        ws_rx,
        done,
    }
}

impl Harness {
    async fn next_routes(&mut self) -> usize {
        timeout(WAIT, self.routes_rx.recv())
            .await
            .expect("routes not regenerated")
            .unwrap()
    }

    async fn next_ws(&mut self) -> WsMsg {
        timeout(WAIT, self.ws_rx.recv())
            .await
            .expect("no live message")
            .unwrap()
    }

    async fn expect_reload(&mut self) {
        match self.next_ws().await {
            WsMsg::Broadcast(LiveMessage::Reload { reason }) => {
                assert_eq!(reason.as_deref(), Some("routes"));
            }
            other => panic!("expected reload, got {other:?}"),
        }
    }

    async fn assert_routes_quiet(&mut self) {
        assert!(timeout(QUIET, self.routes_rx.recv()).await.is_err());
    }

    async fn assert_ws_quiet(&mut self) {
        assert!(timeout(QUIET, self.ws_rx.recv()).await.is_err());
    }

    fn paths(&self) -> Vec<String> {
        self.registry.pages().into_iter().map(|p| p.path).collect()
    }
}

#[tokio::test]
async fn test_initial_load_regenerates_routes_once() {
    let mut h = start(blog_pages());
    h.store.extend([
        post("a", json!({ "slug": "a", "title": "A" })),
        post("b", json!({ "slug": "b", "title": "B" })),
        post("c", json!({ "slug": "c", "title": "C" })),
    ]);

    assert_eq!(h.next_routes().await, 3);
    h.expect_reload().await;
    h.assert_routes_quiet().await;
    assert_eq!(h.done.load(Ordering::SeqCst), 1);
    h.assert_ws_quiet().await;
}

#[tokio::test]
async fn test_startup_creates_pages_without_content() {
    let mut h = start(Arc::new(TemplatePages::new(vec![PageRule {
        path: "/".into(),
        collection: None,
        paginate: false,
        query: None,
        dynamic: false,
    }])));
    assert_eq!(h.store.extend(Vec::new()), 0);

    assert_eq!(h.next_routes().await, 1);
    assert_eq!(h.paths(), vec!["/"]);
    h.expect_reload().await;
    assert_eq!(h.done.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_content_edit_refetches_without_routes() {
    let mut h = start(blog_pages());
    h.store.upsert(post("a", json!({ "slug": "a", "title": "A" })));
    h.next_routes().await;
    h.expect_reload().await;

    h.store.upsert(post("a", json!({ "slug": "a", "title": "Edited" })));
    assert!(matches!(h.next_ws().await, WsMsg::Broadcast(LiveMessage::Fetch)));
    h.assert_routes_quiet().await;
}

#[tokio::test]
async fn test_slug_change_regenerates_routes() {
    let mut h = start(blog_pages());
    h.store.upsert(post("a", json!({ "slug": "old" })));
    h.next_routes().await;
    h.expect_reload().await;

    h.store.upsert(post("a", json!({ "slug": "new" })));
    assert_eq!(h.next_routes().await, 1);
    assert_eq!(h.paths(), vec!["/blog/new"]);
    // Clients reload onto the new table instead of refetching
    h.expect_reload().await;
    h.assert_ws_quiet().await;
}

#[tokio::test]
async fn test_removed_node_regenerates_routes() {
    let mut h = start(blog_pages());
    h.store.extend([
        post("a", json!({ "slug": "a" })),
        post("b", json!({ "slug": "b" })),
    ]);
    assert_eq!(h.next_routes().await, 2);
    h.expect_reload().await;

    assert!(h.store.remove("post", "a").is_some());
    assert_eq!(h.next_routes().await, 1);
    assert_eq!(h.paths(), vec!["/blog/b"]);
    h.expect_reload().await;
    h.assert_ws_quiet().await;
    assert_eq!(h.done.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_page_error_then_recovery() {
    let mut h = start(blog_pages());
    h.store.upsert(post("a", json!({ "title": "no slug" })));

    match h.next_ws().await {
        WsMsg::Error { path, error } => {
            assert_eq!(path, "pages");
            assert!(error.contains("slug"), "{error}");
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(h.registry.pages().is_empty());

    h.store.upsert(post("a", json!({ "slug": "fixed" })));
    assert!(matches!(h.next_ws().await, WsMsg::ClearError));
    assert_eq!(h.next_routes().await, 1);
    h.expect_reload().await;
}

#[tokio::test]
async fn test_store_and_page_bursts_are_independent() {
    let (store_tx, store_rx) = mpsc::channel(CHANNEL_BUFFER);
    let (page_tx, page_rx) = mpsc::channel(CHANNEL_BUFFER);
    let (registry, _registry_rx) = PageRegistry::new(CHANNEL_BUFFER);
    let (store, _store_rx) = Store::new(1);
    let (routes_tx, _routes_rx) = mpsc::unbounded_channel();
    let pages = Arc::new(CountingPages::default());

    let parts = Collaborators {
        store: Arc::new(store),
        registry: Arc::new(registry),
        pages: Arc::clone(&pages) as Arc<dyn PageSource>,
        routes: Arc::new(FakeRoutes { tx: routes_tx }),
        compiler: Arc::new(CompilerHooks::default()),
    };
    let (ws_tx, mut ws_rx) = mpsc::channel(CHANNEL_BUFFER);
    let (workers, _handles) = Workers::spawn(Arc::new(RebuildContext::new(parts, ws_tx)));
    tokio::spawn(Dispatcher::new(store_rx, page_rx, DELAY, workers).run());

    let old = crate::page::fixtures::page("/a");
    let mut new = old.clone();
    new.data.insert("title".into(), "x".into());

    for _ in 0..5 {
        store_tx.send(StoreSignal::Changed).await.unwrap();
    }
    page_tx.send(PageEvent::Updated { page: new, old }).await.unwrap();

    let msg = timeout(WAIT, ws_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(msg, WsMsg::Broadcast(LiveMessage::Fetch)));

    tokio::time::sleep(QUIET).await;
    assert_eq!(pages.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dispatcher_stops_when_sources_close() {
    let (store_tx, store_rx) = mpsc::channel(1);
    let (page_tx, page_rx) = mpsc::channel(1);
    let (registry, _registry_rx) = PageRegistry::new(1);
    let (store, _store_rx) = Store::new(1);
    let (routes_tx, _routes_rx) = mpsc::unbounded_channel();

    let parts = Collaborators {
        store: Arc::new(store),
        registry: Arc::new(registry),
        pages: Arc::new(CountingPages::default()),
        routes: Arc::new(FakeRoutes { tx: routes_tx }),
        compiler: Arc::new(CompilerHooks::default()),
    };
    let (ws_tx, _ws_rx) = mpsc::channel(1);
    let (workers, _handles) = Workers::spawn(Arc::new(RebuildContext::new(parts, ws_tx)));
    let handle = tokio::spawn(Dispatcher::new(store_rx, page_rx, DELAY, workers).run());

    drop(store_tx);
    drop(page_tx);
    timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_coordinator_stops_on_shutdown_signal() {
    let (store, store_rx) = Store::new(CHANNEL_BUFFER);
    let (registry, page_rx) = PageRegistry::new(CHANNEL_BUFFER);
    let (routes_tx, _routes_rx) = mpsc::unbounded_channel();
    let parts = Collaborators {
        store: Arc::new(store),
        registry: Arc::new(registry),
        pages: blog_pages(),
        routes: Arc::new(FakeRoutes { tx: routes_tx }),
        compiler: Arc::new(CompilerHooks::default()),
    };

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    let coordinator =
        Coordinator::new(parts, store_rx, page_rx, DELAY).with_shutdown_signal(shutdown_rx);
    let handle = tokio::spawn(coordinator.run());

    shutdown_tx.send(()).unwrap();
    timeout(WAIT, handle).await.unwrap().unwrap();
}
