//! `devloop develop`: rebuild coordinator plus preview server.
//!
//! Startup order:
//! 1. clear the cache dir, start watching content, load it into the store
//! 2. bind the live-update port (its port goes into the client constants)
//! 3. tap the server hooks and bind HTTP
//! 4. run the actor system on its own runtime and the request loop here

use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};

use crate::actor::{Collaborators, Coordinator, coordinator::CHANNEL_BUFFER};
use crate::bundle::{BundleConfig, CompilerHooks};
use crate::config::SiteConfig;
use crate::embed::serve::client_tag;
use crate::page::{PageEvent, PageRegistry, TemplatePages};
use crate::rebuild::ManifestWriter;
use crate::server::{
    DevServer, ServerEndpoints, client::LiveClient, explore::PageExplorer, hooks::HookStage,
    static_files::BundleFiles,
};
use crate::source::{self, ContentWatcher};
use crate::store::{Store, StoreSignal};
use crate::{debug, log};

/// Name every develop-time tap registers under.
const PLUGIN: &str = "develop";

pub fn develop(config: Arc<SiteConfig>) -> Result<()> {
    let cache_dir = &config.build.cache_dir;
    crate::utils::path::empty_dir(cache_dir)
        .with_context(|| format!("failed to clear {}", cache_dir.display()))?;

    let (store, store_rx) = Store::new(CHANNEL_BUFFER);
    let (registry, page_rx) = PageRegistry::new(CHANNEL_BUFFER);
    let store = Arc::new(store);
    let registry = Arc::new(registry);

    // Watch before loading so no edit in between is missed
    let content = &config.build.content;
    let watcher = ContentWatcher::new(content, Arc::clone(&store), config.build.debounce())
        .context("failed to watch content directory")?;
    let loaded = store.extend(source::load_all(content)?);
    log!("source"; "{} nodes from {}", loaded, config.root_relative(content).display());

    let ws_listener = crate::reload::server::bind(config.serve.ws_addr())?;
    let ws_port = ws_listener.local_addr()?.port();
    debug!("reload"; "ws port {}", ws_port);

    let mut server = DevServer::new(&config.serve, ws_port);
    tap_server_hooks(&mut server, &config, &registry)?;
    debug!("serve"; "binding {}", server.endpoints().local.url);
    let listening = server.listen(|endpoints| {
        log!("serve"; "{}", endpoints.local.pretty);
        if let Some(network) = &endpoints.network {
            log!("serve"; "{}", network.pretty);
        }
    })?;

    let compiler = compiler_hooks(listening.endpoints().clone())?;

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(listening.closer(), shutdown_tx);

    let parts = Collaborators {
        store,
        registry,
        pages: Arc::new(TemplatePages::new(config.pages.clone())),
        routes: Arc::new(ManifestWriter::new(cache_dir)),
        compiler: Arc::new(compiler),
    };
    let actors = spawn_actors(
        ActorInputs {
            parts,
            store_rx,
            page_rx,
            ws_listener,
            watcher,
            debounce: config.build.debounce(),
        },
        shutdown_rx,
    );

    listening.run()?;
    wait_for_shutdown(actors);
    Ok(())
}

fn tap_server_hooks(
    server: &mut DevServer,
    config: &Arc<SiteConfig>,
    registry: &Arc<PageRegistry>,
) -> Result<()> {
    let hooks = server.hooks_mut();

    hooks.tap(HookStage::Setup, PLUGIN, |setup| {
        let client = LiveClient::new(setup.endpoints());
        setup.use_middleware(client);
    })?;

    let config = Arc::clone(config);
    let registry = Arc::clone(registry);
    hooks.tap(HookStage::AfterSetup, PLUGIN, move |setup| {
        let bundle = BundleConfig::assemble(&config, setup.endpoints());
        debug!("bundle"; "{}", serde_json::to_string(&bundle).unwrap_or_default());

        let manifest = ManifestWriter::new(&config.build.cache_dir);
        setup.use_middleware(PageExplorer::new(registry, manifest));
        setup.use_middleware(
            BundleFiles::new(bundle.output_dir, &bundle.public_path)
                .with_injection(client_tag())
                .with_history_fallback(),
        );
    })?;
    Ok(())
}

/// Print the site banner after every successful route compile.
fn compiler_hooks(endpoints: ServerEndpoints) -> Result<CompilerHooks> {
    let mut compiler = CompilerHooks::default();
    compiler.tap_done(PLUGIN, move |stats| {
        if stats.has_errors() {
            return;
        }
        debug!("compile"; "{} routes in {:?}", stats.routes, stats.duration);
        crate::logger::site_banner(&endpoints.local.url, &endpoints.explore.url);
        crate::logger::status_detach();
    })?;
    Ok(compiler)
}

struct ActorInputs {
    parts: Collaborators,
    store_rx: tokio::sync::mpsc::Receiver<StoreSignal>,
    page_rx: tokio::sync::mpsc::Receiver<PageEvent>,
    ws_listener: TcpListener,
    watcher: ContentWatcher,
    debounce: Duration,
}

fn spawn_actors(inputs: ActorInputs, shutdown_rx: Receiver<()>) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("actor"; "failed to create tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(async move {
            let watch = tokio::spawn(inputs.watcher.run());
            Coordinator::new(inputs.parts, inputs.store_rx, inputs.page_rx, inputs.debounce)
                .with_ws_listener(inputs.ws_listener)
                .with_shutdown_signal(shutdown_rx)
                .run()
                .await;
            watch.abort();
        });
    })
}

/// Wait for the actor system to stop (max 2 seconds).
fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
