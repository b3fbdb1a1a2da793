//! Per-action rebuild workers.
//!
//! Each action has one task fed by a capacity-1 queue. A trigger while a
//! run is already queued is absorbed by it; a trigger during a run queues
//! exactly one follow-up.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actor::messages::WsMsg;
use crate::bundle::{CompileStats, CompilerHooks};
use crate::page::{PageRegistry, PageSource};
use crate::rebuild::{RebuildAction, RouteGenerator};
use crate::reload::message::LiveMessage;
use crate::store::Store;

/// Collaborators the rebuild actions drive, supplied by the host.
pub struct Collaborators {
    pub store: Arc<Store>,
    pub registry: Arc<PageRegistry>,
    pub pages: Arc<dyn PageSource>,
    pub routes: Arc<dyn RouteGenerator>,
    pub compiler: Arc<CompilerHooks>,
}

pub(super) struct RebuildContext {
    parts: Collaborators,
    ws_tx: mpsc::Sender<WsMsg>,
    /// Actions whose last run failed.
    failing: Mutex<FxHashSet<RebuildAction>>,
}

impl RebuildContext {
    pub(super) fn new(parts: Collaborators, ws_tx: mpsc::Sender<WsMsg>) -> Self {
        Self {
            parts,
            ws_tx,
            failing: Mutex::new(FxHashSet::default()),
        }
    }

    async fn run(&self, action: RebuildAction) {
        let started = Instant::now();
        let result = match action {
            RebuildAction::RecomputePages => self.recompute_pages().await,
            RebuildAction::RegenerateRoutes => self.regenerate_routes(started).await,
            RebuildAction::RefetchQueries => self.refetch_queries().await,
        };

        match result {
            Ok(summary) => {
                crate::debug!("rebuild"; "{} done in {:?}", action, started.elapsed());
                if let Some(summary) = summary {
                    crate::logger::status_success(&summary);
                }
                let recovered = self.failing.lock().remove(&action);
                if recovered {
                    let _ = self.ws_tx.send(WsMsg::ClearError).await;
                }
            }
            Err(e) => {
                let detail = format!("{e:#}");
                crate::logger::status_error(&format!("{action} rebuild failed"), &detail);
                self.failing.lock().insert(action);
                if action == RebuildAction::RegenerateRoutes {
                    self.parts
                        .compiler
                        .emit_done(&CompileStats::failure(detail.clone(), started.elapsed()));
                }
                let _ = self
                    .ws_tx
                    .send(WsMsg::Error {
                        path: action.label().to_string(),
                        error: detail,
                    })
                    .await;
            }
        }
    }

    async fn recompute_pages(&self) -> Result<Option<String>> {
        let snapshot = self.parts.store.snapshot();
        let pages = self
            .parts
            .pages
            .create_pages(&snapshot)
            .context("failed to create pages")?;
        let summary = self.parts.registry.sync(pages).await;
        crate::debug!("pages"; "{}", summary);
        Ok((!summary.is_empty()).then(|| format!("pages: {summary}")))
    }

    /// Clients hold the old route table, so a new one means a full reload.
    async fn regenerate_routes(&self, started: Instant) -> Result<Option<String>> {
        let manifest = self.parts.routes.generate(&self.parts.registry.pages())?;
        let stats = CompileStats::success(manifest.len(), started.elapsed());
        self.parts.compiler.emit_done(&stats);
        self.ws_tx
            .send(WsMsg::Broadcast(LiveMessage::reload("routes")))
            .await
            .context("live channel closed")?;
        Ok(Some(format!("routes regenerated ({} routes)", manifest.len())))
    }

    async fn refetch_queries(&self) -> Result<Option<String>> {
        self.ws_tx
            .send(WsMsg::Broadcast(LiveMessage::Fetch))
            .await
            .context("live channel closed")?;
        Ok(None)
    }
}

pub(super) struct Workers {
    queues: FxHashMap<RebuildAction, mpsc::Sender<()>>,
}

impl Workers {
    pub(super) fn spawn(ctx: Arc<RebuildContext>) -> (Self, Vec<JoinHandle<()>>) {
        let mut queues = FxHashMap::default();
        let mut handles = Vec::new();

        for action in RebuildAction::ALL {
            let (tx, mut rx) = mpsc::channel::<()>(1);
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    ctx.run(action).await;
                }
            }));
            queues.insert(action, tx);
        }
        (Self { queues }, handles)
    }

    pub(super) fn trigger(&self, action: RebuildAction) {
        use mpsc::error::TrySendError;

        let Some(queue) = self.queues.get(&action) else {
            return;
        };
        match queue.try_send(()) {
            Ok(()) => crate::debug!("schedule"; "fire {}", action),
            Err(TrySendError::Full(())) => crate::debug!("schedule"; "{} already queued", action),
            Err(TrySendError::Closed(())) => crate::log!("rebuild"; "{} worker stopped", action),
        }
    }
}
