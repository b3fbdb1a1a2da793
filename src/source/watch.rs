//! Content watcher.
//!
//! ```text
//! notify --> Debouncer<path> --> Store::upsert / Store::remove
//! ```
//!
//! The watcher is created before the initial load so no change between
//! load and watch is lost. Each path is debounced on its own; when its
//! deadline passes the file is re-read, or its node removed if the file is
//! gone.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::{NodeKey, load_node};
use crate::actor::debounce::Debouncer;
use crate::store::Store;
use crate::utils::path::normalize_path;

const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Metadata-only modifications and access events are ignored.
    pub fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

pub struct ContentWatcher {
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Must be kept alive.
    _watcher: RecommendedWatcher,
    pending: PendingChanges,
}

/// Debounced changes waiting to be applied to the store.
struct PendingChanges {
    content: PathBuf,
    store: Arc<Store>,
    debouncer: Debouncer<PathBuf, ChangeKind>,
    delay: Duration,
}

impl ContentWatcher {
    pub fn new(content: &Path, store: Arc<Store>, delay: Duration) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        if content.exists() {
            watcher.watch(content, RecursiveMode::Recursive)?;
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            pending: PendingChanges {
                content: normalize_path(content),
                store,
                debouncer: Debouncer::new(),
                delay,
            },
        })
    }

    pub async fn run(self) {
        let Self {
            notify_rx,
            _watcher,
            mut pending,
        } = self;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            if crate::core::is_shutdown() {
                break;
            }
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => pending.record(&event),
                    None => break,
                },
                () = tokio::time::sleep(pending.debouncer.sleep_duration().min(SHUTDOWN_POLL)) => {
                    pending.flush();
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

impl PendingChanges {
    fn record(&mut self, event: &notify::Event) {
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };
        for path in &event.paths {
            let path = normalize_path(path);
            if NodeKey::from_path(&self.content, &path).is_some() {
                self.debouncer.schedule(path, self.delay, kind);
            }
        }
    }

    fn flush(&mut self) {
        for (path, kind) in self.debouncer.take_ready() {
            crate::debug!("watch"; "{}: {}", kind.label(), path.display());
            sync_path(&self.content, &self.store, &path);
        }
    }
}

/// Bring the store in line with the file at `path`.
pub fn sync_path(content: &Path, store: &Store, path: &Path) {
    let Some(key) = NodeKey::from_path(content, path) else {
        return;
    };

    if !path.is_file() {
        if store.remove(&key.collection, &key.id).is_some() {
            crate::debug!("watch"; "removed {}/{}", key.collection, key.id);
        }
        return;
    }

    match load_node(key, path) {
        Ok(node) => {
            store.upsert(node);
        }
        // Keep the last good node; the next save retries
        Err(e) => crate::logger::status_error("content error", &e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: EventKind) -> Option<ChangeKind> {
        ChangeKind::from_event(&kind)
    }

    #[test]
    fn test_change_kind_from_event() {
        use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind};

        assert_eq!(event(EventKind::Create(CreateKind::File)), Some(ChangeKind::Created));
        assert_eq!(
            event(EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            Some(ChangeKind::Modified)
        );
        assert_eq!(event(EventKind::Remove(RemoveKind::File)), Some(ChangeKind::Removed));
        assert_eq!(event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))), None);
        assert_eq!(event(EventKind::Any), None);
    }

    #[test]
    fn test_sync_path_upsert_and_remove() {
        let dir = TempDir::new().unwrap();
        let content = normalize_path(dir.path());
        fs::create_dir_all(content.join("post")).unwrap();
        let file = content.join("post/a.json");
        let (store, _rx) = Store::new(8);

        fs::write(&file, r#"{"title": "A"}"#).unwrap();
        sync_path(&content, &store, &file);
        assert_eq!(store.snapshot().get("post", "a").unwrap().field_str("title").unwrap(), "A");

        // Broken edit keeps the previous node
        fs::write(&file, "{").unwrap();
        sync_path(&content, &store, &file);
        assert_eq!(store.len(), 1);

        fs::remove_file(&file).unwrap();
        sync_path(&content, &store, &file);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_record_debounces_per_path() {
        let dir = TempDir::new().unwrap();
        let (store, _rx) = Store::new(8);
        let watcher =
            ContentWatcher::new(dir.path(), Arc::new(store), Duration::from_secs(60)).unwrap();
        let mut pending = watcher.pending;
        let content = pending.content.clone();

        let modify = notify::Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(content.join("post/a.json"))
            .add_path(content.join("post/a.json"))
            .add_path(content.join("post/.a.json.swp"))
            .add_path(content.join("post/b.json"));
        pending.record(&modify);

        assert!(pending.debouncer.is_pending(&content.join("post/a.json")));
        assert!(pending.debouncer.is_pending(&content.join("post/b.json")));
        assert!(!pending.debouncer.is_pending(&content.join("post/.a.json.swp")));
        // Not due yet
        pending.flush();
        assert!(!pending.debouncer.is_empty());
    }
}
