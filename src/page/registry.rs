//! Page registry: id → page, with change notifications.
//!
//! Every mutation emits a [`PageEvent`] on a bounded channel. Events are
//! collected while the lock is held and sent after it is released, so a
//! slow subscriber applies backpressure without blocking readers.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use super::Page;

/// Page mutation notification.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Created(Page),
    Updated { page: Page, old: Page },
    Removed(Page),
}

impl PageEvent {
    pub fn page(&self) -> &Page {
        match self {
            Self::Created(page) | Self::Removed(page) | Self::Updated { page, .. } => page,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "create",
            Self::Updated { .. } => "update",
            Self::Removed(_) => "remove",
        }
    }
}

/// Counts of events produced by [`PageRegistry::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl SyncSummary {
    pub fn is_empty(&self) -> bool {
        self.created + self.updated + self.removed == 0
    }
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} removed",
            self.created, self.updated, self.removed
        )
    }
}

#[derive(Debug)]
pub struct PageRegistry {
    pages: RwLock<BTreeMap<String, Page>>,
    tx: mpsc::Sender<PageEvent>,
}

impl PageRegistry {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PageEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let registry = Self {
            pages: RwLock::new(BTreeMap::new()),
            tx,
        };
        (registry, rx)
    }

    #[cfg(test)]
    /// Insert or replace a page, emitting `Created` or `Updated`.
    /// Replacing a page with an identical one emits nothing.
    pub async fn insert(&self, page: Page) {
        let event = {
            let mut pages = self.pages.write();
            match pages.insert(page.id.clone(), page.clone()) {
                None => Some(PageEvent::Created(page)),
                Some(old) if old != page => Some(PageEvent::Updated { page, old }),
                Some(_) => None,
            }
        };
        if let Some(event) = event {
            self.emit(event).await;
        }
    }

    #[cfg(test)]
    pub async fn remove(&self, id: &str) -> Option<Page> {
        let removed = self.pages.write().remove(id);
        if let Some(ref page) = removed {
            self.emit(PageEvent::Removed(page.clone())).await;
        }
        removed
    }

    /// Replace the registry contents with `pages`.
    ///
    /// Pages missing from `pages` are removed first, then new pages are
    /// created and changed pages updated, in the order given.
    pub async fn sync(&self, pages: Vec<Page>) -> SyncSummary {
        let mut summary = SyncSummary::default();
        let events = {
            let mut current = self.pages.write();
            let incoming: FxHashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();

            let stale: Vec<String> = current
                .keys()
                .filter(|id| !incoming.contains(id.as_str()))
                .cloned()
                .collect();

            let mut events = Vec::new();
            for id in stale {
                if let Some(page) = current.remove(&id) {
                    summary.removed += 1;
                    events.push(PageEvent::Removed(page));
                }
            }

            for page in pages {
                match current.insert(page.id.clone(), page.clone()) {
                    None => {
                        summary.created += 1;
                        events.push(PageEvent::Created(page));
                    }
                    Some(old) if old != page => {
                        summary.updated += 1;
                        events.push(PageEvent::Updated { page, old });
                    }
                    Some(_) => {}
                }
            }
            events
        };

        for event in events {
            self.emit(event).await;
        }
        summary
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<Page> {
        self.pages.read().get(id).cloned()
    }

    /// All pages ordered by id.
    pub fn pages(&self) -> Vec<Page> {
        self.pages.read().values().cloned().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    async fn emit(&self, event: PageEvent) {
        crate::debug!("pages"; "{} {}", event.label(), event.page().path);
        if self.tx.send(event).await.is_err() {
            crate::debug!("pages"; "event dropped, no subscriber");
        }
    }
}
