//! The coordinator run loop.
//!
//! Receives store signals and page events, schedules the classified action
//! in the debounce table, and triggers workers when deadlines pass. It is
//! the only owner of the table.

use std::time::Duration;

use tokio::sync::mpsc;

use super::worker::Workers;
use crate::actor::debounce::Debouncer;
use crate::page::PageEvent;
use crate::rebuild::{RebuildAction, classify_event};
use crate::store::StoreSignal;

pub(super) struct Dispatcher {
    store_rx: mpsc::Receiver<StoreSignal>,
    page_rx: mpsc::Receiver<PageEvent>,
    debouncer: Debouncer<RebuildAction, ()>,
    delay: Duration,
    workers: Workers,
}

impl Dispatcher {
    pub(super) fn new(
        store_rx: mpsc::Receiver<StoreSignal>,
        page_rx: mpsc::Receiver<PageEvent>,
        delay: Duration,
        workers: Workers,
    ) -> Self {
        Self {
            store_rx,
            page_rx,
            debouncer: Debouncer::new(),
            delay,
            workers,
        }
    }

    /// Run until both sources are closed and nothing is pending.
    ///
    /// Pages are computed once on start, even when the initial load added
    /// no content.
    pub(super) async fn run(mut self) {
        self.schedule(RebuildAction::RecomputePages, "startup");
        let mut store_open = true;
        let mut pages_open = true;

        while store_open || pages_open || !self.debouncer.is_empty() {
            self.fire_ready();
            let sleep = tokio::time::sleep(self.debouncer.sleep_duration());

            tokio::select! {
                biased;

                signal = self.store_rx.recv(), if store_open => match signal {
                    Some(StoreSignal::Changed) => {
                        self.schedule(RebuildAction::RecomputePages, "store changed");
                    }
                    None => store_open = false,
                },

                event = self.page_rx.recv(), if pages_open => match event {
                    Some(event) => {
                        let action = classify_event(&event);
                        let path = &event.page().path;
                        crate::debug!("schedule"; "{} {} -> {}", event.label(), path, action);
                        self.schedule(action, event.label());
                    }
                    None => pages_open = false,
                },

                () = sleep => {}
            }
        }
        self.fire_ready();
        crate::debug!("schedule"; "sources closed, dispatcher stopped");
    }

    fn schedule(&mut self, action: RebuildAction, cause: &str) {
        if self.debouncer.is_pending(&action) {
            crate::debug!("schedule"; "{} postponed ({})", action, cause);
        }
        self.debouncer.schedule(action, self.delay, ());
    }

    fn fire_ready(&mut self) {
        for (action, ()) in self.debouncer.take_ready() {
            self.workers.trigger(action);
        }
    }
}
