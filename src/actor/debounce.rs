//! Keyed trailing-edge debounce table.
//!
//! Pure timing: no channels, no business state. The owner calls
//! [`Debouncer::schedule`] on every trigger, sleeps for
//! [`Debouncer::sleep_duration`], then drains [`Debouncer::take_ready`].
//!
//! Each key holds at most one pending entry. Rescheduling a key moves its
//! deadline and replaces its value, so a burst fires once, `delay` after
//! its last trigger, with the last trigger's value.

use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

/// Sleep used when nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

struct Pending<V> {
    deadline: Instant,
    value: V,
}

pub struct Debouncer<K, V> {
    pending: FxHashMap<K, Pending<V>>,
}

impl<K: Eq + Hash + Clone, V> Default for Debouncer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new() -> Self {
        Self {
            pending: FxHashMap::default(),
        }
    }

    pub fn schedule(&mut self, key: K, delay: Duration, value: V) {
        self.schedule_at(Instant::now(), key, delay, value);
    }

    pub fn schedule_at(&mut self, now: Instant, key: K, delay: Duration, value: V) {
        self.pending.insert(
            key,
            Pending {
                deadline: now + delay,
                value,
            },
        );
    }

    pub fn take_ready(&mut self) -> Vec<(K, V)> {
        self.take_ready_at(Instant::now())
    }

    /// Remove and return every entry whose deadline is at or before `now`,
    /// earliest deadline first.
    pub fn take_ready_at(&mut self, now: Instant) -> Vec<(K, V)> {
        let mut ready: Vec<(Instant, K)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, p)| (p.deadline, k.clone()))
            .collect();
        ready.sort_by_key(|(deadline, _)| *deadline);

        ready
            .into_iter()
            .filter_map(|(_, key)| {
                let pending = self.pending.remove(&key)?;
                Some((key, pending.value))
            })
            .collect()
    }

    /// Time until the earliest deadline (at least 1ms while anything is
    /// pending).
    pub fn sleep_duration(&self) -> Duration {
        self.sleep_duration_at(Instant::now())
    }

    pub fn sleep_duration_at(&self, now: Instant) -> Duration {
        self.pending
            .values()
            .map(|p| p.deadline.saturating_duration_since(now))
            .min()
            .map_or(IDLE_SLEEP, |d| d.max(Duration::from_millis(1)))
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
