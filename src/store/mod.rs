//! In-memory content store.
//!
//! Holds content nodes grouped by collection. Every mutation that actually
//! changes the store emits an opaque [`StoreSignal::Changed`]; subscribers
//! learn *that* something changed, never *what*.
//!
//! The signal channel is bounded and signals carry no payload, so a full
//! channel already holds an undelivered `Changed` and further sends are
//! dropped.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Collection used for nodes at the top of the content directory.
pub const DEFAULT_COLLECTION: &str = "default";

/// A content node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Unique within its collection.
    pub id: String,
    pub collection: String,
    pub fields: Map<String, Value>,
}

impl Node {
    pub fn new(
        collection: impl Into<String>,
        id: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            fields,
        }
    }

    /// Field value rendered as a plain string (strings unquoted, numbers and
    /// booleans via their JSON form). Objects, arrays and null yield `None`.
    pub fn field_str(&self, name: &str) -> Option<String> {
        if name == "id" {
            return Some(self.id.clone());
        }
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Content may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSignal {
    Changed,
}

/// Point-in-time copy of the store contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    collections: BTreeMap<String, BTreeMap<String, Node>>,
}

impl StoreSnapshot {
    /// Nodes of a collection, ordered by id.
    pub fn collection(&self, name: &str) -> impl Iterator<Item = &Node> {
        self.collections
            .get(name)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<&Node> {
        self.collections.get(collection)?.get(id)
    }

    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, node: Node) -> bool {
        let nodes = self.collections.entry(node.collection.clone()).or_default();
        if nodes.get(&node.id) == Some(&node) {
            return false;
        }
        nodes.insert(node.id.clone(), node);
        true
    }

    fn remove(&mut self, collection: &str, id: &str) -> Option<Node> {
        let nodes = self.collections.get_mut(collection)?;
        let removed = nodes.remove(id);
        if nodes.is_empty() {
            self.collections.remove(collection);
        }
        removed
    }
}

/// Thread-safe node store with a change-signal channel.
#[derive(Debug)]
pub struct Store {
    nodes: RwLock<StoreSnapshot>,
    tx: mpsc::Sender<StoreSignal>,
}

impl Store {
    /// Create a store and the receiving end of its change signals.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<StoreSignal>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let store = Self {
            nodes: RwLock::new(StoreSnapshot::default()),
            tx,
        };
        (store, rx)
    }

    /// Insert or replace a node. Signals only if the node actually changed.
    pub fn upsert(&self, node: Node) -> bool {
        let changed = self.nodes.write().insert(node);
        if changed {
            self.notify();
        }
        changed
    }

    /// Insert many nodes, signalling at most once.
    pub fn extend(&self, nodes: impl IntoIterator<Item = Node>) -> usize {
        let mut changed = 0;
        {
            let mut guard = self.nodes.write();
            for node in nodes {
                if guard.insert(node) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.notify();
        }
        changed
    }

    pub fn remove(&self, collection: &str, id: &str) -> Option<Node> {
        let removed = self.nodes.write().remove(collection, id);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.nodes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    fn notify(&self) {
        use mpsc::error::TrySendError;

        match self.tx.try_send(StoreSignal::Changed) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => {
                crate::debug!("store"; "change signal dropped, no subscriber");
            }
        }
    }
}
