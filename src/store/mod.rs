//! In-memory item store.
//!
//! # Responsibilities
//! - Own every `TodoItem` for the lifetime of the process
//! - Assign identifiers on insertion
//! - Serve concurrent reads and writes without caller-side locking
//!
//! # Design Decisions
//! - Sharded `DashMap` behind an `Arc`; clones share the same map
//! - Each operation is atomic on its own; there are no multi-step transactions
//! - Readers always get owned copies, never references into the map

pub mod item;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use item::TodoItem;

/// Store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("todo item {0} not found")]
    NotFound(Uuid),
}

/// Thread-safe store of todo items keyed by id.
#[derive(Clone, Default)]
pub struct ItemStore {
    inner: Arc<DashMap<Uuid, TodoItem>>,
}

impl ItemStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `item` under a freshly generated id and return the stored copy.
    ///
    /// Any id already present on `item` is overwritten.
    pub fn insert(&self, mut item: TodoItem) -> TodoItem {
        loop {
            let id = Uuid::new_v4();
            if let Entry::Vacant(slot) = self.inner.entry(id) {
                item.id = id;
                slot.insert(item.clone());
                return item;
            }
        }
    }

    /// Snapshot of every item. Order is unspecified.
    pub fn get_all(&self) -> Vec<TodoItem> {
        self.inner.iter().map(|r| r.value().clone()).collect()
    }

    pub fn get(&self, id: &Uuid) -> Result<TodoItem, StoreError> {
        self.inner
            .get(id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound(*id))
    }

    /// Remove the item with `id`, returning it.
    pub fn delete(&self, id: &Uuid) -> Result<TodoItem, StoreError> {
        self.inner
            .remove(id)
            .map(|(_, item)| item)
            .ok_or(StoreError::NotFound(*id))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let store = ItemStore::new();
        let ids: HashSet<Uuid> = (0..500)
            .map(|i| store.insert(TodoItem::new(format!("item {}", i))).id)
            .collect();

        assert_eq!(ids.len(), 500);
        assert!(!ids.contains(&Uuid::nil()));
        assert_eq!(store.len(), 500);
    }

    #[test]
    fn test_insert_overwrites_client_id() {
        let store = ItemStore::new();
        let client_id = Uuid::new_v4();
        let mut item = TodoItem::new("buy milk");
        item.id = client_id;
        item.done = true;

        let stored = store.insert(item.clone());
        assert_ne!(stored.id, client_id);
        assert!(store.get(&client_id).is_err());

        let fetched = store.get(&stored.id).unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.text, item.text);
        assert_eq!(fetched.done, item.done);
        assert_eq!(fetched.due_date, item.due_date);
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let store = ItemStore::new();
        let id = store.insert(TodoItem::new("walk dog")).id;

        assert!(store.delete(&id).is_ok());
        assert_eq!(store.get(&id), Err(StoreError::NotFound(id)));
        // Repeated delete keeps failing the same way.
        assert_eq!(store.delete(&id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_delete_unknown_leaves_store_untouched() {
        let store = ItemStore::new();
        let kept = store.insert(TodoItem::new("keep me")).id;
        let unknown = Uuid::new_v4();

        assert_eq!(store.delete(&unknown), Err(StoreError::NotFound(unknown)));
        assert_eq!(store.len(), 1);
        assert!(store.get(&kept).is_ok());
    }

    #[test]
    fn test_get_all_counts_inserts_minus_deletes() {
        let store = ItemStore::new();
        let ids: Vec<Uuid> = (0..10)
            .map(|i| store.insert(TodoItem::new(i.to_string())).id)
            .collect();

        for id in ids.iter().take(4) {
            store.delete(id).unwrap();
        }

        let remaining = store.get_all();
        assert_eq!(remaining.len(), 6);
        for id in ids.iter().skip(4) {
            assert!(remaining.iter().any(|item| &item.id == id));
        }
    }

    #[test]
    fn test_clones_share_contents() {
        let store = ItemStore::new();
        let other = store.clone();
        let id = store.insert(TodoItem::new("shared")).id;
        assert!(other.get(&id).is_ok());
    }

    #[test]
    fn test_concurrent_inserts_lose_nothing() {
        let store = ItemStore::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|i| store.insert(TodoItem::new(format!("{}-{}", t, i))).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate id {}", id);
            }
        }

        assert_eq!(ids.len(), 2000);
        assert_eq!(store.len(), 2000);
        for id in &ids {
            assert!(store.get(id).is_ok());
        }
    }
}
