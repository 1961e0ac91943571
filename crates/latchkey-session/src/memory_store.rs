//! In-memory session store.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{SessionError, SessionStore, SlotKey};

/// A [`SessionStore`] backed by a `HashMap`.
///
/// Nothing survives a restart, so this suits tests and single-process
/// deployments that accept a logout on restart. Every operation runs
/// under one async mutex, which makes `compare_and_swap` trivially
/// atomic.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<HashMap<SlotKey, Vec<u8>>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Returns `true` if no slot is occupied.
    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn persist(&self, slot: &SlotKey, blob: Vec<u8>) -> Result<(), SessionError> {
        self.slots.lock().await.insert(slot.clone(), blob);
        Ok(())
    }

    async fn load(&self, slot: &SlotKey) -> Result<Vec<u8>, SessionError> {
        self.slots
            .lock()
            .await
            .get(slot)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(slot.clone()))
    }

    async fn delete(&self, slot: &SlotKey) -> Result<(), SessionError> {
        self.slots.lock().await.remove(slot);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        slot: &SlotKey,
        expected: &[u8],
        blob: Vec<u8>,
    ) -> Result<bool, SessionError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(slot) {
            Some(current) if current.as_slice() == expected => {
                *current = blob;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_empty_slot_returns_not_found() {
        let store = MemorySessionStore::new();
        let result = store.load(&SlotKey::admin()).await;
        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_persist_overwrites_previous_blob() {
        let store = MemorySessionStore::new();
        let slot = SlotKey::admin();
        store.persist(&slot, b"one".to_vec()).await.unwrap();
        store.persist(&slot, b"two".to_vec()).await.unwrap();
        assert_eq!(store.load(&slot).await.unwrap(), b"two");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_twice_is_ok() {
        let store = MemorySessionStore::new();
        let slot = SlotKey::admin();
        store.persist(&slot, b"blob".to_vec()).await.unwrap();
        store.delete(&slot).await.unwrap();
        store.delete(&slot).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_compare_and_swap_matching_expected_writes() {
        let store = MemorySessionStore::new();
        let slot = SlotKey::admin();
        store.persist(&slot, b"old".to_vec()).await.unwrap();

        let swapped = store
            .compare_and_swap(&slot, b"old", b"new".to_vec())
            .await
            .unwrap();

        assert!(swapped);
        assert_eq!(store.load(&slot).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_compare_and_swap_stale_expected_leaves_slot() {
        let store = MemorySessionStore::new();
        let slot = SlotKey::admin();
        store.persist(&slot, b"current".to_vec()).await.unwrap();

        let swapped = store
            .compare_and_swap(&slot, b"stale", b"new".to_vec())
            .await
            .unwrap();

        assert!(!swapped);
        assert_eq!(store.load(&slot).await.unwrap(), b"current");
    }

    #[tokio::test]
    async fn test_compare_and_swap_empty_slot_returns_false() {
        let store = MemorySessionStore::new();
        let swapped = store
            .compare_and_swap(&SlotKey::admin(), b"x", b"y".to_vec())
            .await
            .unwrap();
        assert!(!swapped);
        assert!(store.is_empty().await);
    }
}
