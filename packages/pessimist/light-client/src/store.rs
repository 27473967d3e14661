//! Key-value storage the module persists clients into

use std::collections::BTreeMap;

/// Host chain key-value store.
pub trait ClientStore {
    /// Value under `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    /// Write `value` under `key`.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);
    /// Remove `key`.
    fn delete(&mut self, key: &[u8]);
    /// All keys starting with `prefix`, in ascending byte order.
    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>>;
}

/// In-memory store, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(BTreeMap<Vec<u8>, Vec<u8>>);

impl MemoryStore {
    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.0.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.0.remove(key);
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.0
            .range(prefix.to_vec()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// `clients/{client_id}/clientState`
#[must_use]
pub fn client_state_key(client_id: &str) -> Vec<u8> {
    format!("clients/{client_id}/clientState").into_bytes()
}

/// `clients/{client_id}/consensusStates/`
#[must_use]
pub fn consensus_state_prefix(client_id: &str) -> Vec<u8> {
    format!("clients/{client_id}/consensusStates/").into_bytes()
}

/// Consensus state key; the height is big-endian so keys sort by height.
#[must_use]
pub fn consensus_state_key(client_id: &str, height: u64) -> Vec<u8> {
    let mut key = consensus_state_prefix(client_id);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

#[cfg(test)]
mod keys_with_prefix {
    use super::*;

    #[test]
    fn orders_consensus_keys_by_height() {
        let mut store = MemoryStore::default();
        for height in [300, 2, 70_000] {
            store.set(consensus_state_key("c-0", height), vec![]);
        }
        store.set(consensus_state_key("c-1", 1), vec![]);
        store.set(client_state_key("c-0"), vec![]);

        let keys = store.keys_with_prefix(&consensus_state_prefix("c-0"));

        assert_eq!(
            keys,
            vec![
                consensus_state_key("c-0", 2),
                consensus_state_key("c-0", 300),
                consensus_state_key("c-0", 70_000),
            ]
        );
    }
}
