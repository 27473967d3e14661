//! In-memory [`CommitmentSource`] for tests.

#![allow(missing_docs, clippy::missing_panics_doc)]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use pessimist_types::PacketCommitment;

use crate::{CommitmentSource, ObserverError};

#[derive(Debug, Default)]
struct MockState {
    latest: u64,
    earliest: u64,
    commitments: BTreeMap<u64, Vec<PacketCommitment>>,
    failures: usize,
    delay: Option<Duration>,
}

/// Scriptable source. Clones share state, so a test can keep a handle while
/// an observer owns another.
#[derive(Debug, Clone)]
pub struct MockSource {
    chain_id: String,
    state: Arc<Mutex<MockState>>,
}

impl MockSource {
    pub fn new(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            state: Arc::default(),
        }
    }

    /// Block time the mock reports for `height`.
    #[must_use]
    pub const fn timestamp_at(height: u64) -> u64 {
        1_700_000_000 + height * 5
    }

    pub fn set_latest(&self, height: u64) {
        self.state.lock().unwrap().latest = height;
    }

    pub fn set_earliest(&self, height: u64) {
        self.state.lock().unwrap().earliest = height;
    }

    pub fn set_commitments(&self, height: u64, commitments: Vec<PacketCommitment>) {
        self.state
            .lock()
            .unwrap()
            .commitments
            .insert(height, commitments);
    }

    /// Make the next `n` calls fail with `UnreachableSource`.
    pub fn fail_next(&self, n: usize) {
        self.state.lock().unwrap().failures = n;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    fn begin_call(&self) -> Result<Option<Duration>, ObserverError> {
        let mut state = self.state.lock().unwrap();
        if state.failures > 0 {
            state.failures -= 1;
            return Err(ObserverError::unreachable(&self.chain_id, "connection refused"));
        }
        Ok(state.delay)
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl CommitmentSource for MockSource {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn latest_height(&self) -> Result<u64, ObserverError> {
        let delay = self.begin_call()?;
        Self::pause(delay).await;
        Ok(self.state.lock().unwrap().latest)
    }

    async fn packet_commitments(&self, height: u64) -> Result<Vec<PacketCommitment>, ObserverError> {
        let delay = self.begin_call()?;
        Self::pause(delay).await;
        let state = self.state.lock().unwrap();
        if height < state.earliest {
            return Err(ObserverError::StaleHeight {
                requested: height,
                earliest: state.earliest,
            });
        }
        Ok(state.commitments.get(&height).cloned().unwrap_or_default())
    }

    async fn block_timestamp(&self, height: u64) -> Result<u64, ObserverError> {
        let delay = self.begin_call()?;
        Self::pause(delay).await;
        Ok(Self::timestamp_at(height))
    }
}
