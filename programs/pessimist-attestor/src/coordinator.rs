use std::{collections::BTreeMap, sync::Arc, time::Duration};

use pessimist_types::SignedPacketCommitmentsClaim;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{error, info, warn};

use crate::{
    attestor::{ChainAttestor, ChainStatus},
    AttestorError,
};

struct Chain<A> {
    attestor: Arc<A>,
    poll_interval: Duration,
}

/// Owns one attestor per configured chain and answers queries across them.
pub struct Coordinator<A: ChainAttestor> {
    chains: BTreeMap<String, Chain<A>>,
}

/// Handles of the running per-chain tasks.
pub struct Running {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl<A: ChainAttestor> Default for Coordinator<A> {
    fn default() -> Self {
        Self {
            chains: BTreeMap::new(),
        }
    }
}

impl<A: ChainAttestor> Coordinator<A> {
    /// Register `attestor`, polled every `poll_interval`.
    pub fn add_chain(&mut self, attestor: A, poll_interval: Duration) {
        self.chains.insert(
            attestor.chain_id().to_string(),
            Chain {
                attestor: Arc::new(attestor),
                poll_interval,
            },
        );
    }

    pub fn chain_ids(&self) -> Vec<String> {
        self.chains.keys().cloned().collect()
    }

    fn attestor(&self, chain_id: &str) -> Result<&A, AttestorError> {
        self.chains
            .get(chain_id)
            .map(|chain| chain.attestor.as_ref())
            .ok_or_else(|| AttestorError::UnknownChain(chain_id.to_string()))
    }

    pub fn latest_signed_claim(
        &self,
        chain_id: &str,
    ) -> Result<Option<SignedPacketCommitmentsClaim>, AttestorError> {
        Ok(self.attestor(chain_id)?.latest_signed_claim())
    }

    pub fn claim_at_height(
        &self,
        chain_id: &str,
        height: u64,
    ) -> Result<Option<SignedPacketCommitmentsClaim>, AttestorError> {
        Ok(self.attestor(chain_id)?.claim_at_height(height))
    }

    pub fn claims_from_height(
        &self,
        chain_id: &str,
        height: u64,
    ) -> Result<Vec<SignedPacketCommitmentsClaim>, AttestorError> {
        Ok(self.attestor(chain_id)?.claims_from_height(height))
    }

    pub fn status(&self, chain_id: &str) -> Result<ChainStatus, AttestorError> {
        Ok(self.attestor(chain_id)?.status())
    }

    pub fn statuses(&self) -> Vec<ChainStatus> {
        self.chains
            .values()
            .map(|chain| chain.attestor.status())
            .collect()
    }

    /// Spawn one polling task per chain. Each task has its own timer and
    /// stops on its own after a consistency violation.
    pub fn start(&self) -> Running {
        let (shutdown, _) = watch::channel(false);
        let tasks = self
            .chains
            .values()
            .map(|chain| {
                tokio::spawn(poll_chain(
                    chain.attestor.clone(),
                    chain.poll_interval,
                    shutdown.subscribe(),
                ))
            })
            .collect();
        Running { shutdown, tasks }
    }
}

impl Running {
    /// Signal every task to stop and wait for them.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "chain task ended abnormally");
            }
        }
    }
}

async fn poll_chain<A: ChainAttestor>(
    attestor: Arc<A>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let chain_id = attestor.chain_id().to_string();
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(%chain_id, interval_ms = poll_interval.as_millis(), "polling chain");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        match attestor.collect_claims().await {
            Ok(_) => {}
            Err(e @ (AttestorError::ConsistencyViolation { .. } | AttestorError::Halted(_))) => {
                error!(%chain_id, error = %e, "stopping chain task");
                break;
            }
            Err(e) => warn!(%chain_id, error = %e, "collection failed, retrying next tick"),
        }
    }
    info!(%chain_id, "chain task stopped");
}

#[cfg(test)]
mod start {
    use std::time::Duration;

    use pessimist_chain_observer::{test_utils::MockSource, SnapshotObserver};

    use super::*;
    use crate::attestor::{test_utils::*, Attestor, Phase};

    type MockAttestor = Attestor<SnapshotObserver<MockSource>>;

    fn coordinator() -> (MockSource, MockSource, Coordinator<MockAttestor>) {
        let (fast_source, fast) = attestor("fast-chain");
        let (slow_source, slow) = attestor("slow-chain");
        let mut coordinator = Coordinator::default();
        coordinator.add_chain(fast, Duration::from_millis(100));
        coordinator.add_chain(slow, Duration::from_millis(1_000));
        (fast_source, slow_source, coordinator)
    }

    #[tokio::test(start_paused = true)]
    async fn chains_poll_independently() {
        let (fast_source, slow_source, coordinator) = coordinator();
        fast_source.set_latest(1);
        slow_source.set_latest(1);
        slow_source.fail_next(100);

        let running = coordinator.start();
        for height in 2..=5 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fast_source.set_latest(height);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(
            coordinator
                .latest_signed_claim("fast-chain")
                .unwrap()
                .map(|c| c.height()),
            Some(5)
        );
        assert!(coordinator
            .latest_signed_claim("slow-chain")
            .unwrap()
            .is_none());

        running.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn halted_chain_does_not_stop_others() {
        let (fast_source, slow_source, coordinator) = coordinator();
        slow_source.set_latest(7);
        slow_source.set_commitments(7, vec![packet(1)]);
        fast_source.set_latest(1);

        let running = coordinator.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        slow_source.set_commitments(7, vec![packet(2)]);
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        fast_source.set_latest(2);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            coordinator.status("slow-chain").unwrap().phase,
            Phase::Halted { height: 7 }
        );
        assert_eq!(
            coordinator.status("fast-chain").unwrap().latest_height,
            Some(2)
        );

        running.shutdown().await;
    }

    #[test]
    fn unknown_chain_is_an_error() {
        let (_, _, coordinator) = coordinator();
        assert_eq!(
            coordinator.latest_signed_claim("chain-z"),
            Err(AttestorError::UnknownChain("chain-z".into()))
        );
        assert_eq!(coordinator.chain_ids(), vec!["fast-chain", "slow-chain"]);
    }
}
