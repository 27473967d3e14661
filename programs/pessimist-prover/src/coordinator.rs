use std::{collections::BTreeMap, sync::Arc, time::Duration};

use alloy_primitives::B256;
use pessimist_types::MembershipProof;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{prover::ChainProver, ProverError};

/// Per-chain provers, polled on their own timers.
pub struct Coordinator<P: ChainProver> {
    chains: BTreeMap<String, (Arc<P>, Duration)>,
}

/// Handles of the running per-chain tasks.
pub struct Running {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl<P: ChainProver> Default for Coordinator<P> {
    fn default() -> Self {
        Self {
            chains: BTreeMap::new(),
        }
    }
}

impl<P: ChainProver> Coordinator<P> {
    pub fn add_chain(&mut self, prover: P, poll_interval: Duration) {
        self.chains.insert(
            prover.chain_id().to_string(),
            (Arc::new(prover), poll_interval),
        );
    }

    fn prover(&self, chain_id: &str) -> Result<&P, ProverError> {
        self.chains
            .get(chain_id)
            .map(|(prover, _)| prover.as_ref())
            .ok_or_else(|| ProverError::UnknownChain(chain_id.to_string()))
    }

    /// JSON bundle of `chain_id`; empty if nothing was collected yet.
    pub fn latest_bundle(&self, chain_id: &str) -> Result<Vec<u8>, ProverError> {
        Ok(self.prover(chain_id)?.get_proof())
    }

    /// Proof for the packet under the hex encoded `path`.
    pub fn proof_for(
        &self,
        chain_id: &str,
        path_hex: &str,
    ) -> Result<Option<MembershipProof>, ProverError> {
        let prover = self.prover(chain_id)?;
        let path: B256 = path_hex
            .parse()
            .map_err(|_| ProverError::InvalidPath(path_hex.to_string()))?;
        Ok(prover.proof_for(&path))
    }

    pub fn start(&self) -> Running {
        let (shutdown, _) = watch::channel(false);
        let tasks = self
            .chains
            .values()
            .map(|(prover, poll_interval)| {
                tokio::spawn(poll_chain(
                    prover.clone(),
                    *poll_interval,
                    shutdown.subscribe(),
                ))
            })
            .collect();
        Running { shutdown, tasks }
    }
}

impl Running {
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "prover task ended abnormally");
            }
        }
    }
}

async fn poll_chain<P: ChainProver>(
    prover: Arc<P>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let chain_id = prover.chain_id().to_string();
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if let Err(e) = prover.collect_proofs().await {
            warn!(%chain_id, error = %e, "proof collection failed, retrying next tick");
        }
    }
    info!(%chain_id, "prover task stopped");
}
