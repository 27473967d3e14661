use std::{future::Future, sync::Arc};

use alloy_primitives::B256;
use pessimist_chain_observer::{CommitmentSource, SnapshotObserver};
use pessimist_types::{merkle::CommitmentTree, MembershipProof, ProofBundle};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::ProverError;

/// A per-chain proof collection capability.
pub trait ChainProver: Send + Sync + 'static {
    fn chain_id(&self) -> &str;

    /// Read the latest commitments and publish proofs for them. Returns the
    /// height of the published bundle.
    fn collect_proofs(&self) -> impl Future<Output = Result<u64, ProverError>> + Send;

    /// JSON encoding of the latest bundle; empty if none was collected yet.
    fn get_proof(&self) -> Vec<u8>;

    /// Proof for the packet stored under `path` in the latest bundle.
    fn proof_for(&self, path: &B256) -> Option<MembershipProof>;
}

/// Builds proof bundles straight from a [`CommitmentSource`].
pub struct CommitmentProver<S: CommitmentSource> {
    observer: SnapshotObserver<S>,
    latest: watch::Sender<Option<Arc<ProofBundle>>>,
}

impl<S: CommitmentSource> CommitmentProver<S> {
    pub fn new(observer: SnapshotObserver<S>) -> Self {
        Self {
            observer,
            latest: watch::Sender::new(None),
        }
    }

    pub fn latest_bundle(&self) -> Option<Arc<ProofBundle>> {
        self.latest.borrow().clone()
    }
}

impl<S: CommitmentSource> ChainProver for CommitmentProver<S> {
    fn chain_id(&self) -> &str {
        self.observer.source().chain_id()
    }

    #[instrument(skip(self), fields(chain_id = self.observer.source().chain_id()))]
    async fn collect_proofs(&self) -> Result<u64, ProverError> {
        let observation = self.observer.observe(None).await.inspect_err(|e| {
            warn!(error = %e, "failed to read commitments");
        })?;

        if let Some(latest) = self.latest_bundle() {
            if observation.height <= latest.height {
                debug!(
                    observed = observation.height,
                    latest = latest.height,
                    "no newer height to prove"
                );
                return Ok(latest.height);
            }
        }

        let tree = CommitmentTree::new(observation.commitments);
        let bundle = ProofBundle::from_tree(self.chain_id(), observation.height, &tree);
        info!(
            height = bundle.height,
            root = %bundle.commitment_root,
            proofs = bundle.proofs.len(),
            "collected proofs"
        );

        let height = bundle.height;
        self.latest.send_replace(Some(Arc::new(bundle)));
        Ok(height)
    }

    fn get_proof(&self) -> Vec<u8> {
        self.latest_bundle()
            .and_then(|bundle| serde_json::to_vec(bundle.as_ref()).ok())
            .unwrap_or_default()
    }

    fn proof_for(&self, path: &B256) -> Option<MembershipProof> {
        self.latest_bundle()
            .and_then(|bundle| bundle.proof_for(path).cloned())
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::time::Duration;

    use pessimist_chain_observer::{test_utils::MockSource, SnapshotObserver};
    use pessimist_types::PacketCommitment;

    use super::*;

    pub fn packet(n: u8) -> PacketCommitment {
        PacketCommitment {
            path: B256::repeat_byte(n),
            commitment: B256::repeat_byte(n.wrapping_mul(3)),
        }
    }

    pub fn prover(chain_id: &str) -> (MockSource, CommitmentProver<MockSource>) {
        let source = MockSource::new(chain_id);
        let observer = SnapshotObserver::new(source.clone(), Duration::from_secs(1));
        (source, CommitmentProver::new(observer))
    }
}

#[cfg(test)]
mod collect_proofs {
    use super::{test_utils::*, *};

    #[tokio::test]
    async fn publishes_verifiable_bundle() {
        let (source, prover) = prover("chain-a");
        source.set_latest(90);
        source.set_commitments(90, vec![packet(3), packet(1), packet(2)]);

        assert_eq!(prover.collect_proofs().await.unwrap(), 90);

        let bundle: ProofBundle = serde_json::from_slice(&prover.get_proof()).unwrap();
        assert_eq!(bundle.height, 90);
        assert_eq!(bundle.proofs.len(), 3);

        let proof = prover.proof_for(&B256::repeat_byte(2)).unwrap();
        assert_eq!(proof.leaf, packet(2));
        assert!(proof.proves(&bundle.commitment_root));
    }

    #[tokio::test]
    async fn empty_before_first_collection() {
        let (_, prover) = prover("chain-b");
        assert!(prover.get_proof().is_empty());
        assert!(prover.proof_for(&B256::repeat_byte(1)).is_none());
    }

    #[tokio::test]
    async fn failure_keeps_previous_bundle() {
        let (source, prover) = prover("chain-c");
        source.set_latest(5);
        source.set_commitments(5, vec![packet(1)]);
        prover.collect_proofs().await.unwrap();

        source.set_latest(6);
        source.fail_next(1);
        assert!(matches!(
            prover.collect_proofs().await,
            Err(ProverError::Observer(_))
        ));
        assert_eq!(prover.latest_bundle().unwrap().height, 5);
    }

    #[tokio::test]
    async fn never_replaces_with_older_height() {
        let (source, prover) = prover("chain-d");
        source.set_latest(8);
        prover.collect_proofs().await.unwrap();

        source.set_latest(7);
        source.set_commitments(7, vec![packet(1)]);
        assert_eq!(prover.collect_proofs().await.unwrap(), 8);
        assert!(prover.latest_bundle().unwrap().proofs.is_empty());
    }
}
