use std::{
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use pessimist_chain_observer::ChainObserver;
use pessimist_types::SignedPacketCommitmentsClaim;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::{claim_store::ClaimStore, metrics, signer::Signer, AttestorError};

/// Where an attestor is in its collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum Phase {
    Idle,
    Collecting,
    Signed,
    /// Terminal; a differing root was observed at `height`.
    Halted { height: u64 },
}

/// Per-chain view served on `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStatus {
    pub chain_id: String,
    #[serde(flatten)]
    pub phase: Phase,
    pub latest_height: Option<u64>,
}

/// Result of one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    /// A new claim was signed and published
    Signed(SignedPacketCommitmentsClaim),
    /// The latest height is already signed with the same root
    Unchanged { height: u64 },
    /// The observer went backwards; nothing was signed
    Skipped { observed: u64, latest: u64 },
}

/// A per-chain attestation capability.
pub trait ChainAttestor: Send + Sync + 'static {
    fn chain_id(&self) -> &str;

    /// Run one collection cycle.
    fn collect_claims(&self) -> impl Future<Output = Result<Collected, AttestorError>> + Send;

    /// Latest published claim. Never waits on an in-flight collection.
    fn latest_signed_claim(&self) -> Option<SignedPacketCommitmentsClaim>;

    /// Retained claim at exactly `height`.
    fn claim_at_height(&self, height: u64) -> Option<SignedPacketCommitmentsClaim>;

    /// Retained claims from `height` onwards, in height order.
    fn claims_from_height(&self, height: u64) -> Vec<SignedPacketCommitmentsClaim>;

    fn status(&self) -> ChainStatus;
}

/// Observes one chain and signs what it sees.
///
/// Emission is monotonic in height. Observing a different root at an already
/// signed height halts the attestor for good.
pub struct Attestor<O: ChainObserver> {
    observer: O,
    signer: Arc<Signer>,
    phase: watch::Sender<Phase>,
    latest: watch::Sender<Option<SignedPacketCommitmentsClaim>>,
    history: RwLock<ClaimStore>,
}

impl<O: ChainObserver> Attestor<O> {
    pub fn new(observer: O, signer: Arc<Signer>, history_size: usize) -> Self {
        Self {
            observer,
            signer,
            phase: watch::Sender::new(Phase::Idle),
            latest: watch::Sender::new(None),
            history: RwLock::new(ClaimStore::new(history_size)),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver notified on every newly published claim.
    pub fn subscribe(&self) -> watch::Receiver<Option<SignedPacketCommitmentsClaim>> {
        self.latest.subscribe()
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.send_replace(phase);
    }

    fn fail(&self, err: impl Into<AttestorError>) -> AttestorError {
        metrics::COLLECTION_FAILURES
            .with_label_values(&[self.observer.chain_id()])
            .inc();
        self.set_phase(Phase::Idle);
        err.into()
    }

    fn publish(&self, claim: &SignedPacketCommitmentsClaim) {
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(claim.clone());
        self.latest.send_replace(Some(claim.clone()));
        metrics::record_claim(claim.chain_id(), claim.height());
    }
}

impl<O: ChainObserver> ChainAttestor for Attestor<O> {
    fn chain_id(&self) -> &str {
        self.observer.chain_id()
    }

    #[instrument(skip(self), fields(chain_id = self.observer.chain_id()))]
    async fn collect_claims(&self) -> Result<Collected, AttestorError> {
        if let Phase::Halted { .. } = self.phase() {
            return Err(AttestorError::Halted(self.chain_id().to_string()));
        }
        self.set_phase(Phase::Collecting);

        let snapshot = match self.observer.collect_snapshot(None).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "failed to collect snapshot");
                return Err(self.fail(e));
            }
        };

        if let Some(latest) = self.latest_signed_claim() {
            if snapshot.height < latest.height() {
                warn!(
                    observed = snapshot.height,
                    latest = latest.height(),
                    "observed height went backwards, skipping"
                );
                self.set_phase(Phase::Idle);
                return Ok(Collected::Skipped {
                    observed: snapshot.height,
                    latest: latest.height(),
                });
            }

            if snapshot.height == latest.height() {
                if snapshot.commitment_root == latest.snapshot.commitment_root {
                    self.set_phase(Phase::Idle);
                    return Ok(Collected::Unchanged {
                        height: snapshot.height,
                    });
                }

                let err = AttestorError::ConsistencyViolation {
                    chain_id: self.chain_id().to_string(),
                    height: snapshot.height,
                    signed: latest.snapshot.commitment_root.to_string(),
                    observed: snapshot.commitment_root.to_string(),
                };
                error!(error = %err, "halting attestation for chain");
                metrics::CONSISTENCY_VIOLATIONS
                    .with_label_values(&[self.chain_id()])
                    .inc();
                self.set_phase(Phase::Halted {
                    height: snapshot.height,
                });
                return Err(err);
            }
        }

        let claim = match self.signer.sign(&snapshot) {
            Ok(claim) => claim,
            Err(e) => {
                warn!(error = %e, "failed to sign snapshot");
                return Err(self.fail(e));
            }
        };

        self.publish(&claim);
        self.set_phase(Phase::Signed);
        info!(height = claim.height(), root = %claim.snapshot.commitment_root, "signed claim");
        self.set_phase(Phase::Idle);

        Ok(Collected::Signed(claim))
    }

    fn latest_signed_claim(&self) -> Option<SignedPacketCommitmentsClaim> {
        self.latest.borrow().clone()
    }

    fn claim_at_height(&self, height: u64) -> Option<SignedPacketCommitmentsClaim> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .claim_at_height(height)
            .cloned()
    }

    fn claims_from_height(&self, height: u64) -> Vec<SignedPacketCommitmentsClaim> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .claims_from_height(height)
            .into_values()
            .collect()
    }

    fn status(&self) -> ChainStatus {
        ChainStatus {
            chain_id: self.chain_id().to_string(),
            phase: self.phase(),
            latest_height: self
                .latest
                .borrow()
                .as_ref()
                .map(SignedPacketCommitmentsClaim::height),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::{sync::Arc, time::Duration};

    use alloy_primitives::B256;
    use alloy_signer_local::PrivateKeySigner;
    use pessimist_chain_observer::{test_utils::MockSource, SnapshotObserver};
    use pessimist_types::PacketCommitment;

    use super::Attestor;
    use crate::signer::Signer;

    pub fn packet(n: u8) -> PacketCommitment {
        PacketCommitment {
            path: B256::repeat_byte(n),
            commitment: B256::repeat_byte(n.wrapping_add(0x80)),
        }
    }

    pub fn signer() -> Arc<Signer> {
        Arc::new(Signer::new(
            PrivateKeySigner::from_slice(&[0x11; 32]).unwrap(),
            "A",
        ))
    }

    pub fn attestor(chain_id: &str) -> (MockSource, Attestor<SnapshotObserver<MockSource>>) {
        let source = MockSource::new(chain_id);
        let observer = SnapshotObserver::new(source.clone(), Duration::from_secs(1));
        (source, Attestor::new(observer, signer(), 8))
    }
}
