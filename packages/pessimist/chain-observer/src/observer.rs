use std::{future::Future, time::Duration};

use pessimist_types::{PacketCommitment, PacketCommitmentSnapshot};

use crate::{CommitmentSource, ObserverError};

/// Produces unsigned snapshots of a source chain.
pub trait ChainObserver: Send + Sync + 'static {
    /// Identifier of the observed chain.
    fn chain_id(&self) -> &str;

    /// Snapshot at `height`, or at the latest height if `None`.
    ///
    /// Repeated calls for the same height must return the same root; the
    /// caller escalates a difference instead of retrying.
    fn collect_snapshot(
        &self,
        height: Option<u64>,
    ) -> impl Future<Output = Result<PacketCommitmentSnapshot, ObserverError>> + Send;
}

/// Raw store contents at one height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Height the store was read at
    pub height: u64,
    /// Block time of `height`
    pub timestamp: u64,
    /// Packet commitments present at `height`
    pub commitments: Vec<PacketCommitment>,
}

/// [`ChainObserver`] over any [`CommitmentSource`], bounding each network
/// call by a timeout.
#[derive(Debug)]
pub struct SnapshotObserver<S> {
    source: S,
    timeout: Duration,
}

impl<S: CommitmentSource> SnapshotObserver<S> {
    /// Wrap `source`; every call to it gives up after `timeout`.
    pub const fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// The wrapped source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Read the commitments and block time at `height` (or latest).
    ///
    /// # Errors
    /// Any source failure, or [`ObserverError::UnreachableSource`] on timeout.
    pub async fn observe(&self, height: Option<u64>) -> Result<Observation, ObserverError> {
        let height = match height {
            Some(height) => height,
            None => self.bounded(self.source.latest_height()).await?,
        };

        let (commitments, timestamp) = tokio::try_join!(
            self.bounded(self.source.packet_commitments(height)),
            self.bounded(self.source.block_timestamp(height)),
        )?;

        tracing::debug!(
            chain_id = self.source.chain_id(),
            height,
            commitments = commitments.len(),
            "observed packet commitments"
        );

        Ok(Observation {
            height,
            timestamp,
            commitments,
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ObserverError>>,
    ) -> Result<T, ObserverError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                ObserverError::unreachable(
                    self.source.chain_id(),
                    format!("timed out after {}ms", self.timeout.as_millis()),
                )
            })?
    }
}

impl<S: CommitmentSource> ChainObserver for SnapshotObserver<S> {
    fn chain_id(&self) -> &str {
        self.source.chain_id()
    }

    async fn collect_snapshot(
        &self,
        height: Option<u64>,
    ) -> Result<PacketCommitmentSnapshot, ObserverError> {
        let observation = self.observe(height).await?;
        Ok(PacketCommitmentSnapshot::from_commitments(
            self.source.chain_id(),
            observation.height,
            observation.timestamp,
            observation.commitments,
        ))
    }
}

#[cfg(test)]
mod collect_snapshot {
    use std::time::Duration;

    use alloy_primitives::B256;

    use super::*;
    use crate::test_utils::MockSource;

    fn packet(n: u8) -> PacketCommitment {
        PacketCommitment {
            path: B256::repeat_byte(n),
            commitment: B256::repeat_byte(n + 1),
        }
    }

    #[tokio::test]
    async fn reads_latest_height_when_unspecified() {
        let source = MockSource::new("chain-a");
        source.set_latest(12);
        source.set_commitments(12, vec![packet(1), packet(2)]);
        let observer = SnapshotObserver::new(source, Duration::from_secs(1));

        let snapshot = observer.collect_snapshot(None).await.unwrap();

        assert_eq!(snapshot.chain_id, "chain-a");
        assert_eq!(snapshot.height, 12);
        assert_eq!(snapshot.collected_at, MockSource::timestamp_at(12));
        assert_eq!(
            snapshot,
            PacketCommitmentSnapshot::from_commitments(
                "chain-a",
                12,
                MockSource::timestamp_at(12),
                vec![packet(2), packet(1)]
            )
        );
    }

    #[tokio::test]
    async fn same_height_gives_same_root() {
        let source = MockSource::new("chain-a");
        source.set_latest(20);
        source.set_commitments(10, vec![packet(1)]);
        let observer = SnapshotObserver::new(source, Duration::from_secs(1));

        let first = observer.collect_snapshot(Some(10)).await.unwrap();
        let second = observer.collect_snapshot(Some(10)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fails_on_pruned_height() {
        let source = MockSource::new("chain-a");
        source.set_latest(20);
        source.set_earliest(5);
        let observer = SnapshotObserver::new(source, Duration::from_secs(1));

        let res = observer.collect_snapshot(Some(4)).await;
        assert_eq!(
            res,
            Err(ObserverError::StaleHeight {
                requested: 4,
                earliest: 5
            })
        );
    }

    #[tokio::test]
    async fn propagates_unreachable_source() {
        let source = MockSource::new("chain-a");
        source.fail_next(1);
        let observer = SnapshotObserver::new(source, Duration::from_secs(1));

        let res = observer.collect_snapshot(None).await;
        assert!(matches!(res, Err(ObserverError::UnreachableSource { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_slow_source() {
        let source = MockSource::new("chain-a");
        source.set_latest(3);
        source.set_delay(Duration::from_secs(30));
        let observer = SnapshotObserver::new(source, Duration::from_millis(500));

        let res = observer.collect_snapshot(None).await;
        assert!(matches!(
            res,
            Err(ObserverError::UnreachableSource { reason, .. }) if reason.contains("timed out")
        ));
    }
}
