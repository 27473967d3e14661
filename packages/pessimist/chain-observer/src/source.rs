use std::future::Future;

use pessimist_types::PacketCommitment;

use crate::ObserverError;

/// Read access to one source chain's packet-commitment store.
///
/// One implementation exists per chain family; observers, attestors and
/// provers are generic over it.
pub trait CommitmentSource: Send + Sync + 'static {
    /// Identifier of the chain this source reads.
    fn chain_id(&self) -> &str;

    /// Latest height the node has committed.
    fn latest_height(&self) -> impl Future<Output = Result<u64, ObserverError>> + Send;

    /// All packet commitments in the store at `height`.
    fn packet_commitments(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<Vec<PacketCommitment>, ObserverError>> + Send;

    /// Unix time (seconds) of the block at `height`.
    fn block_timestamp(&self, height: u64)
        -> impl Future<Output = Result<u64, ObserverError>> + Send;
}
