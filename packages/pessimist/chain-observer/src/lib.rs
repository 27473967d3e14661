#![doc = "Read packet-commitment state from source chains"]
#![warn(clippy::nursery, clippy::pedantic, missing_docs)]

mod error;
mod observer;
mod source;

#[cfg(feature = "cosmos")]
pub mod cosmos;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::ObserverError;
pub use observer::{ChainObserver, Observation, SnapshotObserver};
pub use source::CommitmentSource;
