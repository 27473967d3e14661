//! Pluggable encoding of messages crossing the client module boundary.
//!
//! A codec is chosen when a module is constructed; there is no global
//! registry of message types.

use serde::{de::DeserializeOwned, Serialize};

use crate::TypesError;

/// Encode/decode boundary for client messages and persisted state.
pub trait Codec: Send + Sync {
    /// Serialize `value`.
    ///
    /// # Errors
    /// Returns [`TypesError::Encode`] if the value cannot be encoded.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, TypesError>;

    /// Deserialize a `T` from `bytes`.
    ///
    /// # Errors
    /// Returns [`TypesError::Decode`] if the bytes are not a valid `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, TypesError>;
}

/// JSON, the encoding attestors and provers serve over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, TypesError> {
        serde_json::to_vec(value).map_err(|e| TypesError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, TypesError> {
        serde_json::from_slice(bytes).map_err(|e| TypesError::Decode(e.to_string()))
    }
}

/// Compact binary encoding for hosts that persist raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, TypesError> {
        bincode::serialize(value).map_err(|e| TypesError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, TypesError> {
        bincode::deserialize(bytes).map_err(|e| TypesError::Decode(e.to_string()))
    }
}
