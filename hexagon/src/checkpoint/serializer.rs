//! State <-> bytes serialization for persistent saver backends.
//!
//! Aligns with the teacher's `Serializer`/`JsonSerializer`
//! (`memory/serializer.rs`); `MemorySaver` keeps `S` directly in memory and
//! has no need for this, the same as the teacher's `MemorySaver`.

use crate::checkpoint::error::CheckpointError;
use crate::state::content_hash;

pub trait Serializer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

pub struct JsonSerializer;

impl<S> Serializer<S> for JsonSerializer
where
    S: Clone + Send + Sync + 'static + serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(state).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}

/// The content hash used for `EnhancedCheckpoint::state_hash`: stable across
/// identical payloads, cheap to compute on every save.
pub fn state_hash<S: serde::Serialize>(state: &S) -> Result<String, CheckpointError> {
    content_hash(state).map_err(|e| CheckpointError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct TestState {
        value: String,
    }

    #[test]
    fn json_serializer_roundtrip() {
        let ser = JsonSerializer;
        let state = TestState { value: "hello".into() };
        let bytes = ser.serialize(&state).unwrap();
        let restored: TestState = ser.deserialize(&bytes).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn json_serializer_invalid_json_deserialize_returns_error() {
        let ser = JsonSerializer;
        let invalid = b"{ not valid json ]";
        let result: Result<TestState, _> = ser.deserialize(invalid);
        assert!(matches!(result, Err(CheckpointError::Serialization(_))));
    }
}
