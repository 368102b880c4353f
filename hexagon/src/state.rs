//! The state bound shared by every executor, checkpoint, and debugger surface.
//!
//! A graph is generic over one state type `S` that flows through every node.
//! Handlers receive `S` by value and return a new `S`; nothing here ever
//! hands out a reference to shared, mutable state. See docs on `graph::Node`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Bound required to run a graph at all: cheap to clone, safe to move across
/// tasks, and printable for error messages and tracing fields.
pub trait State: Clone + Send + Sync + Debug + 'static {}

impl<T> State for T where T: Clone + Send + Sync + Debug + 'static {}

/// Additional bound required wherever state crosses a serialization boundary:
/// checkpoints, snapshots, and the distributed HTTP transport.
pub trait SerializableState: State + Serialize + DeserializeOwned {}

impl<T> SerializableState for T where T: State + Serialize + DeserializeOwned {}

/// Non-cryptographic-looking but SHA-256-backed content hash of a state's
/// JSON encoding: `"<len>:<first-16-hex-bytes-of-digest>"`.
///
/// Stable across identical payloads; used by enhanced checkpoints to detect
/// whether a branch actually diverged. See SPEC_FULL §3 for why this
/// replaces the reference length+prefix-bytes scheme from the original spec.
pub fn content_hash<S: Serialize>(value: &S) -> Result<String, serde_json::Error> {
    use sha2::{Digest, Sha256};

    let bytes = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    let prefix: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
    Ok(format!("{}:{}", bytes.len(), prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_stable_across_identical_payloads() {
        let a = content_hash(&vec![1, 2, 3]).unwrap();
        let b = content_hash(&vec![1, 2, 3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_differs_on_change() {
        let a = content_hash(&vec![1, 2, 3]).unwrap();
        let b = content_hash(&vec![1, 2, 4]).unwrap();
        assert_ne!(a, b);
    }
}
