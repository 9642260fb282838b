//! Serialization protocols for checkpoint payloads
//!
//! Backends that store opaque blobs (files, Redis, S3) pick a
//! [`SerializerProtocol`] to turn a [`Checkpoint`] into bytes and back.
//! [`JsonSerializer`] favors debuggability, [`BincodeSerializer`] favors
//! size and speed.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Protocol for encoding checkpoints to bytes
pub trait SerializerProtocol: Send + Sync {
    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

/// Human-readable JSON encoding
#[derive(Default, Clone, Copy)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Compact binary encoding
///
/// Bincode is not self-describing, so it only round-trips types whose
/// `Deserialize` impl never asks the format to describe itself. Plain
/// structs and enums are fine; `serde_json::Value` is not. Backends that
/// carry the raw record should encode it to a JSON string first.
#[derive(Default, Clone, Copy)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for BincodeSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;
    use serde_json::json;

    #[test]
    fn test_json_serializer_roundtrip() {
        let serializer = JsonSerializer::new();
        let ckpt = Checkpoint::new(json!({"messages": ["hola"]}), 2);

        let bytes = serializer.dumps(&ckpt).unwrap();
        let restored: Checkpoint = serializer.loads(&bytes).unwrap();
        assert_eq!(restored, ckpt);
    }

    #[test]
    fn test_bincode_serializer_roundtrip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Envelope {
            thread: String,
            step: u32,
            record: String,
        }

        let envelope = Envelope {
            thread: "user-42".into(),
            step: 3,
            record: r#"{"stage":"gathering"}"#.into(),
        };

        let serializer = BincodeSerializer::new();
        let bytes = serializer.dumps(&envelope).unwrap();
        let restored: Envelope = serializer.loads(&bytes).unwrap();
        assert_eq!(restored, envelope);
    }

    #[test]
    fn test_loads_rejects_garbage() {
        let serializer = JsonSerializer::new();
        let result: Result<Checkpoint> = serializer.loads(b"not json");
        assert!(result.is_err());
    }
}
