//! Value serialization contract.
//!
//! The stream client stores whatever the caller gives it; the caller supplies
//! the codec. A serializer must be deterministic and must stay within the
//! segment's maximum event size, which is enforced at submission time.
//!
//! Two ready-made codecs are provided: [`JsonSerializer`] for any
//! serde-serializable type, and [`BytesSerializer`] for raw payloads.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Symmetric value codec supplied by the caller.
///
/// `deserialize(serialize(v))` must reproduce `v`; the client never alters
/// payload bytes between append and read.
pub trait Serializer: Send + Sync {
    type Value;

    fn serialize(&self, value: &Self::Value) -> Result<Bytes>;

    fn deserialize(&self, bytes: Bytes) -> Result<Self::Value>;
}

/// JSON codec for any serde-serializable value type.
#[derive(Debug)]
pub struct JsonSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Serializer for JsonSerializer<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Value = T;

    fn serialize(&self, value: &T) -> Result<Bytes> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: Bytes) -> Result<T> {
        serde_json::from_slice(&bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Identity codec for callers that already hold raw bytes.
#[derive(Debug, Default)]
pub struct BytesSerializer;

impl Serializer for BytesSerializer {
    type Value = Bytes;

    fn serialize(&self, value: &Bytes) -> Result<Bytes> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: Bytes) -> Result<Bytes> {
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // JsonSerializer
    // ---------------------------------------------------------------

    #[test]
    fn test_json_roundtrip_string() {
        let codec = JsonSerializer::<String>::new();
        let bytes = codec.serialize(&"hello".to_string()).expect("serialize");
        let back = codec.deserialize(bytes).expect("deserialize");
        assert_eq!(back, "hello");
    }

    #[test]
    fn test_json_roundtrip_struct() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Entry {
            key: String,
            count: u64,
        }

        let codec = JsonSerializer::<Entry>::new();
        let entry = Entry {
            key: "members".to_string(),
            count: 3,
        };
        let bytes = codec.serialize(&entry).expect("serialize");
        let back = codec.deserialize(bytes).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn test_json_deterministic() {
        let codec = JsonSerializer::<String>::new();
        let a = codec.serialize(&"same".to_string()).expect("serialize");
        let b = codec.serialize(&"same".to_string()).expect("serialize");
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_deserialize_garbage_fails() {
        let codec = JsonSerializer::<String>::new();
        let err = codec
            .deserialize(Bytes::from_static(b"not json"))
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    // ---------------------------------------------------------------
    // BytesSerializer
    // ---------------------------------------------------------------

    #[test]
    fn test_bytes_identity() {
        let codec = BytesSerializer;
        let payload = Bytes::from_static(&[0u8, 1, 2, 255]);
        let bytes = codec.serialize(&payload).expect("serialize");
        assert_eq!(bytes, payload);
        let back = codec.deserialize(bytes).expect("deserialize");
        assert_eq!(back, payload);
    }

    #[test]
    fn test_bytes_empty() {
        let codec = BytesSerializer;
        let bytes = codec.serialize(&Bytes::new()).expect("serialize");
        assert!(bytes.is_empty());
    }
}
