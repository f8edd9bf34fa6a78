//! Value Codec Module
//!
//! Byte encoding capability for storable values. The cache and the engine
//! only ever see bytes; decoding into a concrete type happens once, in the
//! record store, after a hit or a read.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StoreError};

/// A type that can be written to and read back from the store.
pub trait Codec: Sized {
    fn encode(&self) -> Result<Vec<u8>>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

impl Codec for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl Codec for String {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::BadValue(format!("invalid UTF-8: {e}")))
    }
}

// == JSON Wrapper ==
/// Stores any serde type as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize + DeserializeOwned> Codec for Json<T> {
    fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|e| StoreError::BadValue(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| StoreError::BadValue(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        visits: u32,
    }

    #[test]
    fn test_string_codec() {
        let bytes = "héllo".to_string().encode().unwrap();
        assert_eq!(String::decode(&bytes).unwrap(), "héllo");
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        assert!(matches!(
            String::decode(&[0xff, 0xfe]),
            Err(StoreError::BadValue(_))
        ));
    }

    #[test]
    fn test_json_codec() {
        let profile = Json(Profile {
            name: "ada".to_string(),
            visits: 3,
        });
        let bytes = profile.encode().unwrap();

        assert_eq!(bytes, br#"{"name":"ada","visits":3}"#);
        assert_eq!(Json::<Profile>::decode(&bytes).unwrap(), profile);
    }

    #[test]
    fn test_json_rejects_wrong_shape() {
        assert!(matches!(
            Json::<Profile>::decode(b"[1,2]"),
            Err(StoreError::BadValue(_))
        ));
    }
}
