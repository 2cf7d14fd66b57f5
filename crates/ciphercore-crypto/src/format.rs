//! Shared encoding utilities for persisted records.

use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Encode bytes as base64.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(data: &str) -> CryptoResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| CryptoError::InvalidParameter(format!("Invalid base64: {}", e)))
}

/// Serde adapter storing binary fields as base64 strings.
///
/// Works for `Vec<u8>` and fixed-size arrays; a length mismatch on a fixed
/// array is a deserialization error.
pub mod base64_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&super::base64_encode(value.as_ref()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: TryFrom<Vec<u8>>,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = super::base64_decode(&s).map_err(de::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes)
            .map_err(|_| de::Error::custom(format!("unexpected byte length {}", len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "base64_bytes")]
        blob: Vec<u8>,
        #[serde(with = "base64_bytes")]
        nonce: [u8; 12],
    }

    #[test]
    fn test_base64_roundtrip() {
        let original = [42u8; 32];
        let encoded = base64_encode(&original);
        let decoded = base64_decode(&encoded).unwrap();
        assert_eq!(original.as_slice(), decoded.as_slice());
    }

    #[test]
    fn test_base64_decode_invalid() {
        let result = base64_decode("not valid base64!!!");
        assert!(matches!(result, Err(CryptoError::InvalidParameter(_))));
    }

    #[test]
    fn test_serde_adapter_encodes_strings() {
        let sample = Sample {
            blob: vec![1, 2, 3],
            nonce: [7u8; 12],
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["blob"], "AQID");
        assert!(json["nonce"].is_string());
    }

    #[test]
    fn test_serde_adapter_rejects_wrong_array_length() {
        let json = format!(
            r#"{{"blob":"AQID","nonce":"{}"}}"#,
            base64_encode(&[0u8; 8])
        );
        let result: Result<Sample, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }
}
