use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::HashError;

/// A git object identifier — the SHA-1 hash of an object's canonical
/// serialization, carried as raw digest bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// The null OID (all zeros).
    pub const NULL: Self = Self([0u8; 20]);

    /// The length of the raw digest in bytes.
    pub const RAW_LEN: usize = 20;

    /// The length of the hex representation.
    pub const HEX_LEN: usize = 40;

    /// Create an ObjectId from raw digest bytes (exactly 20).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != Self::RAW_LEN {
            return Err(HashError::InvalidHashLength {
                expected: Self::RAW_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create an ObjectId from a 40-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != Self::HEX_LEN {
            return Err(HashError::InvalidHexLength {
                expected: Self::HEX_LEN,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; 20];
        hex_decode(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the null (all-zeros) OID.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Get the hex string representation (lowercase).
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }

    /// Get the loose object path component: `"xx/yyyy..."`.
    pub fn loose_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

impl From<[u8; 20]> for ObjectId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn from_hex_roundtrip() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(oid.to_hex(), SAMPLE_HEX);
        let parsed: ObjectId = SAMPLE_HEX.parse().unwrap();
        assert_eq!(parsed, oid);
    }

    #[test]
    fn display_matches_hex() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(oid.to_string(), SAMPLE_HEX);
    }

    #[test]
    fn debug_shows_short_hash() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(format!("{:?}", oid), "ObjectId(da39a3ee)");
    }

    #[test]
    fn ordering() {
        let a = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let b = ObjectId::from_hex("0000000000000000000000000000000000000002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn hashmap_key() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        let mut map = HashMap::new();
        map.insert(oid, "value");
        assert_eq!(map.get(&oid), Some(&"value"));
    }

    #[test]
    fn null_oid() {
        assert!(ObjectId::NULL.is_null());
        assert!(!ObjectId::from_hex(SAMPLE_HEX).unwrap().is_null());
    }

    #[test]
    fn from_bytes_roundtrip() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        let reconstructed = ObjectId::from_bytes(oid.as_bytes()).unwrap();
        assert_eq!(oid, reconstructed);
    }

    #[test]
    fn from_bytes_wrong_length() {
        let err = ObjectId::from_bytes(&[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidHashLength {
                expected: 20,
                actual: 10
            }
        ));
    }

    #[test]
    fn invalid_hex_chars() {
        let err = ObjectId::from_hex("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").unwrap_err();
        assert!(matches!(err, HashError::InvalidHex { .. }));
    }

    #[test]
    fn invalid_hex_length() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert!(matches!(err, HashError::InvalidHexLength { .. }));
    }

    #[test]
    fn case_insensitive_hex_decode() {
        let lower = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        let upper = ObjectId::from_hex(&SAMPLE_HEX.to_uppercase()).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn loose_path() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(oid.loose_path(), format!("da/{}", &SAMPLE_HEX[2..]));
    }
}
