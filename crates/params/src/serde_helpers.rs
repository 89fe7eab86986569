//! Serde helper modules for params fields.

use opru_primitives::{Buf32, hash};
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize a signing domain.
///
/// Serializes as `0x`-prefixed hex.  Deserializes either 32 bytes of hex or,
/// for anything else, a human-readable tag that is SHA-256 hashed into the
/// domain.
pub(crate) mod serde_domain {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(v: &Buf32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(v.as_slice())))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Buf32, D::Error> {
        let s = String::deserialize(d)?;
        Ok(domain_from_str(&s))
    }
}

pub(crate) fn domain_from_str(s: &str) -> Buf32 {
    let hex_str = s.strip_prefix("0x").unwrap_or(s);
    match hex::decode(hex_str) {
        Ok(bytes) if bytes.len() == 32 => {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            Buf32::from(arr)
        }
        _ => hash::sha256(s.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_hex() {
        let raw = format!("0x{}", "ab".repeat(32));
        assert_eq!(domain_from_str(&raw), Buf32::from([0xab; 32]));
        assert_eq!(domain_from_str(&raw[2..]), Buf32::from([0xab; 32]));
    }

    #[test]
    fn test_domain_from_tag() {
        assert_eq!(
            domain_from_str("opru-signing-v1"),
            hash::sha256(b"opru-signing-v1")
        );
        // Short hex is a tag, not a domain.
        assert_eq!(domain_from_str("0xabcd"), hash::sha256(b"0xabcd"));
    }
}
