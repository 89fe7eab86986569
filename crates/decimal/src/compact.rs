//! Transaction amount words.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    codec::{DecimalCodec, EncodedDecimal},
    errors::EncodingResult,
};

/// A [`DecimalCodec::COMPACT`] encoding, held at exactly its wire width.
///
/// Every bit of the word is part of the compressed tx, so the value a tx
/// root commits to is the value that gets checked.  Non-canonical words are
/// representable and are rejected by the transition rules.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactDecimal(u16);

impl CompactDecimal {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Encodes a value exactly.
    pub fn encode(value: u128) -> EncodingResult<Self> {
        let enc = DecimalCodec::COMPACT.encode(value)?;
        // The compact codec is 16 bits wide.
        Ok(Self(enc.raw() as u16))
    }

    pub fn decode(&self) -> u128 {
        DecimalCodec::COMPACT.decode(self.encoded())
    }

    pub fn is_canonical(&self) -> bool {
        DecimalCodec::COMPACT.is_canonical(self.encoded())
    }

    pub fn encoded(&self) -> EncodedDecimal {
        EncodedDecimal::from(self.0)
    }

    pub const fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl From<u16> for CompactDecimal {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for CompactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
