use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{EncodingError, EncodingResult};

/// Raw encoded bits of a decimal, `exponent || mantissa`, right-aligned.
///
/// Carries no width information on its own; it's only meaningful together
/// with the [`DecimalCodec`] that produced it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedDecimal(u64);

impl EncodedDecimal {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u16> for EncodedDecimal {
    fn from(value: u16) -> Self {
        Self(value as u64)
    }
}

impl fmt::Display for EncodedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Parameters of a mantissa/exponent codec.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DecimalCodec {
    exponent_bits: u32,
    mantissa_bits: u32,
}

impl DecimalCodec {
    /// 2-byte codec for on-the-wire transaction amounts and fees.
    pub const COMPACT: Self = Self::new(4, 12);

    /// 6-byte codec for account leaf balances and human-facing values.
    pub const WIDE: Self = Self::new(4, 44);

    /// Constructs a codec.
    ///
    /// # Panics
    ///
    /// If the total width isn't a whole number of bytes up to 64 bits, or if
    /// the largest encodable value wouldn't fit in a `u128`.  In const context
    /// this is a compile error.
    pub const fn new(exponent_bits: u32, mantissa_bits: u32) -> Self {
        let width = exponent_bits + mantissa_bits;
        assert!(exponent_bits > 0 && mantissa_bits > 0, "decimal: empty field");
        assert!(width <= 64 && width % 8 == 0, "decimal: bad width");

        let mantissa_max = (1u128 << mantissa_bits) - 1;
        let exponent_max = (1u32 << exponent_bits) - 1;
        assert!(
            match 10u128.checked_pow(exponent_max) {
                Some(scale) => mantissa_max.checked_mul(scale).is_some(),
                None => false,
            },
            "decimal: decode range overflows u128"
        );

        Self {
            exponent_bits,
            mantissa_bits,
        }
    }

    pub const fn exponent_bits(&self) -> u32 {
        self.exponent_bits
    }

    pub const fn mantissa_bits(&self) -> u32 {
        self.mantissa_bits
    }

    pub const fn width_bits(&self) -> u32 {
        self.exponent_bits + self.mantissa_bits
    }

    pub const fn width_bytes(&self) -> usize {
        (self.width_bits() / 8) as usize
    }

    pub const fn mantissa_max(&self) -> u128 {
        (1u128 << self.mantissa_bits) - 1
    }

    pub const fn exponent_max(&self) -> u32 {
        (1u32 << self.exponent_bits) - 1
    }

    /// Largest value any encoding decodes to.
    pub const fn max_value(&self) -> u128 {
        self.mantissa_max() * 10u128.pow(self.exponent_max())
    }

    fn split(&self, enc: EncodedDecimal) -> (u32, u128) {
        let raw = enc.raw();
        let mantissa = (raw as u128) & self.mantissa_max();
        let exponent = ((raw >> self.mantissa_bits) as u32) & self.exponent_max();
        (exponent, mantissa)
    }

    fn join(&self, exponent: u32, mantissa: u128) -> EncodedDecimal {
        EncodedDecimal::new(((exponent as u64) << self.mantissa_bits) | mantissa as u64)
    }

    /// Decodes an encoding into its value.  Bits above the codec width are
    /// ignored, so this never fails.
    pub fn decode(&self, enc: EncodedDecimal) -> u128 {
        let (exponent, mantissa) = self.split(enc);
        mantissa * 10u128.pow(exponent)
    }

    /// Encodes a value exactly, failing if it can't be represented without
    /// losing digits.
    pub fn encode(&self, value: u128) -> EncodingResult<EncodedDecimal> {
        let mut mantissa = value;
        let mut exponent = 0;
        while exponent < self.exponent_max() && mantissa % 10 == 0 {
            mantissa /= 10;
            exponent += 1;
        }

        if mantissa > self.mantissa_max() {
            return Err(EncodingError::MantissaOverflow {
                value,
                mantissa,
                mantissa_max: self.mantissa_max(),
            });
        }

        Ok(self.join(exponent, mantissa))
    }

    /// Alias of [`Self::encode`], for call sites that want to be explicit
    /// about refusing lossy encodings.
    pub fn encode_exact(&self, value: u128) -> EncodingResult<EncodedDecimal> {
        self.encode(value)
    }

    /// Returns the largest representable value `<= value`.
    pub fn round(&self, value: u128) -> EncodingResult<u128> {
        let mut mantissa = value;
        let mut exponent = 0;
        while mantissa > self.mantissa_max() {
            if exponent == self.exponent_max() {
                return Err(EncodingError::OutOfRange(value));
            }
            mantissa /= 10;
            exponent += 1;
        }

        Ok(mantissa * 10u128.pow(exponent))
    }

    /// Encodes the largest representable value `<= value`, dropping the low
    /// digits that don't fit.
    pub fn encode_rounded(&self, value: u128) -> EncodingResult<EncodedDecimal> {
        self.encode(self.round(value)?)
    }

    /// Checks if an encoding is the canonical one for its value.
    pub fn is_canonical(&self, enc: EncodedDecimal) -> bool {
        if enc.raw() >> self.width_bits() != 0 {
            return false;
        }

        self.encode(self.decode(enc)) == Ok(enc)
    }

    /// Writes the low `width_bits` of an encoding as big-endian bytes.
    pub fn write_bytes(&self, enc: EncodedDecimal, out: &mut Vec<u8>) {
        let be = enc.raw().to_be_bytes();
        out.extend_from_slice(&be[be.len() - self.width_bytes()..]);
    }

    /// Returns the big-endian byte form of an encoding.
    pub fn to_bytes(&self, enc: EncodedDecimal) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width_bytes());
        self.write_bytes(enc, &mut out);
        out
    }

    /// Parses the big-endian byte form of an encoding.
    pub fn from_bytes(&self, buf: &[u8]) -> EncodingResult<EncodedDecimal> {
        if buf.len() != self.width_bytes() {
            return Err(EncodingError::BadLength(self.width_bytes(), buf.len()));
        }

        let raw = buf.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
        Ok(EncodedDecimal::new(raw))
    }
}
