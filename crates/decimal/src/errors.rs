use thiserror::Error;

pub type EncodingResult<T> = Result<T, EncodingError>;

/// Errors from encoding values into a [`DecimalCodec`](crate::DecimalCodec).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum EncodingError {
    /// After stripping as many trailing zeros as the exponent allows, the
    /// remaining mantissa still doesn't fit.
    #[error("value {value} needs mantissa {mantissa} but codec max is {mantissa_max}")]
    MantissaOverflow {
        value: u128,
        mantissa: u128,
        mantissa_max: u128,
    },

    /// Even dividing by the maximum power of ten leaves a mantissa too large.
    #[error("value {0} exceeds representable range")]
    OutOfRange(u128),

    /// Byte buffer of the wrong size for the codec width.
    ///
    /// (expected, got)
    #[error("expected {0} encoded bytes, got {1}")]
    BadLength(usize, usize),
}

/// Errors from converting human readable amount strings.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum UnitsError {
    #[error("empty amount string")]
    Empty,

    #[error("invalid character {0:?} in amount")]
    InvalidChar(char),

    #[error("too many fractional digits (max {0})")]
    TooPrecise(u32),

    #[error("amount overflows")]
    Overflow,
}
