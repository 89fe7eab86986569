//! Fixed-width decimal floating point codec used for every monetary field.
//!
//! A value is stored as `exponent || mantissa` and represents
//! `mantissa * 10^exponent`.  Encodings are canonical: the exponent is always
//! as large as it can be, so two encodings are equal iff their values are.

mod amount;
mod codec;
mod compact;
mod errors;
mod units;

pub use amount::Amount;
pub use codec::{DecimalCodec, EncodedDecimal};
pub use compact::CompactDecimal;
pub use errors::{EncodingError, EncodingResult, UnitsError};
pub use units::{USD_DECIMALS, format_units, parse_units};
