use crate::macros::internal::{impl_buf_core, impl_buf_fmt, impl_buf_serde};

/// A 32-byte buffer, used for hashes and tree roots.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Buf32(pub [u8; 32]);

impl_buf_core!(Buf32, 32);
impl_buf_fmt!(Buf32, 32);
impl_buf_serde!(Buf32, 32);

/// A 64-byte buffer, sized for a compressed G1 signature or a hashed message
/// point.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Buf64(pub [u8; 64]);

impl_buf_core!(Buf64, 64);
impl_buf_fmt!(Buf64, 64);
impl_buf_serde!(Buf64, 64);

/// A 128-byte buffer, sized for an uncompressed G2 public key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Buf128(pub [u8; 128]);

impl_buf_core!(Buf128, 128);
impl_buf_fmt!(Buf128, 128);
impl_buf_serde!(Buf128, 128);
