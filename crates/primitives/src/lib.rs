//! Core buffer and hashing primitives shared by the rollup verification crates.

#[macro_use]
mod macros;

mod buf;
pub mod hash;

pub use buf::{Buf32, Buf64, Buf128};
pub use hash::Hash;
