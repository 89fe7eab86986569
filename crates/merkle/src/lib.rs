//! Merkle proof verification and root maintenance for fixed-depth binary
//! trees.
//!
//! Leaves and nodes are 32-byte hashes.  The direction taken at each level of
//! a path comes from the bits of the leaf index, lowest bit first: a `0` bit
//! means the running node is the left child.

mod errors;
mod hasher;
mod proof;
mod root;
mod tree;

pub use errors::{MerkleError, MerkleResult};
pub use hasher::{MerkleHasher, Sha256Hasher};
pub use opru_primitives::Hash;
pub use proof::MerkleProof;
pub use root::{merkleize, merkleize_at_depth, zero_hashes};
pub use tree::SparseMerkleTree;

/// Largest supported tree depth, bounded by the width of leaf indexes.
pub const MAX_TREE_DEPTH: usize = 64;
