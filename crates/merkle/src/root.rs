use opru_primitives::Hash;

use crate::{
    MAX_TREE_DEPTH,
    errors::{MerkleError, MerkleResult},
    hasher::MerkleHasher,
};

/// Roots of empty subtrees, indexed by height.  `zeros[0]` is the empty leaf
/// and `zeros[depth]` is the root of a fully empty tree.
pub fn zero_hashes<H: MerkleHasher>(depth: usize) -> Vec<Hash> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push(H::zero_hash());
    for level in 0..depth {
        let z = zeros[level];
        zeros.push(H::hash_node(&z, &z));
    }
    zeros
}

/// Computes the root of a list of leaves, padding with empty leaves up to the
/// next power of two.
///
/// A single leaf is its own root, and an empty list has the zero hash as root.
pub fn merkleize<H: MerkleHasher>(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return H::zero_hash();
    }

    let width = leaves.len().next_power_of_two();
    let mut level: Vec<Hash> = leaves.to_vec();
    level.resize(width, H::zero_hash());

    while level.len() > 1 {
        level = level
            .chunks_exact(2)
            .map(|pair| H::hash_node(&pair[0], &pair[1]))
            .collect();
    }

    level[0]
}

/// Computes the root of a tree of fixed `depth` whose first leaves are
/// `leaves` and the rest empty.
///
/// Agrees with a [`SparseMerkleTree`](crate::SparseMerkleTree) of that depth
/// with the same leaves set at indexes `0..leaves.len()`.
pub fn merkleize_at_depth<H: MerkleHasher>(depth: usize, leaves: &[Hash]) -> MerkleResult<Hash> {
    if depth > MAX_TREE_DEPTH {
        return Err(MerkleError::UnsupportedDepth(depth));
    }

    if let Some(last) = leaves.len().checked_sub(1) {
        let last = last as u64;
        if depth < MAX_TREE_DEPTH && last >> depth != 0 {
            return Err(MerkleError::IndexOutOfRange { index: last, depth });
        }
    }

    // Height of the subtree `merkleize` built, then zero siblings above it.
    let height = leaves.len().next_power_of_two().trailing_zeros() as usize;
    let zeros = zero_hashes::<H>(depth);
    let mut root = merkleize::<H>(leaves);
    for zero in &zeros[height..depth] {
        root = H::hash_node(&root, zero);
    }

    Ok(root)
}
