use opru_primitives::Hash;
use serde::{Deserialize, Serialize};

use crate::{
    MAX_TREE_DEPTH,
    errors::{MerkleError, MerkleResult},
    hasher::MerkleHasher,
};

/// Inclusion proof for a single leaf: its index and the sibling hashes from
/// the leaf level up to just below the root.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MerkleProof {
    index: u64,
    cohashes: Vec<Hash>,
}

impl MerkleProof {
    pub fn new(index: u64, cohashes: Vec<Hash>) -> Self {
        Self { index, cohashes }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn cohashes(&self) -> &[Hash] {
        &self.cohashes
    }

    pub fn cohashes_mut(&mut self) -> &mut [Hash] {
        &mut self.cohashes
    }

    /// Depth of the tree this proof claims to be from.
    pub fn depth(&self) -> usize {
        self.cohashes.len()
    }

    /// Hashes `leaf` up through the path, returning the root it implies.
    ///
    /// Since siblings don't change when a single leaf does, this also gives
    /// the new root after overwriting the proven leaf with `leaf`.
    pub fn compute_root<H: MerkleHasher>(&self, depth: usize, leaf: &Hash) -> MerkleResult<Hash> {
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleError::UnsupportedDepth(depth));
        }

        if self.cohashes.len() != depth {
            return Err(MerkleError::DepthMismatch(depth, self.cohashes.len()));
        }

        if depth < MAX_TREE_DEPTH && self.index >> depth != 0 {
            return Err(MerkleError::IndexOutOfRange {
                index: self.index,
                depth,
            });
        }

        let mut cur = *leaf;
        let mut idx = self.index;
        for sibling in &self.cohashes {
            cur = if idx & 1 == 0 {
                H::hash_node(&cur, sibling)
            } else {
                H::hash_node(sibling, &cur)
            };
            idx >>= 1;
        }

        Ok(cur)
    }

    /// Checks that `leaf` is at this proof's index under `root`.
    pub fn verify<H: MerkleHasher>(&self, depth: usize, root: &Hash, leaf: &Hash) -> bool {
        self.compute_root::<H>(depth, leaf)
            .is_ok_and(|computed| computed == *root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sha256Hasher;

    fn leaf(b: u8) -> Hash {
        Sha256Hasher::hash_leaf(&[b])
    }

    #[test]
    fn test_depth_two_by_hand() {
        let leaves = [leaf(0), leaf(1), leaf(2), leaf(3)];
        let n01 = Sha256Hasher::hash_node(&leaves[0], &leaves[1]);
        let n23 = Sha256Hasher::hash_node(&leaves[2], &leaves[3]);
        let root = Sha256Hasher::hash_node(&n01, &n23);

        let proof = MerkleProof::new(2, vec![leaves[3], n01]);
        assert!(proof.verify::<Sha256Hasher>(2, &root, &leaves[2]));
        assert!(!proof.verify::<Sha256Hasher>(2, &root, &leaves[3]));

        // Same siblings with the wrong direction bits.
        let swapped = MerkleProof::new(3, vec![leaves[3], n01]);
        assert!(!swapped.verify::<Sha256Hasher>(2, &root, &leaves[2]));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let proof = MerkleProof::new(0, vec![leaf(1)]);
        assert_eq!(
            proof.compute_root::<Sha256Hasher>(2, &leaf(0)),
            Err(MerkleError::DepthMismatch(2, 1))
        );
        assert!(!proof.verify::<Sha256Hasher>(2, &Hash::zero(), &leaf(0)));
    }

    #[test]
    fn test_rejects_index_out_of_range() {
        let proof = MerkleProof::new(4, vec![leaf(1), leaf(2)]);
        assert_eq!(
            proof.compute_root::<Sha256Hasher>(2, &leaf(0)),
            Err(MerkleError::IndexOutOfRange { index: 4, depth: 2 })
        );
    }
}
