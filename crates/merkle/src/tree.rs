//! Sparse fixed-depth tree, stored as one node map per level.

use std::{collections::HashMap, marker::PhantomData};

use opru_primitives::Hash;

use crate::{
    MAX_TREE_DEPTH,
    errors::{MerkleError, MerkleResult},
    hasher::MerkleHasher,
    proof::MerkleProof,
    root::zero_hashes,
};

/// Binary tree of a fixed depth where unset leaves hold the zero hash.
///
/// Only nodes on paths to non-empty leaves are stored.  Nodes are addressed by
/// `(level, index)`, level 0 being the leaves.
#[derive(Clone, Debug)]
pub struct SparseMerkleTree<H> {
    depth: usize,
    zeros: Vec<Hash>,
    levels: Vec<HashMap<u64, Hash>>,
    _pd: PhantomData<H>,
}

impl<H: MerkleHasher> SparseMerkleTree<H> {
    /// Creates an empty tree.
    pub fn new(depth: usize) -> MerkleResult<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(MerkleError::UnsupportedDepth(depth));
        }

        Ok(Self {
            depth,
            zeros: zero_hashes::<H>(depth),
            levels: vec![HashMap::new(); depth + 1],
            _pd: PhantomData,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn check_index(&self, index: u64) -> MerkleResult<()> {
        if self.depth < MAX_TREE_DEPTH && index >> self.depth != 0 {
            return Err(MerkleError::IndexOutOfRange {
                index,
                depth: self.depth,
            });
        }
        Ok(())
    }

    fn node(&self, level: usize, index: u64) -> Hash {
        self.levels[level]
            .get(&index)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    fn set_node(&mut self, level: usize, index: u64, hash: Hash) {
        if hash == self.zeros[level] {
            self.levels[level].remove(&index);
        } else {
            self.levels[level].insert(index, hash);
        }
    }

    /// Returns the leaf hash at an index, the zero hash if unset.
    pub fn leaf(&self, index: u64) -> MerkleResult<Hash> {
        self.check_index(index)?;
        Ok(self.node(0, index))
    }

    /// Overwrites a leaf and recomputes the path above it.
    pub fn set_leaf(&mut self, index: u64, leaf: Hash) -> MerkleResult<()> {
        self.check_index(index)?;

        let mut cur = leaf;
        let mut idx = index;
        self.set_node(0, idx, cur);
        for level in 0..self.depth {
            let sibling = self.node(level, idx ^ 1);
            cur = if idx & 1 == 0 {
                H::hash_node(&cur, &sibling)
            } else {
                H::hash_node(&sibling, &cur)
            };
            idx >>= 1;
            self.set_node(level + 1, idx, cur);
        }

        Ok(())
    }

    pub fn root(&self) -> Hash {
        self.node(self.depth, 0)
    }

    /// Builds an inclusion proof for the leaf at an index.
    pub fn prove(&self, index: u64) -> MerkleResult<MerkleProof> {
        self.check_index(index)?;

        let mut idx = index;
        let mut cohashes = Vec::with_capacity(self.depth);
        for level in 0..self.depth {
            cohashes.push(self.node(level, idx ^ 1));
            idx >>= 1;
        }

        Ok(MerkleProof::new(index, cohashes))
    }

    /// Number of non-empty leaves.
    pub fn num_leaves(&self) -> usize {
        self.levels[0].len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{Sha256Hasher, merkleize};

    type Tree = SparseMerkleTree<Sha256Hasher>;

    fn random_hash(rng: &mut impl Rng) -> Hash {
        Hash::from(rng.r#gen::<[u8; 32]>())
    }

    #[test]
    fn test_empty_tree_root_is_zero_subtree() {
        let tree = Tree::new(4).unwrap();
        assert_eq!(tree.root(), zero_hashes::<Sha256Hasher>(4)[4]);
        assert_eq!(tree.num_leaves(), 0);
    }

    #[test]
    fn test_rejects_bad_depth() {
        assert_eq!(Tree::new(0).unwrap_err(), MerkleError::UnsupportedDepth(0));
        assert_eq!(
            Tree::new(65).unwrap_err(),
            MerkleError::UnsupportedDepth(65)
        );
        assert!(Tree::new(64).is_ok());
    }

    #[test]
    fn test_matches_dense_merkleize() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let leaves: Vec<Hash> = (0..8).map(|_| random_hash(&mut rng)).collect();

        let mut tree = Tree::new(3).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            tree.set_leaf(i as u64, *l).unwrap();
        }

        assert_eq!(tree.root(), merkleize::<Sha256Hasher>(&leaves));
    }

    #[test]
    fn test_clearing_leaf_restores_empty_root() {
        let mut tree = Tree::new(8).unwrap();
        let empty = tree.root();
        tree.set_leaf(17, Hash::from([9; 32])).unwrap();
        assert_ne!(tree.root(), empty);
        tree.set_leaf(17, Hash::zero()).unwrap();
        assert_eq!(tree.root(), empty);
        assert_eq!(tree.num_leaves(), 0);
    }

    #[test]
    fn test_deep_tree_random_proofs() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut tree = Tree::new(32).unwrap();
        let mut set = Vec::new();
        for _ in 0..50 {
            let idx = rng.gen_range(0..(1u64 << 32));
            let leaf = random_hash(&mut rng);
            tree.set_leaf(idx, leaf).unwrap();
            set.push(idx);
        }

        let root = tree.root();
        for idx in set {
            let leaf = tree.leaf(idx).unwrap();
            let proof = tree.prove(idx).unwrap();
            assert!(proof.verify::<Sha256Hasher>(32, &root, &leaf));
        }
    }

    #[test]
    fn test_index_out_of_range() {
        let mut tree = Tree::new(4).unwrap();
        assert!(tree.set_leaf(16, Hash::zero()).is_err());
        assert!(tree.prove(16).is_err());
    }

    proptest! {
        #[test]
        fn prop_proof_roundtrip_and_tamper(
            entries in prop::collection::vec((0u64..256, any::<[u8; 32]>()), 1..24),
            pick in any::<prop::sample::Index>(),
            level in 0usize..8,
            bit in 0usize..256,
        ) {
            let mut tree = Tree::new(8).unwrap();
            for (idx, leaf) in &entries {
                tree.set_leaf(*idx, Hash::from(*leaf)).unwrap();
            }

            let root = tree.root();
            let idx = entries[pick.index(entries.len())].0;
            let leaf = tree.leaf(idx).unwrap();
            let proof = tree.prove(idx).unwrap();
            prop_assert!(proof.verify::<Sha256Hasher>(8, &root, &leaf));

            let mut tampered = proof.clone();
            let mut bytes: [u8; 32] = tampered.cohashes()[level].into();
            bytes[bit / 8] ^= 1 << (bit % 8);
            tampered.cohashes_mut()[level] = Hash::from(bytes);
            prop_assert!(!tampered.verify::<Sha256Hasher>(8, &root, &leaf));
        }

        #[test]
        fn prop_new_root_matches_tree_update(
            entries in prop::collection::vec((0u64..256, any::<[u8; 32]>()), 1..16),
            target in 0u64..256,
            new_leaf in any::<[u8; 32]>(),
        ) {
            let mut tree = Tree::new(8).unwrap();
            for (idx, leaf) in &entries {
                tree.set_leaf(*idx, Hash::from(*leaf)).unwrap();
            }

            let proof = tree.prove(target).unwrap();
            let new_leaf = Hash::from(new_leaf);
            let new_root = proof.compute_root::<Sha256Hasher>(8, &new_leaf).unwrap();
            prop_assert!(proof.verify::<Sha256Hasher>(8, &new_root, &new_leaf));

            tree.set_leaf(target, new_leaf).unwrap();
            prop_assert_eq!(tree.root(), new_root);
        }
    }
}
