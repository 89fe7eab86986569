use digest::{Digest, OutputSizeUser, consts::U32};
use opru_primitives::Hash;

/// Default hasher for all trees.
pub type Sha256Hasher = sha2::Sha256;

/// Generic merkle hashing trait.
pub trait MerkleHasher {
    /// Combines the left and right nodes to form a single node.  Order
    /// matters, `hash_node(a, b) != hash_node(b, a)`.
    fn hash_node(left: &Hash, right: &Hash) -> Hash;

    /// Hashes a serialized leaf record.
    fn hash_leaf(buf: &[u8]) -> Hash;

    /// The value of an empty leaf slot.
    fn zero_hash() -> Hash {
        Hash::zero()
    }
}

/// Generic impl over [`Digest`] impls with 32 byte outputs.
impl<D: Digest + OutputSizeUser<OutputSize = U32>> MerkleHasher for D {
    fn hash_node(left: &Hash, right: &Hash) -> Hash {
        let mut context = D::new();
        Digest::update(&mut context, left.as_slice());
        Digest::update(&mut context, right.as_slice());
        let out: [u8; 32] = context.finalize().into();
        Hash::from(out)
    }

    fn hash_leaf(buf: &[u8]) -> Hash {
        let out: [u8; 32] = D::digest(buf).into();
        Hash::from(out)
    }
}
