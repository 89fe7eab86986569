use thiserror::Error;

pub type MerkleResult<T> = Result<T, MerkleError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum MerkleError {
    /// Proof path length doesn't match the tree depth.
    ///
    /// (expected, got)
    #[error("proof has {1} cohashes, tree depth is {0}")]
    DepthMismatch(usize, usize),

    #[error("leaf index {index} out of range for depth {depth}")]
    IndexOutOfRange { index: u64, depth: usize },

    #[error("unsupported tree depth {0}")]
    UnsupportedDepth(usize),
}
