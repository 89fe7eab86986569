use opru_decimal::{Amount, EncodingError};
use opru_merkle::MerkleError;
use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum StateError {
    #[error("encoding: {0}")]
    Encoding(#[from] EncodingError),

    #[error("merkle: {0}")]
    Merkle(#[from] MerkleError),

    /// (expected, got)
    #[error("expected {0} bytes, got {1}")]
    BadLength(usize, usize),

    #[error("unknown tx type {0}")]
    UnknownTxType(u8),

    #[error("truncated compressed tx at offset {0}")]
    TruncatedTx(usize),

    #[error("insufficient balance (have {have}, need {need})")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("balance overflow")]
    BalanceOverflow,

    /// (credited token, account token)
    #[error("token {0} can't be credited to token {1} account")]
    TokenMismatch(u32, u32),
}
