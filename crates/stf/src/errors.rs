use opru_merkle::Hash;
use opru_state_types::{StateError, StateIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TxResult<T> = Result<T, TxError>;

/// Reasons a single transition is invalid.  A batch containing a tx that
/// fails with one of these is fraudulent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxError {
    #[error("amount is zero")]
    InvalidTokenAmount,

    #[error("amount or fee not canonically encoded")]
    AmountNotEncodable,

    #[error("token type not registered")]
    InvalidTokenType,

    #[error("bad signature")]
    BadSignature,

    #[error("not enough balance")]
    NotEnoughBalance,

    #[error("token type mismatch")]
    BadFromTokenType,

    #[error("already burned this period")]
    AlreadyBurnedThisPeriod,

    #[error("state index outside of the tree")]
    IndexMismatch,

    #[error("receiver slot already occupied")]
    ReceiverExists,

    #[error("resulting balance not encodable in a leaf")]
    BalanceNotEncodable,

    #[error("referenced account doesn't exist")]
    MissingAccount,

    #[error("nonce overflow")]
    NonceOverflow,
}

pub type DisputeResult<T> = Result<T, DisputeError>;

/// Reasons a dispute itself is malformed.  These say nothing about whether
/// the disputed batch is valid.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DisputeError {
    #[error("tx root mismatch (expected {expected:?}, computed {actual:?})")]
    TxRootMismatch { expected: Hash, actual: Hash },

    #[error("got {proofs} proof sets for {txs} txs")]
    ProofCountMismatch { txs: usize, proofs: usize },

    #[error("batch of {count} txs exceeds limit of {max}")]
    TooManyTxs { count: usize, max: usize },

    #[error("proof for index {0} doesn't match the current root")]
    InvalidProof(StateIndex),

    #[error("proof is for leaf {got}, expected {expected}")]
    ProofIndexMismatch { expected: StateIndex, got: u64 },

    #[error("missing receiver proof for index {0}")]
    MissingReceiverProof(StateIndex),

    #[error("state: {0}")]
    State(#[from] StateError),
}
