//! Rollup state and transaction type definitions.
//!
//! This covers the account leaf record and its byte layout, the transaction
//! variants and their compressed wire form, the messages signers commit to,
//! and the capability traits the transition logic consults for things it
//! doesn't own (signatures, public keys, the token registry).

mod account;
mod capabilities;
mod errors;
mod period;
mod proof;
mod tx;
mod withdrawal;

pub use account::{ACCOUNT_STATE_LEN, AccountState, StateHasher};
pub use capabilities::{
    BlsPubkey, BlsSignature, MessagePoint, PubkeyRegistry, SignatureVerifier, TokenRegistry,
};
pub use errors::{StateError, StateResult};
pub use period::YearMonth;
pub use proof::StateMerkleProof;
pub use tx::{
    BurnExecution, Create2Transfer, MassMigration, SignedTx, Transfer, Tx, TxType,
    decode_compressed_batch, encode_compressed_batch,
};
pub use withdrawal::{WITHDRAWAL_LEAF_LEN, WithdrawalLeaf};

/// Index of a leaf in the account tree.
pub type StateIndex = u32;

/// Index into the external public key registry.
pub type PubkeyIndex = u32;

/// Identifier of a token type in the external registry.
pub type TokenType = u32;

/// Identifier of a mass migration destination.
pub type SpokeId = u32;
