//! Rollup state transition rules and the batch fraud prover.
//!
//! - `transition`: per-tx rules, pure functions over leaf pre-states
//! - `disputer`: replays a submitted batch against Merkle witnesses to find
//!   the first invalid tx
//! - `executor`: applies batches to a full account tree, producing the
//!   witnesses the disputer consumes

pub mod context;
mod disputer;
pub mod errors;
mod executor;
mod state_tree;
pub mod transition;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

pub use context::TransitionContext;
pub use disputer::{
    DisputeOutcome, FeeReceiver, TxFailure, TxOutcome, TxProofs, compute_tx_root,
    compute_withdraw_root, judge_batch, process_batch, process_tx,
};
pub use errors::{DisputeError, DisputeResult, TxError, TxResult};
pub use executor::{BatchExecutor, ExecOutput};
pub use state_tree::{AccountTree, index_in_tree};
pub use transition::{SenderDebit, Transition};
