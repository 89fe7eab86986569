//! Protocol parameters shared by the executor, the disputer and the CLI.

mod errors;
mod params;
mod serde_helpers;

pub use errors::{ParamsError, ParamsResult};
pub use params::{
    DEFAULT_MAX_TXS_PER_BATCH, DEFAULT_SIGNING_DOMAIN_TAG, DEFAULT_STATE_TREE_DEPTH,
    DEFAULT_WITHDRAW_TREE_DEPTH, MAX_TREE_DEPTH, ProtocolParams,
};
