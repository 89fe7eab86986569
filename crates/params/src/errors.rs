use std::{io, path::PathBuf};

use thiserror::Error;

pub type ParamsResult<T> = Result<T, ParamsError>;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("don't know how to load params from {0:?}")]
    UnknownFormat(PathBuf),

    #[error("{name} of {depth} not in 1..={max}")]
    InvalidDepth {
        name: &'static str,
        depth: usize,
        max: usize,
    },

    #[error("max txs per batch must be nonzero")]
    ZeroBatchLimit,

    #[error("{max_txs} txs per batch can't fit a withdrawal tree of depth {depth}")]
    WithdrawTreeTooSmall { max_txs: usize, depth: usize },
}
