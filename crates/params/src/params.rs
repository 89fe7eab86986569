use std::{fs, path::Path};

use opru_primitives::Buf32;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ParamsError, ParamsResult},
    serde_helpers::{domain_from_str, serde_domain},
};

/// Default depth of the account tree.
pub const DEFAULT_STATE_TREE_DEPTH: usize = 32;

/// Default depth of a batch's withdrawal tree.
pub const DEFAULT_WITHDRAW_TREE_DEPTH: usize = 10;

/// Default cap on the number of txs in one batch.
pub const DEFAULT_MAX_TXS_PER_BATCH: usize = 1024;

/// Tag hashed into the default signing domain.
pub const DEFAULT_SIGNING_DOMAIN_TAG: &str = "opru-signing-v1";

/// Deepest tree the merkle code supports.
pub const MAX_TREE_DEPTH: usize = 64;

/// Parameters fixed for the lifetime of a rollup deployment.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Depth of the account tree.
    #[serde(default = "default_state_tree_depth")]
    pub state_tree_depth: usize,

    /// Depth of the per-batch withdrawal tree built from mass migrations.
    #[serde(default = "default_withdraw_tree_depth")]
    pub withdraw_tree_depth: usize,

    /// Domain separation tag that signatures are hashed to the curve under.
    #[serde(default = "default_signing_domain", with = "serde_domain")]
    pub signing_domain: Buf32,

    /// Largest batch a disputer will replay.
    #[serde(default = "default_max_txs_per_batch")]
    pub max_txs_per_batch: usize,
}

fn default_state_tree_depth() -> usize {
    DEFAULT_STATE_TREE_DEPTH
}

fn default_withdraw_tree_depth() -> usize {
    DEFAULT_WITHDRAW_TREE_DEPTH
}

fn default_signing_domain() -> Buf32 {
    domain_from_str(DEFAULT_SIGNING_DOMAIN_TAG)
}

fn default_max_txs_per_batch() -> usize {
    DEFAULT_MAX_TXS_PER_BATCH
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            state_tree_depth: DEFAULT_STATE_TREE_DEPTH,
            withdraw_tree_depth: DEFAULT_WITHDRAW_TREE_DEPTH,
            signing_domain: default_signing_domain(),
            max_txs_per_batch: DEFAULT_MAX_TXS_PER_BATCH,
        }
    }
}

impl ProtocolParams {
    /// Checks the params are usable.
    pub fn validate(&self) -> ParamsResult<()> {
        check_depth("state_tree_depth", self.state_tree_depth)?;
        check_depth("withdraw_tree_depth", self.withdraw_tree_depth)?;

        if self.max_txs_per_batch == 0 {
            return Err(ParamsError::ZeroBatchLimit);
        }

        // Every tx in a batch may be a mass migration.
        let capacity = 1u128 << self.withdraw_tree_depth;
        if self.max_txs_per_batch as u128 > capacity {
            return Err(ParamsError::WithdrawTreeTooSmall {
                max_txs: self.max_txs_per_batch,
                depth: self.withdraw_tree_depth,
            });
        }

        Ok(())
    }

    /// Parses and validates params from JSON.
    pub fn from_json_str(s: &str) -> ParamsResult<Self> {
        let params: Self = serde_json::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Parses and validates params from TOML.
    pub fn from_toml_str(s: &str) -> ParamsResult<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Loads params from a `.json` or `.toml` file.
    pub fn load(path: &Path) -> ParamsResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str());
        match ext {
            Some("json") => Self::from_json_str(&fs::read_to_string(path)?),
            Some("toml") => Self::from_toml_str(&fs::read_to_string(path)?),
            _ => Err(ParamsError::UnknownFormat(path.to_path_buf())),
        }
    }
}

fn check_depth(name: &'static str, depth: usize) -> ParamsResult<()> {
    if depth == 0 || depth > MAX_TREE_DEPTH {
        return Err(ParamsError::InvalidDepth {
            name,
            depth,
            max: MAX_TREE_DEPTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_validate() {
        let params = ProtocolParams::default();
        params.validate().unwrap();
        assert_eq!(params.state_tree_depth, 32);
        assert_eq!(params.max_txs_per_batch, 1024);
    }

    #[test]
    fn test_empty_configs_use_defaults() {
        assert_eq!(
            ProtocolParams::from_json_str("{}").unwrap(),
            ProtocolParams::default()
        );
        assert_eq!(
            ProtocolParams::from_toml_str("").unwrap(),
            ProtocolParams::default()
        );
    }

    #[test]
    fn test_toml_load() {
        let config = r#"
            state_tree_depth = 20
            withdraw_tree_depth = 8
            signing_domain = "testnet-signing"
            max_txs_per_batch = 32
        "#;
        let params = ProtocolParams::from_toml_str(config).unwrap();
        assert_eq!(params.state_tree_depth, 20);
        assert_eq!(params.withdraw_tree_depth, 8);
        assert_eq!(params.signing_domain, domain_from_str("testnet-signing"));
        assert_eq!(params.max_txs_per_batch, 32);
    }

    #[test]
    fn test_json_domain_roundtrips_as_hex() {
        let params = ProtocolParams::default();
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"signing_domain\":\"0x"));
        assert_eq!(ProtocolParams::from_json_str(&json).unwrap(), params);
    }

    #[test]
    fn test_validate_rejects() {
        let res = ProtocolParams::from_json_str(r#"{"state_tree_depth": 0}"#);
        assert!(matches!(
            res,
            Err(ParamsError::InvalidDepth {
                name: "state_tree_depth",
                ..
            })
        ));

        let res = ProtocolParams::from_json_str(r#"{"withdraw_tree_depth": 65}"#);
        assert!(matches!(res, Err(ParamsError::InvalidDepth { depth: 65, .. })));

        let res = ProtocolParams::from_json_str(r#"{"max_txs_per_batch": 0}"#);
        assert!(matches!(res, Err(ParamsError::ZeroBatchLimit)));

        let res = ProtocolParams::from_json_str(r#"{"max_txs_per_batch": 2048}"#);
        assert!(matches!(
            res,
            Err(ParamsError::WithdrawTreeTooSmall { depth: 10, .. })
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "state_tree_depth = 16").unwrap();
        let params = ProtocolParams::load(file.path()).unwrap();
        assert_eq!(params.state_tree_depth, 16);

        let other = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            ProtocolParams::load(other.path()),
            Err(ParamsError::UnknownFormat(_))
        ));
    }
}
