//! JSON fixture formats read and written by the tool.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use anyhow::Context;
use opru_decimal::Amount;
use opru_primitives::Hash;
use opru_state_types::{
    AccountState, BlsPubkey, PubkeyIndex, PubkeyRegistry, SignedTx, StateIndex, TokenType,
    TokenRegistry, WithdrawalLeaf, YearMonth,
};
use opru_stf::{FeeReceiver, TxError, TxProofs};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::caps::AnyPubkey;

/// Environment a batch is executed in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Env {
    /// Period burns are executed for, as `year * 100 + month`.
    pub(crate) period: YearMonth,

    /// Registered token types.
    pub(crate) tokens: BTreeSet<TokenType>,

    /// Registered keys.  Without this every index resolves to a key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) pubkeys: Option<BTreeMap<PubkeyIndex, BlsPubkey>>,
}

impl Env {
    pub(crate) fn pubkey_registry(&self) -> &dyn PubkeyRegistry {
        match &self.pubkeys {
            Some(keys) => keys,
            None => &AnyPubkey,
        }
    }

    pub(crate) fn token_registry(&self) -> &dyn TokenRegistry {
        &self.tokens
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct AccountEntry {
    pub(crate) index: StateIndex,
    pub(crate) state: AccountState,
}

/// Input to `apply`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ApplyFixture {
    pub(crate) env: Env,
    pub(crate) accounts: Vec<AccountEntry>,
    pub(crate) txs: Vec<SignedTx>,

    #[serde(default)]
    pub(crate) fee_receiver: Option<StateIndex>,
}

/// Input to `dispute`, as emitted by `apply`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct DisputeFixture {
    pub(crate) env: Env,
    pub(crate) pre_root: Hash,
    pub(crate) txs: Vec<SignedTx>,
    pub(crate) proofs: Vec<TxProofs>,

    /// Committed tx root.  Zero skips the check.
    #[serde(default)]
    pub(crate) tx_root: Hash,

    #[serde(default)]
    pub(crate) fee_receiver: Option<FeeReceiver>,

    /// Root the batch submitter claimed.  If set, a differing replayed root
    /// also proves fraud.
    #[serde(default)]
    pub(crate) submitted_post_root: Option<Hash>,
}

/// A tx `apply` left out of the batch.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Rejected {
    /// Position in the input.
    pub(crate) position: usize,
    pub(crate) from_index: StateIndex,
    pub(crate) error: TxError,
}

/// Output of `apply`.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct ApplyReport {
    pub(crate) pre_root: Hash,
    pub(crate) post_root: Hash,
    pub(crate) tx_root: Hash,
    pub(crate) included: usize,
    pub(crate) rejected: Vec<Rejected>,
    pub(crate) withdrawals: Vec<WithdrawalLeaf>,
    pub(crate) withdraw_root: Hash,
    pub(crate) fees_collected: BTreeMap<TokenType, Amount>,
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists, pass -f to overwrite", path.display());
    }

    let buf = serde_json::to_string_pretty(value)?;
    fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}
