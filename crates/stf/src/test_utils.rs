//! Shared fixtures for the transition and dispute tests.

use std::collections::BTreeSet;

use opru_decimal::Amount;
use opru_params::ProtocolParams;
use opru_primitives::{Buf32, Buf64, Buf128, hash};
use opru_state_types::{
    AccountState, BlsPubkey, BlsSignature, MessagePoint, PubkeyIndex, SignatureVerifier,
    SignedTx, StateIndex, TokenType, Tx, YearMonth,
};

use crate::{context::TransitionContext, state_tree::AccountTree};

/// Token most test accounts hold.
pub(crate) const TOKEN: TokenType = 1;

/// Another registered token.
pub(crate) const OTHER_TOKEN: TokenType = 2;

/// A token missing from the registry.
pub(crate) const UNREGISTERED_TOKEN: TokenType = 9;

pub(crate) const TEST_DEPTH: usize = 8;

/// Stand-in for BLS where a signature is a hash of the key and message.
#[derive(Debug, Default)]
pub(crate) struct MockVerifier;

impl SignatureVerifier for MockVerifier {
    fn hash_to_point(&self, domain: &Buf32, msg: &[u8]) -> MessagePoint {
        MessagePoint::new(widen(hash::sha256_concat([domain.as_slice(), msg])))
    }

    fn verify_single(&self, sig: &BlsSignature, pubkey: &BlsPubkey, msg: &MessagePoint) -> bool {
        *sig == mock_sign(pubkey, msg)
    }
}

fn widen(h: Buf32) -> Buf64 {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(h.as_slice());
    out[32..].copy_from_slice(h.as_slice());
    Buf64::from(out)
}

pub(crate) fn mock_sign(pubkey: &BlsPubkey, point: &MessagePoint) -> BlsSignature {
    let h = hash::sha256_concat([pubkey.inner().as_slice(), point.inner().as_slice()]);
    BlsSignature::new(widen(h))
}

pub(crate) fn mock_pubkey(index: PubkeyIndex) -> BlsPubkey {
    let mut buf = [0xaa; 128];
    buf[..4].copy_from_slice(&index.to_be_bytes());
    BlsPubkey::new(Buf128::from(buf))
}

pub(crate) fn test_params() -> ProtocolParams {
    ProtocolParams {
        state_tree_depth: TEST_DEPTH,
        withdraw_tree_depth: 4,
        signing_domain: Buf32::from([7; 32]),
        max_txs_per_batch: 16,
    }
}

pub(crate) fn period(year: u32, month: u32) -> YearMonth {
    YearMonth::new(year, month).expect("test: valid period")
}

/// Account of [`TOKEN`] with no burn schedule.
pub(crate) fn acct(pubkey_index: PubkeyIndex, balance: u128) -> AccountState {
    AccountState::new_fresh(pubkey_index, TOKEN, Amount::new(balance))
}

pub(crate) fn make_tree(accounts: &[(StateIndex, AccountState)]) -> AccountTree {
    AccountTree::from_accounts(TEST_DEPTH, accounts.iter().copied()).expect("test: build tree")
}

/// Capabilities backing a test context.
pub(crate) struct TestEnv {
    verifier: MockVerifier,
    pubkeys: Vec<BlsPubkey>,
    tokens: BTreeSet<TokenType>,
    params: ProtocolParams,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self {
            verifier: MockVerifier,
            pubkeys: (0..16).map(mock_pubkey).collect(),
            tokens: [TOKEN, OTHER_TOKEN].into_iter().collect(),
            params: test_params(),
        }
    }

    pub(crate) fn with_params(params: ProtocolParams) -> Self {
        Self {
            params,
            ..Self::new()
        }
    }

    /// Context in March 2024.
    pub(crate) fn ctx(&self) -> TransitionContext<'_> {
        self.ctx_at(period(2024, 3))
    }

    pub(crate) fn ctx_at(&self, current_period: YearMonth) -> TransitionContext<'_> {
        TransitionContext::new(
            &self.verifier,
            &self.pubkeys,
            &self.tokens,
            current_period,
            self.params.clone(),
        )
    }

    /// Signs a tx as the holder of a registered key, over the given nonce.
    pub(crate) fn sign(&self, tx: impl Into<Tx>, pubkey_index: PubkeyIndex, nonce: u32) -> SignedTx {
        let tx = tx.into();
        let msg = tx.signing_message(nonce);
        let point = self
            .verifier
            .hash_to_point(&self.params.signing_domain, &msg);
        SignedTx::new(tx, mock_sign(&mock_pubkey(pubkey_index), &point))
    }
}
