//! Inputs a transition needs besides the account states it touches.

use std::fmt;

use opru_params::ProtocolParams;
use opru_primitives::Buf32;
use opru_state_types::{PubkeyRegistry, SignatureVerifier, TokenRegistry, YearMonth};

/// Capabilities and environment shared by every transition in a batch.
pub struct TransitionContext<'c> {
    verifier: &'c dyn SignatureVerifier,
    pubkeys: &'c dyn PubkeyRegistry,
    tokens: &'c dyn TokenRegistry,
    current_period: YearMonth,
    params: ProtocolParams,
}

impl<'c> TransitionContext<'c> {
    pub fn new(
        verifier: &'c dyn SignatureVerifier,
        pubkeys: &'c dyn PubkeyRegistry,
        tokens: &'c dyn TokenRegistry,
        current_period: YearMonth,
        params: ProtocolParams,
    ) -> Self {
        Self {
            verifier,
            pubkeys,
            tokens,
            current_period,
            params,
        }
    }

    pub fn verifier(&self) -> &dyn SignatureVerifier {
        self.verifier
    }

    pub fn pubkeys(&self) -> &dyn PubkeyRegistry {
        self.pubkeys
    }

    pub fn tokens(&self) -> &dyn TokenRegistry {
        self.tokens
    }

    /// Period burns are being executed for.
    pub fn current_period(&self) -> YearMonth {
        self.current_period
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Domain tag signatures are checked under.
    pub fn domain(&self) -> &Buf32 {
        &self.params.signing_domain
    }

    pub fn state_tree_depth(&self) -> usize {
        self.params.state_tree_depth
    }
}

impl fmt::Debug for TransitionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionContext")
            .field("current_period", &self.current_period)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
