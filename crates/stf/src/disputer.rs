//! Fraud proof replay of a submitted batch.
//!
//! The disputer threads a root through the batch using the per-tx witnesses
//! supplied with the dispute.  Witnesses that don't match the current root
//! make the dispute itself invalid, while the first tx whose transition
//! fails proves the batch fraudulent.

use std::collections::BTreeMap;

use opru_decimal::Amount;
use opru_merkle::{Hash, merkleize, merkleize_at_depth};
use opru_state_types::{
    SignedTx, StateHasher, StateIndex, StateMerkleProof, StateResult, TokenType, WithdrawalLeaf,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    context::TransitionContext,
    errors::{DisputeError, DisputeResult, TxError},
    state_tree::index_in_tree,
    transition::{self, Transition},
};

/// Witnesses for the leaves a tx touches.
///
/// The receiver proof, needed for txs crediting a different leaf, is against
/// the root after the sender's leaf has been updated.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxProofs {
    pub sender: StateMerkleProof,
    #[serde(default)]
    pub receiver: Option<StateMerkleProof>,
}

/// Leaf credited with a batch's fees once every tx has been applied.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeeReceiver {
    pub index: StateIndex,

    /// Leaf against the batch's pre-state root.  Fixes the token fees must
    /// be paid in.
    pub pre_proof: StateMerkleProof,

    /// Leaf against the root after the last tx, which gets credited.
    pub proof: StateMerkleProof,
}

/// Result of replaying a single tx.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxOutcome {
    Valid {
        post_root: Hash,
        transition: Transition,
    },
    Invalid(TxError),
}

/// A tx, or the fee credit at index `txs.len()`, that failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxFailure {
    pub index: usize,
    pub error: TxError,
}

/// Result of replaying a batch.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DisputeOutcome {
    /// Root after the last valid tx, i.e. just before the failing one.
    pub post_root: Hash,

    /// Root over the batch's compressed txs.
    pub tx_root: Hash,

    /// Whether the submitted batch was shown to be wrong.
    pub fraud_proven: bool,

    pub failure: Option<TxFailure>,

    /// Withdrawals produced by the valid prefix of the batch.
    pub withdrawals: Vec<WithdrawalLeaf>,

    pub withdraw_root: Hash,

    pub fees_collected: BTreeMap<TokenType, Amount>,
}

impl DisputeOutcome {
    fn new(pre_root: Hash, tx_root: Hash) -> Self {
        Self {
            post_root: pre_root,
            tx_root,
            fraud_proven: false,
            failure: None,
            withdrawals: Vec::new(),
            withdraw_root: Hash::zero(),
            fees_collected: BTreeMap::new(),
        }
    }

    /// Index of the tx the replay halted at.
    pub fn halted_at(&self) -> Option<usize> {
        self.failure.map(|f| f.index)
    }

    fn halt(
        mut self,
        ctx: &TransitionContext<'_>,
        index: usize,
        error: TxError,
    ) -> StateResult<Self> {
        info!(%index, %error, root = ?self.post_root, "batch fraud proven");
        self.fraud_proven = true;
        self.failure = Some(TxFailure { index, error });
        self.finish(ctx)
    }

    fn finish(mut self, ctx: &TransitionContext<'_>) -> StateResult<Self> {
        let depth = ctx.params().withdraw_tree_depth;
        self.withdraw_root = compute_withdraw_root(depth, &self.withdrawals)?;
        Ok(self)
    }
}

/// Root over a batch's compressed txs, padded to a power of two.
pub fn compute_tx_root(txs: &[SignedTx]) -> Hash {
    let leaves = txs.iter().map(|s| s.tx.leaf_hash()).collect::<Vec<_>>();
    merkleize::<StateHasher>(&leaves)
}

/// Root of the withdraw tree of a batch: a tree of `depth` levels holding the
/// withdrawal leaves in order, the remaining slots empty.
pub fn compute_withdraw_root(depth: usize, withdrawals: &[WithdrawalLeaf]) -> StateResult<Hash> {
    let leaves = withdrawals
        .iter()
        .map(WithdrawalLeaf::leaf_hash)
        .collect::<StateResult<Vec<_>>>()?;
    Ok(merkleize_at_depth::<StateHasher>(depth, &leaves)?)
}

/// Replays a batch from `pre_root`, stopping at the first invalid tx.
///
/// A zero `expected_tx_root` skips the tx root check.
#[instrument(skip_all, fields(pre_root = ?pre_root, txs = batch.len()))]
pub fn process_batch(
    ctx: &TransitionContext<'_>,
    pre_root: Hash,
    batch: &[SignedTx],
    proofs: &[TxProofs],
    expected_tx_root: &Hash,
    fee_receiver: Option<&FeeReceiver>,
) -> DisputeResult<DisputeOutcome> {
    let max = ctx.params().max_txs_per_batch;
    if batch.len() > max {
        return Err(DisputeError::TooManyTxs {
            count: batch.len(),
            max,
        });
    }

    if proofs.len() != batch.len() {
        return Err(DisputeError::ProofCountMismatch {
            txs: batch.len(),
            proofs: proofs.len(),
        });
    }

    let tx_root = compute_tx_root(batch);
    if !expected_tx_root.is_zero() && *expected_tx_root != tx_root {
        warn!(expected = ?expected_tx_root, actual = ?tx_root, "tx root mismatch");
        return Err(DisputeError::TxRootMismatch {
            expected: *expected_tx_root,
            actual: tx_root,
        });
    }

    // Fees are paid in the fee receiver's token, taken from its proven
    // pre-state before anything can halt on it.
    let fee_token = match fee_receiver {
        Some(fr) => {
            check_proof(&fr.pre_proof, fr.index, ctx.state_tree_depth(), &pre_root)?;
            fr.pre_proof.state().map(|st| st.token_type())
        }
        None => None,
    };

    let mut out = DisputeOutcome::new(pre_root, tx_root);
    for (i, (signed, tx_proofs)) in batch.iter().zip(proofs).enumerate() {
        let (post_root, transition) = match process_tx(ctx, out.post_root, signed, tx_proofs)? {
            TxOutcome::Valid {
                post_root,
                transition,
            } => (post_root, transition),
            TxOutcome::Invalid(err) => return Ok(out.halt(ctx, i, err)?),
        };

        let token = transition.sender.token_type();
        if signed.tx.amount_and_fee().is_some() && fee_token.is_some_and(|ft| ft != token) {
            return Ok(out.halt(ctx, i, TxError::BadFromTokenType)?);
        }

        if !transition.fee.is_zero() {
            let entry = out.fees_collected.entry(token).or_default();
            let Some(total) = entry.checked_add(transition.fee) else {
                return Ok(out.halt(ctx, i, TxError::BalanceNotEncodable)?);
            };
            *entry = total;
        }

        debug!(%i, root = ?post_root, "applied tx");
        out.post_root = post_root;
        out.withdrawals.extend(transition.withdrawal);
    }

    if let Some(fr) = fee_receiver {
        check_proof(&fr.proof, fr.index, ctx.state_tree_depth(), &out.post_root)?;

        let Some(receiver) = fr.proof.state() else {
            return Ok(out.halt(ctx, batch.len(), TxError::MissingAccount)?);
        };

        let token = receiver.token_type();
        let fees = out.fees_collected.get(&token).copied().unwrap_or_default();
        match transition::credit_fees(receiver, token, fees) {
            Ok(receiver) => {
                out.post_root = fr
                    .proof
                    .compute_root_with(ctx.state_tree_depth(), Some(&receiver))?;
            }
            Err(err) => return Ok(out.halt(ctx, batch.len(), err)?),
        }
    }

    Ok(out.finish(ctx)?)
}

/// Replays a batch and compares the result to the root its submitter
/// claimed.  Fraud is proven if a tx fails or the roots differ.
pub fn judge_batch(
    ctx: &TransitionContext<'_>,
    pre_root: Hash,
    batch: &[SignedTx],
    proofs: &[TxProofs],
    expected_tx_root: &Hash,
    fee_receiver: Option<&FeeReceiver>,
    submitted_post_root: &Hash,
) -> DisputeResult<DisputeOutcome> {
    let mut out = process_batch(ctx, pre_root, batch, proofs, expected_tx_root, fee_receiver)?;
    if !out.fraud_proven && out.post_root != *submitted_post_root {
        info!(computed = ?out.post_root, submitted = ?submitted_post_root, "post root mismatch");
        out.fraud_proven = true;
    }
    Ok(out)
}

/// Replays a single tx against `root`.
pub fn process_tx(
    ctx: &TransitionContext<'_>,
    root: Hash,
    signed: &SignedTx,
    proofs: &TxProofs,
) -> DisputeResult<TxOutcome> {
    let depth = ctx.state_tree_depth();
    let tx = &signed.tx;
    let from = tx.from_index();
    let to = tx.to_index().filter(|to| *to != from);

    if !index_in_tree(from, depth) || to.is_some_and(|to| !index_in_tree(to, depth)) {
        return Ok(TxOutcome::Invalid(TxError::IndexMismatch));
    }

    check_proof(&proofs.sender, from, depth, &root)?;
    let Some(sender) = proofs.sender.state() else {
        return Ok(TxOutcome::Invalid(TxError::MissingAccount));
    };

    let Some(to) = to else {
        // Only the sender's leaf changes.
        return Ok(match transition::apply_tx(ctx, signed, sender, None) {
            Ok(transition) => TxOutcome::Valid {
                post_root: proofs
                    .sender
                    .compute_root_with(depth, Some(&transition.sender))?,
                transition,
            },
            Err(err) => TxOutcome::Invalid(err),
        });
    };

    let debit = match transition::debit_sender(ctx, tx, signed.signature.as_ref(), sender) {
        Ok(debit) => debit,
        Err(err) => return Ok(TxOutcome::Invalid(err)),
    };

    let mid_root = proofs
        .sender
        .compute_root_with(depth, Some(&debit.sender))?;
    let recv_proof = proofs
        .receiver
        .as_ref()
        .ok_or(DisputeError::MissingReceiverProof(to))?;
    check_proof(recv_proof, to, depth, &mid_root)?;

    Ok(
        match transition::credit_receiver(tx, &debit, recv_proof.state()) {
            Ok(receiver) => TxOutcome::Valid {
                post_root: recv_proof.compute_root_with(depth, Some(&receiver))?,
                transition: debit.into_transition(Some(receiver)),
            },
            Err(err) => TxOutcome::Invalid(err),
        },
    )
}

fn check_proof(
    proof: &StateMerkleProof,
    index: StateIndex,
    depth: usize,
    root: &Hash,
) -> DisputeResult<()> {
    if proof.index() != Some(index) {
        return Err(DisputeError::ProofIndexMismatch {
            expected: index,
            got: proof.proof().index(),
        });
    }

    if !proof.verify(depth, root) {
        return Err(DisputeError::InvalidProof(index));
    }

    Ok(())
}
