//! Optimistic batch execution over a full account tree.
//!
//! This is what a batch submitter runs.  Invalid txs are left out of the
//! batch, and the witnesses recorded for the included txs are exactly those
//! [`process_batch`](crate::process_batch) replays.

use std::collections::BTreeMap;

use opru_decimal::Amount;
use opru_merkle::Hash;
use opru_state_types::{
    SignedTx, StateIndex, StateMerkleProof, StateResult, TokenType, WithdrawalLeaf,
};
use tracing::{debug, info, warn};

use crate::{
    context::TransitionContext,
    disputer::{FeeReceiver, TxProofs, compute_tx_root, compute_withdraw_root},
    errors::{TxError, TxResult},
    state_tree::AccountTree,
    transition::{self, Transition},
};

/// Everything produced by executing a batch.
#[derive(Clone, Debug)]
pub struct ExecOutput {
    pub pre_root: Hash,
    pub post_root: Hash,
    pub tx_root: Hash,

    /// Txs included in the batch, in order.
    pub txs: Vec<SignedTx>,

    /// Witnesses for each included tx.
    pub proofs: Vec<TxProofs>,

    pub fee_receiver: Option<FeeReceiver>,
    pub withdrawals: Vec<WithdrawalLeaf>,
    pub withdraw_root: Hash,
    pub fees_collected: BTreeMap<TokenType, Amount>,

    /// Outcome of each input tx that was looked at.
    pub results: Vec<TxResult<()>>,
}

/// Applies batches to an owned account tree.
#[derive(Clone, Debug)]
pub struct BatchExecutor {
    tree: AccountTree,
}

impl BatchExecutor {
    pub fn new(tree: AccountTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &AccountTree {
        &self.tree
    }

    pub fn into_tree(self) -> AccountTree {
        self.tree
    }

    /// Executes txs in order, leaving out the invalid ones.
    ///
    /// Input past the batch size limit isn't looked at.  If `fee_receiver`
    /// is set and occupied, txs paying fees in a different token are left
    /// out and the collected fees are credited to it at the end.
    pub fn apply_batch(
        &mut self,
        ctx: &TransitionContext<'_>,
        txs: &[SignedTx],
        fee_receiver: Option<StateIndex>,
    ) -> StateResult<ExecOutput> {
        let pre_root = self.tree.root();

        let fee_receiver = fee_receiver.filter(|idx| {
            let present = self.tree.get(*idx).is_some();
            if !present {
                warn!(%idx, "fee receiver slot empty, not collecting fees");
            }
            present
        });
        let fee_pre_proof = match fee_receiver {
            Some(idx) => Some(self.tree.prove(idx)?),
            None => None,
        };

        let max = ctx.params().max_txs_per_batch;
        let mut included = Vec::new();
        let mut proofs = Vec::new();
        let mut withdrawals = Vec::new();
        let mut fees_collected = BTreeMap::<TokenType, Amount>::new();
        let mut results = Vec::new();

        for signed in txs {
            if included.len() >= max {
                debug!(%max, "batch full");
                break;
            }

            let applied = self.execute_tx(ctx, signed, fee_receiver, &fees_collected)?;
            let (tx_proofs, transition) = match applied {
                Ok(applied) => applied,
                Err(err) => {
                    debug!(from = %signed.tx.from_index(), %err, "leaving out tx");
                    results.push(Err(err));
                    continue;
                }
            };

            // Overflow was ruled out before applying.
            if !transition.fee.is_zero() {
                let entry = fees_collected
                    .entry(transition.sender.token_type())
                    .or_default();
                if let Some(total) = entry.checked_add(transition.fee) {
                    *entry = total;
                }
            }

            withdrawals.extend(transition.withdrawal);
            included.push(*signed);
            proofs.push(tx_proofs);
            results.push(Ok(()));
        }

        let fee_receiver = match fee_receiver.zip(fee_pre_proof) {
            Some((index, pre_proof)) => {
                Some(self.credit_fee_receiver(index, pre_proof, &fees_collected)?)
            }
            None => None,
        };

        let out = ExecOutput {
            pre_root,
            post_root: self.tree.root(),
            tx_root: compute_tx_root(&included),
            txs: included,
            proofs,
            fee_receiver,
            withdraw_root: compute_withdraw_root(ctx.params().withdraw_tree_depth, &withdrawals)?,
            withdrawals,
            fees_collected,
            results,
        };

        info!(
            txs = out.txs.len(),
            dropped = out.results.iter().filter(|r| r.is_err()).count(),
            post_root = ?out.post_root,
            "executed batch"
        );

        Ok(out)
    }

    /// Applies one tx if valid, returning its witnesses.  The tree is only
    /// written once the whole transition has succeeded.
    ///
    /// With a fee receiver, a tx is also left out if the fee credit at the
    /// end of the batch would fail with it included.
    fn execute_tx(
        &mut self,
        ctx: &TransitionContext<'_>,
        signed: &SignedTx,
        fee_receiver: Option<StateIndex>,
        fees_collected: &BTreeMap<TokenType, Amount>,
    ) -> StateResult<TxResult<(TxProofs, Transition)>> {
        let tx = &signed.tx;
        let from = tx.from_index();
        let to = tx.to_index().filter(|to| *to != from);

        if !self.tree.contains_index(from) || to.is_some_and(|to| !self.tree.contains_index(to)) {
            return Ok(Err(TxError::IndexMismatch));
        }

        let Some(sender) = self.tree.get(from).copied() else {
            return Ok(Err(TxError::MissingAccount));
        };
        let receiver = to.and_then(|to| self.tree.get(to).copied());

        let transition = match transition::apply_tx(ctx, signed, &sender, receiver.as_ref()) {
            Ok(t) => t,
            Err(err) => return Ok(Err(err)),
        };

        let token = transition.sender.token_type();
        let prev_fees = fees_collected.get(&token).copied().unwrap_or_default();
        let Some(fees) = prev_fees.checked_add(transition.fee) else {
            return Ok(Err(TxError::BalanceNotEncodable));
        };

        // Fee receiver leaf as it would be right after this tx.
        let fee_leaf = fee_receiver.and_then(|idx| {
            if idx == from {
                Some(transition.sender)
            } else if Some(idx) == to {
                transition.receiver
            } else {
                self.tree.get(idx).copied()
            }
        });

        if let Some(fee_leaf) = fee_leaf {
            let fee_token = fee_leaf.token_type();
            if tx.amount_and_fee().is_some() && fee_token != token {
                return Ok(Err(TxError::BadFromTokenType));
            }

            let due = if fee_token == token {
                fees
            } else {
                fees_collected.get(&fee_token).copied().unwrap_or_default()
            };
            if let Err(err) = transition::credit_fees(&fee_leaf, fee_token, due) {
                return Ok(Err(err));
            }
        }

        let sender_proof = self.tree.prove(from)?;
        self.tree.insert(from, transition.sender)?;

        let receiver_proof = match to {
            Some(to) => {
                let proof = self.tree.prove(to)?;
                if let Some(receiver) = transition.receiver {
                    self.tree.insert(to, receiver)?;
                }
                Some(proof)
            }
            None => None,
        };

        let proofs = TxProofs {
            sender: sender_proof,
            receiver: receiver_proof,
        };
        Ok(Ok((proofs, transition)))
    }

    fn credit_fee_receiver(
        &mut self,
        index: StateIndex,
        pre_proof: StateMerkleProof,
        fees_collected: &BTreeMap<TokenType, Amount>,
    ) -> StateResult<FeeReceiver> {
        let proof = self.tree.prove(index)?;

        if let Some(receiver) = proof.state() {
            let token = receiver.token_type();
            let fees = fees_collected.get(&token).copied().unwrap_or_default();
            // Every included tx was checked to keep this credit valid.
            match transition::credit_fees(receiver, token, fees) {
                Ok(receiver) => self.tree.insert(index, receiver)?,
                Err(err) => warn!(%index, %err, "couldn't credit fees"),
            }
        }

        Ok(FeeReceiver {
            index,
            pre_proof,
            proof,
        })
    }

    /// Builds the witnesses a disputer needs for a tx against the current
    /// tree, without applying it.  Works for invalid txs too, which is what
    /// fraud proofs are made of.
    pub fn witness(
        &mut self,
        ctx: &TransitionContext<'_>,
        signed: &SignedTx,
    ) -> StateResult<TxProofs> {
        let tx = &signed.tx;
        let from = tx.from_index();
        let sender_proof = self.tree.prove(from)?;

        let Some(to) = tx.to_index().filter(|to| *to != from) else {
            return Ok(TxProofs {
                sender: sender_proof,
                receiver: None,
            });
        };

        // The receiver is proven against the tree with the sender debited, if
        // the sender side goes through.
        let sender = self.tree.get(from).copied();
        let debit = sender.and_then(|st| {
            transition::debit_sender(ctx, tx, signed.signature.as_ref(), &st).ok()
        });

        let receiver_proof = match (sender, debit) {
            (Some(prev), Some(debit)) => {
                self.tree.insert(from, debit.sender)?;
                let proof = self.tree.prove(to);
                self.tree.insert(from, prev)?;
                proof?
            }
            _ => self.tree.prove(to)?,
        };

        Ok(TxProofs {
            sender: sender_proof,
            receiver: Some(receiver_proof),
        })
    }
}
