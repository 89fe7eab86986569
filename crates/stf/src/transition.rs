//! Transition rules for each tx variant.
//!
//! These are pure functions over the pre-states of the leaves a tx touches.
//! They never see the tree, so the same rules back both the executor and the
//! disputer's replay.

use opru_decimal::{Amount, CompactDecimal};
use opru_state_types::{
    AccountState, BlsSignature, BurnExecution, Create2Transfer, MassMigration, SignedTx,
    StateError, TokenType, Transfer, Tx, WithdrawalLeaf,
};
use tracing::debug;

use crate::{
    context::TransitionContext,
    errors::{TxError, TxResult},
};

/// Effects of a valid tx on the leaves it touches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    /// New sender leaf.
    pub sender: AccountState,

    /// New receiver leaf, for txs crediting a different leaf.
    pub receiver: Option<AccountState>,

    /// Funds leaving the tree through a mass migration.
    pub withdrawal: Option<WithdrawalLeaf>,

    /// Fee paid by the sender, in the sender's token.
    pub fee: Amount,

    /// Amount destroyed by a burn execution.
    pub burned: Amount,
}

/// Sender half of a tx that moves funds: the debited sender leaf and the
/// value taken from it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SenderDebit {
    pub sender: AccountState,
    pub amount: Amount,
    pub fee: Amount,
}

impl SenderDebit {
    pub(crate) fn into_transition(self, receiver: Option<AccountState>) -> Transition {
        Transition {
            sender: self.sender,
            receiver,
            withdrawal: None,
            fee: self.fee,
            burned: Amount::ZERO,
        }
    }
}

/// Applies any tx to its pre-states.
///
/// `receiver` is the current leaf at the tx's receiving index, `None` if the
/// slot is empty or the tx doesn't have a receiver.
pub fn apply_tx(
    ctx: &TransitionContext<'_>,
    signed: &SignedTx,
    sender: &AccountState,
    receiver: Option<&AccountState>,
) -> TxResult<Transition> {
    let sig = signed.signature.as_ref();
    let res = match &signed.tx {
        Tx::Transfer(tx) => apply_transfer(ctx, tx, sig, sender, receiver),
        Tx::MassMigration(tx) => apply_mass_migration(ctx, tx, sig, sender),
        Tx::Create2Transfer(tx) => apply_create2_transfer(ctx, tx, sig, sender, receiver),
        Tx::BurnExecution(tx) => apply_burn_execution(ctx, tx, sender),
    };

    if let Err(e) = &res {
        debug!(ty = ?signed.tx.ty(), from = %signed.tx.from_index(), %e, "rejected tx");
    }

    res
}

/// Moves `amount` from sender to receiver, charging `fee`.
///
/// A transfer to the sender's own index only costs the fee.
pub fn apply_transfer(
    ctx: &TransitionContext<'_>,
    tx: &Transfer,
    sig: Option<&BlsSignature>,
    sender: &AccountState,
    receiver: Option<&AccountState>,
) -> TxResult<Transition> {
    let wrapped = Tx::Transfer(*tx);
    let debit = debit_sender(ctx, &wrapped, sig, sender)?;

    if tx.from_index == tx.to_index {
        let token = debit.sender.token_type();
        let sender = credit(&debit.sender, token, debit.amount)?;
        return Ok(SenderDebit { sender, ..debit }.into_transition(None));
    }

    let receiver = credit_receiver(&wrapped, &debit, receiver)?;
    Ok(debit.into_transition(Some(receiver)))
}

/// Takes `amount` out of the tree towards a spoke, charging `fee`.
pub fn apply_mass_migration(
    ctx: &TransitionContext<'_>,
    tx: &MassMigration,
    sig: Option<&BlsSignature>,
    sender: &AccountState,
) -> TxResult<Transition> {
    let debit = debit_sender(ctx, &Tx::MassMigration(*tx), sig, sender)?;

    let withdrawal = WithdrawalLeaf {
        pubkey_index: debit.sender.pubkey_index(),
        token_type: debit.sender.token_type(),
        balance: debit.amount,
        spoke_id: tx.spoke_id,
    };

    let mut transition = debit.into_transition(None);
    transition.withdrawal = Some(withdrawal);
    Ok(transition)
}

/// Moves `amount` into a fresh leaf created in the empty receiver slot.
pub fn apply_create2_transfer(
    ctx: &TransitionContext<'_>,
    tx: &Create2Transfer,
    sig: Option<&BlsSignature>,
    sender: &AccountState,
    receiver: Option<&AccountState>,
) -> TxResult<Transition> {
    let wrapped = Tx::Create2Transfer(*tx);
    let debit = debit_sender(ctx, &wrapped, sig, sender)?;

    if tx.from_index == tx.to_index {
        return Err(TxError::ReceiverExists);
    }

    let receiver = credit_receiver(&wrapped, &debit, receiver)?;
    Ok(debit.into_transition(Some(receiver)))
}

/// Debits the account's burn amount, at most once per period.  Burns aren't
/// signed and don't bump the nonce.
pub fn apply_burn_execution(
    ctx: &TransitionContext<'_>,
    _tx: &BurnExecution,
    sender: &AccountState,
) -> TxResult<Transition> {
    let period = ctx.current_period();
    if sender.last_burn() == period {
        return Err(TxError::AlreadyBurnedThisPeriod);
    }

    if sender.balance() < sender.burn() {
        return Err(TxError::NotEnoughBalance);
    }

    let mut sender = *sender;
    let burned = sender.burn();
    sender
        .take_balance(burned)
        .map_err(|_| TxError::NotEnoughBalance)?;
    sender.set_last_burn(period);
    ensure_encodable(&sender)?;

    Ok(Transition {
        sender,
        receiver: None,
        withdrawal: None,
        fee: Amount::ZERO,
        burned,
    })
}

/// Runs the sender-side checks of a funds-moving tx and debits `amount +
/// fee`, bumping the nonce.
///
/// Checks, in order: zero amount, canonical encodings, registered token,
/// signature, balance.  Burn executions have no amount and fail with
/// [`TxError::InvalidTokenAmount`].
pub fn debit_sender(
    ctx: &TransitionContext<'_>,
    tx: &Tx,
    sig: Option<&BlsSignature>,
    sender: &AccountState,
) -> TxResult<SenderDebit> {
    let Some((amount, fee)) = tx.amount_and_fee() else {
        return Err(TxError::InvalidTokenAmount);
    };
    let (amount, fee) = decode_amounts(amount, fee)?;

    if !ctx.tokens().token_exists(sender.token_type()) {
        return Err(TxError::InvalidTokenType);
    }

    check_signature(ctx, tx, sig, sender)?;

    let total = amount
        .checked_add(fee)
        .ok_or(TxError::NotEnoughBalance)?;
    if sender.balance() < total {
        return Err(TxError::NotEnoughBalance);
    }

    let mut sender = *sender;
    sender.incr_nonce().ok_or(TxError::NonceOverflow)?;

    sender
        .take_balance(total)
        .map_err(|_| TxError::NotEnoughBalance)?;
    ensure_encodable(&sender)?;

    Ok(SenderDebit {
        sender,
        amount,
        fee,
    })
}

/// Credits the receiving leaf of a transfer or create2 transfer.
///
/// Transfers need an existing receiver of the sender's token.  Create2
/// transfers need an empty slot and create the receiver there.  Other
/// variants have no receiver and fail with [`TxError::MissingAccount`].
pub fn credit_receiver(
    tx: &Tx,
    debit: &SenderDebit,
    receiver: Option<&AccountState>,
) -> TxResult<AccountState> {
    let token = debit.sender.token_type();
    match tx {
        Tx::Transfer(_) => {
            let receiver = receiver.ok_or(TxError::MissingAccount)?;
            credit(receiver, token, debit.amount)
        }

        Tx::Create2Transfer(t) => {
            if receiver.is_some() {
                return Err(TxError::ReceiverExists);
            }

            let fresh = AccountState::new_fresh(t.to_pubkey_index, token, Amount::ZERO);
            credit(&fresh, token, debit.amount)
        }

        Tx::MassMigration(_) | Tx::BurnExecution(_) => Err(TxError::MissingAccount),
    }
}

/// Credits a batch's collected fees of some token to the fee receiver.
pub fn credit_fees(
    receiver: &AccountState,
    token: TokenType,
    fees: Amount,
) -> TxResult<AccountState> {
    credit(receiver, token, fees)
}

fn credit(state: &AccountState, token: TokenType, amount: Amount) -> TxResult<AccountState> {
    let mut state = *state;
    state
        .add_balance(token, amount)
        .map_err(|e| match e {
            StateError::TokenMismatch(..) => TxError::BadFromTokenType,
            _ => TxError::BalanceNotEncodable,
        })?;
    ensure_encodable(&state)?;
    Ok(state)
}

fn decode_amounts(amount: CompactDecimal, fee: CompactDecimal) -> TxResult<(Amount, Amount)> {
    let amount_val = amount.decode();
    if amount_val == 0 {
        return Err(TxError::InvalidTokenAmount);
    }

    if !amount.is_canonical() || !fee.is_canonical() {
        return Err(TxError::AmountNotEncodable);
    }

    Ok((Amount::new(amount_val), Amount::new(fee.decode())))
}

fn check_signature(
    ctx: &TransitionContext<'_>,
    tx: &Tx,
    sig: Option<&BlsSignature>,
    sender: &AccountState,
) -> TxResult<()> {
    let sig = sig.ok_or(TxError::BadSignature)?;
    let pubkey = ctx
        .pubkeys()
        .pubkey(sender.pubkey_index())
        .ok_or(TxError::BadSignature)?;

    let msg = tx.signing_message(sender.nonce());
    let point = ctx.verifier().hash_to_point(ctx.domain(), &msg);
    if !ctx.verifier().verify_single(sig, &pubkey, &point) {
        return Err(TxError::BadSignature);
    }

    Ok(())
}

fn ensure_encodable(state: &AccountState) -> TxResult<()> {
    state
        .serialize()
        .map(|_| ())
        .map_err(|_| TxError::BalanceNotEncodable)
}
