use opru_decimal::Amount;
use opru_state_types::{BurnExecution, SignedTx, YearMonth};

use crate::{
    errors::TxError,
    test_utils::*,
    transition::{apply_burn_execution, apply_tx},
};

#[test]
fn test_burn_once_per_period() {
    let env = TestEnv::new();
    let march = env.ctx_at(period(2024, 3));
    let april = env.ctx_at(period(2024, 4));
    let tx = BurnExecution { from_index: 0 };
    let a = acct(0, 100).with_burn(Amount::new(10));

    let first = apply_burn_execution(&march, &tx, &a).unwrap();
    assert_eq!(first.sender.balance(), Amount::new(90));
    assert_eq!(first.sender.last_burn(), period(2024, 3));
    assert_eq!(first.burned, Amount::new(10));
    assert_eq!(first.sender.nonce(), 0);

    assert_eq!(
        apply_burn_execution(&march, &tx, &first.sender),
        Err(TxError::AlreadyBurnedThisPeriod)
    );

    let second = apply_burn_execution(&april, &tx, &first.sender).unwrap();
    assert_eq!(second.sender.balance(), Amount::new(80));
    assert_eq!(second.sender.last_burn(), period(2024, 4));
}

#[test]
fn test_burn_needs_balance() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let a = acct(0, 5).with_burn(Amount::new(10));

    let signed = SignedTx::new_unsigned(BurnExecution { from_index: 0 });
    assert_eq!(
        apply_tx(&ctx, &signed, &a, None),
        Err(TxError::NotEnoughBalance)
    );
}

#[test]
fn test_fresh_account_can_burn_zero() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let a = acct(0, 5);
    assert_eq!(a.last_burn(), YearMonth::NEVER);

    let t = apply_burn_execution(&ctx, &BurnExecution { from_index: 0 }, &a).unwrap();
    assert_eq!(t.sender.balance(), Amount::new(5));
    assert_eq!(t.burned, Amount::ZERO);
    assert_eq!(t.sender.last_burn(), period(2024, 3));
}
