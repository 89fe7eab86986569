use opru_decimal::Amount;
use opru_merkle::SparseMerkleTree;
use opru_state_types::{
    AccountState, BurnExecution, Create2Transfer, MassMigration, SignedTx, StateHasher, Transfer,
};

use crate::{
    disputer::{compute_withdraw_root, judge_batch, process_batch},
    errors::TxError,
    executor::BatchExecutor,
    test_utils::*,
};

/// A mixed batch over accounts 0, 1, 2 with a fee receiver at 10.  The last
/// tx overdraws and gets left out.
fn mixed_batch(env: &TestEnv) -> (BatchExecutor, Vec<SignedTx>) {
    let tree = make_tree(&[
        (0, acct(0, 100)),
        (1, acct(1, 0)),
        (2, acct(2, 50).with_burn(Amount::new(5))),
        (10, acct(3, 0)),
    ]);

    let txs = vec![
        env.sign(Transfer::new(0, 1, 30, 1).unwrap(), 0, 0),
        env.sign(Create2Transfer::new(0, 4, 5, 20, 1).unwrap(), 0, 1),
        env.sign(MassMigration::new(2, 10, 2, 1).unwrap(), 2, 0),
        SignedTx::new_unsigned(BurnExecution { from_index: 2 }),
        env.sign(Transfer::new(1, 1, 5, 1).unwrap(), 1, 0),
        env.sign(Transfer::new(1, 0, 1000, 0).unwrap(), 1, 1),
    ];

    (BatchExecutor::new(tree), txs)
}

#[test]
fn test_apply_batch_balances() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let (mut exec, txs) = mixed_batch(&env);

    let out = exec.apply_batch(&ctx, &txs, Some(10)).unwrap();
    assert_eq!(out.txs.len(), 5);
    assert_eq!(out.results.len(), 6);
    assert_eq!(out.results[5], Err(TxError::NotEnoughBalance));
    assert!(out.results[..5].iter().all(|r| r.is_ok()));

    let tree = exec.tree();
    let balance = |i| tree.get(i).map(AccountState::balance);
    assert_eq!(balance(0), Some(Amount::new(48)));
    assert_eq!(balance(1), Some(Amount::new(29)));
    assert_eq!(balance(2), Some(Amount::new(33)));
    assert_eq!(balance(4), Some(Amount::new(20)));
    assert_eq!(balance(10), Some(Amount::new(5)));
    assert_eq!(tree.get(4).map(AccountState::pubkey_index), Some(5));
    assert_eq!(out.post_root, tree.root());

    assert_eq!(out.withdrawals.len(), 1);
    assert_eq!(out.withdrawals[0].balance, Amount::new(10));
    assert_eq!(out.fees_collected.get(&TOKEN), Some(&Amount::new(5)));

    // Nothing created or destroyed beyond what left through the withdrawal
    // and the burn.
    let total: u128 = tree.accounts().map(|(_, st)| st.balance().get()).sum();
    assert_eq!(total + 10 + 5, 150);
}

#[test]
fn test_withdraw_root_spans_withdraw_tree() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let (mut exec, txs) = mixed_batch(&env);
    let out = exec.apply_batch(&ctx, &txs, Some(10)).unwrap();

    let depth = ctx.params().withdraw_tree_depth;
    let mut withdraw_tree = SparseMerkleTree::<StateHasher>::new(depth).unwrap();
    withdraw_tree
        .set_leaf(0, out.withdrawals[0].leaf_hash().unwrap())
        .unwrap();
    assert_eq!(out.withdraw_root, withdraw_tree.root());

    let deeper = compute_withdraw_root(depth + 1, &out.withdrawals).unwrap();
    assert_ne!(out.withdraw_root, deeper);
    assert!(compute_withdraw_root(0, &[out.withdrawals[0], out.withdrawals[0]]).is_err());
}

#[test]
fn test_executor_and_disputer_agree() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let (mut exec, txs) = mixed_batch(&env);
    let out = exec.apply_batch(&ctx, &txs, Some(10)).unwrap();

    let outcome = process_batch(
        &ctx,
        out.pre_root,
        &out.txs,
        &out.proofs,
        &out.tx_root,
        out.fee_receiver.as_ref(),
    )
    .unwrap();

    assert!(!outcome.fraud_proven);
    assert_eq!(outcome.halted_at(), None);
    assert_eq!(outcome.post_root, out.post_root);
    assert_eq!(outcome.tx_root, out.tx_root);
    assert_eq!(outcome.withdrawals, out.withdrawals);
    assert_eq!(outcome.withdraw_root, out.withdraw_root);
    assert_eq!(outcome.fees_collected, out.fees_collected);

    let judged = judge_batch(
        &ctx,
        out.pre_root,
        &out.txs,
        &out.proofs,
        &out.tx_root,
        out.fee_receiver.as_ref(),
        &out.post_root,
    )
    .unwrap();
    assert!(!judged.fraud_proven);
}

#[test]
fn test_fee_receiver_token_filters_txs() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let tree = make_tree(&[
        (0, acct(0, 100)),
        (1, acct(1, 0)),
        (10, AccountState::new_fresh(3, OTHER_TOKEN, Amount::ZERO)),
    ]);
    let mut exec = BatchExecutor::new(tree);

    let txs = [env.sign(Transfer::new(0, 1, 30, 1).unwrap(), 0, 0)];
    let out = exec.apply_batch(&ctx, &txs, Some(10)).unwrap();
    assert_eq!(out.results, vec![Err(TxError::BadFromTokenType)]);
    assert!(out.txs.is_empty());
    assert_eq!(out.post_root, out.pre_root);
}

#[test]
fn test_leaves_out_fees_the_receiver_cannot_hold() {
    let env = TestEnv::new();
    let ctx = env.ctx();

    // Largest wide mantissa with no trailing zero, so any increment is
    // unencodable.
    let full = (1u128 << 44) - 1;
    let tree = make_tree(&[(0, acct(0, 100)), (1, acct(1, 0)), (10, acct(3, full))]);
    let mut exec = BatchExecutor::new(tree);

    let txs = [
        env.sign(Transfer::new(0, 1, 30, 1).unwrap(), 0, 0),
        env.sign(Transfer::new(0, 1, 30, 0).unwrap(), 0, 0),
    ];
    let out = exec.apply_batch(&ctx, &txs, Some(10)).unwrap();
    assert_eq!(out.results, vec![Err(TxError::BalanceNotEncodable), Ok(())]);
    assert_eq!(out.txs.len(), 1);
    assert_eq!(exec.tree().get(10).map(AccountState::balance), Some(Amount::new(full)));

    let outcome = process_batch(
        &ctx,
        out.pre_root,
        &out.txs,
        &out.proofs,
        &out.tx_root,
        out.fee_receiver.as_ref(),
    )
    .unwrap();
    assert!(!outcome.fraud_proven);
    assert_eq!(outcome.post_root, out.post_root);
}

#[test]
fn test_batch_limit() {
    let mut params = test_params();
    params.max_txs_per_batch = 2;
    let env = TestEnv::with_params(params);
    let ctx = env.ctx();
    let tree = make_tree(&[(0, acct(0, 100)), (1, acct(1, 0))]);
    let mut exec = BatchExecutor::new(tree);

    let txs: Vec<_> = (0..3)
        .map(|nonce| env.sign(Transfer::new(0, 1, 1, 0).unwrap(), 0, nonce))
        .collect();
    let out = exec.apply_batch(&ctx, &txs, None).unwrap();
    assert_eq!(out.txs.len(), 2);
    assert_eq!(out.results.len(), 2);
    assert_eq!(exec.tree().get(1).map(AccountState::balance), Some(Amount::new(2)));
}
