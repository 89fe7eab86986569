//! Subcommand implementations.

use anyhow::Context;
use opru_decimal::{DecimalCodec, EncodedDecimal, format_units, parse_units};
use opru_params::ProtocolParams;
use opru_stf::{AccountTree, BatchExecutor, TransitionContext, judge_batch, process_batch};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    args::{SubcApply, SubcDecode, SubcDispute, SubcEncode, Subcommand},
    caps::{PreverifiedSignatures, fill_signatures},
    fixture::{
        ApplyFixture, ApplyReport, DisputeFixture, Env, Rejected, read_json, write_json,
    },
};

pub(crate) fn exec_subc(cmd: Subcommand, params: &ProtocolParams) -> anyhow::Result<()> {
    match cmd {
        Subcommand::Encode(subc) => exec_encode(subc),
        Subcommand::Decode(subc) => exec_decode(subc),
        Subcommand::Apply(subc) => exec_apply(subc, params),
        Subcommand::Dispute(subc) => exec_dispute(subc, params),
    }
}

fn codec(wide: bool) -> DecimalCodec {
    if wide {
        DecimalCodec::WIDE
    } else {
        DecimalCodec::COMPACT
    }
}

#[derive(Debug, Serialize)]
struct EncodedReport {
    value: String,
    encoded: String,
    canonical: bool,
}

fn encode_value(subc: &SubcEncode) -> anyhow::Result<EncodedReport> {
    let value = match subc.decimals {
        Some(decimals) => parse_units(&subc.value, decimals)?,
        None => subc
            .value
            .trim()
            .parse::<u128>()
            .with_context(|| format!("invalid amount {:?}", subc.value))?,
    };

    let codec = codec(subc.wide);
    let enc = if subc.round {
        codec.encode_rounded(value)?
    } else {
        codec.encode(value)?
    };

    let decoded = codec.decode(enc);
    if decoded != value {
        warn!(%value, %decoded, "rounded down");
    }

    Ok(EncodedReport {
        value: display_value(decoded, subc.decimals),
        encoded: format!("0x{}", hex::encode(codec.to_bytes(enc))),
        canonical: codec.is_canonical(enc),
    })
}

fn decode_value(subc: &SubcDecode) -> anyhow::Result<EncodedReport> {
    let hex_str = subc.encoded.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = hex::decode(hex_str).context("invalid hex")?;

    let codec = codec(subc.wide);
    let enc: EncodedDecimal = codec.from_bytes(&bytes)?;
    let canonical = codec.is_canonical(enc);
    if !canonical {
        warn!(%enc, "non-canonical encoding");
    }

    Ok(EncodedReport {
        value: display_value(codec.decode(enc), subc.decimals),
        encoded: format!("0x{hex_str}"),
        canonical,
    })
}

fn display_value(value: u128, decimals: Option<u32>) -> String {
    match decimals {
        Some(decimals) => format_units(value, decimals),
        None => value.to_string(),
    }
}

fn exec_encode(subc: SubcEncode) -> anyhow::Result<()> {
    print_json(&encode_value(&subc)?)
}

fn exec_decode(subc: SubcDecode) -> anyhow::Result<()> {
    print_json(&decode_value(&subc)?)
}

fn context<'e>(env: &'e Env, params: &ProtocolParams) -> TransitionContext<'e> {
    TransitionContext::new(
        &PreverifiedSignatures,
        env.pubkey_registry(),
        env.token_registry(),
        env.period,
        params.clone(),
    )
}

/// Runs an apply fixture, returning the report and a dispute fixture for the
/// batch that was built.
fn apply_fixture(
    mut fx: ApplyFixture,
    params: &ProtocolParams,
) -> anyhow::Result<(ApplyReport, DisputeFixture)> {
    let filled = fill_signatures(&mut fx.txs);
    if filled > 0 {
        info!(%filled, "treating unsigned txs as presigned");
    }

    let accounts = fx.accounts.iter().map(|a| (a.index, a.state));
    let tree = AccountTree::from_accounts(params.state_tree_depth, accounts)?;
    let mut exec = BatchExecutor::new(tree);

    let ctx = context(&fx.env, params);
    let out = exec.apply_batch(&ctx, &fx.txs, fx.fee_receiver)?;

    let rejected = out
        .results
        .iter()
        .zip(&fx.txs)
        .enumerate()
        .filter_map(|(position, (res, signed))| {
            res.err().map(|error| Rejected {
                position,
                from_index: signed.tx.from_index(),
                error,
            })
        })
        .collect::<Vec<_>>();

    info!(
        included = out.txs.len(),
        rejected = rejected.len(),
        post_root = ?out.post_root,
        "applied batch"
    );

    let report = ApplyReport {
        pre_root: out.pre_root,
        post_root: out.post_root,
        tx_root: out.tx_root,
        included: out.txs.len(),
        rejected,
        withdrawals: out.withdrawals,
        withdraw_root: out.withdraw_root,
        fees_collected: out.fees_collected,
    };

    let dispute = DisputeFixture {
        env: fx.env,
        pre_root: out.pre_root,
        txs: out.txs,
        proofs: out.proofs,
        tx_root: out.tx_root,
        fee_receiver: out.fee_receiver,
        submitted_post_root: Some(out.post_root),
    };

    Ok((report, dispute))
}

fn exec_apply(subc: SubcApply, params: &ProtocolParams) -> anyhow::Result<()> {
    let fx: ApplyFixture = read_json(&subc.fixture)?;
    let (report, dispute) = apply_fixture(fx, params)?;

    if let Some(path) = &subc.output {
        write_json(path, &dispute, subc.force)?;
    }

    print_json(&report)
}

fn exec_dispute(subc: SubcDispute, params: &ProtocolParams) -> anyhow::Result<()> {
    let mut fx: DisputeFixture = read_json(&subc.fixture)?;
    fill_signatures(&mut fx.txs);

    let ctx = context(&fx.env, params);
    let outcome = match &fx.submitted_post_root {
        Some(submitted) => judge_batch(
            &ctx,
            fx.pre_root,
            &fx.txs,
            &fx.proofs,
            &fx.tx_root,
            fx.fee_receiver.as_ref(),
            submitted,
        ),
        None => process_batch(
            &ctx,
            fx.pre_root,
            &fx.txs,
            &fx.proofs,
            &fx.tx_root,
            fx.fee_receiver.as_ref(),
        ),
    }
    .context("malformed dispute")?;

    if outcome.fraud_proven {
        info!(halted_at = ?outcome.halted_at(), "fraud proven");
    }

    print_json(&outcome)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProtocolParams {
        ProtocolParams {
            state_tree_depth: 8,
            withdraw_tree_depth: 4,
            max_txs_per_batch: 16,
            ..ProtocolParams::default()
        }
    }

    fn apply_fixture_json() -> ApplyFixture {
        let account = |pubkey: u32, balance: u32| {
            format!(
                r#"{{ "pubkey_index": {pubkey}, "token_type": 1, "balance": {balance},
                      "nonce": 0, "burn": 0, "last_burn": 0 }}"#
            )
        };
        let raw = format!(
            r#"{{
                "env": {{ "period": 202403, "tokens": [1] }},
                "accounts": [
                    {{ "index": 0, "state": {} }},
                    {{ "index": 1, "state": {} }}
                ],
                "txs": [
                    {{ "tx": {{ "type": "transfer", "from_index": 0, "to_index": 1,
                                "amount": 4099, "fee": 1 }} }},
                    {{ "tx": {{ "type": "transfer", "from_index": 1, "to_index": 0,
                                "amount": 999, "fee": 0 }} }}
                ]
            }}"#,
            account(0, 100),
            account(1, 0),
        );
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let subc = SubcEncode {
            value: "4095000".to_string(),
            wide: false,
            round: false,
            decimals: None,
        };
        let report = encode_value(&subc).unwrap();
        assert_eq!(report.encoded, "0x3fff");
        assert!(report.canonical);

        let subc = SubcDecode {
            encoded: "0x3fff".to_string(),
            wide: false,
            decimals: Some(6),
        };
        let report = decode_value(&subc).unwrap();
        assert_eq!(report.value, "4.095");
    }

    #[test]
    fn test_encode_units_and_rounding() {
        let subc = SubcEncode {
            value: "1.5".to_string(),
            wide: true,
            round: false,
            decimals: Some(6),
        };
        let report = encode_value(&subc).unwrap();
        assert_eq!(report.value, "1.5");
        assert_eq!(report.encoded.len(), 2 + 12);

        let inexact = SubcEncode {
            value: "4097".to_string(),
            wide: false,
            round: false,
            decimals: None,
        };
        assert!(encode_value(&inexact).is_err());

        let rounded = SubcEncode {
            round: true,
            ..inexact
        };
        assert_eq!(encode_value(&rounded).unwrap().value, "4090");
    }

    #[test]
    fn test_decode_non_canonical() {
        // mantissa 10, exponent 0: canonical form is mantissa 1, exponent 1
        let subc = SubcDecode {
            encoded: "000a".to_string(),
            wide: false,
            decimals: None,
        };
        let report = decode_value(&subc).unwrap();
        assert_eq!(report.value, "10");
        assert!(!report.canonical);

        let short = SubcDecode {
            encoded: "0a".to_string(),
            wide: false,
            decimals: None,
        };
        assert!(decode_value(&short).is_err());
    }

    #[test]
    fn test_apply_then_dispute() {
        let params = params();
        let (report, dispute) = apply_fixture(apply_fixture_json(), &params).unwrap();

        // The second tx overdraws and is left out.
        assert_eq!(report.included, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].position, 1);
        assert_ne!(report.pre_root, report.post_root);

        // Round trip through JSON the way the files would.
        let raw = serde_json::to_string(&dispute).unwrap();
        let dispute: DisputeFixture = serde_json::from_str(&raw).unwrap();

        let ctx = context(&dispute.env, &params);
        let outcome = judge_batch(
            &ctx,
            dispute.pre_root,
            &dispute.txs,
            &dispute.proofs,
            &dispute.tx_root,
            dispute.fee_receiver.as_ref(),
            &report.post_root,
        )
        .unwrap();
        assert!(!outcome.fraud_proven);
        assert_eq!(outcome.post_root, report.post_root);
    }

    #[test]
    fn test_dispute_catches_wrong_root() {
        let params = params();
        let (_, dispute) = apply_fixture(apply_fixture_json(), &params).unwrap();

        let ctx = context(&dispute.env, &params);
        let outcome = judge_batch(
            &ctx,
            dispute.pre_root,
            &dispute.txs,
            &dispute.proofs,
            &dispute.tx_root,
            dispute.fee_receiver.as_ref(),
            &dispute.pre_root,
        )
        .unwrap();
        assert!(outcome.fraud_proven);
        assert_eq!(outcome.halted_at(), None);
    }
}
