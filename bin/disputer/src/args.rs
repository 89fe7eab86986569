//! Command line arguments for the `opru-disputer` binary.

use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;
use opru_params::ProtocolParams;

/// Args.
#[derive(FromArgs)]
pub(crate) struct Args {
    #[argh(
        option,
        description = "protocol params file, .json or .toml (default built-in params)",
        short = 'p'
    )]
    pub(crate) params: Option<PathBuf>,

    #[argh(switch, description = "log at debug level", short = 'v')]
    pub(crate) verbose: bool,

    #[argh(switch, description = "log in JSON format")]
    pub(crate) log_json: bool,

    #[argh(option, description = "also write logs to files in this directory")]
    pub(crate) log_dir: Option<PathBuf>,

    #[argh(subcommand)]
    pub(crate) subc: Subcommand,
}

impl Args {
    /// Loads the params file if one was given, otherwise the defaults.
    pub(crate) fn resolve_params(&self) -> anyhow::Result<ProtocolParams> {
        match &self.params {
            Some(path) => ProtocolParams::load(path)
                .with_context(|| format!("loading params from {}", path.display())),
            None => Ok(ProtocolParams::default()),
        }
    }
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub(crate) enum Subcommand {
    Encode(SubcEncode),
    Decode(SubcDecode),
    Apply(SubcApply),
    Dispute(SubcDispute),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "encode",
    description = "encodes an amount with a decimal codec"
)]
pub(crate) struct SubcEncode {
    #[argh(positional, description = "amount, in base units unless --decimals is set")]
    pub(crate) value: String,

    #[argh(switch, description = "use the 6 byte balance codec instead of the 2 byte one")]
    pub(crate) wide: bool,

    #[argh(switch, description = "round down to the nearest representable value")]
    pub(crate) round: bool,

    #[argh(option, description = "parse the amount as a decimal with this many places")]
    pub(crate) decimals: Option<u32>,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "decode",
    description = "decodes a hex encoded decimal"
)]
pub(crate) struct SubcDecode {
    #[argh(positional, description = "big-endian encoding, hex with optional 0x prefix")]
    pub(crate) encoded: String,

    #[argh(switch, description = "use the 6 byte balance codec instead of the 2 byte one")]
    pub(crate) wide: bool,

    #[argh(option, description = "also format the value with this many decimal places")]
    pub(crate) decimals: Option<u32>,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "apply",
    description = "applies a batch to the accounts in a fixture and prints the result"
)]
pub(crate) struct SubcApply {
    #[argh(positional, description = "apply fixture path")]
    pub(crate) fixture: PathBuf,

    #[argh(
        option,
        description = "write a dispute fixture for the resulting batch here",
        short = 'o'
    )]
    pub(crate) output: Option<PathBuf>,

    #[argh(switch, description = "force overwrite of the output", short = 'f')]
    pub(crate) force: bool,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "dispute",
    description = "replays a batch from a dispute fixture and prints the outcome"
)]
pub(crate) struct SubcDispute {
    #[argh(positional, description = "dispute fixture path")]
    pub(crate) fixture: PathBuf,
}
