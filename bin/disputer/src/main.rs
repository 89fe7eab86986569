//! Command line tool for checking rollup batches and their fraud proofs.
//!
//! Works from JSON fixtures: `apply` runs a batch over a set of accounts and
//! emits the witnesses a disputer needs, `dispute` replays such a batch and
//! reports whether fraud is proven.  `encode` and `decode` expose the
//! decimal codecs.

mod args;
mod caps;
mod cmd;
mod fixture;

use std::process;

use args::Args;
use opru_common::logging::{self, FileLoggingConfig, LoggerConfig};
use tracing::Level;

fn main() {
    let args: Args = argh::from_env();
    let inner = move || -> anyhow::Result<()> {
        init_logging(&args)?;
        let params = args.resolve_params()?;
        cmd::exec_subc(args.subc, &params)?;
        Ok(())
    };
    if let Err(e) = inner() {
        eprintln!("ERROR\n{e:?}");
        process::exit(1);
    }
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let mut config = LoggerConfig::new("opru-disputer".to_string())
        .with_default_level(level)
        .with_json_logging(args.log_json)
        .with_stderr(true);
    if let Some(dir) = &args.log_dir {
        config = config.with_file_logging(
            FileLoggingConfig::new(dir.clone(), "opru-disputer".to_string())
                .with_json_format(args.log_json),
        );
    }

    logging::init(config)?;
    Ok(())
}
