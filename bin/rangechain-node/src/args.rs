//! Command-line arguments for `rangechain-node`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rangechain-node", about = "rangechain state-core demo node")]
pub struct Args {
    /// Path to a TOML config file (spec.md §6). Missing file falls back to
    /// defaults; recognised keys are then overlaid from `RANGECHAIN_*`
    /// environment variables.
    #[arg(long, env = "RANGECHAIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the chain store and sync cursors persist to. A temporary,
    /// disk-backed store is used when omitted.
    #[arg(long, env = "RANGECHAIN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Exit immediately after the service graph starts, instead of running
    /// until interrupted. Used by the binary's own smoke test.
    #[arg(long)]
    pub once: bool,
}
