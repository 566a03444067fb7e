use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use vaultcheck_core::Mode;

#[derive(Parser)]
#[command(
    name = "vaultcheck",
    version,
    about = "Reconcile archived bag chains into expected post-migration dataset and file records"
)]
pub struct Cli {
    /// Log output format (stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rebuild expected records for every bag identifier in the given files
    LoadFromVault(LoadFromVaultArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LoadFromVaultArgs {
    /// YAML configuration file; VAULTCHECK_* environment variables take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Which expected records to rebuild
    #[arg(long, value_enum, default_value_t = ModeArg::Both)]
    pub mode: ModeArg,

    /// Identifiers reconciled concurrently (overrides the configured value)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Files with one bag UUID per line
    #[arg(required = true)]
    pub uuid_files: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Datasets,
    Files,
    Both,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Datasets => Mode::Datasets,
            ModeArg::Files => Mode::Files,
            ModeArg::Both => Mode::Both,
        }
    }
}
