//! `nestling` - inspect and drive the analysis layer from a terminal.

#![allow(clippy::print_stdout, reason = "CLI tool outputs to stdout")]

use anyhow::Result;
use clap::{Parser, Subcommand};
use nestling_types::AnalysisKind;
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the secure store and config
    #[arg(long, global = true, env = "NESTLING_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/analysis_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Shows remaining hourly and daily cloud calls
    Quota,
    /// Runs one analysis over a JSON export of care records
    Analyze {
        /// sleep_pattern, feeding_pattern, growth_trend, daily_summary or comprehensive
        kind: AnalysisKind,
        /// JSON file with baby, sleep, feeding, activity and growth records
        #[arg(long, short)]
        input: PathBuf,
        /// Skip the cloud path entirely
        #[arg(long)]
        local_only: bool,
        /// Send identifiers, names and notes unmodified
        #[arg(long)]
        no_anonymize: bool,
    },
    /// Rotates to the next provisioned credential
    ResetCredential,
    /// Resets both quota windows
    ResetQuota,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    nestling_core::modules::logger::init_logging(&cli.log_level);

    let paths = commands::Paths::resolve(cli.data_dir, cli.config)?;
    match cli.command {
        Commands::Quota => commands::quota(&paths),
        Commands::Analyze { kind, input, local_only, no_anonymize } => {
            commands::analyze(&paths, kind, &input, local_only, !no_anonymize).await
        },
        Commands::ResetCredential => commands::reset_credential(&paths),
        Commands::ResetQuota => commands::reset_quota(&paths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "nestling",
            "--data-dir",
            "/tmp/n",
            "analyze",
            "growth-trend",
            "--input",
            "records.json",
            "--local-only",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/n")));
        match cli.command {
            Commands::Analyze { kind, input, local_only, no_anonymize } => {
                assert_eq!(kind, AnalysisKind::GrowthTrend);
                assert_eq!(input, PathBuf::from("records.json"));
                assert!(local_only);
                assert!(!no_anonymize);
            },
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["nestling", "analyze", "naps", "--input", "x.json"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["nestling", "quota", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Quota));
    }
}
