//! Command line interface.

use crate::config::LogFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Configure an IPVS virtual service and its backends through ipvsadm.
#[derive(Debug, Parser)]
#[command(name = "ipvs-proxy", version)]
pub struct Cli {
    /// Configuration file (defaults to the first of the standard search paths)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the ipvsadm commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Format of the dry-run plan
    #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
    pub output: PlanFormat,

    /// Skip listing the IPVS table after applying
    #[arg(long)]
    pub no_status: bool,

    /// Log level or filter directive, overrides the configuration file
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log format, overrides the configuration file
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Output format of a dry-run plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ipvs-proxy"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.no_status);
        assert_eq!(cli.output, PlanFormat::Text);
        assert!(cli.log_format.is_none());
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "ipvs-proxy",
            "-c",
            "/etc/lb.yaml",
            "--dry-run",
            "--output",
            "json",
            "--no-status",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/lb.yaml")));
        assert!(cli.dry_run);
        assert!(cli.no_status);
        assert_eq!(cli.output, PlanFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(Cli::try_parse_from(["ipvs-proxy", "--output", "yaml"]).is_err());
    }
}
