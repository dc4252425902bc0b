//! Argument parsing and command dispatch for the `trellis` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use trellis_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};

use crate::commands;
use crate::context::{CliResult, EXIT_FAILURE};

/// Parses CLI arguments, installs logging, and executes the requested
/// command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
    };
    if let Err(error) = init_logging(&logging) {
        eprintln!("error: {error:#}");
        return EXIT_FAILURE;
    }

    match dispatch(cli).await {
        Ok(exit_code) => exit_code,
        Err(error) => {
            eprintln!("error: {error:#}");
            EXIT_FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<i32> {
    match cli.command {
        Command::Apply(args) => commands::apply::run(args).await,
        Command::Plan(args) => commands::plan::run(args).await,
        Command::Validate(args) => commands::validate::run(&args),
    }
}

#[derive(Parser)]
#[command(name = "trellis", about = "Materialize workspaces by bulk copying and linking")]
struct Cli {
    /// Log filter directive applied when `RUST_LOG` is unset.
    #[arg(
        long,
        global = true,
        env = "TRELLIS_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,
    /// Log output format (`pretty` or `json`); inferred when omitted.
    #[arg(
        long,
        global = true,
        env = "TRELLIS_LOG_FORMAT",
        value_parser = parse_log_format
    )]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the workflow described by a profile.
    Apply(ApplyArgs),
    /// Build and print the deduplicated plan without executing it.
    Plan(PlanArgs),
    /// Parse and validate a profile.
    Validate(ValidateArgs),
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    /// Path to the workspace profile document.
    #[arg(long)]
    pub(crate) config: PathBuf,
    /// Directory a relative target resolves against; defaults to the
    /// current directory.
    #[arg(long)]
    pub(crate) workspace_root: Option<PathBuf>,
    /// Suppress prompts and fall back to the profile's configured defaults.
    #[arg(long)]
    pub(crate) silent: bool,
    /// Answer every confirmation affirmatively.
    #[arg(long)]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct PlanArgs {
    /// Path to the workspace profile document.
    #[arg(long)]
    pub(crate) config: PathBuf,
    /// Directory a relative target resolves against; defaults to the
    /// current directory.
    #[arg(long)]
    pub(crate) workspace_root: Option<PathBuf>,
    /// Rendering for the planned operations.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Args)]
pub(crate) struct ValidateArgs {
    /// Path to the workspace profile document.
    #[arg(long)]
    pub(crate) config: PathBuf,
}

/// Rendering selected for `trellis plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Aligned text table.
    Table,
    /// Pretty-printed JSON document.
    Json,
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    raw.parse().map_err(|error: anyhow::Error| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult<T = ()> = anyhow::Result<T>;

    #[test]
    fn parses_apply_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "trellis",
            "apply",
            "--config",
            "profile.json",
            "--workspace-root",
            "/ws",
            "--silent",
            "--yes",
        ])?;
        let Command::Apply(args) = cli.command else {
            anyhow::bail!("expected the apply subcommand");
        };
        assert_eq!(args.config, PathBuf::from("profile.json"));
        assert_eq!(args.workspace_root, Some(PathBuf::from("/ws")));
        assert!(args.silent);
        assert!(args.yes);
        Ok(())
    }

    #[test]
    fn plan_defaults_to_table_output() -> TestResult {
        let cli = Cli::try_parse_from(["trellis", "plan", "--config", "profile.json"])?;
        let Command::Plan(args) = cli.command else {
            anyhow::bail!("expected the plan subcommand");
        };
        assert_eq!(args.output, OutputFormat::Table);
        assert_eq!(args.workspace_root, None);
        Ok(())
    }

    #[test]
    fn plan_accepts_json_output() -> TestResult {
        let cli = Cli::try_parse_from([
            "trellis",
            "plan",
            "--config",
            "profile.json",
            "--output",
            "json",
        ])?;
        let Command::Plan(args) = cli.command else {
            anyhow::bail!("expected the plan subcommand");
        };
        assert_eq!(args.output, OutputFormat::Json);
        Ok(())
    }

    #[test]
    fn rejects_unknown_output_format() {
        let parsed = Cli::try_parse_from([
            "trellis",
            "plan",
            "--config",
            "profile.json",
            "--output",
            "yaml",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_requires_config() {
        assert!(Cli::try_parse_from(["trellis", "validate"]).is_err());
    }

    #[test]
    fn global_logging_flags_parse() -> TestResult {
        let cli = Cli::try_parse_from([
            "trellis",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "validate",
            "--config",
            "profile.json",
        ])?;
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        Ok(())
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let parsed = Cli::try_parse_from([
            "trellis",
            "--log-format",
            "fancy",
            "validate",
            "--config",
            "profile.json",
        ]);
        assert!(parsed.is_err());
    }
}
