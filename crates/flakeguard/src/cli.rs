//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use flakeguard_core::BackoffStrategy;

/// flakeguard - retry flaky commands with bounded attempts and backoff
#[derive(Parser, Debug)]
#[command(name = "flakeguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a retry config file (default: ~/.flakeguard/config.yaml)
    #[arg(short, long, global = true, env = "FLAKEGUARD_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command, retrying it on failure
    Run(RunArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Verify that configuration and required tools are in place
    Check(CheckArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Named policy from the config file
    #[arg(short, long, default_value = "command")]
    pub operation: String,

    /// Maximum number of runs, including the first
    #[arg(short = 'n', long)]
    pub max_attempts: Option<u32>,

    /// Base delay between runs in milliseconds
    #[arg(short, long)]
    pub delay_ms: Option<u64>,

    /// Backoff strategy: none, fixed-delay, linear-backoff, exponential-backoff
    #[arg(short, long)]
    pub strategy: Option<BackoffStrategy>,

    /// Add up to 25% random delay
    #[arg(long)]
    pub jitter: bool,

    /// Exit codes that stop retrying immediately (repeatable)
    #[arg(long = "no-retry-exit-code", value_name = "CODE")]
    pub no_retry_exit_codes: Vec<i32>,

    /// Program and arguments to run
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show(ConfigShowArgs),

    /// Validate a configuration file
    Validate(ConfigValidateArgs),

    /// Write the built-in defaults to a file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show only the policy for this operation
    #[arg(short, long)]
    pub operation: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// File to validate (default: the resolved configuration)
    pub file: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "flakeguard.yaml")]
    pub output: Utf8PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Tool that must be on PATH (repeatable)
    #[arg(short, long = "require", value_name = "TOOL")]
    pub required_tools: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
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
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "flakeguard",
            "-v",
            "run",
            "--max-attempts",
            "5",
            "--delay-ms",
            "250",
            "--strategy",
            "exponential",
            "--no-retry-exit-code",
            "2",
            "--no-retry-exit-code",
            "64",
            "--",
            "curl",
            "-fsS",
            "https://demoqa.com/webtables",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.operation, "command");
                assert_eq!(args.max_attempts, Some(5));
                assert_eq!(args.delay_ms, Some(250));
                assert_eq!(args.strategy, Some(BackoffStrategy::ExponentialBackoff));
                assert_eq!(args.no_retry_exit_codes, vec![2, 64]);
                assert_eq!(
                    args.command,
                    vec!["curl", "-fsS", "https://demoqa.com/webtables"]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_command() {
        assert!(Cli::try_parse_from(["flakeguard", "run"]).is_err());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result =
            Cli::try_parse_from(["flakeguard", "run", "--strategy", "fibonacci", "--", "true"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["flakeguard", "check", "-c", "retry.yaml", "-r", "git"])
            .unwrap();

        assert_eq!(cli.config.as_deref().map(|p| p.as_str()), Some("retry.yaml"));
        match cli.command {
            Commands::Check(args) => assert_eq!(args.required_tools, vec!["git"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_flag_reads_env() {
        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();

        assert_eq!(
            config.get_env().and_then(|name| name.to_str()),
            Some("FLAKEGUARD_CONFIG")
        );
    }
}
