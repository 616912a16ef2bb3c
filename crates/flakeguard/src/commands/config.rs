//! Config command

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use flakeguard_core::config::embedded_defaults_yaml;
use flakeguard_core::{ConfigLoader, RetryConfig};

use crate::cli::{ConfigCommands, ConfigInitArgs, ConfigShowArgs, ConfigValidateArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_path),
        ConfigCommands::Validate(args) => validate(args, config_path),
        ConfigCommands::Init(args) => init(args),
    }
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    println!("{}", render(&config, args.operation.as_deref(), args.json)?);
    Ok(())
}

/// Render the whole config, or a single operation's policy, as YAML or JSON
fn render(config: &RetryConfig, operation: Option<&str>, json: bool) -> Result<String> {
    let rendered = match (operation, json) {
        (Some(name), true) => serde_json::to_string_pretty(config.policy_for(name))?,
        (Some(name), false) => serde_yaml_ng::to_string(config.policy_for(name))?,
        (None, true) => serde_json::to_string_pretty(config)?,
        (None, false) => serde_yaml_ng::to_string(config)?,
    };
    Ok(rendered)
}

fn validate(args: ConfigValidateArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = match args.file.as_deref() {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("{} is not a valid retry configuration", path))?,
        None => super::load_config(config_path)?,
    };

    match args.file {
        Some(path) => output::success(&format!("Configuration is valid: {}", path)),
        None => output::success("Resolved configuration is valid"),
    }
    output::kv("default max-attempts", &config.default.max_attempts.to_string());
    output::kv("default strategy", config.default.strategy.as_str());
    output::kv("named operations", &config.operations.len().to_string());

    Ok(())
}

fn init(args: ConfigInitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow!(
            "File {} already exists. Use --force to overwrite.",
            args.output
        ));
    }

    let content = embedded_defaults_yaml()?;
    std::fs::write(&args.output, content)
        .with_context(|| format!("Failed to write {}", args.output))?;

    output::success(&format!("Created {}", args.output));
    output::info("Pass it with --config or copy it to ~/.flakeguard/config.yaml");

    Ok(())
}
