//! Run command - execute a program under the retry executor
//!
//! Each attempt spawns the program and waits for it. A spawn error or a
//! non-zero exit status counts as a failed attempt.

use std::cell::Cell;
use std::io;

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use flakeguard_core::retry::{ClosurePredicate, RetryExecutor, TracingObserver};
use flakeguard_core::{RetryConfig, RetryPolicy};

use crate::cli::RunArgs;
use crate::output;

/// Why a single run of the program failed
#[derive(Debug, thiserror::Error)]
pub enum CommandFailure {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with status {code}")]
    Exit { program: String, code: i32 },

    #[error("'{program}' was terminated by a signal")]
    Signal { program: String },
}

impl CommandFailure {
    /// Exit code of the program, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandFailure::Exit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub fn run(args: RunArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let policy = resolve_policy(&config, &args)?;

    let (program, program_args) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("No command given"))?;

    tracing::debug!(
        operation = %args.operation,
        max_attempts = policy.max_attempts,
        strategy = %policy.strategy,
        delay_ms = policy.delay_ms,
        "resolved retry policy"
    );

    let no_retry_codes = args.no_retry_exit_codes.clone();
    let predicate = ClosurePredicate::new(move |failure: &CommandFailure| {
        failure
            .exit_code()
            .map_or(true, |code| !no_retry_codes.contains(&code))
    });

    let attempts = Cell::new(0u32);
    let result = RetryExecutor::builder()
        .policy(&policy)
        .predicate(predicate)
        .observer(TracingObserver::new(args.operation.as_str()))
        .build()
        .execute(|| {
            attempts.set(attempts.get() + 1);
            run_once(program, program_args)
        });

    match result {
        Ok(()) => {
            output::success(&format!(
                "{} succeeded on attempt {}/{}",
                program,
                attempts.get(),
                policy.max_attempts
            ));
            Ok(())
        }
        Err(err) => {
            output::error(&err.to_string());
            Err(anyhow!(
                "{} failed after {} attempt(s)",
                program,
                err.attempts()
            ))
        }
    }
}

/// Policy for the named operation with command-line overrides applied
pub fn resolve_policy(config: &RetryConfig, args: &RunArgs) -> Result<RetryPolicy> {
    let mut policy = config.policy_for(&args.operation).clone();

    if let Some(max_attempts) = args.max_attempts {
        policy.max_attempts = max_attempts;
    }
    if let Some(delay_ms) = args.delay_ms {
        policy.delay_ms = delay_ms;
        policy.max_delay_ms = policy.max_delay_ms.max(delay_ms);
    }
    if let Some(strategy) = args.strategy {
        policy.strategy = strategy;
    }
    if args.jitter {
        policy.jitter = true;
    }

    policy.validate()?;
    Ok(policy)
}

/// Run the program once, inheriting stdio
fn run_once(program: &str, args: &[String]) -> Result<(), CommandFailure> {
    let output = duct::cmd(program, args)
        .unchecked()
        .run()
        .map_err(|source| CommandFailure::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    match output.status.code() {
        Some(code) => Err(CommandFailure::Exit {
            program: program.to_string(),
            code,
        }),
        None => Err(CommandFailure::Signal {
            program: program.to_string(),
        }),
    }
}
