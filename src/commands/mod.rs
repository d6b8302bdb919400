//! Command implementations for linklock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each handler returns the process exit code on success.

use crate::cli::{BreakArgs, Cli, Command, RunArgs, StatusArgs};
use linklock::error::{LockError, Result};
use linklock::exit_codes;
use linklock::{LinkLock, LockConfig, Wait};
use std::time::Duration;
use tracing::warn;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Status(args) => cmd_status(&config, args),
        Command::Break(args) => cmd_break(&config, args),
        Command::Run(args) => cmd_run(&config, args),
    }
}

/// Config file (or defaults) with the `--lock-dir` override applied.
fn resolve_config(cli: &Cli) -> Result<LockConfig> {
    let mut config = match &cli.config {
        Some(path) => LockConfig::load(path)?,
        None => LockConfig::default(),
    };

    if let Some(lock_dir) = &cli.lock_dir {
        config.lock_dir = lock_dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn cmd_status(config: &LockConfig, args: StatusArgs) -> Result<i32> {
    let lock = LinkLock::new(&args.target, config)?;
    let status = lock.status();

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| LockError::Config(format!("failed to serialize status: {}", e)))?;
        println!("{}", json);
        return Ok(exit_codes::SUCCESS);
    }

    println!("{}", status);
    if status.locked {
        if let Some(created_at) = status.created_at {
            println!("  Created:    {}", created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!("  Lock file:  {}", status.indicator.display());
    }

    Ok(exit_codes::SUCCESS)
}

fn cmd_break(config: &LockConfig, args: BreakArgs) -> Result<i32> {
    if !args.force {
        return Err(LockError::Config(format!(
            "refusing to break lock without --force flag.\n\n\
             Breaking a lock lets another contender in while the holder may still be active.\n\
             Only break locks whose holder has crashed.\n\n\
             To break the lock, run:\n  linklock break {} --force",
            args.target.display()
        )));
    }

    let lock = LinkLock::new(&args.target, config)?;
    if lock.break_lock()? {
        println!("Broke lock on {}", lock.target_path().display());
    } else {
        println!("{} is not locked", lock.target_path().display());
    }

    Ok(exit_codes::SUCCESS)
}

fn cmd_run(config: &LockConfig, args: RunArgs) -> Result<i32> {
    let expires_in = args
        .expires
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|_| {
                LockError::Config(format!("--expires must be 0 or greater (found {})", secs))
            })
        })
        .transpose()?;
    let wait = args.timeout.map(|secs| Wait::from_secs(Some(secs)));

    let Some((program, program_args)) = args.command.split_first() else {
        return Err(LockError::Config("no command given".to_string()));
    };

    let mut lock = LinkLock::new(&args.target, config)?;
    let guard = lock.lock(wait, expires_in)?;

    let status = std::process::Command::new(program)
        .args(program_args)
        .status()
        .map_err(|e| LockError::io(format!("failed to run '{}'", program), e));

    if let Err(e) = guard.release() {
        warn!(
            target_path = %args.target.display(),
            error = %e,
            "lock was lost while running command"
        );
    }

    Ok(exit_code_of(status?))
}

/// Exit code to propagate for a finished child, `128 + signal` if it was killed.
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(exit_codes::USER_ERROR)
}
