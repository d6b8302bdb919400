//! CLI argument parsing for linklock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// linklock: cross-process file locking built on hard links.
///
/// Contenders that share a lock directory agree on one lock file per
/// target path. Use `run` to hold the lock around a command, `status` to
/// inspect it, and `break` to clear an abandoned lock.
#[derive(Parser, Debug)]
#[command(name = "linklock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML config file (lock_dir, timeout_secs, expires_in_secs, ...).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding lock files (overrides the config file).
    #[arg(long, global = true)]
    pub lock_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for linklock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show whether a target is locked.
    ///
    /// Observing an expired lock clears it.
    Status(StatusArgs),

    /// Forcibly remove the lock on a target, whoever holds it.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Break(BreakArgs),

    /// Hold the lock on a target while running a command.
    ///
    /// Exits with the command's exit code once the lock is released.
    Run(RunArgs),
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Target path whose lock to inspect.
    pub target: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `break` command.
#[derive(Parser, Debug)]
pub struct BreakArgs {
    /// Target path whose lock to remove.
    pub target: PathBuf,

    /// Force removing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Target path to lock.
    pub target: PathBuf,

    /// Seconds to wait for the lock (0 or negative: fail at once; unset: config default).
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Seconds after which other contenders may reclaim the lock (0: never).
    #[arg(long)]
    pub expires: Option<f64>,

    /// Command to run while holding the lock.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["linklock", "status", "/data/x"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.target, PathBuf::from("/data/x"));
            assert!(!args.json);
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn parse_status_json_with_global_options() {
        let cli = Cli::try_parse_from([
            "linklock",
            "status",
            "/data/x",
            "--json",
            "--lock-dir",
            "/tmp/locks",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.lock_dir, Some(PathBuf::from("/tmp/locks")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Status(StatusArgs { json: true, .. })));
    }

    #[test]
    fn parse_break() {
        let cli = Cli::try_parse_from(["linklock", "break", "/data/x", "--force"]).unwrap();
        if let Command::Break(args) = cli.command {
            assert_eq!(args.target, PathBuf::from("/data/x"));
            assert!(args.force);
        } else {
            panic!("Expected Break command");
        }
    }

    #[test]
    fn parse_run() {
        let cli = Cli::try_parse_from([
            "linklock",
            "run",
            "/data/x",
            "--timeout",
            "5",
            "--expires",
            "30",
            "--",
            "sh",
            "-c",
            "echo hi",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.timeout, Some(5.0));
            assert_eq!(args.expires, Some(30.0));
            assert_eq!(args.command, vec!["sh", "-c", "echo hi"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_negative_timeout() {
        let cli =
            Cli::try_parse_from(["linklock", "run", "/data/x", "--timeout", "-1", "--", "true"])
                .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.timeout, Some(-1.0));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_command() {
        assert!(Cli::try_parse_from(["linklock", "run", "/data/x"]).is_err());
    }
}
