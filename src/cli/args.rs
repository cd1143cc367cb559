//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `extract`: Scan sources and write key and translation catalogs
//! - `validate`: Check translations against the base locale
//! - `sync`: Reconcile catalogs with the remote translation store
//! - `init`: Initialize msgkit configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Extract(cmd)) => cmd.common.verbose,
            Some(Command::Validate(cmd)) => cmd.common.verbose,
            Some(Command::Sync(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Directory to start looking for the configuration file from
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Only process these domains (default: all)
    /// Can be specified multiple times: --domain app --domain admin
    #[arg(long = "domain")]
    pub domains: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ExtractCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Compute and print the remote changes without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// API token (overrides the variable named by `remote.tokenEnv`)
    #[arg(long, env = "MSGKIT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract messages from sources into key and translation catalogs
    Extract(ExtractCommand),
    /// Check translated placeholders and markup against the base locale
    Validate(ValidateCommand),
    /// Reconcile catalogs with the remote translation store
    Sync(SyncCommand),
    /// Initialize a new .msgkitrc.json configuration file
    Init,
}
