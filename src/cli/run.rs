//! Dispatches parsed arguments to the matching command.
use super::{
    args::{Arguments, Command},
    commands::{CommandResult, extract::extract, init::init, sync::sync, validate::validate},
};
use anyhow::Result;

pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Extract(cmd)) => extract(cmd),
        Some(Command::Validate(cmd)) => validate(cmd),
        Some(Command::Sync(cmd)) => sync(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
