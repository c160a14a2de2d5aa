//! Subcommand entry points. Without a subcommand the help text is printed.

pub mod init;
pub mod run;

use clap::CommandFactory;

use crate::cli::{Cli, Commands};
use crate::error::EdgeIpError;

pub async fn dispatch(cli: Cli) -> Result<(), EdgeIpError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(args)) => init::execute(&args),
        None => Ok(Cli::command().print_help()?),
    }
}
