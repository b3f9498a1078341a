//! Command dispatch and handler modules.

mod build;
mod resolve;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build { target, offline } => build::exec(target, offline, cli.verbose).await,
        Command::Resolve { offline } => resolve::exec(offline).await,
        Command::Tree { depth, offline } => tree::exec(depth, offline).await,
    }
}
