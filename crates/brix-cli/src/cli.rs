//! CLI argument definitions for brix.
//!
//! Uses `clap` derive macros to define the full command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "brix",
    version,
    about = "A package manager and build tool for VBA component projects",
    long_about = "brix resolves a project's declared dependencies from registry, git, and \
                  path sources, merges the resolved source components and references into \
                  one validated build graph, and packages it into Office container files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies, assemble the build graph, and package targets
    Build {
        /// Package only targets of this type (xlsx, xlsm, xlam)
        #[arg(short, long)]
        target: Option<String>,
        /// Use only cached dependencies
        #[arg(long)]
        offline: bool,
    },

    /// Resolve dependencies and print the solution
    Resolve {
        /// Use only cached dependencies
        #[arg(long)]
        offline: bool,
    },

    /// Display the resolved dependency tree
    Tree {
        /// Maximum tree depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Use only cached dependencies
        #[arg(long)]
        offline: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
