// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! dkey - Expandable Key and Structured String CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_check;
mod cmd_expand;
mod cmd_init;
mod cmd_show;
mod cmd_strang;

use cmd_check::CmdCheck;
use cmd_expand::CmdExpand;
use cmd_init::CmdInit;
use cmd_show::CmdShow;
use cmd_strang::CmdStrang;

#[derive(Parser)]
#[clap(
    name = "dkey",
    about = "Expandable keys and structured strings",
    version,
    long_about = "Expand key templates against layered .dkey.yaml files and inspect structured strings"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Where to look for `.dkey.yaml` files.
#[derive(Parser, Clone, Debug, Default)]
pub struct SourceFlags {
    /// Start discovery from PATH
    #[clap(short = 'f', long, default_value = ".")]
    pub file: PathBuf,

    /// Enable in-tree discovery
    #[clap(long)]
    pub inherit: bool,

    /// Disable in-tree discovery
    #[clap(short = 'n', long)]
    pub no_inherit: bool,

    /// Additional .dkey.yaml to include
    #[clap(short = 'i', long = "include")]
    pub includes: Vec<String>,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
}

impl SourceFlags {
    /// Discovery options from these flags and the `DKEY_*` environment.
    pub fn discovery_options(&self) -> dkey::DiscoveryOptions {
        let env_includes = std::env::var("DKEY_INCLUDE")
            .ok()
            .map(|s| {
                s.split(':')
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        dkey::DiscoveryOptions {
            no_inherit: self.no_inherit || env_flag("DKEY_NO_INHERIT"),
            force_inherit: self.inherit || env_flag("DKEY_INHERIT"),
            cli_includes: self.includes.clone(),
            env_includes,
        }
    }

    /// Discover and load every source file that applies.
    pub fn discover(&self) -> dkey::Result<Vec<dkey::SourceFile>> {
        dkey::discover_sources(&self.file, &self.discovery_options())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new .dkey.yaml file
    Init(CmdInit),

    /// Display discovered files and composed values
    Show(CmdShow),

    /// Expand a key template
    Expand(CmdExpand),

    /// Inspect the structure of a key template
    Check(CmdCheck),

    /// Inspect or derive a structured string
    Strang(CmdStrang),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.cmd {
            Command::Init(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Expand(mut cmd) => cmd.run(),
            Command::Check(mut cmd) => cmd.run(),
            Command::Strang(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
