// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dkey check` command.

use clap::Args;
use colored::Colorize;
use dkey::{DKey, Mark};
use miette::Result;

/// Inspect the structure of a key template
#[derive(Debug, Args)]
pub struct CmdCheck {
    /// The key template to inspect
    template: String,

    /// Treat TEMPLATE as a bare key name
    #[clap(long)]
    implicit: bool,

    /// Force the kind of key
    #[clap(long)]
    mark: Option<Mark>,
}

impl CmdCheck {
    pub fn run(&mut self) -> Result<i32> {
        let mut builder = DKey::builder(self.template.as_str());
        if self.implicit {
            builder = builder.implicit();
        }
        if let Some(mark) = self.mark {
            builder = builder.mark(mark);
        }

        let key = match builder.build() {
            Ok(key) => key,
            Err(err) => {
                println!("{} {}", "✗".red(), self.template);
                return Err(err.into());
            }
        };

        println!("{} {}", "✓".green(), key.as_str());
        print_key(&key, 1);
        Ok(0)
    }
}

fn print_key(key: &DKey, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}{} {}", "class:".bold(), key.class_name().cyan());
    println!("{pad}{} {}", "mark:".bold(), key.mark());
    if key.is_indirect() {
        println!("{pad}{} {}", "indirect:".bold(), key.indirect());
    }
    if let Some(conv) = key.conv_params() {
        println!("{pad}{} {conv}", "conv:".bold());
    }
    if !key.fmt_params().is_empty() {
        println!("{pad}{} {}", "format:".bold(), key.fmt_params());
    }
    if let Some(limit) = key.max_expansions() {
        println!("{pad}{} {limit}", "limit:".bold());
    }
    if key.is_multi() {
        if let Some(anon) = key.anon() {
            println!("{pad}{} {}", "template:".bold(), anon.dimmed());
        }
        for (i, sub) in key.subkeys().iter().enumerate() {
            println!("{pad}{} {}", format!("{}.", i + 1).yellow(), sub.wrapped());
            print_key(sub, depth + 2);
        }
    }
}
