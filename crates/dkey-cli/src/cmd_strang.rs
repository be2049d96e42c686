// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dkey strang` command.

use clap::Args;
use colored::Colorize;
use dkey::strang::{StrangFormat, WordMeta};
use dkey::{CodeReference, PushValue, Strang, StrangMark};
use miette::Result;

#[cfg(test)]
#[path = "./cmd_strang_test.rs"]
mod cmd_strang_test;

/// Inspect or derive a structured string
#[derive(Debug, Args)]
pub struct CmdStrang {
    /// The structured string, eg: 'group::body.words'
    text: String,

    /// Read TEXT as a code reference (group::module:value)
    #[clap(long)]
    code: bool,

    /// Push words onto the final section ($mark$, <uuid> and integers are decoded)
    #[clap(long)]
    push: Vec<String>,

    /// Cut back to the nearest boundary
    #[clap(long)]
    pop: bool,

    /// Pop back to the first boundary instead of the nearest
    #[clap(long, requires = "pop")]
    top: bool,

    /// Add a generation mark and uuid
    #[clap(long)]
    uniq: bool,

    /// Remove the uuid and generation marks
    #[clap(long, conflicts_with = "uniq")]
    canon: bool,

    /// Only print the resulting string
    #[clap(long)]
    plain: bool,
}

impl CmdStrang {
    pub fn run(&mut self) -> Result<i32> {
        if self.code {
            let code = self.derive(CodeReference::new(&self.text)?)?;
            if !self.plain {
                println!("{} {}", "Path:".bold(), code.path().cyan());
            }
            self.report(&code);
        } else {
            let strang = self.derive(Strang::<dkey::Basic>::new(&self.text)?)?;
            self.report(&strang);
        }
        Ok(0)
    }

    fn derive<F: StrangFormat>(&self, mut strang: Strang<F>) -> dkey::Result<Strang<F>> {
        if self.pop {
            strang = strang.pop(self.top)?;
        }
        if !self.push.is_empty() {
            strang = strang.push(self.push.iter().map(|w| parse_push(w)))?;
        }
        if self.uniq {
            strang = strang.to_uniq(&[])?;
        }
        if self.canon {
            strang = strang.canon()?;
        }
        Ok(strang)
    }

    fn report<F: StrangFormat>(&self, strang: &Strang<F>) {
        if self.plain {
            println!("{strang}");
            return;
        }

        println!("{} {} ({})", "Strang:".bold(), strang.as_str().green(), F::NAME);
        if let Some(uuid) = strang.uuid() {
            println!("{} {}", "Uuid:".bold(), uuid.to_string().yellow());
        }
        println!();

        for (i, spec) in strang.sections().iter().enumerate().take(strang.section_count()) {
            let text = strang.section(i).unwrap_or_default();
            println!("  {} {}", format!("{}:", spec.name).cyan(), text);
            let Some(words) = strang.words(i) else {
                continue;
            };
            for (idx, word) in words.iter().enumerate() {
                let meta = strang
                    .meta(i, idx as isize)
                    .map(describe_meta)
                    .unwrap_or_default();
                println!("     {idx}. {word:?} {}", meta.dimmed());
            }
        }
    }
}

fn describe_meta(meta: WordMeta) -> String {
    match meta {
        WordMeta::Text => String::new(),
        WordMeta::Int(i) => format!("[int {i}]"),
        WordMeta::Uuid(u) => format!("[uuid {u}]"),
        WordMeta::Mark(m) => format!("[mark {m}]"),
    }
}

/// Decode a pushed word the way it would be read back.
pub(crate) fn parse_push(word: &str) -> PushValue {
    if word == "<uuid>" {
        return PushValue::Uuid(None);
    }
    if let Some(mark) = word
        .strip_prefix('$')
        .and_then(|w| w.strip_suffix('$'))
        .and_then(StrangMark::from_named)
    {
        return PushValue::Mark(mark);
    }
    match word.parse::<i64>() {
        // leading zeros or a '+' would not survive a round trip
        Ok(i) if i.to_string() == word => PushValue::Int(i),
        _ => PushValue::from(word),
    }
}
