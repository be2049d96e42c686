// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dkey expand` command.

use clap::Args;
use colored::Colorize;
use dkey::rawkey::KeyName;
use dkey::{DKey, ExpandOptions, Mark, Source, Value, ValueMap};
use miette::{IntoDiagnostic, Result};

use crate::SourceFlags;

#[cfg(test)]
#[path = "./cmd_expand_test.rs"]
mod cmd_expand_test;

/// Expand a key template
#[derive(Debug, Args)]
pub struct CmdExpand {
    /// The key template, eg: '{out_dir!p}/{name}.txt'
    template: String,

    /// Treat TEMPLATE as a bare key name
    #[clap(long)]
    implicit: bool,

    /// Force the kind of key
    #[clap(long)]
    mark: Option<Mark>,

    /// Maximum recursion depth, -1 for unbounded
    #[clap(long, allow_hyphen_values = true)]
    limit: Option<i32>,

    /// Value to produce when nothing is found
    #[clap(long)]
    fallback: Option<String>,

    /// Set a value for this expansion only (NAME=VALUE)
    #[clap(long = "set", short = 's')]
    sets: Vec<String>,

    #[clap(flatten)]
    sources: SourceFlags,

    /// Output format: plain, yaml
    #[clap(long, default_value = "plain")]
    format: String,
}

impl CmdExpand {
    pub fn run(&mut self) -> Result<i32> {
        let sets = parse_sets(&self.sets)?;

        let files = match self.sources.discover() {
            Ok(files) => files,
            // Inline values are enough to expand against
            Err(dkey::Error::NotFoundInTree(path) | dkey::Error::NotFoundAtPath(path))
                if !sets.is_empty() => {
                tracing::debug!(?path, "no source files found");
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };
        let composed = dkey::compose_sources(&files);

        let mut builder = DKey::builder(self.template.as_str());
        if self.implicit {
            builder = builder.implicit();
        }
        if let Some(mark) = self.mark {
            builder = builder.mark(mark);
        }
        let key = builder.build()?;
        tracing::debug!(?key, class = key.class_name(), "expanding");

        let mut opts = ExpandOptions::default();
        if let Some(limit) = self.limit.or(composed.limit) {
            opts = opts.with_limit(limit);
        }
        if let Some(fallback) = &self.fallback {
            opts = opts.with_fallback(Value::from(fallback.as_str()));
        }

        let sources: [&dyn Source; 2] = [&sets, &composed];
        let Some(value) = key.expand_with(&sources, opts)? else {
            eprintln!("{} {}", "Not found:".red(), key);
            return Ok(1);
        };

        match self.format.as_str() {
            "yaml" => print!("{}", serde_yaml::to_string(&value).into_diagnostic()?),
            _ => println!("{value}"),
        }
        Ok(0)
    }
}

/// Parse `NAME=VALUE` pairs, reading each value as a yaml scalar.
pub(crate) fn parse_sets(sets: &[String]) -> Result<ValueMap> {
    let mut values = ValueMap::new();
    for item in sets {
        let Some((name, raw)) = item.split_once('=') else {
            miette::bail!("Invalid --set '{item}', expected NAME=VALUE");
        };
        if !KeyName::parse(name).is_some_and(|n| n.is_plain()) {
            miette::bail!("Invalid --set name '{name}'");
        }
        let value: serde_yaml::Value = if raw.is_empty() {
            serde_yaml::Value::String(String::new())
        } else {
            serde_yaml::from_str(raw).into_diagnostic()?
        };
        values.insert(name.to_string(), Value::from(value));
    }
    Ok(values)
}
