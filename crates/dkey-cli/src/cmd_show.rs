// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dkey show` command.

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use crate::SourceFlags;

/// Display discovered files and composed values
#[derive(Debug, Args)]
pub struct CmdShow {
    #[clap(flatten)]
    sources: SourceFlags,

    /// Show discovered files
    #[clap(long)]
    files: bool,

    /// Show composed values
    #[clap(long)]
    values: bool,

    /// Output format: table, yaml
    #[clap(long, default_value = "table")]
    format: String,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let files = self.sources.discover()?;
        let composed = dkey::compose_sources(&files);

        let show_files = self.files || !self.values;
        let show_values = self.values || !self.files;

        if self.format == "yaml" {
            self.show_yaml(&files, &composed)?;
        } else {
            if show_files {
                self.show_files_table(&files);
            }
            if show_files && show_values {
                println!();
            }
            if show_values {
                self.show_values_table(&composed);
            }
        }

        Ok(0)
    }

    fn show_files_table(&self, files: &[dkey::SourceFile]) {
        println!("{}", "Discovered Files:".bold());
        println!();

        for (i, file) in files.iter().enumerate() {
            let path = file
                .source_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());

            let inherit_marker = if file.inherit { " [inherit]" } else { "" };
            let includes_marker = if !file.includes.is_empty() {
                format!(" [includes: {}]", file.includes.len())
            } else {
                String::new()
            };

            println!(
                "  {}. {}{}{}",
                i + 1,
                path.cyan(),
                inherit_marker.yellow(),
                includes_marker.blue()
            );

            if let Some(desc) = &file.description {
                println!("     {}", desc.dimmed());
            }
        }

        println!();
        println!("Total: {} file(s)", files.len());
    }

    fn show_values_table(&self, composed: &dkey::ComposedSources) {
        println!("{}", "Composed Values:".bold());
        println!();

        if composed.is_empty() {
            println!("  {}", "(no values)".dimmed());
        } else {
            let width = composed.values.keys().map(String::len).max().unwrap_or(0);
            for (name, value) in &composed.values {
                println!("  {} = {}", format!("{name:width$}").cyan(), value.to_string().green());
            }
        }

        if let Some(limit) = composed.limit {
            println!();
            println!("{} {}", "Expansion limit:".bold(), limit.to_string().yellow());
        }
    }

    fn show_yaml(&self, files: &[dkey::SourceFile], composed: &dkey::ComposedSources) -> Result<()> {
        println!("# Discovered Files:");
        for file in files {
            if let Some(path) = &file.source_path {
                println!("# - {}", path.display());
            }
        }
        println!();

        println!("# Composed Values:");
        let mut values = serde_yaml::Mapping::new();
        for (name, value) in &composed.values {
            values.insert(
                name.as_str().into(),
                serde_yaml::to_value(value).into_diagnostic()?,
            );
        }
        let mut doc = serde_yaml::Mapping::new();
        doc.insert("values".into(), values.into());
        if let Some(limit) = composed.limit {
            let mut settings = serde_yaml::Mapping::new();
            settings.insert("limit".into(), serde_yaml::to_value(limit).into_diagnostic()?);
            doc.insert("settings".into(), settings.into());
        }
        print!("{}", serde_yaml::to_string(&doc).into_diagnostic()?);

        Ok(())
    }
}
