// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dkey init` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create a new .dkey.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Enable in-tree inheritance
    #[clap(long)]
    inherit: bool,

    /// Add an initial value (NAME=VALUE)
    #[clap(long = "set", short = 's')]
    sets: Vec<String>,

    /// Template to use: minimal, standard
    #[clap(long, default_value = "standard")]
    template: String,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        let file_path = self.path.join(dkey::DKEY_FILENAME);

        if file_path.exists() {
            return Err(miette::miette!(
                ".dkey.yaml already exists at {:?}",
                file_path
            ));
        }

        let content = match self.template.as_str() {
            "minimal" => self.generate_minimal_template()?,
            _ => self.generate_standard_template()?,
        };

        // Never write something that would not load back
        dkey::SourceFile::from_yaml(&content)?;

        std::fs::write(&file_path, content)
            .map_err(|e| miette::miette!("Failed to write .dkey.yaml: {}", e))?;

        println!("Created .dkey.yaml at {:?}", file_path);
        println!();
        println!("Next steps:");
        println!("  1. Edit the file to add your values");
        println!("  2. Run 'dkey show' to preview the composed values");
        println!("  3. Run 'dkey expand \"{{name}}\"' to expand a key");

        Ok(0)
    }

    fn values_section(&self) -> Result<Option<String>> {
        if self.sets.is_empty() {
            return Ok(None);
        }
        let values = crate::cmd_expand::parse_sets(&self.sets)?;
        let mut lines = vec!["values:".to_string()];
        for (name, value) in &values {
            let rendered = serde_yaml::to_string(value)
                .map_err(|e| miette::miette!("Failed to render value '{name}': {e}"))?;
            lines.push(format!("  {name}: {}", rendered.trim_end()));
        }
        Ok(Some(lines.join("\n") + "\n"))
    }

    fn generate_minimal_template(&self) -> Result<String> {
        let values = self
            .values_section()?
            .unwrap_or_else(|| "values: {}\n".to_string());
        Ok(format!(
            "api: dkey/v0\n\
            inherit: {}\n\
            \n\
            {values}",
            self.inherit
        ))
    }

    fn generate_standard_template(&self) -> Result<String> {
        let values = self.values_section()?.unwrap_or_else(|| {
            "# values:\n\
            #   root: /data/project\n\
            #   out_dir: \"{root}/build\"\n\
            #   log_: out_dir\n"
                .to_string()
        });

        Ok(format!(
            "# dkey source file\n\
            \n\
            api: dkey/v0\n\
            \n\
            # Optional: Human-readable description\n\
            # description: \"My project locations\"\n\
            \n\
            # In-tree inheritance (default: false for security)\n\
            # When true, walks up directory tree loading parent .dkey.yaml files\n\
            # When false, only loads this file (recommended)\n\
            inherit: {}\n\
            \n\
            # Explicit includes, layered underneath this file\n\
            # includes:\n\
            #   - ~/.config/dkey/defaults.dkey.yaml\n\
            #   - ../shared/common.dkey.yaml\n\
            \n\
            # Values looked up during expansion. Later files win.\n\
            # A name ending in '_' redirects to the key it holds.\n\
            {values}\
            \n\
            # Expansion settings\n\
            # settings:\n\
            #   limit: 10\n",
            self.inherit
        ))
    }
}
