// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Composition logic for layering multiple source files into one lookup table.

use std::path::PathBuf;

use crate::getter::Source;
use crate::value::{yaml_key_text, Value, ValueMap};
use crate::SourceFile;

#[cfg(test)]
#[path = "./compose_test.rs"]
mod compose_test;

/// Values composed from multiple source files.
#[derive(Debug, Clone, Default)]
pub struct ComposedSources {
    /// Merged values, in first-defined order. Later files win.
    pub values: ValueMap,

    /// Default expansion limit (last file that sets one wins).
    pub limit: Option<i32>,

    /// Source files that contributed to this composition.
    pub source_files: Vec<PathBuf>,
}

impl ComposedSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn source_count(&self) -> usize {
        self.source_files.len()
    }
}

impl Source for ComposedSources {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// Compose multiple source files into a single lookup table.
///
/// Files are processed in order, with later files layering on top of earlier ones.
pub fn compose_sources(files: &[SourceFile]) -> ComposedSources {
    let mut composed = ComposedSources::default();

    for file in files {
        for (key, value) in &file.values {
            let Some(name) = yaml_key_text(key) else {
                tracing::warn!(key = ?key, "skipping non-scalar value name");
                continue;
            };
            composed.values.insert(name, Value::from(value.clone()));
        }

        if let Some(limit) = file.limit() {
            composed.limit = Some(limit);
        }

        if let Some(path) = &file.source_path {
            composed.source_files.push(path.clone());
        }
    }

    composed
}
