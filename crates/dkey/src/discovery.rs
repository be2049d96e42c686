// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Discovery algorithm for finding and loading .dkey.yaml files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[cfg(test)]
#[path = "./discovery_test.rs"]
mod discovery_test;

use crate::source_file::resolve_include_path;
use crate::{SourceFile, DKEY_FILENAME, DKEY_LOCAL_FILENAME};

/// Options for discovery behavior.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Disable in-tree inheritance (from --no-inherit or DKEY_NO_INHERIT).
    pub no_inherit: bool,

    /// Enable in-tree inheritance (from --inherit or DKEY_INHERIT).
    pub force_inherit: bool,

    /// Additional includes from CLI (from --include flags).
    pub cli_includes: Vec<String>,

    /// Additional includes from environment (from DKEY_INCLUDE).
    pub env_includes: Vec<String>,
}

/// Discover all applicable .dkey.yaml files.
///
/// Returns files in composition order: earlier files are layered first,
/// so values from later files win.
pub fn discover_sources<P: AsRef<Path>>(
    start_path: P,
    options: &DiscoveryOptions,
) -> crate::Result<Vec<SourceFile>> {
    let start = resolve_start_path(start_path.as_ref());
    let mut top = Vec::new();

    // Step 1: CLI includes, then environment includes
    for include in options.cli_includes.iter().chain(&options.env_includes) {
        let path = resolve_include_path(include, Some(&start))?;
        let file = SourceFile::load(&path)?;
        top.push((path, file));
    }

    // Step 2: In-tree files
    for file in discover_in_tree(&start, options)? {
        let path = match &file.source_path {
            Some(path) => dunce::canonicalize(path)?,
            None => continue,
        };
        top.push((path, file));
    }

    // Step 3: Includes, each resolved before the file that names it
    let mut walker = IncludeWalker::default();
    for (path, file) in top {
        if walker.loaded.contains(&path) {
            tracing::debug!(?path, "already included, skipping");
            continue;
        }
        walker.visit(path, file)?;
    }
    let mut all_files = walker.files;

    // Step 4: Local override
    let local_path = start.join(DKEY_LOCAL_FILENAME);
    if local_path.is_file() {
        all_files.push(SourceFile::load(&local_path)?);
    }

    for file in &all_files {
        file.validate()?;
    }
    tracing::debug!(count = all_files.len(), "discovered source files");
    Ok(all_files)
}

/// Resolve starting path, preferring $PWD to preserve symlinks.
fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        start_path.to_owned()
    } else {
        match std::env::var("PWD").ok() {
            Some(pwd) => PathBuf::from(pwd).join(start_path),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join(start_path),
        }
    }
}

/// Discover files in the directory tree, walking up parents.
fn discover_in_tree(start: &Path, options: &DiscoveryOptions) -> crate::Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    let mut current = start.to_path_buf();

    let start_file_path = current.join(DKEY_FILENAME);
    if start_file_path.is_file() {
        let file = SourceFile::load(&start_file_path)?;
        let should_inherit = if options.force_inherit {
            true
        } else if options.no_inherit {
            false
        } else {
            file.inherit
        };
        files.push(file);

        if !should_inherit {
            return Ok(files);
        }
    } else if options.no_inherit {
        return Err(crate::Error::NotFoundAtPath(current));
    }

    while current.pop() {
        let file_path = current.join(DKEY_FILENAME);
        if !file_path.is_file() {
            continue;
        }
        let file = SourceFile::load(&file_path)?;
        let inherit = file.inherit;
        // parents go first
        files.insert(0, file);
        if !inherit {
            break;
        }
    }

    if files.is_empty() {
        return Err(crate::Error::NotFoundInTree(start.to_path_buf()));
    }
    Ok(files)
}

/// Orders files so each comes after everything it includes.
///
/// A file reached twice through different parents is only loaded once.
/// Reaching a file that is still being resolved is a cycle.
#[derive(Default)]
struct IncludeWalker {
    loaded: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
    files: Vec<SourceFile>,
}

impl IncludeWalker {
    fn visit(&mut self, path: PathBuf, file: SourceFile) -> crate::Result<()> {
        self.stack.push(path);
        for include in file.resolve_includes_or_empty()? {
            if self.stack.contains(&include) {
                return Err(crate::Error::CircularInclude(include));
            }
            if self.loaded.contains(&include) {
                continue;
            }
            let included = SourceFile::load(&include)?;
            self.visit(include, included)?;
        }
        if let Some(path) = self.stack.pop() {
            self.loaded.insert(path);
        }
        self.files.push(file);
        Ok(())
    }
}

impl SourceFile {
    /// Like [`SourceFile::resolve_includes`], but a file with no includes
    /// needs no source path.
    fn resolve_includes_or_empty(&self) -> crate::Result<Vec<PathBuf>> {
        if self.includes.is_empty() {
            return Ok(Vec::new());
        }
        self.resolve_includes()
    }
}
