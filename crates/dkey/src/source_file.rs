// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Parsing and data types for .dkey.yaml source files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::getter::Source;
use crate::value::Value;

#[cfg(test)]
#[path = "./source_file_test.rs"]
mod source_file_test;

/// API version for source files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "dkey/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// Defaults applied to every expansion against this file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExpansionSettings {
    /// Recursion limit used when the key and the caller set none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

/// A layer of lookup values from a .dkey.yaml file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceFile {
    /// API version identifier.
    pub api: ApiVersion,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// In-tree inheritance control.
    /// When false (default), discovery stops at this file.
    /// When true, .dkey.yaml files in parent directories are layered underneath.
    #[serde(default)]
    pub inherit: bool,

    /// Out-of-tree includes loaded before this file.
    /// Absolute, home-relative (~/) or relative to this file's directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    /// The lookup mapping.
    #[serde(default, skip_serializing_if = "serde_yaml::Mapping::is_empty")]
    pub values: serde_yaml::Mapping,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ExpansionSettings>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl SourceFile {
    /// Parse a source file from a YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // Stage 2: Deserialize based on version
        match with_version.api {
            ApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })
            }
        }
    }

    /// Load a source file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut file = Self::from_yaml(yaml)?;
        file.source_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), values = file.values.len(), "loaded source file");
        Ok(file)
    }

    /// Validate after loading.
    pub fn validate(&self) -> crate::Result<()> {
        if self.source_path.is_none() {
            return Err(crate::Error::ValidationFailed(
                "source_path must be set".to_string(),
            ));
        }
        for key in self.values.keys() {
            if crate::value::yaml_key_text(key).is_none() {
                return Err(crate::Error::ValidationFailed(format!(
                    "value names must be scalars, found {key:?}"
                )));
            }
        }
        if let Some(limit) = self.settings.as_ref().and_then(|s| s.limit) {
            if limit == 0 {
                return Err(crate::Error::ValidationFailed(
                    "settings.limit of 0 would never expand anything".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Resolve relative includes to absolute paths.
    pub fn resolve_includes(&self) -> crate::Result<Vec<PathBuf>> {
        let base_dir = self
            .source_path
            .as_ref()
            .and_then(|p| p.parent())
            .ok_or_else(|| {
                crate::Error::ValidationFailed(
                    "Cannot resolve includes without source_path".to_string(),
                )
            })?;

        self.includes
            .iter()
            .map(|include| resolve_include_path(include, Some(base_dir)))
            .collect()
    }

    /// The default expansion limit, if set.
    pub fn limit(&self) -> Option<i32> {
        self.settings.as_ref().and_then(|s| s.limit)
    }
}

impl Source for SourceFile {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.values.lookup(key)
    }
}

/// Resolve an include path to an absolute canonical path.
pub(crate) fn resolve_include_path(include: &str, base_dir: Option<&Path>) -> crate::Result<PathBuf> {
    let path = if include.starts_with('~') {
        let home = dirs::home_dir().ok_or_else(|| {
            crate::Error::ValidationFailed("Cannot resolve ~ without HOME".to_string())
        })?;
        let rel = include.strip_prefix("~/").unwrap_or(include);
        home.join(rel)
    } else if Path::new(include).is_absolute() {
        PathBuf::from(include)
    } else {
        let base = base_dir.ok_or_else(|| {
            crate::Error::ValidationFailed(format!(
                "Cannot resolve relative include '{include}' without base directory"
            ))
        })?;
        base.join(include)
    };

    dunce::canonicalize(&path).map_err(|e| crate::Error::IncludeNotFound {
        path: path.clone(),
        error: e,
    })
}
