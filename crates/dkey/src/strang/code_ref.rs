// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! References to host-registered code, written `group::module.path:value`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::process::{self, PreProcessed};
use super::section::{SectionSpec, StrangFormat, WordKinds};
use super::Strang;
use crate::value::Value;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./code_ref_test.rs"]
mod code_ref_test;

/// Group used when a reference omits one.
pub const DEFAULT_GROUP: &str = "fn";

/// A callable registered under a `module:value` path.
pub type CodeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

static CODE_TABLE: Lazy<RwLock<HashMap<String, CodeFn>>> = Lazy::new(Default::default);

/// Make `func` loadable as `path`, eg: `text.tools:upper`.
///
/// Registering the same path again replaces the previous entry.
pub fn register_code<F>(path: &str, func: F)
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
{
    tracing::debug!(path, "registering code");
    let mut table = CODE_TABLE.write().unwrap_or_else(|e| e.into_inner());
    table.insert(path.to_string(), Arc::new(func));
}

/// Remove a registered path, returning whether it was present.
pub fn unregister_code(path: &str) -> bool {
    let mut table = CODE_TABLE.write().unwrap_or_else(|e| e.into_inner());
    table.remove(path).is_some()
}

/// All registered paths, sorted.
pub fn registered_code() -> Vec<String> {
    let table = CODE_TABLE.read().unwrap_or_else(|e| e.into_inner());
    let mut paths: Vec<String> = table.keys().cloned().collect();
    paths.sort();
    paths
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CodeRefFormat;

static CODE_REF_SECTIONS: [SectionSpec; 3] = [
    SectionSpec {
        name: "group",
        case: ".",
        end: Some("::"),
        kinds: WordKinds::TEXT,
        required: true,
    },
    SectionSpec {
        name: "module",
        case: ".",
        end: Some(":"),
        kinds: WordKinds::TEXT,
        required: true,
    },
    SectionSpec {
        name: "value",
        case: ".",
        end: None,
        kinds: WordKinds::TEXT,
        required: true,
    },
];

impl StrangFormat for CodeRefFormat {
    const NAME: &'static str = "code";

    fn sections() -> &'static [SectionSpec] {
        &CODE_REF_SECTIONS
    }

    fn pre_process(text: &str) -> Result<PreProcessed> {
        if text.contains("::") {
            process::pre_process(Self::sections(), text)
        } else {
            process::pre_process(Self::sections(), &format!("{DEFAULT_GROUP}::{text}"))
        }
    }
}

/// A structured string naming registered code.
pub type CodeReference = Strang<CodeRefFormat>;

impl Strang<CodeRefFormat> {
    pub fn group(&self) -> &str {
        self.section(0).unwrap_or_default()
    }

    pub fn module(&self) -> &str {
        self.section(1).unwrap_or_default()
    }

    pub fn value(&self) -> &str {
        self.section(2).unwrap_or_default()
    }

    /// The `module:value` path used to look the code up.
    pub fn path(&self) -> String {
        format!("{}:{}", self.module(), self.value())
    }

    /// Resolve this reference against the registered code.
    pub fn load(&self) -> Result<Code> {
        let path = self.path();
        let table = CODE_TABLE.read().unwrap_or_else(|e| e.into_inner());
        match table.get(&path) {
            Some(func) => Ok(Code {
                reference: self.clone(),
                func: Arc::clone(func),
            }),
            None => Err(Error::CodeNotFound(self.as_str().to_string())),
        }
    }
}

/// Loaded code, callable with positional values.
#[derive(Clone)]
pub struct Code {
    reference: CodeReference,
    func: CodeFn,
}

impl Code {
    pub fn reference(&self) -> &CodeReference {
        &self.reference
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Code")
            .field("reference", &self.reference.as_str())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}
