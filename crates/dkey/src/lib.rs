// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! dkey - Expandable Keys and Structured Strings
//!
//! This crate provides two small engines used to describe locations,
//! parameters and names in configuration:
//!
//! - [`DKey`], a key template such as `{out_dir!p}/{name}.txt` that is
//!   expanded recursively against an ordered list of lookup sources, with
//!   indirection, fallbacks, type coercion and a bounded recursion budget;
//! - [`Strang`], a `group::body` structured string whose sections and
//!   words are indexed, decoded and derived (push, pop, uniq, canon).
//!
//! Lookup values usually come from layered `.dkey.yaml` files.
//!
//! # Example
//!
//! ```yaml
//! # .dkey.yaml
//! api: dkey/v0
//! description: "Project locations"
//!
//! # Security: don't walk up directory tree (default)
//! inherit: false
//!
//! # Explicit includes, layered underneath this file
//! includes:
//!   - ~/.config/dkey/defaults.dkey.yaml
//!
//! values:
//!   root: /data/project
//!   out_dir: "{root}/build"
//!   log_: out_dir
//!
//! settings:
//!   limit: 10
//! ```

pub mod compose;
pub mod discovery;
pub mod error;
pub mod expander;
pub mod format;
pub mod getter;
pub mod key;
pub mod rawkey;
pub mod source_file;
pub mod strang;
pub mod value;

pub use compose::{compose_sources, ComposedSources};
pub use discovery::{discover_sources, DiscoveryOptions};
pub use error::{Error, Result};
pub use expander::{ExpInst, ExpandOptions, RECURSION_GUARD};
pub use getter::{
    chain_get,
    chain_get_or,
    ParamSource,
    SharedSource,
    Source,
    SourceGuard,
    ValueStack,
};
pub use key::{Ctor, DKey, Fallback, KeyBuilder, KeyInput, Mark};
pub use source_file::{ApiVersion, ExpansionSettings, SourceFile};
pub use strang::{
    register_code,
    unregister_code,
    Basic,
    Code,
    CodeReference,
    PushValue,
    Strang,
    StrangMark,
};
pub use value::{TypeCheck, Value, ValueMap, ValueType};

/// Well-known filename for source files.
pub const DKEY_FILENAME: &str = ".dkey.yaml";

/// Well-known filename for local overrides.
pub const DKEY_LOCAL_FILENAME: &str = ".dkey.local.yaml";
