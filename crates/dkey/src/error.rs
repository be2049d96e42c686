// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for key expansion and structured strings.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::key::Mark;

/// Convenience Result type with dkey Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, parsing or expanding keys.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Template text could not be tokenized
    #[error("Malformed key template {text:?}: {reason}")]
    #[diagnostic(
        code(dkey::malformed_template),
        help("Balance the braces, or double them for literal brace characters")
    )]
    MalformedTemplate { text: String, reason: String },

    /// Format parameters could not be parsed
    #[error("Malformed format spec {spec:?}: {reason}")]
    #[diagnostic(code(dkey::malformed_format))]
    MalformedFormat { spec: String, reason: String },

    /// A required section separator is missing
    #[error("Structured string {text:?} is missing section '{section}' (expected {marker:?})")]
    #[diagnostic(code(dkey::missing_section))]
    MissingSection {
        text: String,
        section: String,
        marker: String,
    },

    /// More than one uuid found in a structured string
    #[error("Too many uuids in {0:?}, at most one is allowed")]
    #[diagnostic(
        code(dkey::too_many_uuids),
        help("Use canon() or de_uniq() before adding a new uuid")
    )]
    TooManyUuids(String),

    /// A uuid literal could not be parsed
    #[error("Invalid uuid {value:?} in {text:?}")]
    #[diagnostic(code(dkey::bad_uuid))]
    BadUuid { text: String, value: String },

    /// A pushed word contains a section separator
    #[error("Word {word:?} contains the separator {separator:?}")]
    #[diagnostic(
        code(dkey::separator_in_word),
        help("Push each word separately instead of a pre-joined string")
    )]
    SeparatorInWord { word: String, separator: String },

    /// Conversion parameters must be a single character
    #[error("Bad conversion parameter {conv:?} for key {key:?}")]
    #[diagnostic(
        code(dkey::bad_conversion),
        help("Conversion parameters are a single character, eg: {{name!p}}")
    )]
    BadConversion { key: String, conv: String },

    /// Implicit keys are wrapped in braces, so may not contain any
    #[error("Implicit key {0:?} already contains braces")]
    #[diagnostic(
        code(dkey::implicit_with_braces),
        help("Drop the implicit flag, or remove the braces")
    )]
    ImplicitWithBraces(String),

    /// Implicit keys can only ever be a single key
    #[error("Implicit key {0:?} cannot be a multi key")]
    #[diagnostic(code(dkey::implicit_multi))]
    ImplicitMulti(String),

    /// No key class can represent the requested combination
    #[error("Cannot build a {mark} key (multi: {multi}) from {text:?}")]
    #[diagnostic(code(dkey::unsupported_key))]
    UnsupportedKey {
        text: String,
        mark: Mark,
        multi: bool,
    },

    /// Non-keys never look anything up, so cannot fall back
    #[error("Non-key {0:?} cannot have a fallback other than itself")]
    #[diagnostic(code(dkey::null_fallback))]
    NullFallback(String),

    /// A key expanded back into itself with no recursion limit
    #[error("Recursive expansion of {key:?} through {}", .chain.join(" -> "))]
    #[diagnostic(
        code(dkey::recursion),
        help("Set a limit on the key, or break the cycle in the sources")
    )]
    Recursion { key: String, chain: Vec<String> },

    /// The internal recursion guard was exceeded
    #[error("Expansion of {key:?} exceeded the recursion guard of {depth}")]
    #[diagnostic(code(dkey::recursion_limit))]
    RecursionLimit { key: String, depth: usize },

    /// The expanded value failed the key's type check
    #[error("Key {key:?} expanded to a {found}, expected {expected}")]
    #[diagnostic(code(dkey::type_mismatch))]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// A value could not be coerced into the key's expansion type
    #[error("Key {key:?} could not convert {value:?} to {target}")]
    #[diagnostic(code(dkey::conversion))]
    Conversion {
        key: String,
        value: String,
        target: String,
    },

    /// Code reference has not been registered
    #[error("No code registered for {0:?}")]
    #[diagnostic(
        code(dkey::code_not_found),
        help("Register the target with dkey::register_code before expanding")
    )]
    CodeNotFound(String),

    /// index_of / rindex_of found nothing
    #[error("{needle} not found in {text:?}")]
    #[diagnostic(code(dkey::not_found))]
    NotFound { needle: String, text: String },

    /// No .dkey.yaml found in directory tree
    #[error("No .dkey.yaml found in {0:?} or any parent directory")]
    #[diagnostic(
        code(dkey::not_found_in_tree),
        help("Create a .dkey.yaml file with 'dkey init' or specify a path with -f")
    )]
    NotFoundInTree(PathBuf),

    /// .dkey.yaml not found at specified path
    #[error(".dkey.yaml not found at {0:?}")]
    #[diagnostic(code(dkey::not_found_at_path))]
    NotFoundAtPath(PathBuf),

    /// Invalid YAML in source file
    #[error("Invalid .dkey.yaml file: {error}")]
    #[diagnostic(
        code(dkey::invalid_yaml),
        help("Check YAML syntax and ensure 'api: dkey/v0' is present")
    )]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(dkey::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Include file not found
    #[error("Include file not found: {path:?}")]
    #[diagnostic(
        code(dkey::include_not_found),
        help("Check that the include path is correct and the file exists")
    )]
    IncludeNotFound {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Circular include detected
    #[error("Circular include detected: {0:?}")]
    #[diagnostic(
        code(dkey::circular_include),
        help("Remove the circular reference in your includes")
    )]
    CircularInclude(PathBuf),

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(dkey::validation_failed))]
    ValidationFailed(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(dkey::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the errors that a fallback can never paper over.
    pub fn is_fatal_expansion(&self) -> bool {
        matches!(
            self,
            Self::Recursion { .. } | Self::RecursionLimit { .. } | Self::TypeMismatch { .. }
        )
    }
}
