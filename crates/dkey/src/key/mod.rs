// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Expandable keys.
//!
//! A [`DKey`] is built by [`KeyBuilder`], which inspects the input for
//! `{...}` fragments and picks one of the registered key classes:
//!
//! - plain text with no fragments is a null key, it expands to itself;
//! - a single `{name}` fragment is a single key, `{name_}` an indirect one;
//! - anything else is a multi key that joins its sub-keys into a template.
//!
//! ```
//! use std::collections::HashMap;
//! use dkey::{DKey, Value};
//!
//! let key = DKey::new("{a}/{b}").unwrap();
//! let values = HashMap::from([("a", "x"), ("b", "y")]);
//! assert_eq!(key.expand(&[&values]).unwrap(), Some(Value::from("x/y")));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::expander::{self, ExpandOptions};
use crate::getter::Source;
use crate::rawkey::{direct_name, indirect_name, INDIRECT_SUFFIX};
use crate::value::{TypeCheck, Value};
use crate::Result;

mod builder;
mod ctor;
pub mod hooks;
pub mod registry;

pub use builder::{KeyBuilder, KeyInput};
pub use ctor::{resolve_path, Ctor, CtorFn};
pub use hooks::{ExpansionHooks, LookupPlan, LookupTarget};
pub use registry::{Conversion, KeyClass};


/// The kind of a key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mark {
    Free,
    Path,
    Indirect,
    Str,
    Code,
    Args,
    Kwargs,
    Postbox,
    Null,
    Multi,
}

impl Mark {
    /// Marks that only ever describe a whole template.
    pub fn is_template_only(&self) -> bool {
        matches!(self, Self::Null | Self::Multi)
    }
}

/// What to produce when expansion finds nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    Value(Value),
    /// The unexpanded key itself.
    Itself,
}

/// Expansion metadata carried by every key.
#[derive(Debug, Clone)]
pub struct KeyMeta {
    pub mark: Mark,
    pub ctor: Ctor,
    pub check: Option<TypeCheck>,
    pub fallback: Option<Fallback>,
    pub fmt: String,
    pub conv: Option<char>,
    pub max_exp: Option<i32>,
    pub help: Option<String>,
}

#[derive(Debug)]
pub(crate) struct MultiParts {
    pub subkeys: Vec<DKey>,
    pub anon: String,
    pub has_literal: bool,
}

struct KeyInner {
    text: String,
    class: &'static KeyClass,
    meta: KeyMeta,
    multi: Option<MultiParts>,
}

/// An immutable, cheaply cloned key.
#[derive(Clone)]
pub struct DKey(Arc<KeyInner>);

impl DKey {
    pub(crate) fn from_parts(
        text: String,
        class: &'static KeyClass,
        meta: KeyMeta,
        multi: Option<MultiParts>,
    ) -> Self {
        Self(Arc::new(KeyInner {
            text,
            class,
            meta,
            multi,
        }))
    }

    /// Start building a key from text, a path or another key.
    pub fn builder<I: Into<KeyInput>>(input: I) -> KeyBuilder {
        KeyBuilder::new(input)
    }

    /// Build a key from a template such as `{name}` or `{a}/{b}`.
    pub fn new<I: Into<KeyInput>>(input: I) -> Result<Self> {
        Self::builder(input).build()
    }

    /// Build a single key from a bare name, eg: `name` means `{name}`.
    pub fn implicit<I: Into<KeyInput>>(input: I) -> Result<Self> {
        Self::builder(input).implicit().build()
    }

    /// The key text: the bare name of a single key, the template of a multi key.
    pub fn as_str(&self) -> &str {
        &self.0.text
    }

    pub fn mark(&self) -> Mark {
        self.0.meta.mark
    }

    pub fn class(&self) -> &'static KeyClass {
        self.0.class
    }

    /// The registered class name, eg: `PathDKey`.
    pub fn class_name(&self) -> &'static str {
        self.0.class.name
    }

    pub(crate) fn hooks(&self) -> &'static dyn ExpansionHooks {
        self.0.class.hooks
    }

    pub fn meta(&self) -> &KeyMeta {
        &self.0.meta
    }

    pub fn is_multi(&self) -> bool {
        self.0.multi.is_some()
    }

    pub fn is_null(&self) -> bool {
        self.0.meta.mark == Mark::Null
    }

    pub fn is_indirect(&self) -> bool {
        !self.is_multi() && self.0.text.ends_with(INDIRECT_SUFFIX)
    }

    pub(crate) fn multi_parts(&self) -> Option<&MultiParts> {
        self.0.multi.as_ref()
    }

    /// Sub-keys of a multi key, empty for any other key.
    pub fn subkeys(&self) -> &[DKey] {
        self.0
            .multi
            .as_ref()
            .map(|m| m.subkeys.as_slice())
            .unwrap_or_default()
    }

    /// The template with sub-keys replaced by empty `{}` slots.
    pub fn anon(&self) -> Option<&str> {
        self.0.multi.as_ref().map(|m| m.anon.as_str())
    }

    pub fn ctor(&self) -> &Ctor {
        &self.0.meta.ctor
    }

    pub fn typecheck(&self) -> Option<&TypeCheck> {
        self.0.meta.check.as_ref()
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        self.0.meta.fallback.as_ref()
    }

    /// The stored fallback as a value.
    pub(crate) fn fallback_value(&self) -> Option<Value> {
        match self.0.meta.fallback.as_ref()? {
            Fallback::Value(v) => Some(v.clone()),
            Fallback::Itself => Some(Value::Key(self.clone())),
        }
    }

    pub fn fmt_params(&self) -> &str {
        &self.0.meta.fmt
    }

    pub fn conv_params(&self) -> Option<char> {
        self.0.meta.conv
    }

    pub fn max_expansions(&self) -> Option<i32> {
        self.0.meta.max_exp
    }

    pub fn help(&self) -> Option<&str> {
        self.0.meta.help.as_deref()
    }

    /// The key name with any indirect suffix removed.
    pub fn direct(&self) -> &str {
        if self.is_multi() {
            return self.as_str();
        }
        direct_name(self.as_str())
    }

    /// The key name with the indirect suffix applied.
    pub fn indirect(&self) -> String {
        if self.is_multi() {
            return self.as_str().to_string();
        }
        indirect_name(self.as_str())
    }

    /// The key as it would appear in a template, eg: `{name}`.
    pub fn wrapped(&self) -> String {
        match self.mark() {
            Mark::Null => self.as_str().to_string(),
            _ if self.is_multi() => self.as_str().to_string(),
            _ => format!("{{{}}}", self.as_str()),
        }
    }

    /// The wrapped form including any inline format and conversion.
    pub fn template(&self) -> String {
        if self.is_multi() || self.is_null() {
            return self.as_str().to_string();
        }
        let mut out = format!("{{{}", self.as_str());
        if !self.fmt_params().is_empty() {
            out.push(':');
            out.push_str(self.fmt_params());
        }
        if let Some(conv) = self.conv_params() {
            out.push('!');
            out.push(conv);
        }
        out.push('}');
        out
    }

    /// Render with format flags: `w` wraps in braces, `i` and `d`
    /// force the indirect or direct name.
    pub fn format_with(&self, spec: &str) -> String {
        if self.is_multi() || self.is_null() {
            return self.as_str().to_string();
        }
        let name = if spec.contains('i') {
            self.indirect()
        } else if spec.contains('d') {
            self.direct().to_string()
        } else {
            self.as_str().to_string()
        };
        if spec.contains('w') {
            format!("{{{name}}}")
        } else {
            name
        }
    }

    /// True when both handles share the same underlying key.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Expand against `sources`, in priority order.
    ///
    /// `Ok(None)` is a miss with no fallback. Errors are reserved for
    /// conditions a fallback must not hide, such as unbounded recursion
    /// or a failed type check.
    pub fn expand(&self, sources: &[&dyn Source]) -> Result<Option<Value>> {
        expander::expand(self, sources, ExpandOptions::default())
    }

    pub fn expand_with(&self, sources: &[&dyn Source], opts: ExpandOptions) -> Result<Option<Value>> {
        expander::expand(self, sources, opts)
    }

    /// Resolve one step of indirection without expanding the result.
    ///
    /// With `multi`, the target may resolve to a list of keys.
    pub fn redirect(&self, sources: &[&dyn Source], multi: bool) -> Result<Vec<DKey>> {
        expander::redirect(self, sources, multi)
    }
}

impl fmt::Debug for DKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DKey")
            .field("text", &self.0.text)
            .field("class", &self.0.class.name)
            .field("mark", &self.0.meta.mark)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.text)
    }
}

impl PartialEq for DKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.text == other.0.text
    }
}

impl Eq for DKey {}

impl PartialEq<str> for DKey {
    fn eq(&self, other: &str) -> bool {
        self.0.text == other
    }
}

impl PartialEq<&str> for DKey {
    fn eq(&self, other: &&str) -> bool {
        self.0.text == *other
    }
}

impl Hash for DKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.text.hash(state);
    }
}

impl AsRef<str> for DKey {
    fn as_ref(&self) -> &str {
        &self.0.text
    }
}
