// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The key factory.

use std::path::{Path, PathBuf};

use super::registry::{self, KeyClass};
use super::{Ctor, DKey, Fallback, KeyMeta, Mark, MultiParts};
use crate::format::FormatSpec;
use crate::rawkey::{parse_template, KeyName, RawKey};
use crate::value::{TypeCheck, Value};
use crate::{Error, Result};

/// Anything a key can be built from.
#[derive(Debug, Clone)]
pub enum KeyInput {
    Text(String),
    Path(PathBuf),
    Key(DKey),
}

impl From<&str> for KeyInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for KeyInput {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<PathBuf> for KeyInput {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for KeyInput {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<DKey> for KeyInput {
    fn from(value: DKey) -> Self {
        Self::Key(value)
    }
}

impl From<&DKey> for KeyInput {
    fn from(value: &DKey) -> Self {
        Self::Key(value.clone())
    }
}

/// Construction options for a [`DKey`].
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    input: KeyInput,
    implicit: bool,
    mark: Option<Mark>,
    conv: Option<String>,
    fmt: Option<String>,
    check: Option<TypeCheck>,
    ctor: Option<Ctor>,
    fallback: Option<Fallback>,
    max_exp: Option<i32>,
    help: Option<String>,
    force: bool,
}

impl KeyBuilder {
    pub fn new<I: Into<KeyInput>>(input: I) -> Self {
        Self {
            input: input.into(),
            implicit: false,
            mark: None,
            conv: None,
            fmt: None,
            check: None,
            ctor: None,
            fallback: None,
            max_exp: None,
            help: None,
            force: false,
        }
    }

    /// Treat the whole input as one bare key name.
    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.mark = Some(mark);
        self
    }

    /// Conversion parameter, overriding any inline `!conv`.
    pub fn conv<S: Into<String>>(mut self, conv: S) -> Self {
        self.conv = Some(conv.into());
        self
    }

    /// Format parameters, overriding any inline `:fmt`.
    pub fn fmt<S: Into<String>>(mut self, fmt: S) -> Self {
        self.fmt = Some(fmt.into());
        self
    }

    pub fn check<C: Into<TypeCheck>>(mut self, check: C) -> Self {
        self.check = Some(check.into());
        self
    }

    pub fn ctor(mut self, ctor: Ctor) -> Self {
        self.ctor = Some(ctor);
        self
    }

    pub fn fallback<V: Into<Value>>(mut self, fallback: V) -> Self {
        self.fallback = Some(Fallback::Value(fallback.into()));
        self
    }

    /// Fall back to the unexpanded key.
    pub fn fallback_self(mut self) -> Self {
        self.fallback = Some(Fallback::Itself);
        self
    }

    pub fn max_exp(mut self, max_exp: i32) -> Self {
        self.max_exp = Some(max_exp);
        self
    }

    pub fn help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Skip template parsing and build a single key of the requested
    /// mark straight from the input text.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    fn has_overrides(&self, key: &DKey) -> bool {
        self.mark.is_some_and(|m| m != key.mark())
            || self.conv.is_some()
            || self.fmt.is_some()
            || self.check.is_some()
            || self.ctor.is_some()
            || self.fallback.is_some()
            || self.max_exp.is_some()
            || self.help.is_some()
            || self.force
    }

    pub fn build(self) -> Result<DKey> {
        let (text, inherited) = match &self.input {
            KeyInput::Key(key) if !self.has_overrides(key) => return Ok(key.clone()),
            KeyInput::Key(key) => (key.template(), Some(key.meta().clone())),
            KeyInput::Text(text) => (text.clone(), None),
            KeyInput::Path(path) => (path.to_string_lossy().into_owned(), None),
        };
        let mut opts = self;
        if let Some(meta) = inherited {
            opts.inherit(meta);
        }

        if opts.force {
            let mark = opts.mark.unwrap_or(Mark::Free);
            let conv = opts.conv.as_deref().unwrap_or_default();
            let conv = single_conv(&text, conv)?;
            let fmt = opts.fmt.clone().unwrap_or_default();
            return opts.single(&text, fmt, conv, registry::single_class(mark), mark);
        }

        if opts.implicit {
            if text.contains(['{', '}']) {
                return Err(Error::ImplicitWithBraces(text));
            }
            return opts.build_implicit(&text);
        }

        let raws = parse_template(&text)?;
        let key_count = raws.iter().filter(|r| !r.is_literal()).count();
        let marked_single = opts.mark.is_some_and(|m| !m.is_template_only());

        match (key_count, raws.as_slice()) {
            (0, _) if marked_single && !text.is_empty() && !text.contains(['{', '}']) => {
                opts.build_implicit(&text)
            }
            (0, _) => opts.build_null(text),
            (1, [raw]) if raw.prefix.is_empty() && opts.mark != Some(Mark::Multi) => {
                opts.build_single(raw)
            }
            _ => opts.build_multi(text, &raws),
        }
    }

    /// Options already carried by a key being re-marked.
    fn inherit(&mut self, meta: KeyMeta) {
        self.check = self.check.take().or(meta.check);
        self.fallback = self.fallback.take().or(meta.fallback);
        self.max_exp = self.max_exp.or(meta.max_exp);
        self.help = self.help.take().or(meta.help);
        if self.ctor.is_none() && self.mark.is_none() {
            self.ctor = Some(meta.ctor);
        }
    }

    fn build_implicit(self, text: &str) -> Result<DKey> {
        if self.mark == Some(Mark::Multi) {
            return Err(Error::ImplicitMulti(text.to_string()));
        }
        if KeyName::parse(text).is_none() {
            return Err(Error::MalformedTemplate {
                text: text.to_string(),
                reason: "empty key name".to_string(),
            });
        }
        let raws = parse_template(&format!("{{{text}}}"))?;
        match raws.as_slice() {
            [raw] => self.build_single(raw),
            _ => Err(Error::ImplicitMulti(text.to_string())),
        }
    }

    fn build_null(self, text: String) -> Result<DKey> {
        if let Some(mark) = self.mark.filter(|m| *m != Mark::Null) {
            return Err(Error::UnsupportedKey {
                text,
                mark,
                multi: mark == Mark::Multi,
            });
        }
        if matches!(self.fallback, Some(Fallback::Value(_))) {
            return Err(Error::NullFallback(text));
        }
        let meta = KeyMeta {
            mark: Mark::Null,
            ctor: Ctor::Identity,
            check: None,
            fallback: self.fallback,
            fmt: String::new(),
            conv: None,
            max_exp: None,
            help: self.help,
        };
        Ok(DKey::from_parts(
            text,
            registry::single_class(Mark::Null),
            meta,
            None,
        ))
    }

    fn build_single(self, raw: &RawKey) -> Result<DKey> {
        let conv = self.conv.as_deref().unwrap_or(&raw.conv);
        let conv = single_conv(&raw.key, conv)?;
        let mark = match self.mark {
            Some(Mark::Null) => {
                return Err(Error::UnsupportedKey {
                    text: raw.wrapped(),
                    mark: Mark::Null,
                    multi: false,
                });
            }
            Some(mark) => mark,
            None => conv
                .and_then(registry::conversion)
                .and_then(|c| c.mark)
                .unwrap_or(if raw.is_indirect() {
                    Mark::Indirect
                } else {
                    Mark::Free
                }),
        };
        let fmt = self.fmt.clone().unwrap_or_else(|| raw.format.clone());
        self.single(&raw.key, fmt, conv, registry::single_class(mark), mark)
    }

    fn single(
        self,
        name: &str,
        fmt: String,
        conv: Option<char>,
        class: &'static KeyClass,
        mark: Mark,
    ) -> Result<DKey> {
        if !fmt.is_empty() {
            FormatSpec::parse(&fmt)?;
        }
        let meta = KeyMeta {
            mark,
            ctor: self.ctor.unwrap_or_else(|| class.ctor.clone()),
            check: self.check,
            fallback: self.fallback,
            fmt,
            conv,
            max_exp: self.max_exp,
            help: self.help,
        };
        tracing::trace!(key = name, class = class.name, "built key");
        Ok(DKey::from_parts(name.to_string(), class, meta, None))
    }

    fn build_multi(self, text: String, raws: &[RawKey]) -> Result<DKey> {
        let mark = match self.mark {
            None | Some(Mark::Multi) => Mark::Multi,
            Some(mark) if registry::has_class(mark, true) => mark,
            Some(mark) => {
                return Err(Error::UnsupportedKey {
                    text,
                    mark,
                    multi: true,
                });
            }
        };
        let class = registry::multi_class(mark);

        let subkeys = raws
            .iter()
            .filter(|r| !r.is_literal())
            .map(|r| KeyBuilder::new(r.wrapped()).build_single(r))
            .collect::<Result<Vec<_>>>()?;
        let anon: String = raws.iter().map(RawKey::anon).collect();
        let has_literal = raws.iter().any(|r| !r.prefix.is_empty());

        let conv = match &self.conv {
            Some(conv) => single_conv(&text, conv)?,
            None => None,
        };
        let fmt = self.fmt.unwrap_or_default();
        if !fmt.is_empty() {
            FormatSpec::parse(&fmt)?;
        }
        let meta = KeyMeta {
            mark,
            ctor: self.ctor.unwrap_or_else(|| class.ctor.clone()),
            check: self.check,
            fallback: self.fallback,
            fmt,
            conv,
            max_exp: self.max_exp,
            help: self.help,
        };
        tracing::trace!(key = %text, subkeys = subkeys.len(), "built multi key");
        Ok(DKey::from_parts(
            text,
            class,
            meta,
            Some(MultiParts {
                subkeys,
                anon,
                has_literal,
            }),
        ))
    }
}

/// Conversion parameters are at most one character.
fn single_conv(key: &str, conv: &str) -> Result<Option<char>> {
    let mut chars = conv.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ => Err(Error::BadConversion {
            key: key.to_string(),
            conv: conv.to_string(),
        }),
    }
}
