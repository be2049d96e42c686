// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Tokenizing of key templates into [`RawKey`] quads.
//!
//! Two styles are recognized:
//!
//! - format-string style, where `{name:fmt!conv}` fragments are pulled
//!   out of surrounding literal text (see [`parse_template`]);
//! - bare key names such as `<1>name`, `--name=`, handled by [`KeyName`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./rawkey_test.rs"]
mod rawkey_test;

/// Suffix marking a key as indirect.
pub const INDIRECT_SUFFIX: char = '_';

static KEY_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:<(?P<pos>\d*)>|(?P<prefix>\W+))?(?P<name>.+?)(?P<assign>=)?$")
        .expect("key name pattern is valid")
});

/// One parsed piece of a template: literal text followed by an optional key.
///
/// A `RawKey` with an empty `key` is pure literal text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawKey {
    pub prefix: String,
    pub key: String,
    pub format: String,
    pub conv: String,
}

impl RawKey {
    pub fn literal<S: Into<String>>(text: S) -> Self {
        Self {
            prefix: text.into(),
            ..Default::default()
        }
    }

    pub fn is_literal(&self) -> bool {
        self.key.is_empty()
    }

    /// Rebuild the `key:format!conv` form.
    pub fn joined(&self) -> String {
        let mut out = self.key.clone();
        if !self.format.is_empty() {
            out.push(':');
            out.push_str(&self.format);
        }
        if !self.conv.is_empty() {
            out.push('!');
            out.push_str(&self.conv);
        }
        out
    }

    pub fn wrapped(&self) -> String {
        format!("{{{}}}", self.key)
    }

    pub fn is_indirect(&self) -> bool {
        self.key.ends_with(INDIRECT_SUFFIX)
    }

    /// The key name with any indirect suffix removed.
    pub fn direct(&self) -> &str {
        direct_name(&self.key)
    }

    /// The key name with the indirect suffix applied.
    pub fn indirect(&self) -> String {
        indirect_name(&self.key)
    }

    /// The literal prefix with braces escaped, plus an empty slot for the key.
    pub fn anon(&self) -> String {
        let mut out = escape_braces(&self.prefix);
        if !self.is_literal() {
            out.push_str("{}");
        }
        out
    }
}

pub fn direct_name(name: &str) -> &str {
    name.strip_suffix(INDIRECT_SUFFIX).unwrap_or(name)
}

pub fn indirect_name(name: &str) -> String {
    if name.ends_with(INDIRECT_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{INDIRECT_SUFFIX}")
    }
}

pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Split a template into its literal and key pieces.
///
/// Doubled braces are literal braces. An empty `{}` is kept as literal text.
pub fn parse_template(text: &str) -> Result<Vec<RawKey>> {
    let malformed = |reason: &str| Error::MalformedTemplate {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let mut out = Vec::new();
    let mut prefix = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|(_, n)| *n == '{') => {
                chars.next();
                prefix.push('{');
            }
            '{' => {
                let mut end = None;
                for (i, n) in chars.by_ref() {
                    match n {
                        '}' => {
                            end = Some(i);
                            break;
                        }
                        '{' => return Err(malformed("nested fields are not supported")),
                        _ => {}
                    }
                }
                let Some(end) = end else {
                    return Err(malformed("unclosed '{'"));
                };
                let field = &text[start + 1..end];
                if field.is_empty() {
                    prefix.push_str("{}");
                    continue;
                }
                let (key, format, conv) = split_field(field);
                if key.is_empty() {
                    return Err(malformed("empty key name"));
                }
                out.push(RawKey {
                    prefix: std::mem::take(&mut prefix),
                    key: key.to_string(),
                    format: format.to_string(),
                    conv: conv.to_string(),
                });
            }
            '}' if chars.peek().is_some_and(|(_, n)| *n == '}') => {
                chars.next();
                prefix.push('}');
            }
            '}' => return Err(malformed("single '}' encountered")),
            _ => prefix.push(c),
        }
    }

    if !prefix.is_empty() {
        out.push(RawKey::literal(prefix));
    }
    Ok(out)
}

/// Split `name!conv:fmt` or `name:fmt!conv` into its parts.
fn split_field(field: &str) -> (&str, &str, &str) {
    let Some(split) = field.find(['!', ':']) else {
        return (field, "", "");
    };
    let (key, rest) = field.split_at(split);
    if let Some(conv) = rest.strip_prefix('!') {
        match conv.split_once(':') {
            Some((conv, format)) => (key, format, conv),
            None => (key, "", conv),
        }
    } else {
        let format = &rest[1..];
        match format.rsplit_once('!') {
            Some((format, conv)) => (key, format, conv),
            None => (key, format, ""),
        }
    }
}

/// A bare key name, as written for params: `<1>name`, `-name`, `--name=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyName {
    /// Set for `<N>name` forms. `Some(None)` is the bare `<>` form.
    pub position: Option<Option<usize>>,
    pub prefix: Option<String>,
    pub name: String,
    pub assign: bool,
}

impl KeyName {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = KEY_NAME_RE.captures(text)?;
        let position = caps
            .name("pos")
            .map(|m| m.as_str().parse::<usize>().ok());
        Some(Self {
            position,
            prefix: caps.name("prefix").map(|m| m.as_str().to_string()),
            name: caps.name("name")?.as_str().to_string(),
            assign: caps.name("assign").is_some(),
        })
    }

    pub fn is_plain(&self) -> bool {
        self.position.is_none() && self.prefix.is_none() && !self.assign
    }
}

/// Substitute rendered values into an anonymized template.
///
/// `{}` slots are filled positionally and doubled braces unescaped.
pub fn fill_template(anon: &str, values: &[String]) -> Result<String> {
    let mut out = String::with_capacity(anon.len());
    let mut values = values.iter();
    let mut chars = anon.chars().peekable();
    let malformed = |reason: &str| Error::MalformedTemplate {
        text: anon.to_string(),
        reason: reason.to_string(),
    };

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                let value = values
                    .next()
                    .ok_or_else(|| malformed("more slots than values"))?;
                out.push_str(value);
            }
            ('{' | '}', _) => return Err(malformed("stray brace in template")),
            _ => out.push(c),
        }
    }
    Ok(out)
}
