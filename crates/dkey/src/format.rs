// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Format parameters (`{name:fmt}`) applied when joining multi-key values.

use crate::value::Value;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./format_test.rs"]
mod format_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Left),
            '>' => Some(Self::Right),
            '^' => Some(Self::Center),
            _ => None,
        }
    }
}

/// Parsed `[[fill]align][0][width][.precision][type]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub zero: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            zero: false,
            width: None,
            precision: None,
            kind: None,
        }
    }
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut out = Self::default();
        let chars: Vec<char> = spec.chars().collect();
        let mut pos = 0;

        let malformed = |reason: &str| Error::MalformedFormat {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        match (chars.first(), chars.get(1)) {
            (Some(fill), Some(next)) if Align::from_char(*next).is_some() => {
                out.fill = *fill;
                out.align = Align::from_char(*next);
                pos = 2;
            }
            (Some(first), _) if Align::from_char(*first).is_some() => {
                out.align = Align::from_char(*first);
                pos = 1;
            }
            _ => {}
        }

        if chars.get(pos) == Some(&'0') {
            out.zero = true;
            pos += 1;
        }

        let width_start = pos;
        while chars.get(pos).is_some_and(char::is_ascii_digit) {
            pos += 1;
        }
        if pos > width_start {
            let digits: String = chars[width_start..pos].iter().collect();
            out.width = Some(digits.parse().map_err(|_| malformed("width is too large"))?);
        }

        if chars.get(pos) == Some(&'.') {
            pos += 1;
            let start = pos;
            while chars.get(pos).is_some_and(char::is_ascii_digit) {
                pos += 1;
            }
            if pos == start {
                return Err(malformed("precision has no digits"));
            }
            let digits: String = chars[start..pos].iter().collect();
            out.precision = Some(digits.parse().map_err(|_| malformed("precision is too large"))?);
        }

        match chars.get(pos) {
            None => {}
            Some(c @ ('s' | 'd' | 'f')) if pos + 1 == chars.len() => out.kind = Some(*c),
            Some(c) => return Err(malformed(&format!("unexpected {c:?}"))),
        }
        Ok(out)
    }

    /// Render a value according to this spec.
    pub fn apply(&self, value: &Value) -> String {
        let numeric = matches!(value, Value::Int(_) | Value::Float(_));
        let body = match (value, self.kind, self.precision) {
            (Value::Float(x), _, Some(p)) => format!("{x:.p$}"),
            (Value::Int(i), Some('f'), p) => format!("{:.*}", p.unwrap_or(6), *i as f64),
            (Value::Float(x), Some('f'), None) => format!("{x:.6}"),
            (Value::Float(x), Some('d'), _) => format!("{}", x.trunc() as i64),
            (_, _, Some(p)) if !numeric => value.to_string().chars().take(p).collect(),
            _ => value.to_string(),
        };

        let Some(width) = self.width else {
            return body;
        };
        let len = body.chars().count();
        if len >= width {
            return body;
        }
        let pad = width - len;

        if self.zero && numeric && self.align.is_none() {
            let (sign, digits) = match body.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", body.as_str()),
            };
            return format!("{sign}{}{digits}", "0".repeat(pad));
        }

        let fill = if self.zero && self.align.is_none() { '0' } else { self.fill };
        let fill_str = |n: usize| std::iter::repeat_n(fill, n).collect::<String>();
        let align = self
            .align
            .unwrap_or(if numeric { Align::Right } else { Align::Left });
        match align {
            Align::Left => format!("{body}{}", fill_str(pad)),
            Align::Right => format!("{}{body}", fill_str(pad)),
            Align::Center => {
                let left = pad / 2;
                format!("{}{body}{}", fill_str(left), fill_str(pad - left))
            }
        }
    }
}
