// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Tree-like derivation of structured strings.
//!
//! An empty word in the final section acts as a boundary between
//! generations: `a::b` pushed with `c` becomes `a::b..c`, and popping
//! that cuts back at the boundary.

use uuid::Uuid;

use super::process::uuid_token;
use super::section::{StrangFormat, StrangMark, WordMeta};
use super::Strang;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./derive_test.rs"]
mod derive_test;

/// A value that can be pushed onto the final section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushValue {
    Word(String),
    Int(i64),
    Mark(StrangMark),
    /// An exact uuid, or `None` for a freshly generated one.
    Uuid(Option<Uuid>),
}

impl PushValue {
    fn render(&self) -> String {
        match self {
            Self::Word(w) => w.clone(),
            Self::Int(i) => i.to_string(),
            Self::Mark(m) => m.text().to_string(),
            Self::Uuid(Some(u)) => uuid_token(u),
            Self::Uuid(None) => "<uuid>".to_string(),
        }
    }
}

impl From<&str> for PushValue {
    fn from(value: &str) -> Self {
        Self::Word(value.to_string())
    }
}

impl From<String> for PushValue {
    fn from(value: String) -> Self {
        Self::Word(value)
    }
}

impl From<i64> for PushValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<StrangMark> for PushValue {
    fn from(value: StrangMark) -> Self {
        Self::Mark(value)
    }
}

impl From<Uuid> for PushValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(Some(value))
    }
}

impl<F: StrangFormat> Strang<F> {
    fn final_section(&self) -> usize {
        self.section_count().saturating_sub(1)
    }

    /// Append words to the final section, after a boundary.
    pub fn push<I, V>(&self, vals: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<PushValue>,
    {
        let sections = F::sections();
        let Some(last) = sections.last() else {
            return Ok(self.clone());
        };
        let case = last.case;

        let mut text = self.text.clone();
        let tail_is_boundary = self
            .word(self.final_section(), -1)
            .is_none_or(str::is_empty);
        if !tail_is_boundary {
            text.push_str(case);
        }

        for val in vals {
            let val = val.into();
            let word = val.render();
            // uuid tokens are lifted out whole before sections are split
            let is_uuid = matches!(val, PushValue::Uuid(_));
            let separators = std::iter::once(case).chain(sections.iter().filter_map(|s| s.end));
            for sep in separators {
                if !is_uuid && !sep.is_empty() && word.contains(sep) {
                    return Err(Error::SeparatorInWord {
                        word,
                        separator: sep.to_string(),
                    });
                }
            }
            text.push_str(case);
            text.push_str(&word);
        }
        Self::new(text)
    }

    /// Byte offsets of the boundary words in the final section.
    fn boundaries(&self) -> Vec<usize> {
        let sec = self.final_section();
        let Some(words) = self.layout.slices.get(sec) else {
            return Vec::new();
        };
        let count = words.len();
        words
            .iter()
            .enumerate()
            .filter(|(i, r)| r.is_empty() && i + 1 < count)
            .map(|(_, r)| r.start)
            .collect()
    }

    /// Cut back to the nearest boundary, or the first one with `top`.
    ///
    /// A string with no boundary is returned unchanged.
    pub fn pop(&self, top: bool) -> Result<Self> {
        let bounds = self.boundaries();
        let cut = if top { bounds.first() } else { bounds.last() };
        match cut {
            Some(at) => Self::new(&self.text[..*at]),
            None => Ok(self.clone()),
        }
    }

    /// Give this string a unique identity with a generation mark and uuid.
    ///
    /// Strings that already carry a uuid are returned as they are.
    pub fn to_uniq(&self, suffix: &[&str]) -> Result<Self> {
        if self.uuid.is_some() {
            return Ok(self.clone());
        }
        let mut vals = vec![PushValue::Mark(StrangMark::Gen), PushValue::Uuid(None)];
        vals.extend(suffix.iter().map(|w| PushValue::from(*w)));
        self.push(vals)
    }

    /// Cut back to just before the first generation mark or uuid word.
    pub fn de_uniq(&self) -> Result<Self> {
        let sec = self.final_section();
        let found = self.meta.get(sec).and_then(|meta| {
            meta.iter()
                .position(|m| matches!(m, WordMeta::Uuid(_) | WordMeta::Mark(StrangMark::Gen)))
        });
        match found {
            Some(idx) => {
                let at = self.layout.slices[sec][idx].start;
                Self::new(&self.text[..at])
            }
            None => Ok(self.clone()),
        }
    }

    /// The structural identity: no uuid words and no generation marks.
    pub fn canon(&self) -> Result<Self> {
        let sections = F::sections();
        let mut text = String::with_capacity(self.text.len());
        for (i, sec) in sections.iter().enumerate().take(self.section_count()) {
            let kept: Vec<&str> = self.layout.slices[i]
                .iter()
                .zip(&self.meta[i])
                .filter(|(_, m)| !matches!(m, WordMeta::Uuid(_) | WordMeta::Mark(StrangMark::Gen)))
                .map(|(r, _)| &self.text[r.clone()])
                .collect();
            text.push_str(&kept.join(sec.case));
            if i + 1 < self.section_count() {
                text.push_str(sec.end.unwrap_or_default());
            }
        }
        Self::new(text)
    }
}
