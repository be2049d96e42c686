// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Structured strings: text with a parsed `group::body` layout.
//!
//! A [`Strang`] is built once through three phases (pre-process,
//! process, post-process) and is immutable afterwards. Derivations such
//! as [`Strang::push`] always build a new value.
//!
//! ```
//! use dkey::Strang;
//!
//! let s: Strang = "a.b.c::d.e.f".parse().unwrap();
//! assert_eq!(&s[(0, 1)], "b");
//! assert_eq!(&s[(1, -1)], "f");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Bound, Deref, Index, Range, RangeBounds};
use std::str::FromStr;

use uuid::Uuid;

use crate::{Error, Result};

mod code_ref;
mod derive;
pub mod process;
mod section;

pub use code_ref::{
    registered_code,
    register_code,
    unregister_code,
    Code,
    CodeFn,
    CodeRefFormat,
    CodeReference,
};
pub use derive::PushValue;
pub use process::{Decoded, Layout, PreProcessed};
pub use section::{Basic, SectionSpec, StrangFormat, StrangMark, WordKinds, WordMeta};


/// Selects a section by position or by declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for SectionRef<'_> {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// Integer literals default to `i32`. Negative values never match a section.
impl From<i32> for SectionRef<'_> {
    fn from(value: i32) -> Self {
        Self::Index(usize::try_from(value).unwrap_or(usize::MAX))
    }
}

impl<'a> From<&'a str> for SectionRef<'a> {
    fn from(value: &'a str) -> Self {
        Self::Name(value)
    }
}

impl fmt::Display for SectionRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

/// The decoded value of a word, as returned by [`Strang::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordValue<'a> {
    Text(&'a str),
    Int(i64),
    Uuid(Uuid),
    Mark(StrangMark),
}

/// Something to search for with [`Strang::index_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Needle<'a> {
    Str(&'a str),
    Word(SectionRef<'a>, isize),
    Mark(StrangMark),
    Uuid,
}

impl fmt::Display for Needle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Word(sec, idx) => write!(f, "word ({sec}, {idx})"),
            Self::Mark(m) => write!(f, "mark {m}"),
            Self::Uuid => f.write_str("uuid"),
        }
    }
}

/// A string with structural metadata for its sections and words.
#[derive(Debug, Clone)]
pub struct Strang<F: StrangFormat = Basic> {
    text: String,
    layout: Layout,
    meta: Vec<Vec<WordMeta>>,
    uuid: Option<Uuid>,
    format: PhantomData<F>,
}

impl<F: StrangFormat> Strang<F> {
    /// Parse `text` into a structured string.
    pub fn new<S: AsRef<str>>(text: S) -> Result<Self> {
        let pre = F::pre_process(text.as_ref())?;
        let layout = F::process(&pre.text)?;
        let decoded = F::post_process(&pre.text, &layout, pre.uuid)?;
        tracing::trace!(kind = F::NAME, text = %pre.text, "built structured string");
        Ok(Self {
            text: pre.text,
            layout,
            meta: decoded.meta,
            uuid: decoded.uuid,
            format: PhantomData,
        })
    }

    /// Parse `text` with extra words joined onto the final section.
    pub fn with_words<S: AsRef<str>>(text: S, words: &[&str]) -> Result<Self> {
        let base = Self::new(text)?;
        if words.is_empty() {
            return Ok(base);
        }
        let Some(last) = F::sections().last() else {
            return Ok(base);
        };
        let mut joined = base.text.clone();
        if !base.last_section_is_empty() {
            joined.push_str(last.case);
        }
        joined.push_str(&words.join(last.case));
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// The declared sections of this kind of structured string.
    pub fn sections(&self) -> &'static [SectionSpec] {
        F::sections()
    }

    pub fn section_count(&self) -> usize {
        self.layout.bounds.len()
    }

    /// The uuid carried by this string, if any.
    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn section_index<'a, S: Into<SectionRef<'a>>>(&self, sec: S) -> Option<usize> {
        match sec.into() {
            SectionRef::Index(i) if i < self.section_count() => Some(i),
            SectionRef::Index(_) => None,
            SectionRef::Name(name) => F::sections().iter().position(|s| s.name == name),
        }
    }

    /// Resolve a possibly negative word index within a section.
    fn word_index(&self, sec: usize, idx: isize) -> Option<usize> {
        let count = self.layout.slices.get(sec)?.len();
        let idx = if idx < 0 {
            count.checked_sub(idx.unsigned_abs())?
        } else {
            idx.unsigned_abs()
        };
        (idx < count).then_some(idx)
    }

    fn last_section_is_empty(&self) -> bool {
        self.layout.bounds.last().is_none_or(|r| r.is_empty())
    }

    /// The full text of a section.
    pub fn section<'a, S: Into<SectionRef<'a>>>(&self, sec: S) -> Option<&str> {
        let sec = self.section_index(sec)?;
        Some(&self.text[self.layout.bounds[sec].clone()])
    }

    pub fn word_count<'a, S: Into<SectionRef<'a>>>(&self, sec: S) -> usize {
        self.section_index(sec)
            .map(|sec| self.layout.slices[sec].len())
            .unwrap_or_default()
    }

    /// Byte range of a word in the underlying text.
    pub fn word_range<'a, S: Into<SectionRef<'a>>>(&self, sec: S, idx: isize) -> Option<Range<usize>> {
        let sec = self.section_index(sec)?;
        let idx = self.word_index(sec, idx)?;
        Some(self.layout.slices[sec][idx].clone())
    }

    /// The text of a word, marks and uuids included as written.
    pub fn word<'a, S: Into<SectionRef<'a>>>(&self, sec: S, idx: isize) -> Option<&str> {
        self.word_range(sec, idx).map(|r| &self.text[r])
    }

    /// The text spanning a range of words in a section, separators included.
    pub fn word_slice<'a, S, R>(&self, sec: S, range: R) -> Option<&str>
    where
        S: Into<SectionRef<'a>>,
        R: RangeBounds<usize>,
    {
        let sec = self.section_index(sec)?;
        let words = &self.layout.slices[sec];
        let (start, end) = resolve_range(&range, words.len())?;
        if start >= end {
            let at = words.get(start).map(|r| r.start).unwrap_or(self.layout.bounds[sec].end);
            return Some(&self.text[at..at]);
        }
        Some(&self.text[words[start].start..words[end - 1].end])
    }

    /// The decoded metadata of a word.
    pub fn meta<'a, S: Into<SectionRef<'a>>>(&self, sec: S, idx: isize) -> Option<WordMeta> {
        let sec = self.section_index(sec)?;
        let idx = self.word_index(sec, idx)?;
        Some(self.meta[sec][idx])
    }

    /// The decoded value of a word.
    pub fn get<'a, S: Into<SectionRef<'a>>>(&self, sec: S, idx: isize) -> Option<WordValue<'_>> {
        let sec = self.section_index(sec)?;
        let idx = self.word_index(sec, idx)?;
        Some(match self.meta[sec][idx] {
            WordMeta::Text => WordValue::Text(&self.text[self.layout.slices[sec][idx].clone()]),
            WordMeta::Int(i) => WordValue::Int(i),
            WordMeta::Uuid(u) => WordValue::Uuid(u),
            WordMeta::Mark(m) => WordValue::Mark(m),
        })
    }

    /// A restartable view over the words of a section.
    pub fn words<'a, S: Into<SectionRef<'a>>>(&self, sec: S) -> Option<Words<'_, F>> {
        let section = self.section_index(sec)?;
        Some(Words {
            strang: self,
            section,
            case: false,
            start: 0,
            end: self.layout.slices[section].len(),
        })
    }

    /// Every word of every section, in order.
    pub fn flat(&self) -> impl Iterator<Item = &str> {
        self.layout.flat().map(|r| &self.text[r.clone()])
    }

    pub fn has_mark(&self, mark: StrangMark) -> bool {
        self.meta.iter().flatten().any(|m| *m == WordMeta::Mark(mark))
    }

    /// Byte offset of the first match of `needle`.
    pub fn index_of(&self, needle: Needle<'_>) -> Result<usize> {
        self.locate(needle, false)
    }

    /// Byte offset of the last match of `needle`.
    pub fn rindex_of(&self, needle: Needle<'_>) -> Result<usize> {
        self.locate(needle, true)
    }

    pub fn contains(&self, needle: Needle<'_>) -> bool {
        self.index_of(needle).is_ok()
    }

    fn locate(&self, needle: Needle<'_>, reverse: bool) -> Result<usize> {
        let found = match needle {
            Needle::Str(s) if reverse => self.text.rfind(s),
            Needle::Str(s) => self.text.find(s),
            Needle::Word(sec, idx) => self.word_range(sec, idx).map(|r| r.start),
            Needle::Mark(mark) => self.find_meta(|m| *m == WordMeta::Mark(mark), reverse),
            Needle::Uuid => self.find_meta(|m| matches!(m, WordMeta::Uuid(_)), reverse),
        };
        found.ok_or_else(|| Error::NotFound {
            needle: needle.to_string(),
            text: self.text.clone(),
        })
    }

    fn find_meta(&self, pred: impl Fn(&WordMeta) -> bool, reverse: bool) -> Option<usize> {
        let mut hits = self
            .meta
            .iter()
            .flatten()
            .zip(self.layout.flat())
            .filter(|(m, _)| pred(m))
            .map(|(_, r)| r.start);
        if reverse { hits.last() } else { hits.next() }
    }

    /// Compare as a hierarchy: all but the final section must match
    /// exactly and this string's final words must prefix `other`'s.
    ///
    /// Returns `Some(true)` for a strict extension, `Some(false)` for
    /// an equal word list and `None` when unrelated.
    fn structural_prefix(&self, other: &Self) -> Option<bool> {
        let count = self.section_count();
        if count == 0 || count != other.section_count() {
            return None;
        }
        let last = count - 1;
        for sec in 0..last {
            if self.section(sec) != other.section(sec) {
                return None;
            }
        }
        let mine: Vec<&str> = self.words(last)?.iter().collect();
        let theirs: Vec<&str> = other.words(last)?.iter().collect();
        if mine.len() > theirs.len() || mine[..] != theirs[..mine.len()] {
            return None;
        }
        Some(theirs.len() > mine.len())
    }

    /// True when `other` strictly extends this string.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.structural_prefix(other) == Some(true)
    }

    pub fn is_ancestor_or_eq(&self, other: &Self) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    /// True when `other` is this string or one of its ancestors.
    pub fn contains_strang(&self, other: &Self) -> bool {
        other.structural_prefix(self).is_some()
    }
}

fn resolve_range<R: RangeBounds<usize>>(range: &R, len: usize) -> Option<(usize, usize)> {
    let start = match range.start_bound() {
        Bound::Included(s) => *s,
        Bound::Excluded(s) => s + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(e) => e + 1,
        Bound::Excluded(e) => *e,
        Bound::Unbounded => len,
    };
    (start <= len && end <= len).then_some((start, end.max(start)))
}

/// A window over the words of one section.
#[derive(Debug, Clone)]
pub struct Words<'a, F: StrangFormat> {
    strang: &'a Strang<F>,
    section: usize,
    case: bool,
    start: usize,
    end: usize,
}

impl<'a, F: StrangFormat> Words<'a, F> {
    /// Interleave the section separator between words.
    pub fn with_case(mut self, case: bool) -> Self {
        self.case = case;
        self
    }

    /// Restrict to a range of word positions.
    pub fn select<R: RangeBounds<usize>>(mut self, range: R) -> Self {
        let len = self.strang.layout.slices[self.section].len();
        let (start, end) = resolve_range(&range, len).unwrap_or((len, len));
        self.start = start;
        self.end = end;
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + use<'a, F> {
        let strang = self.strang;
        let sep = strang.sections()[self.section].case;
        let case = self.case;
        strang.layout.slices[self.section][self.start..self.end]
            .iter()
            .enumerate()
            .flat_map(move |(i, r)| {
                let lead = (case && i > 0).then_some(sep);
                lead.into_iter().chain(std::iter::once(&strang.text[r.clone()]))
            })
    }
}

impl<'a, F: StrangFormat> IntoIterator for &Words<'a, F> {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<F: StrangFormat> PartialEq for Strang<F> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl<F: StrangFormat> Eq for Strang<F> {}

impl<F: StrangFormat> PartialEq<str> for Strang<F> {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl<F: StrangFormat> PartialEq<&str> for Strang<F> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl<F: StrangFormat> Hash for Strang<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl<F: StrangFormat> fmt::Display for Strang<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<F: StrangFormat> AsRef<str> for Strang<F> {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl<F: StrangFormat> Deref for Strang<F> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.text
    }
}

impl<F: StrangFormat> FromStr for Strang<F> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<F: StrangFormat> Index<(usize, isize)> for Strang<F> {
    type Output = str;

    fn index(&self, (sec, idx): (usize, isize)) -> &Self::Output {
        match self.word(sec, idx) {
            Some(word) => word,
            None => panic!("word ({sec}, {idx}) out of range for {:?}", self.text),
        }
    }
}

impl<F: StrangFormat> Index<(&str, isize)> for Strang<F> {
    type Output = str;

    fn index(&self, (sec, idx): (&str, isize)) -> &Self::Output {
        match self.word(sec, idx) {
            Some(word) => word,
            None => panic!("word ({sec}, {idx}) out of range for {:?}", self.text),
        }
    }
}
