// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The three construction phases shared by every structured string type.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use super::section::{SectionSpec, StrangMark, WordMeta};
use crate::{Error, Result};

static UUID_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<uuid(?::(?P<value>[^>]*))?>").expect("uuid token pattern is valid"));

static UUID_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<uuid:(?P<value>[0-9a-fA-F-]+)>$").expect("uuid word pattern is valid")
});

static NAMED_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$(?P<name>\w+)\$$").expect("named mark pattern is valid"));

/// Cleaned text plus anything extracted while cleaning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreProcessed {
    pub text: String,
    pub uuid: Option<Uuid>,
}

/// Section and word boundaries as byte ranges into the cleaned text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub bounds: Vec<Range<usize>>,
    pub slices: Vec<Vec<Range<usize>>>,
}

impl Layout {
    /// All word ranges, in order, across every section.
    pub fn flat(&self) -> impl Iterator<Item = &Range<usize>> {
        self.slices.iter().flatten()
    }
}

/// Per-section, per-word decoded values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub meta: Vec<Vec<WordMeta>>,
    pub uuid: Option<Uuid>,
}

/// Render a uuid in its canonical token form.
pub fn uuid_token(uuid: &Uuid) -> String {
    format!("<uuid:{}>", uuid.hyphenated())
}

/// Check section markers, canonicalize the single uuid token,
/// collapse separator runs and strip trailing separators.
pub fn pre_process(sections: &[SectionSpec], text: &str) -> Result<PreProcessed> {
    for sec in sections.iter().filter(|s| s.required) {
        let Some(end) = sec.end else {
            continue;
        };
        if !text.contains(end) {
            return Err(Error::MissingSection {
                text: text.to_string(),
                section: sec.name.to_string(),
                marker: end.to_string(),
            });
        }
    }

    let tokens: Vec<_> = UUID_TOKEN.captures_iter(text).collect();
    if tokens.len() > 1 {
        return Err(Error::TooManyUuids(text.to_string()));
    }

    let (mut cleaned, uuid) = match tokens.first() {
        None => (text.to_string(), None),
        Some(caps) => {
            let uuid = match caps.name("value") {
                Some(value) => Uuid::parse_str(value.as_str()).map_err(|_| Error::BadUuid {
                    text: text.to_string(),
                    value: value.as_str().to_string(),
                })?,
                None => Uuid::new_v4(),
            };
            let span = caps.get(0).map(|m| m.range()).unwrap_or_default();
            let cleaned = format!(
                "{}{}{}",
                &text[..span.start],
                uuid_token(&uuid),
                &text[span.end..]
            );
            (cleaned, Some(uuid))
        }
    };

    let mut cases: Vec<&str> = sections.iter().map(|s| s.case).collect();
    cases.sort_unstable();
    cases.dedup();
    for case in cases {
        cleaned = collapse_runs(&cleaned, case);
    }

    if let Some(last) = sections.last() {
        while !last.case.is_empty() && cleaned.ends_with(last.case) {
            cleaned.truncate(cleaned.len() - last.case.len());
        }
    }

    Ok(PreProcessed {
        text: cleaned,
        uuid,
    })
}

/// Reduce any run of three or more separators to the doubled form.
fn collapse_runs(text: &str, case: &str) -> String {
    if case.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(case) {
        out.push_str(&rest[..pos]);
        let mut tail = &rest[pos..];
        let mut run = 0;
        while let Some(next) = tail.strip_prefix(case) {
            run += 1;
            tail = next;
        }
        out.push_str(case);
        if run >= 2 {
            out.push_str(case);
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Locate each section's bounds and split it into words.
pub fn process(sections: &[SectionSpec], text: &str) -> Result<Layout> {
    let mut layout = Layout::default();
    let mut offset = 0;
    let last = sections.len().saturating_sub(1);

    for (i, sec) in sections.iter().enumerate() {
        let found = match sec.end {
            Some(marker) if i < last => text[offset..]
                .find(marker)
                .map(|p| (offset + p, offset + p + marker.len())),
            _ => Some((text.len(), text.len())),
        };
        match found {
            Some((end, next)) => {
                layout.bounds.push(offset..end);
                layout.slices.push(split_words(text, offset..end, sec.case));
                offset = next;
            }
            None if sec.required => {
                return Err(Error::MissingSection {
                    text: text.to_string(),
                    section: sec.name.to_string(),
                    marker: sec.end.unwrap_or_default().to_string(),
                });
            }
            None => {
                layout.bounds.push(offset..offset);
                layout.slices.push(Vec::new());
            }
        }
    }
    Ok(layout)
}

fn split_words(text: &str, bounds: Range<usize>, case: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start = bounds.start;
    if !case.is_empty() {
        for (p, _) in text[bounds.clone()].match_indices(case) {
            words.push(start..bounds.start + p);
            start = bounds.start + p + case.len();
        }
    }
    words.push(start..bounds.end);
    words
}

/// Decode every word into its metadata.
pub fn post_process(
    sections: &[SectionSpec],
    text: &str,
    layout: &Layout,
    uuid: Option<Uuid>,
) -> Result<Decoded> {
    let mut decoded = Decoded {
        meta: Vec::with_capacity(sections.len()),
        uuid,
    };
    let mut uuid_words = 0;

    for (sec, words) in sections.iter().zip(&layout.slices) {
        let count = words.len();
        let mut meta = Vec::with_capacity(count);
        for (j, range) in words.iter().enumerate() {
            let word = &text[range.clone()];
            let edge = j == 0 || j + 1 == count;

            let uuid_caps = sec.kinds.uuids.then(|| UUID_WORD.captures(word)).flatten();
            if let Some(caps) = uuid_caps {
                let value = Uuid::parse_str(&caps["value"]).map_err(|_| Error::BadUuid {
                    text: text.to_string(),
                    value: caps["value"].to_string(),
                })?;
                uuid_words += 1;
                match decoded.uuid {
                    Some(existing) if existing != value || uuid_words > 1 => {
                        return Err(Error::TooManyUuids(text.to_string()));
                    }
                    _ => decoded.uuid = Some(value),
                }
                meta.push(WordMeta::Uuid(value));
                continue;
            }
            meta.push(classify(sec, word, edge));
        }
        decoded.meta.push(meta);
    }
    Ok(decoded)
}

fn classify(sec: &SectionSpec, word: &str, edge: bool) -> WordMeta {
    if sec.kinds.marks {
        let named = NAMED_MARK
            .captures(word)
            .and_then(|caps| StrangMark::from_named(&caps["name"]));
        if let Some(mark) = named {
            return WordMeta::Mark(mark);
        }
        if let Some(mark) = edge.then(|| StrangMark::from_implicit(word)).flatten() {
            return WordMeta::Mark(mark);
        }
    }
    if sec.kinds.ints && !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = word.parse() {
            return WordMeta::Int(i);
        }
    }
    WordMeta::Text
}
