// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Section descriptors and word markers for structured strings.

use std::fmt::Debug;

use uuid::Uuid;

use super::process::{self, Layout, PreProcessed};
use crate::Result;

/// Markers with a special meaning inside a section.
///
/// Named markers are written `$name$` and are recognized anywhere.
/// The implicit ones (`_`, `+` and the empty word) only count as
/// markers in the first or last word of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum StrangMark {
    Head,
    Gen,
    Mark,
    Hide,
    Extend,
    Empty,
}

impl StrangMark {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Head => "$head$",
            Self::Gen => "$gen$",
            Self::Mark => "$mark$",
            Self::Hide => "_",
            Self::Extend => "+",
            Self::Empty => "",
        }
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::Hide | Self::Extend | Self::Empty)
    }

    pub fn from_named(name: &str) -> Option<Self> {
        match name {
            "head" => Some(Self::Head),
            "gen" => Some(Self::Gen),
            "mark" => Some(Self::Mark),
            _ => None,
        }
    }

    pub fn from_implicit(word: &str) -> Option<Self> {
        match word {
            "_" => Some(Self::Hide),
            "+" => Some(Self::Extend),
            "" => Some(Self::Empty),
            _ => None,
        }
    }
}

/// The kinds of decoded value a section's words may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordKinds {
    pub ints: bool,
    pub uuids: bool,
    pub marks: bool,
}

impl WordKinds {
    pub const ALL: Self = Self {
        ints: true,
        uuids: true,
        marks: true,
    };
    pub const TEXT: Self = Self {
        ints: false,
        uuids: false,
        marks: false,
    };
}

/// Describes one section of a structured string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: &'static str,
    /// Separator between words of the section.
    pub case: &'static str,
    /// Marker ending the section, `None` for the final one.
    pub end: Option<&'static str>,
    pub kinds: WordKinds,
    pub required: bool,
}

/// The decoded value of a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMeta {
    Text,
    Int(i64),
    Uuid(Uuid),
    Mark(StrangMark),
}

/// The shape of a structured string type.
///
/// Implementors supply the section layout and may override any of
/// the three construction phases.
pub trait StrangFormat: Debug + Clone + Copy + Default + Send + Sync + 'static {
    const NAME: &'static str;

    fn sections() -> &'static [SectionSpec];

    fn pre_process(text: &str) -> Result<PreProcessed> {
        process::pre_process(Self::sections(), text)
    }

    fn process(text: &str) -> Result<Layout> {
        process::process(Self::sections(), text)
    }

    fn post_process(text: &str, layout: &Layout, uuid: Option<Uuid>) -> Result<process::Decoded> {
        process::post_process(Self::sections(), text, layout, uuid)
    }
}

/// `group::body`, the default structured string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Basic;

static BASIC_SECTIONS: [SectionSpec; 2] = [
    SectionSpec {
        name: "head",
        case: ".",
        end: Some("::"),
        kinds: WordKinds::ALL,
        required: true,
    },
    SectionSpec {
        name: "body",
        case: ".",
        end: None,
        kinds: WordKinds::ALL,
        required: true,
    },
];

impl StrangFormat for Basic {
    const NAME: &'static str = "strang";

    fn sections() -> &'static [SectionSpec] {
        &BASIC_SECTIONS
    }
}
