// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Dispatch tables from marks and conversion characters to key classes.
//!
//! The tables are built once on first use and are read-only afterwards.
//! Each `(mark, multi)` pair has at most one class.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use super::hooks::{self, ExpansionHooks};
use super::{Ctor, Mark};

/// A concrete kind of key: its default coercion and expansion hooks.
pub struct KeyClass {
    pub name: &'static str,
    pub mark: Mark,
    pub multi: bool,
    pub ctor: Ctor,
    pub(crate) hooks: &'static dyn ExpansionHooks,
}

impl fmt::Debug for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyClass")
            .field("name", &self.name)
            .field("mark", &self.mark)
            .field("multi", &self.multi)
            .field("ctor", &self.ctor)
            .finish_non_exhaustive()
    }
}

static FREE: KeyClass = KeyClass {
    name: "SingleDKey",
    mark: Mark::Free,
    multi: false,
    ctor: Ctor::Identity,
    hooks: &hooks::Standard,
};

static STR: KeyClass = KeyClass {
    name: "StrDKey",
    mark: Mark::Str,
    multi: false,
    ctor: Ctor::Str,
    hooks: &hooks::Standard,
};

static PATH: KeyClass = KeyClass {
    name: "PathDKey",
    mark: Mark::Path,
    multi: false,
    ctor: Ctor::Path,
    hooks: &hooks::PathHooks,
};

static CODE: KeyClass = KeyClass {
    name: "ImportDKey",
    mark: Mark::Code,
    multi: false,
    ctor: Ctor::Code,
    hooks: &hooks::Standard,
};

static ARGS: KeyClass = KeyClass {
    name: "ArgsDKey",
    mark: Mark::Args,
    multi: false,
    ctor: Ctor::List,
    hooks: &hooks::ArgsHooks,
};

static KWARGS: KeyClass = KeyClass {
    name: "KwargsDKey",
    mark: Mark::Kwargs,
    multi: false,
    ctor: Ctor::Map,
    hooks: &hooks::KwargsHooks,
};

static INDIRECT: KeyClass = KeyClass {
    name: "IndirectDKey",
    mark: Mark::Indirect,
    multi: false,
    ctor: Ctor::Identity,
    hooks: &hooks::IndirectHooks,
};

static NULL: KeyClass = KeyClass {
    name: "NonDKey",
    mark: Mark::Null,
    multi: false,
    ctor: Ctor::Identity,
    hooks: &hooks::Standard,
};

static MULTI: KeyClass = KeyClass {
    name: "MultiDKey",
    mark: Mark::Multi,
    multi: true,
    ctor: Ctor::Identity,
    hooks: &hooks::Standard,
};

static MULTI_PATH: KeyClass = KeyClass {
    name: "PathMultiDKey",
    mark: Mark::Path,
    multi: true,
    ctor: Ctor::Path,
    hooks: &hooks::PathHooks,
};

static SINGLE_CLASSES: Lazy<HashMap<Mark, &'static KeyClass>> = Lazy::new(|| {
    [&FREE, &STR, &PATH, &CODE, &ARGS, &KWARGS, &INDIRECT, &NULL]
        .into_iter()
        .map(|class| (class.mark, class))
        .collect()
});

static MULTI_CLASSES: Lazy<HashMap<Mark, &'static KeyClass>> = Lazy::new(|| {
    [&MULTI, &MULTI_PATH]
        .into_iter()
        .map(|class| (class.mark, class))
        .collect()
});

/// A conversion character: `{name!p}`.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub ctor: Ctor,
    /// The mark a single key takes when built with this conversion.
    pub mark: Option<Mark>,
}

static CONVERSIONS: Lazy<HashMap<char, Conversion>> = Lazy::new(|| {
    let entry = |ctor, mark| Conversion { ctor, mark };
    HashMap::from([
        ('p', entry(Ctor::Path, Some(Mark::Path))),
        ('s', entry(Ctor::Str, Some(Mark::Str))),
        ('i', entry(Ctor::Int, None)),
        ('f', entry(Ctor::Float, None)),
        ('c', entry(Ctor::Code, Some(Mark::Code))),
        ('S', entry(Ctor::Strang, None)),
    ])
});

/// The single-key class for `mark`, or the generic one.
pub fn single_class(mark: Mark) -> &'static KeyClass {
    SINGLE_CLASSES.get(&mark).copied().unwrap_or(&FREE)
}

/// The multi-key class for `mark`, or the generic one.
pub fn multi_class(mark: Mark) -> &'static KeyClass {
    MULTI_CLASSES.get(&mark).copied().unwrap_or(&MULTI)
}

pub fn has_class(mark: Mark, multi: bool) -> bool {
    if multi {
        MULTI_CLASSES.contains_key(&mark)
    } else {
        SINGLE_CLASSES.contains_key(&mark)
    }
}

pub fn conversion(conv: char) -> Option<&'static Conversion> {
    CONVERSIONS.get(&conv)
}

/// Every registered class, single keys first.
pub fn classes() -> Vec<&'static KeyClass> {
    let mut all: Vec<&'static KeyClass> = SINGLE_CLASSES
        .values()
        .chain(MULTI_CLASSES.values())
        .copied()
        .collect();
    all.sort_by_key(|c| (c.multi, c.name));
    all
}

/// Every registered conversion character, sorted.
pub fn conversions() -> Vec<(char, &'static Conversion)> {
    let mut all: Vec<_> = CONVERSIONS.iter().map(|(c, conv)| (*c, conv)).collect();
    all.sort_by_key(|(c, _)| *c);
    all
}
