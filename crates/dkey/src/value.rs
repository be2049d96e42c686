// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Dynamic values produced by lookups and consumed by expansion.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::key::DKey;
use crate::strang::{Code, Strang};

#[cfg(test)]
#[path = "./value_test.rs"]
mod value_test;

/// An ordered string-keyed mapping of values.
pub type ValueMap = IndexMap<String, Value>;

/// A value found in a lookup source, or produced by expanding a key.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
    Map(ValueMap),
    /// A key that still needs expanding, eg: the result of a soft miss.
    Key(DKey),
    Strang(Strang),
    Code(Code),
}

/// The variant tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    None,
    Bool,
    Int,
    Float,
    Str,
    Path,
    List,
    Map,
    Key,
    Strang,
    Code,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::None => ValueType::None,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::Str,
            Self::Path(_) => ValueType::Path,
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
            Self::Key(_) => ValueType::Key,
            Self::Strang(_) => ValueType::Strang,
            Self::Code(_) => ValueType::Code,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&DKey> {
        match self {
            Self::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Key(k) => f.write_str(&k.wrapped()),
            Self::Strang(s) => f.write_str(s.as_str()),
            Self::Code(c) => f.write_str(c.reference().as_str()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Path(p) => serializer.serialize_str(&p.to_string_lossy()),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Key(k) => serializer.serialize_str(&k.wrapped()),
            Self::Strang(s) => serializer.serialize_str(s.as_str()),
            Self::Code(c) => serializer.serialize_str(c.reference().as_str()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for Value {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Self::Map(value)
    }
}

impl From<DKey> for Value {
    fn from(value: DKey) -> Self {
        Self::Key(value)
    }
}

impl From<Strang> for Value {
    fn from(value: Strang) -> Self {
        Self::Strang(value)
    }
}

impl From<Code> for Value {
    fn from(value: Code) -> Self {
        Self::Code(value)
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::None,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Self::Str(s),
            serde_yaml::Value::Sequence(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Self::Map(
                map.into_iter()
                    .filter_map(|(k, v)| yaml_key_text(&k).map(|k| (k, Self::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

/// Mapping keys are looked up by text, so scalars are stringified
/// and anything more complex is dropped.
pub(crate) fn yaml_key_text(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A constraint on the type of a fully expanded value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeCheck {
    #[default]
    Any,
    Is(ValueType),
    OneOf(Vec<ValueType>),
    ListOf(Box<TypeCheck>),
    MapOf(Box<TypeCheck>),
}

impl TypeCheck {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Is(ty) => value.value_type() == *ty,
            Self::OneOf(types) => types.contains(&value.value_type()),
            Self::ListOf(inner) => match value {
                Value::List(items) => items.iter().all(|v| inner.accepts(v)),
                _ => false,
            },
            Self::MapOf(inner) => match value {
                Value::Map(entries) => entries.values().all(|v| inner.accepts(v)),
                _ => false,
            },
        }
    }
}

impl From<ValueType> for TypeCheck {
    fn from(value: ValueType) -> Self {
        Self::Is(value)
    }
}

impl fmt::Display for TypeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Is(ty) => write!(f, "{ty}"),
            Self::OneOf(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                f.write_str(&names.join(" | "))
            }
            Self::ListOf(inner) => write!(f, "list[{inner}]"),
            Self::MapOf(inner) => write!(f, "map[{inner}]"),
        }
    }
}
