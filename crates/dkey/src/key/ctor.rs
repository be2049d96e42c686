// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::strang::{Basic, CodeReference, Strang};
use crate::value::{Value, ValueType};
use crate::{Error, Result};

/// A user supplied coercion.
pub type CtorFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// The coercion applied to an expanded value.
#[derive(Clone, Default)]
pub enum Ctor {
    /// Leave the value as it is.
    #[default]
    Identity,
    Str,
    Path,
    Int,
    Float,
    Strang,
    Code,
    List,
    Map,
    Custom(CtorFn),
}

impl Ctor {
    /// Wrap a closure as a custom coercion.
    pub fn custom<F>(func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(func))
    }

    /// The value type this produces, if fixed.
    pub fn target(&self) -> Option<ValueType> {
        match self {
            Self::Identity | Self::Custom(_) => None,
            Self::Str => Some(ValueType::Str),
            Self::Path => Some(ValueType::Path),
            Self::Int => Some(ValueType::Int),
            Self::Float => Some(ValueType::Float),
            Self::Strang => Some(ValueType::Strang),
            Self::Code => Some(ValueType::Code),
            Self::List => Some(ValueType::List),
            Self::Map => Some(ValueType::Map),
        }
    }

    /// True when `value` needs no coercion.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, self.target()) {
            (Self::Identity, _) => true,
            (_, Some(ty)) => value.value_type() == ty,
            (_, None) => false,
        }
    }

    /// Coerce `value` on behalf of `key`.
    pub fn apply(&self, key: &str, value: Value) -> Result<Value> {
        let conversion = |value: &Value, target: &str| Error::Conversion {
            key: key.to_string(),
            value: value.to_string(),
            target: target.to_string(),
        };

        match self {
            Self::Identity => Ok(value),
            Self::Custom(func) => func(value),
            Self::Str => match value {
                Value::Str(_) => Ok(value),
                other => Ok(Value::Str(other.to_string())),
            },
            Self::Path => match value {
                Value::Path(p) => Ok(Value::Path(resolve_path(&p)?)),
                Value::Str(s) => Ok(Value::Path(resolve_path(Path::new(&s))?)),
                other => Err(conversion(&other, "path")),
            },
            Self::Int => match value {
                Value::Int(_) => Ok(value),
                Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                Value::Float(x) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
                Value::Str(ref s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| conversion(&value, "int")),
                other => Err(conversion(&other, "int")),
            },
            Self::Float => match value {
                Value::Float(_) => Ok(value),
                Value::Int(i) => Ok(Value::Float(i as f64)),
                Value::Str(ref s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| conversion(&value, "float")),
                other => Err(conversion(&other, "float")),
            },
            Self::Strang => match value {
                Value::Strang(_) => Ok(value),
                other => Ok(Value::Strang(Strang::<Basic>::new(other.to_string())?)),
            },
            Self::Code => match value {
                Value::Code(_) => Ok(value),
                Value::Str(s) => Ok(Value::Code(CodeReference::new(&s)?.load()?)),
                other => Err(conversion(&other, "code")),
            },
            Self::List => match value {
                Value::List(_) => Ok(value),
                Value::None => Ok(Value::List(Vec::new())),
                other => Ok(Value::List(vec![other])),
            },
            Self::Map => match value {
                Value::Map(_) => Ok(value),
                Value::None => Ok(Value::Map(Default::default())),
                other => Err(conversion(&other, "map")),
            },
        }
    }
}

impl fmt::Debug for Ctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Custom(_) => f.write_str("Custom"),
            other => match other.target() {
                Some(ty) => write!(f, "{ty:?}"),
                None => f.write_str("Unknown"),
            },
        }
    }
}

impl fmt::Display for Ctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(ty) => write!(f, "{ty}"),
            None => write!(f, "{}", format!("{self:?}").to_lowercase()),
        }
    }
}

/// Expand `~`, make absolute and resolve symlinks when the path exists.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    let absolute = std::path::absolute(&expanded)?;
    if absolute.exists() {
        Ok(dunce::canonicalize(&absolute)?)
    } else {
        Ok(absolute)
    }
}
