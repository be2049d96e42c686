// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Per-class customization of the expansion phases.

use std::path::Path;
use std::sync::Arc;

use super::DKey;
use crate::expander::{self, ExpInst};
use crate::getter::{self, Source};
use crate::value::Value;
use crate::{Error, Result};

/// One name to probe the sources with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTarget {
    pub name: String,
    /// Treat a hit as a new key reference rather than a value.
    pub lift: bool,
}

/// What the lookup phase should do for a key.
#[derive(Debug, Clone)]
pub enum LookupPlan {
    /// Probe these names, in order, stopping at the first hit.
    Targets(Vec<LookupTarget>),
    /// Skip lookup, these values were resolved by the hook. Empty is a miss.
    Resolved(Vec<ExpInst>),
}

/// Hooks run by the expander for each phase.
///
/// Every method has a default, so a class only overrides what differs.
pub trait ExpansionHooks: Send + Sync {
    /// Sources consulted after the call-site ones.
    fn extra_sources(&self, _key: &DKey) -> Vec<Arc<dyn Source + Send + Sync>> {
        getter::extra_sources()
    }

    /// Used when neither the call nor the key supply a fallback.
    fn default_fallback(&self, _key: &DKey) -> Option<Value> {
        None
    }

    /// Direct name first, then the indirect one whose hit is lifted.
    fn pre_lookup(&self, key: &DKey, _sources: &[&dyn Source]) -> LookupPlan {
        LookupPlan::Targets(vec![
            LookupTarget {
                name: key.direct().to_string(),
                lift: false,
            },
            LookupTarget {
                name: key.indirect(),
                lift: true,
            },
        ])
    }

    /// `Ok(None)` means the value could not be coerced.
    fn coerce(&self, key: &DKey, inst: ExpInst) -> Result<Option<ExpInst>> {
        expander::coerce(key, inst)
    }

    fn finalize(&self, _key: &DKey, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn check(&self, key: &DKey, value: &Value) -> Result<()> {
        match key.typecheck() {
            Some(check) if !check.accepts(value) => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: check.to_string(),
                found: value.value_type().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// The default behaviour for every phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl ExpansionHooks for Standard {}

/// Forces the final value to an absolute path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathHooks;

impl ExpansionHooks for PathHooks {
    fn finalize(&self, _key: &DKey, value: Value) -> Result<Value> {
        match value {
            Value::Path(p) => Ok(Value::Path(super::resolve_path(&p)?)),
            Value::Str(s) => Ok(Value::Path(super::resolve_path(Path::new(&s))?)),
            other => Ok(other),
        }
    }
}

/// A miss on an indirect key degrades to the key itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndirectHooks;

impl ExpansionHooks for IndirectHooks {
    fn default_fallback(&self, key: &DKey) -> Option<Value> {
        Some(Value::Key(key.clone()))
    }
}

fn param_source<'a>(sources: &[&'a dyn Source]) -> Option<&'a getter::ParamSource> {
    sources.iter().copied().find_map(|s| s.spec())
}

/// Pulls positional args from the first parameter source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgsHooks;

impl ExpansionHooks for ArgsHooks {
    fn default_fallback(&self, _key: &DKey) -> Option<Value> {
        Some(Value::List(Vec::new()))
    }

    fn pre_lookup(&self, _key: &DKey, sources: &[&dyn Source]) -> LookupPlan {
        let found = param_source(sources)
            .map(|spec| ExpInst::literal(Value::List(spec.args.clone())))
            .into_iter()
            .collect();
        LookupPlan::Resolved(found)
    }
}

/// Pulls named params from the first parameter source.
#[derive(Debug, Clone, Copy, Default)]
pub struct KwargsHooks;

impl ExpansionHooks for KwargsHooks {
    fn default_fallback(&self, _key: &DKey) -> Option<Value> {
        Some(Value::Map(Default::default()))
    }

    fn pre_lookup(&self, _key: &DKey, sources: &[&dyn Source]) -> LookupPlan {
        let found = param_source(sources)
            .map(|spec| ExpInst::literal(Value::Map(spec.params.clone())))
            .into_iter()
            .collect();
        LookupPlan::Resolved(found)
    }
}
