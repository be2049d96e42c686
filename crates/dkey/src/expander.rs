// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The expansion pipeline: lookup, recursion, coercion, finalize and
//! type check.
//!
//! A miss is not an error. It resolves to the call-site fallback, then
//! the key's own fallback, then the class default, then `None`. The
//! errors returned from here are the ones no fallback may paper over.

use crate::format::FormatSpec;
use crate::getter::{self, SharedSource, Source};
use crate::key::{registry, DKey, LookupPlan};
use crate::rawkey::fill_template;
use crate::value::Value;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./expander_test.rs"]
mod expander_test;

/// Hard cap on how deeply expansions may nest within one call.
pub const RECURSION_GUARD: usize = 200;

/// Per-call expansion options.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// Used when expansion finds nothing, ahead of the key's own fallback.
    pub fallback: Option<Value>,
    /// Remaining recursion budget. `None` uses the key's `max_exp`, and
    /// a negative budget is unbounded.
    pub limit: Option<i32>,
}

impl ExpandOptions {
    pub fn with_fallback<V: Into<Value>>(mut self, fallback: V) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A value in flight through one expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpInst {
    pub value: Value,
    /// Remaining recursion budget, `-1` for unbounded.
    pub rec: i32,
    /// Used if recursing into this value finds nothing.
    pub fallback: Option<Value>,
    /// The value was found through the indirect name.
    pub lift: bool,
    /// No further expansion is needed.
    pub literal: bool,
    /// `Some(false)` skips coercion.
    pub convert: Option<bool>,
    pub total_recs: usize,
}

impl ExpInst {
    pub fn new(value: Value, rec: i32) -> Self {
        Self {
            value,
            rec,
            fallback: None,
            lift: false,
            literal: false,
            convert: None,
            total_recs: 0,
        }
    }

    /// A value that is already final.
    pub fn literal(value: Value) -> Self {
        Self {
            literal: true,
            ..Self::new(value, 0)
        }
    }
}

/// Expand `key` against `sources` followed by the key's extra sources.
pub fn expand(key: &DKey, sources: &[&dyn Source], opts: ExpandOptions) -> Result<Option<Value>> {
    let extra = key.hooks().extra_sources(key);
    let mut expander = Expander::new(sources, &extra);
    let result = expander.expand_key(key, opts.fallback, opts.limit)?;
    tracing::debug!(key = %key, found = result.is_some(), "expanded");
    Ok(result)
}

/// One step of indirection: the keys `key` points at, unexpanded.
pub fn redirect(key: &DKey, sources: &[&dyn Source], multi: bool) -> Result<Vec<DKey>> {
    let extra = key.hooks().extra_sources(key);
    let expander = Expander::new(sources, &extra);
    let targets = [key.indirect(), key.direct().to_string()];
    let Some(found) = targets
        .iter()
        .find_map(|name| getter::chain_get(name, &expander.sources))
    else {
        tracing::debug!(key = %key, "redirect missed, keeping key");
        return Ok(vec![key.clone()]);
    };

    let values = match found {
        Value::List(items) if multi => items,
        Value::List(items) => items.into_iter().take(1).collect(),
        other => vec![other],
    };
    let mut keys = Vec::with_capacity(values.len());
    for value in values {
        keys.push(match value {
            Value::Key(k) => k,
            other => value_to_key(&other.to_string())?,
        });
    }
    Ok(keys)
}

/// Text from a source that names another key.
fn value_to_key(text: &str) -> Result<DKey> {
    if text.contains('{') {
        DKey::new(text)
    } else {
        DKey::implicit(text)
    }
}

/// The default coercion phase.
///
/// An explicit conversion character wins over the key's constructor.
/// Keys still awaiting expansion are left alone.
pub fn coerce(key: &DKey, mut inst: ExpInst) -> Result<Option<ExpInst>> {
    if matches!(inst.value, Value::Key(_)) {
        return Ok(Some(inst));
    }
    if let Some(conv) = key.conv_params() {
        let Some(entry) = registry::conversion(conv) else {
            tracing::warn!(key = %key, conv = %conv, "unrecognized conversion parameter");
            return Ok(None);
        };
        inst.value = entry.ctor.apply(key.as_str(), inst.value)?;
        return Ok(Some(inst));
    }
    if inst.convert == Some(false) || key.ctor().accepts(&inst.value) {
        return Ok(Some(inst));
    }
    inst.value = key.ctor().apply(key.as_str(), inst.value)?;
    Ok(Some(inst))
}

struct Expander<'a> {
    sources: Vec<&'a dyn Source>,
    /// Keys currently being expanded, outermost first.
    chain: Vec<String>,
    /// Recursion steps taken so far, reported through `ExpInst::total_recs`.
    total: usize,
}

impl<'a> Expander<'a> {
    fn new(sources: &[&'a dyn Source], extra: &'a [SharedSource]) -> Self {
        let mut all: Vec<&'a dyn Source> = sources.to_vec();
        all.extend(extra.iter().map(|s| s.as_ref() as &dyn Source));
        Self {
            sources: all,
            chain: Vec::new(),
            total: 0,
        }
    }

    fn expand_key(
        &mut self,
        key: &DKey,
        fallback: Option<Value>,
        limit: Option<i32>,
    ) -> Result<Option<Value>> {
        if key.is_null() {
            return Ok(Some(Value::Str(key.as_str().to_string())));
        }
        let fallback = fallback
            .or_else(|| key.fallback_value())
            .or_else(|| key.hooks().default_fallback(key));

        let rec = limit.or(key.max_expansions()).unwrap_or(-1);
        if rec == 0 {
            return Ok(Some(Value::Key(key.clone())));
        }
        if self.chain.len() >= RECURSION_GUARD {
            return Err(Error::RecursionLimit {
                key: key.to_string(),
                depth: RECURSION_GUARD,
            });
        }

        self.chain.push(key.to_string());
        let result = self.run(key, rec);
        self.chain.pop();

        match result? {
            Some(value) => Ok(Some(value)),
            None => {
                tracing::debug!(key = %key, fallback = ?fallback, "using fallback");
                Ok(fallback)
            }
        }
    }

    fn run(&mut self, key: &DKey, rec: i32) -> Result<Option<Value>> {
        let inst = if key.is_multi() {
            self.expand_multi(key, rec)?
        } else {
            let Some(found) = self.lookup(key, rec)? else {
                return Ok(None);
            };
            let mut expanded = Vec::with_capacity(found.len());
            for inst in found {
                if let Some(inst) = self.recurse(key, inst)? {
                    expanded.push(inst);
                }
            }
            // first hit wins
            expanded.into_iter().next()
        };
        let Some(inst) = inst else {
            return Ok(None);
        };

        let hooks = key.hooks();
        let Some(inst) = hooks.coerce(key, inst)? else {
            return Ok(None);
        };
        if matches!(inst.value, Value::Key(_)) {
            return Ok(Some(inst.value));
        }
        let value = hooks.finalize(key, inst.value)?;
        hooks.check(key, &value)?;
        Ok(Some(value))
    }

    fn lookup(&self, key: &DKey, rec: i32) -> Result<Option<Vec<ExpInst>>> {
        let targets = match key.hooks().pre_lookup(key, &self.sources) {
            LookupPlan::Resolved(found) if found.is_empty() => return Ok(None),
            LookupPlan::Resolved(found) => return Ok(Some(found)),
            LookupPlan::Targets(targets) => targets,
        };

        for target in targets {
            let Some(value) = getter::chain_get(&target.name, &self.sources) else {
                continue;
            };
            tracing::debug!(key = %key, target = %target.name, lift = target.lift, "lookup hit");
            let mut inst = ExpInst::new(value, rec);
            if target.lift {
                inst = lift(inst)?;
            }
            return Ok(Some(vec![inst]));
        }
        tracing::debug!(key = %key, "lookup missed");
        Ok(None)
    }

    fn recurse(&mut self, key: &DKey, inst: ExpInst) -> Result<Option<ExpInst>> {
        if inst.literal {
            return Ok(Some(inst));
        }
        let candidate = match &inst.value {
            Value::Key(k) => Some(k.clone()),
            Value::Str(s) if s.contains('{') => DKey::new(s).ok().filter(|k| !k.is_null()),
            _ => None,
        };
        let Some(candidate) = candidate else {
            return Ok(Some(ExpInst {
                literal: true,
                ..inst
            }));
        };

        let next = if inst.rec < 0 { -1 } else { inst.rec - 1 };
        if next == 0 {
            return Ok(Some(ExpInst {
                literal: true,
                ..inst
            }));
        }
        if candidate == *key {
            // expands to itself: no progress, keep the name
            return Ok(Some(ExpInst {
                value: Value::Str(candidate.to_string()),
                literal: true,
                ..inst
            }));
        }
        if next < 0 && self.chain.iter().any(|k| k == candidate.as_str()) {
            let mut chain = self.chain.clone();
            chain.push(candidate.to_string());
            return Err(Error::Recursion {
                key: candidate.to_string(),
                chain,
            });
        }

        self.total += 1;
        tracing::debug!(key = %key, into = %candidate, budget = next, "recursing");
        let limit = (next > 0).then_some(next);
        match self.expand_key(&candidate, None, limit)? {
            Some(value) => Ok(Some(ExpInst {
                value,
                literal: true,
                total_recs: self.total,
                ..inst
            })),
            None => Ok(inst.fallback.map(|fallback| ExpInst {
                value: fallback,
                literal: true,
                ..ExpInst::new(Value::None, next)
            })),
        }
    }

    fn expand_multi(&mut self, key: &DKey, rec: i32) -> Result<Option<ExpInst>> {
        let Some(parts) = key.multi_parts() else {
            return Ok(None);
        };
        let limit = (rec > 0).then_some(rec);

        if let ([sub], false) = (parts.subkeys.as_slice(), parts.has_literal) {
            return Ok(self.expand_key(sub, None, limit)?.map(|value| ExpInst {
                convert: Some(false),
                literal: true,
                ..ExpInst::new(value, rec)
            }));
        }

        let mut rendered = Vec::with_capacity(parts.subkeys.len());
        for sub in &parts.subkeys {
            let Some(value) = self.expand_key(sub, None, limit)? else {
                tracing::debug!(key = %key, sub = %sub, "sub-key missed");
                return Ok(None);
            };
            let spec = FormatSpec::parse(sub.fmt_params())?;
            rendered.push(spec.apply(&value));
        }
        let joined = fill_template(&parts.anon, &rendered)?;
        Ok(Some(ExpInst {
            literal: true,
            ..ExpInst::new(Value::Str(joined), rec)
        }))
    }
}

/// Turn a value found through an indirect name into a key reference.
fn lift(inst: ExpInst) -> Result<ExpInst> {
    let key = match &inst.value {
        Value::Key(k) => k.clone(),
        Value::Str(s) => match value_to_key(s) {
            Ok(k) if !k.is_null() => k,
            _ => return Ok(inst),
        },
        _ => return Ok(inst),
    };
    Ok(ExpInst {
        value: Value::Key(key.clone()),
        fallback: Some(Value::Key(key)),
        lift: true,
        ..inst
    })
}
