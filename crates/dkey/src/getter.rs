// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Lookup sources and the chained getter that probes them in order.

use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::value::{Value, ValueMap};

#[cfg(test)]
#[path = "./getter_test.rs"]
mod getter_test;

/// Anything a key can be looked up in.
pub trait Source {
    /// The value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Option<Value>;

    /// The parameter capability used by args and kwargs keys.
    fn spec(&self) -> Option<&ParamSource> {
        None
    }
}

/// A shared source that can live in the process-wide list.
pub type SharedSource = Arc<dyn Source + Send + Sync>;

impl<K, V, S> Source for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: Clone + Into<Value>,
    S: BuildHasher,
{
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).cloned().map(Into::into)
    }
}

impl<K, V, S> Source for IndexMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: Clone + Into<Value>,
    S: BuildHasher,
{
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).cloned().map(Into::into)
    }
}

impl<K, V> Source for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: Clone + Into<Value>,
{
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).cloned().map(Into::into)
    }
}

impl Source for serde_yaml::Mapping {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).cloned().map(Value::from)
    }
}

impl Source for Value {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.as_map()?.get(key).cloned()
    }
}

impl<T: Source + ?Sized> Source for &T {
    fn lookup(&self, key: &str) -> Option<Value> {
        (**self).lookup(key)
    }

    fn spec(&self) -> Option<&ParamSource> {
        (**self).spec()
    }
}

impl<T: Source + ?Sized> Source for Box<T> {
    fn lookup(&self, key: &str) -> Option<Value> {
        (**self).lookup(key)
    }

    fn spec(&self) -> Option<&ParamSource> {
        (**self).spec()
    }
}

impl<T: Source + ?Sized> Source for Arc<T> {
    fn lookup(&self, key: &str) -> Option<Value> {
        (**self).lookup(key)
    }

    fn spec(&self) -> Option<&ParamSource> {
        (**self).spec()
    }
}

impl<T: Source + ?Sized> Source for Rc<T> {
    fn lookup(&self, key: &str) -> Option<Value> {
        (**self).lookup(key)
    }

    fn spec(&self) -> Option<&ParamSource> {
        (**self).spec()
    }
}

/// A list used as a stack: every lookup pops the last value,
/// whatever the key.
#[derive(Debug, Default)]
pub struct ValueStack(RefCell<Vec<Value>>);

impl ValueStack {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(RefCell::new(values.into_iter().map(Into::into).collect()))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl Source for ValueStack {
    fn lookup(&self, _key: &str) -> Option<Value> {
        self.0.borrow_mut().pop()
    }
}

/// Parsed parameters: positional args plus named params.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSource {
    pub args: Vec<Value>,
    pub params: ValueMap,
}

impl ParamSource {
    pub fn new(args: Vec<Value>, params: ValueMap) -> Self {
        Self { args, params }
    }
}

impl Source for ParamSource {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.params.get(key).cloned()
    }

    fn spec(&self) -> Option<&ParamSource> {
        Some(self)
    }
}

/// The first value found for `key`, probing `sources` in order.
pub fn chain_get(key: &str, sources: &[&dyn Source]) -> Option<Value> {
    for (index, source) in sources.iter().enumerate() {
        tracing::trace!(key, index, "probing source");
        if let Some(value) = source.lookup(key) {
            return Some(value);
        }
    }
    None
}

/// Like [`chain_get`], with a value for when nothing is found.
pub fn chain_get_or(key: &str, sources: &[&dyn Source], fallback: Value) -> Value {
    chain_get(key, sources).unwrap_or(fallback)
}

static EXTRA_SOURCES: Lazy<RwLock<Vec<SharedSource>>> = Lazy::new(Default::default);

/// Add a source consulted after the call-site sources of every expansion.
pub fn register_source(source: SharedSource) {
    let mut extra = EXTRA_SOURCES.write().unwrap_or_else(|e| e.into_inner());
    extra.push(source);
}

/// Remove a previously registered source, returning whether it was present.
pub fn unregister_source(source: &SharedSource) -> bool {
    let mut extra = EXTRA_SOURCES.write().unwrap_or_else(|e| e.into_inner());
    let before = extra.len();
    extra.retain(|s| !Arc::ptr_eq(s, source));
    extra.len() != before
}

/// A snapshot of the registered sources, in registration order.
pub fn extra_sources() -> Vec<SharedSource> {
    EXTRA_SOURCES
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

pub fn clear_extra_sources() {
    EXTRA_SOURCES
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}

/// Registers a source for as long as the guard lives.
///
/// ```
/// use std::collections::HashMap;
/// use dkey::{DKey, SourceGuard, Value};
///
/// let key = DKey::implicit("name").unwrap();
/// {
///     let _guard = SourceGuard::push(HashMap::from([("name", "scoped")]));
///     assert_eq!(key.expand(&[]).unwrap(), Some(Value::from("scoped")));
/// }
/// assert_eq!(key.expand(&[]).unwrap(), None);
/// ```
#[must_use = "the source is removed when the guard is dropped"]
pub struct SourceGuard {
    source: SharedSource,
}

impl SourceGuard {
    pub fn push<S: Source + Send + Sync + 'static>(source: S) -> Self {
        Self::push_shared(Arc::new(source))
    }

    pub fn push_shared(source: SharedSource) -> Self {
        register_source(Arc::clone(&source));
        Self { source }
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        unregister_source(&self.source);
    }
}
