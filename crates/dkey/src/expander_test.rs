// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use rstest::rstest;
use serial_test::serial;

use super::*;
use crate::getter::{ParamSource, SourceGuard, ValueStack};
use crate::key::{Ctor, Mark};
use crate::value::{ValueMap, ValueType};

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn implicit(name: &str) -> DKey {
    DKey::implicit(name).expect("Should build implicit key")
}

#[rstest]
fn test_hit() {
    let src = values(&[("test", "blah")]);
    let found = implicit("test").expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("blah")));
}

#[rstest]
fn test_soft_miss_gives_key() {
    let src = values(&[("test_", "blah")]);
    let found = implicit("test").expand(&[&src]).expect("Should expand");
    let key = found
        .as_ref()
        .and_then(Value::as_key)
        .expect("Should be a key, not a literal");
    assert_eq!(key, "blah");
}

#[rstest]
fn test_hard_miss() {
    let src = values(&[]);
    let found = implicit("test").expand(&[&src]).expect("Should expand");
    assert_eq!(found, None);
}

#[rstest]
fn test_hard_miss_with_fallback() {
    let key = DKey::builder("test")
        .implicit()
        .fallback(25)
        .build()
        .expect("Should build key");
    let found = key.expand(&[]).expect("Should expand");
    assert_eq!(found, Some(Value::Int(25)));
}

#[rstest]
fn test_call_site_fallback_wins() {
    let key = DKey::builder("test")
        .implicit()
        .fallback(25)
        .build()
        .expect("Should build key");
    let opts = ExpandOptions::default().with_fallback("call");
    let found = key.expand_with(&[], opts).expect("Should expand");
    assert_eq!(found, Some(Value::from("call")));
}

#[rstest]
fn test_indirect_hit_direct() {
    let src = values(&[("test", "blah")]);
    let key = DKey::new("{test_}").expect("Should build indirect key");
    assert_eq!(key.mark(), Mark::Indirect);
    let found = key.expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("blah")));
}

#[rstest]
fn test_indirect_hit_indirect() {
    let src = values(&[("test_", "blah")]);
    let key = DKey::new("{test_}").expect("Should build indirect key");
    let found = key.expand(&[&src]).expect("Should expand");
    assert_eq!(found.as_ref().and_then(Value::as_key).map(DKey::as_str), Some("blah"));
}

#[rstest]
fn test_indirect_miss_is_itself() {
    let key = DKey::new("{test_}").expect("Should build indirect key");
    let found = key.expand(&[]).expect("Should expand");
    assert_eq!(found, Some(Value::Key(key.clone())));
}

#[rstest]
fn test_lifted_key_expands_further() {
    let src = values(&[("test_", "other"), ("other", "value")]);
    let found = implicit("test").expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("value")));
}

#[rstest]
fn test_multi_key_composition() {
    let src = values(&[("a", "x"), ("b", "y")]);
    let key = DKey::new("{a}/{b}").expect("Should build multi key");
    let found = key.expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("x/y")));
}

#[rstest]
fn test_multi_key_formats_parts() {
    let mut src: HashMap<&str, Value> = HashMap::new();
    src.insert("n", Value::Int(7));
    src.insert("name", Value::from("ab"));
    let key = DKey::new("{name:>4}-{n:03}").expect("Should build multi key");
    let found = key.expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("  ab-007")));
}

#[rstest]
fn test_multi_key_missing_part() {
    let src = values(&[("a", "x")]);
    let key = DKey::new("{a}/{b}").expect("Should build multi key");
    let found = key.expand(&[&src]).expect("Should expand");
    assert_eq!(found, None);
}

#[rstest]
fn test_self_reference_terminates() {
    let src = values(&[("top_", "b"), ("b", "{b}")]);
    let found = implicit("top").expand(&[&src]).expect("Should not recurse forever");
    assert_eq!(found, Some(Value::from("b")));
}

#[rstest]
fn test_max_expansion_limit() {
    let src = values(&[("base", "this is a {name} blah."), ("name", "test")]);
    let key = DKey::builder("base")
        .implicit()
        .max_exp(1)
        .build()
        .expect("Should build key");
    let found = key.expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("this is a {name} blah.")));
}

#[rstest]
fn test_unbounded_nested_expansion() {
    let src = values(&[("base", "this is a {name} blah."), ("name", "test")]);
    let found = implicit("base").expand(&[&src]).expect("Should expand");
    assert_eq!(found, Some(Value::from("this is a test blah.")));
}

#[rstest]
fn test_limit_zero_returns_key() {
    let src = values(&[("base", "value")]);
    let key = implicit("base");
    let opts = ExpandOptions::default().with_limit(0);
    let found = key.expand_with(&[&src], opts).expect("Should expand");
    assert_eq!(found, Some(Value::Key(key)));
}

#[rstest]
fn test_cycle_is_fatal() {
    let src = values(&[("a", "{b}"), ("b", "{a}")]);
    let err = implicit("a")
        .expand(&[&src])
        .expect_err("Should detect the cycle");
    match err {
        Error::Recursion { key, chain } => {
            assert_eq!(key, "a");
            assert_eq!(chain, vec!["a", "b", "a"]);
        }
        other => panic!("Expected a recursion error, got {other:?}"),
    }
}

#[rstest]
fn test_cycle_with_fallback_is_still_fatal() {
    let src = values(&[("a", "{b}"), ("b", "{a}")]);
    let opts = ExpandOptions::default().with_fallback("nope");
    let err = implicit("a")
        .expand_with(&[&src], opts)
        .expect_err("Should detect the cycle");
    assert!(err.is_fatal_expansion());
}

#[rstest]
fn test_cycle_with_finite_limit_stops() {
    let src = values(&[("a", "{b}"), ("b", "{a}")]);
    let opts = ExpandOptions::default().with_limit(5);
    let found = implicit("a")
        .expand_with(&[&src], opts)
        .expect("A finite limit should stop without an error");
    match found {
        Some(Value::Str(text)) => assert!(text.starts_with('{'), "got {text:?}"),
        other => panic!("Expected the unexpanded text, got {other:?}"),
    }
}

#[rstest]
fn test_wide_template_is_not_deep() {
    let count = RECURSION_GUARD + 50;
    let mut src: HashMap<String, String> = (0..count)
        .map(|i| (format!("k{i}"), "{v}".to_string()))
        .collect();
    src.insert("v".to_string(), "x".to_string());
    let template = (0..count)
        .map(|i| format!("{{k{i}}}"))
        .collect::<Vec<_>>()
        .join(".");

    let key = DKey::new(template).expect("Should build key");
    let found = key.expand(&[&src]).expect("Should expand every sub-key");
    assert_eq!(found, Some(Value::from(vec!["x"; count].join("."))));
}

#[rstest]
fn test_int_conversion() {
    let src = values(&[("test", "25")]);
    let key = DKey::new("{test!i}").expect("Should build key");
    let found = key.expand(&[&src]).expect("Should convert");
    assert_eq!(found, Some(Value::Int(25)));
}

#[rstest]
fn test_int_conversion_failure() {
    let src = values(&[("test", "twenty")]);
    let key = DKey::new("{test!i}").expect("Should build key");
    let err = key.expand(&[&src]).expect_err("Should fail to convert");
    assert!(matches!(err, Error::Conversion { .. }));
}

#[rstest]
fn test_float_conversion() {
    let src = values(&[("ratio", "0.5")]);
    let key = DKey::new("{ratio!f}").expect("Should build key");
    assert_eq!(key.expand(&[&src]).expect("Should convert"), Some(Value::Float(0.5)));
}

#[rstest]
fn test_strang_conversion() {
    let src = values(&[("task", "group::a.b")]);
    let key = DKey::new("{task!S}").expect("Should build key");
    let found = key.expand(&[&src]).expect("Should convert");
    let Some(Value::Strang(task)) = found else {
        panic!("Expected a structured string, got {found:?}");
    };
    assert_eq!(task.word(1, -1), Some("b"));
}

#[rstest]
fn test_unknown_conversion_falls_back() {
    let src = values(&[("x", "value")]);
    let key = DKey::new("{x!z}").expect("Should build key");
    assert_eq!(key.expand(&[&src]).expect("Should expand"), None);

    let opts = ExpandOptions::default().with_fallback("fb");
    let found = key.expand_with(&[&src], opts).expect("Should expand");
    assert_eq!(found, Some(Value::from("fb")));
}

#[rstest]
fn test_str_key_stringifies() {
    let mut src: HashMap<&str, Value> = HashMap::new();
    src.insert("count", Value::Int(3));
    let key = DKey::new("{count!s}").expect("Should build key");
    assert_eq!(key.mark(), Mark::Str);
    assert_eq!(key.expand(&[&src]).expect("Should expand"), Some(Value::from("3")));
}

#[rstest]
fn test_path_key_is_absolute() {
    let src = values(&[("dir", "some/relative")]);
    let key = DKey::new("{dir!p}").expect("Should build key");
    assert_eq!(key.mark(), Mark::Path);
    let found = key.expand(&[&src]).expect("Should expand");
    let path = found
        .as_ref()
        .and_then(Value::as_path)
        .expect("Should be a path");
    assert!(path.is_absolute());
    assert!(path.ends_with("some/relative"));
}

#[rstest]
fn test_typecheck_pass() {
    let mut src: HashMap<&str, Value> = HashMap::new();
    src.insert("n", Value::Int(3));
    let key = DKey::builder("n")
        .implicit()
        .check(ValueType::Int)
        .build()
        .expect("Should build key");
    assert_eq!(key.expand(&[&src]).expect("Should expand"), Some(Value::Int(3)));
}

#[rstest]
fn test_typecheck_mismatch_is_fatal() {
    let src = values(&[("n", "three")]);
    let key = DKey::builder("n")
        .implicit()
        .check(ValueType::Int)
        .fallback(0)
        .build()
        .expect("Should build key");
    let err = key.expand(&[&src]).expect_err("Should fail the type check");
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[rstest]
fn test_custom_ctor() {
    let src = values(&[("name", "quiet")]);
    let key = DKey::builder("name")
        .implicit()
        .ctor(Ctor::custom(|v| Ok(Value::Str(v.to_string().to_uppercase()))))
        .build()
        .expect("Should build key");
    assert_eq!(key.expand(&[&src]).expect("Should expand"), Some(Value::from("QUIET")));
}

#[rstest]
fn test_null_key_is_itself() {
    let key = DKey::new("plain text").expect("Should build null key");
    assert!(key.is_null());
    let found = key.expand(&[]).expect("Should expand");
    assert_eq!(found, Some(Value::from("plain text")));
}

#[rstest]
fn test_source_order() {
    let first = values(&[("name", "first")]);
    let second = values(&[("name", "second"), ("other", "second")]);
    let sources: [&dyn Source; 2] = [&first, &second];
    assert_eq!(
        implicit("name").expand(&sources).expect("Should expand"),
        Some(Value::from("first"))
    );
    assert_eq!(
        implicit("other").expand(&sources).expect("Should expand"),
        Some(Value::from("second"))
    );
}

#[rstest]
fn test_value_stack_source() {
    let stack = ValueStack::new(["bottom", "top"]);
    let key = implicit("anything");
    assert_eq!(key.expand(&[&stack]).expect("Should expand"), Some(Value::from("top")));
    assert_eq!(stack.len(), 1);
}

#[rstest]
fn test_args_and_kwargs() {
    let mut params = ValueMap::new();
    params.insert("verbose".to_string(), Value::Bool(true));
    let spec = ParamSource::new(vec![Value::from("in.txt"), Value::Int(2)], params.clone());

    let args = DKey::builder("args")
        .implicit()
        .mark(Mark::Args)
        .build()
        .expect("Should build args key");
    let kwargs = DKey::builder("kwargs")
        .implicit()
        .mark(Mark::Kwargs)
        .build()
        .expect("Should build kwargs key");
    let plain = values(&[("args", "ignored")]);
    let sources: [&dyn Source; 2] = [&plain, &spec];

    assert_eq!(
        args.expand(&sources).expect("Should expand"),
        Some(Value::List(vec![Value::from("in.txt"), Value::Int(2)]))
    );
    assert_eq!(kwargs.expand(&sources).expect("Should expand"), Some(Value::Map(params)));
}

#[rstest]
fn test_args_without_param_source() {
    let args = DKey::builder("args")
        .implicit()
        .mark(Mark::Args)
        .build()
        .expect("Should build args key");
    assert_eq!(args.expand(&[]).expect("Should expand"), Some(Value::List(Vec::new())));
}

#[rstest]
#[serial(extra_sources)]
fn test_extra_sources_come_last() {
    let local = values(&[("expander_test_name", "local")]);
    let _guard = SourceGuard::push(values(&[
        ("expander_test_name", "global"),
        ("expander_test_only", "global"),
    ]));
    let key = implicit("expander_test_name");
    assert_eq!(key.expand(&[&local]).expect("Should expand"), Some(Value::from("local")));
    let key = implicit("expander_test_only");
    assert_eq!(key.expand(&[&local]).expect("Should expand"), Some(Value::from("global")));
}

#[rstest]
fn test_redirect() {
    let src = values(&[("test_", "blah"), ("many_", "ignored")]);
    let key = implicit("test");
    let keys = key.redirect(&[&src], false).expect("Should redirect");
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0], "blah");

    let missing = implicit("missing");
    let keys = missing.redirect(&[&src], false).expect("Should redirect");
    assert!(DKey::ptr_eq(&keys[0], &missing));
}

#[rstest]
fn test_redirect_multi() {
    let mut src: HashMap<&str, Value> = HashMap::new();
    src.insert(
        "many_",
        Value::List(vec![Value::from("a"), Value::from("{b}/{c}")]),
    );
    let key = implicit("many");

    let keys = key.redirect(&[&src], true).expect("Should redirect");
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], "a");
    assert!(keys[1].is_multi());

    let keys = key.redirect(&[&src], false).expect("Should redirect");
    assert_eq!(keys.len(), 1);
}

#[rstest]
fn test_coerce_skips_keys() {
    let key = DKey::new("{n!i}").expect("Should build key");
    let inst = ExpInst::new(Value::Key(implicit("other")), -1);
    let out = coerce(&key, inst.clone()).expect("Should not fail");
    assert_eq!(out, Some(inst));
}

#[rstest]
fn test_coerce_respects_disabled_conversion() {
    let key = DKey::builder("n")
        .implicit()
        .ctor(Ctor::Int)
        .build()
        .expect("Should build key");
    let inst = ExpInst {
        convert: Some(false),
        ..ExpInst::new(Value::from("x"), -1)
    };
    let out = coerce(&key, inst).expect("Should not convert");
    assert_eq!(out.map(|i| i.value), Some(Value::from("x")));
}

#[rstest]
fn test_shared_source() {
    let shared: SharedSource = Arc::new(values(&[("name", "shared")]));
    let found = implicit("name").expand(&[&shared]).expect("Should expand");
    assert_eq!(found, Some(Value::from("shared")));
}
