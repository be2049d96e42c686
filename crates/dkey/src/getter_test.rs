// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use serial_test::serial;

use super::*;

#[rstest]
fn test_chain_get_order() {
    let first = HashMap::from([("a", "first")]);
    let second = BTreeMap::from([("a", "second"), ("b", "second")]);
    let sources: [&dyn Source; 2] = [&first, &second];

    assert_eq!(chain_get("a", &sources), Some(Value::from("first")));
    assert_eq!(chain_get("b", &sources), Some(Value::from("second")));
    assert_eq!(chain_get("c", &sources), None);
}

#[rstest]
fn test_chain_get_or() {
    let empty: HashMap<String, String> = HashMap::new();
    assert_eq!(chain_get_or("x", &[&empty], Value::Int(1)), Value::Int(1));
}

#[rstest]
fn test_index_map_source() {
    let mut map: IndexMap<String, i64> = IndexMap::new();
    map.insert("n".to_string(), 4);
    assert_eq!(map.lookup("n"), Some(Value::Int(4)));
}

#[rstest]
fn test_yaml_mapping_source() {
    let mapping: serde_yaml::Mapping =
        serde_yaml::from_str("name: test\ncount: 3\nitems: [a, b]").expect("Should parse yaml");
    assert_eq!(mapping.lookup("name"), Some(Value::from("test")));
    assert_eq!(mapping.lookup("count"), Some(Value::Int(3)));
    assert_eq!(
        mapping.lookup("items"),
        Some(Value::List(vec![Value::from("a"), Value::from("b")]))
    );
    assert_eq!(mapping.lookup("missing"), None);
}

#[rstest]
fn test_value_map_source() {
    let mut map = ValueMap::new();
    map.insert("k".to_string(), Value::from("v"));
    let value = Value::Map(map);
    assert_eq!(value.lookup("k"), Some(Value::from("v")));
    assert_eq!(Value::from("not a map").lookup("k"), None);
}

#[rstest]
fn test_value_stack_pops() {
    let stack = ValueStack::new([1, 2, 3]);
    assert_eq!(stack.lookup("ignored"), Some(Value::Int(3)));
    assert_eq!(stack.lookup("ignored"), Some(Value::Int(2)));
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.lookup("ignored"), Some(Value::Int(1)));
    assert!(stack.is_empty());
    assert_eq!(stack.lookup("ignored"), None);
}

#[rstest]
fn test_param_source_spec() {
    let mut params = ValueMap::new();
    params.insert("flag".to_string(), Value::Bool(true));
    let spec = ParamSource::new(vec![Value::Int(1)], params);

    assert_eq!(spec.lookup("flag"), Some(Value::Bool(true)));
    let plain: HashMap<String, String> = HashMap::new();
    let sources: [&dyn Source; 2] = [&plain, &spec];
    let found = sources.iter().find_map(|s| s.spec());
    assert_eq!(found.map(|s| s.args.len()), Some(1));
}

#[rstest]
#[serial(extra_sources)]
fn test_source_guard_scope() {
    let before = extra_sources().len();
    {
        let guard = SourceGuard::push(HashMap::from([("getter_test_key", "v")]));
        let extra = extra_sources();
        assert_eq!(extra.len(), before + 1);
        assert!(Arc::ptr_eq(extra.last().expect("Should have a source"), guard.source()));
    }
    assert_eq!(extra_sources().len(), before);
}

#[rstest]
#[serial(extra_sources)]
fn test_register_and_unregister() {
    let source: SharedSource = Arc::new(HashMap::from([("getter_test_key", "v")]));
    register_source(Arc::clone(&source));
    assert!(unregister_source(&source));
    assert!(!unregister_source(&source));
}
