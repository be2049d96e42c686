// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case(Value::None, ValueType::None)]
#[case(Value::Bool(true), ValueType::Bool)]
#[case(Value::Int(1), ValueType::Int)]
#[case(Value::Float(1.5), ValueType::Float)]
#[case(Value::from("x"), ValueType::Str)]
#[case(Value::from(PathBuf::from("/tmp")), ValueType::Path)]
#[case(Value::List(Vec::new()), ValueType::List)]
#[case(Value::Map(ValueMap::new()), ValueType::Map)]
fn test_value_type(#[case] value: Value, #[case] expected: ValueType) {
    assert_eq!(value.value_type(), expected);
}

#[rstest]
fn test_display() {
    let mut map = ValueMap::new();
    map.insert("a".to_string(), Value::Int(1));
    map.insert("b".to_string(), Value::List(vec![Value::from("x"), Value::Bool(false)]));
    assert_eq!(Value::Map(map).to_string(), "{a: 1, b: [x, false]}");

    let key = DKey::implicit("name").expect("Should build key");
    assert_eq!(Value::Key(key).to_string(), "{name}");
}

#[rstest]
fn test_from_yaml() {
    let yaml: serde_yaml::Value = serde_yaml::from_str(
        r#"
name: test
count: 3
ratio: 0.5
flag: true
empty: ~
items: [a, 1]
nested:
  inner: value
1: numeric key
"#,
    )
    .expect("Should parse yaml");
    let value = Value::from(yaml);
    let map = value.as_map().expect("Should be a map");

    assert_eq!(map["name"], Value::from("test"));
    assert_eq!(map["count"], Value::Int(3));
    assert_eq!(map["ratio"], Value::Float(0.5));
    assert_eq!(map["flag"], Value::Bool(true));
    assert_eq!(map["empty"], Value::None);
    assert_eq!(map["items"], Value::List(vec![Value::from("a"), Value::Int(1)]));
    assert_eq!(
        map["nested"].as_map().and_then(|m| m.get("inner")),
        Some(&Value::from("value"))
    );
    assert_eq!(map["1"], Value::from("numeric key"));
}

#[rstest]
fn test_serialize() {
    let mut map = ValueMap::new();
    map.insert("path".to_string(), Value::from(PathBuf::from("/tmp/x")));
    map.insert("n".to_string(), Value::Int(2));
    let yaml = serde_yaml::to_string(&Value::Map(map)).expect("Should serialize");
    assert_eq!(yaml, "path: /tmp/x\nn: 2\n");
}

#[rstest]
fn test_typecheck() {
    assert!(TypeCheck::Any.accepts(&Value::None));
    assert!(TypeCheck::from(ValueType::Int).accepts(&Value::Int(1)));
    assert!(!TypeCheck::from(ValueType::Int).accepts(&Value::from("1")));

    let either = TypeCheck::OneOf(vec![ValueType::Str, ValueType::Path]);
    assert!(either.accepts(&Value::from("x")));
    assert!(!either.accepts(&Value::Int(1)));

    let ints = TypeCheck::ListOf(Box::new(ValueType::Int.into()));
    assert!(ints.accepts(&Value::List(vec![Value::Int(1), Value::Int(2)])));
    assert!(!ints.accepts(&Value::List(vec![Value::Int(1), Value::from("2")])));
    assert!(!ints.accepts(&Value::Int(1)));

    let map_of = TypeCheck::MapOf(Box::new(ValueType::Str.into()));
    let mut map = ValueMap::new();
    map.insert("a".to_string(), Value::from("x"));
    assert!(map_of.accepts(&Value::Map(map)));
}

#[rstest]
fn test_typecheck_display() {
    let check = TypeCheck::ListOf(Box::new(TypeCheck::OneOf(vec![
        ValueType::Str,
        ValueType::Int,
    ])));
    assert_eq!(check.to_string(), "list[str | int]");
}
