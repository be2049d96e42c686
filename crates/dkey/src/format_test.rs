// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case("", Value::from("abc"), "abc")]
#[case(">5", Value::from("abc"), "  abc")]
#[case("<5", Value::from("abc"), "abc  ")]
#[case("^7", Value::from("abc"), "  abc  ")]
#[case("*^7", Value::from("abc"), "**abc**")]
#[case("5", Value::from("abc"), "abc  ")]
#[case("5", Value::Int(42), "   42")]
#[case("05", Value::Int(-42), "-0042")]
#[case(".2", Value::Float(1.23456), "1.23")]
#[case(".2f", Value::Int(3), "3.00")]
#[case("f", Value::Float(0.5), "0.500000")]
#[case("d", Value::Float(7.9), "7")]
#[case(".2", Value::from("abcdef"), "ab")]
#[case("2", Value::from("abcdef"), "abcdef")]
fn test_apply(#[case] spec: &str, #[case] value: Value, #[case] expected: &str) {
    let spec = FormatSpec::parse(spec).expect("Should parse format spec");
    assert_eq!(spec.apply(&value), expected);
}

#[rstest]
fn test_parse_fields() {
    let spec = FormatSpec::parse("_<010.3f").expect("Should parse format spec");
    assert_eq!(spec.fill, '_');
    assert_eq!(spec.align, Some(Align::Left));
    assert!(spec.zero);
    assert_eq!(spec.width, Some(10));
    assert_eq!(spec.precision, Some(3));
    assert_eq!(spec.kind, Some('f'));
}

#[rstest]
#[case("x")]
#[case(">5q")]
#[case("5.")]
#[case("ss")]
fn test_parse_invalid(#[case] spec: &str) {
    let err = FormatSpec::parse(spec).expect_err("Should reject format spec");
    assert!(matches!(err, Error::MalformedFormat { .. }));
}
