// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

fn strang_cmd(text: &str) -> CmdStrang {
    CmdStrang {
        text: text.to_string(),
        code: false,
        push: Vec::new(),
        pop: false,
        top: false,
        uniq: false,
        canon: false,
        plain: true,
    }
}

#[rstest]
#[case("word", PushValue::Word("word".to_string()))]
#[case("42", PushValue::Int(42))]
#[case("-3", PushValue::Int(-3))]
#[case("007", PushValue::Word("007".to_string()))]
#[case("+5", PushValue::Word("+5".to_string()))]
#[case("$gen$", PushValue::Mark(StrangMark::Gen))]
#[case("$head$", PushValue::Mark(StrangMark::Head))]
#[case("$nope$", PushValue::Word("$nope$".to_string()))]
#[case("<uuid>", PushValue::Uuid(None))]
fn test_parse_push(#[case] word: &str, #[case] expected: PushValue) {
    assert_eq!(parse_push(word), expected);
}

#[rstest]
fn test_derive_pop_then_push() {
    let mut cmd = strang_cmd("a.b::c..d");
    cmd.pop = true;
    cmd.push = vec!["e".to_string(), "7".to_string()];
    let base = Strang::<dkey::Basic>::new(&cmd.text).expect("Should parse");
    let derived = cmd.derive(base).expect("Should derive");
    assert_eq!(derived, "a.b::c..e.7");
}

#[rstest]
fn test_derive_uniq() {
    let mut cmd = strang_cmd("a.b::c");
    cmd.uniq = true;
    let base = Strang::<dkey::Basic>::new(&cmd.text).expect("Should parse");
    let derived = cmd.derive(base.clone()).expect("Should derive");
    assert!(derived.uuid().is_some());
    assert!(base.is_ancestor_of(&derived));
}

#[rstest]
fn test_run_code_reference() {
    let mut cmd = strang_cmd("tools::pkg.mod:func");
    cmd.code = true;
    assert_eq!(cmd.run().expect("Should inspect code reference"), 0);
}

#[rstest]
fn test_run_rejects_separator_push() {
    let mut cmd = strang_cmd("a.b::c");
    cmd.push = vec!["d.e".to_string()];
    assert!(cmd.run().is_err());
}
