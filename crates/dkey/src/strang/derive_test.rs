// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;
use crate::strang::{Basic, WordValue};

#[fixture]
fn base() -> Strang<Basic> {
    Strang::new("a.b::c").expect("Should parse base strang")
}

#[rstest]
fn test_push_adds_boundary(base: Strang<Basic>) {
    let pushed = base.push(["d"]).expect("Should push");
    assert_eq!(pushed, "a.b::c..d");

    let again = pushed.push(["e", "f"]).expect("Should push twice");
    assert_eq!(again, "a.b::c..d..e.f");
}

#[rstest]
fn test_push_then_pop_is_identity(base: Strang<Basic>) {
    let pushed = base.push(["d"]).expect("Should push");
    assert!(base.is_ancestor_of(&pushed));
    assert!(!pushed.is_ancestor_of(&base));
    assert_eq!(pushed.pop(false).expect("Should pop"), base);
}

#[rstest]
fn test_pop_nearest_and_top(base: Strang<Basic>) {
    let deep = base
        .push(["d"])
        .and_then(|s| s.push(["e"]))
        .expect("Should push");
    assert_eq!(deep, "a.b::c..d..e");
    assert_eq!(deep.pop(false).expect("Should pop"), "a.b::c..d");
    assert_eq!(deep.pop(true).expect("Should pop"), base);
}

#[rstest]
fn test_pop_without_boundary_is_unchanged() {
    let s: Strang = Strang::new("a::b.c").expect("Should parse");
    assert_eq!(s.pop(false).expect("Should pop"), s);
    assert_eq!(s.pop(true).expect("Should pop"), s);
}

#[rstest]
fn test_push_onto_empty_body() {
    let s: Strang = Strang::new("a::").expect("Should parse");
    let pushed = s.push(["c"]).expect("Should push");
    assert_eq!(pushed, "a::.c");
    assert_eq!(pushed.pop(false).expect("Should pop"), s);
}

#[rstest]
#[case("d.e", ".")]
#[case("d::e", "::")]
fn test_push_rejects_separators(base: Strang<Basic>, #[case] word: &str, #[case] sep: &str) {
    let err = base.push([word]).expect_err("Should reject separator");
    match err {
        Error::SeparatorInWord { separator, .. } => assert_eq!(separator, sep),
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn test_push_typed_values(base: Strang<Basic>) {
    let id = Uuid::new_v4();
    let pushed = base
        .push([
            PushValue::Int(3),
            PushValue::Mark(StrangMark::Mark),
            PushValue::Uuid(Some(id)),
        ])
        .expect("Should push typed values");
    assert_eq!(pushed.get(1, -3), Some(WordValue::Int(3)));
    assert_eq!(pushed.get(1, -2), Some(WordValue::Mark(StrangMark::Mark)));
    assert_eq!(pushed.uuid(), Some(id));
}

#[rstest]
fn test_push_second_uuid_fails(base: Strang<Basic>) {
    let uniq = base.to_uniq(&[]).expect("Should make unique");
    let err = uniq
        .push([PushValue::Uuid(None)])
        .expect_err("Should reject a second uuid");
    assert!(matches!(err, Error::TooManyUuids(_)));
}

#[rstest]
fn test_to_uniq_is_idempotent(base: Strang<Basic>) {
    let uniq = base.to_uniq(&[]).expect("Should make unique");
    assert!(uniq.uuid().is_some());
    assert!(uniq.has_mark(StrangMark::Gen));
    assert!(base.is_ancestor_of(&uniq));
    assert_eq!(uniq.to_uniq(&[]).expect("Should stay unique"), uniq);
}

#[rstest]
fn test_to_uniq_with_suffix(base: Strang<Basic>) {
    let uniq = base.to_uniq(&["run"]).expect("Should make unique");
    assert_eq!(uniq.word(1, -1), Some("run"));
}

#[rstest]
fn test_de_uniq(base: Strang<Basic>) {
    let uniq = base.to_uniq(&[]).expect("Should make unique");
    assert_eq!(uniq.de_uniq().expect("Should de_uniq"), base);
    assert_eq!(base.de_uniq().expect("Should de_uniq"), base);
}

#[rstest]
fn test_canon_strips_uuid_and_gen(base: Strang<Basic>) {
    let uniq = base.to_uniq(&[]).expect("Should make unique");
    let canon = uniq.canon().expect("Should canonicalize");
    assert_eq!(canon, base);
    assert_eq!(canon.uuid(), None);

    let suffixed = base.to_uniq(&["run"]).expect("Should make unique");
    assert_eq!(suffixed.canon().expect("Should canonicalize"), "a.b::c..run");
}

proptest! {
    #[test]
    fn prop_push_pop_laws(
        body in prop::collection::vec("[a-z]{1,5}", 1..4),
        word in "[a-z]{1,5}",
    ) {
        let x: Strang = Strang::new(format!("root::{}", body.join("."))).expect("Should parse");
        let pushed = x.push([word.as_str()]).expect("Should push");
        prop_assert!(x.is_ancestor_of(&pushed));
        prop_assert!(!pushed.is_ancestor_of(&x));
        prop_assert_eq!(pushed.pop(false).expect("Should pop"), x);
    }
}
