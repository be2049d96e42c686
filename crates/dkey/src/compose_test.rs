// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;
use crate::source_file::ExpansionSettings;
use crate::DKey;

fn make_file(yaml_values: &str, source_path: Option<&str>) -> SourceFile {
    SourceFile {
        values: serde_yaml::from_str(yaml_values).expect("Should parse values"),
        source_path: source_path.map(PathBuf::from),
        ..Default::default()
    }
}

#[rstest]
fn test_compose_empty() {
    let composed = compose_sources(&[]);
    assert!(composed.is_empty());
    assert_eq!(composed.source_count(), 0);
    assert_eq!(composed.limit, None);
}

#[rstest]
fn test_compose_single() {
    let composed = compose_sources(&[make_file("a: 1\nb: two", Some("/x/.dkey.yaml"))]);
    assert_eq!(composed.values.len(), 2);
    assert_eq!(composed.lookup("a"), Some(Value::Int(1)));
    assert_eq!(composed.source_files, vec![PathBuf::from("/x/.dkey.yaml")]);
}

#[rstest]
fn test_later_files_win() {
    let files = vec![
        make_file("name: parent\nonly_parent: p", Some("/parent/.dkey.yaml")),
        make_file("name: child", Some("/parent/child/.dkey.yaml")),
    ];
    let composed = compose_sources(&files);

    assert_eq!(composed.lookup("name"), Some(Value::from("child")));
    assert_eq!(composed.lookup("only_parent"), Some(Value::from("p")));
    // First-defined order is kept
    let names: Vec<&str> = composed.values.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["name", "only_parent"]);
    assert_eq!(composed.source_count(), 2);
}

#[rstest]
fn test_last_limit_wins() {
    let mut first = make_file("{}", None);
    first.settings = Some(ExpansionSettings { limit: Some(3) });
    let mut second = make_file("{}", None);
    second.settings = Some(ExpansionSettings { limit: Some(7) });
    let third = make_file("{}", None);

    let composed = compose_sources(&[first, second, third]);
    assert_eq!(composed.limit, Some(7));
}

#[rstest]
fn test_composed_expansion() {
    let files = vec![
        make_file("root: /data\nout: \"{root}/build\"", None),
        make_file("root: /scratch", None),
    ];
    let composed = compose_sources(&files);
    let key = DKey::implicit("out").expect("Should build key");
    assert_eq!(
        key.expand(&[&composed]).expect("Should expand"),
        Some(Value::from("/scratch/build"))
    );
}
