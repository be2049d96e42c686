// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn expand_cmd(template: &str, dir: &TempDir) -> CmdExpand {
    CmdExpand {
        template: template.to_string(),
        implicit: false,
        mark: None,
        limit: None,
        fallback: None,
        sets: Vec::new(),
        sources: SourceFlags {
            file: dir.path().to_path_buf(),
            no_inherit: true,
            ..Default::default()
        },
        format: "plain".to_string(),
    }
}

#[rstest]
fn test_parse_sets() {
    let sets = vec![
        "name=demo".to_string(),
        "jobs=4".to_string(),
        "debug=true".to_string(),
        "empty=".to_string(),
        "url=http://host/a=b".to_string(),
    ];
    let values = parse_sets(&sets).expect("Should parse sets");
    assert_eq!(values.get("name"), Some(&Value::from("demo")));
    assert_eq!(values.get("jobs"), Some(&Value::Int(4)));
    assert_eq!(values.get("debug"), Some(&Value::Bool(true)));
    assert_eq!(values.get("empty"), Some(&Value::from("")));
    assert_eq!(values.get("url"), Some(&Value::from("http://host/a=b")));
}

#[rstest]
#[case("noequals")]
#[case("<1>pos=3")]
#[case("--flag=3")]
fn test_parse_sets_invalid(#[case] item: &str) {
    assert!(parse_sets(&[item.to_string()]).is_err());
}

#[rstest]
fn test_run_with_source_file() {
    let tmp = TempDir::new().expect("Should create temp dir");
    std::fs::write(
        tmp.path().join(dkey::DKEY_FILENAME),
        "api: dkey/v0\nvalues:\n  root: /data\n  out: \"{root}/build\"\n",
    )
    .expect("Should write source file");

    let mut cmd = expand_cmd("{out}/{name}.txt", &tmp);
    cmd.sets = vec!["name=report".to_string()];
    assert_eq!(cmd.run().expect("Should expand"), 0);

    let mut missing = expand_cmd("{nothing}", &tmp);
    assert_eq!(missing.run().expect("Should run"), 1);
}

#[rstest]
fn test_run_sets_without_source_file() {
    let tmp = TempDir::new().expect("Should create temp dir");
    let mut cmd = expand_cmd("name", &tmp);
    cmd.implicit = true;
    cmd.sources.no_inherit = false;
    cmd.sets = vec!["name=demo".to_string()];
    assert_eq!(cmd.run().expect("Should expand from sets"), 0);
}
