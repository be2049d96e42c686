// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn init_cmd(dir: &TempDir, template: &str) -> CmdInit {
    CmdInit {
        path: dir.path().to_path_buf(),
        inherit: false,
        sets: Vec::new(),
        template: template.to_string(),
    }
}

#[rstest]
#[case("minimal")]
#[case("standard")]
fn test_init_writes_loadable_file(#[case] template: &str) {
    let tmp = TempDir::new().expect("Should create temp dir");
    let mut cmd = init_cmd(&tmp, template);
    cmd.inherit = true;
    assert_eq!(cmd.run().expect("Should init"), 0);

    let path = tmp.path().join(dkey::DKEY_FILENAME);
    let file = dkey::SourceFile::load(&path).expect("Should load created file");
    assert!(file.inherit);
    assert!(file.values.is_empty());
}

#[rstest]
fn test_init_with_values() {
    let tmp = TempDir::new().expect("Should create temp dir");
    let mut cmd = init_cmd(&tmp, "standard");
    cmd.sets = vec!["root=/data".to_string(), "jobs=4".to_string()];
    cmd.run().expect("Should init");

    let path = tmp.path().join(dkey::DKEY_FILENAME);
    let file = dkey::SourceFile::load(&path).expect("Should load created file");
    use dkey::Source;
    assert_eq!(file.lookup("root"), Some(dkey::Value::from("/data")));
    assert_eq!(file.lookup("jobs"), Some(dkey::Value::Int(4)));
}

#[rstest]
fn test_init_refuses_existing_file() {
    let tmp = TempDir::new().expect("Should create temp dir");
    std::fs::write(tmp.path().join(dkey::DKEY_FILENAME), "api: dkey/v0\n")
        .expect("Should write file");
    let mut cmd = init_cmd(&tmp, "minimal");
    assert!(cmd.run().is_err());
}
