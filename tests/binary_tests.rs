// SPDX-License-Identifier: MIT

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn analyzer() -> Command {
    Command::cargo_bin("solidity-analyzer").expect("binary builds")
}

#[test]
fn test_clean_contract_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Clean.sol"),
        "pragma solidity ^0.8.0;\n\ncontract Clean {\n    uint256 internal total;\n\n    function add(uint256 a, uint256 b) public pure returns (uint256) {\n        return a + b;\n    }\n}\n"
    )
    .unwrap();

    analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "--no-color"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("0 problem(s)"));
}

#[test]
fn test_error_finding_exits_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Phish.sol"),
        "pragma solidity ^0.8.0;\ncontract Phish { function f() public view { require(tx.origin == msg.sender, \"denied\"); } }\n"
    )
    .unwrap();

    analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("security/tx-origin"));
}

#[test]
fn test_parse_error_only_exits_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Broken.sol"), "not solidity at all {{{").unwrap();

    analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "--no-color"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("parse error"));
}

#[test]
fn test_no_files_is_usage_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No Solidity files"));
}

#[test]
fn test_json_output_is_parseable() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Phish.sol"),
        "contract Phish { function f() public view { require(tx.origin == msg.sender, \"denied\"); } }\n"
    )
    .unwrap();

    let output = analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "-f", "json", "--no-color"])
        .output()
        .expect("run");
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid json");
    assert_eq!(parsed["total_issues"].as_u64().map(|n| n >= 1), Some(true));
    assert!(parsed["files"].is_array());
}

#[test]
fn test_fix_rewrites_file_with_backup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Flag.sol");
    fs::write(
        &path,
        "contract Flag {\n    bool internal flag;\n\n    function f() public view returns (bool) {\n        return flag == true;\n    }\n}\n"
    )
    .unwrap();

    analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "--no-color", "--fix", "--backup"])
        .assert()
        .stdout(predicate::str::contains("1 fix(es) applied"));

    let fixed = fs::read_to_string(&path).unwrap();
    assert!(fixed.contains("return flag;"));
    let backup = fs::read_to_string(dir.path().join("Flag.sol.bak")).unwrap();
    assert!(backup.contains("flag == true"));
}

#[test]
fn test_diff_previews_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Flag.sol");
    let source = "contract Flag {\n    bool internal flag;\n\n    function f() public view returns (bool) {\n        return flag == true;\n    }\n}\n";
    fs::write(&path, source).unwrap();

    analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "--no-color", "--diff"])
        .assert()
        .stdout(predicate::str::contains("- flag == true"))
        .stdout(predicate::str::contains("+ flag"));

    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn test_rules_subcommand_lists_catalog() {
    analyzer()
        .args(["rules", "--no-color"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("security/tx-origin"))
        .stdout(predicate::str::contains("Gas rules"))
        .stdout(predicate::str::contains("lint/boolean-equality"));
}

#[test]
fn test_json_output_for_invalid_file_lists_parse_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Broken.sol"), "garbage {{{").unwrap();

    let output = analyzer()
        .current_dir(dir.path())
        .args(["check", ".", "--no-cache", "--quiet", "-f", "json", "--no-color"])
        .output()
        .expect("run");
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid json");
    assert_eq!(parsed["has_parse_errors"], serde_json::Value::Bool(true));
}
