//! Runs the `dsm-lint` binary against throwaway projects.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const LEAKY_MAPPER: &str = r#"
using Demoulas.ProfitSharing.Common.Contracts.Response;

namespace Demoulas.ProfitSharing.Services;

public class Mapper
{
    public MemberResponse Map(Demographic d) => new MemberResponse { Ssn = d.Ssn };
}
"#;

const MEMBER_RESPONSE: &str = r#"
namespace Demoulas.ProfitSharing.Common.Contracts.Response;

public class MemberResponse
{
    public string Ssn { get; set; } = string.Empty;
}
"#;

const ROUNDING: &str = r#"
namespace Demoulas.ProfitSharing.Services;

public static class Vesting
{
    public static decimal Amount(decimal balance) => Math.Round(balance, 2);
}
"#;

/// A temp project rooted at a `.git` directory so config discovery stays inside it.
fn project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    for (path, text) in files {
        let full = tmp.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, text).unwrap();
    }
    tmp
}

fn dsm_lint(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dsm-lint").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1").arg("--color").arg("never");
    cmd
}

#[test]
fn error_findings_fail_the_run() {
    let tmp = project(&[
        ("src/Mapper.cs", LEAKY_MAPPER),
        ("src/Contracts/MemberResponse.cs", MEMBER_RESPONSE),
    ]);
    dsm_lint(tmp.path())
        .args(["check", "src"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DSM001"))
        .stdout(predicate::str::contains("Found 1 issue in 1 file"));
}

#[test]
fn exit_zero_reports_but_succeeds() {
    let tmp = project(&[
        ("src/Mapper.cs", LEAKY_MAPPER),
        ("src/Contracts/MemberResponse.cs", MEMBER_RESPONSE),
    ]);
    dsm_lint(tmp.path())
        .args(["check", "src", "--exit-zero"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DSM001"));
}

#[test]
fn warnings_pass_unless_strict() {
    let tmp = project(&[("Vesting.cs", ROUNDING)]);
    dsm_lint(tmp.path())
        .args(["check", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("DSM008"));
    dsm_lint(tmp.path())
        .args(["check", ".", "--strict"])
        .assert()
        .code(1);
}

#[test]
fn clean_project_passes() {
    let tmp = project(&[("src/Contracts/MemberResponse.cs", MEMBER_RESPONSE)]);
    dsm_lint(tmp.path())
        .args(["check", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed!"));
}

#[test]
fn json_output_is_machine_readable() {
    let tmp = project(&[("Vesting.cs", ROUNDING)]);
    let output = dsm_lint(tmp.path())
        .args(["check", ".", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["diagnostics"][0]["code"], "DSM008");
    assert_eq!(json["diagnostics"][0]["location"]["start_line"], 6);
    assert_eq!(json["summary"]["warnings"], 1);
}

#[test]
fn sarif_output_lists_every_rule() {
    let tmp = project(&[("Vesting.cs", ROUNDING)]);
    let output = dsm_lint(tmp.path())
        .args(["check", ".", "--format", "sarif"])
        .output()
        .unwrap();
    let sarif: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is SARIF");
    assert_eq!(sarif["version"], "2.1.0");
    let rules = sarif["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 12);
    assert_eq!(sarif["runs"][0]["results"][0]["ruleId"], "DSM008");
}

#[test]
fn discovered_config_excludes_rules() {
    let tmp = project(&[
        ("Vesting.cs", ROUNDING),
        (".dsm-lint.toml", "[rules]\nexclude = [\"DSM008\"]\n"),
    ]);
    dsm_lint(tmp.path())
        .args(["check", ".", "--strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed!"));
}

#[test]
fn invalid_config_is_a_config_error() {
    let tmp = project(&[
        ("Vesting.cs", ROUNDING),
        (".dsm-lint.toml", "[rules]\nselect = [\"NOPE1\"]\n"),
    ]);
    dsm_lint(tmp.path())
        .args(["check", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("NOPE1"));
}

#[test]
fn missing_path_is_an_io_error() {
    let tmp = project(&[]);
    dsm_lint(tmp.path())
        .args(["check", "does-not-exist"])
        .assert()
        .code(3);
}

#[test]
fn undecodable_file_fails_the_run() {
    let tmp = project(&[("src/Contracts/MemberResponse.cs", MEMBER_RESPONSE)]);
    fs::write(tmp.path().join("src/Legacy.cs"), [0xff, 0xfe, 0x00, b'c']).unwrap();
    dsm_lint(tmp.path())
        .args(["check", "."])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("1 file could not be analyzed"))
        .stdout(predicate::str::contains("All checks passed!").not());
}

#[test]
fn unknown_rule_code_is_a_usage_error() {
    let tmp = project(&[]);
    dsm_lint(tmp.path())
        .args(["check", ".", "--select", "DSM999"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown rule code 'DSM999'"));
}

#[test]
fn rules_lists_every_code() {
    let tmp = project(&[]);
    let assert = dsm_lint(tmp.path()).arg("rules").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for code in ["DSM001", "DSM007", "DSM013", "DSMPS001"] {
        assert!(stdout.contains(code), "missing {code} in:\n{stdout}");
    }

    let output = dsm_lint(tmp.path()).args(["rules", "--format", "json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("rules JSON");
    assert_eq!(json.as_array().map(Vec::len), Some(12));
}

#[test]
fn init_writes_a_config_once() {
    let tmp = project(&[]);
    dsm_lint(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .dsm-lint.toml"));
    let written = fs::read_to_string(tmp.path().join(".dsm-lint.toml")).unwrap();
    assert!(written.contains("[analysis]"));

    dsm_lint(tmp.path())
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
    dsm_lint(tmp.path()).args(["init", "--force"]).assert().success();
}
