//! `.dsm-lint.toml` settings flowing through the engine.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use dsm_lint::error::exit_code;
use dsm_lint::lint::{DiagnosticSeverity, LintConfig, LintEngine, RuleCode};
use dsm_lint::lint_config::{discover_and_load_config, LintFileConfig, CONFIG_FILE_NAME};

const ROUNDING: &str = r#"
namespace Demoulas.ProfitSharing.Services;

public static class Vesting
{
    public static decimal Amount(decimal balance, decimal pct) => Math.Round(balance * pct, 2);
}
"#;

fn engine_for(toml: &str) -> LintEngine {
    let file = LintFileConfig::parse(toml).expect("config parses");
    file.validate().expect("config validates");
    LintEngine::new(LintConfig::default().with_file_config(&file)).expect("engine builds")
}

#[test]
fn custom_analysis_vocabulary() {
    let engine = engine_for(
        r#"
[analysis]
response_namespaces = ["Acme.Api.Responses"]
mask_attribute = "Redact"
restricted_members = []
restricted_invocations = ["LegacyReader.ReadAll"]
"#,
    );

    let card = r#"
namespace Acme.Api.Responses;

public class EmployeeCard
{
    public DateOnly DateOfBirth { get; set; }
    [Redact] public int Age { get; set; }
}
"#;
    let job = r#"
namespace Acme.Jobs;

public class Sync
{
    public void Run(Db db)
    {
        var rows = LegacyReader.ReadAll();
        var all = db.Demographics;
    }
}
"#;

    let report = engine
        .check_sources([("EmployeeCard.cs", card), ("Sync.cs", job)])
        .unwrap();

    let dsm002: Vec<_> = report.diagnostics.iter().filter(|d| d.rule == RuleCode::DSM002).collect();
    assert_eq!(dsm002.len(), 1);
    assert_eq!(dsm002[0].args, vec!["DateOfBirth", "EmployeeCard", "Redact"]);

    let restricted: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.rule == RuleCode::DSMPS001)
        .collect();
    assert_eq!(restricted.len(), 1, "got: {:?}", report.diagnostics);
    assert_eq!(restricted[0].args, vec!["LegacyReader.ReadAll"]);
    assert_eq!(restricted[0].file, PathBuf::from("Sync.cs"));
}

#[test]
fn default_vocabulary_ignores_other_namespaces() {
    let card = r#"
namespace Acme.Api.Responses;

public class EmployeeCard
{
    public DateOnly DateOfBirth { get; set; }
}
"#;
    let report = LintEngine::new(LintConfig::default())
        .unwrap()
        .check_sources([("EmployeeCard.cs", card)])
        .unwrap();
    assert!(report.diagnostics.is_empty(), "got: {:?}", report.diagnostics);
}

#[test]
fn severity_override_changes_the_exit_code() {
    let default_report = LintEngine::new(LintConfig::default())
        .unwrap()
        .check_sources([("Vesting.cs", ROUNDING)])
        .unwrap();
    assert_eq!(default_report.diagnostics.len(), 1);
    assert_eq!(default_report.diagnostics[0].severity, DiagnosticSeverity::Warning);
    assert_eq!(default_report.exit_code(false), exit_code::CLEAN);

    let engine = engine_for(
        r#"
[rules.severity]
DSM008 = "error"
"#,
    );
    let report = engine.check_sources([("Vesting.cs", ROUNDING)]).unwrap();
    assert_eq!(report.diagnostics[0].severity, DiagnosticSeverity::Error);
    assert_eq!(report.exit_code(false), exit_code::LINT_ISSUES);
}

#[test]
fn file_excludes_apply_to_walked_directories() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(src.join("Migrations")).unwrap();
    fs::write(src.join("Vesting.cs"), ROUNDING).unwrap();
    fs::write(src.join("Migrations").join("Old.cs"), ROUNDING).unwrap();

    let all = LintEngine::new(LintConfig::default())
        .unwrap()
        .lint_paths(&[tmp.path().to_path_buf()])
        .unwrap();
    assert_eq!(all.files_checked, 2);
    assert_eq!(all.diagnostics.len(), 2);

    let engine = engine_for(
        r#"
[files]
exclude = ["**/Migrations/**"]
"#,
    );
    let report = engine.lint_paths(&[tmp.path().to_path_buf()]).unwrap();
    assert_eq!(report.files_checked, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0].file.ends_with("Vesting.cs"));
}

#[test]
fn discovered_config_is_loaded_from_an_ancestor() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    fs::write(
        tmp.path().join(CONFIG_FILE_NAME),
        "[rules]\nexclude = [\"DSM006\"]\n\n[output]\nformat = \"json\"\n",
    )
    .unwrap();
    let nested = tmp.path().join("src").join("Services");
    fs::create_dir_all(&nested).unwrap();

    let (config, path) = discover_and_load_config(&nested).unwrap().expect("config found");
    assert_eq!(path, tmp.path().join(CONFIG_FILE_NAME));
    assert_eq!(config.rules.exclude, vec!["DSM006".to_string()]);
    assert_eq!(config.output.format.as_deref(), Some("json"));
}

#[test]
fn discovered_config_with_bad_rule_code_is_an_error() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    fs::write(
        tmp.path().join(CONFIG_FILE_NAME),
        "[rules]\nselect = [\"DSM404\"]\n",
    )
    .unwrap();

    let err = discover_and_load_config(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("DSM404"));
}

#[test]
fn generated_default_config_round_trips_into_the_engine() {
    let file = LintFileConfig::parse(LintFileConfig::default_toml()).unwrap();
    file.validate().unwrap();
    let config = LintConfig::default().with_file_config(&file);
    assert_eq!(config.analysis.executive_marker, "IIsExecutive");
    assert!(config.severity_overrides.is_empty());
    let engine = LintEngine::new(config).unwrap();
    assert!(engine.rule_count() >= 10);
}
