//! CLI argument validation tests.
//!
//! Uses `Cli::try_parse_from` so argument handling is checked without
//! spawning the binary.

use clap::Parser;

use dsm_lint::cli::{validate_cli_semantics, Cli, Commands, RulesFormat};
use dsm_lint::lint::{ColorMode, DiagnosticSeverity, OutputFormat};

fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

fn must_parse(args: &[&str]) -> Cli {
    try_parse(args).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", args, e))
}

fn must_fail_containing(args: &[&str], needle: &str) {
    match try_parse(args) {
        Ok(_) => panic!("expected {:?} to be rejected", args),
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(needle),
                "error for {:?} should mention {:?}, got: {}",
                args,
                needle,
                msg
            );
        }
    }
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_defaults() {
    let cli = must_parse(&["dsm-lint", "check", "src/"]);
    assert!(!cli.debug);
    assert!(!cli.quiet);
    assert_eq!(cli.color, ColorMode::Auto);
    match cli.command {
        Commands::Check {
            paths,
            select,
            exclude,
            severity,
            format,
            exit_zero,
            strict,
            max_diagnostics,
        } => {
            assert_eq!(paths, vec![std::path::PathBuf::from("src/")]);
            assert!(select.is_none());
            assert!(exclude.is_none());
            assert!(severity.is_none());
            assert!(format.is_none());
            assert!(!exit_zero);
            assert!(!strict);
            assert!(max_diagnostics.is_none());
        }
        other => panic!("expected Check command, got {:?}", other),
    }
}

#[test]
fn check_requires_a_path() {
    assert!(try_parse(&["dsm-lint", "check"]).is_err());
}

#[test]
fn check_select_valid_codes() {
    let cli = must_parse(&["dsm-lint", "check", "src/", "--select", "DSM001,DSM007,DSMPS001"]);
    if let Commands::Check { select, .. } = cli.command {
        assert_eq!(select.as_deref(), Some("DSM001,DSM007,DSMPS001"));
    } else {
        panic!("expected Check command");
    }
}

#[test]
fn check_select_case_insensitive_accepted() {
    let cli = must_parse(&["dsm-lint", "check", "src/", "--select", "dsm013"]);
    assert!(matches!(cli.command, Commands::Check { select: Some(_), .. }));
}

#[test]
fn check_select_invalid_code_rejected() {
    must_fail_containing(
        &["dsm-lint", "check", "src/", "--select", "DSM001,DSM099"],
        "unknown rule code 'DSM099'",
    );
}

#[test]
fn check_exclude_invalid_code_rejected() {
    must_fail_containing(
        &["dsm-lint", "check", "src/", "--exclude", "FST001"],
        "unknown rule code 'FST001'",
    );
}

#[test]
fn check_ignore_is_an_alias_for_exclude() {
    let cli = must_parse(&["dsm-lint", "check", "src/", "--ignore", "DSM006"]);
    if let Commands::Check { exclude, .. } = cli.command {
        assert_eq!(exclude.as_deref(), Some("DSM006"));
    } else {
        panic!("expected Check command");
    }
}

#[test]
fn check_severity_values() {
    let cli = must_parse(&["dsm-lint", "check", ".", "--severity", "warn"]);
    assert!(matches!(
        cli.command,
        Commands::Check { severity: Some(DiagnosticSeverity::Warning), .. }
    ));
    must_fail_containing(&["dsm-lint", "check", ".", "--severity", "fatal"], "invalid severity");
}

#[test]
fn check_format_values() {
    let cli = must_parse(&["dsm-lint", "check", ".", "--format", "sarif"]);
    assert!(matches!(
        cli.command,
        Commands::Check { format: Some(OutputFormat::Sarif), .. }
    ));
    assert!(try_parse(&["dsm-lint", "check", ".", "--format", "xml"]).is_err());
}

#[test]
fn check_max_diagnostics_must_be_positive() {
    must_fail_containing(
        &["dsm-lint", "check", ".", "--max-diagnostics", "0"],
        "value must be at least 1",
    );
    let cli = must_parse(&["dsm-lint", "check", ".", "--max-diagnostics", "25"]);
    assert!(matches!(
        cli.command,
        Commands::Check { max_diagnostics: Some(25), .. }
    ));
}

#[test]
fn global_options_after_subcommand() {
    let cli = must_parse(&[
        "dsm-lint",
        "check",
        ".",
        "--color",
        "never",
        "--config",
        "ci/.dsm-lint.toml",
        "--debug",
    ]);
    assert_eq!(cli.color, ColorMode::Never);
    assert!(cli.debug);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("ci/.dsm-lint.toml")));
}

// ============================================================================
// rules / init
// ============================================================================

#[test]
fn rules_format_defaults_to_text() {
    let cli = must_parse(&["dsm-lint", "rules"]);
    assert!(matches!(cli.command, Commands::Rules { format: RulesFormat::Text }));
    let cli = must_parse(&["dsm-lint", "rules", "--format", "json"]);
    assert!(matches!(cli.command, Commands::Rules { format: RulesFormat::Json }));
}

#[test]
fn init_defaults() {
    let cli = must_parse(&["dsm-lint", "init"]);
    match cli.command {
        Commands::Init { output, force } => {
            assert_eq!(output, std::path::PathBuf::from(".dsm-lint.toml"));
            assert!(!force);
        }
        other => panic!("expected Init command, got {:?}", other),
    }
}

#[test]
fn unknown_subcommand_rejected() {
    assert!(try_parse(&["dsm-lint", "serve"]).is_err());
}

// ============================================================================
// Semantic warnings
// ============================================================================

#[test]
fn quiet_and_debug_warns() {
    let cli = must_parse(&["dsm-lint", "-q", "-d", "check", "."]);
    let warnings = validate_cli_semantics(&cli);
    assert!(
        warnings.iter().any(|w| w.contains("--quiet and --debug")),
        "got: {:?}",
        warnings
    );
}

#[test]
fn everything_selected_is_excluded_warns() {
    let cli = must_parse(&[
        "dsm-lint", "check", ".", "--select", "DSM001,DSM002", "--exclude", "dsm002,DSM001",
    ]);
    let warnings = validate_cli_semantics(&cli);
    assert!(
        warnings.iter().any(|w| w.contains("nothing will be checked")),
        "got: {:?}",
        warnings
    );
}

#[test]
fn partial_exclusion_does_not_warn() {
    let cli = must_parse(&[
        "dsm-lint", "check", ".", "--select", "DSM001,DSM002", "--exclude", "DSM002",
    ]);
    assert!(validate_cli_semantics(&cli).is_empty());
}

#[test]
fn strict_with_exit_zero_warns() {
    let cli = must_parse(&["dsm-lint", "check", ".", "--strict", "--exit-zero"]);
    let warnings = validate_cli_semantics(&cli);
    assert!(warnings.iter().any(|w| w.contains("--strict has no effect")));
}
