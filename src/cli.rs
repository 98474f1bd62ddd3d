//! CLI argument definitions and validation for dsm-lint.
//!
//! Kept out of `main.rs` so that integration tests can use
//! [`Cli::try_parse_from`] to verify argument validation without
//! spawning a subprocess.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::lint::{ColorMode, DiagnosticSeverity, OutputFormat, RuleCode};

/// Parse a positive (>= 1) usize value for CLI arguments.
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let val: usize = s.parse().map_err(|e| format!("invalid integer: {}", e))?;
    if val == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(val)
}

/// Validate a comma-separated list of rule codes at parse time.
///
/// If any token is not a known code the parser rejects the whole value,
/// listing the valid codes.
fn validate_rule_codes(s: &str) -> Result<String, String> {
    for raw in s.split(',') {
        let code = raw.trim();
        if code.is_empty() {
            continue;
        }
        if RuleCode::parse_code(code).is_none() {
            let valid: Vec<&str> = RuleCode::all().iter().map(|r| r.as_str()).collect();
            return Err(format!(
                "unknown rule code '{}'. Valid codes: {}",
                code,
                valid.join(", "),
            ));
        }
    }
    Ok(s.to_string())
}

fn parse_severity(s: &str) -> Result<DiagnosticSeverity, String> {
    match s.to_lowercase().as_str() {
        "warn" => Ok(DiagnosticSeverity::Warning),
        "information" => Ok(DiagnosticSeverity::Info),
        other => DiagnosticSeverity::parse(other).ok_or_else(|| {
            format!("invalid severity '{}' (valid: error, warning, info)", s)
        }),
    }
}

/// dsm-lint: code-pattern verifier for the profit-sharing C# services.
///
/// Quick start:
///   dsm-lint check src/          Check files for issues
///   dsm-lint rules               List all available rules
///   dsm-lint init                Generate default .dsm-lint.toml
#[derive(Parser, Debug)]
#[command(name = "dsm-lint")]
#[command(author)]
#[command(version)]
#[command(about = "Static code-pattern verifier for the profit-sharing C# services", long_about = None)]
#[command(after_help = "\
CONFIGURATION:
  dsm-lint looks for a .dsm-lint.toml config file, searching from the\n\
  current directory up to the nearest .git root. Use `dsm-lint init` to\n\
  generate a default config. CLI flags always override config file settings.\n\
\n\
EXAMPLES:\n\
  dsm-lint check src/                       Check all C# files under src/\n\
  dsm-lint check . --select DSM001,DSM007   Only run specific rules\n\
  dsm-lint check . --exclude DSM006         Skip specific rules\n\
  dsm-lint check . --severity warning       Only show warnings and above\n\
  dsm-lint check . --format sarif           Emit SARIF 2.1.0 for code scanning")]
pub struct Cli {
    /// Enable debug logging (sets log level to DEBUG).
    #[arg(short, long, global = true, help_heading = "Global Options")]
    pub debug: bool,

    /// When to use ANSI color in output.
    ///
    /// auto: enable when stdout is a terminal and NO_COLOR is unset (default).
    /// always: force color even when piped.
    /// never: disable color unconditionally.
    #[arg(
        long,
        value_enum,
        global = true,
        default_value = "auto",
        help_heading = "Global Options"
    )]
    pub color: ColorMode,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, help_heading = "Global Options")]
    pub quiet: bool,

    /// Path to a .dsm-lint.toml config file.
    ///
    /// By default, dsm-lint searches from the current directory up to
    /// the nearest .git root. This flag overrides that discovery.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check C# files for DSM rule violations.
    ///
    /// Scans the given paths (files or directories) for *.cs files and runs
    /// all enabled rules over them as one compilation. Returns exit code 1
    /// if any error-severity diagnostic remains, unless --exit-zero is used.
    Check {
        /// Files or directories to check (recursive for directories).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Comma-separated rule codes to enable (e.g., DSM001,DSM007).
        ///
        /// When specified, only these rules run. Overrides [rules.select]
        /// in .dsm-lint.toml.
        #[arg(long, value_parser = validate_rule_codes)]
        select: Option<String>,

        /// Comma-separated rule codes to skip (e.g., DSM006).
        ///
        /// Takes precedence over --select. Overrides [rules.exclude]
        /// in .dsm-lint.toml. Alias: --ignore.
        #[arg(long, alias = "ignore", value_parser = validate_rule_codes)]
        exclude: Option<String>,

        /// Minimum severity to report: error, warning, info.
        #[arg(long, value_parser = parse_severity)]
        severity: Option<DiagnosticSeverity>,

        /// Output format for diagnostics [default: text, or [output] format].
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Exit with code 0 even if issues are found.
        #[arg(long)]
        exit_zero: bool,

        /// Fail on any remaining diagnostic, not only errors.
        #[arg(long)]
        strict: bool,

        /// Report at most this many diagnostics (>= 1).
        #[arg(long, value_parser = parse_positive_usize)]
        max_diagnostics: Option<usize>,
    },

    /// List all available rules with their default severity.
    Rules {
        /// Manifest format.
        #[arg(long, value_enum, default_value = "text")]
        format: RulesFormat,
    },

    /// Generate a default .dsm-lint.toml configuration file.
    ///
    /// Creates the file in the current directory. Use --output to
    /// write to a different path.
    Init {
        /// Output path for the config file.
        #[arg(short, long, default_value = ".dsm-lint.toml")]
        output: PathBuf,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

/// Output of `dsm-lint rules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum RulesFormat {
    #[default]
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Semantic validation
// ---------------------------------------------------------------------------

/// Validate constraints that clap's declarative API cannot express.
///
/// Returns warning messages to print to stderr. These are non-fatal.
pub fn validate_cli_semantics(cli: &Cli) -> Vec<String> {
    let mut warnings = Vec::new();

    if cli.quiet && cli.debug {
        warnings.push(
            "Warning: --quiet and --debug are contradictory; --debug takes precedence".to_string(),
        );
    }

    if let Commands::Check {
        select: Some(select),
        exclude: Some(exclude),
        ..
    } = &cli.command
    {
        let excluded: Vec<&str> = exclude.split(',').map(str::trim).collect();
        let all_excluded = select
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .all(|c| excluded.iter().any(|e| e.eq_ignore_ascii_case(c)));
        if all_excluded {
            warnings.push(
                "Warning: every selected rule is also excluded; nothing will be checked".to_string(),
            );
        }
    }

    if let Commands::Check { exit_zero: true, strict: true, .. } = &cli.command {
        warnings.push("Warning: --strict has no effect with --exit-zero".to_string());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_aliases() {
        assert_eq!(parse_severity("warn"), Ok(DiagnosticSeverity::Warning));
        assert_eq!(parse_severity("Error"), Ok(DiagnosticSeverity::Error));
        assert!(parse_severity("hint").is_err());
    }

    #[test]
    fn rule_code_lists() {
        assert!(validate_rule_codes("DSM001, dsm013,").is_ok());
        let err = validate_rule_codes("DSM001,FST001").unwrap_err();
        assert!(err.contains("FST001"));
        assert!(err.contains("DSMPS001"));
    }

    #[test]
    fn positive_usize() {
        assert_eq!(parse_positive_usize("5"), Ok(5));
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("x").is_err());
    }
}
