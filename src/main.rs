//! dsm-lint: static code-pattern verifier for the profit-sharing C# services.
//!
//! # Usage
//!
//! ```bash
//! # Check C# files for DSM rule violations
//! dsm-lint check src/
//!
//! # Only the security rules, as SARIF
//! dsm-lint check . --select DSM001,DSM002,DSM003,DSM007 --format sarif
//!
//! # Generate default config
//! dsm-lint init
//!
//! # Run with debug logging
//! dsm-lint --debug check .
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dsm_lint::cli::{validate_cli_semantics, Cli, Commands, RulesFormat};
use dsm_lint::error::exit_code;
use dsm_lint::lint::{init_color, print_rules, rules_json, ColorMode, DiagnosticSeverity, LintConfig, LintEngine, OutputFormat};
use dsm_lint::lint_config::{discover_and_load_config, LintFileConfig};

fn main() {
    let cli = Cli::parse();

    // Initialize color output before anything else writes to stdout.
    init_color(cli.color);

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(!matches!(cli.color, ColorMode::Never))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(exit_code::INTERNAL_ERROR);
    }

    for warning in validate_cli_semantics(&cli) {
        eprintln!("{}", warning);
    }

    match &cli.command {
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
            let file_config = load_file_config(&cli);
            let format = resolve_format(*format, file_config.as_ref());
            let config = build_lint_config(
                select.clone(),
                exclude.clone(),
                *max_diagnostics,
                *severity,
                *strict,
                file_config.as_ref(),
            );
            let engine = match LintEngine::new(config) {
                Ok(engine) => engine,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(e.exit_code());
                }
            };
            let code = engine.check(paths, format);
            let code = if *exit_zero && code == exit_code::LINT_ISSUES {
                exit_code::CLEAN
            } else {
                code
            };
            std::process::exit(code);
        }
        Commands::Rules { format } => match format {
            RulesFormat::Text => print_rules(),
            RulesFormat::Json => match rules_json() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing rules: {}", e);
                    std::process::exit(exit_code::INTERNAL_ERROR);
                }
            },
        },
        Commands::Init { output, force } => {
            std::process::exit(run_init(output, *force));
        }
    }
}

/// Load the `.dsm-lint.toml` config file, respecting --config.
///
/// A file that fails to load or validate exits with `CONFIG_ERROR`, whether
/// it was given explicitly or discovered.
fn load_file_config(cli: &Cli) -> Option<LintFileConfig> {
    if let Some(ref explicit_path) = cli.config {
        return match LintFileConfig::load(explicit_path) {
            Ok(config) => {
                info!("Loaded config from {}", explicit_path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!("Error loading config {}: {}", explicit_path.display(), e);
                std::process::exit(exit_code::CONFIG_ERROR);
            }
        };
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match discover_and_load_config(&cwd) {
        Ok(Some((config, path))) => {
            info!("Using config: {}", path.display());
            Some(config)
        }
        Ok(None) => None,
        Err(e) => {
            eprintln!("Error loading .dsm-lint.toml: {}", e);
            std::process::exit(exit_code::CONFIG_ERROR);
        }
    }
}

/// CLI `--format`, then `[output] format`, then text.
fn resolve_format(cli_format: Option<OutputFormat>, file_config: Option<&LintFileConfig>) -> OutputFormat {
    cli_format
        .or_else(|| {
            file_config
                .and_then(|fc| fc.output.format.as_deref())
                .and_then(OutputFormat::parse)
        })
        .unwrap_or_default()
}

/// Build a `LintConfig` by merging CLI flags with the file config.
/// CLI flags always take precedence.
fn build_lint_config(
    cli_select: Option<String>,
    cli_exclude: Option<String>,
    cli_max_diagnostics: Option<usize>,
    cli_severity: Option<DiagnosticSeverity>,
    strict: bool,
    file_config: Option<&LintFileConfig>,
) -> LintConfig {
    let select = cli_select.or_else(|| {
        file_config
            .filter(|fc| !fc.rules.select.is_empty())
            .map(|fc| fc.rules.select.join(","))
    });

    let exclude = cli_exclude.or_else(|| {
        file_config
            .filter(|fc| !fc.rules.exclude.is_empty())
            .map(|fc| fc.rules.exclude.join(","))
    });

    let max_diagnostics =
        cli_max_diagnostics.or_else(|| file_config.and_then(|fc| fc.output.max_diagnostics));

    let mut config = LintConfig::new(select, exclude)
        .with_max_diagnostics(max_diagnostics)
        .with_min_severity(cli_severity)
        .with_strict(strict);
    if let Some(fc) = file_config {
        config = config.with_file_config(fc);
    }
    config
}

/// Execute the `init` command: generate a default `.dsm-lint.toml`.
fn run_init(output: &Path, force: bool) -> i32 {
    if output.exists() && !force {
        eprintln!(
            "Error: {} already exists. Use --force to overwrite.",
            output.display()
        );
        return exit_code::CONFIG_ERROR;
    }

    match std::fs::write(output, LintFileConfig::default_toml()) {
        Ok(()) => {
            println!("Created {}", output.display());
            println!();
            println!("Edit the file to customize rule selection, severity overrides,");
            println!("file include/exclude patterns, and the [analysis] names.");
            exit_code::CLEAN
        }
        Err(e) => {
            warn!("init failed: {}", e);
            eprintln!("Error writing {}: {}", output.display(), e);
            exit_code::IO_ERROR
        }
    }
}
