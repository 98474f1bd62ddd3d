//! dsm-lint: static code-pattern verifier for the profit-sharing C# services.
//!
//! Parses C# with tree-sitter, builds a light semantic model over every
//! analyzed file, and runs the DSM rule set over it.

pub mod cli;
pub mod csharp;
pub mod error;
pub mod lint;
pub mod lint_config;

pub use cli::{validate_cli_semantics, Cli, Commands, RulesFormat};
pub use error::{exit_code, LintError, Result};
pub use lint::{LintConfig, LintEngine, LintReport, OutputFormat};
pub use lint_config::{
    discover_and_load_config, discover_config, ConfigError, FileMatcher, LintFileConfig,
    CONFIG_FILE_NAME,
};
