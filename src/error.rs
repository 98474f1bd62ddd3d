//! Error types for dsm-lint.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes for the dsm-lint CLI.
///
/// 0 is success and higher values indicate increasingly severe problems.
pub mod exit_code {
    /// No issues found (clean).
    pub const CLEAN: i32 = 0;
    /// Error-severity diagnostics remain (or any diagnostic with `--strict`).
    pub const LINT_ISSUES: i32 = 1;
    /// Configuration error (bad config file, invalid CLI args).
    pub const CONFIG_ERROR: i32 = 2;
    /// I/O error (path not found, unreadable or undecodable file).
    pub const IO_ERROR: i32 = 3;
    /// Internal error (bug in dsm-lint itself).
    pub const INTERNAL_ERROR: i32 = 4;
}

// ---------------------------------------------------------------------------
// Lint errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading and analyzing sources.
#[derive(Error, Debug)]
pub enum LintError {
    #[error("I/O error reading {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file is not valid UTF-8: {path}")]
    Encoding { path: PathBuf },

    #[error("parse error in {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("configuration error: {0}")]
    Config(#[from] crate::lint_config::ConfigError),
}

impl LintError {
    /// Exit code a CLI run should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LintError::FileRead { .. }
            | LintError::Encoding { .. }
            | LintError::MissingPath { .. } => exit_code::IO_ERROR,
            LintError::Parse { .. } => exit_code::INTERNAL_ERROR,
            LintError::Config(_) => exit_code::CONFIG_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, LintError>;
