//! `.dsm-lint.toml` configuration file support.
//!
//! Provides deserialization, discovery (walk up to `.git` root), and merging
//! with CLI flags. CLI flags always take precedence over file config.
//!
//! # Example config
//!
//! ```toml
//! [rules]
//! select = ["DSM001", "DSM002", "DSM007"]
//! exclude = ["DSM006"]
//!
//! [rules.severity]
//! DSM005 = "error"
//!
//! [files]
//! exclude = ["**/Migrations/**"]
//!
//! [analysis]
//! response_namespaces = ["Demoulas.ProfitSharing.Common.Contracts.Response"]
//! restricted_invocations = ["DemographicReader.GetDemographics"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::lint::RuleCode;

/// Top-level `.dsm-lint.toml` configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LintFileConfig {
    /// Rule selection and severity overrides.
    #[serde(default)]
    pub rules: RulesConfig,

    /// File include/exclude patterns.
    #[serde(default)]
    pub files: FilesConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Names and namespaces the rules key on.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Rule selection and severity overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rules to enable. If empty/absent, all rules are enabled.
    #[serde(default)]
    pub select: Vec<String>,

    /// Rules to exclude (takes precedence over `select`).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Per-rule severity overrides ("error", "warning", "info").
    #[serde(default)]
    pub severity: HashMap<String, String>,
}

/// File include/exclude glob patterns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Glob patterns for files to include. If empty, every `.cs` file is
    /// included.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for files to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Output settings (can be overridden by CLI flags).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format: "text", "concise", "json", "github", "sarif".
    #[serde(default)]
    pub format: Option<String>,

    /// Maximum diagnostics to show before stopping.
    #[serde(default)]
    pub max_diagnostics: Option<usize>,
}

/// A required-interface category for the naming-consistency rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NameCategory {
    /// Short label, e.g. "name-parts".
    pub name: String,
    /// Interface a shape with any of `properties` must list in its bases.
    pub interface: String,
    /// Signal properties; the first one is the canonical name.
    pub properties: Vec<String>,
}

impl NameCategory {
    fn new(name: &str, interface: &str, properties: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            interface: interface.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Domain vocabulary used by the rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Request contract namespaces (nested namespaces included).
    pub request_namespaces: Vec<String>,
    /// Response contract namespaces (nested namespaces included).
    pub response_namespaces: Vec<String>,
    /// Marker interface a response must reach (DSM007).
    pub executive_marker: String,
    /// Attribute that opts a response type out of DSM007.
    pub executive_opt_out_attribute: String,
    /// Masking attribute (DSM002/DSM003).
    pub mask_attribute: String,
    /// Substrings that mark a type as describing a person.
    pub person_indicators: Vec<String>,
    /// Identifier properties that must stay unmasked.
    pub badge_properties: Vec<String>,
    /// Properties that must be masked.
    pub sensitive_properties: Vec<String>,
    /// Member names whose any access is restricted (DSMPS001).
    pub restricted_members: Vec<String>,
    /// `Receiver.Method` invocations that are restricted (DSMPS001).
    pub restricted_invocations: Vec<String>,
    pub name_categories: Vec<NameCategory>,
    /// Non-canonical property name -> the category property it stands for.
    pub property_aliases: BTreeMap<String, String>,
    /// Analyze generated files and `[GeneratedCode]` types too.
    pub include_generated: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let aliases = [
            ("FName", "FirstName"),
            ("LName", "LastName"),
            ("MName", "MiddleName"),
            ("Phone", "PhoneNumber"),
            ("Telephone", "PhoneNumber"),
            ("Email", "EmailAddress"),
            ("EmailAddr", "EmailAddress"),
            ("CityName", "City"),
            ("Town", "City"),
        ];
        Self {
            request_namespaces: strings(&["Demoulas.ProfitSharing.Common.Contracts.Request"]),
            response_namespaces: strings(&["Demoulas.ProfitSharing.Common.Contracts.Response"]),
            executive_marker: "IIsExecutive".to_string(),
            executive_opt_out_attribute: "NoExecutiveData".to_string(),
            mask_attribute: "MaskSensitive".to_string(),
            person_indicators: strings(&[
                "Employee",
                "Member",
                "Participant",
                "Beneficiary",
                "Person",
                "Demographic",
                "Payee",
            ]),
            badge_properties: strings(&["BadgeNumber", "Badge"]),
            sensitive_properties: strings(&["Age", "DateOfBirth", "Dob", "BirthDate"]),
            restricted_members: strings(&["Demographics"]),
            restricted_invocations: Vec::new(),
            name_categories: vec![
                NameCategory::new("name-parts", "INameParts", &["FirstName", "LastName", "MiddleName"]),
                NameCategory::new("full-name", "IFullNameProperty", &["FullName"]),
                NameCategory::new("phone", "IPhoneNumber", &["PhoneNumber"]),
                NameCategory::new("email", "IEmailAddress", &["EmailAddress"]),
                NameCategory::new("city", "ICity", &["City"]),
            ],
            property_aliases: aliases
                .iter()
                .map(|(a, c)| (a.to_string(), c.to_string()))
                .collect(),
            include_generated: false,
        }
    }
}

fn in_namespaces(namespace: &str, roots: &[String]) -> bool {
    roots.iter().any(|root| {
        namespace == root
            || namespace
                .strip_prefix(root.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

impl AnalysisConfig {
    /// Namespace equals or is nested in a response-contracts namespace.
    pub fn is_response_namespace(&self, namespace: &str) -> bool {
        in_namespaces(namespace, &self.response_namespaces)
    }

    pub fn is_request_namespace(&self, namespace: &str) -> bool {
        in_namespaces(namespace, &self.request_namespaces)
    }

    /// `(receiver, method)` pairs parsed from `restricted_invocations`.
    pub fn restricted_invocation_pairs(&self) -> Vec<(&str, &str)> {
        self.restricted_invocations
            .iter()
            .filter_map(|s| s.rsplit_once('.'))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl LintFileConfig {
    /// Parse a `.dsm-lint.toml` file from a string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Parse)
    }

    /// Load a `.dsm-lint.toml` file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate semantic constraints that the TOML schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for code in self.rules.select.iter().chain(&self.rules.exclude) {
            if RuleCode::parse_code(code).is_none() {
                return Err(ConfigError::InvalidRuleCode(code.clone()));
            }
        }

        for (code, severity) in &self.rules.severity {
            if RuleCode::parse_code(code).is_none() {
                return Err(ConfigError::InvalidRuleCode(code.clone()));
            }
            if !is_valid_severity(severity) {
                return Err(ConfigError::InvalidSeverity {
                    rule: code.clone(),
                    severity: severity.clone(),
                });
            }
        }

        for pattern in self.files.include.iter().chain(&self.files.exclude) {
            globset::Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?;
        }

        if let Some(ref fmt) = self.output.format {
            if !["text", "concise", "json", "github", "sarif"].contains(&fmt.as_str()) {
                return Err(ConfigError::InvalidFormat(fmt.clone()));
            }
        }

        if self.output.max_diagnostics == Some(0) {
            return Err(ConfigError::InvalidMaxDiagnostics);
        }

        for entry in &self.analysis.restricted_invocations {
            match entry.rsplit_once('.') {
                Some((recv, method)) if !recv.is_empty() && !method.is_empty() => {}
                _ => return Err(ConfigError::InvalidAnalysis(format!(
                    "restricted_invocations entry '{entry}' must look like 'Receiver.Method'"
                ))),
            }
        }
        for category in &self.analysis.name_categories {
            if category.properties.is_empty() {
                return Err(ConfigError::InvalidAnalysis(format!(
                    "name category '{}' lists no properties",
                    category.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a default `.dsm-lint.toml` config as a string.
    pub fn default_toml() -> &'static str {
        r#"# dsm-lint configuration file

# Rule selection and severity overrides.
[rules]
# Enable specific rules only (empty = all rules enabled):
# select = ["DSM001", "DSM002", "DSM007"]
#
# Exclude specific rules:
# exclude = ["DSM006"]

# Override severity per rule (error, warning, info):
# [rules.severity]
# DSM005 = "error"

# File include/exclude glob patterns.
[files]
# include = ["src/**/*.cs"]
# exclude = ["**/Migrations/**"]

# Output settings.
[output]
# format = "text"
# max_diagnostics = 200

# Names and namespaces the rules key on.
[analysis]
request_namespaces = ["Demoulas.ProfitSharing.Common.Contracts.Request"]
response_namespaces = ["Demoulas.ProfitSharing.Common.Contracts.Response"]
executive_marker = "IIsExecutive"
executive_opt_out_attribute = "NoExecutiveData"
mask_attribute = "MaskSensitive"
# person_indicators = ["Employee", "Member", "Participant", "Beneficiary", "Person", "Demographic", "Payee"]
# badge_properties = ["BadgeNumber", "Badge"]
# sensitive_properties = ["Age", "DateOfBirth", "Dob", "BirthDate"]
restricted_members = ["Demographics"]
# restricted_invocations = ["Receiver.Method"]
include_generated = false
"#
    }

    /// Build a compiled `FileMatcher` from the file include/exclude patterns.
    pub fn build_file_matcher(&self) -> Result<FileMatcher, ConfigError> {
        FileMatcher::new(&self.files)
    }
}

// ---------------------------------------------------------------------------
// File matching
// ---------------------------------------------------------------------------

/// Compiled glob matcher for file include/exclude patterns.
pub struct FileMatcher {
    include: Option<globset::GlobSet>,
    exclude: Option<globset::GlobSet>,
}

fn build_glob_set(patterns: &[String]) -> Result<Option<globset::GlobSet>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            globset::Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?,
        );
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| ConfigError::InvalidGlob("(build)".into(), e.to_string()))
}

impl FileMatcher {
    pub fn new(files: &FilesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_glob_set(&files.include)?,
            exclude: build_glob_set(&files.exclude)?,
        })
    }

    /// Excludes win over includes; no include patterns means include all.
    pub fn is_included(&self, path: &Path) -> bool {
        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        if let Some(ref include) = self.include {
            return include.is_match(path);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Config file discovery
// ---------------------------------------------------------------------------

/// Name of the config file.
pub const CONFIG_FILE_NAME: &str = ".dsm-lint.toml";

/// Discover a `.dsm-lint.toml` by walking up from `start_dir` to the
/// repository root (directory containing `.git`).
pub fn discover_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = if start_dir.is_file() {
        start_dir.parent()?.to_path_buf()
    } else {
        start_dir.to_path_buf()
    };

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => return None,
        }
    }
}

/// Discover and load the config file. Returns `Ok(None)` if none is found.
pub fn discover_and_load_config(
    start_dir: &Path,
) -> Result<Option<(LintFileConfig, PathBuf)>, ConfigError> {
    match discover_config(start_dir) {
        Some(path) => {
            let config = LintFileConfig::load(&path)?;
            Ok(Some((config, path)))
        }
        None => Ok(None),
    }
}

fn is_valid_severity(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "error" | "warning" | "info")
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from config file operations.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading the config file.
    Io(PathBuf, std::io::Error),
    /// TOML parse error.
    Parse(toml::de::Error),
    /// Unknown rule code in config.
    InvalidRuleCode(String),
    /// Invalid severity string.
    InvalidSeverity { rule: String, severity: String },
    /// Invalid glob pattern.
    InvalidGlob(String, String),
    /// Invalid output format string.
    InvalidFormat(String),
    /// max_diagnostics must be >= 1.
    InvalidMaxDiagnostics,
    /// Malformed `[analysis]` entry.
    InvalidAnalysis(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, err) => {
                write!(f, "failed to read {}: {}", path.display(), err)
            }
            ConfigError::Parse(err) => write!(f, "TOML parse error: {}", err),
            ConfigError::InvalidRuleCode(code) => {
                let valid: Vec<&str> = RuleCode::all().iter().map(|c| c.as_str()).collect();
                write!(
                    f,
                    "unknown rule code '{}' in config (valid: {})",
                    code,
                    valid.join(", ")
                )
            }
            ConfigError::InvalidSeverity { rule, severity } => {
                write!(
                    f,
                    "invalid severity '{}' for rule {} (valid: error, warning, info)",
                    severity, rule
                )
            }
            ConfigError::InvalidGlob(pattern, err) => {
                write!(f, "invalid glob pattern '{}': {}", pattern, err)
            }
            ConfigError::InvalidFormat(fmt) => {
                write!(
                    f,
                    "invalid output format '{}' (valid: text, concise, json, github, sarif)",
                    fmt
                )
            }
            ConfigError::InvalidMaxDiagnostics => {
                write!(f, "max_diagnostics must be >= 1")
            }
            ConfigError::InvalidAnalysis(detail) => write!(f, "invalid [analysis]: {}", detail),
        }
    }
}

impl std::error::Error for ConfigError {}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = LintFileConfig::parse("").unwrap();
        assert_eq!(config, LintFileConfig::default());
        assert_eq!(config.analysis.executive_marker, "IIsExecutive");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[rules]
select = ["DSM001", "dsm002"]
exclude = ["DSM006"]

[rules.severity]
DSM005 = "error"

[files]
include = ["src/**/*.cs"]
exclude = ["**/obj/**"]

[output]
format = "json"
max_diagnostics = 100

[analysis]
response_namespaces = ["Acme.Contracts.Response"]
restricted_invocations = ["Reader.GetAll"]
include_generated = true

[[analysis.name_categories]]
name = "phone"
interface = "IPhone"
properties = ["Phone"]
"#;
        let config = LintFileConfig::parse(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.rules.select, vec!["DSM001", "dsm002"]);
        assert_eq!(config.rules.severity.get("DSM005"), Some(&"error".to_string()));
        assert_eq!(config.files.include, vec!["src/**/*.cs"]);
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.max_diagnostics, Some(100));
        assert_eq!(config.analysis.response_namespaces, vec!["Acme.Contracts.Response"]);
        assert_eq!(config.analysis.restricted_invocation_pairs(), vec![("Reader", "GetAll")]);
        assert!(config.analysis.include_generated);
        assert_eq!(config.analysis.name_categories.len(), 1);
        // Untouched analysis keys keep their defaults.
        assert_eq!(config.analysis.mask_attribute, "MaskSensitive");
    }

    #[test]
    fn invalid_rule_code_rejected() {
        let config = LintFileConfig::parse("[rules]\nselect = [\"BOGUS\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown rule code 'BOGUS'"));
        assert!(err.to_string().contains("DSMPS001"));
    }

    #[test]
    fn invalid_severity_rejected() {
        let config = LintFileConfig::parse("[rules.severity]\nDSM001 = \"hint\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid severity 'hint'"));
    }

    #[test]
    fn invalid_glob_rejected() {
        let config = LintFileConfig::parse("[files]\ninclude = [\"[invalid\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid glob pattern"));
    }

    #[test]
    fn invalid_format_rejected() {
        let config = LintFileConfig::parse("[output]\nformat = \"xml\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid output format 'xml'"));
    }

    #[test]
    fn max_diagnostics_zero_rejected() {
        let config = LintFileConfig::parse("[output]\nmax_diagnostics = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_diagnostics must be >= 1"));
    }

    #[test]
    fn malformed_restricted_invocation_rejected() {
        let config =
            LintFileConfig::parse("[analysis]\nrestricted_invocations = [\"NoDot\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Receiver.Method"));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = LintFileConfig::parse("[rules]\nbogus_key = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = LintFileConfig::parse("[analysis]\nbogus_key = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn namespace_membership_includes_nested() {
        let analysis = AnalysisConfig::default();
        let root = "Demoulas.ProfitSharing.Common.Contracts.Response";
        assert!(analysis.is_response_namespace(root));
        assert!(analysis.is_response_namespace(&format!("{root}.YearEnd")));
        assert!(!analysis.is_response_namespace(&format!("{root}s")));
        assert!(!analysis.is_response_namespace("Demoulas.ProfitSharing.Common.Contracts"));
        assert!(analysis.is_request_namespace("Demoulas.ProfitSharing.Common.Contracts.Request.Lookups"));
    }

    #[test]
    fn file_matcher_include_and_exclude() {
        let files = FilesConfig {
            include: vec!["src/**/*.cs".to_string()],
            exclude: vec!["src/generated/**".to_string()],
        };
        let matcher = FileMatcher::new(&files).unwrap();
        assert!(matcher.is_included(Path::new("src/core/Foo.cs")));
        assert!(!matcher.is_included(Path::new("src/generated/Auto.cs")));
        assert!(!matcher.is_included(Path::new("vendor/Bar.cs")));
    }

    #[test]
    fn file_matcher_empty_passes_all() {
        let matcher = FileMatcher::new(&FilesConfig::default()).unwrap();
        assert!(matcher.is_included(Path::new("anything.cs")));
    }

    #[test]
    fn discover_config_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let nested = tmp.path().join("src").join("Services");
        std::fs::create_dir_all(&nested).unwrap();

        let found = discover_config(&nested);
        assert_eq!(found, Some(tmp.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn discover_config_stops_at_git_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("src");
        std::fs::create_dir_all(&nested).unwrap();

        assert!(discover_config(&nested).is_none());
    }

    #[test]
    fn discover_and_load_rejects_invalid_config() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "[rules]\nselect = [\"BOGUS\"]\n")
            .unwrap();

        assert!(discover_and_load_config(tmp.path()).is_err());
    }

    #[test]
    fn default_toml_is_valid() {
        let config = LintFileConfig::parse(LintFileConfig::default_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
    }
}
