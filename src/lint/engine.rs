//! Lint engine: file discovery, parsing, analysis and post-processing.
//!
//! - **Parallel parsing**: every file is read and lowered on the rayon pool.
//! - **One compilation**: all parsed files are merged into a single
//!   [`Compilation`] so cross-file types resolve.
//! - **Parallel analysis**: each file is walked once, independently, with the
//!   enabled rules.
//! - **Host filtering**: disabled ids, severity overrides, `#pragma warning`
//!   regions, the minimum severity and `max_diagnostics` are applied here,
//!   after the rules ran.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use super::display_name_logic::DisplayNameLogicRule;
use super::example_methods::ExampleMethodRule;
use super::executive_capability::ExecutiveCapabilityRule;
use super::masked_assignment::MaskedAssignmentRule;
use super::masking_annotations::MaskingAnnotationRule;
use super::name_concat::NameConcatenationRule;
use super::naming_consistency::NamingConsistencyRule;
use super::non_unique_key::NonUniqueKeyRule;
use super::output::{print_diagnostics, print_summary, LintSummary, OutputFormat};
use super::restricted_accessor::RestrictedAccessorRule;
use super::rounding::RoundingModeRule;
use super::rules::{Diagnostic, DiagnosticSeverity, Rule, RuleCode};
use super::visit::{analyze_file, dispatch_table, DispatchTable};
use crate::csharp::{Compilation, SourceFile};
use crate::error::{exit_code, LintError, Result};
use crate::lint_config::{AnalysisConfig, FileMatcher, FilesConfig, LintFileConfig};

/// Build-output directories that never contain sources worth checking.
const SKIPPED_DIRS: &[&str] = &["bin", "obj"];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the lint engine.
#[derive(Debug, Clone, Default)]
pub struct LintConfig {
    /// Rules to enable (if None, all rules are enabled).
    pub select: Option<HashSet<RuleCode>>,
    /// Rules to ignore.
    pub ignore: HashSet<RuleCode>,
    /// Per-id severity replacing the descriptor default.
    pub severity_overrides: HashMap<RuleCode, DiagnosticSeverity>,
    /// Drop diagnostics below this severity.
    pub min_severity: Option<DiagnosticSeverity>,
    /// Keep at most this many diagnostics (after sorting).
    pub max_diagnostics: Option<usize>,
    /// Any remaining diagnostic fails the run, not just errors.
    pub strict: bool,
    pub analysis: AnalysisConfig,
    pub files: FilesConfig,
}

fn parse_code_list(list: &str, flag: &str) -> HashSet<RuleCode> {
    let mut valid = HashSet::new();
    for raw in list.split(',') {
        let code = raw.trim();
        if code.is_empty() {
            continue;
        }
        match RuleCode::parse_code(code) {
            Some(rc) => {
                valid.insert(rc);
            }
            None => warn!("Unknown rule code '{}' in {} (ignored)", code, flag),
        }
    }
    valid
}

impl LintConfig {
    /// Create a configuration from comma-separated `--select` / `--ignore`
    /// lists. Unknown codes are logged and skipped.
    pub fn new(select: Option<String>, ignore: Option<String>) -> Self {
        let select = select.map(|s| parse_code_list(&s, "select"));
        if matches!(&select, Some(set) if set.is_empty()) {
            warn!("No valid rules selected, nothing will be checked");
        }
        let ignore = ignore
            .map(|s| parse_code_list(&s, "ignore"))
            .unwrap_or_default();

        Self {
            select,
            ignore,
            ..Self::default()
        }
    }

    /// Builder: set the maximum number of diagnostics to keep.
    pub fn with_max_diagnostics(mut self, max: Option<usize>) -> Self {
        self.max_diagnostics = max;
        self
    }

    /// Builder: set the minimum reported severity.
    pub fn with_min_severity(mut self, min: Option<DiagnosticSeverity>) -> Self {
        self.min_severity = min;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    /// Builder: take severity overrides, `[files]` and `[analysis]` from a
    /// loaded config file. Rule selection is merged by the caller since CLI
    /// flags win over it.
    pub fn with_file_config(mut self, file: &LintFileConfig) -> Self {
        for (code, severity) in &file.rules.severity {
            match (RuleCode::parse_code(code), DiagnosticSeverity::parse(severity)) {
                (Some(code), Some(severity)) => {
                    self.severity_overrides.insert(code, severity);
                }
                _ => warn!("Ignoring severity override {} = {}", code, severity),
            }
        }
        self.files = file.files.clone();
        self.analysis = file.analysis.clone();
        self
    }

    /// Returns true when `--select` was provided but no valid rule codes
    /// were parsed, meaning the engine would check nothing.
    pub fn has_empty_selection(&self) -> bool {
        matches!(&self.select, Some(set) if set.is_empty())
    }

    /// Check if a rule is enabled.
    pub fn is_rule_enabled(&self, rule: RuleCode) -> bool {
        if self.ignore.contains(&rule) {
            return false;
        }
        match &self.select {
            Some(selected) => selected.contains(&rule),
            None => rule.descriptor().enabled_by_default,
        }
    }

    /// Severity a diagnostic of `rule` is reported with.
    pub fn severity_for(&self, rule: RuleCode) -> DiagnosticSeverity {
        self.severity_overrides
            .get(&rule)
            .copied()
            .unwrap_or(rule.descriptor().default_severity)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A discovered file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
    /// Exit code of the underlying error.
    pub exit_code: i32,
}

impl SkippedFile {
    fn new(path: &Path, err: &LintError) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: err.to_string(),
            exit_code: err.exit_code(),
        }
    }
}

/// Result of one engine run.
#[derive(Debug, Default)]
pub struct LintReport {
    /// Sorted by file, line and column.
    pub diagnostics: Vec<Diagnostic>,
    pub files_checked: usize,
    /// Files that were found but never analyzed.
    pub skipped: Vec<SkippedFile>,
    /// Diagnostics were dropped to honor `max_diagnostics`.
    pub truncated: bool,
}

impl LintReport {
    pub fn summary(&self) -> LintSummary {
        let files_with_issues: HashSet<&PathBuf> =
            self.diagnostics.iter().map(|d| &d.file).collect();
        let mut summary = LintSummary {
            files_checked: self.files_checked,
            files_skipped: self.skipped.len(),
            files_with_issues: files_with_issues.len(),
            truncated: self.truncated,
            ..LintSummary::default()
        };
        for diag in &self.diagnostics {
            summary.add_diagnostic(diag);
        }
        summary
    }

    /// Error diagnostics fail the run; with `strict`, any diagnostic does.
    /// A skipped file fails it harder, with that file's error code.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if let Some(code) = self.skipped.iter().map(|s| s.exit_code).max() {
            return code;
        }
        let failing = self.diagnostics.iter().any(|d| {
            strict || d.severity == DiagnosticSeverity::Error
        });
        if failing {
            exit_code::LINT_ISSUES
        } else {
            exit_code::CLEAN
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// One instance of every rule, in id order.
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(MaskedAssignmentRule::new()),
        Box::new(MaskingAnnotationRule::new()),
        Box::new(NameConcatenationRule::new()),
        Box::new(NamingConsistencyRule::new()),
        Box::new(ExecutiveCapabilityRule::new()),
        Box::new(RoundingModeRule::new()),
        Box::new(NonUniqueKeyRule::new()),
        Box::new(DisplayNameLogicRule::new()),
        Box::new(ExampleMethodRule::new()),
        Box::new(RestrictedAccessorRule::new()),
    ]
}

/// The main lint engine.
pub struct LintEngine {
    config: LintConfig,
    rules: Vec<Box<dyn Rule>>,
    table: DispatchTable,
    matcher: FileMatcher,
}

impl LintEngine {
    /// Create an engine running every rule with at least one enabled id.
    pub fn new(config: LintConfig) -> Result<Self> {
        let matcher = FileMatcher::new(&config.files)?;
        let rules: Vec<Box<dyn Rule>> = all_rules()
            .into_iter()
            .filter(|r| r.codes().iter().any(|c| config.is_rule_enabled(*c)))
            .collect();
        debug!("{} rule(s) enabled", rules.len());
        let table = dispatch_table(&rules);
        Ok(Self {
            config,
            rules,
            table,
            matcher,
        })
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Number of instantiated rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Check paths and print the results. Returns the process exit code.
    pub fn check(&self, paths: &[PathBuf], format: OutputFormat) -> i32 {
        if self.config.has_empty_selection() {
            return exit_code::CONFIG_ERROR;
        }

        info!("Checking {} path(s)", paths.len());
        let report = match self.lint_paths(paths) {
            Ok(report) => report,
            Err(e) => {
                error!("{}", e);
                return e.exit_code();
            }
        };

        if let Err(e) = print_diagnostics(&report.diagnostics, format) {
            eprintln!("Error printing diagnostics: {}", e);
        }
        if let Err(e) = print_summary(&report.summary(), format) {
            eprintln!("Error printing summary: {}", e);
        }
        report.exit_code(self.config.strict)
    }

    /// Collect, parse and analyze every C# file under `paths`.
    pub fn lint_paths(&self, paths: &[PathBuf]) -> Result<LintReport> {
        let files = self.collect_files(paths)?;
        info!("Found {} C# file(s)", files.len());
        let (sources, skipped) = self.load_files(&files);
        let mut report = self.analyze(sources);
        report.skipped = skipped;
        Ok(report)
    }

    /// Analyze in-memory sources as one compilation.
    pub fn check_sources<P, S>(&self, sources: impl IntoIterator<Item = (P, S)>) -> Result<LintReport>
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let files = sources
            .into_iter()
            .map(|(path, text)| SourceFile::parse(path, text))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.analyze(files))
    }

    /// `*.cs` files under `paths`, sorted. Directories are walked with
    /// `.gitignore` support; `bin/` and `obj/` are skipped.
    pub fn collect_files(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in paths {
            if !path.exists() {
                return Err(LintError::MissingPath { path: path.clone() });
            }
            if path.is_file() {
                if is_csharp_file(path) && self.matcher.is_included(path) {
                    files.push(path.clone());
                }
                continue;
            }

            let walker = WalkBuilder::new(path)
                .filter_entry(|entry| !is_skipped_dir(entry))
                .build();
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Failed to walk {}: {}", path.display(), e);
                        continue;
                    }
                };
                let is_file = entry.file_type().is_some_and(|t| t.is_file());
                let p = entry.path();
                if is_file && is_csharp_file(p) && self.matcher.is_included(p) {
                    files.push(p.to_path_buf());
                }
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Read and parse files in parallel, preserving the order of `files`.
    /// Files that fail are returned separately so the run can fail on them.
    pub fn load_files(&self, files: &[PathBuf]) -> (Vec<SourceFile>, Vec<SkippedFile>) {
        let results: Vec<(&PathBuf, Result<SourceFile>)> = files
            .par_iter()
            .map(|path| (path, SourceFile::load(path)))
            .collect();

        let mut loaded = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (path, result) in results {
            match result {
                Ok(file) => loaded.push(file),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(SkippedFile::new(path, &e));
                }
            }
        }
        (loaded, skipped)
    }

    /// Run the enabled rules over parsed files and post-process the result.
    pub fn analyze(&self, files: Vec<SourceFile>) -> LintReport {
        let files_checked = files.len();
        let with_errors = files.iter().filter(|f| f.syntax_errors > 0).count();
        if with_errors > 0 {
            info!("{} file(s) contain syntax errors; analysis is best effort", with_errors);
        }

        let comp = Compilation::build(files);
        debug!("Compilation built over {} file(s)", files_checked);

        let mut diagnostics: Vec<Diagnostic> = (0..files_checked)
            .into_par_iter()
            .flat_map_iter(|idx| self.file_diagnostics(&comp, idx))
            .collect();

        if let Some(min) = self.config.min_severity {
            diagnostics.retain(|d| d.severity.rank() >= min.rank());
        }

        diagnostics.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.range.start_line.cmp(&b.range.start_line))
                .then_with(|| a.range.start_col.cmp(&b.range.start_col))
        });

        let mut truncated = false;
        if let Some(max) = self.config.max_diagnostics {
            if diagnostics.len() > max {
                info!("Reporting {} of {} diagnostic(s)", max, diagnostics.len());
                diagnostics.truncate(max);
                truncated = true;
            }
        }

        LintReport {
            diagnostics,
            files_checked,
            skipped: Vec::new(),
            truncated,
        }
    }

    /// Per-file host filtering: disabled ids, severity overrides, pragmas.
    fn file_diagnostics(&self, comp: &Compilation, idx: usize) -> Vec<Diagnostic> {
        let file = comp.file(idx);
        analyze_file(comp, idx, &self.config.analysis, &self.rules, &self.table)
            .into_iter()
            .filter(|d| self.config.is_rule_enabled(d.rule))
            .map(|mut d| {
                d.severity = self.config.severity_for(d.rule);
                d
            })
            .filter(|d| !file.is_suppressed(d.rule.as_str(), d.range.start_line))
            .collect()
    }
}

fn is_csharp_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("cs"))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_some_and(|t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.iter().any(|d| name.eq_ignore_ascii_case(d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ROUNDING: &str = r#"
namespace Svc;
public class Calc
{
    public decimal A(decimal x) => Math.Round(x, 2);
    public decimal B(decimal x) => Math.Round(x, 2, MidpointRounding.ToEven);
}
"#;

    fn engine(config: LintConfig) -> LintEngine {
        LintEngine::new(config).expect("engine")
    }

    fn codes(report: &LintReport) -> Vec<RuleCode> {
        report.diagnostics.iter().map(|d| d.rule).collect()
    }

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create dir");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[test]
    fn test_lint_config_default() {
        let config = LintConfig::default();
        assert!(config.select.is_none());
        assert!(config.ignore.is_empty());
        assert!(config.max_diagnostics.is_none());
        assert!(RuleCode::all().iter().all(|c| config.is_rule_enabled(*c)));
    }

    #[test]
    fn test_lint_config_select_and_ignore() {
        let config = LintConfig::new(Some("DSM001, dsm007".to_string()), Some("DSM007".to_string()));
        assert!(config.is_rule_enabled(RuleCode::DSM001));
        assert!(!config.is_rule_enabled(RuleCode::DSM007));
        assert!(!config.is_rule_enabled(RuleCode::DSM002));

        let empty = LintConfig::new(Some("NOPE".to_string()), None);
        assert!(empty.has_empty_selection());
    }

    #[test]
    fn rules_are_instantiated_per_enabled_code() {
        assert_eq!(engine(LintConfig::default()).rule_count(), all_rules().len());
        // DSM005 and DSM006 share one rule.
        let config = LintConfig::new(Some("DSM005,DSM006".to_string()), None);
        assert_eq!(engine(config).rule_count(), 1);
        let config = LintConfig::new(None, Some("DSM002".to_string()));
        assert_eq!(engine(config).rule_count(), all_rules().len());
    }

    #[test]
    fn every_code_is_covered_by_a_rule() {
        let covered: HashSet<RuleCode> = all_rules()
            .iter()
            .flat_map(|r| r.codes().iter().copied())
            .collect();
        assert_eq!(covered.len(), RuleCode::all().len());
    }

    #[test]
    fn check_sources_reports_sorted_diagnostics() {
        let report = engine(LintConfig::default())
            .check_sources([("Calc.cs", ROUNDING)])
            .unwrap();
        assert_eq!(codes(&report), vec![RuleCode::DSM008, RuleCode::DSM008]);
        assert!(report.diagnostics[0].range.start_line < report.diagnostics[1].range.start_line);
        assert_eq!(report.files_checked, 1);
        // Warnings alone do not fail the run.
        assert_eq!(report.exit_code(false), exit_code::CLEAN);
        assert_eq!(report.exit_code(true), exit_code::LINT_ISSUES);
    }

    #[test]
    fn disabled_codes_of_a_shared_rule_are_dropped() {
        let src = r#"
namespace Demoulas.ProfitSharing.Common.Contracts.Response;
public class ContactResponse { public string Email { get; set; } }
"#;
        let all = engine(LintConfig::default()).check_sources([("A.cs", src)]).unwrap();
        assert!(codes(&all).contains(&RuleCode::DSM006));

        let config = LintConfig::new(None, Some("DSM006".to_string()));
        let report = engine(config).check_sources([("A.cs", src)]).unwrap();
        assert!(!codes(&report).contains(&RuleCode::DSM006));
    }

    #[test]
    fn severity_overrides_and_filter() {
        let mut config = LintConfig::default();
        config
            .severity_overrides
            .insert(RuleCode::DSM008, DiagnosticSeverity::Error);
        let report = engine(config).check_sources([("Calc.cs", ROUNDING)]).unwrap();
        assert!(report
            .diagnostics
            .iter()
            .all(|d| d.severity == DiagnosticSeverity::Error));
        assert_eq!(report.exit_code(false), exit_code::LINT_ISSUES);

        let config = LintConfig::default().with_min_severity(Some(DiagnosticSeverity::Error));
        let report = engine(config).check_sources([("Calc.cs", ROUNDING)]).unwrap();
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn pragma_regions_suppress() {
        let src = r#"
public class Calc
{
#pragma warning disable DSM008
    public decimal A(decimal x) => Math.Round(x, 2);
#pragma warning restore DSM008
    public decimal B(decimal x) => Math.Round(x, 2);
}
"#;
        let report = engine(LintConfig::default()).check_sources([("Calc.cs", src)]).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].range.start_line, 7);
    }

    #[test]
    fn max_diagnostics_truncates_after_sorting() {
        let config = LintConfig::default().with_max_diagnostics(Some(1));
        let report = engine(config).check_sources([("Calc.cs", ROUNDING)]).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].range.start_line, 5);
        assert!(report.truncated);
        assert!(report.summary().truncated);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let e = engine(LintConfig::default());
        let a = e.check_sources([("Calc.cs", ROUNDING)]).unwrap();
        let b = e.check_sources([("Calc.cs", ROUNDING)]).unwrap();
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn byte_order_mark_does_not_shift_positions() {
        let e = engine(LintConfig::default());
        let plain = e.check_sources([("Calc.cs", ROUNDING.to_string())]).unwrap();
        let marked = e.check_sources([("Calc.cs", format!("\u{feff}{ROUNDING}"))]).unwrap();
        assert_eq!(plain.diagnostics, marked.diagnostics);
        let with_bom_first_line = e
            .check_sources([("Calc.cs", format!("\u{feff}{}", ROUNDING.trim_start()))])
            .unwrap();
        assert_eq!(with_bom_first_line.diagnostics[0].range.start_line, 4);
    }

    #[test]
    fn collect_files_skips_build_output() {
        let dir = TempDir::new().unwrap();
        create_test_file(&dir, "src/B.cs", "class B {}");
        create_test_file(&dir, "src/A.cs", "class A {}");
        create_test_file(&dir, "src/readme.md", "# no");
        create_test_file(&dir, "bin/Debug/Gen.cs", "class G {}");
        create_test_file(&dir, "obj/X.cs", "class X {}");

        let files = engine(LintConfig::default())
            .collect_files(&[dir.path().to_path_buf()])
            .unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["A.cs", "B.cs"]);
    }

    #[test]
    fn collect_files_honors_file_globs() {
        let dir = TempDir::new().unwrap();
        create_test_file(&dir, "src/A.cs", "class A {}");
        create_test_file(&dir, "src/Migrations/M.cs", "class M {}");
        let mut config = LintConfig::default();
        config.files.exclude = vec!["**/Migrations/**".to_string()];
        let files = engine(config).collect_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("A.cs"));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let err = engine(LintConfig::default())
            .collect_files(&[PathBuf::from("/definitely/not/here")])
            .unwrap_err();
        assert_eq!(err.exit_code(), exit_code::IO_ERROR);
    }

    #[test]
    fn unreadable_files_are_reported_and_fail_the_run() {
        let dir = TempDir::new().unwrap();
        create_test_file(&dir, "src/A.cs", "class A {}");
        let legacy = dir.path().join("src/Legacy.cs");
        fs::write(&legacy, [0xff, 0xfe, 0x00, b'c']).unwrap();

        let report = engine(LintConfig::default())
            .lint_paths(&[dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(report.files_checked, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, legacy);
        assert_eq!(report.summary().files_skipped, 1);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.exit_code(false), exit_code::IO_ERROR);
    }

    #[test]
    fn lint_paths_resolves_types_across_files() {
        let dir = TempDir::new().unwrap();
        create_test_file(
            &dir,
            "Contracts/MemberDto.cs",
            "namespace Demoulas.ProfitSharing.Common.Contracts.Response;\npublic class MemberDto { public string Ssn { get; set; } }\n",
        );
        create_test_file(
            &dir,
            "Services/Mapper.cs",
            "using Demoulas.ProfitSharing.Common.Contracts.Response;\nnamespace Svc;\npublic class Mapper { void M(MemberDto d, string s) { d.Ssn = s; } }\n",
        );
        let config = LintConfig::new(Some("DSM001".to_string()), None);
        let report = engine(config).lint_paths(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(report.files_checked, 2);
        assert_eq!(codes(&report), vec![RuleCode::DSM001]);
        assert!(report.diagnostics[0].file.ends_with("Mapper.cs"));
    }
}
