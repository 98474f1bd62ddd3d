//! Output formatting for lint diagnostics.
//!
//! Provides multiple output formats:
//! - **Text**: Human-readable with optional color, width-aware wrapping
//! - **Concise**: One-line-per-diagnostic for editors/scripts
//! - **JSON**: Diagnostics plus a summary object
//! - **GitHub**: `::error` / `::warning` / `::notice` annotations for GitHub Actions
//! - **SARIF 2.1.0**: Static Analysis Results Interchange Format
//!
//! Color support respects `NO_COLOR`, `FORCE_COLOR`, and terminal detection.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;

use clap::ValueEnum;
use serde::Serialize;

use super::rules::{Diagnostic, DiagnosticSeverity, RuleCode};

// ============================================================================
// TERMINAL WIDTH
// ============================================================================

/// `COLUMNS` if set and positive, else 80.
fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(80)
}

/// Wrap `text` on whitespace to `width` columns, prefixing continuation
/// lines with `indent`. Words longer than a line are not split.
fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    if text.len() <= width {
        return text.to_string();
    }
    let continuation = width.saturating_sub(indent.len()).max(1);

    let mut out = String::with_capacity(text.len() + indent.len() * 4);
    let mut line_len = 0;
    let mut limit = width;
    for word in text.split_whitespace() {
        if line_len > 0 && line_len + 1 + word.len() > limit {
            out.push('\n');
            out.push_str(indent);
            line_len = 0;
            limit = continuation;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += word.len();
    }
    out
}

// ============================================================================
// COLOR CONFIGURATION
// ============================================================================

/// When to emit ANSI color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ColorMode {
    /// Color when stdout is a terminal, unless `NO_COLOR` is set.
    /// A non-empty `FORCE_COLOR` other than `0` wins over both.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                let forced = std::env::var("FORCE_COLOR").is_ok_and(|v| !v.is_empty() && v != "0");
                forced || (std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal())
            }
        }
    }
}

/// Escape sequences used by the text format; all empty when color is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub cyan: &'static str,
    pub reset: &'static str,
}

impl Palette {
    const PLAIN: Palette = Palette {
        bold: "",
        dim: "",
        red: "",
        green: "",
        yellow: "",
        cyan: "",
        reset: "",
    };

    const ANSI: Palette = Palette {
        bold: "\x1b[1m",
        dim: "\x1b[2m",
        red: "\x1b[31m",
        green: "\x1b[32m",
        yellow: "\x1b[33m",
        cyan: "\x1b[36m",
        reset: "\x1b[0m",
    };

    pub fn for_mode(mode: ColorMode) -> Self {
        if mode.enabled() {
            Self::ANSI
        } else {
            Self::PLAIN
        }
    }

    fn severity(&self, severity: DiagnosticSeverity) -> &'static str {
        match severity {
            DiagnosticSeverity::Error => self.red,
            DiagnosticSeverity::Warning => self.yellow,
            DiagnosticSeverity::Info => self.cyan,
        }
    }
}

static PALETTE: OnceLock<Palette> = OnceLock::new();

/// Fix the color mode for the process. Only the first call takes effect.
pub fn init_color(mode: ColorMode) {
    let _ = PALETTE.set(Palette::for_mode(mode));
}

/// The palette chosen by `init_color`, or `Auto` if it was never called.
pub fn palette() -> &'static Palette {
    PALETTE.get_or_init(|| Palette::for_mode(ColorMode::Auto))
}

// ============================================================================
// OUTPUT FORMAT ENUM
// ============================================================================

/// Output format for lint results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text output with color and width-aware wrapping.
    #[default]
    Text,
    /// Concise one-line-per-diagnostic format.
    Concise,
    /// JSON with diagnostics and a summary.
    Json,
    /// GitHub Actions annotation format.
    Github,
    /// SARIF 2.1.0 (Static Analysis Results Interchange Format).
    Sarif,
}

impl OutputFormat {
    /// Parse the `[output] format` config value.
    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s, true).ok()
    }
}

// ============================================================================
// SUMMARY STATISTICS
// ============================================================================

/// Summary statistics for a lint run.
#[derive(Debug, Default)]
pub struct LintSummary {
    pub files_checked: usize,
    /// Files found but not analyzed (unreadable or unparsable).
    pub files_skipped: usize,
    pub files_with_issues: usize,
    pub total_diagnostics: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub by_rule: HashMap<RuleCode, usize>,
    /// Output was cut at `max_diagnostics`.
    pub truncated: bool,
}

impl LintSummary {
    pub fn add_diagnostic(&mut self, diag: &Diagnostic) {
        self.total_diagnostics += 1;
        match diag.severity {
            DiagnosticSeverity::Error => self.errors += 1,
            DiagnosticSeverity::Warning => self.warnings += 1,
            DiagnosticSeverity::Info => self.infos += 1,
        }
        *self.by_rule.entry(diag.rule).or_insert(0) += 1;
    }
}

// ============================================================================
// DIAGNOSTIC OUTPUT DISPATCH
// ============================================================================

/// Print diagnostics to stdout in the specified format.
pub fn print_diagnostics(diagnostics: &[Diagnostic], format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_diagnostics(&mut handle, diagnostics, format)
}

/// Write diagnostics in `format` to any writer.
pub fn write_diagnostics<W: Write>(
    w: &mut W,
    diagnostics: &[Diagnostic],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => write_text(w, diagnostics, palette(), terminal_width()),
        OutputFormat::Concise => write_concise(w, diagnostics),
        OutputFormat::Json => write_json(w, diagnostics),
        OutputFormat::Github => write_github(w, diagnostics),
        OutputFormat::Sarif => write_sarif(w, diagnostics),
    }
}

/// Print summary statistics. Machine formats embed their own.
pub fn print_summary(summary: &LintSummary, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text | OutputFormat::Concise => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_text_summary(&mut handle, summary, palette())
        }
        OutputFormat::Json | OutputFormat::Github | OutputFormat::Sarif => Ok(()),
    }
}

// ============================================================================
// TEXT FORMAT
// ============================================================================

fn write_text<W: Write>(
    w: &mut W,
    diagnostics: &[Diagnostic],
    c: &Palette,
    width: usize,
) -> io::Result<()> {
    let Palette { bold, dim, reset, .. } = *c;

    for diag in diagnostics {
        let severity_color = c.severity(diag.severity);
        let location = format!(
            "{}:{}:{}",
            diag.file.display(),
            diag.range.start_line,
            diag.range.start_col
        );
        writeln!(
            w,
            "{bold}{location}{reset}: {severity_color}{}{reset} {}",
            diag.rule, diag.message,
        )?;

        if diag.severity == DiagnosticSeverity::Error {
            let why = wrap_text(diag.rule.descriptor().description, width.saturating_sub(7), "       ");
            writeln!(w, "  {dim}why: {why}{reset}")?;
        }
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn write_text_summary<W: Write>(w: &mut W, summary: &LintSummary, c: &Palette) -> io::Result<()> {
    let Palette { bold, dim, reset, .. } = *c;

    writeln!(w)?;
    if summary.total_diagnostics == 0 {
        if summary.files_skipped == 0 {
            writeln!(
                w,
                "{}All checks passed!{reset} ({} file{} checked)",
                c.green,
                summary.files_checked,
                plural(summary.files_checked)
            )?;
        } else {
            writeln!(
                w,
                "No issues found ({} file{} checked)",
                summary.files_checked,
                plural(summary.files_checked)
            )?;
        }
        return write_skipped_line(w, summary, c);
    }

    writeln!(
        w,
        "{bold}Found {} issue{} in {} file{}{reset}",
        summary.total_diagnostics,
        plural(summary.total_diagnostics),
        summary.files_with_issues,
        plural(summary.files_with_issues),
    )?;

    let mut parts = Vec::new();
    if summary.errors > 0 {
        parts.push(format!("{}{} error{}{reset}", c.red, summary.errors, plural(summary.errors)));
    }
    if summary.warnings > 0 {
        parts.push(format!("{}{} warning{}{reset}", c.yellow, summary.warnings, plural(summary.warnings)));
    }
    if summary.infos > 0 {
        parts.push(format!("{}{} info{reset}", c.cyan, summary.infos));
    }
    writeln!(w, "  {}", parts.join(", "))?;

    if summary.by_rule.len() > 1 {
        writeln!(w)?;
        let mut rules: Vec<_> = summary.by_rule.iter().collect();
        rules.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (rule, count) in rules {
            writeln!(w, "  {dim}{:<9}{reset} {:<24} {:>4}", rule, rule.name(), count)?;
        }
    }

    if summary.truncated {
        writeln!(w, "{dim}(output truncated by max_diagnostics){reset}")?;
    }
    write_skipped_line(w, summary, c)
}

fn write_skipped_line<W: Write>(w: &mut W, summary: &LintSummary, c: &Palette) -> io::Result<()> {
    if summary.files_skipped > 0 {
        writeln!(
            w,
            "{}{} file{} could not be analyzed{}",
            c.red,
            summary.files_skipped,
            plural(summary.files_skipped),
            c.reset
        )?;
    }
    Ok(())
}

// ============================================================================
// CONCISE FORMAT
// ============================================================================

fn write_concise<W: Write>(w: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    for diag in diagnostics {
        writeln!(
            w,
            "{}:{}:{}: {} {}",
            diag.file.display(),
            diag.range.start_line,
            diag.range.start_col,
            diag.rule,
            diag.message
        )?;
    }
    Ok(())
}

// ============================================================================
// JSON FORMAT
// ============================================================================

#[derive(Serialize)]
struct JsonOutput<'a> {
    version: &'static str,
    diagnostics: Vec<JsonDiagnostic<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: RuleCode,
    code_name: &'static str,
    severity: DiagnosticSeverity,
    category: &'static str,
    message: &'a str,
    args: &'a [String],
    file: String,
    location: JsonLocation,
}

#[derive(Serialize)]
struct JsonLocation {
    start_line: usize,
    start_column: usize,
    end_line: usize,
    end_column: usize,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    by_rule: BTreeMap<&'static str, usize>,
}

fn write_json<W: Write>(w: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    let mut summary = JsonSummary {
        total: diagnostics.len(),
        errors: 0,
        warnings: 0,
        infos: 0,
        by_rule: BTreeMap::new(),
    };

    let json_diags: Vec<JsonDiagnostic> = diagnostics
        .iter()
        .map(|d| {
            match d.severity {
                DiagnosticSeverity::Error => summary.errors += 1,
                DiagnosticSeverity::Warning => summary.warnings += 1,
                DiagnosticSeverity::Info => summary.infos += 1,
            }
            *summary.by_rule.entry(d.rule.as_str()).or_insert(0) += 1;

            JsonDiagnostic {
                code: d.rule,
                code_name: d.rule.name(),
                severity: d.severity,
                category: d.category,
                message: &d.message,
                args: &d.args,
                file: d.file.display().to_string(),
                location: JsonLocation {
                    start_line: d.range.start_line,
                    start_column: d.range.start_col,
                    end_line: d.range.end_line,
                    end_column: d.range.end_col,
                },
            }
        })
        .collect();

    let output = JsonOutput {
        version: "1",
        diagnostics: json_diags,
        summary,
    };
    serde_json::to_writer_pretty(&mut *w, &output)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(w)
}

// ============================================================================
// GITHUB ACTIONS FORMAT
// ============================================================================

/// GitHub Actions requires `%`, `\n`, and `\r` to be percent-encoded.
fn github_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\n', "%0A")
        .replace('\r', "%0D")
}

/// `::error file=F,line=L,col=C,endLine=EL,endColumn=EC,title=RULE::MESSAGE`
fn write_github<W: Write>(w: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    for diag in diagnostics {
        let level = match diag.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "notice",
        };
        let title = format!("{} ({})", diag.rule, diag.rule.name());
        writeln!(
            w,
            "::{level} file={},line={},col={},endLine={},endColumn={},title={title}::{}",
            diag.file.display(),
            diag.range.start_line,
            diag.range.start_col,
            diag.range.end_line,
            diag.range.end_col,
            github_escape(&diag.message),
        )?;
    }
    Ok(())
}

// ============================================================================
// SARIF 2.1.0 FORMAT
// ============================================================================

#[derive(Serialize)]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifToolDriver,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifToolDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    short_description: SarifMessage,
    full_description: SarifMessage,
    default_configuration: SarifConfiguration,
    properties: SarifRuleProperties,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifRuleProperties {
    category: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: &'static str,
    rule_index: usize,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: usize,
    start_column: usize,
    end_line: usize,
    end_column: usize,
}

fn sarif_level(severity: DiagnosticSeverity) -> &'static str {
    match severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
        DiagnosticSeverity::Info => "note",
    }
}

/// SARIF log with the full rule table; `ruleIndex` points into it.
fn write_sarif<W: Write>(w: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    let all = RuleCode::all();
    let rules: Vec<SarifRule> = all
        .iter()
        .map(|code| {
            let d = code.descriptor();
            SarifRule {
                id: code.as_str(),
                name: code.name(),
                short_description: SarifMessage { text: d.title.to_string() },
                full_description: SarifMessage { text: d.description.to_string() },
                default_configuration: SarifConfiguration {
                    level: sarif_level(d.default_severity),
                },
                properties: SarifRuleProperties { category: d.category },
            }
        })
        .collect();

    let results: Vec<SarifResult> = diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: d.rule.as_str(),
            rule_index: all.iter().position(|c| *c == d.rule).unwrap_or(0),
            level: sarif_level(d.severity),
            message: SarifMessage { text: d.message.clone() },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: d.file.display().to_string().replace('\\', "/"),
                    },
                    region: SarifRegion {
                        start_line: d.range.start_line,
                        start_column: d.range.start_col,
                        end_line: d.range.end_line,
                        end_column: d.range.end_col,
                    },
                },
            }],
        })
        .collect();

    let log = SarifLog {
        schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json",
        version: "2.1.0",
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifToolDriver {
                    name: "dsm-lint",
                    version: env!("CARGO_PKG_VERSION"),
                    rules,
                },
            },
            results,
        }],
    };

    serde_json::to_writer_pretty(&mut *w, &log)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(w)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::Range;
    use std::path::PathBuf;

    fn make_diag(rule: RuleCode, line: usize, message: &str) -> Diagnostic {
        let desc = rule.descriptor();
        Diagnostic {
            rule,
            severity: desc.default_severity,
            category: desc.category,
            file: PathBuf::from("src/Svc/Mapper.cs"),
            range: Range::new(line, 5, line, 20),
            message: message.to_string(),
            args: vec!["MemberDto".to_string()],
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("short", 80, "  "), "short");
        let wrapped = wrap_text("hello world foo bar", 12, "  ");
        assert!(wrapped.contains("\n  "));
        assert!(wrapped.lines().next().is_some_and(|l| l.len() <= 12));
    }

    #[test]
    fn palette_follows_explicit_mode() {
        assert_eq!(Palette::for_mode(ColorMode::Never), Palette::PLAIN);
        let ansi = Palette::for_mode(ColorMode::Always);
        assert_eq!(ansi.red, "\x1b[31m");
        assert_eq!(ansi.severity(DiagnosticSeverity::Warning), ansi.yellow);
    }

    #[test]
    fn text_lines_start_with_location() {
        let diags = vec![make_diag(RuleCode::DSM008, 3, "round it")];
        let c = Palette::PLAIN;
        let out = render(|w| write_text(w, &diags, &c, 80));
        assert_eq!(out, "src/Svc/Mapper.cs:3:5: DSM008 round it\n");

        let diags = vec![make_diag(RuleCode::DSM001, 3, "mask it")];
        let out = render(|w| write_text(w, &diags, &c, 80));
        assert!(out.starts_with("src/Svc/Mapper.cs:3:5: DSM001 mask it\n  why: "));
    }

    #[test]
    fn text_summary_counts() {
        let mut summary = LintSummary { files_checked: 4, files_with_issues: 1, ..LintSummary::default() };
        summary.add_diagnostic(&make_diag(RuleCode::DSM001, 1, "a"));
        summary.add_diagnostic(&make_diag(RuleCode::DSM008, 2, "b"));
        let c = Palette::PLAIN;
        let out = render(|w| write_text_summary(w, &summary, &c));
        assert!(out.contains("Found 2 issues in 1 file"));
        assert!(out.contains("1 error, 1 warning"));
        assert!(out.contains("masked-ssn-assignment"));

        let clean = LintSummary { files_checked: 1, ..LintSummary::default() };
        let out = render(|w| write_text_summary(w, &clean, &c));
        assert!(out.contains("All checks passed! (1 file checked)"));

        let partial = LintSummary { files_checked: 1, files_skipped: 2, ..LintSummary::default() };
        let out = render(|w| write_text_summary(w, &partial, &c));
        assert!(!out.contains("All checks passed"));
        assert!(out.contains("No issues found (1 file checked)"));
        assert!(out.contains("2 files could not be analyzed"));
    }

    #[test]
    fn concise_format() {
        let diags = vec![make_diag(RuleCode::DSM009, 7, "keys on Ssn")];
        let out = render(|w| write_concise(w, &diags));
        assert_eq!(out, "src/Svc/Mapper.cs:7:5: DSM009 keys on Ssn\n");
    }

    #[test]
    fn json_has_diagnostics_and_summary() {
        let diags = vec![
            make_diag(RuleCode::DSM001, 1, "a"),
            make_diag(RuleCode::DSM001, 2, "b"),
            make_diag(RuleCode::DSM006, 3, "c"),
        ];
        let out = render(|w| write_json(w, &diags));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["diagnostics"][0]["code"], "DSM001");
        assert_eq!(value["diagnostics"][0]["severity"], "error");
        assert_eq!(value["diagnostics"][0]["args"][0], "MemberDto");
        assert_eq!(value["diagnostics"][2]["location"]["start_line"], 3);
        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["summary"]["infos"], 1);
        assert_eq!(value["summary"]["by_rule"]["DSM001"], 2);
    }

    #[test]
    fn github_annotations_escape_messages() {
        let diags = vec![make_diag(RuleCode::DSM005, 2, "50% done\nnext")];
        let out = render(|w| write_github(w, &diags));
        assert_eq!(
            out,
            "::warning file=src/Svc/Mapper.cs,line=2,col=5,endLine=2,endColumn=20,title=DSM005 (missing-name-interface)::50%25 done%0Anext\n"
        );
    }

    #[test]
    fn sarif_carries_rule_table() {
        let diags = vec![make_diag(RuleCode::DSM013, 4, "needs example")];
        let out = render(|w| write_sarif(w, &diags));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["version"], "2.1.0");
        let run = &value["runs"][0];
        assert_eq!(
            run["tool"]["driver"]["rules"].as_array().map(|r| r.len()),
            Some(RuleCode::all().len())
        );
        let result = &run["results"][0];
        assert_eq!(result["ruleId"], "DSM013");
        let idx = result["ruleIndex"].as_u64().unwrap() as usize;
        assert_eq!(run["tool"]["driver"]["rules"][idx]["id"], "DSM013");
        assert_eq!(result["locations"][0]["physicalLocation"]["region"]["startLine"], 4);
    }

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse("sarif"), Some(OutputFormat::Sarif));
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("grouped"), None);
    }
}
