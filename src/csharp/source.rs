//! Source files: text, line index, generated-code classification and
//! `#pragma warning` suppression regions.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::parser;
use super::syntax::{CompilationUnit, Span};
use crate::error::LintError;
use crate::lint::Range;

/// File-name suffixes that mark tool-generated C# sources.
const GENERATED_SUFFIXES: &[&str] = &[".designer.cs", ".generated.cs", ".g.i.cs", ".g.cs"];

static PRAGMA_WARNING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*#\s*pragma\s+warning\s+(disable|restore)\b([^\r\n]*)")
        .unwrap_or_else(|e| panic!("invalid pragma regex: {e}"))
});

/// A parsed C# source file.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub unit: CompilationUnit,
    /// Whole file is tool-generated.
    pub generated: bool,
    /// Number of tree-sitter error nodes encountered while lowering.
    pub syntax_errors: usize,
    suppressions: Suppressions,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Read and parse a file from disk.
    pub fn load(path: &Path) -> Result<Self, LintError> {
        let bytes = std::fs::read(path).map_err(|source| LintError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| LintError::Encoding {
            path: path.to_path_buf(),
        })?;
        Self::parse(path, text)
    }

    /// Parse in-memory source text. A leading byte-order mark is dropped.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self, LintError> {
        let path = path.into();
        let mut text = text.into();
        if text.starts_with('\u{feff}') {
            text.drain(..'\u{feff}'.len_utf8());
        }
        let (unit, syntax_errors) = parser::parse_compilation_unit(&path, &text)?;
        if syntax_errors > 0 {
            debug!("{}: {} syntax error node(s)", path.display(), syntax_errors);
        }
        let generated = is_generated_file_name(&path) || has_generated_header(&text);
        let suppressions = Suppressions::scan(&text);
        let line_starts = line_starts(&text);
        Ok(Self {
            path,
            text,
            unit,
            generated,
            syntax_errors,
            suppressions,
            line_starts,
        })
    }

    /// Source text covered by `span`.
    pub fn text_of(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// 1-indexed `(line, column)` of a byte offset. Columns count characters.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        let col = self
            .text
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);
        (line_idx + 1, col + 1)
    }

    /// Line/column range of a span; the end column is exclusive.
    pub fn range(&self, span: Span) -> Range {
        let (start_line, start_col) = self.line_col(span.start);
        let (end_line, end_col) = self.line_col(span.end.max(span.start));
        Range::new(start_line, start_col, end_line, end_col)
    }

    /// Whether `rule_id` is disabled by a `#pragma warning` region at `line`.
    pub fn is_suppressed(&self, rule_id: &str, line: usize) -> bool {
        self.suppressions.covers(rule_id, line)
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

// ---------------------------------------------------------------------------
// Generated code
// ---------------------------------------------------------------------------

/// File-name based generated-code detection.
pub fn is_generated_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    lower.starts_with("temporarygeneratedfile_")
        || GENERATED_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Checks the comment header that precedes the first token for an
/// `<auto-generated>` marker.
pub fn has_generated_header(text: &str) -> bool {
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find('\n').unwrap_or(after.len());
            if is_generated_marker(&after[..end]) {
                return true;
            }
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix("/*") {
            let end = after.find("*/").unwrap_or(after.len());
            if is_generated_marker(&after[..end]) {
                return true;
            }
            rest = after.get(end + 2..).unwrap_or("");
        } else if rest.starts_with('#') {
            let end = rest.find('\n').unwrap_or(rest.len());
            rest = &rest[end..];
        } else {
            return false;
        }
        if rest.is_empty() {
            return false;
        }
    }
}

fn is_generated_marker(comment: &str) -> bool {
    let lower = comment.to_ascii_lowercase();
    lower.contains("<auto-generated") || lower.contains("<autogenerated")
}

// ---------------------------------------------------------------------------
// Pragma suppression
// ---------------------------------------------------------------------------

/// Disabled regions per diagnostic id. `"*"` stands for a bare
/// `#pragma warning disable` with no ids.
#[derive(Debug, Default)]
struct Suppressions {
    /// `(id, pragma line, restore line)`; lines strictly between are suppressed.
    regions: Vec<(String, usize, usize)>,
}

impl Suppressions {
    fn scan(text: &str) -> Self {
        let mut open: FxHashMap<String, usize> = FxHashMap::default();
        let mut regions = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let Some(caps) = PRAGMA_WARNING.captures(line) else {
                continue;
            };
            let action = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let ids = parse_pragma_ids(caps.get(2).map(|m| m.as_str()).unwrap_or(""));

            match (action, ids.is_empty()) {
                ("disable", true) => {
                    open.entry("*".to_string()).or_insert(line_no);
                }
                ("disable", false) => {
                    for id in ids {
                        open.entry(id).or_insert(line_no);
                    }
                }
                ("restore", true) => {
                    for (id, start) in open.drain() {
                        regions.push((id, start, line_no));
                    }
                }
                ("restore", false) => {
                    for id in ids {
                        if let Some(start) = open.remove(&id) {
                            regions.push((id, start, line_no));
                        }
                    }
                }
                _ => {}
            }
        }

        for (id, start) in open {
            regions.push((id, start, usize::MAX));
        }
        Self { regions }
    }

    fn covers(&self, rule_id: &str, line: usize) -> bool {
        self.regions.iter().any(|(id, start, end)| {
            (id == "*" || id.eq_ignore_ascii_case(rule_id)) && *start < line && line < *end
        })
    }
}

fn parse_pragma_ids(rest: &str) -> Vec<String> {
    let rest = rest.split("//").next().unwrap_or("");
    rest.split([',', ' ', '\t'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
