//! Rule codes, descriptors, and diagnostic types.

use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::csharp::syntax::{Expr, ExprKind, Span, TypeDecl};
use crate::csharp::{Binder, Compilation, SourceFile, TypeRef};
use crate::lint_config::AnalysisConfig;

/// Diagnostic ids reported by dsm-lint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleCode {
    /// DSM001: Ssn assigned on a response DTO without masking.
    DSM001,
    /// DSM002: Age or date-of-birth property missing the masking attribute.
    DSM002,
    /// DSM003: Badge identifier carrying the masking attribute.
    DSM003,
    /// DSM004: `FullName ?? First + " " + Last` style fallbacks.
    DSM004,
    /// DSM005: Request/response shape missing a shared category interface.
    DSM005,
    /// DSM006: Non-canonical property name for a shared category.
    DSM006,
    /// DSM007: Endpoint response type cannot reach the executive marker.
    DSM007,
    /// DSM008: `Math.Round` without `MidpointRounding.AwayFromZero`.
    DSM008,
    /// DSM009: `ToDictionary` keyed on Ssn.
    DSM009,
    /// DSM010: Business logic on the user-editable `CommentType.Name`.
    DSM010,
    /// DSM013: Request/response DTO without a static example factory.
    DSM013,
    /// DSMPS001: Direct use of a restricted data accessor.
    DSMPS001,
}

impl RuleCode {
    /// Parse a rule code from string (e.g., "DSM001"), case-insensitively.
    pub fn parse_code(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        RuleCode::all().iter().copied().find(|c| c.as_str() == upper)
    }

    /// All available rule codes.
    pub fn all() -> &'static [RuleCode] {
        &[
            RuleCode::DSM001,
            RuleCode::DSM002,
            RuleCode::DSM003,
            RuleCode::DSM004,
            RuleCode::DSM005,
            RuleCode::DSM006,
            RuleCode::DSM007,
            RuleCode::DSM008,
            RuleCode::DSM009,
            RuleCode::DSM010,
            RuleCode::DSM013,
            RuleCode::DSMPS001,
        ]
    }

    /// Return the string representation (e.g., `"DSM001"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCode::DSM001 => "DSM001",
            RuleCode::DSM002 => "DSM002",
            RuleCode::DSM003 => "DSM003",
            RuleCode::DSM004 => "DSM004",
            RuleCode::DSM005 => "DSM005",
            RuleCode::DSM006 => "DSM006",
            RuleCode::DSM007 => "DSM007",
            RuleCode::DSM008 => "DSM008",
            RuleCode::DSM009 => "DSM009",
            RuleCode::DSM010 => "DSM010",
            RuleCode::DSM013 => "DSM013",
            RuleCode::DSMPS001 => "DSMPS001",
        }
    }

    /// Short kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            RuleCode::DSM001 => "masked-ssn-assignment",
            RuleCode::DSM002 => "sensitive-needs-mask",
            RuleCode::DSM003 => "badge-not-masked",
            RuleCode::DSM004 => "name-concat-fallback",
            RuleCode::DSM005 => "missing-name-interface",
            RuleCode::DSM006 => "non-canonical-name",
            RuleCode::DSM007 => "executive-capability",
            RuleCode::DSM008 => "rounding-mode",
            RuleCode::DSM009 => "non-unique-key",
            RuleCode::DSM010 => "comment-name-logic",
            RuleCode::DSM013 => "example-method",
            RuleCode::DSMPS001 => "restricted-accessor",
        }
    }

    /// Static descriptor of this code.
    pub fn descriptor(&self) -> &'static Descriptor {
        // DESCRIPTORS is declared in enum order.
        &DESCRIPTORS[*self as usize]
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

impl DiagnosticSeverity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(DiagnosticSeverity::Error),
            "warning" => Some(DiagnosticSeverity::Warning),
            "info" => Some(DiagnosticSeverity::Info),
            _ => None,
        }
    }

    /// Numeric rank: higher is more severe.
    pub fn rank(self) -> u8 {
        match self {
            DiagnosticSeverity::Error => 2,
            DiagnosticSeverity::Warning => 1,
            DiagnosticSeverity::Info => 0,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Info => write!(f, "info"),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Immutable metadata for one diagnostic id.
#[derive(Debug, Clone, Serialize)]
pub struct Descriptor {
    pub id: RuleCode,
    pub title: &'static str,
    /// Message with `{0}`, `{1}`, ... placeholders.
    pub message_format: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub default_severity: DiagnosticSeverity,
    pub enabled_by_default: bool,
}

impl Descriptor {
    /// Substitute positional arguments into the message template.
    pub fn format_message(&self, args: &[String]) -> String {
        let mut out = self.message_format.to_string();
        for (i, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{i}}}"), arg);
        }
        out
    }
}

const fn descriptor(
    id: RuleCode,
    title: &'static str,
    message_format: &'static str,
    description: &'static str,
    category: &'static str,
    default_severity: DiagnosticSeverity,
) -> Descriptor {
    Descriptor {
        id,
        title,
        message_format,
        description,
        category,
        default_severity,
        enabled_by_default: true,
    }
}

use DiagnosticSeverity::{Error, Info, Warning};

static DESCRIPTORS: &[Descriptor] = &[
    descriptor(
        RuleCode::DSM001,
        "Ssn must be masked when assigned to a response DTO",
        "Ssn on '{0}' must be assigned from MaskSsn(...), null, or an already-masked literal",
        "Response DTOs leave the service boundary. An Ssn value assigned to one must go \
         through MaskSsn(...) or be null or an already-masked literal.",
        "Security",
        Error,
    ),
    descriptor(
        RuleCode::DSM002,
        "Age and date-of-birth properties must be masked",
        "Property '{0}' on '{1}' must be annotated with [{2}] (on the property or its type)",
        "Person-describing response DTOs must annotate age and date-of-birth properties \
         with the masking attribute, either on the property or on the type.",
        "Security",
        Error,
    ),
    descriptor(
        RuleCode::DSM003,
        "Badge identifiers must not be masked",
        "Property '{0}' on '{1}' is an identifier and must not be annotated with [{2}]",
        "Badge numbers identify records across screens; masking them breaks lookups.",
        "Security",
        Error,
    ),
    descriptor(
        RuleCode::DSM004,
        "Do not fall back to manual name concatenation",
        "Do not use manual name concatenation fallback. Use FullName property only without fallback to '{0}'.",
        "FullName is computed once on the server. Rebuilding it from name parts as a \
         fallback produces inconsistent formatting.",
        "Design",
        Error,
    ),
    descriptor(
        RuleCode::DSM005,
        "Request/response shape should implement the shared name interface",
        "'{0}' declares {1} properties but does not implement '{2}'",
        "Contract types that expose name, phone, email or city properties should list \
         the shared category interface so consumers can treat them uniformly.",
        "Naming",
        Warning,
    ),
    descriptor(
        RuleCode::DSM006,
        "Use the canonical property name",
        "Property '{0}' on '{1}' should be named '{2}' so the shared '{3}' interface applies",
        "Abbreviated or alternative property names prevent the shared category interface \
         from being implemented.",
        "Naming",
        Info,
    ),
    descriptor(
        RuleCode::DSM007,
        "Endpoint response must expose the executive flag",
        "Response type '{0}' returned by this endpoint must expose '{1}' (directly or through a member) or be annotated with [{2}]",
        "Responses that describe people must let the client know whether a row is an \
         executive so the UI can restrict it.",
        "Security",
        Error,
    ),
    descriptor(
        RuleCode::DSM008,
        "Math.Round must round AwayFromZero",
        "Math.Round uses banker's rounding unless MidpointRounding.AwayFromZero is passed; monetary values must round AwayFromZero",
        "Math.Round defaults to MidpointRounding.ToEven, which differs from the payroll \
         system for monetary amounts.",
        "Correctness",
        Warning,
    ),
    descriptor(
        RuleCode::DSM009,
        "Do not key dictionaries on Ssn",
        "'{0}' keys on Ssn, which is not unique; use a unique identifier (e.g. Id or BadgeNumber) as the key",
        "Ssn is not unique across demographics and beneficiaries, so ToDictionary throws \
         on duplicate keys at runtime.",
        "Correctness",
        Warning,
    ),
    descriptor(
        RuleCode::DSM010,
        "Do not use CommentType.Name in business logic",
        "Do not use CommentType.Name in business logic; it is user-editable. Compare on CommentType.Id instead",
        "Comment type names can be renamed by users; logic must key on the stable Id.",
        "Correctness",
        Error,
    ),
    descriptor(
        RuleCode::DSM013,
        "Request/response DTOs must provide an example factory",
        "Type '{0}' used as {1} in endpoint must have a public static `{2}()` method",
        "API documentation is generated from RequestExample()/ResponseExample() factories \
         on every request and response type used by an endpoint.",
        "API Documentation",
        Error,
    ),
    descriptor(
        RuleCode::DSMPS001,
        "Restricted data accessor",
        "Direct use of '{0}' is restricted; go through IDemographicReaderService.BuildDemographicQuery instead",
        "Demographic data must be read through the reader service so that frozen and live \
         data are selected consistently.",
        "Architecture",
        Error,
    ),
];

static REGISTRY: Lazy<FxHashMap<&'static str, &'static Descriptor>> =
    Lazy::new(|| DESCRIPTORS.iter().map(|d| (d.id.as_str(), d)).collect());

/// Map from id to descriptor, built once.
pub fn descriptor_registry() -> &'static FxHashMap<&'static str, &'static Descriptor> {
    &REGISTRY
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A text range in a file (1-indexed lines and columns, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Range {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Range {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        debug_assert!(start_line >= 1 && start_col >= 1, "ranges are 1-indexed");
        debug_assert!(
            (end_line, end_col) >= (start_line, start_col),
            "range end precedes start"
        );
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// A lint diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The rule that produced this diagnostic.
    pub rule: RuleCode,
    pub severity: DiagnosticSeverity,
    pub category: &'static str,
    pub file: PathBuf,
    pub range: Range,
    /// Formatted message.
    pub message: String,
    /// Message arguments, in template order.
    pub args: Vec<String>,
}

// ---------------------------------------------------------------------------
// Rule interface
// ---------------------------------------------------------------------------

/// Syntax node kinds a rule can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    BinaryExpression,
    ConditionalExpression,
    Invocation,
    MemberAccess,
    Assignment,
    ObjectCreation,
    WithExpression,
    SwitchExpression,
    SwitchStatement,
    TypeDeclaration,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::BinaryExpression,
        NodeKind::ConditionalExpression,
        NodeKind::Invocation,
        NodeKind::MemberAccess,
        NodeKind::Assignment,
        NodeKind::ObjectCreation,
        NodeKind::WithExpression,
        NodeKind::SwitchExpression,
        NodeKind::SwitchStatement,
        NodeKind::TypeDeclaration,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A node handed to rules.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Expr(&'a Expr),
    SwitchStatement { value: &'a Expr, span: Span },
    TypeDeclaration(&'a TypeDecl),
}

impl<'a> Node<'a> {
    /// Subscription kind, or `None` for expressions no rule can subscribe to.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Node::SwitchStatement { .. } => Some(NodeKind::SwitchStatement),
            Node::TypeDeclaration(_) => Some(NodeKind::TypeDeclaration),
            Node::Expr(e) => match e.kind {
                ExprKind::Binary { .. } => Some(NodeKind::BinaryExpression),
                ExprKind::Conditional { .. } => Some(NodeKind::ConditionalExpression),
                ExprKind::Invocation { .. } => Some(NodeKind::Invocation),
                ExprKind::MemberAccess { .. } => Some(NodeKind::MemberAccess),
                ExprKind::Assignment { .. } => Some(NodeKind::Assignment),
                ExprKind::ObjectCreation { .. } => Some(NodeKind::ObjectCreation),
                ExprKind::With { .. } => Some(NodeKind::WithExpression),
                ExprKind::Switch { .. } => Some(NodeKind::SwitchExpression),
                _ => None,
            },
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Expr(e) => e.span,
            Node::SwitchStatement { span, .. } => *span,
            Node::TypeDeclaration(d) => d.span,
        }
    }
}

/// Everything a rule may look at for one node.
pub struct RuleContext<'a> {
    pub file: &'a SourceFile,
    pub compilation: &'a Compilation,
    pub analysis: &'a AnalysisConfig,
    /// Expression typing at this point of the walk.
    pub binder: Binder<'a>,
    /// Enclosing type declarations, outermost first.
    pub enclosing: &'a [&'a TypeDecl],
}

impl<'a> RuleContext<'a> {
    /// Build a diagnostic for `code` at `span` with message arguments.
    pub fn diagnostic(&self, code: RuleCode, span: Span, args: Vec<String>) -> Diagnostic {
        let desc = code.descriptor();
        Diagnostic {
            rule: code,
            severity: desc.default_severity,
            category: desc.category,
            file: self.file.path.clone(),
            range: self.file.range(span),
            message: desc.format_message(&args),
            args,
        }
    }

    pub fn type_of(&self, expr: &Expr) -> Option<TypeRef> {
        self.binder.type_of(expr)
    }

    pub fn text(&self, span: Span) -> &'a str {
        self.file.text_of(span)
    }

    /// Whether the node sits lexically inside a type declared in a response
    /// contracts namespace.
    pub fn inside_response_contract(&self) -> bool {
        self.enclosing
            .iter()
            .any(|d| self.analysis.is_response_namespace(&d.namespace))
    }

    /// Whether `ty` is a source type declared in a response contracts namespace.
    pub fn is_response_dto(&self, ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Source { .. })
            && self
                .compilation
                .namespace_of(ty)
                .is_some_and(|ns| self.analysis.is_response_namespace(&ns))
    }
}

/// A lint rule: stateless, shareable across threads.
pub trait Rule: Send + Sync {
    /// Diagnostic ids this rule can report.
    fn codes(&self) -> &'static [RuleCode];

    /// Node kinds the driver should hand to [`Rule::check`].
    fn node_kinds(&self) -> &'static [NodeKind];

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic>;
}

/// Print the rule manifest as a table.
pub fn print_rules() {
    println!("Available dsm-lint rules:\n");
    println!(
        "{:<9} {:<8} {:<18} {:<24} Title",
        "Code", "Severity", "Category", "Name"
    );
    println!("{}", "-".repeat(100));

    for code in RuleCode::all() {
        let d = code.descriptor();
        println!(
            "{:<9} {:<8} {:<18} {:<24} {}",
            code,
            d.default_severity,
            d.category,
            code.name(),
            d.title
        );
    }

    println!("\nUse --select to enable specific rules (e.g., --select DSM001,DSM007)");
    println!("Use --ignore to disable specific rules (e.g., --ignore DSM006)");
}

/// Rule manifest as JSON.
pub fn rules_json() -> serde_json::Result<String> {
    let all: Vec<&Descriptor> = RuleCode::all().iter().map(|c| c.descriptor()).collect();
    serde_json::to_string_pretty(&all)
}
