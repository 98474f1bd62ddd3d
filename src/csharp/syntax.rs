//! Owned syntax model for C# compilation units.
//!
//! The tree-sitter CST is lowered into these types once per file
//! (see [`super::parser`]). Rules never touch tree-sitter nodes directly;
//! they pattern-match on [`ExprKind`] and friends, which keeps every rule a
//! pure function over plain data.

/// Byte range of a syntax element within its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

// ---------------------------------------------------------------------------
// Types as written
// ---------------------------------------------------------------------------

/// A type reference as it appears in source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSyntax {
    /// `Ns.Name<Args>`; `qualifier` holds the dotted prefix segments
    /// (an `alias::` prefix such as `global::` is dropped).
    Named {
        qualifier: Vec<String>,
        name: String,
        args: Vec<TypeSyntax>,
    },
    /// C# keyword type: `int`, `string`, `object`, `void`, ...
    Predefined(String),
    /// `T?`
    Nullable(Box<TypeSyntax>),
    /// `T[]`, `T[,]`
    Array(Box<TypeSyntax>),
    /// `(A, B)`
    Tuple(Vec<TypeSyntax>),
    /// `var`
    Implicit,
    /// Anything the model does not understand (pointers, function pointers).
    Other(String),
}

impl TypeSyntax {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSyntax::Named {
            qualifier: Vec::new(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Last identifier of the type name, without generic arguments.
    pub fn simple_name(&self) -> &str {
        match self {
            TypeSyntax::Named { name, .. } => name,
            TypeSyntax::Predefined(k) => k,
            TypeSyntax::Nullable(inner) | TypeSyntax::Array(inner) => inner.simple_name(),
            TypeSyntax::Tuple(_) => "",
            TypeSyntax::Implicit => "var",
            TypeSyntax::Other(text) => text,
        }
    }

    /// Number of generic arguments written on the outermost name.
    pub fn arity(&self) -> usize {
        match self {
            TypeSyntax::Named { args, .. } => args.len(),
            _ => 0,
        }
    }

    /// Source-like rendering, used for diagnostics and base-list matching.
    pub fn display(&self) -> String {
        match self {
            TypeSyntax::Named { qualifier, name, args } => {
                let mut out = String::new();
                for q in qualifier {
                    out.push_str(q);
                    out.push('.');
                }
                out.push_str(name);
                if !args.is_empty() {
                    out.push('<');
                    let rendered: Vec<String> = args.iter().map(TypeSyntax::display).collect();
                    out.push_str(&rendered.join(", "));
                    out.push('>');
                }
                out
            }
            TypeSyntax::Predefined(k) => k.clone(),
            TypeSyntax::Nullable(inner) => format!("{}?", inner.display()),
            TypeSyntax::Array(inner) => format!("{}[]", inner.display()),
            TypeSyntax::Tuple(items) => {
                let rendered: Vec<String> = items.iter().map(TypeSyntax::display).collect();
                format!("({})", rendered.join(", "))
            }
            TypeSyntax::Implicit => "var".to_string(),
            TypeSyntax::Other(text) => text.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// `using` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    /// Namespace (or type, for `using static`) being imported.
    pub target: String,
    /// `using Alias = Target;`
    pub alias: Option<String>,
    pub is_static: bool,
    pub is_global: bool,
    /// Namespace the directive is declared in (empty at file level).
    pub scope: String,
}

/// An attribute application such as `[MaskSensitive]` or `[Foo.Bar()]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written, possibly qualified.
    pub name: String,
    pub span: Span,
}

impl Attribute {
    /// Last segment of the attribute name with any `Attribute` suffix removed.
    pub fn short_name(&self) -> &str {
        let last = self.name.rsplit(|c| c == '.' || c == ':').next().unwrap_or(&self.name);
        last.strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(last)
    }

    /// Whether this attribute refers to `wanted`, ignoring qualification and
    /// the optional `Attribute` suffix on either side.
    pub fn is(&self, wanted: &str) -> bool {
        let wanted = wanted.rsplit('.').next().unwrap_or(wanted);
        let wanted = wanted
            .strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(wanted);
        self.short_name() == wanted
    }
}

/// Returns true if any attribute in `attrs` matches `wanted`.
pub fn has_attribute(attrs: &[Attribute], wanted: &str) -> bool {
    attrs.iter().any(|a| a.is(wanted))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Record,
    RecordStruct,
    Struct,
    Interface,
    Enum,
}

impl TypeKind {
    pub fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::RecordStruct | TypeKind::Enum)
    }
}

/// Entry in a type's base list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEntry {
    pub ty: TypeSyntax,
    /// Source text of the entry, e.g. `INameParts` or `Base<Req, Resp>`.
    pub text: String,
    pub span: Span,
}

/// Method, constructor, lambda or record primary-constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub name_span: Span,
    pub ty: Option<TypeSyntax>,
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<String>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub name_span: Span,
    pub span: Span,
    /// Dotted namespace, empty for the global namespace.
    pub namespace: String,
    /// Names of the enclosing types, outermost first.
    pub containing: Vec<String>,
    pub modifiers: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub type_params: Vec<String>,
    pub bases: Vec<BaseEntry>,
    /// Record primary-constructor parameters (positional properties).
    pub primary_params: Vec<Parameter>,
    /// Arguments passed to the base type from a primary constructor.
    pub base_args: Vec<Argument>,
    pub members: Vec<Member>,
    pub nested: Vec<TypeDecl>,
}

impl TypeDecl {
    pub fn has_modifier(&self, m: &str) -> bool {
        self.modifiers.iter().any(|x| x == m)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_modifier("abstract")
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, TypeKind::Record | TypeKind::RecordStruct)
    }

    /// Fully qualified metadata-ish name: `Ns.Outer.Name`.
    pub fn full_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.namespace.is_empty() {
            parts.push(&self.namespace);
        }
        for c in &self.containing {
            parts.push(c);
        }
        parts.push(&self.name);
        parts.join(".")
    }

    /// Property-like members: declared properties plus positional record
    /// parameters, as `(name, name_span, type, attributes)`.
    pub fn properties(&self) -> Vec<PropertyView<'_>> {
        let mut out = Vec::new();
        if self.is_record() {
            for p in &self.primary_params {
                out.push(PropertyView {
                    name: &p.name,
                    name_span: p.name_span,
                    ty: p.ty.as_ref(),
                    attributes: &p.attributes,
                });
            }
        }
        for m in &self.members {
            if let Member::Property(p) = m {
                out.push(PropertyView {
                    name: &p.name,
                    name_span: p.name_span,
                    ty: Some(&p.ty),
                    attributes: &p.attributes,
                });
            }
        }
        out
    }
}

/// Borrowed view over a property or positional record parameter.
#[derive(Debug, Clone, Copy)]
pub struct PropertyView<'a> {
    pub name: &'a str,
    pub name_span: Span,
    pub ty: Option<&'a TypeSyntax>,
    pub attributes: &'a [Attribute],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Property(PropertyDecl),
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    /// Indexers, operators, events, destructors: only their bodies matter.
    Other { body: Vec<Stmt>, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub name_span: Span,
    pub ty: TypeSyntax,
    pub modifiers: Vec<String>,
    pub attributes: Vec<Attribute>,
    /// Accessor bodies and expression bodies, lowered to statements.
    pub body: Vec<Stmt>,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub name_span: Span,
    pub ty: TypeSyntax,
    pub modifiers: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub name_span: Span,
    pub return_type: TypeSyntax,
    pub modifiers: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub type_params: Vec<String>,
    pub params: Vec<Parameter>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub modifiers: Vec<String>,
    pub params: Vec<Parameter>,
    /// `: base(...)` / `: this(...)` arguments.
    pub initializer_args: Vec<Argument>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

fn has(mods: &[String], m: &str) -> bool {
    mods.iter().any(|x| x == m)
}

impl Member {
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Property(p) => Some(&p.name),
            Member::Field(f) => Some(&f.name),
            Member::Method(m) => Some(&m.name),
            Member::Constructor(_) | Member::Other { .. } => None,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Member::Property(p) => has(&p.modifiers, "static"),
            Member::Field(f) => has(&f.modifiers, "static") || has(&f.modifiers, "const"),
            Member::Method(m) => has(&m.modifiers, "static"),
            Member::Constructor(c) => has(&c.modifiers, "static"),
            Member::Other { .. } => false,
        }
    }
}

impl MethodDecl {
    pub fn is_static(&self) -> bool {
        has(&self.modifiers, "static")
    }

    pub fn is_public(&self) -> bool {
        has(&self.modifiers, "public")
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: String,
    pub ty: TypeSyntax,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    /// `case` label values and patterns, lowered as expressions.
    pub labels: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Expr(Expr),
    Local(Vec<LocalVar>),
    Return(Option<Expr>, Span),
    If {
        cond: Expr,
        then: Box<Stmt>,
        els: Option<Box<Stmt>>,
    },
    Switch {
        value: Expr,
        sections: Vec<SwitchSection>,
        span: Span,
    },
    Foreach {
        var_ty: TypeSyntax,
        var_name: Option<String>,
        iter: Expr,
        body: Box<Stmt>,
    },
    LocalFunction(Box<MethodDecl>),
    /// Loops, `try`, `using`, `lock`, ... Statements are visited in a fresh
    /// scope, in order, before the expressions.
    Other { stmts: Vec<Stmt>, exprs: Vec<Expr> },
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// `name:` for named arguments.
    pub name: Option<String>,
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Raw source text including quotes and any `@`/`$` prefix.
    String(String),
    Null,
    Number(String),
    Bool(bool),
    Char(String),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaParam {
    pub name: String,
    pub ty: Option<TypeSyntax>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArm {
    /// Pattern and `when` clause, lowered as expressions.
    pub pattern: Vec<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(String),
    This,
    MemberAccess {
        target: Box<Expr>,
        name: String,
        name_span: Span,
        /// `a?.b`
        conditional: bool,
    },
    Invocation {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Assignment {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Parenthesized(Box<Expr>),
    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
    },
    /// `new T(args) { init }`; `ty` is `None` for target-typed `new()` and
    /// anonymous objects.
    ObjectCreation {
        ty: Option<TypeSyntax>,
        args: Vec<Argument>,
        initializer: Option<Vec<Expr>>,
    },
    /// Array/collection creation and bare `{ ... }` initializers.
    Collection(Vec<Expr>),
    /// `target with { A = x }`; assignments are `Assignment` expressions.
    With {
        target: Box<Expr>,
        assignments: Vec<Expr>,
    },
    Switch {
        governing: Box<Expr>,
        arms: Vec<SwitchArm>,
    },
    Literal(Literal),
    /// Interpolated string; holds the interpolation expressions in order.
    Interpolated(Vec<Expr>),
    ElementAccess {
        target: Box<Expr>,
        args: Vec<Argument>,
    },
    /// `(T)x` and `x as T`.
    Cast {
        ty: TypeSyntax,
        expr: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    /// Anything else; children are kept so walkers still reach them.
    Other(Vec<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        let mut e = self;
        while let ExprKind::Parenthesized(inner) = &e.kind {
            e = inner;
        }
        e
    }

    /// Name of an identifier or the member name of a member access.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(n) => Some(n),
            ExprKind::MemberAccess { name, .. } => Some(name),
            _ => None,
        }
    }

    /// For an invocation, the invoked method name (`Foo` in `x.Foo()` or `Foo()`).
    pub fn invoked_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Invocation { callee, .. } => callee.simple_name(),
            _ => None,
        }
    }

    pub fn is_string_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::String(_)))
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::Null))
    }

    /// Direct child expressions, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        let mut out: Vec<&Expr> = Vec::new();
        match &self.kind {
            ExprKind::Identifier(_) | ExprKind::This | ExprKind::Literal(_) => {}
            ExprKind::MemberAccess { target, .. } => out.push(target),
            ExprKind::Invocation { callee, args } => {
                out.push(callee);
                out.extend(args.iter().map(|a| &a.expr));
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Assignment { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            ExprKind::Conditional { cond, when_true, when_false } => {
                out.push(cond);
                out.push(when_true);
                out.push(when_false);
            }
            ExprKind::Parenthesized(inner) => out.push(inner),
            ExprKind::Lambda { body, .. } => {
                if let LambdaBody::Expr(e) = body {
                    out.push(e);
                }
            }
            ExprKind::ObjectCreation { args, initializer, .. } => {
                out.extend(args.iter().map(|a| &a.expr));
                if let Some(init) = initializer {
                    out.extend(init.iter());
                }
            }
            ExprKind::Collection(items) | ExprKind::Interpolated(items) | ExprKind::Other(items) => {
                out.extend(items.iter());
            }
            ExprKind::With { target, assignments } => {
                out.push(target);
                out.extend(assignments.iter());
            }
            ExprKind::Switch { governing, arms } => {
                out.push(governing);
                for arm in arms {
                    out.extend(arm.pattern.iter());
                    out.push(&arm.value);
                }
            }
            ExprKind::ElementAccess { target, args } => {
                out.push(target);
                out.extend(args.iter().map(|a| &a.expr));
            }
            ExprKind::Cast { expr, .. } => out.push(expr),
            ExprKind::Unary { operand, .. } => out.push(operand),
        }
        out
    }

    /// Pre-order search over this expression and its descendants, including
    /// expressions nested in lambda block bodies.
    pub fn any(&self, pred: &mut dyn FnMut(&Expr) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        if let ExprKind::Lambda { body: LambdaBody::Block(stmts), .. } = &self.kind {
            if stmts.iter().any(|s| s.any_expr(pred)) {
                return true;
            }
        }
        self.children().into_iter().any(|c| c.any(pred))
    }
}

impl Stmt {
    /// Pre-order search over every expression reachable from this statement.
    pub fn any_expr(&self, pred: &mut dyn FnMut(&Expr) -> bool) -> bool {
        match self {
            Stmt::Block(stmts) => stmts.iter().any(|s| s.any_expr(pred)),
            Stmt::Expr(e) => e.any(pred),
            Stmt::Local(vars) => vars
                .iter()
                .filter_map(|v| v.init.as_ref())
                .any(|e| e.any(pred)),
            Stmt::Return(e, _) => e.as_ref().is_some_and(|e| e.any(pred)),
            Stmt::If { cond, then, els } => {
                cond.any(pred)
                    || then.any_expr(pred)
                    || els.as_ref().is_some_and(|s| s.any_expr(pred))
            }
            Stmt::Switch { value, sections, .. } => {
                value.any(pred)
                    || sections.iter().any(|sec| {
                        sec.labels.iter().any(|l| l.any(pred))
                            || sec.body.iter().any(|s| s.any_expr(pred))
                    })
            }
            Stmt::Foreach { iter, body, .. } => iter.any(pred) || body.any_expr(pred),
            Stmt::LocalFunction(m) => m.body.iter().any(|s| s.any_expr(pred)),
            Stmt::Other { stmts, exprs } => {
                stmts.iter().any(|s| s.any_expr(pred)) || exprs.iter().any(|e| e.any(pred))
            }
        }
    }
}

/// A parsed C# file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub types: Vec<TypeDecl>,
    /// Top-level statements (C# 9 programs).
    pub statements: Vec<Stmt>,
}

impl CompilationUnit {
    /// Every type declaration in the file, nested ones included, pre-order.
    pub fn all_types(&self) -> Vec<&TypeDecl> {
        fn walk<'a>(t: &'a TypeDecl, out: &mut Vec<&'a TypeDecl>) {
            out.push(t);
            for n in &t.nested {
                walk(n, out);
            }
        }
        let mut out = Vec::new();
        for t in &self.types {
            walk(t, &mut out);
        }
        out
    }
}
