//! Single-pass driver walk over one file.
//!
//! Every type declaration, expression and switch statement is handed to the
//! rules subscribed to its [`NodeKind`]. The walker keeps the lexical state
//! rules need: enclosing declarations, imports, `this`, and typed locals.

use std::panic::{self, AssertUnwindSafe};

use tracing::{error, trace};

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleContext};
use crate::csharp::syntax::{
    has_attribute, Expr, ExprKind, LambdaBody, Member, MethodDecl, Parameter, Stmt, TypeDecl,
    TypeSyntax,
};
use crate::csharp::{Binder, Compilation, ImportScope, Scope, SourceFile, TypeRef};
use crate::lint_config::AnalysisConfig;

/// Rule indices per [`NodeKind::index`].
pub type DispatchTable = Vec<Vec<usize>>;

/// Build the `NodeKind -> [rule index]` table for `rules`.
pub fn dispatch_table(rules: &[Box<dyn Rule>]) -> DispatchTable {
    let mut table: DispatchTable = vec![Vec::new(); NodeKind::ALL.len()];
    for (idx, rule) in rules.iter().enumerate() {
        for kind in rule.node_kinds() {
            table[kind.index()].push(idx);
        }
    }
    table
}

/// Run every subscribed rule over file `file_idx` of the compilation.
pub fn analyze_file(
    comp: &Compilation,
    file_idx: usize,
    analysis: &AnalysisConfig,
    rules: &[Box<dyn Rule>],
    table: &DispatchTable,
) -> Vec<Diagnostic> {
    let file = comp.file(file_idx);
    if file.generated && !analysis.include_generated {
        trace!("skipping generated file {}", file.path.display());
        return Vec::new();
    }

    let mut walker = Walker {
        comp,
        file,
        file_idx,
        analysis,
        rules,
        table,
        enclosing: Vec::new(),
        scope: Scope::new(),
        imports: comp.scope_for(file_idx, "", None),
        this_type: None,
        out: Vec::new(),
    };
    for decl in &file.unit.types {
        walker.walk_type(decl);
    }
    for stmt in &file.unit.statements {
        walker.walk_stmt(stmt);
    }
    walker.out
}

struct Walker<'a> {
    comp: &'a Compilation,
    file: &'a SourceFile,
    file_idx: usize,
    analysis: &'a AnalysisConfig,
    rules: &'a [Box<dyn Rule>],
    table: &'a DispatchTable,
    enclosing: Vec<&'a TypeDecl>,
    scope: Scope,
    imports: ImportScope,
    this_type: Option<TypeRef>,
    out: Vec<Diagnostic>,
}

impl<'a> Walker<'a> {
    fn binder(&self) -> Binder<'_> {
        Binder {
            compilation: self.comp,
            imports: &self.imports,
            locals: &self.scope,
            this_type: self.this_type.as_ref(),
        }
    }

    fn resolve(&self, ty: &TypeSyntax) -> Option<TypeRef> {
        self.binder().resolve(ty)
    }

    fn dispatch(&mut self, node: Node<'_>) {
        let Some(kind) = node.kind() else {
            return;
        };
        let table = self.table;
        let subscribed = &table[kind.index()];
        if subscribed.is_empty() {
            return;
        }

        let mut found = Vec::new();
        {
            let ctx = RuleContext {
                file: self.file,
                compilation: self.comp,
                analysis: self.analysis,
                binder: self.binder(),
                enclosing: &self.enclosing,
            };
            for &idx in subscribed {
                let rule = &self.rules[idx];
                match panic::catch_unwind(AssertUnwindSafe(|| rule.check(&node, &ctx))) {
                    Ok(diags) => found.extend(diags),
                    Err(_) => {
                        let (line, _) = self.file.line_col(node.span().start);
                        let ids: Vec<&str> = rule.codes().iter().map(|c| c.as_str()).collect();
                        error!(
                            "rule {} panicked at {}:{}; continuing",
                            ids.join("/"),
                            self.file.path.display(),
                            line
                        );
                    }
                }
            }
        }
        self.out.extend(found);
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    fn walk_type(&mut self, decl: &'a TypeDecl) {
        if !self.analysis.include_generated && has_attribute(&decl.attributes, "GeneratedCode") {
            return;
        }

        let id = self.comp.type_id_of(self.file_idx, decl);
        let imports = self.comp.scope_for(self.file_idx, &decl.namespace, id);
        let saved_imports = std::mem::replace(&mut self.imports, imports);
        let this_type = id.map(|id| self.comp.self_type(id));
        let saved_this = std::mem::replace(&mut self.this_type, this_type);
        // Locals never cross into a nested type.
        let saved_scope = std::mem::replace(&mut self.scope, Scope::new());
        self.enclosing.push(decl);

        self.dispatch(Node::TypeDeclaration(decl));

        self.declare_params(&decl.primary_params);
        for arg in &decl.base_args {
            self.walk_expr(&arg.expr);
        }
        for member in &decl.members {
            self.walk_member(member);
        }
        for nested in &decl.nested {
            self.walk_type(nested);
        }

        self.enclosing.pop();
        self.scope = saved_scope;
        self.this_type = saved_this;
        self.imports = saved_imports;
    }

    fn walk_member(&mut self, member: &'a Member) {
        self.scope.push();
        match member {
            Member::Property(p) => {
                self.walk_stmts(&p.body);
                if let Some(init) = &p.initializer {
                    self.walk_expr(init);
                }
            }
            Member::Field(f) => {
                if let Some(init) = &f.initializer {
                    self.walk_expr(init);
                }
            }
            Member::Method(m) => self.walk_method(m),
            Member::Constructor(c) => {
                self.declare_params(&c.params);
                for arg in &c.initializer_args {
                    self.walk_expr(&arg.expr);
                }
                self.walk_stmts(&c.body);
            }
            Member::Other { body, .. } => self.walk_stmts(body),
        }
        self.scope.pop();
    }

    fn walk_method(&mut self, m: &'a MethodDecl) {
        let imports = self.imports.with_type_params(&m.type_params);
        let saved = std::mem::replace(&mut self.imports, imports);
        self.scope.push();
        self.declare_params(&m.params);
        self.walk_stmts(&m.body);
        self.scope.pop();
        self.imports = saved;
    }

    fn declare_params(&mut self, params: &[Parameter]) {
        for p in params {
            let ty = p.ty.as_ref().and_then(|t| self.resolve(t));
            self.scope.declare(p.name.clone(), ty);
        }
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn walk_stmts(&mut self, stmts: &'a [Stmt]) {
        for s in stmts {
            self.walk_stmt(s);
        }
    }

    fn walk_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(stmts) => {
                self.scope.push();
                self.walk_stmts(stmts);
                self.scope.pop();
            }
            Stmt::Expr(e) => self.walk_expr(e),
            Stmt::Local(vars) => {
                for v in vars {
                    if let Some(init) = &v.init {
                        self.walk_expr(init);
                    }
                    let ty = match (&v.ty, &v.init) {
                        (TypeSyntax::Implicit, Some(init)) => self.binder().type_of(init),
                        (TypeSyntax::Implicit, None) => None,
                        (ty, _) => self.resolve(ty),
                    };
                    self.scope.declare(v.name.clone(), ty);
                }
            }
            Stmt::Return(e, _) => {
                if let Some(e) = e {
                    self.walk_expr(e);
                }
            }
            Stmt::If { cond, then, els } => {
                self.walk_expr(cond);
                self.walk_nested(then);
                if let Some(els) = els {
                    self.walk_nested(els);
                }
            }
            Stmt::Switch { value, sections, span } => {
                self.dispatch(Node::SwitchStatement { value, span: *span });
                self.walk_expr(value);
                for section in sections {
                    self.scope.push();
                    for label in &section.labels {
                        self.walk_expr(label);
                    }
                    self.walk_stmts(&section.body);
                    self.scope.pop();
                }
            }
            Stmt::Foreach { var_ty, var_name, iter, body } => {
                self.walk_expr(iter);
                self.scope.push();
                if let Some(name) = var_name {
                    let ty = match var_ty {
                        TypeSyntax::Implicit => self.element_type_of(iter),
                        ty => self.resolve(ty),
                    };
                    self.scope.declare(name.clone(), ty);
                }
                self.walk_nested(body);
                self.scope.pop();
            }
            Stmt::LocalFunction(m) => self.walk_method(m),
            Stmt::Other { stmts, exprs } => {
                self.scope.push();
                self.walk_stmts(stmts);
                for e in exprs {
                    self.walk_expr(e);
                }
                self.scope.pop();
            }
        }
    }

    fn walk_nested(&mut self, stmt: &'a Stmt) {
        self.scope.push();
        self.walk_stmt(stmt);
        self.scope.pop();
    }

    /// Element type of the collection `iter` evaluates to.
    fn element_type_of(&self, iter: &Expr) -> Option<TypeRef> {
        let ty = self.binder().type_of(iter)?;
        match ty.unwrap_nullable() {
            TypeRef::Array(element) => Some((**element).clone()),
            other => {
                let index = other.known()?.element?;
                other.args().get(index).cloned()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn walk_expr(&mut self, e: &'a Expr) {
        self.dispatch(Node::Expr(e));

        if let ExprKind::Lambda { params, body } = &e.kind {
            self.scope.push();
            for p in params {
                let ty = p.ty.as_ref().and_then(|t| self.resolve(t));
                self.scope.declare(p.name.clone(), ty);
            }
            match body {
                LambdaBody::Expr(body) => self.walk_expr(body),
                LambdaBody::Block(stmts) => self.walk_stmts(stmts),
            }
            self.scope.pop();
            return;
        }

        for child in e.children() {
            self.walk_expr(child);
        }
    }
}

/// Parse `src` as one file and run `rule` over it with the default analysis
/// settings.
#[cfg(test)]
pub(crate) fn run_rule(rule: Box<dyn Rule>, src: &str) -> Vec<Diagnostic> {
    run_rule_with(rule, src, &AnalysisConfig::default())
}

#[cfg(test)]
pub(crate) fn run_rule_with(
    rule: Box<dyn Rule>,
    src: &str,
    analysis: &AnalysisConfig,
) -> Vec<Diagnostic> {
    let file = SourceFile::parse("Test.cs", src).expect("test source parses");
    let comp = Compilation::build(vec![file]);
    let rules = vec![rule];
    let table = dispatch_table(&rules);
    analyze_file(&comp, 0, analysis, &rules, &table)
}
