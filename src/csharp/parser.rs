//! Lowering from the tree-sitter C# CST to the owned syntax model.
//!
//! # Parser caching
//!
//! Creating a tree-sitter parser allocates and loads the grammar, so each
//! worker thread keeps one parser in a thread-local slot and reuses it for
//! every file it handles.
//!
//! The lowering is deliberately forgiving: comments and preprocessor
//! directives are skipped, `#if` regions and `ERROR` nodes are descended
//! into, and anything unrecognised becomes an `Other` node that still
//! carries its children.

use std::cell::RefCell;
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use super::syntax::*;
use crate::error::LintError;

/// Maximum expression nesting lowered before children are dropped.
const MAX_EXPR_DEPTH: usize = 400;

thread_local! {
    static PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn new_parser(path: &Path) -> Result<Parser, LintError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| LintError::Parse {
            path: path.to_path_buf(),
            detail: format!("failed to load C# grammar: {e}"),
        })?;
    Ok(parser)
}

/// Parse `text` with the calling thread's cached parser.
fn parse_tree(path: &Path, text: &str) -> Result<Tree, LintError> {
    PARSER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(new_parser(path)?);
        }
        let parser = slot.as_mut().ok_or_else(|| LintError::Parse {
            path: path.to_path_buf(),
            detail: "parser unavailable".to_string(),
        })?;
        parser.parse(text, None).ok_or_else(|| LintError::Parse {
            path: path.to_path_buf(),
            detail: "tree-sitter returned no tree".to_string(),
        })
    })
}

/// Parse and lower a C# file. Returns the compilation unit and the number of
/// syntax-error nodes in the tree.
pub fn parse_compilation_unit(
    path: &Path,
    text: &str,
) -> Result<(CompilationUnit, usize), LintError> {
    let tree = parse_tree(path, text)?;
    let root = tree.root_node();
    let errors = if root.has_error() { count_errors(root) } else { 0 };

    let mut lowerer = Lowerer {
        src: text.as_bytes(),
        binding: None,
        depth: 0,
    };
    let mut unit = CompilationUnit::default();
    lowerer.namespace_items(root, "", &mut unit);
    Ok((unit, errors))
}

fn count_errors(node: Node<'_>) -> usize {
    let own = usize::from(node.is_error() || node.is_missing());
    if !node.has_error() {
        return own;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    own + children.into_iter().map(count_errors).sum::<usize>()
}

// ---------------------------------------------------------------------------
// Node helpers
// ---------------------------------------------------------------------------

fn span(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// Named children with comments and directives removed; `#if` branches and
/// `ERROR` nodes are flattened into the surrounding list.
fn items(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    collect_items(node, &mut out);
    out
}

fn collect_items<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let condition = if node.kind().starts_with("preproc_") {
        node.child_by_field_name("condition").map(|c| c.id())
    } else {
        None
    };
    for child in named_children(node) {
        if Some(child.id()) == condition {
            continue;
        }
        let kind = child.kind();
        if kind == "comment" {
            continue;
        }
        if kind.starts_with("preproc_") {
            if matches!(kind, "preproc_if" | "preproc_elif" | "preproc_else") {
                collect_items(child, out);
            }
            continue;
        }
        if kind == "ERROR" {
            collect_items(child, out);
            continue;
        }
        out.push(child);
    }
}

fn is_statement_kind(kind: &str) -> bool {
    kind == "block" || kind.ends_with("_statement")
}

fn is_type_decl_kind(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "record_declaration"
            | "record_struct_declaration"
            | "struct_declaration"
            | "interface_declaration"
            | "enum_declaration"
    )
}

fn join_namespace(outer: &str, inner: &str) -> String {
    if outer.is_empty() {
        inner.to_string()
    } else {
        format!("{outer}.{inner}")
    }
}

struct Lowerer<'s> {
    src: &'s [u8],
    /// Receiver of the innermost `?.` whose binding has not been consumed.
    binding: Option<Expr>,
    depth: usize,
}

impl<'s> Lowerer<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.src).unwrap_or("")
    }

    /// Dotted name text with whitespace removed (`Foo . Bar` -> `Foo.Bar`).
    fn name_text(&self, node: Node<'_>) -> String {
        let raw = self.text(node);
        let raw = raw.strip_prefix("global::").unwrap_or(raw);
        raw.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Identifier of a `_simple_name` (identifier or generic name).
    fn simple_name(&self, node: Node<'_>) -> String {
        match node.kind() {
            "generic_name" => node
                .child_by_field_name("name")
                .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "identifier"))
                .map(|n| self.text(n).to_string())
                .unwrap_or_default(),
            "qualified_name" | "alias_qualified_name" => node
                .child_by_field_name("name")
                .map(|n| self.simple_name(n))
                .unwrap_or_else(|| self.text(node).to_string()),
            _ => self.text(node).to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Namespaces and usings
    // -----------------------------------------------------------------------

    fn namespace_items(&mut self, node: Node<'_>, outer_ns: &str, unit: &mut CompilationUnit) {
        let mut ns = outer_ns.to_string();
        for child in items(node) {
            match child.kind() {
                "using_directive" => {
                    if let Some(u) = self.using_directive(child, &ns) {
                        unit.usings.push(u);
                    }
                }
                "namespace_declaration" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.name_text(n))
                        .unwrap_or_default();
                    let full = join_namespace(&ns, &name);
                    if let Some(body) = child.child_by_field_name("body") {
                        self.namespace_items(body, &full, unit);
                    }
                }
                "file_scoped_namespace_declaration" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.name_text(n))
                        .unwrap_or_default();
                    ns = join_namespace(outer_ns, &name);
                    // Some grammar versions nest the members under the
                    // declaration instead of leaving them as siblings.
                    self.namespace_items(child, &ns, unit);
                }
                "global_statement" => {
                    for s in items(child) {
                        if let Some(stmt) = self.stmt(s) {
                            unit.statements.push(stmt);
                        }
                    }
                }
                kind if is_type_decl_kind(kind) => {
                    unit.types.push(self.type_decl(child, &ns, &[]));
                }
                _ => {}
            }
        }
    }

    fn using_directive(&self, node: Node<'_>, scope: &str) -> Option<UsingDirective> {
        let is_global = has_token(node, "global");
        let is_static = has_token(node, "static");
        let children = named_children(node);

        let (alias, target) = if let Some(eq) = children.iter().find(|c| c.kind() == "name_equals") {
            let alias = named_children(*eq)
                .into_iter()
                .find(|c| c.kind() == "identifier")
                .map(|c| self.text(c).to_string());
            let target = children.iter().rev().find(|c| c.id() != eq.id()).copied();
            (alias, target)
        } else if has_token(node, "=") {
            let alias = node
                .child_by_field_name("name")
                .or_else(|| children.first().copied())
                .map(|c| self.text(c).to_string());
            (alias, children.last().copied())
        } else {
            (None, children.first().copied())
        };

        let target = target?;
        Some(UsingDirective {
            target: self.name_text(target),
            alias,
            is_static,
            is_global,
            scope: scope.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Types as written
    // -----------------------------------------------------------------------

    fn type_syntax(&self, node: Node<'_>) -> TypeSyntax {
        match node.kind() {
            "identifier" => {
                let text = self.text(node);
                if text == "var" {
                    TypeSyntax::Implicit
                } else {
                    TypeSyntax::named(text)
                }
            }
            "implicit_type" => TypeSyntax::Implicit,
            "predefined_type" => TypeSyntax::Predefined(self.text(node).to_string()),
            "generic_name" => {
                let args = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "type_argument_list")
                    .map(|list| {
                        named_children(list)
                            .into_iter()
                            .filter(|c| c.kind() != "comment")
                            .map(|c| self.type_syntax(c))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeSyntax::Named {
                    qualifier: Vec::new(),
                    name: self.simple_name(node),
                    args,
                }
            }
            "qualified_name" => {
                let mut qualifier = node
                    .child_by_field_name("qualifier")
                    .map(|q| self.name_segments(q))
                    .unwrap_or_default();
                match node.child_by_field_name("name").map(|n| self.type_syntax(n)) {
                    Some(TypeSyntax::Named { qualifier: inner_q, name, args }) => {
                        qualifier.extend(inner_q);
                        TypeSyntax::Named { qualifier, name, args }
                    }
                    _ => TypeSyntax::Other(self.text(node).to_string()),
                }
            }
            "alias_qualified_name" => node
                .child_by_field_name("name")
                .map(|n| self.type_syntax(n))
                .unwrap_or_else(|| TypeSyntax::Other(self.text(node).to_string())),
            "nullable_type" => {
                let inner = node
                    .child_by_field_name("type")
                    .or_else(|| named_children(node).into_iter().next());
                match inner {
                    Some(inner) => TypeSyntax::Nullable(Box::new(self.type_syntax(inner))),
                    None => TypeSyntax::Other(self.text(node).to_string()),
                }
            }
            "array_type" => {
                let inner = node
                    .child_by_field_name("type")
                    .or_else(|| named_children(node).into_iter().next());
                match inner {
                    Some(inner) => TypeSyntax::Array(Box::new(self.type_syntax(inner))),
                    None => TypeSyntax::Other(self.text(node).to_string()),
                }
            }
            "tuple_type" => TypeSyntax::Tuple(
                named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "tuple_element")
                    .filter_map(|el| {
                        el.child_by_field_name("type")
                            .or_else(|| named_children(el).into_iter().next())
                    })
                    .map(|t| self.type_syntax(t))
                    .collect(),
            ),
            "ref_type" | "scoped_type" => node
                .child_by_field_name("type")
                .or_else(|| named_children(node).into_iter().last())
                .map(|t| self.type_syntax(t))
                .unwrap_or_else(|| TypeSyntax::Other(self.text(node).to_string())),
            _ => TypeSyntax::Other(self.text(node).to_string()),
        }
    }

    fn name_segments(&self, node: Node<'_>) -> Vec<String> {
        match node.kind() {
            "qualified_name" => {
                let mut out = node
                    .child_by_field_name("qualifier")
                    .map(|q| self.name_segments(q))
                    .unwrap_or_default();
                if let Some(n) = node.child_by_field_name("name") {
                    out.extend(self.name_segments(n));
                }
                out
            }
            "alias_qualified_name" => node
                .child_by_field_name("name")
                .map(|n| self.name_segments(n))
                .unwrap_or_default(),
            _ => vec![self.simple_name(node)],
        }
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    fn attrs_and_modifiers(&self, node: Node<'_>) -> (Vec<Attribute>, Vec<String>) {
        let mut attrs = Vec::new();
        let mut mods = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "attribute_list" => {
                    for a in named_children(child) {
                        if a.kind() != "attribute" {
                            continue;
                        }
                        let name = a
                            .child_by_field_name("name")
                            .map(|n| self.name_text(n))
                            .unwrap_or_default();
                        attrs.push(Attribute { name, span: span(a) });
                    }
                }
                "modifier" | "parameter_modifier" => mods.push(self.text(child).to_string()),
                _ => {}
            }
        }
        (attrs, mods)
    }

    fn type_params(&self, node: Node<'_>) -> Vec<String> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "type_parameter_list")
            .flat_map(named_children)
            .filter(|p| p.kind() == "type_parameter")
            .filter_map(|p| {
                p.child_by_field_name("name")
                    .or_else(|| named_children(p).into_iter().find(|c| c.kind() == "identifier"))
            })
            .map(|n| self.text(n).to_string())
            .collect()
    }

    fn parameters(&mut self, list: Node<'_>) -> Vec<Parameter> {
        let mut out = Vec::new();
        for p in named_children(list) {
            if p.kind() != "parameter" {
                continue;
            }
            let (attributes, mut modifiers) = self.attrs_and_modifiers(p);
            let mut cursor = p.walk();
            for tok in p.children(&mut cursor) {
                if !tok.is_named() && matches!(tok.kind(), "this" | "ref" | "out" | "in" | "params") {
                    modifiers.push(tok.kind().to_string());
                }
            }
            let name_node = p.child_by_field_name("name");
            let type_node = p.child_by_field_name("type");
            let default = named_children(p)
                .into_iter()
                .find(|c| {
                    Some(c.id()) != name_node.map(|n| n.id())
                        && Some(c.id()) != type_node.map(|n| n.id())
                        && !matches!(c.kind(), "attribute_list" | "modifier" | "parameter_modifier" | "comment")
                })
                .map(|c| {
                    if c.kind() == "equals_value_clause" {
                        self.first_expr(c)
                    } else {
                        self.expr(c)
                    }
                });
            out.push(Parameter {
                name: name_node.map(|n| self.text(n).to_string()).unwrap_or_default(),
                name_span: name_node.map(span).unwrap_or_else(|| span(p)),
                ty: type_node.map(|t| self.type_syntax(t)),
                attributes,
                modifiers,
                default,
                span: span(p),
            });
        }
        out
    }

    fn type_decl(&mut self, node: Node<'_>, ns: &str, containing: &[String]) -> TypeDecl {
        let kind = match node.kind() {
            "record_declaration" if has_token(node, "struct") => TypeKind::RecordStruct,
            "record_declaration" => TypeKind::Record,
            "record_struct_declaration" => TypeKind::RecordStruct,
            "struct_declaration" => TypeKind::Struct,
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            _ => TypeKind::Class,
        };
        let (attributes, modifiers) = self.attrs_and_modifiers(node);
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.text(n).to_string()).unwrap_or_default();

        let mut decl = TypeDecl {
            kind,
            name,
            name_span: name_node.map(span).unwrap_or_else(|| span(node)),
            span: span(node),
            namespace: ns.to_string(),
            containing: containing.to_vec(),
            modifiers,
            attributes,
            type_params: self.type_params(node),
            bases: Vec::new(),
            primary_params: Vec::new(),
            base_args: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
        };

        let mut inner_containing = containing.to_vec();
        inner_containing.push(decl.name.clone());

        for child in named_children(node) {
            match child.kind() {
                "parameter_list" => decl.primary_params = self.parameters(child),
                "base_list" | "record_base" => self.base_list(child, &mut decl),
                "declaration_list" => {
                    self.members(child, &mut decl, ns, &inner_containing);
                }
                _ => {}
            }
        }
        decl
    }

    fn base_list(&mut self, node: Node<'_>, decl: &mut TypeDecl) {
        for child in named_children(node) {
            match child.kind() {
                "comment" => {}
                "primary_constructor_base_type" => {
                    let ty_node = child
                        .child_by_field_name("type")
                        .or_else(|| named_children(child).into_iter().next());
                    if let Some(t) = ty_node {
                        decl.bases.push(BaseEntry {
                            ty: self.type_syntax(t),
                            text: self.text(t).to_string(),
                            span: span(t),
                        });
                    }
                    if let Some(args) = named_children(child)
                        .into_iter()
                        .find(|c| c.kind() == "argument_list")
                    {
                        decl.base_args = self.arguments(args);
                    }
                }
                "argument_list" => decl.base_args = self.arguments(child),
                _ => decl.bases.push(BaseEntry {
                    ty: self.type_syntax(child),
                    text: self.text(child).to_string(),
                    span: span(child),
                }),
            }
        }
    }

    fn members(&mut self, list: Node<'_>, decl: &mut TypeDecl, ns: &str, containing: &[String]) {
        for child in items(list) {
            let kind = child.kind();
            match kind {
                "field_declaration" => {
                    let (attributes, modifiers) = self.attrs_and_modifiers(child);
                    if let Some(vd) = named_children(child)
                        .into_iter()
                        .find(|c| c.kind() == "variable_declaration")
                    {
                        for var in self.variable_declaration(vd) {
                            decl.members.push(Member::Field(FieldDecl {
                                name: var.name,
                                name_span: var.span,
                                ty: var.ty,
                                modifiers: modifiers.clone(),
                                attributes: attributes.clone(),
                                initializer: var.init,
                                span: span(child),
                            }));
                        }
                    }
                }
                "property_declaration" => {
                    decl.members.push(Member::Property(self.property(child)));
                }
                "method_declaration" => {
                    decl.members.push(Member::Method(self.method(child)));
                }
                "constructor_declaration" => {
                    decl.members.push(Member::Constructor(self.constructor(child)));
                }
                k if is_type_decl_kind(k) => {
                    decl.nested.push(self.type_decl(child, ns, containing));
                }
                "delegate_declaration" | "event_field_declaration" => {}
                _ => {
                    let body = self.member_bodies(child);
                    if !body.is_empty() {
                        decl.members.push(Member::Other { body, span: span(child) });
                    }
                }
            }
        }
    }

    fn property(&mut self, node: Node<'_>) -> PropertyDecl {
        let (attributes, modifiers) = self.attrs_and_modifiers(node);
        let name_node = node.child_by_field_name("name");
        let ty = node
            .child_by_field_name("type")
            .map(|t| self.type_syntax(t))
            .unwrap_or(TypeSyntax::Other(String::new()));

        let mut body = Vec::new();
        let mut initializer = None;
        if let Some(accessors) = node
            .child_by_field_name("accessors")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "accessor_list"))
        {
            for acc in named_children(accessors) {
                if acc.kind() == "accessor_declaration" {
                    body.extend(self.member_bodies(acc));
                }
            }
        }
        if let Some(value) = node.child_by_field_name("value") {
            if value.kind() == "arrow_expression_clause" {
                body.push(Stmt::Expr(self.first_expr(value)));
            } else {
                initializer = Some(self.expr(value));
            }
        } else {
            for c in named_children(node) {
                match c.kind() {
                    "arrow_expression_clause" => body.push(Stmt::Expr(self.first_expr(c))),
                    "equals_value_clause" => initializer = Some(self.first_expr(c)),
                    _ => {}
                }
            }
        }

        PropertyDecl {
            name: name_node.map(|n| self.text(n).to_string()).unwrap_or_default(),
            name_span: name_node.map(span).unwrap_or_else(|| span(node)),
            ty,
            modifiers,
            attributes,
            body,
            initializer,
            span: span(node),
        }
    }

    fn method(&mut self, node: Node<'_>) -> MethodDecl {
        let (attributes, modifiers) = self.attrs_and_modifiers(node);
        let name_node = node.child_by_field_name("name");
        let return_type = node
            .child_by_field_name("returns")
            .or_else(|| node.child_by_field_name("type"))
            .map(|t| self.type_syntax(t))
            .unwrap_or(TypeSyntax::Predefined("void".to_string()));
        let params = node
            .child_by_field_name("parameters")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "parameter_list"))
            .map(|p| self.parameters(p))
            .unwrap_or_default();
        MethodDecl {
            name: name_node.map(|n| self.text(n).to_string()).unwrap_or_default(),
            name_span: name_node.map(span).unwrap_or_else(|| span(node)),
            return_type,
            modifiers,
            attributes,
            type_params: self.type_params(node),
            params,
            body: self.member_bodies(node),
            span: span(node),
        }
    }

    fn constructor(&mut self, node: Node<'_>) -> ConstructorDecl {
        let (_, modifiers) = self.attrs_and_modifiers(node);
        let params = node
            .child_by_field_name("parameters")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "parameter_list"))
            .map(|p| self.parameters(p))
            .unwrap_or_default();
        let initializer_args = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "constructor_initializer")
            .and_then(|ci| named_children(ci).into_iter().find(|c| c.kind() == "argument_list"))
            .map(|args| self.arguments(args))
            .unwrap_or_default();
        ConstructorDecl {
            modifiers,
            params,
            initializer_args,
            body: self.member_bodies(node),
            span: span(node),
        }
    }

    /// Block and expression bodies directly under a member node.
    fn member_bodies(&mut self, node: Node<'_>) -> Vec<Stmt> {
        let mut out = Vec::new();
        for c in named_children(node) {
            match c.kind() {
                "block" => out.push(Stmt::Block(self.block_items(c))),
                "arrow_expression_clause" => out.push(Stmt::Expr(self.first_expr(c))),
                "accessor_list" => {
                    for acc in named_children(c) {
                        if acc.kind() == "accessor_declaration" {
                            out.extend(self.member_bodies(acc));
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn block_items(&mut self, block: Node<'_>) -> Vec<Stmt> {
        items(block).into_iter().filter_map(|s| self.stmt(s)).collect()
    }

    fn variable_declaration(&mut self, node: Node<'_>) -> Vec<LocalVar> {
        let ty = node
            .child_by_field_name("type")
            .map(|t| self.type_syntax(t))
            .unwrap_or(TypeSyntax::Implicit);
        let mut out = Vec::new();
        for d in named_children(node) {
            if d.kind() != "variable_declarator" {
                continue;
            }
            let name_node = d
                .child_by_field_name("name")
                .or_else(|| named_children(d).into_iter().find(|c| c.kind() == "identifier"));
            let init = named_children(d)
                .into_iter()
                .find(|c| {
                    Some(c.id()) != name_node.map(|n| n.id())
                        && !matches!(c.kind(), "bracketed_argument_list" | "tuple_pattern" | "comment")
                })
                .map(|c| {
                    if c.kind() == "equals_value_clause" {
                        self.first_expr(c)
                    } else {
                        self.expr(c)
                    }
                });
            out.push(LocalVar {
                name: name_node.map(|n| self.text(n).to_string()).unwrap_or_default(),
                ty: ty.clone(),
                init,
                span: name_node.map(span).unwrap_or_else(|| span(d)),
            });
        }
        out
    }

    fn stmt(&mut self, node: Node<'_>) -> Option<Stmt> {
        let stmt = match node.kind() {
            "comment" => return None,
            "block" => Stmt::Block(self.block_items(node)),
            "expression_statement" => {
                let e = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() != "comment")?;
                Stmt::Expr(self.expr(e))
            }
            "local_declaration_statement" => {
                let vd = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "variable_declaration")?;
                Stmt::Local(self.variable_declaration(vd))
            }
            "return_statement" => {
                let value = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() != "comment")
                    .map(|e| self.expr(e));
                Stmt::Return(value, span(node))
            }
            "if_statement" => {
                let cond = node
                    .child_by_field_name("condition")
                    .map(|c| self.expr(c))
                    .unwrap_or_else(|| Expr::new(ExprKind::Other(Vec::new()), span(node)));
                let then = node
                    .child_by_field_name("consequence")
                    .and_then(|c| self.stmt(c))
                    .unwrap_or(Stmt::Block(Vec::new()));
                let els = node
                    .child_by_field_name("alternative")
                    .and_then(|c| self.stmt(c))
                    .map(Box::new);
                Stmt::If { cond, then: Box::new(then), els }
            }
            "switch_statement" => self.switch_statement(node),
            "foreach_statement" => {
                let var_ty = node
                    .child_by_field_name("type")
                    .map(|t| self.type_syntax(t))
                    .unwrap_or(TypeSyntax::Implicit);
                let var_name = node
                    .child_by_field_name("left")
                    .filter(|l| l.kind() == "identifier")
                    .map(|l| self.text(l).to_string());
                let iter = node
                    .child_by_field_name("right")
                    .map(|r| self.expr(r))
                    .unwrap_or_else(|| Expr::new(ExprKind::Other(Vec::new()), span(node)));
                let body = node
                    .child_by_field_name("body")
                    .and_then(|b| self.stmt(b))
                    .unwrap_or(Stmt::Block(Vec::new()));
                Stmt::Foreach { var_ty, var_name, iter, body: Box::new(body) }
            }
            "local_function_statement" => Stmt::LocalFunction(Box::new(self.method(node))),
            _ => self.other_stmt(node),
        };
        Some(stmt)
    }

    fn other_stmt(&mut self, node: Node<'_>) -> Stmt {
        let mut stmts = Vec::new();
        let mut exprs = Vec::new();
        for c in items(node) {
            let kind = c.kind();
            match kind {
                "variable_declaration" => stmts.push(Stmt::Local(self.variable_declaration(c))),
                "catch_clause" | "finally_clause" => stmts.push(self.other_stmt(c)),
                "catch_declaration" | "catch_filter_clause" => {
                    stmts.push(self.other_stmt(c));
                }
                "identifier" if node.kind() == "catch_declaration" => {}
                k if is_statement_kind(k) => {
                    if let Some(s) = self.stmt(c) {
                        stmts.push(s);
                    }
                }
                k if k.ends_with("_type") || k == "predefined_type" => {}
                _ => exprs.push(self.expr(c)),
            }
        }
        Stmt::Other { stmts, exprs }
    }

    fn switch_statement(&mut self, node: Node<'_>) -> Stmt {
        let body = node
            .child_by_field_name("body")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "switch_body"));
        let value_node = node.child_by_field_name("value").or_else(|| {
            named_children(node)
                .into_iter()
                .find(|c| c.kind() != "switch_body" && c.kind() != "comment")
        });
        let value = value_node
            .map(|v| self.expr(v))
            .unwrap_or_else(|| Expr::new(ExprKind::Other(Vec::new()), span(node)));

        let mut sections = Vec::new();
        if let Some(body) = body {
            for sec in items(body) {
                if sec.kind() != "switch_section" {
                    continue;
                }
                let mut labels = Vec::new();
                let mut stmts = Vec::new();
                for c in items(sec) {
                    let kind = c.kind();
                    if kind.ends_with("_label") {
                        for l in named_children(c) {
                            labels.push(self.expr(l));
                        }
                    } else if is_statement_kind(kind) {
                        if let Some(s) = self.stmt(c) {
                            stmts.push(s);
                        }
                    } else {
                        labels.push(self.expr(c));
                    }
                }
                sections.push(SwitchSection { labels, body: stmts });
            }
        }
        Stmt::Switch { value, sections, span: span(node) }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn first_expr(&mut self, node: Node<'_>) -> Expr {
        match named_children(node).into_iter().find(|c| c.kind() != "comment") {
            Some(c) => self.expr(c),
            None => Expr::new(ExprKind::Other(Vec::new()), span(node)),
        }
    }

    fn arguments(&mut self, list: Node<'_>) -> Vec<Argument> {
        let mut out = Vec::new();
        for arg in named_children(list) {
            if arg.kind() != "argument" {
                continue;
            }
            let name_node = arg.child_by_field_name("name");
            let name_colon = named_children(arg)
                .into_iter()
                .find(|c| c.kind() == "name_colon");
            let name = match (name_node, name_colon) {
                (Some(n), _) => Some(self.text(n).to_string()),
                (None, Some(nc)) => named_children(nc)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                    .map(|c| self.text(c).to_string()),
                (None, None) => None,
            };
            let value = named_children(arg).into_iter().rev().find(|c| {
                Some(c.id()) != name_node.map(|n| n.id())
                    && Some(c.id()) != name_colon.map(|n| n.id())
                    && c.kind() != "comment"
            });
            let expr = match value {
                Some(v) => self.expr(v),
                None => Expr::new(ExprKind::Other(Vec::new()), span(arg)),
            };
            out.push(Argument { name, expr, span: span(arg) });
        }
        out
    }

    fn other_expr(&mut self, node: Node<'_>) -> ExprKind {
        let children = named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .map(|c| self.expr(c))
            .collect();
        ExprKind::Other(children)
    }

    fn boxed(&mut self, node: Option<Node<'_>>, parent: Node<'_>) -> Box<Expr> {
        Box::new(match node {
            Some(n) => self.expr(n),
            None => Expr::new(ExprKind::Other(Vec::new()), span(parent)),
        })
    }

    fn expr(&mut self, node: Node<'_>) -> Expr {
        if self.depth >= MAX_EXPR_DEPTH {
            return Expr::new(ExprKind::Other(Vec::new()), span(node));
        }
        self.depth += 1;
        let e = self.expr_inner(node);
        self.depth -= 1;
        e
    }

    fn expr_inner(&mut self, node: Node<'_>) -> Expr {
        let sp = span(node);
        let kind = match node.kind() {
            "identifier" | "implicit_parameter" | "discard" => {
                ExprKind::Identifier(self.text(node).to_string())
            }
            "this_expression" | "this" => ExprKind::This,
            "base_expression" | "base" => ExprKind::Identifier("base".to_string()),
            "predefined_type" => ExprKind::Identifier(self.text(node).to_string()),
            "generic_name" => ExprKind::Identifier(self.simple_name(node)),
            "alias_qualified_name" => ExprKind::Identifier(self.simple_name(node)),
            "qualified_name" => {
                let target = self.boxed(node.child_by_field_name("qualifier"), node);
                let name_node = node.child_by_field_name("name");
                ExprKind::MemberAccess {
                    target,
                    name: name_node.map(|n| self.simple_name(n)).unwrap_or_default(),
                    name_span: name_node.map(span).unwrap_or(sp),
                    conditional: false,
                }
            }
            "member_access_expression" => {
                let target_node = node
                    .child_by_field_name("expression")
                    .or_else(|| named_children(node).into_iter().next());
                let target = self.boxed(target_node, node);
                let name_node = node.child_by_field_name("name");
                ExprKind::MemberAccess {
                    target,
                    name: name_node.map(|n| self.simple_name(n)).unwrap_or_default(),
                    name_span: name_node.map(span).unwrap_or(sp),
                    conditional: false,
                }
            }
            "member_binding_expression" => {
                let name_node = node
                    .child_by_field_name("name")
                    .or_else(|| named_children(node).into_iter().last());
                let target = self
                    .binding
                    .take()
                    .unwrap_or_else(|| Expr::new(ExprKind::Other(Vec::new()), sp));
                let full = target.span.cover(sp);
                return Expr::new(
                    ExprKind::MemberAccess {
                        target: Box::new(target),
                        name: name_node.map(|n| self.simple_name(n)).unwrap_or_default(),
                        name_span: name_node.map(span).unwrap_or(sp),
                        conditional: true,
                    },
                    full,
                );
            }
            "element_binding_expression" => {
                let target = self
                    .binding
                    .take()
                    .unwrap_or_else(|| Expr::new(ExprKind::Other(Vec::new()), sp));
                let args = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "bracketed_argument_list")
                    .map(|l| self.arguments(l))
                    .unwrap_or_default();
                let full = target.span.cover(sp);
                return Expr::new(ExprKind::ElementAccess { target: Box::new(target), args }, full);
            }
            "conditional_access_expression" => {
                let children = named_children(node);
                let cond_node = node
                    .child_by_field_name("condition")
                    .or_else(|| children.first().copied());
                let rest_node = children
                    .iter()
                    .rev()
                    .find(|c| Some(c.id()) != cond_node.map(|n| n.id()))
                    .copied();
                let target = match cond_node {
                    Some(c) => self.expr(c),
                    None => Expr::new(ExprKind::Other(Vec::new()), sp),
                };
                let saved = self.binding.replace(target);
                let lowered = match rest_node {
                    Some(r) => self.expr(r),
                    None => self
                        .binding
                        .take()
                        .unwrap_or_else(|| Expr::new(ExprKind::Other(Vec::new()), sp)),
                };
                self.binding = saved;
                return Expr::new(lowered.kind, sp);
            }
            "invocation_expression" => {
                let callee_node = node
                    .child_by_field_name("function")
                    .or_else(|| named_children(node).into_iter().next());
                let callee = self.boxed(callee_node, node);
                let args = node
                    .child_by_field_name("arguments")
                    .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "argument_list"))
                    .map(|a| self.arguments(a))
                    .unwrap_or_default();
                ExprKind::Invocation { callee, args }
            }
            "binary_expression" => {
                let left_node = node.child_by_field_name("left");
                let right_node = node.child_by_field_name("right");
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o).to_string())
                    .or_else(|| self.between(left_node, right_node))
                    .unwrap_or_default();
                let left = self.boxed(left_node, node);
                let right = self.boxed(right_node, node);
                ExprKind::Binary { op, left, right }
            }
            "conditional_expression" => ExprKind::Conditional {
                cond: self.boxed(node.child_by_field_name("condition"), node),
                when_true: self.boxed(node.child_by_field_name("consequence"), node),
                when_false: self.boxed(node.child_by_field_name("alternative"), node),
            },
            "assignment_expression" => {
                let left_node = node.child_by_field_name("left");
                let right_node = node.child_by_field_name("right");
                let op = self.between(left_node, right_node).unwrap_or_else(|| "=".to_string());
                ExprKind::Assignment {
                    op,
                    left: self.boxed(left_node, node),
                    right: self.boxed(right_node, node),
                }
            }
            "parenthesized_expression" => {
                let inner = named_children(node).into_iter().find(|c| c.kind() != "comment");
                ExprKind::Parenthesized(self.boxed(inner, node))
            }
            "lambda_expression" | "anonymous_method_expression" => self.lambda(node),
            "object_creation_expression" => {
                let ty = node.child_by_field_name("type").map(|t| self.type_syntax(t));
                let args = node
                    .child_by_field_name("arguments")
                    .map(|a| self.arguments(a))
                    .unwrap_or_default();
                let initializer = node
                    .child_by_field_name("initializer")
                    .map(|i| self.initializer_items(i));
                ExprKind::ObjectCreation { ty, args, initializer }
            }
            "implicit_object_creation_expression" => {
                let mut args = Vec::new();
                let mut initializer = None;
                for c in named_children(node) {
                    match c.kind() {
                        "argument_list" => args = self.arguments(c),
                        "initializer_expression" => initializer = Some(self.initializer_items(c)),
                        _ => {}
                    }
                }
                ExprKind::ObjectCreation { ty: None, args, initializer }
            }
            "anonymous_object_creation_expression" => {
                let members = named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() != "comment")
                    .map(|c| self.expr(c))
                    .collect();
                ExprKind::ObjectCreation { ty: None, args: Vec::new(), initializer: Some(members) }
            }
            "initializer_expression" | "collection_expression" => {
                ExprKind::Collection(self.initializer_items(node))
            }
            "array_creation_expression"
            | "implicit_array_creation_expression"
            | "stackalloc_expression"
            | "implicit_stackalloc_expression" => {
                let mut elems = Vec::new();
                for c in named_children(node) {
                    if c.kind() == "initializer_expression" {
                        elems.extend(self.initializer_items(c));
                    }
                }
                ExprKind::Collection(elems)
            }
            "with_expression" => {
                let children = named_children(node);
                let target = self.boxed(children.first().copied(), node);
                let mut assignments = Vec::new();
                for c in children.iter().skip(1) {
                    self.with_assignments(*c, &mut assignments);
                }
                ExprKind::With { target, assignments }
            }
            "switch_expression" => {
                let children = named_children(node);
                let governing = self.boxed(
                    node.child_by_field_name("value").or_else(|| children.first().copied()),
                    node,
                );
                let arms = children
                    .iter()
                    .filter(|c| c.kind() == "switch_expression_arm")
                    .map(|arm| self.switch_arm(*arm))
                    .collect();
                ExprKind::Switch { governing, arms }
            }
            "string_literal" | "verbatim_string_literal" | "raw_string_literal" => {
                ExprKind::Literal(Literal::String(self.text(node).to_string()))
            }
            "interpolated_string_expression" | "interpolated_verbatim_string_expression" => {
                let mut parts = Vec::new();
                self.interpolations(node, &mut parts);
                ExprKind::Interpolated(parts)
            }
            "null_literal" => ExprKind::Literal(Literal::Null),
            "boolean_literal" => ExprKind::Literal(Literal::Bool(self.text(node) == "true")),
            "integer_literal" | "real_literal" => {
                ExprKind::Literal(Literal::Number(self.text(node).to_string()))
            }
            "character_literal" => ExprKind::Literal(Literal::Char(self.text(node).to_string())),
            "default_expression" | "default_literal_expression" => ExprKind::Literal(Literal::Default),
            "element_access_expression" => {
                let target = self.boxed(
                    node.child_by_field_name("expression")
                        .or_else(|| named_children(node).into_iter().next()),
                    node,
                );
                let args = node
                    .child_by_field_name("subscript")
                    .or_else(|| {
                        named_children(node)
                            .into_iter()
                            .find(|c| c.kind() == "bracketed_argument_list")
                    })
                    .map(|l| self.arguments(l))
                    .unwrap_or_default();
                ExprKind::ElementAccess { target, args }
            }
            "cast_expression" => {
                let ty = node
                    .child_by_field_name("type")
                    .map(|t| self.type_syntax(t))
                    .unwrap_or(TypeSyntax::Other(String::new()));
                let expr = self.boxed(node.child_by_field_name("value"), node);
                ExprKind::Cast { ty, expr }
            }
            "as_expression" => {
                let ty = node
                    .child_by_field_name("right")
                    .map(|t| self.type_syntax(t))
                    .unwrap_or(TypeSyntax::Other(String::new()));
                let expr = self.boxed(node.child_by_field_name("left"), node);
                ExprKind::Cast { ty, expr }
            }
            "prefix_unary_expression" | "postfix_unary_expression" => {
                let operand_node = named_children(node).into_iter().find(|c| c.kind() != "comment");
                let op = {
                    let mut cursor = node.walk();
                    let tokens: Vec<&str> = node
                        .children(&mut cursor)
                        .filter(|c| !c.is_named())
                        .map(|c| c.kind())
                        .collect();
                    tokens.join("")
                };
                ExprKind::Unary { op, operand: self.boxed(operand_node, node) }
            }
            "await_expression" => {
                let operand_node = named_children(node).into_iter().find(|c| c.kind() != "comment");
                ExprKind::Unary { op: "await".to_string(), operand: self.boxed(operand_node, node) }
            }
            "argument" => {
                let inner = named_children(node).into_iter().last();
                return match inner {
                    Some(i) => self.expr(i),
                    None => Expr::new(ExprKind::Other(Vec::new()), sp),
                };
            }
            _ => self.other_expr(node),
        };
        Expr::new(kind, sp)
    }

    /// Operator text between two sibling nodes.
    fn between(&self, left: Option<Node<'_>>, right: Option<Node<'_>>) -> Option<String> {
        let (l, r) = (left?, right?);
        let text = std::str::from_utf8(self.src.get(l.end_byte()..r.start_byte())?).ok()?;
        Some(text.trim().to_string())
    }

    fn initializer_items(&mut self, node: Node<'_>) -> Vec<Expr> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .map(|c| self.expr(c))
            .collect()
    }

    fn with_assignments(&mut self, node: Node<'_>, out: &mut Vec<Expr>) {
        match node.kind() {
            "with_initializer" => {
                let children: Vec<Node<'_>> = named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() != "comment")
                    .collect();
                if let (Some(name), Some(value)) = (children.first(), children.last()) {
                    if name.id() != value.id() {
                        let left = self.expr(*name);
                        let right = self.expr(*value);
                        out.push(Expr::new(
                            ExprKind::Assignment {
                                op: "=".to_string(),
                                left: Box::new(left),
                                right: Box::new(right),
                            },
                            span(node),
                        ));
                    }
                }
            }
            "assignment_expression" | "simple_assignment_expression" => {
                let e = self.expr(node);
                if matches!(e.kind, ExprKind::Assignment { .. }) {
                    out.push(e);
                } else if let (Some(l), Some(r)) = (
                    node.child_by_field_name("left").or_else(|| named_children(node).into_iter().next()),
                    node.child_by_field_name("right").or_else(|| named_children(node).into_iter().last()),
                ) {
                    let left = self.expr(l);
                    let right = self.expr(r);
                    out.push(Expr::new(
                        ExprKind::Assignment {
                            op: "=".to_string(),
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        span(node),
                    ));
                }
            }
            "comment" => {}
            _ => {
                for c in named_children(node) {
                    self.with_assignments(c, out);
                }
            }
        }
    }

    fn switch_arm(&mut self, arm: Node<'_>) -> SwitchArm {
        let children: Vec<Node<'_>> = named_children(arm)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .collect();
        let value_node = arm.child_by_field_name("value").or_else(|| children.last().copied());
        let pattern = children
            .iter()
            .filter(|c| Some(c.id()) != value_node.map(|v| v.id()))
            .map(|c| self.expr(*c))
            .collect();
        let value = match value_node {
            Some(v) => self.expr(v),
            None => Expr::new(ExprKind::Other(Vec::new()), span(arm)),
        };
        SwitchArm { pattern, value }
    }

    fn interpolations(&mut self, node: Node<'_>, out: &mut Vec<Expr>) {
        for c in named_children(node) {
            match c.kind() {
                "interpolation" => {
                    if let Some(e) = named_children(c)
                        .into_iter()
                        .find(|x| !x.kind().starts_with("interpolation_") && x.kind() != "comment")
                    {
                        out.push(self.expr(e));
                    }
                }
                k if k.starts_with("interpolated_") => self.interpolations(c, out),
                _ => {}
            }
        }
    }

    fn lambda(&mut self, node: Node<'_>) -> ExprKind {
        let mut params = Vec::new();
        let params_node = node.child_by_field_name("parameters").or_else(|| {
            named_children(node)
                .into_iter()
                .find(|c| matches!(c.kind(), "parameter_list" | "implicit_parameter"))
        });
        if let Some(p) = params_node {
            match p.kind() {
                "parameter_list" => {
                    for param in self.parameters(p) {
                        params.push(LambdaParam { name: param.name, ty: param.ty });
                    }
                }
                _ => params.push(LambdaParam { name: self.text(p).to_string(), ty: None }),
            }
        }
        let body_node = node
            .child_by_field_name("body")
            .or_else(|| named_children(node).into_iter().last());
        let body = match body_node {
            Some(b) if b.kind() == "block" => LambdaBody::Block(self.block_items(b)),
            Some(b) => LambdaBody::Expr(Box::new(self.expr(b))),
            None => LambdaBody::Block(Vec::new()),
        };
        ExprKind::Lambda { params, body }
    }
}
