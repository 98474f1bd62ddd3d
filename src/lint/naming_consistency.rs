//! DSM005 / DSM006: shared-interface naming on request and response shapes.
//!
//! Contract shapes that carry name, phone, email or city data are expected to
//! list the matching shared interface so that mapping and masking code can
//! treat them uniformly. The base-list check is purely syntactic.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::{TypeDecl, TypeKind};
use crate::lint_config::NameCategory;

const ROLE_SUFFIXES: &[&str] = &["Request", "Response"];

pub struct NamingConsistencyRule;

impl NamingConsistencyRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NamingConsistencyRule {
    fn default() -> Self {
        Self::new()
    }
}

fn in_scope(decl: &TypeDecl, ctx: &RuleContext<'_>) -> bool {
    matches!(decl.kind, TypeKind::Class | TypeKind::Record)
        && ROLE_SUFFIXES.iter().any(|s| decl.name.ends_with(s))
        && (ctx.analysis.is_request_namespace(&decl.namespace)
            || ctx.analysis.is_response_namespace(&decl.namespace))
}

/// Whether the written base list names `interface`.
fn lists_interface(decl: &TypeDecl, interface: &str) -> bool {
    decl.bases
        .iter()
        .any(|b| b.ty.simple_name() == interface || b.text == interface)
}

fn missing_interfaces(decl: &TypeDecl, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let props = decl.properties();
    ctx.analysis
        .name_categories
        .iter()
        .filter(|cat| props.iter().any(|p| cat.properties.iter().any(|s| s == p.name)))
        .filter(|cat| !lists_interface(decl, &cat.interface))
        .map(|cat| {
            ctx.diagnostic(
                RuleCode::DSM005,
                decl.name_span,
                vec![decl.name.clone(), cat.name.clone(), cat.interface.clone()],
            )
        })
        .collect()
}

fn category_of<'c>(categories: &'c [NameCategory], property: &str) -> Option<&'c NameCategory> {
    categories.iter().find(|c| c.properties.iter().any(|p| p == property))
}

fn non_canonical_names(decl: &TypeDecl, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for prop in decl.properties() {
        let Some(canonical) = ctx.analysis.property_aliases.get(prop.name) else {
            continue;
        };
        let Some(category) = category_of(&ctx.analysis.name_categories, canonical) else {
            continue;
        };
        out.push(ctx.diagnostic(
            RuleCode::DSM006,
            prop.name_span,
            vec![
                prop.name.to_string(),
                decl.name.clone(),
                canonical.clone(),
                category.interface.clone(),
            ],
        ));
    }
    out
}

impl Rule for NamingConsistencyRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM005, RuleCode::DSM006]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::TypeDeclaration]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::TypeDeclaration(decl) = node else {
            return Vec::new();
        };
        if !in_scope(decl, ctx) {
            return Vec::new();
        }
        let mut out = missing_interfaces(decl, ctx);
        out.extend(non_canonical_names(decl, ctx));
        out
    }
}
