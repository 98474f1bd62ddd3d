//! DSM002 / DSM003: masking annotations on person-describing responses.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::{has_attribute, TypeDecl, TypeKind};
use crate::csharp::TypeRef;

pub struct MaskingAnnotationRule;

impl MaskingAnnotationRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaskingAnnotationRule {
    fn default() -> Self {
        Self::new()
    }
}

fn describes_person(decl: &TypeDecl, ctx: &RuleContext<'_>) -> bool {
    let lower = decl.name.to_lowercase();
    ctx.analysis
        .person_indicators
        .iter()
        .any(|p| lower.contains(&p.to_lowercase()))
}

fn listed(names: &[String], property: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(property))
}

/// Whether the type carries the masking attribute on any of its partial
/// declarations.
fn type_is_masked(decl: &TypeDecl, ctx: &RuleContext<'_>) -> bool {
    let mask = &ctx.analysis.mask_attribute;
    if has_attribute(&decl.attributes, mask) {
        return true;
    }
    match ctx.binder.this_type {
        Some(TypeRef::Source { id, .. }) => ctx.compilation.symbol(*id).has_attribute(mask),
        _ => false,
    }
}

impl Rule for MaskingAnnotationRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM002, RuleCode::DSM003]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::TypeDeclaration]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::TypeDeclaration(decl) = node else {
            return Vec::new();
        };
        if !matches!(decl.kind, TypeKind::Class | TypeKind::Record)
            || !ctx.analysis.is_response_namespace(&decl.namespace)
            || !describes_person(decl, ctx)
        {
            return Vec::new();
        }

        let analysis = ctx.analysis;
        let mask = &analysis.mask_attribute;
        let type_masked = type_is_masked(decl, ctx);
        let mut out = Vec::new();
        for prop in decl.properties() {
            let masked = has_attribute(prop.attributes, mask);
            let args = || vec![prop.name.to_string(), decl.name.clone(), mask.clone()];
            if listed(&analysis.badge_properties, prop.name) {
                if masked {
                    out.push(ctx.diagnostic(RuleCode::DSM003, prop.name_span, args()));
                }
            } else if listed(&analysis.sensitive_properties, prop.name) && !masked && !type_masked {
                out.push(ctx.diagnostic(RuleCode::DSM002, prop.name_span, args()));
            }
        }
        out
    }
}
