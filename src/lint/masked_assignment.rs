//! DSM001: Ssn assignments on response DTOs must be masked.
//!
//! Covers `dto.Ssn = v`, object initializers, named constructor arguments and
//! `with` expressions. The value is accepted when it passes through
//! `MaskSsn`, is `null`, or is a literal that is already masked. Code inside
//! the response contracts themselves (example factories) is exempt.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::{Expr, ExprKind, Literal, Span};
use crate::csharp::TypeRef;

const MASK_METHOD: &str = "MaskSsn";

pub struct MaskedAssignmentRule;

impl MaskedAssignmentRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaskedAssignmentRule {
    fn default() -> Self {
        Self::new()
    }
}

fn is_ssn(name: &str) -> bool {
    name.eq_ignore_ascii_case("Ssn")
}

/// Whether an assigned value is acceptable for a response Ssn.
fn is_masked_value(value: &Expr) -> bool {
    let inner = value.unparenthesized();
    if inner.is_null_literal() {
        return true;
    }
    if let ExprKind::Literal(Literal::String(raw)) = &inner.kind {
        if raw.contains(|c| matches!(c, '*' | 'X' | 'x')) {
            return true;
        }
    }
    value.any(&mut |e| e.invoked_name() == Some(MASK_METHOD))
}

/// `Ssn = v` entries of an object initializer or `with` expression.
fn ssn_entries(entries: &[Expr]) -> impl Iterator<Item = (&Expr, Span)> {
    entries.iter().filter_map(|entry| match &entry.kind {
        ExprKind::Assignment { left, right, .. } => match &left.kind {
            ExprKind::Identifier(name) if is_ssn(name) => Some((right.as_ref(), entry.span)),
            _ => None,
        },
        _ => None,
    })
}

impl MaskedAssignmentRule {
    /// Unmasked `(value span)` sites for one node, with the target type.
    fn sites<'n>(&self, expr: &'n Expr, ctx: &RuleContext<'_>) -> Option<(TypeRef, Vec<Span>)> {
        let mut spans = Vec::new();
        let target = match &expr.kind {
            ExprKind::Assignment { op, left, right } if op == "=" => {
                let ExprKind::MemberAccess { target, name, .. } = &left.unparenthesized().kind else {
                    return None;
                };
                if !is_ssn(name) || is_masked_value(right) {
                    return None;
                }
                spans.push(expr.span);
                ctx.type_of(target)?
            }
            ExprKind::ObjectCreation { ty: Some(ty), args, initializer } => {
                for arg in args {
                    if arg.name.as_deref().is_some_and(is_ssn) && !is_masked_value(&arg.expr) {
                        spans.push(arg.span);
                    }
                }
                if let Some(entries) = initializer {
                    for (value, span) in ssn_entries(entries) {
                        if !is_masked_value(value) {
                            spans.push(span);
                        }
                    }
                }
                if spans.is_empty() {
                    return None;
                }
                ctx.binder.resolve(ty)?
            }
            ExprKind::With { target, assignments } => {
                for (value, span) in ssn_entries(assignments) {
                    if !is_masked_value(value) {
                        spans.push(span);
                    }
                }
                if spans.is_empty() {
                    return None;
                }
                ctx.type_of(target)?
            }
            _ => return None,
        };
        Some((target.unwrap_nullable().clone(), spans))
    }
}

impl Rule for MaskedAssignmentRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM001]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Assignment, NodeKind::ObjectCreation, NodeKind::WithExpression]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Expr(expr) = node else {
            return Vec::new();
        };
        if ctx.inside_response_contract() {
            return Vec::new();
        }
        let Some((target, spans)) = self.sites(expr, ctx) else {
            return Vec::new();
        };
        if !ctx.is_response_dto(&target) {
            return Vec::new();
        }
        let name = ctx.compilation.minimal_display(&target);
        spans
            .into_iter()
            .map(|span| ctx.diagnostic(RuleCode::DSM001, span, vec![name.clone()]))
            .collect()
    }
}
