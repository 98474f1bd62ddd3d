//! DSM004: manual name concatenation fallback.
//!
//! Flags `FullName ?? $"{LastName}, {FirstName}"` and the equivalent
//! ternaries. `FullName` is computed once upstream; rebuilding it by hand at
//! call sites produces inconsistent formatting.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::{Expr, ExprKind};

const NAME_IDENTIFIERS: &[&str] = &["FirstName", "LastName", "MiddleName", "Name", "FullName"];

pub struct NameConcatenationRule;

impl NameConcatenationRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NameConcatenationRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of a bare identifier or a plain `a.b` access. An access anywhere
/// inside a `?.` chain (`a?.b`, `a?.b.c`) does not count.
fn referenced_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Identifier(n) => Some(n),
        ExprKind::MemberAccess { name, .. } if !in_conditional_chain(expr) => Some(name),
        _ => None,
    }
}

fn in_conditional_chain(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::MemberAccess { conditional: true, .. } => true,
        ExprKind::MemberAccess { target, .. } | ExprKind::ElementAccess { target, .. } => {
            in_conditional_chain(target)
        }
        ExprKind::Invocation { callee, .. } => in_conditional_chain(callee),
        _ => false,
    }
}

fn references_full_name(expr: &Expr) -> bool {
    referenced_name(expr).is_some_and(|n| n.eq_ignore_ascii_case("FullName"))
}

fn is_name_identifier(expr: &Expr) -> bool {
    referenced_name(expr).is_some_and(|n| NAME_IDENTIFIERS.iter().any(|id| id.eq_ignore_ascii_case(n)))
}

fn count_name_references(expr: &Expr) -> usize {
    match &expr.kind {
        ExprKind::Binary { op, left, right } if op == "+" => {
            count_name_references(left) + count_name_references(right)
        }
        ExprKind::Parenthesized(inner) => count_name_references(inner),
        _ if is_name_identifier(expr) => 1,
        _ => 0,
    }
}

/// Source text of the concatenation when `expr` rebuilds a name.
fn concatenation_pattern<'a>(expr: &Expr, ctx: &RuleContext<'a>) -> Option<&'a str> {
    match &expr.kind {
        ExprKind::Interpolated(parts) => {
            (parts.iter().filter(|p| is_name_identifier(p)).count() >= 2).then(|| ctx.text(expr.span))
        }
        ExprKind::Binary { op, .. } if op == "+" => {
            (count_name_references(expr) >= 2).then(|| ctx.text(expr.span))
        }
        ExprKind::Invocation { callee, args } => {
            let ExprKind::MemberAccess { target, name, .. } = &callee.kind else {
                return None;
            };
            if in_conditional_chain(callee) {
                return None;
            }
            match name.as_str() {
                "Format" => {
                    let names = args.iter().skip(1).filter(|a| is_name_identifier(&a.expr)).count();
                    (names >= 2).then(|| ctx.text(expr.span))
                }
                "Trim" => concatenation_pattern(target, ctx).map(|_| ctx.text(expr.span)),
                _ => None,
            }
        }
        ExprKind::Parenthesized(inner) => concatenation_pattern(inner, ctx),
        _ => None,
    }
}

impl Rule for NameConcatenationRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM004]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::BinaryExpression, NodeKind::ConditionalExpression]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Expr(expr) = node else {
            return Vec::new();
        };
        let pattern = match &expr.kind {
            ExprKind::Binary { op, left, right } if op == "??" => {
                if references_full_name(left) {
                    concatenation_pattern(right, ctx)
                } else {
                    None
                }
            }
            ExprKind::Conditional { when_true, when_false, .. } => {
                let forward = if references_full_name(when_true) {
                    concatenation_pattern(when_false, ctx)
                } else {
                    None
                };
                forward.or_else(|| {
                    if references_full_name(when_false) {
                        concatenation_pattern(when_true, ctx)
                    } else {
                        None
                    }
                })
            }
            _ => None,
        };

        match pattern {
            Some(text) => vec![ctx.diagnostic(RuleCode::DSM004, expr.span, vec![text.to_string()])],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::visit::run_rule;

    fn check(expr: &str) -> Vec<Diagnostic> {
        let src = format!("class C {{ object M(Person p, bool c) {{ return {expr}; }} }}");
        run_rule(Box::new(NameConcatenationRule::new()), &src)
    }

    #[test]
    fn coalesce_with_interpolation() {
        let diags = check(r#"p.FullName ?? $"{p.LastName}, {p.FirstName}""#);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args[0], r#"$"{p.LastName}, {p.FirstName}""#);
        assert!(diags[0].message.contains("without fallback to"));
    }

    #[test]
    fn coalesce_with_plus_chain_and_trim() {
        assert_eq!(check(r#"p.FullName ?? p.FirstName + " " + p.LastName"#).len(), 1);
        let diags = check(r#"p.FullName ?? (p.FirstName + " " + p.LastName).Trim()"#);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args[0], r#"(p.FirstName + " " + p.LastName).Trim()"#);
    }

    #[test]
    fn string_format_fallback() {
        assert_eq!(check(r#"p.FullName ?? string.Format("{0}, {1}", p.LastName, p.FirstName)"#).len(), 1);
        assert!(check(r#"p.FullName ?? string.Format("{0}", p.LastName)"#).is_empty());
    }

    #[test]
    fn ternary_either_branch() {
        assert_eq!(check(r#"c ? p.FullName : $"{p.FirstName} {p.LastName}""#).len(), 1);
        assert_eq!(check(r#"c ? $"{p.FirstName} {p.LastName}" : p.FullName"#).len(), 1);
    }

    #[test]
    fn single_name_or_other_fallbacks_do_not_fire() {
        assert!(check(r#"p.FullName ?? p.LastName"#).is_empty());
        assert!(check(r#"p.FullName ?? "Unknown""#).is_empty());
        assert!(check(r#"p.FullName ?? $"{p.Id}-{p.LastName}""#).is_empty());
        assert!(check(r#"p.Title ?? $"{p.FirstName} {p.LastName}""#).is_empty());
    }

    #[test]
    fn null_conditional_access_is_not_a_name_reference() {
        assert!(check(r#"p?.FullName ?? $"{p.LastName}, {p.FirstName}""#).is_empty());
        assert!(check(r#"p?.Person.FullName ?? $"{p.LastName}, {p.FirstName}""#).is_empty());
        assert!(check(r#"c ? p?.FullName : $"{p.FirstName} {p.LastName}""#).is_empty());
        assert!(check(r#"p.FullName ?? $"{p?.LastName}, {p?.FirstName}""#).is_empty());
        assert_eq!(check(r#"p.FullName ?? $"{p?.LastName}, {p.FirstName} {p.MiddleName}""#).len(), 1);
    }
}
