//! DSM010: business logic keyed on `CommentType.Name`.
//!
//! Comment type names are editable by users, so comparing, switching or
//! string-matching on them breaks silently when somebody renames a type.
//! The receiver is recognized by name only: any identifier or member in the
//! receiver chain containing `comment` (any case) qualifies.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::{Expr, ExprKind};

/// String methods that act as comparisons when called on the name.
const COMPARISON_METHODS: &[&str] = &["Contains", "StartsWith", "EndsWith", "Equals"];

pub struct DisplayNameLogicRule;

impl DisplayNameLogicRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DisplayNameLogicRule {
    fn default() -> Self {
        Self::new()
    }
}

/// `<chain mentioning comment>.Name`, plain or null-conditional.
fn is_comment_name_access(expr: &Expr) -> bool {
    match &expr.unparenthesized().kind {
        ExprKind::MemberAccess { target, name, .. } => name == "Name" && chain_mentions_comment(target),
        _ => false,
    }
}

fn chain_mentions_comment(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Identifier(name) => mentions_comment(name),
        ExprKind::MemberAccess { target, name, .. } => {
            mentions_comment(name) || chain_mentions_comment(target)
        }
        ExprKind::Invocation { callee, .. } => chain_mentions_comment(callee),
        ExprKind::ElementAccess { target, .. } => chain_mentions_comment(target),
        ExprKind::Parenthesized(inner) => chain_mentions_comment(inner),
        ExprKind::Unary { op, operand } if op == "!" => chain_mentions_comment(operand),
        _ => false,
    }
}

fn mentions_comment(name: &str) -> bool {
    name.to_ascii_lowercase().contains("comment")
}

fn is_string_type_receiver(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Identifier(n) if n == "string" || n == "String")
        || matches!(&expr.kind, ExprKind::MemberAccess { target, name, .. }
            if name == "String" && matches!(&target.kind, ExprKind::Identifier(s) if s == "System"))
}

impl DisplayNameLogicRule {
    fn check_expr(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Binary { op, left, right } if op == "==" || op == "!=" => {
                (is_comment_name_access(left) && right.unparenthesized().is_string_literal())
                    || (is_comment_name_access(right) && left.unparenthesized().is_string_literal())
            }
            ExprKind::Switch { governing, .. } => is_comment_name_access(governing),
            ExprKind::Invocation { callee, args } => {
                let ExprKind::MemberAccess { target, name, .. } = &callee.kind else {
                    return false;
                };
                if !COMPARISON_METHODS.contains(&name.as_str()) {
                    return false;
                }
                if is_comment_name_access(target) {
                    return true;
                }
                name == "Equals"
                    && is_string_type_receiver(target)
                    && args.iter().any(|a| is_comment_name_access(&a.expr))
            }
            _ => false,
        }
    }
}

impl Rule for DisplayNameLogicRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM010]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[
            NodeKind::BinaryExpression,
            NodeKind::SwitchExpression,
            NodeKind::SwitchStatement,
            NodeKind::Invocation,
        ]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let fires = match node {
            Node::Expr(expr) => self.check_expr(expr),
            Node::SwitchStatement { value, .. } => is_comment_name_access(value),
            Node::TypeDeclaration(_) => false,
        };
        if fires {
            vec![ctx.diagnostic(RuleCode::DSM010, node.span(), Vec::new())]
        } else {
            Vec::new()
        }
    }
}
