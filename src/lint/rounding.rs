//! DSM008: `Math.Round` without an explicit `AwayFromZero` midpoint policy.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::ExprKind;

const AWAY_FROM_ZERO: &[&str] = &["MidpointRounding.AwayFromZero", "System.MidpointRounding.AwayFromZero"];

pub struct RoundingModeRule;

impl RoundingModeRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RoundingModeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RoundingModeRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM008]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Invocation]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Expr(expr) = node else {
            return Vec::new();
        };
        let ExprKind::Invocation { callee, args } = &expr.kind else {
            return Vec::new();
        };
        let ExprKind::MemberAccess { target, name, .. } = &callee.kind else {
            return Vec::new();
        };
        let is_math = matches!(&target.kind, ExprKind::Identifier(t) if t == "Math");
        if name != "Round" || !is_math {
            return Vec::new();
        }

        let fires = match args.len() {
            2 => true,
            3 => {
                let mode: String = ctx
                    .text(args[2].expr.span)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                !AWAY_FROM_ZERO.contains(&mode.as_str())
            }
            _ => false,
        };
        if fires {
            vec![ctx.diagnostic(RuleCode::DSM008, expr.span, Vec::new())]
        } else {
            Vec::new()
        }
    }
}
