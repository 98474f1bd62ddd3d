//! DSMPS001: direct use of a restricted data accessor.
//!
//! Demographic rows must be read through the reader service so that frozen
//! snapshots and enrichment apply. The ban is unconditional; call sites that
//! legitimately need the raw accessor suppress it with a pragma.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::ExprKind;

pub struct RestrictedAccessorRule;

impl RestrictedAccessorRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RestrictedAccessorRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RestrictedAccessorRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSMPS001]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::MemberAccess, NodeKind::Invocation]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Expr(expr) = node else {
            return Vec::new();
        };
        match &expr.kind {
            ExprKind::MemberAccess { name, .. } => {
                if ctx.analysis.restricted_members.iter().any(|m| m == name) {
                    return vec![ctx.diagnostic(RuleCode::DSMPS001, expr.span, vec![name.clone()])];
                }
            }
            ExprKind::Invocation { callee, .. } => {
                let ExprKind::MemberAccess { target, name, .. } = &callee.kind else {
                    return Vec::new();
                };
                let Some(receiver) = target.unparenthesized().simple_name() else {
                    return Vec::new();
                };
                let restricted = ctx
                    .analysis
                    .restricted_invocation_pairs()
                    .into_iter()
                    .any(|(r, m)| r == receiver && m == name);
                if restricted {
                    let shown = format!("{receiver}.{name}");
                    return vec![ctx.diagnostic(RuleCode::DSMPS001, expr.span, vec![shown])];
                }
            }
            _ => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::visit::{run_rule, run_rule_with};
    use crate::lint_config::AnalysisConfig;

    const SRC: &str = r#"
class Svc {
    void M(Ctx ctx) {
        var q = ctx.Demographics.Where(d => d.Ssn == 1);
        var r = DemographicsLoader.LoadAll(ctx);
        var s = ctx.DemographicHistories;
    }
}"#;

    #[test]
    fn restricted_member_fires_once_per_access() {
        let diags = run_rule(Box::new(RestrictedAccessorRule::new()), SRC);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args, vec!["Demographics".to_string()]);
        assert_eq!(diags[0].range.start_line, 4);
    }

    #[test]
    fn configured_invocation_pairs() {
        let analysis = AnalysisConfig {
            restricted_invocations: vec!["DemographicsLoader.LoadAll".to_string()],
            restricted_members: Vec::new(),
            ..AnalysisConfig::default()
        };
        let diags = run_rule_with(Box::new(RestrictedAccessorRule::new()), SRC, &analysis);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args, vec!["DemographicsLoader.LoadAll".to_string()]);
        assert!(diags[0].message.contains("IDemographicReaderService"));
    }
}
