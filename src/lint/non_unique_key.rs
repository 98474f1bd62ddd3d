//! DSM009: `ToDictionary` keyed on Ssn.
//!
//! Several people can share one Ssn (beneficiaries, data-entry errors), so a
//! dictionary built on it throws on duplicates or silently drops rows.

use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::{Expr, ExprKind, LambdaBody, Stmt};

const DICTIONARY_BUILDERS: &[&str] = &["ToDictionary", "ToDictionaryAsync"];

pub struct NonUniqueKeyRule;

impl NonUniqueKeyRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NonUniqueKeyRule {
    fn default() -> Self {
        Self::new()
    }
}

fn is_ssn_access(expr: &Expr) -> bool {
    matches!(&expr.unparenthesized().kind,
        ExprKind::MemberAccess { name, .. } if name.eq_ignore_ascii_case("Ssn"))
}

/// Whether a key selector lambda projects straight onto `Ssn`.
fn selects_ssn(selector: &Expr) -> bool {
    let ExprKind::Lambda { body, .. } = &selector.unparenthesized().kind else {
        return false;
    };
    match body {
        LambdaBody::Expr(e) => is_ssn_access(e),
        LambdaBody::Block(stmts) => stmts.iter().any(|s| match s {
            Stmt::Return(Some(e), _) => is_ssn_access(e),
            _ => false,
        }),
    }
}

impl Rule for NonUniqueKeyRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM009]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Invocation]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Expr(expr) = node else {
            return Vec::new();
        };
        let ExprKind::Invocation { args, .. } = &expr.kind else {
            return Vec::new();
        };
        let Some(method) = expr.invoked_name() else {
            return Vec::new();
        };
        if !DICTIONARY_BUILDERS.contains(&method) {
            return Vec::new();
        }
        match args.first() {
            Some(first) if selects_ssn(&first.expr) => {
                vec![ctx.diagnostic(RuleCode::DSM009, expr.span, vec![method.to_string()])]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::visit::run_rule;

    fn check(stmt: &str) -> Vec<Diagnostic> {
        let src = format!("class C {{ async Task M(List<Member> members) {{ {stmt} }} }}");
        run_rule(Box::new(NonUniqueKeyRule::new()), &src)
    }

    #[test]
    fn expression_lambda_on_ssn() {
        let diags = check("var d = members.ToDictionary(m => m.Ssn);");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args, vec!["ToDictionary".to_string()]);
        assert_eq!(check("var d = members.ToDictionary(m => m.SSN, m => m.Id);").len(), 1);
        assert_eq!(check("var d = await q.ToDictionaryAsync(x => x.Ssn, ct);").len(), 1);
    }

    #[test]
    fn block_lambda_returning_ssn() {
        assert_eq!(check("var d = members.ToDictionary(m => { return m.Ssn; });").len(), 1);
    }

    #[test]
    fn composite_or_other_keys_do_not_fire() {
        assert!(check("var d = members.ToDictionary(m => new { m.Ssn, m.Id });").is_empty());
        assert!(check("var d = members.ToDictionary(m => m.Id);").is_empty());
        assert!(check("var d = members.ToLookup(m => m.Ssn);").is_empty());
        assert!(check("var d = members.ToDictionary(m => m.Ssn.ToString() + m.Id);").is_empty());
    }
}
