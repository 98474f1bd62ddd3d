//! DSM007: endpoint responses must expose the executive marker.
//!
//! A response that describes people has to let the client know which rows
//! belong to executives. The response type passes when the capability
//! walker reaches the marker interface anywhere in its member graph, or when
//! it is explicitly opted out with an attribute.

use tracing::trace;

use super::capability::type_has_capability;
use super::endpoint::endpoint_types;
use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::TypeKind;
use crate::csharp::TypeRef;

pub struct ExecutiveCapabilityRule;

impl ExecutiveCapabilityRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExecutiveCapabilityRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ExecutiveCapabilityRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM007]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::TypeDeclaration]
    }

    fn check(&self, node: &Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::TypeDeclaration(decl) = node else {
            return Vec::new();
        };
        if decl.kind != TypeKind::Class || decl.is_abstract() {
            return Vec::new();
        }
        let comp = ctx.compilation;
        let Some(id) = ctx.binder.this_type.and_then(|t| match t {
            TypeRef::Source { id, .. } => Some(*id),
            _ => None,
        }) else {
            return Vec::new();
        };
        let Some(response) = endpoint_types(comp, id).and_then(|t| t.response) else {
            return Vec::new();
        };
        let TypeRef::Source { id: response_id, .. } = &response else {
            return Vec::new();
        };
        if !ctx.is_response_dto(&response) {
            return Vec::new();
        }

        let analysis = ctx.analysis;
        if !comp.mentions_type(&analysis.executive_marker) {
            trace!("marker {} not in compilation; DSM007 declines", analysis.executive_marker);
            return Vec::new();
        }
        if comp.symbol(*response_id).has_attribute(&analysis.executive_opt_out_attribute) {
            return Vec::new();
        }
        if type_has_capability(comp, &response, &analysis.executive_marker) {
            return Vec::new();
        }

        vec![ctx.diagnostic(
            RuleCode::DSM007,
            decl.name_span,
            vec![
                comp.minimal_display(&response),
                analysis.executive_marker.clone(),
                analysis.executive_opt_out_attribute.clone(),
            ],
        )]
    }
}
