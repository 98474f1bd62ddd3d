//! DSM013: request/response types used by an endpoint must provide a static
//! example factory (`RequestExample()` / `ResponseExample()`).
//!
//! The factories feed the generated API documentation, so every DTO that
//! crosses an endpoint boundary needs one. Framework, primitive and abstract
//! types are exempt.

use super::endpoint::endpoint_types;
use super::rules::{Diagnostic, Node, NodeKind, Rule, RuleCode, RuleContext};
use crate::csharp::syntax::TypeKind;
use crate::csharp::{Compilation, MemberKind, TypeRef};

/// Display prefixes of framework types that never need a factory.
const EXCLUDED_PREFIXES: &[&str] = &[
    "System.Collections.Generic.IEnumerable<",
    "System.Collections.Generic.IReadOnlyList<",
    "System.Collections.Generic.IList<",
    "System.Collections.Generic.ICollection<",
    "System.Collections.Generic.IQueryable<",
    "System.Collections.Generic.List<",
    "System.Collections.Generic.Dictionary<",
    "System.Collections.Generic.HashSet<",
    "System.Linq.IQueryable<",
    "System.Collections.Generic.IAsyncEnumerable<",
    "System.IO.Stream",
    "System.IO.MemoryStream",
    "System.String",
    "System.Int32",
    "System.Int64",
    "System.Decimal",
    "System.Boolean",
    "System.Guid",
    "System.DateTime",
    "System.DateTimeOffset",
    "System.TimeSpan",
    "System.DateOnly",
    "System.TimeOnly",
    "System.Byte",
    "System.Char",
    "System.Double",
    "System.Single",
    "System.Nullable<",
    "System.Task",
    "System.Threading.Tasks.Task",
];

const FRAMEWORK_PREFIXES: &[&str] = &["FastEndpoints.", "Microsoft.AspNetCore."];

pub struct ExampleMethodRule;

impl ExampleMethodRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExampleMethodRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `ty` is a DTO that must carry an example factory.
pub fn should_check_type(comp: &Compilation, ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Primitive(_)
        | TypeRef::Nullable(_)
        | TypeRef::Array(_)
        | TypeRef::Tuple(_)
        | TypeRef::TypeParam(_) => return false,
        TypeRef::External { known: false, .. } => return false,
        _ => {}
    }

    let display = comp.display(ty);
    if EXCLUDED_PREFIXES.iter().any(|p| display.starts_with(p))
        || FRAMEWORK_PREFIXES.iter().any(|p| display.starts_with(p))
        || display == "Results"
        || display.contains("FileResult")
        || display.contains("StreamResult")
    {
        return false;
    }

    if comp.is_interface(ty) {
        return false;
    }
    match ty {
        TypeRef::Source { id, .. } => !comp.symbol(*id).is_abstract,
        _ => true,
    }
}

/// Whether `ty` declares `public static T method()` returning itself.
fn has_example_method(comp: &Compilation, ty: &TypeRef, method: &str) -> bool {
    let TypeRef::Source { id, .. } = ty else {
        return false;
    };
    let map = comp.substitution(ty);
    comp.symbol(*id).members.iter().any(|m| {
        m.kind == MemberKind::Method
            && m.name == method
            && m.is_static
            && m.is_public
            && m.param_count == 0
            && m.ty.substitute(&map) == *ty
    })
}

impl Rule for ExampleMethodRule {
    fn codes(&self) -> &'static [RuleCode] {
        &[RuleCode::DSM013]
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
        let Some(TypeRef::Source { id, .. }) = ctx.binder.this_type else {
            return Vec::new();
        };
        let comp = ctx.compilation;
        let Some(types) = endpoint_types(comp, *id) else {
            return Vec::new();
        };

        let roles = [
            (types.request, "request", "RequestExample"),
            (types.response, "response", "ResponseExample"),
        ];
        let mut out = Vec::new();
        for (ty, role, method) in roles {
            let Some(ty) = ty else {
                continue;
            };
            if should_check_type(comp, &ty) && !has_example_method(comp, &ty, method) {
                out.push(ctx.diagnostic(
                    RuleCode::DSM013,
                    decl.name_span,
                    vec![comp.minimal_display(&ty), role.to_string(), method.to_string()],
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::visit::run_rule;

    const DTOS: &str = r#"
namespace Contracts
{
    public class GoodRequest { public static GoodRequest RequestExample() => new GoodRequest(); }
    public class GoodResponse { public static GoodResponse ResponseExample() => new(); }
    public class BareResponse { public int Total { get; set; } }
    public class WrongReturn { public static object ResponseExample() => null; }
    public class InstanceOnly { public InstanceOnly ResponseExample() => this; }
    public class WithArg { public static WithArg ResponseExample(int seed) => new(); }
    public abstract class AbstractResponse { }
    public class Page<T> { public static Page<T> ResponseExample() => new(); }
}
"#;

    fn check(endpoint: &str) -> Vec<Diagnostic> {
        let src = format!("{DTOS}\nnamespace E {{ using Contracts; {endpoint} }}");
        run_rule(Box::new(ExampleMethodRule::new()), &src)
    }

    #[test]
    fn missing_response_factory() {
        let diags = check("public class Get : ProfitSharingEndpoint<GoodRequest, BareResponse> { }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args, vec!["BareResponse", "response", "ResponseExample"]);
        assert_eq!(
            diags[0].message,
            "Type 'BareResponse' used as response in endpoint must have a public static `ResponseExample()` method"
        );
    }

    #[test]
    fn factories_present() {
        assert!(check("public class Get : ProfitSharingEndpoint<GoodRequest, GoodResponse> { }").is_empty());
        assert!(check("public class Get : EndpointWithoutRequest<Page<GoodResponse>> { }").is_empty());
    }

    #[test]
    fn factory_shape_must_match() {
        for dto in ["WrongReturn", "InstanceOnly", "WithArg"] {
            let diags = check(&format!("public class Get : EndpointWithoutRequest<{dto}> {{ }}"));
            assert_eq!(diags.len(), 1, "{dto}");
        }
    }

    #[test]
    fn request_only_endpoint() {
        let diags = check("public class Post : ProfitSharingRequestEndpoint<BareResponse> { }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].args[1], "request");
        assert_eq!(diags[0].args[2], "RequestExample");
    }

    #[test]
    fn exempt_types() {
        assert!(check("public class A : ProfitSharingEndpoint<GoodRequest, Task<string>> { }").is_empty());
        assert!(check("public class B : ProfitSharingEndpoint<GoodRequest, List<GoodResponse>> { }").is_empty());
        assert!(check("public class C : ProfitSharingEndpoint<GoodRequest, string> { }").is_empty());
        assert!(check("public class D : ProfitSharingEndpoint<GoodRequest, AbstractResponse> { }").is_empty());
        assert!(check("public class F : ProfitSharingEndpoint<GoodRequest, FileStreamResult> { }").is_empty());
        assert!(check("public class G : ProfitSharingEndpoint<GoodRequest, Results<Ok, NotFound>> { }").is_empty());
        assert!(check("public abstract class H : ProfitSharingEndpoint<GoodRequest, BareResponse> { }").is_empty());
    }
}
