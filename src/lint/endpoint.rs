//! Request/response extraction from endpoint base classes.

use rustc_hash::FxHashSet;

use crate::csharp::{Compilation, TypeId, TypeRef};

const BASE_NAMESPACE: &str = "Demoulas.ProfitSharing.Endpoints.Base";
const FAST_ENDPOINTS: &str = "FastEndpoints";

/// A generic endpoint base class the extractor recognizes.
#[derive(Debug, Clone, Copy)]
struct Shape {
    name: &'static str,
    /// Namespaces the base may be declared in; `""` is the global namespace.
    namespaces: &'static [&'static str],
    arity: usize,
    request: Option<usize>,
    response: Option<usize>,
}

const SHAPES: &[Shape] = &[
    Shape {
        name: "ProfitSharingEndpoint",
        namespaces: &[BASE_NAMESPACE, ""],
        arity: 2,
        request: Some(0),
        response: Some(1),
    },
    Shape {
        name: "ProfitSharingRequestEndpoint",
        namespaces: &[BASE_NAMESPACE, ""],
        arity: 1,
        request: Some(0),
        response: None,
    },
    Shape {
        name: "Endpoint",
        namespaces: &[FAST_ENDPOINTS],
        arity: 2,
        request: Some(0),
        response: Some(1),
    },
    Shape {
        name: "EndpointWithoutRequest",
        namespaces: &[FAST_ENDPOINTS],
        arity: 1,
        request: None,
        response: Some(0),
    },
];

/// Request and response payload types of an endpoint class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointTypes {
    pub request: Option<TypeRef>,
    pub response: Option<TypeRef>,
}

/// Walk the base-class chain of `endpoint` until a known endpoint shape is
/// found, substituting generic arguments along the way.
pub fn endpoint_types(comp: &Compilation, endpoint: TypeId) -> Option<EndpointTypes> {
    let mut seen: FxHashSet<TypeId> = FxHashSet::default();
    let mut current = comp.self_type(endpoint);

    loop {
        if let TypeRef::Source { id, .. } = &current {
            if !seen.insert(*id) {
                return None;
            }
        }
        let base = comp.base_class_of(&current)?;
        if let Some(shape) = match_shape(comp, &base) {
            let args = base.args();
            return Some(EndpointTypes {
                request: shape.request.and_then(|i| args.get(i).cloned()),
                response: shape.response.and_then(|i| args.get(i).cloned()),
            });
        }
        match base {
            TypeRef::Source { .. } => current = base,
            _ => return None,
        }
    }
}

fn match_shape(comp: &Compilation, base: &TypeRef) -> Option<&'static Shape> {
    let (namespace, name, arity) = match base {
        TypeRef::Source { id, args } => {
            let sym = comp.symbol(*id);
            if sym.containing.is_some() {
                return None;
            }
            (sym.namespace.as_str(), sym.name.as_str(), args.len())
        }
        TypeRef::External { namespace, name, args, .. } => {
            (namespace.as_str(), name.as_str(), args.len())
        }
        _ => return None,
    };
    let unresolved = matches!(base, TypeRef::External { known: false, .. });
    SHAPES.iter().find(|s| {
        s.name == name
            && s.arity == arity
            && (s.namespaces.contains(&namespace) || (unresolved && namespace.is_empty()))
    })
}
