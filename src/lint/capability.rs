//! Symbol-graph capability walker.
//!
//! Answers "does this type carry capability `X`", where carrying means the
//! type, or anything reachable from it through instance members, generic
//! arguments, collection and array elements, or base classes, implements an
//! interface whose name matches `X`. Members typed by framework types
//! (anything under `System`) are not looked into.
//!
//! The walk is depth-first with a visited set that lives for exactly one
//! top-level query. A type is marked before it is inspected, so a capability
//! that is only reachable by cycling back to an ancestor is not reported.

use rustc_hash::FxHashSet;

use crate::csharp::{Compilation, TypeRef};

/// Collection interfaces whose first type argument is the element type.
const ELEMENT_INTERFACES: &[&str] = &["IEnumerable", "IList", "ICollection", "ISet", "IDictionary"];

/// Run one capability query with a fresh visited set.
pub fn type_has_capability(comp: &Compilation, root: &TypeRef, capability: &str) -> bool {
    let mut visited = FxHashSet::default();
    has_capability(comp, root, capability, &mut visited)
}

/// Whether `root` or any type reachable from it implements `capability`.
///
/// `visited` must be scoped to one logical query; reusing it across
/// unrelated queries under-reports.
pub fn has_capability(
    comp: &Compilation,
    root: &TypeRef,
    capability: &str,
    visited: &mut FxHashSet<TypeRef>,
) -> bool {
    if !visited.insert(root.clone()) {
        return false;
    }
    if implements_by_name(comp, root, capability) {
        return true;
    }

    for arg in root.args() {
        if implements_by_name(comp, arg, capability) {
            return true;
        }
        if matches!(arg, TypeRef::Source { .. }) && has_capability(comp, arg, capability, visited) {
            return true;
        }
    }

    for (_, member) in comp.instance_members(root) {
        if member_has_capability(comp, &member, capability, visited) {
            return true;
        }
    }

    match comp.base_class_of(root) {
        Some(base) if !is_root_class(comp, &base) => has_capability(comp, &base, capability, visited),
        _ => false,
    }
}

fn member_has_capability(
    comp: &Compilation,
    member: &TypeRef,
    capability: &str,
    visited: &mut FxHashSet<TypeRef>,
) -> bool {
    let ty = member.unwrap_nullable();
    if implements_by_name(comp, ty, capability) {
        return true;
    }
    // Framework members, `List<T>` included, are leaves.
    if is_opaque(comp, ty) {
        return false;
    }

    for arg in ty.args() {
        if reaches(comp, arg, capability, visited) {
            return true;
        }
    }
    if let Some(element) = element_type(comp, ty) {
        if reaches(comp, &element, capability, visited) {
            return true;
        }
    }
    if let TypeRef::Array(element) = ty {
        if reaches(comp, element, capability, visited) {
            return true;
        }
    }

    has_capability(comp, ty, capability, visited)
}

fn reaches(
    comp: &Compilation,
    ty: &TypeRef,
    capability: &str,
    visited: &mut FxHashSet<TypeRef>,
) -> bool {
    implements_by_name(comp, ty, capability)
        || (!is_opaque(comp, ty) && has_capability(comp, ty, capability, visited))
}

/// Value types, `string`, `object`, `void`, and anything under `System`.
pub fn is_opaque(comp: &Compilation, ty: &TypeRef) -> bool {
    if comp.is_value_type(ty) {
        return true;
    }
    if let TypeRef::Primitive(k) = ty {
        if matches!(k.as_str(), "string" | "object" | "void" | "dynamic") {
            return true;
        }
    }
    match comp.namespace_of(ty) {
        Some(ns) => ns == "System" || ns.starts_with("System."),
        None => false,
    }
}

fn is_root_class(comp: &Compilation, ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Primitive(k) => k == "object",
        TypeRef::External { .. } => {
            let display = comp.display(ty);
            display == "System.Object" || display == "System.ValueType"
        }
        _ => false,
    }
}

/// Element type of a collection: the element argument of a known framework
/// collection, or of the first collection interface a source type
/// implements.
fn element_type(comp: &Compilation, ty: &TypeRef) -> Option<TypeRef> {
    if let Some(index) = ty.known().and_then(|k| k.element) {
        return ty.args().get(index).cloned();
    }
    if !matches!(ty, TypeRef::Source { .. }) {
        return None;
    }
    comp.all_interfaces(ty).into_iter().find_map(|iface| {
        let is_collection = matches!(&iface, TypeRef::External { name, namespace, .. }
            if namespace == "System.Collections.Generic"
                && ELEMENT_INTERFACES.contains(&name.as_str()));
        if is_collection {
            iface.args().first().cloned()
        } else {
            None
        }
    })
}

/// `ty` is an interface named `capability`, or implements one.
pub fn implements_by_name(comp: &Compilation, ty: &TypeRef, capability: &str) -> bool {
    if comp.is_interface(ty) && matches_name(comp, ty, capability) {
        return true;
    }
    comp.all_interfaces(ty)
        .iter()
        .any(|iface| matches_name(comp, iface, capability))
}

/// Whether `ty` is named `capability` in any of the accepted forms: simple,
/// metadata (``Name`1``), display, or qualified when the capability itself
/// contains a dot.
pub fn matches_name(comp: &Compilation, ty: &TypeRef, capability: &str) -> bool {
    if capability.is_empty() {
        return false;
    }
    if comp.simple_name(ty) == capability {
        return true;
    }
    let metadata = comp.metadata_name(ty);
    if metadata == capability || metadata.starts_with(&format!("{capability}`")) {
        return true;
    }
    if comp.display(ty) == capability {
        return true;
    }
    if capability.contains('.') {
        let minimal = comp.minimal_display(ty);
        if minimal == capability || minimal.starts_with(&format!("{capability}<")) {
            return true;
        }
        return comp.fully_qualified(ty).contains(capability);
    }
    false
}
