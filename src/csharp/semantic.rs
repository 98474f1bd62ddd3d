//! Compilation-wide symbol table.
//!
//! [`Compilation::build`] merges every file's declarations into one type
//! table (partial declarations are merged by full name and arity), resolves
//! base lists and member types against each declaration's imports, and
//! answers the queries the rules need: member lookup with generic
//! substitution, transitive interfaces, and the display forms used in
//! messages and capability matching.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::source::SourceFile;
use super::syntax::{has_attribute, Attribute, TypeDecl, TypeKind, TypeSyntax, UsingDirective};

pub type TypeId = usize;

/// Hard stop for base-chain walks over malformed (cyclic) hierarchies.
const MAX_BASE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Known framework types
// ---------------------------------------------------------------------------

/// A framework type the model knows about without seeing its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownType {
    pub namespace: &'static str,
    pub name: &'static str,
    pub arity: usize,
    pub value_type: bool,
    pub interface: bool,
    /// Type argument holding the collection element, if a collection.
    pub element: Option<usize>,
    /// C# keyword alias (`System.Int32` -> `int`).
    pub keyword: Option<&'static str>,
}

impl KnownType {
    const fn new(namespace: &'static str, name: &'static str, arity: usize) -> Self {
        Self {
            namespace,
            name,
            arity,
            value_type: false,
            interface: false,
            element: None,
            keyword: None,
        }
    }

    const fn value(mut self) -> Self {
        self.value_type = true;
        self
    }

    const fn iface(mut self) -> Self {
        self.interface = true;
        self
    }

    const fn elem(mut self, index: usize) -> Self {
        self.element = Some(index);
        self
    }

    const fn kw(mut self, keyword: &'static str) -> Self {
        self.keyword = Some(keyword);
        self
    }
}

const SYS: &str = "System";
const SCG: &str = "System.Collections.Generic";

static KNOWN_TYPES: &[KnownType] = &[
    KnownType::new(SYS, "Boolean", 0).value().kw("bool"),
    KnownType::new(SYS, "Byte", 0).value().kw("byte"),
    KnownType::new(SYS, "SByte", 0).value().kw("sbyte"),
    KnownType::new(SYS, "Int16", 0).value().kw("short"),
    KnownType::new(SYS, "UInt16", 0).value().kw("ushort"),
    KnownType::new(SYS, "Int32", 0).value().kw("int"),
    KnownType::new(SYS, "UInt32", 0).value().kw("uint"),
    KnownType::new(SYS, "Int64", 0).value().kw("long"),
    KnownType::new(SYS, "UInt64", 0).value().kw("ulong"),
    KnownType::new(SYS, "Char", 0).value().kw("char"),
    KnownType::new(SYS, "Single", 0).value().kw("float"),
    KnownType::new(SYS, "Double", 0).value().kw("double"),
    KnownType::new(SYS, "Decimal", 0).value().kw("decimal"),
    KnownType::new(SYS, "String", 0).kw("string"),
    KnownType::new(SYS, "Object", 0).kw("object"),
    KnownType::new(SYS, "DateTime", 0).value(),
    KnownType::new(SYS, "DateTimeOffset", 0).value(),
    KnownType::new(SYS, "DateOnly", 0).value(),
    KnownType::new(SYS, "TimeOnly", 0).value(),
    KnownType::new(SYS, "TimeSpan", 0).value(),
    KnownType::new(SYS, "Guid", 0).value(),
    KnownType::new(SYS, "Nullable", 1).value(),
    KnownType::new(SYS, "ValueType", 0),
    KnownType::new(SYS, "Enum", 0),
    KnownType::new(SYS, "Uri", 0),
    KnownType::new(SYS, "Exception", 0),
    KnownType::new(SYS, "Lazy", 1),
    KnownType::new(SYS, "Func", 1),
    KnownType::new(SYS, "Func", 2),
    KnownType::new(SYS, "Action", 0),
    KnownType::new(SYS, "Action", 1),
    KnownType::new(SYS, "MidpointRounding", 0).value(),
    KnownType::new(SYS, "Math", 0),
    KnownType::new(SCG, "IEnumerable", 1).iface().elem(0),
    KnownType::new(SCG, "IAsyncEnumerable", 1).iface().elem(0),
    KnownType::new(SCG, "ICollection", 1).iface().elem(0),
    KnownType::new(SCG, "IList", 1).iface().elem(0),
    KnownType::new(SCG, "ISet", 1).iface().elem(0),
    KnownType::new(SCG, "IReadOnlyCollection", 1).iface().elem(0),
    KnownType::new(SCG, "IReadOnlyList", 1).iface().elem(0),
    KnownType::new(SCG, "IReadOnlySet", 1).iface().elem(0),
    KnownType::new(SCG, "IDictionary", 2).iface().elem(0),
    KnownType::new(SCG, "IReadOnlyDictionary", 2).iface().elem(0),
    KnownType::new(SCG, "List", 1).elem(0),
    KnownType::new(SCG, "HashSet", 1).elem(0),
    KnownType::new(SCG, "SortedSet", 1).elem(0),
    KnownType::new(SCG, "LinkedList", 1).elem(0),
    KnownType::new(SCG, "Queue", 1).elem(0),
    KnownType::new(SCG, "Stack", 1).elem(0),
    KnownType::new(SCG, "Dictionary", 2).elem(0),
    KnownType::new(SCG, "SortedDictionary", 2).elem(0),
    KnownType::new(SCG, "KeyValuePair", 2).value(),
    KnownType::new("System.Linq", "IQueryable", 1).iface().elem(0),
    KnownType::new("System.Collections.Immutable", "ImmutableList", 1).elem(0),
    KnownType::new("System.Collections.Immutable", "ImmutableArray", 1).value().elem(0),
    KnownType::new("System.Threading.Tasks", "Task", 0),
    KnownType::new("System.Threading.Tasks", "Task", 1),
    KnownType::new("System.Threading.Tasks", "ValueTask", 0).value(),
    KnownType::new("System.Threading.Tasks", "ValueTask", 1).value(),
    KnownType::new("System.Threading", "CancellationToken", 0).value(),
    KnownType::new("System.IO", "Stream", 0),
    KnownType::new("System.IO", "MemoryStream", 0),
    KnownType::new("System.IO", "FileStream", 0),
    KnownType::new("Microsoft.AspNetCore.Http", "IResult", 0).iface(),
    KnownType::new("Microsoft.AspNetCore.Http", "IFormFile", 0).iface(),
    KnownType::new("Microsoft.AspNetCore.Mvc", "FileResult", 0),
    KnownType::new("Microsoft.AspNetCore.Mvc", "FileStreamResult", 0),
    KnownType::new("Microsoft.AspNetCore.Mvc", "IActionResult", 0).iface(),
    KnownType::new("FastEndpoints", "Endpoint", 2),
    KnownType::new("FastEndpoints", "Endpoint", 3),
    KnownType::new("FastEndpoints", "EndpointWithoutRequest", 0),
    KnownType::new("FastEndpoints", "EndpointWithoutRequest", 1),
    KnownType::new("FastEndpoints", "EmptyRequest", 0),
    KnownType::new("FastEndpoints", "EmptyResponse", 0),
];

static KNOWN_BY_NAME: Lazy<FxHashMap<&'static str, Vec<&'static KnownType>>> = Lazy::new(|| {
    let mut map: FxHashMap<&'static str, Vec<&'static KnownType>> = FxHashMap::default();
    for k in KNOWN_TYPES {
        map.entry(k.name).or_default().push(k);
    }
    map
});

/// Look up a known framework type by namespace, name and arity.
pub fn known_type(namespace: &str, name: &str, arity: usize) -> Option<&'static KnownType> {
    KNOWN_BY_NAME
        .get(name)?
        .iter()
        .find(|k| k.arity == arity && k.namespace == namespace)
        .copied()
}

fn known_by_simple_name(name: &str, arity: usize) -> Option<&'static KnownType> {
    KNOWN_BY_NAME
        .get(name)?
        .iter()
        .find(|k| k.arity == arity)
        .copied()
}

/// C# keywords naming value types.
const VALUE_KEYWORDS: &[&str] = &[
    "bool", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "char", "float",
    "double", "decimal", "nint", "nuint",
];

// ---------------------------------------------------------------------------
// Resolved types
// ---------------------------------------------------------------------------

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Declared in the analyzed sources.
    Source { id: TypeId, args: Vec<TypeRef> },
    /// Declared elsewhere. `known` is set when the type is in the built-in
    /// framework table; unknown externals carry no information at all.
    External {
        namespace: String,
        name: String,
        args: Vec<TypeRef>,
        known: bool,
    },
    /// C# keyword type.
    Primitive(String),
    /// `Nullable<T>` over a value type.
    Nullable(Box<TypeRef>),
    Array(Box<TypeRef>),
    Tuple(Vec<TypeRef>),
    TypeParam(String),
}

impl TypeRef {
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Source { args, .. } | TypeRef::External { args, .. } => args,
            _ => &[],
        }
    }

    /// Framework-table entry for a known external.
    pub fn known(&self) -> Option<&'static KnownType> {
        match self {
            TypeRef::External { namespace, name, args, known: true } => {
                known_type(namespace, name, args.len())
            }
            _ => None,
        }
    }

    /// `T?` over a value type unwraps to `T`; everything else is unchanged.
    pub fn unwrap_nullable(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Replace type parameters using `map`.
    pub fn substitute(&self, map: &FxHashMap<String, TypeRef>) -> TypeRef {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::TypeParam(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeRef::Source { id, args } => TypeRef::Source {
                id: *id,
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
            TypeRef::External { namespace, name, args, known } => TypeRef::External {
                namespace: namespace.clone(),
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
                known: *known,
            },
            TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(inner.substitute(map))),
            TypeRef::Array(inner) => TypeRef::Array(Box::new(inner.substitute(map))),
            TypeRef::Tuple(items) => TypeRef::Tuple(items.iter().map(|a| a.substitute(map)).collect()),
            TypeRef::Primitive(_) => self.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Field,
    Method,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSymbol {
    pub name: String,
    pub kind: MemberKind,
    /// Property/field type, or method return type.
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_public: bool,
    pub param_count: usize,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    pub namespace: String,
    pub containing: Option<TypeId>,
    pub kind: TypeKind,
    pub type_params: Vec<String>,
    pub is_abstract: bool,
    pub is_static: bool,
    pub attributes: Vec<Attribute>,
    /// Every base-list entry, resolved, across all partial declarations.
    pub bases: Vec<TypeRef>,
    pub base_class: Option<TypeRef>,
    pub members: Vec<MemberSymbol>,
    pub nested: Vec<TypeId>,
}

impl TypeSymbol {
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    pub fn has_attribute(&self, wanted: &str) -> bool {
        has_attribute(&self.attributes, wanted)
    }
}

/// Names visible while resolving a type written at some point in source.
#[derive(Debug, Clone, Default)]
pub struct ImportScope {
    /// Namespace the code is declared in.
    pub namespace: String,
    pub usings: Vec<UsingDirective>,
    /// Innermost enclosing type.
    pub containing: Option<TypeId>,
    /// Type parameters in scope (enclosing types and methods).
    pub type_params: Vec<String>,
}

impl ImportScope {
    pub fn with_type_params(&self, extra: &[String]) -> ImportScope {
        let mut scope = self.clone();
        scope.type_params.extend(extra.iter().cloned());
        scope
    }
}

/// Outer-to-inner namespace chain, innermost first, ending with the global
/// namespace: `A.B` -> `["A.B", "A", ""]`.
fn namespace_chain(ns: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut cur = ns;
    while !cur.is_empty() {
        out.push(cur);
        cur = match cur.rfind('.') {
            Some(i) => &cur[..i],
            None => "",
        };
    }
    out.push("");
    out
}

fn join(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{prefix}.{rest}")
    }
}

fn looks_like_interface(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// All analyzed files plus the merged type table.
#[derive(Debug)]
pub struct Compilation {
    files: Vec<SourceFile>,
    types: Vec<TypeSymbol>,
    by_full_name: FxHashMap<(String, usize), TypeId>,
    by_simple_name: FxHashMap<String, Vec<TypeId>>,
    /// `(file, name_span.start)` of every declaration -> its symbol.
    decl_ids: FxHashMap<(usize, usize), TypeId>,
    /// Simple names written in any base list.
    base_names: FxHashSet<String>,
    global_usings: Vec<UsingDirective>,
}

impl Compilation {
    pub fn build(files: Vec<SourceFile>) -> Self {
        let global_usings = files
            .iter()
            .flat_map(|f| f.unit.usings.iter())
            .filter(|u| u.is_global)
            .cloned()
            .collect();

        let mut comp = Compilation {
            files,
            types: Vec::new(),
            by_full_name: FxHashMap::default(),
            by_simple_name: FxHashMap::default(),
            decl_ids: FxHashMap::default(),
            base_names: FxHashSet::default(),
            global_usings,
        };

        // Register every declaration first so that resolution sees the whole
        // table regardless of file order.
        let mut registrations = Vec::new();
        for (file_idx, file) in comp.files.iter().enumerate() {
            for decl in &file.unit.types {
                collect_decls(file_idx, decl, None, &mut registrations);
            }
        }
        for reg in registrations {
            comp.register(reg);
        }

        let resolved = comp.resolve_declarations();
        for (id, bases, members) in resolved {
            let symbol = &mut comp.types[id];
            for b in bases {
                if !symbol.bases.contains(&b) {
                    symbol.bases.push(b);
                }
            }
            symbol.members.extend(members);
        }
        for id in 0..comp.types.len() {
            comp.types[id].base_class = comp.compute_base_class(id);
        }

        debug!(
            "compilation: {} file(s), {} type symbol(s)",
            comp.files.len(),
            comp.types.len()
        );
        comp
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, idx: usize) -> &SourceFile {
        &self.files[idx]
    }

    pub fn types(&self) -> &[TypeSymbol] {
        &self.types
    }

    pub fn symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id]
    }

    /// Symbol for a declaration found in file `file`.
    pub fn type_id_of(&self, file: usize, decl: &TypeDecl) -> Option<TypeId> {
        self.decl_ids.get(&(file, decl.name_span.start)).copied()
    }

    /// The type as seen from inside its own declaration (`Foo<T>`).
    pub fn self_type(&self, id: TypeId) -> TypeRef {
        TypeRef::Source {
            id,
            args: self.types[id]
                .type_params
                .iter()
                .map(|p| TypeRef::TypeParam(p.clone()))
                .collect(),
        }
    }

    /// `Ns.Outer.Name` of a source type.
    pub fn full_name(&self, id: TypeId) -> String {
        let sym = &self.types[id];
        match sym.containing {
            Some(outer) => format!("{}.{}", self.full_name(outer), sym.name),
            None => join(&sym.namespace, &sym.name),
        }
    }

    /// Type lookup by fully qualified name. Accepts an optional `global::`
    /// prefix and a metadata arity suffix (`Name\`2`).
    pub fn lookup(&self, full_name: &str) -> Option<TypeId> {
        let name = full_name.strip_prefix("global::").unwrap_or(full_name);
        let (name, arity) = match name.rsplit_once('`') {
            Some((n, a)) => (n, a.parse::<usize>().ok()),
            None => (name, None),
        };
        let simple = name.rsplit('.').next().unwrap_or(name);
        self.by_simple_name.get(simple)?.iter().copied().find(|&id| {
            arity.map_or(true, |a| self.types[id].arity() == a) && self.full_name(id) == name
        })
    }

    /// Whether a type of this (simple or qualified) name is declared in the
    /// sources or named in any base list.
    pub fn mentions_type(&self, name: &str) -> bool {
        let simple = name.rsplit('.').next().unwrap_or(name);
        self.by_simple_name.contains_key(simple) || self.base_names.contains(simple)
    }

    /// Imports visible to code in `file` declared in `namespace`.
    pub fn scope_for(&self, file: usize, namespace: &str, containing: Option<TypeId>) -> ImportScope {
        let mut usings: Vec<UsingDirective> = self.files[file]
            .unit
            .usings
            .iter()
            .filter(|u| {
                !u.is_global
                    && (u.scope.is_empty()
                        || namespace == u.scope
                        || namespace.starts_with(&format!("{}.", u.scope)))
            })
            .cloned()
            .collect();
        usings.extend(self.global_usings.iter().cloned());

        let mut type_params = Vec::new();
        let mut cur = containing;
        while let Some(id) = cur {
            type_params.extend(self.types[id].type_params.iter().cloned());
            cur = self.types[id].containing;
        }

        ImportScope {
            namespace: namespace.to_string(),
            usings,
            containing,
            type_params,
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    fn register(&mut self, reg: Registration) {
        let containing = reg.parent.and_then(|p| self.decl_ids.get(&(reg.file, p)).copied());
        let full = match containing {
            Some(outer) => format!("{}.{}", self.full_name(outer), reg.name),
            None => join(&reg.namespace, &reg.name),
        };
        let key = (full, reg.type_params.len());

        let id = match self.by_full_name.get(&key) {
            Some(&id) => {
                let sym = &mut self.types[id];
                sym.attributes.extend(reg.attributes);
                sym.is_abstract |= reg.is_abstract;
                sym.is_static |= reg.is_static;
                id
            }
            None => {
                let id = self.types.len();
                self.by_simple_name.entry(reg.name.clone()).or_default().push(id);
                self.types.push(TypeSymbol {
                    name: reg.name,
                    namespace: reg.namespace,
                    containing,
                    kind: reg.kind,
                    type_params: reg.type_params,
                    is_abstract: reg.is_abstract,
                    is_static: reg.is_static,
                    attributes: reg.attributes,
                    bases: Vec::new(),
                    base_class: None,
                    members: Vec::new(),
                    nested: Vec::new(),
                });
                self.by_full_name.insert(key, id);
                if let Some(outer) = containing {
                    self.types[outer].nested.push(id);
                }
                id
            }
        };
        self.decl_ids.insert((reg.file, reg.name_start), id);
        self.base_names.extend(reg.base_names);
    }

    fn resolve_declarations(&self) -> Vec<(TypeId, Vec<TypeRef>, Vec<MemberSymbol>)> {
        let mut out = Vec::new();
        for (file_idx, file) in self.files.iter().enumerate() {
            for decl in file.unit.all_types() {
                let Some(id) = self.type_id_of(file_idx, decl) else {
                    continue;
                };
                let scope = self.scope_for(file_idx, &decl.namespace, Some(id));
                let bases = decl.bases.iter().map(|b| self.resolve(&b.ty, &scope)).collect();
                out.push((id, bases, self.member_symbols(decl, &scope)));
            }
        }
        out
    }

    fn member_symbols(&self, decl: &TypeDecl, scope: &ImportScope) -> Vec<MemberSymbol> {
        use super::syntax::Member;

        let mut out = Vec::new();
        if decl.is_record() {
            for p in &decl.primary_params {
                let Some(ty) = &p.ty else { continue };
                out.push(MemberSymbol {
                    name: p.name.clone(),
                    kind: MemberKind::Property,
                    ty: self.resolve(ty, scope),
                    is_static: false,
                    is_public: true,
                    param_count: 0,
                });
            }
        }
        let interface = decl.kind == TypeKind::Interface;
        let is_public = |mods: &[String]| interface || mods.iter().any(|x| x == "public");
        for m in &decl.members {
            match m {
                Member::Property(p) => out.push(MemberSymbol {
                    name: p.name.clone(),
                    kind: MemberKind::Property,
                    ty: self.resolve(&p.ty, scope),
                    is_static: m.is_static(),
                    is_public: is_public(&p.modifiers[..]),
                    param_count: 0,
                }),
                Member::Field(f) => out.push(MemberSymbol {
                    name: f.name.clone(),
                    kind: MemberKind::Field,
                    ty: self.resolve(&f.ty, scope),
                    is_static: m.is_static(),
                    is_public: is_public(&f.modifiers[..]),
                    param_count: 0,
                }),
                Member::Method(md) => {
                    let inner = scope.with_type_params(&md.type_params);
                    out.push(MemberSymbol {
                        name: md.name.clone(),
                        kind: MemberKind::Method,
                        ty: self.resolve(&md.return_type, &inner),
                        is_static: md.is_static(),
                        is_public: is_public(&md.modifiers[..]),
                        param_count: md.params.len(),
                    });
                }
                Member::Constructor(_) | Member::Other { .. } => {}
            }
        }
        out
    }

    fn compute_base_class(&self, id: TypeId) -> Option<TypeRef> {
        let sym = &self.types[id];
        if !matches!(sym.kind, TypeKind::Class | TypeKind::Record) {
            return None;
        }
        let first = sym.bases.first()?;
        if self.is_interface(first) {
            return None;
        }
        match first {
            TypeRef::Source { id: base, .. } if *base == id => None,
            TypeRef::Source { .. } | TypeRef::External { .. } => Some(first.clone()),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve a type written in source.
    pub fn resolve(&self, ty: &TypeSyntax, scope: &ImportScope) -> TypeRef {
        match ty {
            TypeSyntax::Predefined(k) => TypeRef::Primitive(k.clone()),
            TypeSyntax::Nullable(inner) => {
                let inner = self.resolve(inner, scope);
                if self.is_value_type(&inner) && !matches!(inner, TypeRef::Nullable(_)) {
                    TypeRef::Nullable(Box::new(inner))
                } else {
                    inner
                }
            }
            TypeSyntax::Array(inner) => TypeRef::Array(Box::new(self.resolve(inner, scope))),
            TypeSyntax::Tuple(items) => {
                TypeRef::Tuple(items.iter().map(|t| self.resolve(t, scope)).collect())
            }
            TypeSyntax::Named { qualifier, name, args } => {
                let args: Vec<TypeRef> = args.iter().map(|a| self.resolve(a, scope)).collect();
                self.resolve_named(qualifier, name, args, scope)
            }
            TypeSyntax::Implicit | TypeSyntax::Other(_) => TypeRef::External {
                namespace: String::new(),
                name: ty.display(),
                args: Vec::new(),
                known: false,
            },
        }
    }

    fn resolve_named(
        &self,
        qualifier: &[String],
        name: &str,
        args: Vec<TypeRef>,
        scope: &ImportScope,
    ) -> TypeRef {
        let arity = args.len();

        if qualifier.is_empty() {
            if arity == 0 && scope.type_params.iter().any(|p| p == name) {
                return TypeRef::TypeParam(name.to_string());
            }
            let mut cur = scope.containing;
            while let Some(outer) = cur {
                let hit = self.types[outer]
                    .nested
                    .iter()
                    .copied()
                    .find(|&n| self.types[n].name == name && self.types[n].arity() == arity);
                if let Some(id) = hit {
                    return TypeRef::Source { id, args };
                }
                cur = self.types[outer].containing;
            }
            if let Some(alias) = scope
                .usings
                .iter()
                .find(|u| u.alias.as_deref() == Some(name))
            {
                return self.resolve_dotted(&alias.target, args);
            }
        }

        // `Alias.Rest` where the first segment is a using alias.
        let mut qualifier: Vec<String> = qualifier.to_vec();
        if let Some(first) = qualifier.first() {
            if let Some(alias) = scope.usings.iter().find(|u| u.alias.as_deref() == Some(first)) {
                let mut expanded: Vec<String> = alias.target.split('.').map(str::to_string).collect();
                expanded.extend(qualifier.drain(1..));
                qualifier = expanded;
            }
        }
        let dotted = qualifier.join(".");
        let relative = join(&dotted, name);

        for ns in namespace_chain(&scope.namespace) {
            if let Some(&id) = self.by_full_name.get(&(join(ns, &relative), arity)) {
                return TypeRef::Source { id, args };
            }
        }
        for u in scope.usings.iter().filter(|u| u.alias.is_none()) {
            if let Some(&id) = self.by_full_name.get(&(join(&u.target, &relative), arity)) {
                return TypeRef::Source { id, args };
            }
        }
        if let Some(ids) = self.by_simple_name.get(name) {
            let matching: Vec<TypeId> = ids
                .iter()
                .copied()
                .filter(|&id| self.types[id].arity() == arity)
                .collect();
            if matching.len() == 1 && (dotted.is_empty() || !self.is_namespace_prefix_known(&dotted)) {
                return TypeRef::Source { id: matching[0], args };
            }
        }

        let known = if dotted.is_empty() {
            known_by_simple_name(name, arity)
        } else {
            known_type(&dotted, name, arity)
        };
        if let Some(k) = known {
            if k.namespace == "System" && k.name == "Nullable" {
                if let Some(inner) = args.into_iter().next() {
                    return TypeRef::Nullable(Box::new(inner));
                }
                return TypeRef::Primitive("object".to_string());
            }
            if let Some(kw) = k.keyword {
                return TypeRef::Primitive(kw.to_string());
            }
            return TypeRef::External {
                namespace: k.namespace.to_string(),
                name: k.name.to_string(),
                args,
                known: true,
            };
        }

        TypeRef::External {
            namespace: dotted,
            name: name.to_string(),
            args,
            known: false,
        }
    }

    /// Whether some known framework type or source type lives under `ns`,
    /// which means a qualified reference names a real namespace.
    fn is_namespace_prefix_known(&self, ns: &str) -> bool {
        KNOWN_TYPES.iter().any(|k| k.namespace == ns)
            || self
                .types
                .iter()
                .any(|t| t.namespace == ns || t.namespace.starts_with(&format!("{ns}.")))
    }

    /// Resolve a dotted name (from a using alias) without generic syntax.
    fn resolve_dotted(&self, dotted: &str, args: Vec<TypeRef>) -> TypeRef {
        let arity = args.len();
        let target = dotted.strip_prefix("global::").unwrap_or(dotted);
        if let Some(&id) = self.by_full_name.get(&(target.to_string(), arity)) {
            return TypeRef::Source { id, args };
        }
        let (ns, name) = target.rsplit_once('.').unwrap_or(("", target));
        if let Some(k) = known_type(ns, name, arity) {
            if let Some(kw) = k.keyword {
                return TypeRef::Primitive(kw.to_string());
            }
            return TypeRef::External {
                namespace: k.namespace.to_string(),
                name: k.name.to_string(),
                args,
                known: true,
            };
        }
        TypeRef::External {
            namespace: ns.to_string(),
            name: name.to_string(),
            args,
            known: false,
        }
    }

    // -----------------------------------------------------------------------
    // Type queries
    // -----------------------------------------------------------------------

    /// Type-parameter substitution for a constructed source type.
    pub fn substitution(&self, ty: &TypeRef) -> FxHashMap<String, TypeRef> {
        let mut map = FxHashMap::default();
        if let TypeRef::Source { id, args } = ty {
            for (param, arg) in self.types[*id].type_params.iter().zip(args) {
                if *arg != TypeRef::TypeParam(param.clone()) {
                    map.insert(param.clone(), arg.clone());
                }
            }
        }
        map
    }

    /// Base class of a constructed type, with generic arguments substituted.
    pub fn base_class_of(&self, ty: &TypeRef) -> Option<TypeRef> {
        let TypeRef::Source { id, .. } = ty else {
            return None;
        };
        let base = self.types[*id].base_class.as_ref()?;
        Some(base.substitute(&self.substitution(ty)))
    }

    /// Types searched for inherited members: the base class, or every base
    /// entry for interfaces.
    fn member_parents(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let TypeRef::Source { id, .. } = ty else {
            return Vec::new();
        };
        if self.types[*id].kind == TypeKind::Interface {
            let map = self.substitution(ty);
            self.types[*id].bases.iter().map(|b| b.substitute(&map)).collect()
        } else {
            self.base_class_of(ty).into_iter().collect()
        }
    }

    fn find_member(&self, ty: &TypeRef, name: &str, want_method: bool) -> Option<TypeRef> {
        let mut queue = vec![ty.unwrap_nullable().clone()];
        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        while let Some(current) = queue.pop() {
            let TypeRef::Source { id, .. } = &current else {
                continue;
            };
            if !seen.insert(*id) || seen.len() > MAX_BASE_DEPTH {
                continue;
            }
            let found = self.types[*id].members.iter().find(|m| {
                m.name == name && (m.kind == MemberKind::Method) == want_method
            });
            if let Some(m) = found {
                return Some(m.ty.substitute(&self.substitution(&current)));
            }
            queue.extend(self.member_parents(&current));
        }
        None
    }

    /// Type of property or field `name` on `ty`, searching base types.
    pub fn member_type(&self, ty: &TypeRef, name: &str) -> Option<TypeRef> {
        self.find_member(ty, name, false)
    }

    /// Return type of method `name` on `ty`, searching base types.
    pub fn method_return_type(&self, ty: &TypeRef, name: &str) -> Option<TypeRef> {
        self.find_member(ty, name, true)
    }

    /// Declared, non-static properties and fields of a source type (record
    /// positional parameters included), with generic substitution.
    pub fn instance_members(&self, ty: &TypeRef) -> Vec<(String, TypeRef)> {
        let TypeRef::Source { id, .. } = ty else {
            return Vec::new();
        };
        let map = self.substitution(ty);
        self.types[*id]
            .members
            .iter()
            .filter(|m| m.kind != MemberKind::Method && !m.is_static)
            .map(|m| (m.name.clone(), m.ty.substitute(&map)))
            .collect()
    }

    pub fn is_interface(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Source { id, .. } => self.types[*id].kind == TypeKind::Interface,
            TypeRef::External { name, known, .. } => match ty.known() {
                Some(k) => k.interface,
                None => !*known && looks_like_interface(name),
            },
            _ => false,
        }
    }

    pub fn is_value_type(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Primitive(k) => VALUE_KEYWORDS.contains(&k.as_str()),
            TypeRef::Nullable(_) | TypeRef::Tuple(_) => true,
            TypeRef::Source { id, .. } => self.types[*id].kind.is_value_type(),
            TypeRef::External { .. } => ty.known().is_some_and(|k| k.value_type),
            TypeRef::Array(_) | TypeRef::TypeParam(_) => false,
        }
    }

    /// Containing namespace; keyword types live in `System`.
    pub fn namespace_of(&self, ty: &TypeRef) -> Option<String> {
        match ty {
            TypeRef::Source { id, .. } => {
                let mut sym = &self.types[*id];
                while let Some(outer) = sym.containing {
                    sym = &self.types[outer];
                }
                Some(sym.namespace.clone())
            }
            TypeRef::External { namespace, .. } => Some(namespace.clone()),
            TypeRef::Primitive(_) | TypeRef::Nullable(_) => Some("System".to_string()),
            _ => None,
        }
    }

    /// Interfaces implemented by `ty`: its own interface entries, their
    /// bases, and those of its base classes.
    pub fn all_interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_interfaces(ty, &mut out, &mut seen, 0);
        out
    }

    fn collect_interfaces(
        &self,
        ty: &TypeRef,
        out: &mut Vec<TypeRef>,
        seen: &mut FxHashSet<TypeRef>,
        depth: usize,
    ) {
        if depth > MAX_BASE_DEPTH {
            return;
        }
        let TypeRef::Source { id, .. } = ty else {
            return;
        };
        let map = self.substitution(ty);
        for base in &self.types[*id].bases {
            let base = base.substitute(&map);
            if self.is_interface(&base) && seen.insert(base.clone()) {
                out.push(base.clone());
                self.collect_interfaces(&base, out, seen, depth + 1);
            }
        }
        if let Some(base) = self.base_class_of(ty) {
            self.collect_interfaces(&base, out, seen, depth + 1);
        }
    }

    // -----------------------------------------------------------------------
    // Display forms
    // -----------------------------------------------------------------------

    pub fn simple_name(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Source { id, .. } => self.types[*id].name.clone(),
            TypeRef::External { name, .. } => name.clone(),
            TypeRef::Primitive(k) => k.clone(),
            TypeRef::TypeParam(p) => p.clone(),
            TypeRef::Nullable(inner) | TypeRef::Array(inner) => self.simple_name(inner),
            TypeRef::Tuple(_) => String::new(),
        }
    }

    /// `Name` or ``Name`N`` for generic types.
    pub fn metadata_name(&self, ty: &TypeRef) -> String {
        let arity = match ty {
            TypeRef::Source { id, .. } => self.types[*id].arity(),
            TypeRef::External { args, .. } => args.len(),
            _ => 0,
        };
        let name = self.simple_name(ty);
        if arity == 0 {
            name
        } else {
            format!("{name}`{arity}")
        }
    }

    fn render(&self, ty: &TypeRef, qualify: bool, global: bool) -> String {
        let args_of = |args: &[TypeRef]| -> String {
            if args.is_empty() {
                String::new()
            } else {
                let rendered: Vec<String> =
                    args.iter().map(|a| self.render(a, qualify, global)).collect();
                format!("<{}>", rendered.join(", "))
            }
        };
        let prefix = |ns: &str| -> String {
            match (qualify && !ns.is_empty(), global) {
                (true, true) => format!("global::{ns}."),
                (true, false) => format!("{ns}."),
                _ => String::new(),
            }
        };
        match ty {
            TypeRef::Source { id, args } => {
                let sym = &self.types[*id];
                let mut chain = vec![sym.name.clone()];
                let mut root = sym;
                while let Some(outer) = root.containing {
                    root = &self.types[outer];
                    chain.push(root.name.clone());
                }
                chain.reverse();
                format!("{}{}{}", prefix(&root.namespace), chain.join("."), args_of(args))
            }
            TypeRef::External { namespace, name, args, .. } => {
                format!("{}{}{}", prefix(namespace), name, args_of(args))
            }
            TypeRef::Primitive(k) => k.clone(),
            TypeRef::TypeParam(p) => p.clone(),
            TypeRef::Nullable(inner) => format!("{}?", self.render(inner, qualify, global)),
            TypeRef::Array(inner) => format!("{}[]", self.render(inner, qualify, global)),
            TypeRef::Tuple(items) => {
                let rendered: Vec<String> =
                    items.iter().map(|a| self.render(a, qualify, global)).collect();
                format!("({})", rendered.join(", "))
            }
        }
    }

    /// `Ns.Outer.Name<Args>`, keywords for primitives.
    pub fn display(&self, ty: &TypeRef) -> String {
        self.render(ty, true, false)
    }

    /// `Outer.Name<Args>` without namespaces.
    pub fn minimal_display(&self, ty: &TypeRef) -> String {
        self.render(ty, false, false)
    }

    /// `global::Ns.Outer.Name<global::Args>`.
    pub fn fully_qualified(&self, ty: &TypeRef) -> String {
        self.render(ty, true, true)
    }
}

/// Owned summary of one declaration, collected before the table is built.
struct Registration {
    file: usize,
    name_start: usize,
    /// `name_span.start` of the enclosing declaration.
    parent: Option<usize>,
    name: String,
    namespace: String,
    kind: TypeKind,
    type_params: Vec<String>,
    attributes: Vec<Attribute>,
    is_abstract: bool,
    is_static: bool,
    base_names: Vec<String>,
}

fn collect_decls(file: usize, decl: &TypeDecl, parent: Option<usize>, out: &mut Vec<Registration>) {
    out.push(Registration {
        file,
        name_start: decl.name_span.start,
        parent,
        name: decl.name.clone(),
        namespace: decl.namespace.clone(),
        kind: decl.kind,
        type_params: decl.type_params.clone(),
        attributes: decl.attributes.clone(),
        is_abstract: decl.is_abstract(),
        is_static: decl.has_modifier("static"),
        base_names: decl.bases.iter().map(|b| b.ty.simple_name().to_string()).collect(),
    });
    for n in &decl.nested {
        collect_decls(file, n, Some(decl.name_span.start), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(sources: &[(&str, &str)]) -> Compilation {
        let files = sources
            .iter()
            .map(|(path, text)| SourceFile::parse(*path, *text).unwrap())
            .collect();
        Compilation::build(files)
    }

    fn named(comp: &Compilation, full: &str) -> TypeRef {
        let id = comp.lookup(full).unwrap_or_else(|| panic!("type {full} not found"));
        comp.self_type(id)
    }

    #[test]
    fn partial_declarations_merge() {
        let comp = compile(&[
            ("a.cs", "namespace N; public partial class P { public int A { get; set; } }"),
            ("b.cs", "namespace N; public partial class P : IFoo { public string B { get; set; } }"),
        ]);
        let p = named(&comp, "N.P");
        let names: Vec<String> = comp.instance_members(&p).into_iter().map(|m| m.0).collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(comp.all_interfaces(&p).len(), 1);
    }

    #[test]
    fn resolution_through_usings_and_enclosing_namespaces() {
        let comp = compile(&[
            ("a.cs", "namespace Contracts.Response { public class Item {} }"),
            (
                "b.cs",
                "using Contracts.Response;\nnamespace App { public class Holder { public Item I { get; set; } public List<Item> Items { get; set; } } }",
            ),
        ]);
        let holder = named(&comp, "App.Holder");
        let item = comp.member_type(&holder, "I").unwrap();
        assert_eq!(comp.display(&item), "Contracts.Response.Item");
        let items = comp.member_type(&holder, "Items").unwrap();
        assert_eq!(comp.display(&items), "System.Collections.Generic.List<Contracts.Response.Item>");
        assert_eq!(comp.minimal_display(&items), "List<Item>");
        assert_eq!(items.known().and_then(|k| k.element), Some(0));
    }

    #[test]
    fn nullable_wraps_value_types_only() {
        let comp = compile(&[(
            "a.cs",
            "public struct S {} public class C { public int? A; public S? B; public string? C1; public C? D; }",
        )]);
        let c = named(&comp, "C");
        assert!(matches!(comp.member_type(&c, "A"), Some(TypeRef::Nullable(_))));
        assert!(matches!(comp.member_type(&c, "B"), Some(TypeRef::Nullable(_))));
        assert_eq!(comp.member_type(&c, "C1"), Some(TypeRef::Primitive("string".into())));
        assert!(matches!(comp.member_type(&c, "D"), Some(TypeRef::Source { .. })));
    }

    #[test]
    fn generic_base_substitution() {
        let comp = compile(&[(
            "a.cs",
            "public class Page<T> { public List<T> Results { get; set; } }\npublic class Row {}\npublic class RowPage : Page<Row> {}",
        )]);
        let page = named(&comp, "RowPage");
        let results = comp.member_type(&page, "Results").unwrap();
        assert_eq!(comp.display(&results), "System.Collections.Generic.List<Row>");
    }

    #[test]
    fn interfaces_are_transitive_and_inherited() {
        let comp = compile(&[(
            "a.cs",
            "public interface IA {} public interface IB : IA {} public class Base : IB {} public class D : Base, IExternal {}",
        )]);
        let d = named(&comp, "D");
        let names: Vec<String> = comp.all_interfaces(&d).iter().map(|i| comp.simple_name(i)).collect();
        assert!(names.contains(&"IExternal".to_string()));
        assert!(names.contains(&"IB".to_string()));
        assert!(names.contains(&"IA".to_string()));
    }

    #[test]
    fn lookup_accepts_metadata_and_global_forms() {
        let comp = compile(&[("a.cs", "namespace X.Y { public class G<T> { public class Inner {} } }")]);
        assert!(comp.lookup("X.Y.G").is_some());
        assert!(comp.lookup("X.Y.G`1").is_some());
        assert!(comp.lookup("global::X.Y.G").is_some());
        assert!(comp.lookup("X.Y.G`2").is_none());
        assert!(comp.lookup("X.Y.G.Inner").is_some());
        assert!(comp.mentions_type("Inner"));
    }

    #[test]
    fn display_forms() {
        let comp = compile(&[("a.cs", "namespace N { public class Outer { public class Inner {} } }")]);
        let inner = named(&comp, "N.Outer.Inner");
        assert_eq!(comp.display(&inner), "N.Outer.Inner");
        assert_eq!(comp.minimal_display(&inner), "Outer.Inner");
        assert_eq!(comp.fully_qualified(&inner), "global::N.Outer.Inner");
        assert_eq!(comp.metadata_name(&inner), "Inner");
    }

    #[test]
    fn keyword_aliases_for_qualified_system_types() {
        let comp = compile(&[("a.cs", "public class C { public System.String S; public Int32 I; }")]);
        let c = named(&comp, "C");
        assert_eq!(comp.member_type(&c, "S"), Some(TypeRef::Primitive("string".into())));
        assert_eq!(comp.member_type(&c, "I"), Some(TypeRef::Primitive("int".into())));
    }

    #[test]
    fn namespace_chain_ends_with_global() {
        assert_eq!(namespace_chain("A.B"), vec!["A.B", "A", ""]);
        assert_eq!(namespace_chain(""), vec![""]);
    }
}
