//! C# front end: tree-sitter parsing, the owned syntax model, and a light
//! semantic model over all analyzed files.

pub mod binder;
pub mod parser;
pub mod semantic;
pub mod source;
pub mod syntax;

pub use binder::{Binder, Scope};
pub use semantic::{Compilation, ImportScope, KnownType, MemberKind, TypeId, TypeRef, TypeSymbol};
pub use source::SourceFile;
