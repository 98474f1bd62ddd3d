//! Best-effort expression typing.
//!
//! Only the shapes the rules need are typed; everything else yields `None`
//! and the asking rule declines.

use super::semantic::{Compilation, ImportScope, TypeRef};
use super::syntax::{Expr, ExprKind, TypeSyntax};

/// Lexical scope of locals visible at a point in a member body.
///
/// A local declared without a usable type (lambda parameters, deconstruction)
/// is stored as `None` so that it still shadows members of the same name.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    frames: Vec<Vec<(String, Option<TypeRef>)>>,
}

impl Scope {
    pub fn new() -> Self {
        Self { frames: vec![Vec::new()] }
    }

    pub fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Option<TypeRef>) {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push((name.into(), ty));
        }
    }

    /// `Some(ty)` if a local named `name` is in scope.
    pub fn lookup(&self, name: &str) -> Option<Option<&TypeRef>> {
        self.frames
            .iter()
            .rev()
            .flat_map(|f| f.iter().rev())
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty.as_ref())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Types expressions at one point of the walk.
pub struct Binder<'a> {
    pub compilation: &'a Compilation,
    pub imports: &'a ImportScope,
    pub locals: &'a Scope,
    /// Type of `this`, when inside a type declaration.
    pub this_type: Option<&'a TypeRef>,
}

impl<'a> Binder<'a> {
    pub fn resolve(&self, ty: &TypeSyntax) -> Option<TypeRef> {
        match ty {
            TypeSyntax::Implicit => None,
            other => Some(self.compilation.resolve(other, self.imports)),
        }
    }

    pub fn type_of(&self, expr: &Expr) -> Option<TypeRef> {
        let comp = self.compilation;
        match &expr.kind {
            ExprKind::Identifier(name) => match self.locals.lookup(name) {
                Some(ty) => ty.cloned(),
                None => comp.member_type(self.this_type?, name),
            },
            ExprKind::This => self.this_type.cloned(),
            ExprKind::MemberAccess { target, name, .. } => {
                let target = self.type_of(target)?;
                comp.member_type(target.unwrap_nullable(), name)
            }
            ExprKind::ObjectCreation { ty: Some(ty), .. } => self.resolve(ty),
            ExprKind::Cast { ty, .. } => self.resolve(ty),
            ExprKind::Parenthesized(inner) => self.type_of(inner),
            ExprKind::Conditional { when_true, when_false, .. } => {
                self.type_of(when_true).or_else(|| self.type_of(when_false))
            }
            ExprKind::Assignment { left, .. } => self.type_of(left),
            ExprKind::ElementAccess { target, .. } => {
                let target = self.type_of(target)?;
                let target = target.unwrap_nullable();
                if let TypeRef::Array(element) = target {
                    return Some((**element).clone());
                }
                let index = target.known()?.element?;
                let args = target.args();
                // Dictionaries are indexed by key and yield the value.
                let index = if args.len() == 2 { 1 } else { index };
                args.get(index).cloned()
            }
            ExprKind::Invocation { callee, .. } => match &callee.kind {
                ExprKind::MemberAccess { target, name, .. } => {
                    let target = self.type_of(target)?;
                    comp.method_return_type(target.unwrap_nullable(), name)
                }
                ExprKind::Identifier(name) => comp.method_return_type(self.this_type?, name),
                _ => None,
            },
            ExprKind::Unary { op, operand } if op == "await" => {
                match self.type_of(operand)? {
                    TypeRef::External { name, mut args, known: true, .. }
                        if (name == "Task" || name == "ValueTask") && args.len() == 1 =>
                    {
                        args.pop()
                    }
                    _ => None,
                }
            }
            ExprKind::Unary { op, operand } if op == "!" => self.type_of(operand),
            _ => None,
        }
    }
}
