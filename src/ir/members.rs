//! Member, method and constructor references.
//!
//! These are the "reflection" handles an expression node points at. Nodes hold them
//! behind `Arc` so that reconstruction preserves the exact reference, not a copy.

use std::fmt;
use std::sync::Arc;

use super::types::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
}

/// A field or property of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub declaring_type: TypeRef,
    pub name: Arc<str>,
    pub member_type: TypeRef,
    pub kind: MemberKind,
    pub is_static: bool,
}

impl MemberRef {
    pub fn property(declaring_type: TypeRef, name: &str, member_type: TypeRef) -> Arc<Self> {
        Arc::new(MemberRef {
            declaring_type,
            name: Arc::from(name),
            member_type,
            kind: MemberKind::Property,
            is_static: false,
        })
    }

    pub fn field(declaring_type: TypeRef, name: &str, member_type: TypeRef) -> Arc<Self> {
        Arc::new(MemberRef {
            declaring_type,
            name: Arc::from(name),
            member_type,
            kind: MemberKind::Field,
            is_static: false,
        })
    }

    pub fn static_property(declaring_type: TypeRef, name: &str, member_type: TypeRef) -> Arc<Self> {
        Arc::new(MemberRef {
            declaring_type,
            name: Arc::from(name),
            member_type,
            kind: MemberKind::Property,
            is_static: true,
        })
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// A method, including generic arguments it has been closed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub declaring_type: TypeRef,
    pub name: Arc<str>,
    pub generic_args: Vec<TypeRef>,
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub is_static: bool,
}

impl MethodRef {
    pub fn instance(
        declaring_type: TypeRef,
        name: &str,
        parameters: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Arc<Self> {
        Arc::new(MethodRef {
            declaring_type,
            name: Arc::from(name),
            generic_args: Vec::new(),
            parameters,
            return_type,
            is_static: false,
        })
    }

    pub fn static_method(
        declaring_type: TypeRef,
        name: &str,
        parameters: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Arc<Self> {
        Arc::new(MethodRef {
            declaring_type,
            name: Arc::from(name),
            generic_args: Vec::new(),
            parameters,
            return_type,
            is_static: true,
        })
    }

    /// Closes a method over generic arguments.
    pub fn with_generic_args(mut self, generic_args: Vec<TypeRef>) -> Self {
        self.generic_args = generic_args;
        self
    }

    pub fn mentions(&self, ty: &TypeRef) -> bool {
        self.declaring_type.mentions(ty)
            || self.generic_args.iter().any(|a| a.mentions(ty))
            || self.parameters.iter().any(|p| p.mentions(ty))
            || self.return_type.mentions(ty)
    }

    /// The same method with `from` replaced by `to` throughout its signature.
    pub fn substitute(&self, from: &TypeRef, to: &TypeRef) -> MethodRef {
        MethodRef {
            declaring_type: self.declaring_type.substitute(from, to),
            name: Arc::clone(&self.name),
            generic_args: self.generic_args.iter().map(|a| a.substitute(from, to)).collect(),
            parameters: self.parameters.iter().map(|p| p.substitute(from, to)).collect(),
            return_type: self.return_type.substitute(from, to),
            is_static: self.is_static,
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)?;
        if !self.generic_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorRef {
    pub declaring_type: TypeRef,
    pub parameters: Vec<TypeRef>,
}

impl ConstructorRef {
    pub fn new(declaring_type: TypeRef, parameters: Vec<TypeRef>) -> Arc<Self> {
        Arc::new(ConstructorRef {
            declaring_type,
            parameters,
        })
    }

    pub fn mentions(&self, ty: &TypeRef) -> bool {
        self.declaring_type.mentions(ty) || self.parameters.iter().any(|p| p.mentions(ty))
    }

    pub fn substitute(&self, from: &TypeRef, to: &TypeRef) -> ConstructorRef {
        ConstructorRef {
            declaring_type: self.declaring_type.substitute(from, to),
            parameters: self.parameters.iter().map(|p| p.substitute(from, to)).collect(),
        }
    }
}
