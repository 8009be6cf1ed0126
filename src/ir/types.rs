//! Type references carried by expression nodes.
//!
//! A `TypeRef` is a purely nominal description of a type: the engine never resolves
//! or checks it, it only preserves it across reconstruction and, for retargeting,
//! substitutes one type for another.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

static BOOLEAN: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("Boolean"));
static INT32: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("Int32"));
static INT64: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("Int64"));
static DOUBLE: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("Double"));
static STRING: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("String"));
static OBJECT: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("Object"));
static VOID: Lazy<TypeRef> = Lazy::new(|| TypeRef::named("Void"));

/// A reference to a (possibly generic, nullable, array or function) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A nominal type, optionally closed over generic arguments (e.g. `List<Int32>`).
    Named {
        name: Arc<str>,
        generic_args: Vec<TypeRef>,
    },
    /// A nullable wrapper around a value type (e.g. `Int32?`).
    Nullable { underlying: Box<TypeRef> },
    /// A single-dimensional array of `element`.
    Array { element: Box<TypeRef> },
    /// A delegate/function signature.
    Function {
        parameters: Vec<TypeRef>,
        returns: Box<TypeRef>,
    },
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: Arc::from(name),
            generic_args: Vec::new(),
        }
    }

    pub fn generic(name: &str, generic_args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: Arc::from(name),
            generic_args,
        }
    }

    pub fn nullable(underlying: TypeRef) -> Self {
        TypeRef::Nullable {
            underlying: Box::new(underlying),
        }
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array {
            element: Box::new(element),
        }
    }

    pub fn function(parameters: Vec<TypeRef>, returns: TypeRef) -> Self {
        TypeRef::Function {
            parameters,
            returns: Box::new(returns),
        }
    }

    pub fn boolean() -> Self {
        BOOLEAN.clone()
    }

    pub fn int32() -> Self {
        INT32.clone()
    }

    pub fn int64() -> Self {
        INT64.clone()
    }

    pub fn double() -> Self {
        DOUBLE.clone()
    }

    pub fn string() -> Self {
        STRING.clone()
    }

    pub fn object() -> Self {
        OBJECT.clone()
    }

    pub fn void() -> Self {
        VOID.clone()
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable { .. })
    }

    /// The wrapped type of a nullable, or `self` for anything else.
    pub fn non_nullable(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable { underlying } => underlying,
            other => other,
        }
    }

    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array { element } => Some(element),
            _ => None,
        }
    }

    /// Return type of a function type.
    pub fn return_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Function { returns, .. } => Some(returns),
            _ => None,
        }
    }

    /// True if `needle` occurs anywhere inside this type, including itself.
    pub fn mentions(&self, needle: &TypeRef) -> bool {
        if self == needle {
            return true;
        }
        match self {
            TypeRef::Named { generic_args, .. } => generic_args.iter().any(|a| a.mentions(needle)),
            TypeRef::Nullable { underlying } => underlying.mentions(needle),
            TypeRef::Array { element } => element.mentions(needle),
            TypeRef::Function { parameters, returns } => {
                parameters.iter().any(|p| p.mentions(needle)) || returns.mentions(needle)
            }
        }
    }

    /// Replaces every occurrence of `from` with `to`, at any nesting level.
    pub fn substitute(&self, from: &TypeRef, to: &TypeRef) -> TypeRef {
        if self == from {
            return to.clone();
        }
        match self {
            TypeRef::Named { name, generic_args } => TypeRef::Named {
                name: Arc::clone(name),
                generic_args: generic_args.iter().map(|a| a.substitute(from, to)).collect(),
            },
            TypeRef::Nullable { underlying } => TypeRef::nullable(underlying.substitute(from, to)),
            TypeRef::Array { element } => TypeRef::array(element.substitute(from, to)),
            TypeRef::Function { parameters, returns } => TypeRef::function(
                parameters.iter().map(|p| p.substitute(from, to)).collect(),
                returns.substitute(from, to),
            ),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, generic_args } => {
                write!(f, "{}", name)?;
                if !generic_args.is_empty() {
                    write!(f, "<")?;
                    write_separated(f, generic_args)?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Nullable { underlying } => write!(f, "{}?", underlying),
            TypeRef::Array { element } => write!(f, "{}[]", element),
            TypeRef::Function { parameters, returns } => {
                write!(f, "Func<")?;
                for parameter in parameters {
                    write!(f, "{}, ", parameter)?;
                }
                write!(f, "{}>", returns)
            }
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, types: &[TypeRef]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}
