use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use archery::ArcK;
use rpds::Vector;

use super::super::members::{ConstructorRef, MemberRef, MethodRef};
use super::super::types::TypeRef;

pub type ExprVector = Vector<Arc<Expr>, ArcK>;
pub type ParameterVector = Vector<ParameterExpr, ArcK>;
pub type MemberVector = Vector<Arc<MemberRef>, ArcK>;
pub type BindingVector = Vector<MemberBinding, ArcK>;
pub type ElementInitVector = Vector<ElementInit, ArcK>;

/// The closed set of expression node kinds.
///
/// Each variant wraps a kind-specific struct. `Extension` stands for a kind introduced
/// by a newer revision of the model; no engine in this crate knows how to rebuild it.
///
/// # Examples
/// - Binary: `(x + 1)`
/// - MemberAccess: `p.Name`
/// - Lambda: `x => (x + 1)`
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    TypeTest(TypeTestExpr),
    Conditional(ConditionalExpr),
    Constant(ConstantExpr),
    Parameter(ParameterExpr),
    MemberAccess(MemberExpr),
    Call(CallExpr),
    Lambda(LambdaExpr),
    New(NewExpr),
    NewArray(NewArrayExpr),
    Invoke(InvocationExpr),
    MemberInit(MemberInitExpr),
    ListInit(ListInitExpr),
    Extension(ExtensionExpr),
}

/// Kind tag of an [`Expr`], used for diagnostics and kind-preservation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Unary,
    Binary,
    TypeTest,
    Conditional,
    Constant,
    Parameter,
    MemberAccess,
    Call,
    Lambda,
    New,
    NewArray,
    Invoke,
    MemberInit,
    ListInit,
    Extension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    NegateChecked,
    Not,
    Convert,
    ConvertChecked,
    ArrayLength,
    Quote,
    TypeAs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    Multiply,
    MultiplyChecked,
    Divide,
    Modulo,
    And,
    AndAlso,
    Or,
    OrElse,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Coalesce,
    ArrayIndex,
    RightShift,
    LeftShift,
    ExclusiveOr,
}

/// Unary operation, including casts (`Convert`, `TypeAs`) whose `ty` is the target type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub operand: Arc<Expr>,
    pub ty: TypeRef,
    pub method: Option<Arc<MethodRef>>,
}

/// Binary operation.
///
/// `conversion` is only ever populated on `Coalesce` nodes built with
/// [`BinaryExpr::coalesce_with_conversion`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOperator,
    pub left: Arc<Expr>,
    pub right: Arc<Expr>,
    pub lifted_to_null: bool,
    pub method: Option<Arc<MethodRef>>,
    pub(crate) conversion: Option<LambdaExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeTestExpr {
    pub operand: Arc<Expr>,
    pub type_operand: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub test: Arc<Expr>,
    pub if_true: Arc<Expr>,
    pub if_false: Arc<Expr>,
}

/// Opaque constant payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// A host object the tree only refers to (e.g. a query source).
    Opaque(Arc<str>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: Arc<ConstantValue>,
    pub ty: TypeRef,
}

/// Process-unique identity of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(u64);

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

impl ParameterId {
    pub(crate) fn fresh() -> Self {
        ParameterId(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A named, typed parameter. Two parameters with the same name and type but
/// different ids are different parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterExpr {
    pub id: ParameterId,
    pub name: Arc<str>,
    pub ty: TypeRef,
}

/// Field or property access. `object` is `None` for static members.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Option<Arc<Expr>>,
    pub member: Arc<MemberRef>,
}

/// Method call. `object` is `None` for static methods.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub object: Option<Arc<Expr>>,
    pub method: Arc<MethodRef>,
    pub arguments: ExprVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub delegate_type: TypeRef,
    pub parameters: ParameterVector,
    pub body: Arc<Expr>,
}

/// Constructor invocation. `members`, when present, names the member each argument
/// initializes (anonymous-record style construction).
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub constructor: Arc<ConstructorRef>,
    pub arguments: ExprVector,
    pub(crate) members: Option<MemberVector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewArrayKind {
    /// `new T[] { a, b, c }`
    Init,
    /// `new T[n]`
    Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArrayExpr {
    pub kind: NewArrayKind,
    pub element_type: TypeRef,
    pub expressions: ExprVector,
}

/// Invocation of a delegate-valued expression.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationExpr {
    pub target: Arc<Expr>,
    pub arguments: ExprVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInitExpr {
    pub new_expression: NewExpr,
    pub bindings: BindingVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListInitExpr {
    pub new_expression: NewExpr,
    pub initializers: ElementInitVector,
}

/// Node kind from a newer model revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionExpr {
    pub kind: Arc<str>,
    pub model_version: u32,
    pub operands: ExprVector,
}

/// An add-method call populating a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub add_method: Arc<MethodRef>,
    pub arguments: ExprVector,
}

/// How one member of a constructed object is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberBinding {
    /// `Member = expression`
    Assignment(MemberAssignment),
    /// `Member = { Nested = ..., ... }`
    MemberBinding(MemberMemberBinding),
    /// `Member = { Add(...), ... }`
    ListBinding(MemberListBinding),
    /// Binding kind from a newer model revision.
    Extension(ExtensionBinding),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Assignment,
    MemberBinding,
    ListBinding,
    Extension,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAssignment {
    pub member: Arc<MemberRef>,
    pub expression: Arc<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberMemberBinding {
    pub member: Arc<MemberRef>,
    pub bindings: BindingVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberListBinding {
    pub member: Arc<MemberRef>,
    pub initializers: ElementInitVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionBinding {
    pub kind: Arc<str>,
    pub member: Arc<MemberRef>,
}
