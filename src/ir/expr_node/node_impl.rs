use std::sync::Arc;

use super::super::members::{ConstructorRef, MemberRef, MethodRef};
use super::super::types::TypeRef;
use super::node_types::*;

impl BinaryOperator {
    /// Relational and equality operators, whose result is Boolean.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
                | BinaryOperator::Equal
                | BinaryOperator::NotEqual
        )
    }
}

impl UnaryExpr {
    pub fn new(op: UnaryOperator, operand: Arc<Expr>, ty: TypeRef) -> Self {
        UnaryExpr {
            op,
            operand,
            ty,
            method: None,
        }
    }

    /// Unary operation implemented by a user-defined operator method.
    pub fn with_method(op: UnaryOperator, operand: Arc<Expr>, ty: TypeRef, method: Arc<MethodRef>) -> Self {
        UnaryExpr {
            op,
            operand,
            ty,
            method: Some(method),
        }
    }
}

impl BinaryExpr {
    /// Generic constructor for every operator, `Coalesce` included.
    ///
    /// Never carries a conversion lambda: a coalesce that needs one must be built with
    /// [`BinaryExpr::coalesce_with_conversion`].
    pub fn make(
        op: BinaryOperator,
        left: Arc<Expr>,
        right: Arc<Expr>,
        lifted_to_null: bool,
        method: Option<Arc<MethodRef>>,
    ) -> Self {
        BinaryExpr {
            op,
            left,
            right,
            lifted_to_null,
            method,
            conversion: None,
        }
    }

    /// `left ?? right` where `left` is passed through `conversion` before being returned.
    pub fn coalesce_with_conversion(left: Arc<Expr>, right: Arc<Expr>, conversion: LambdaExpr) -> Self {
        BinaryExpr {
            op: BinaryOperator::Coalesce,
            left,
            right,
            lifted_to_null: false,
            method: None,
            conversion: Some(conversion),
        }
    }

    pub fn conversion(&self) -> Option<&LambdaExpr> {
        self.conversion.as_ref()
    }

    pub fn ty(&self) -> TypeRef {
        if let Some(conversion) = &self.conversion {
            return conversion
                .delegate_type
                .return_type()
                .cloned()
                .unwrap_or_else(|| conversion.body.ty());
        }
        if let Some(method) = &self.method {
            return method.return_type.clone();
        }
        match self.op {
            op if op.is_comparison() => {
                if self.lifted_to_null {
                    TypeRef::nullable(TypeRef::boolean())
                } else {
                    TypeRef::boolean()
                }
            }
            BinaryOperator::Coalesce => {
                let left = self.left.ty();
                let right = self.right.ty();
                if left.is_nullable() && !right.is_nullable() {
                    left.non_nullable().clone()
                } else {
                    right
                }
            }
            BinaryOperator::ArrayIndex => self
                .left
                .ty()
                .element_type()
                .cloned()
                .unwrap_or_else(TypeRef::object),
            _ => self.left.ty(),
        }
    }
}

impl TypeTestExpr {
    pub fn new(operand: Arc<Expr>, type_operand: TypeRef) -> Self {
        TypeTestExpr { operand, type_operand }
    }
}

impl ConditionalExpr {
    pub fn new(test: Arc<Expr>, if_true: Arc<Expr>, if_false: Arc<Expr>) -> Self {
        ConditionalExpr { test, if_true, if_false }
    }
}

impl ConstantExpr {
    pub fn new(value: ConstantValue, ty: TypeRef) -> Self {
        ConstantExpr {
            value: Arc::new(value),
            ty,
        }
    }

    /// Wraps an already shared value without copying it.
    pub fn shared(value: Arc<ConstantValue>, ty: TypeRef) -> Self {
        ConstantExpr { value, ty }
    }
}

impl ParameterExpr {
    /// Creates a parameter with a fresh identity.
    pub fn new(name: &str, ty: TypeRef) -> Self {
        ParameterExpr {
            id: ParameterId::fresh(),
            name: Arc::from(name),
            ty,
        }
    }

    /// A distinct parameter (fresh identity) with the same type and a new name.
    pub fn renamed(&self, name: &str) -> Self {
        ParameterExpr::new(name, self.ty.clone())
    }

    /// A distinct parameter (fresh identity) with the same name and a new type.
    pub fn retyped(&self, ty: TypeRef) -> Self {
        ParameterExpr {
            id: ParameterId::fresh(),
            name: Arc::clone(&self.name),
            ty,
        }
    }
}

impl MemberExpr {
    pub fn new(object: Option<Arc<Expr>>, member: Arc<MemberRef>) -> Self {
        MemberExpr { object, member }
    }
}

impl CallExpr {
    pub fn new(
        object: Option<Arc<Expr>>,
        method: Arc<MethodRef>,
        arguments: impl IntoIterator<Item = Arc<Expr>>,
    ) -> Self {
        CallExpr {
            object,
            method,
            arguments: arguments.into_iter().collect(),
        }
    }
}

impl LambdaExpr {
    pub fn new(
        delegate_type: TypeRef,
        parameters: impl IntoIterator<Item = ParameterExpr>,
        body: Arc<Expr>,
    ) -> Self {
        LambdaExpr {
            delegate_type,
            parameters: parameters.into_iter().collect(),
            body,
        }
    }

    /// Lambda whose delegate type is `Func<parameter types..., body type>`.
    pub fn infer(parameters: impl IntoIterator<Item = ParameterExpr>, body: Arc<Expr>) -> Self {
        let parameters: ParameterVector = parameters.into_iter().collect();
        let delegate_type = TypeRef::function(parameters.iter().map(|p| p.ty.clone()).collect(), body.ty());
        LambdaExpr {
            delegate_type,
            parameters,
            body,
        }
    }
}

impl NewExpr {
    /// Construction without member correspondence.
    pub fn new(constructor: Arc<ConstructorRef>, arguments: impl IntoIterator<Item = Arc<Expr>>) -> Self {
        NewExpr {
            constructor,
            arguments: arguments.into_iter().collect(),
            members: None,
        }
    }

    /// Construction where argument `i` initializes `members[i]`.
    ///
    /// # Panics
    /// If the number of members differs from the number of arguments.
    pub fn with_members(
        constructor: Arc<ConstructorRef>,
        arguments: impl IntoIterator<Item = Arc<Expr>>,
        members: impl IntoIterator<Item = Arc<MemberRef>>,
    ) -> Self {
        let arguments: ExprVector = arguments.into_iter().collect();
        let members: MemberVector = members.into_iter().collect();
        assert_eq!(
            arguments.len(),
            members.len(),
            "member correspondence must name exactly one member per constructor argument"
        );
        NewExpr {
            constructor,
            arguments,
            members: Some(members),
        }
    }

    pub fn members(&self) -> Option<&MemberVector> {
        self.members.as_ref()
    }

    pub fn has_member_correspondence(&self) -> bool {
        self.members.is_some()
    }

    pub fn ty(&self) -> TypeRef {
        self.constructor.declaring_type.clone()
    }
}

impl NewArrayExpr {
    pub fn init(element_type: TypeRef, elements: impl IntoIterator<Item = Arc<Expr>>) -> Self {
        NewArrayExpr {
            kind: NewArrayKind::Init,
            element_type,
            expressions: elements.into_iter().collect(),
        }
    }

    pub fn bounds(element_type: TypeRef, bounds: impl IntoIterator<Item = Arc<Expr>>) -> Self {
        NewArrayExpr {
            kind: NewArrayKind::Bounds,
            element_type,
            expressions: bounds.into_iter().collect(),
        }
    }
}

impl InvocationExpr {
    pub fn new(target: Arc<Expr>, arguments: impl IntoIterator<Item = Arc<Expr>>) -> Self {
        InvocationExpr {
            target,
            arguments: arguments.into_iter().collect(),
        }
    }
}

impl MemberInitExpr {
    pub fn new(new_expression: NewExpr, bindings: impl IntoIterator<Item = MemberBinding>) -> Self {
        MemberInitExpr {
            new_expression,
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl ListInitExpr {
    pub fn new(new_expression: NewExpr, initializers: impl IntoIterator<Item = ElementInit>) -> Self {
        ListInitExpr {
            new_expression,
            initializers: initializers.into_iter().collect(),
        }
    }
}

impl ExtensionExpr {
    pub fn new(kind: &str, model_version: u32, operands: impl IntoIterator<Item = Arc<Expr>>) -> Self {
        ExtensionExpr {
            kind: Arc::from(kind),
            model_version,
            operands: operands.into_iter().collect(),
        }
    }
}

impl ElementInit {
    pub fn new(add_method: Arc<MethodRef>, arguments: impl IntoIterator<Item = Arc<Expr>>) -> Self {
        ElementInit {
            add_method,
            arguments: arguments.into_iter().collect(),
        }
    }
}

impl MemberBinding {
    pub fn assign(member: Arc<MemberRef>, expression: Arc<Expr>) -> Self {
        MemberBinding::Assignment(MemberAssignment { member, expression })
    }

    pub fn member_bind(member: Arc<MemberRef>, bindings: impl IntoIterator<Item = MemberBinding>) -> Self {
        MemberBinding::MemberBinding(MemberMemberBinding {
            member,
            bindings: bindings.into_iter().collect(),
        })
    }

    pub fn list_bind(member: Arc<MemberRef>, initializers: impl IntoIterator<Item = ElementInit>) -> Self {
        MemberBinding::ListBinding(MemberListBinding {
            member,
            initializers: initializers.into_iter().collect(),
        })
    }

    pub fn member(&self) -> &Arc<MemberRef> {
        match self {
            MemberBinding::Assignment(b) => &b.member,
            MemberBinding::MemberBinding(b) => &b.member,
            MemberBinding::ListBinding(b) => &b.member,
            MemberBinding::Extension(b) => &b.member,
        }
    }

    pub fn kind(&self) -> BindingKind {
        match self {
            MemberBinding::Assignment(_) => BindingKind::Assignment,
            MemberBinding::MemberBinding(_) => BindingKind::MemberBinding,
            MemberBinding::ListBinding(_) => BindingKind::ListBinding,
            MemberBinding::Extension(_) => BindingKind::Extension,
        }
    }
}

/// Shorthand constructors returning shared nodes, used when assembling trees by hand.
impl Expr {
    pub fn unary(op: UnaryOperator, operand: Arc<Expr>, ty: TypeRef) -> Arc<Expr> {
        Arc::new(Expr::Unary(UnaryExpr::new(op, operand, ty)))
    }

    pub fn negate(operand: Arc<Expr>) -> Arc<Expr> {
        let ty = operand.ty();
        Expr::unary(UnaryOperator::Negate, operand, ty)
    }

    pub fn not(operand: Arc<Expr>) -> Arc<Expr> {
        let ty = operand.ty();
        Expr::unary(UnaryOperator::Not, operand, ty)
    }

    pub fn convert(operand: Arc<Expr>, ty: TypeRef) -> Arc<Expr> {
        Expr::unary(UnaryOperator::Convert, operand, ty)
    }

    pub fn binary(op: BinaryOperator, left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Binary(BinaryExpr::make(op, left, right, false, None)))
    }

    pub fn add(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Expr::binary(BinaryOperator::Add, left, right)
    }

    pub fn equal(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Expr::binary(BinaryOperator::Equal, left, right)
    }

    pub fn coalesce(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Expr::binary(BinaryOperator::Coalesce, left, right)
    }

    pub fn type_is(operand: Arc<Expr>, ty: TypeRef) -> Arc<Expr> {
        Arc::new(Expr::TypeTest(TypeTestExpr::new(operand, ty)))
    }

    pub fn condition(test: Arc<Expr>, if_true: Arc<Expr>, if_false: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Conditional(ConditionalExpr::new(test, if_true, if_false)))
    }

    pub fn constant(value: ConstantValue, ty: TypeRef) -> Arc<Expr> {
        Arc::new(Expr::Constant(ConstantExpr::new(value, ty)))
    }

    pub fn int(value: i64) -> Arc<Expr> {
        Expr::constant(ConstantValue::Int(value), TypeRef::int32())
    }

    pub fn boolean(value: bool) -> Arc<Expr> {
        Expr::constant(ConstantValue::Bool(value), TypeRef::boolean())
    }

    pub fn string(value: &str) -> Arc<Expr> {
        Expr::constant(ConstantValue::Str(Arc::from(value)), TypeRef::string())
    }

    pub fn null(ty: TypeRef) -> Arc<Expr> {
        Expr::constant(ConstantValue::Null, ty)
    }

    pub fn parameter(parameter: &ParameterExpr) -> Arc<Expr> {
        Arc::new(Expr::Parameter(parameter.clone()))
    }

    pub fn property(object: Arc<Expr>, member: Arc<MemberRef>) -> Arc<Expr> {
        Arc::new(Expr::MemberAccess(MemberExpr::new(Some(object), member)))
    }

    pub fn static_member(member: Arc<MemberRef>) -> Arc<Expr> {
        Arc::new(Expr::MemberAccess(MemberExpr::new(None, member)))
    }

    pub fn call(
        object: Option<Arc<Expr>>,
        method: Arc<MethodRef>,
        arguments: impl IntoIterator<Item = Arc<Expr>>,
    ) -> Arc<Expr> {
        Arc::new(Expr::Call(CallExpr::new(object, method, arguments)))
    }

    pub fn lambda(parameters: impl IntoIterator<Item = ParameterExpr>, body: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Lambda(LambdaExpr::infer(parameters, body)))
    }

    pub fn new_object(constructor: Arc<ConstructorRef>, arguments: impl IntoIterator<Item = Arc<Expr>>) -> Arc<Expr> {
        Arc::new(Expr::New(NewExpr::new(constructor, arguments)))
    }

    pub fn invoke(target: Arc<Expr>, arguments: impl IntoIterator<Item = Arc<Expr>>) -> Arc<Expr> {
        Arc::new(Expr::Invoke(InvocationExpr::new(target, arguments)))
    }

    /// Static result type of the node, derived from its properties; never checked.
    pub fn ty(&self) -> TypeRef {
        match self {
            Expr::Unary(e) => e.ty.clone(),
            Expr::Binary(e) => e.ty(),
            Expr::TypeTest(_) => TypeRef::boolean(),
            Expr::Conditional(e) => e.if_true.ty(),
            Expr::Constant(e) => e.ty.clone(),
            Expr::Parameter(e) => e.ty.clone(),
            Expr::MemberAccess(e) => e.member.member_type.clone(),
            Expr::Call(e) => e.method.return_type.clone(),
            Expr::Lambda(e) => e.delegate_type.clone(),
            Expr::New(e) => e.ty(),
            Expr::NewArray(e) => TypeRef::array(e.element_type.clone()),
            Expr::Invoke(e) => e.target.ty().return_type().cloned().unwrap_or_else(TypeRef::object),
            Expr::MemberInit(e) => e.new_expression.ty(),
            Expr::ListInit(e) => e.new_expression.ty(),
            Expr::Extension(_) => TypeRef::object(),
        }
    }
}
