//! Structural reconstruction rules, one per node kind.
//!
//! Every rule visits the node's children through the supplied visitor and rebuilds a
//! node of the same kind, carrying over every non-child property. These are what the
//! `Visitor` defaults call; overrides call them to fall back to plain cloning after doing
//! their own substitution.

use std::sync::Arc;

use super::Visitor;
use crate::error::Result;
use crate::ir::expr_node::{
    BinaryExpr, BinaryOperator, CallExpr, ConditionalExpr, ConstantExpr, ElementInit, ExprVector, InvocationExpr,
    LambdaExpr, ListInitExpr, MemberAssignment, MemberExpr, MemberInitExpr, MemberListBinding, MemberMemberBinding,
    NewArrayExpr, NewArrayKind, NewExpr, ParameterExpr, TypeTestExpr, UnaryExpr,
};

/// Visits each node of an ordered sequence, preserving order.
pub fn expressions<V: Visitor + ?Sized>(visitor: &V, nodes: &ExprVector) -> Result<ExprVector> {
    nodes.iter().map(|n| visitor.visit_node(n)).collect()
}

pub fn unary<V: Visitor + ?Sized>(visitor: &V, node: &UnaryExpr) -> Result<UnaryExpr> {
    let operand = visitor.visit_node(&node.operand)?;
    Ok(UnaryExpr {
        op: node.op,
        operand,
        ty: node.ty.clone(),
        method: node.method.clone(),
    })
}

/// Rebuilds a binary node.
///
/// A coalesce carrying a conversion is rebuilt with the coalesce-with-conversion form;
/// everything else, a plain coalesce included, goes through the generic form. The two
/// are not interchangeable: the generic form drops the conversion.
pub fn binary<V: Visitor + ?Sized>(visitor: &V, node: &BinaryExpr) -> Result<BinaryExpr> {
    let left = visitor.visit_node(&node.left)?;
    let right = visitor.visit_node(&node.right)?;
    let conversion = node.conversion().map(|c| visitor.visit_lambda(c)).transpose()?;
    match conversion {
        Some(conversion) if node.op == BinaryOperator::Coalesce => {
            Ok(BinaryExpr::coalesce_with_conversion(left, right, conversion))
        }
        _ => Ok(BinaryExpr::make(
            node.op,
            left,
            right,
            node.lifted_to_null,
            node.method.clone(),
        )),
    }
}

pub fn type_test<V: Visitor + ?Sized>(visitor: &V, node: &TypeTestExpr) -> Result<TypeTestExpr> {
    let operand = visitor.visit_node(&node.operand)?;
    Ok(TypeTestExpr::new(operand, node.type_operand.clone()))
}

pub fn conditional<V: Visitor + ?Sized>(visitor: &V, node: &ConditionalExpr) -> Result<ConditionalExpr> {
    let test = visitor.visit_node(&node.test)?;
    let if_true = visitor.visit_node(&node.if_true)?;
    let if_false = visitor.visit_node(&node.if_false)?;
    Ok(ConditionalExpr::new(test, if_true, if_false))
}

pub fn constant<V: Visitor + ?Sized>(_visitor: &V, node: &ConstantExpr) -> Result<ConstantExpr> {
    Ok(ConstantExpr::shared(Arc::clone(&node.value), node.ty.clone()))
}

pub fn parameter<V: Visitor + ?Sized>(_visitor: &V, node: &ParameterExpr) -> Result<ParameterExpr> {
    Ok(node.clone())
}

pub fn member_access<V: Visitor + ?Sized>(visitor: &V, node: &MemberExpr) -> Result<MemberExpr> {
    let object = visitor.visit(node.object.as_ref())?;
    Ok(MemberExpr::new(object, Arc::clone(&node.member)))
}

pub fn call<V: Visitor + ?Sized>(visitor: &V, node: &CallExpr) -> Result<CallExpr> {
    let object = visitor.visit(node.object.as_ref())?;
    let arguments = expressions(visitor, &node.arguments)?;
    Ok(CallExpr {
        object,
        method: Arc::clone(&node.method),
        arguments,
    })
}

/// Rebuilds a lambda. Parameters are visited before the body so that a substituting
/// visitor has settled every parameter before it meets references to them.
pub fn lambda<V: Visitor + ?Sized>(visitor: &V, node: &LambdaExpr) -> Result<LambdaExpr> {
    let parameters = node
        .parameters
        .iter()
        .map(|p| visitor.visit_parameter(p))
        .collect::<Result<Vec<_>>>()?;
    let body = visitor.visit_node(&node.body)?;
    Ok(LambdaExpr::new(node.delegate_type.clone(), parameters, body))
}

/// Rebuilds a constructor call, choosing the form by the presence of member correspondence.
pub fn new<V: Visitor + ?Sized>(visitor: &V, node: &NewExpr) -> Result<NewExpr> {
    let arguments = expressions(visitor, &node.arguments)?;
    let constructor = Arc::clone(&node.constructor);
    match node.members() {
        Some(members) => Ok(NewExpr::with_members(
            constructor,
            arguments.iter().cloned(),
            members.iter().cloned(),
        )),
        None => Ok(NewExpr::new(constructor, arguments.iter().cloned())),
    }
}

pub fn new_array<V: Visitor + ?Sized>(visitor: &V, node: &NewArrayExpr) -> Result<NewArrayExpr> {
    let expressions = expressions(visitor, &node.expressions)?;
    let element_type = node.element_type.clone();
    match node.kind {
        NewArrayKind::Init => Ok(NewArrayExpr::init(element_type, expressions.iter().cloned())),
        NewArrayKind::Bounds => Ok(NewArrayExpr::bounds(element_type, expressions.iter().cloned())),
    }
}

pub fn invocation<V: Visitor + ?Sized>(visitor: &V, node: &InvocationExpr) -> Result<InvocationExpr> {
    let target = visitor.visit_node(&node.target)?;
    let arguments = expressions(visitor, &node.arguments)?;
    Ok(InvocationExpr { target, arguments })
}

pub fn member_init<V: Visitor + ?Sized>(visitor: &V, node: &MemberInitExpr) -> Result<MemberInitExpr> {
    let new_expression = visitor.visit_new(&node.new_expression)?;
    let bindings = node
        .bindings
        .iter()
        .map(|b| visitor.visit_binding(b))
        .collect::<Result<Vec<_>>>()?;
    Ok(MemberInitExpr::new(new_expression, bindings))
}

pub fn list_init<V: Visitor + ?Sized>(visitor: &V, node: &ListInitExpr) -> Result<ListInitExpr> {
    let new_expression = visitor.visit_new(&node.new_expression)?;
    let initializers = node
        .initializers
        .iter()
        .map(|i| visitor.visit_element_init(i))
        .collect::<Result<Vec<_>>>()?;
    Ok(ListInitExpr::new(new_expression, initializers))
}

pub fn member_assignment<V: Visitor + ?Sized>(visitor: &V, binding: &MemberAssignment) -> Result<MemberAssignment> {
    let expression = visitor.visit_node(&binding.expression)?;
    Ok(MemberAssignment {
        member: Arc::clone(&binding.member),
        expression,
    })
}

pub fn member_member_binding<V: Visitor + ?Sized>(
    visitor: &V,
    binding: &MemberMemberBinding,
) -> Result<MemberMemberBinding> {
    let bindings = binding
        .bindings
        .iter()
        .map(|b| visitor.visit_binding(b))
        .collect::<Result<_>>()?;
    Ok(MemberMemberBinding {
        member: Arc::clone(&binding.member),
        bindings,
    })
}

pub fn member_list_binding<V: Visitor + ?Sized>(
    visitor: &V,
    binding: &MemberListBinding,
) -> Result<MemberListBinding> {
    let initializers = binding
        .initializers
        .iter()
        .map(|i| visitor.visit_element_init(i))
        .collect::<Result<_>>()?;
    Ok(MemberListBinding {
        member: Arc::clone(&binding.member),
        initializers,
    })
}

pub fn element_init<V: Visitor + ?Sized>(visitor: &V, initializer: &ElementInit) -> Result<ElementInit> {
    let arguments = expressions(visitor, &initializer.arguments)?;
    Ok(ElementInit {
        add_method: Arc::clone(&initializer.add_method),
        arguments,
    })
}
