use std::sync::Arc;

use tracing::trace;

use super::reconstruct;
use crate::error::{Result, TransformError};
use crate::ir::expr_node::{
    BinaryExpr, CallExpr, ConditionalExpr, ConstantExpr, ElementInit, Expr, InvocationExpr, LambdaExpr,
    ListInitExpr, MemberAssignment, MemberBinding, MemberExpr, MemberInitExpr, MemberListBinding,
    MemberMemberBinding, NewArrayExpr, NewExpr, ParameterExpr, TypeTestExpr, UnaryExpr,
};

/// Traverses an expression tree and rebuilds it node by node.
///
/// Each per-kind method receives the node and returns a node of the same kind, which
/// makes kind preservation a property of the signatures. Default implementations apply
/// the structural rules in [`reconstruct`]. Implementors typically override a handful of
/// methods and leave `visit_node` and `visit_binding` alone.
///
/// Visitors take `&self`: an engine with no interior state can be shared between threads
/// and used for many independent rewrites. Engines that need memo tables keep them behind
/// a lock.
///
/// Recursion depth equals the depth of the input tree (see [`Expr::depth`]); no limit is
/// enforced here.
pub trait Visitor {
    /// Entry point accepting an optional node: absent in, absent out.
    fn visit(&self, node: Option<&Arc<Expr>>) -> Result<Option<Arc<Expr>>> {
        node.map(|n| self.visit_node(n)).transpose()
    }

    /// Dispatches to the kind-specific method.
    ///
    /// # Errors
    /// [`TransformError::UnsupportedNodeKind`] for an [`Expr::Extension`] node, wherever it
    /// occurs in the tree.
    fn visit_node(&self, node: &Arc<Expr>) -> Result<Arc<Expr>> {
        dispatch_node(self, node)
    }

    /// Dispatches a member binding to the binding-kind-specific method.
    ///
    /// # Errors
    /// [`TransformError::UnsupportedBindingKind`] for a [`MemberBinding::Extension`].
    fn visit_binding(&self, binding: &MemberBinding) -> Result<MemberBinding> {
        dispatch_binding(self, binding)
    }

    /// Visits a unary node (negation, logical not, casts, array length, quote).
    ///
    /// # Returns
    /// A unary node with the same operator, result type and operator method.
    ///
    /// # Examples
    /// For `Convert(x, Int64)`, visits `x` and keeps `Int64` as the target type.
    fn visit_unary(&self, node: &UnaryExpr) -> Result<UnaryExpr> {
        reconstruct::unary(self, node)
    }

    /// Visits a binary node, its optional coalesce conversion included.
    ///
    /// # Returns
    /// A binary node with the same operator, lifting flag and operator method. A coalesce
    /// with a conversion stays a coalesce with a conversion.
    ///
    /// # Examples
    /// For `(a ?? b)` converted by `x => x`, visits `a`, `b` and the conversion lambda.
    fn visit_binary(&self, node: &BinaryExpr) -> Result<BinaryExpr> {
        reconstruct::binary(self, node)
    }

    /// Visits a type test (`x is T`).
    fn visit_type_test(&self, node: &TypeTestExpr) -> Result<TypeTestExpr> {
        reconstruct::type_test(self, node)
    }

    /// Visits a conditional, test first, then the true branch, then the false branch.
    fn visit_conditional(&self, node: &ConditionalExpr) -> Result<ConditionalExpr> {
        reconstruct::conditional(self, node)
    }

    /// Visits a constant. The held value is shared, never copied.
    fn visit_constant(&self, node: &ConstantExpr) -> Result<ConstantExpr> {
        reconstruct::constant(self, node)
    }

    /// Visits a parameter reference.
    ///
    /// # Returns
    /// The parameter unchanged by default. Override to substitute parameters; the override
    /// is consulted for lambda parameter lists and for references in lambda bodies alike.
    fn visit_parameter(&self, node: &ParameterExpr) -> Result<ParameterExpr> {
        reconstruct::parameter(self, node)
    }

    /// Visits a field or property access; the target object is absent for static members.
    fn visit_member_access(&self, node: &MemberExpr) -> Result<MemberExpr> {
        reconstruct::member_access(self, node)
    }

    /// Visits a method call: target object (if any), then each argument in order.
    fn visit_call(&self, node: &CallExpr) -> Result<CallExpr> {
        reconstruct::call(self, node)
    }

    /// Visits a lambda: every parameter first, then the body.
    fn visit_lambda(&self, node: &LambdaExpr) -> Result<LambdaExpr> {
        reconstruct::lambda(self, node)
    }

    /// Visits a constructor invocation, keeping member correspondence if present.
    fn visit_new(&self, node: &NewExpr) -> Result<NewExpr> {
        reconstruct::new(self, node)
    }

    fn visit_new_array(&self, node: &NewArrayExpr) -> Result<NewArrayExpr> {
        reconstruct::new_array(self, node)
    }

    fn visit_invocation(&self, node: &InvocationExpr) -> Result<InvocationExpr> {
        reconstruct::invocation(self, node)
    }

    /// Visits an object initializer: the underlying `New`, then each binding through
    /// [`Visitor::visit_binding`].
    fn visit_member_init(&self, node: &MemberInitExpr) -> Result<MemberInitExpr> {
        reconstruct::member_init(self, node)
    }

    /// Visits a collection initializer: the underlying `New`, then each element initializer.
    fn visit_list_init(&self, node: &ListInitExpr) -> Result<ListInitExpr> {
        reconstruct::list_init(self, node)
    }

    fn visit_member_assignment(&self, binding: &MemberAssignment) -> Result<MemberAssignment> {
        reconstruct::member_assignment(self, binding)
    }

    fn visit_member_member_binding(&self, binding: &MemberMemberBinding) -> Result<MemberMemberBinding> {
        reconstruct::member_member_binding(self, binding)
    }

    fn visit_member_list_binding(&self, binding: &MemberListBinding) -> Result<MemberListBinding> {
        reconstruct::member_list_binding(self, binding)
    }

    fn visit_element_init(&self, initializer: &ElementInit) -> Result<ElementInit> {
        reconstruct::element_init(self, initializer)
    }
}

/// The node dispatcher behind [`Visitor::visit_node`].
///
/// Exposed so that an engine overriding `visit_node` (to look at every node before it is
/// dispatched) can still hand the node to the kind-specific methods.
pub fn dispatch_node<V: Visitor + ?Sized>(visitor: &V, node: &Arc<Expr>) -> Result<Arc<Expr>> {
    trace!(kind = ?node.kind(), "dispatching node");
    let rebuilt = match &**node {
        Expr::Unary(e) => Expr::Unary(visitor.visit_unary(e)?),
        Expr::Binary(e) => Expr::Binary(visitor.visit_binary(e)?),
        Expr::TypeTest(e) => Expr::TypeTest(visitor.visit_type_test(e)?),
        Expr::Conditional(e) => Expr::Conditional(visitor.visit_conditional(e)?),
        Expr::Constant(e) => Expr::Constant(visitor.visit_constant(e)?),
        Expr::Parameter(e) => {
            let visited = visitor.visit_parameter(e)?;
            // Leaves without substitution go back as the very same node.
            if visited == *e {
                return Ok(Arc::clone(node));
            }
            Expr::Parameter(visited)
        }
        Expr::MemberAccess(e) => Expr::MemberAccess(visitor.visit_member_access(e)?),
        Expr::Call(e) => Expr::Call(visitor.visit_call(e)?),
        Expr::Lambda(e) => Expr::Lambda(visitor.visit_lambda(e)?),
        Expr::New(e) => Expr::New(visitor.visit_new(e)?),
        Expr::NewArray(e) => Expr::NewArray(visitor.visit_new_array(e)?),
        Expr::Invoke(e) => Expr::Invoke(visitor.visit_invocation(e)?),
        Expr::MemberInit(e) => Expr::MemberInit(visitor.visit_member_init(e)?),
        Expr::ListInit(e) => Expr::ListInit(visitor.visit_list_init(e)?),
        Expr::Extension(e) => return Err(TransformError::unsupported_node(e)),
    };
    Ok(Arc::new(rebuilt))
}

/// The binding dispatcher behind [`Visitor::visit_binding`].
pub fn dispatch_binding<V: Visitor + ?Sized>(visitor: &V, binding: &MemberBinding) -> Result<MemberBinding> {
    match binding {
        MemberBinding::Assignment(b) => Ok(MemberBinding::Assignment(visitor.visit_member_assignment(b)?)),
        MemberBinding::MemberBinding(b) => Ok(MemberBinding::MemberBinding(visitor.visit_member_member_binding(b)?)),
        MemberBinding::ListBinding(b) => Ok(MemberBinding::ListBinding(visitor.visit_member_list_binding(b)?)),
        MemberBinding::Extension(b) => Err(TransformError::unsupported_binding(b)),
    }
}
