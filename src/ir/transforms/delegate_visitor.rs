//! Substitution driven by a caller-supplied function.
//!
//! The function sees every node before it is dispatched, outermost first. Returning a
//! replacement ends the descent into that subtree; returning `None` lets the node be
//! rebuilt structurally, which in turn offers each child to the function.
//!
//! Some nodes are held by value inside their parent and are rebuilt through the
//! kind-specific method rather than [`Visitor::visit_node`], so the function never
//! sees them:
//!
//! - lambda parameter lists ([`Visitor::visit_parameter`])
//! - the `New` node of an object or collection initializer ([`Visitor::visit_new`])
//! - the conversion lambda of a coalesce ([`Visitor::visit_lambda`])
//!
//! Their children are still offered. Replace parameter references in a body only if
//! the parameter list stays consistent, or use [`super::ParameterRenamer`].

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::ir::expr_node::Expr;
use crate::ir::visitor::{dispatch_node, Visitor};

pub struct DelegateVisitor<F> {
    delegate: F,
}

impl<F> DelegateVisitor<F>
where
    F: Fn(&Arc<Expr>) -> Option<Arc<Expr>>,
{
    pub fn new(delegate: F) -> Self {
        DelegateVisitor { delegate }
    }
}

impl<F> Visitor for DelegateVisitor<F>
where
    F: Fn(&Arc<Expr>) -> Option<Arc<Expr>>,
{
    fn visit_node(&self, node: &Arc<Expr>) -> Result<Arc<Expr>> {
        match (self.delegate)(node) {
            Some(replacement) => {
                debug!(from = ?node.kind(), to = ?replacement.kind(), "delegate replaced node");
                Ok(replacement)
            }
            None => dispatch_node(self, node),
        }
    }
}

/// Rewrites `expr`, replacing every node for which `delegate` returns a replacement.
pub fn rewrite_with<F>(expr: &Arc<Expr>, delegate: F) -> Result<Arc<Expr>>
where
    F: Fn(&Arc<Expr>) -> Option<Arc<Expr>>,
{
    DelegateVisitor::new(delegate).visit_node(expr)
}
