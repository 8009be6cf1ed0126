use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::ir::expr_node::Expr;
use crate::ir::visitor::Visitor;

/// The stock engine: every kind rebuilt by its structural rule.
///
/// The output is structurally equal to the input but owns fresh interior nodes, so
/// subtrees the input shared between several parents come out as separate copies.
/// Parameter leaves and constant values are the exceptions; both keep their identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralCloner;

impl Visitor for StructuralCloner {}

/// Rebuilds `expr` with [`StructuralCloner`].
pub fn deep_clone(expr: &Arc<Expr>) -> Result<Arc<Expr>> {
    let cloned = StructuralCloner.visit_node(expr)?;
    debug!(nodes = cloned.node_count(), "cloned expression tree");
    Ok(cloned)
}
