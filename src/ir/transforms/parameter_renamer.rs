use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::Result;
use crate::ir::expr_node::{Expr, LambdaExpr, MemberBinding, ParameterExpr, ParameterId};
use crate::ir::visitor::Visitor;

/// Replaces parameters by name with freshly created parameters.
///
/// Each original parameter identity maps to exactly one replacement within a rewrite:
/// the lambda's parameter list is visited first and creates it, and every reference in
/// the body resolves to the same replacement. Parameters whose name is not in the
/// rename table are kept.
///
/// The renamer itself only holds the rename table. Every call through [`Visitor`] (or
/// [`ParameterRenamer::rename`]) runs in its own scope, so one renamer can be
/// applied to any number of trees without accumulating state.
pub struct ParameterRenamer {
    renames: FxHashMap<Arc<str>, Arc<str>>,
}

/// Output of [`ParameterRenamer::rename`].
#[derive(Debug)]
pub struct Renamed {
    pub tree: Arc<Expr>,
    /// original parameter identity -> replacement
    pub replacements: FxHashMap<ParameterId, ParameterExpr>,
}

impl Renamed {
    pub fn replacement_for(&self, original: ParameterId) -> Option<&ParameterExpr> {
        self.replacements.get(&original)
    }
}

impl ParameterRenamer {
    pub fn new<I, A, B>(renames: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        ParameterRenamer {
            renames: renames
                .into_iter()
                .map(|(from, to)| (Arc::from(from.as_ref()), Arc::from(to.as_ref())))
                .collect(),
        }
    }

    /// Renames one tree and reports the replacements it made.
    pub fn rename(&self, tree: &Arc<Expr>) -> Result<Renamed> {
        let scope = self.scope();
        let tree = scope.visit_node(tree)?;
        Ok(Renamed {
            tree,
            replacements: scope.substituted.into_inner(),
        })
    }

    fn scope(&self) -> RenameScope<'_> {
        RenameScope {
            renames: &self.renames,
            substituted: RefCell::new(FxHashMap::default()),
        }
    }
}

impl Visitor for ParameterRenamer {
    fn visit_node(&self, node: &Arc<Expr>) -> Result<Arc<Expr>> {
        self.scope().visit_node(node)
    }

    fn visit_binding(&self, binding: &MemberBinding) -> Result<MemberBinding> {
        self.scope().visit_binding(binding)
    }

    fn visit_lambda(&self, node: &LambdaExpr) -> Result<LambdaExpr> {
        self.scope().visit_lambda(node)
    }

    fn visit_parameter(&self, node: &ParameterExpr) -> Result<ParameterExpr> {
        self.scope().visit_parameter(node)
    }
}

/// One rewrite's worth of renaming state, dropped when the rewrite ends.
struct RenameScope<'a> {
    renames: &'a FxHashMap<Arc<str>, Arc<str>>,
    substituted: RefCell<FxHashMap<ParameterId, ParameterExpr>>,
}

impl Visitor for RenameScope<'_> {
    fn visit_parameter(&self, node: &ParameterExpr) -> Result<ParameterExpr> {
        let Some(new_name) = self.renames.get(&node.name) else {
            return Ok(node.clone());
        };
        let mut substituted = self.substituted.borrow_mut();
        let replacement = substituted.entry(node.id).or_insert_with(|| {
            let replacement = node.renamed(new_name);
            debug!(
                from = %node.name,
                to = %replacement.name,
                id = replacement.id.value(),
                "renamed parameter"
            );
            replacement
        });
        Ok(replacement.clone())
    }
}
