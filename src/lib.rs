//! Structural rewriting of typed expression trees.
//!
//! A tree of [`ir::expr_node::Expr`] nodes is rebuilt node by node by an engine
//! implementing [`ir::visitor::Visitor`]. Engines override only the kinds they change:
//! by implementing the trait, or by configuring [`ir::rules::RewriteRules`].

pub mod error;
pub mod ir;
pub mod logging;

pub use error::{Result, TransformError};
pub use ir::expr_node::Expr;
pub use ir::rules::RewriteRules;
pub use ir::transforms::{deep_clone, StructuralCloner};
pub use ir::visitor::Visitor;
