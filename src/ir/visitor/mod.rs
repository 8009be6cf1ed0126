//! Visitor pattern for expression-tree rewriting
//!
//! The `Visitor` trait is the capability contract of the rewriting engine: one method
//! per node kind, per member-binding kind and for element initializers. Every method
//! has a default that rebuilds the node structurally, so an engine overrides only the
//! kinds whose reconstruction must differ.
//!
//! # Architecture
//!
//! - `visitor_trait`: the `Visitor` trait and the two dispatchers
//!   (`dispatch_node`, `dispatch_binding`)
//! - `reconstruct`: the structural reconstruction rule for each kind, as free
//!   functions an override can fall back to
//!
//! # Usage
//!
//! ```ignore
//! use expression_rewriter::ir::visitor::{reconstruct, Visitor};
//!
//! struct DropCustomOperators;
//!
//! impl Visitor for DropCustomOperators {
//!     fn visit_binary(&self, node: &BinaryExpr) -> Result<BinaryExpr> {
//!         let mut rebuilt = reconstruct::binary(self, node)?;
//!         rebuilt.method = None;
//!         Ok(rebuilt)
//!     }
//! }
//! ```
//!
//! # Pattern
//!
//! Each reconstruction rule:
//! 1. Visits every child, in evaluation order, through the visitor
//! 2. Rebuilds a node of the same kind with the visited children
//! 3. Carries over every non-child property (operator, lifting flag, references)

pub mod reconstruct;
mod visitor_trait;

pub use visitor_trait::{dispatch_binding, dispatch_node, Visitor};
