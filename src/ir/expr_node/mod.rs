// Expression node model
//
// The immutable tree the rewriting engine consumes and produces:
//
// - node_types: Expr enum, per-kind node structs, member bindings, element initializers
// - node_impl: factory constructors and result-type derivation
// - node_operations: kind tags, child enumeration, read-only walks (depth, node count)

pub mod node_types;
pub mod node_impl;
pub mod node_operations;

pub use node_types::*;
pub use node_operations::{walk, KindCollector, NodeObserver};
