//! Errors raised by the rewriting engine.
//!
//! The dispatch core has exactly two failure modes, both meaning the tree contains a
//! kind this engine was not built for. Components layered on top of the core
//! (pipelines, retargeting) define their own error types in their modules.

use thiserror::Error;

use crate::ir::expr_node::{ExtensionBinding, ExtensionExpr};

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The node dispatcher met a node kind outside the closed set it supports.
    #[error("unsupported expression node kind '{kind}' (model version {model_version})")]
    UnsupportedNodeKind { kind: String, model_version: u32 },

    /// The binding dispatcher met a member-binding kind outside the closed set it supports.
    #[error("unsupported member binding kind '{kind}' for member '{member}'")]
    UnsupportedBindingKind { kind: String, member: String },
}

impl TransformError {
    pub(crate) fn unsupported_node(node: &ExtensionExpr) -> Self {
        TransformError::UnsupportedNodeKind {
            kind: node.kind.to_string(),
            model_version: node.model_version,
        }
    }

    pub(crate) fn unsupported_binding(binding: &ExtensionBinding) -> Self {
        TransformError::UnsupportedBindingKind {
            kind: binding.kind.to_string(),
            member: binding.member.to_string(),
        }
    }
}
