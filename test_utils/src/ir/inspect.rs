//! Fallible accessors for asserting on the shape of rewritten trees.
//!
//! Tests returning `anyhow::Result<()>` can walk into a tree with `?` and get a message
//! naming the kind that was found instead of the one expected.

use anyhow::{bail, Result};
use expression_rewriter::ir::expr_node::{
    BinaryExpr, CallExpr, ConstantExpr, Expr, LambdaExpr, MemberExpr, MemberInitExpr, NewExpr, ParameterExpr,
};

macro_rules! accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(expr: &Expr) -> Result<&$ty> {
            match expr {
                Expr::$variant(node) => Ok(node),
                other => bail!(
                    "expected {} node, found {:?}: {}",
                    stringify!($variant),
                    other.kind(),
                    other
                ),
            }
        }
    };
}

accessor!(as_binary, Binary, BinaryExpr);
accessor!(as_call, Call, CallExpr);
accessor!(as_constant, Constant, ConstantExpr);
accessor!(as_lambda, Lambda, LambdaExpr);
accessor!(as_member, MemberAccess, MemberExpr);
accessor!(as_member_init, MemberInit, MemberInitExpr);
accessor!(as_new, New, NewExpr);
accessor!(as_parameter, Parameter, ParameterExpr);
