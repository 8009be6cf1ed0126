//! Closure-configured rewriting engine.
//!
//! `RewriteRules` holds at most one override per node kind, per member-binding kind and
//! for element initializers. Kinds without an override are rebuilt structurally. An
//! override receives the rules themselves, so it can keep descending with the same
//! configuration or call into [`reconstruct`] to fall back to the structural rule.
//!
//! ```ignore
//! let rules = RewriteRules::new().on_constant(|_, c| {
//!     Ok(match *c.value {
//!         ConstantValue::Int(n) => ConstantExpr::new(ConstantValue::Int(n * 10), c.ty.clone()),
//!         _ => c.clone(),
//!     })
//! });
//! let scaled = rules.visit_node(&tree)?;
//! ```

use std::fmt;

use crate::error::Result;
use crate::ir::expr_node::{
    BinaryExpr, CallExpr, ConditionalExpr, ConstantExpr, ElementInit, InvocationExpr, LambdaExpr, ListInitExpr,
    MemberAssignment, MemberExpr, MemberInitExpr, MemberListBinding, MemberMemberBinding, NewArrayExpr, NewExpr,
    ParameterExpr, TypeTestExpr, UnaryExpr,
};
use crate::ir::visitor::{reconstruct, Visitor};

/// Override for one kind: receives the active rules and the original node.
pub type Rule<T> = Box<dyn Fn(&RewriteRules, &T) -> Result<T> + Send + Sync>;

macro_rules! rewrite_rules {
    ($($field:ident: $node:ty => $on:ident, $visit:ident, $fallback:path;)*) => {
        /// Per-kind override table implementing [`Visitor`].
        #[derive(Default)]
        pub struct RewriteRules {
            $($field: Option<Rule<$node>>,)*
        }

        impl RewriteRules {
            $(
                #[doc = concat!("Installs the override consulted by `", stringify!($visit), "`.")]
                pub fn $on<F>(mut self, rule: F) -> Self
                where
                    F: Fn(&RewriteRules, &$node) -> Result<$node> + Send + Sync + 'static,
                {
                    self.$field = Some(Box::new(rule));
                    self
                }
            )*

            /// Names of the kinds that currently carry an override.
            pub fn overridden(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(
                    if self.$field.is_some() {
                        names.push(stringify!($field));
                    }
                )*
                names
            }
        }

        impl Visitor for RewriteRules {
            $(
                fn $visit(&self, node: &$node) -> Result<$node> {
                    match &self.$field {
                        Some(rule) => rule(self, node),
                        None => $fallback(self, node),
                    }
                }
            )*
        }
    };
}

rewrite_rules! {
    unary: UnaryExpr => on_unary, visit_unary, reconstruct::unary;
    binary: BinaryExpr => on_binary, visit_binary, reconstruct::binary;
    type_test: TypeTestExpr => on_type_test, visit_type_test, reconstruct::type_test;
    conditional: ConditionalExpr => on_conditional, visit_conditional, reconstruct::conditional;
    constant: ConstantExpr => on_constant, visit_constant, reconstruct::constant;
    parameter: ParameterExpr => on_parameter, visit_parameter, reconstruct::parameter;
    member_access: MemberExpr => on_member_access, visit_member_access, reconstruct::member_access;
    call: CallExpr => on_call, visit_call, reconstruct::call;
    lambda: LambdaExpr => on_lambda, visit_lambda, reconstruct::lambda;
    new: NewExpr => on_new, visit_new, reconstruct::new;
    new_array: NewArrayExpr => on_new_array, visit_new_array, reconstruct::new_array;
    invocation: InvocationExpr => on_invocation, visit_invocation, reconstruct::invocation;
    member_init: MemberInitExpr => on_member_init, visit_member_init, reconstruct::member_init;
    list_init: ListInitExpr => on_list_init, visit_list_init, reconstruct::list_init;
    member_assignment: MemberAssignment => on_member_assignment, visit_member_assignment, reconstruct::member_assignment;
    member_member_binding: MemberMemberBinding => on_member_member_binding, visit_member_member_binding, reconstruct::member_member_binding;
    member_list_binding: MemberListBinding => on_member_list_binding, visit_member_list_binding, reconstruct::member_list_binding;
    element_init: ElementInit => on_element_init, visit_element_init, reconstruct::element_init;
}

impl RewriteRules {
    /// Rules with no overrides; behaves like a structural clone.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for RewriteRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRules")
            .field("overridden", &self.overridden())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ir::expr_node::{ConstantValue, Expr};
    use crate::ir::types::TypeRef;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_rules_are_send_sync() {
        assert_send_sync::<RewriteRules>();
    }

    #[test]
    fn test_no_overrides_clones_structurally() {
        let tree = Expr::add(Expr::int(1), Expr::int(2));
        let rebuilt = RewriteRules::new().visit_node(&tree).unwrap();
        assert_eq!(rebuilt, tree);
        assert!(!Arc::ptr_eq(&rebuilt, &tree));
    }

    #[test]
    fn test_constant_override_applies_everywhere() {
        let rules = RewriteRules::new().on_constant(|_, c| {
            Ok(match *c.value {
                ConstantValue::Int(n) => ConstantExpr::new(ConstantValue::Int(n * 10), c.ty.clone()),
                _ => c.clone(),
            })
        });
        let tree = Expr::add(Expr::int(1), Expr::negate(Expr::int(2)));
        let rebuilt = rules.visit_node(&tree).unwrap();
        assert_eq!(rebuilt, Expr::add(Expr::int(10), Expr::negate(Expr::int(20))));
    }

    #[test]
    fn test_override_can_fall_back_to_structural_rule() {
        let rules = RewriteRules::new().on_conditional(|rules, c| {
            let mut rebuilt = reconstruct::conditional(rules, c)?;
            std::mem::swap(&mut rebuilt.if_true, &mut rebuilt.if_false);
            rebuilt.test = Expr::not(rebuilt.test);
            Ok(rebuilt)
        });
        let tree = Expr::condition(Expr::boolean(true), Expr::int(1), Expr::int(2));
        let rebuilt = rules.visit_node(&tree).unwrap();
        assert_eq!(
            rebuilt,
            Expr::condition(Expr::not(Expr::boolean(true)), Expr::int(2), Expr::int(1))
        );
    }

    #[test]
    fn test_debug_lists_overridden_kinds() {
        let rules = RewriteRules::new()
            .on_parameter(|_, p| Ok(p.clone()))
            .on_element_init(|_, i| Ok(i.clone()));
        assert_eq!(rules.overridden(), vec!["parameter", "element_init"]);
        assert_eq!(
            format!("{rules:?}"),
            r#"RewriteRules { overridden: ["parameter", "element_init"] }"#
        );
    }

    #[test]
    fn test_later_override_replaces_earlier() {
        let rules = RewriteRules::new()
            .on_type_test(|_, _| Ok(TypeTestExpr::new(Expr::int(0), TypeRef::object())))
            .on_type_test(|rules, t| reconstruct::type_test(rules, t));
        let tree = Expr::type_is(Expr::string("a"), TypeRef::string());
        assert_eq!(rules.visit_node(&tree).unwrap(), tree);
    }
}
