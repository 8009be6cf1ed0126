//! Retargeting of expression trees from one shape to another.
//!
//! A query written against an interface shape (`IProduct`) can be moved onto a concrete
//! shape (`Product`) exposing the same member names. The retargeter rewrites every
//! place the tree mentions the source type:
//!
//! - parameters typed with it (fresh parameters, one per original identity)
//! - member accesses and member bindings declared on it
//! - the type of members declared elsewhere (`Order.Product: IProduct`)
//! - method, constructor and add-method signatures, generic arguments included
//! - lambda delegate types, cast targets, type-test operands, array element types
//!
//! Constants are left as they are, including query sources. After retargeting
//! `Queryable.Where<IProduct>(products, p => ...)` the call reads `Where<Product>` while
//! `products` is still an `IQueryable<IProduct>`: the tree is not type-consistent until
//! the caller swaps the source for one of the target shape.
//!
//! Fresh parameters are memoized per rewrite. Each call through [`Visitor`] starts from
//! an empty table, so one retargeter can serve any number of independent trees.

use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ir::expr_node::{
    BinaryExpr, CallExpr, ElementInit, Expr, LambdaExpr, MemberAssignment, MemberBinding, MemberExpr,
    MemberListBinding, MemberMemberBinding, NewArrayExpr, NewExpr, ParameterExpr, ParameterId, TypeTestExpr,
    UnaryExpr,
};
use crate::ir::members::{ConstructorRef, MemberRef, MethodRef};
use crate::ir::types::TypeRef;
use crate::ir::visitor::{reconstruct, Visitor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetargetError {
    #[error("target shape '{target}' has no member named '{member}'")]
    MissingMember { member: String, target: String },
}

/// A type together with the members a tree may access on it.
#[derive(Debug, Clone)]
pub struct Shape {
    pub ty: TypeRef,
    pub members: Vec<Arc<MemberRef>>,
}

impl Shape {
    pub fn new(ty: TypeRef, members: impl IntoIterator<Item = Arc<MemberRef>>) -> Self {
        Shape {
            ty,
            members: members.into_iter().collect(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&Arc<MemberRef>> {
        self.members.iter().find(|m| &*m.name == name)
    }
}

pub struct MemberRetargeter {
    from: TypeRef,
    to: TypeRef,
    members: FxHashMap<Arc<str>, Arc<MemberRef>>,
}

impl MemberRetargeter {
    /// Builds a retargeter from `from` onto `to`.
    ///
    /// # Errors
    /// [`RetargetError::MissingMember`] if `to` lacks a member `from` declares.
    pub fn new(from: &Shape, to: &Shape) -> std::result::Result<Self, RetargetError> {
        let members: FxHashMap<Arc<str>, Arc<MemberRef>> = from
            .members
            .iter()
            .map(|member| {
                to.member(&member.name)
                    .map(|target| (Arc::clone(&member.name), Arc::clone(target)))
                    .ok_or_else(|| RetargetError::MissingMember {
                        member: member.name.to_string(),
                        target: to.ty.to_string(),
                    })
            })
            .collect::<std::result::Result<_, RetargetError>>()?;

        Ok(MemberRetargeter {
            from: from.ty.clone(),
            to: to.ty.clone(),
            members,
        })
    }

    fn retype(&self, ty: &TypeRef) -> TypeRef {
        ty.substitute(&self.from, &self.to)
    }

    fn member(&self, member: &Arc<MemberRef>) -> Arc<MemberRef> {
        if member.declaring_type != self.from {
            if !member.declaring_type.mentions(&self.from) && !member.member_type.mentions(&self.from) {
                return Arc::clone(member);
            }
            return Arc::new(MemberRef {
                declaring_type: self.retype(&member.declaring_type),
                member_type: self.retype(&member.member_type),
                ..(**member).clone()
            });
        }
        match self.members.get(&member.name) {
            Some(target) => Arc::clone(target),
            None => {
                warn!(member = %member, target = %self.to, "member missing from source shape; left unchanged");
                Arc::clone(member)
            }
        }
    }

    fn method(&self, method: &Arc<MethodRef>) -> Arc<MethodRef> {
        if method.mentions(&self.from) {
            Arc::new(method.substitute(&self.from, &self.to))
        } else {
            Arc::clone(method)
        }
    }

    fn constructor(&self, constructor: &Arc<ConstructorRef>) -> Arc<ConstructorRef> {
        if constructor.mentions(&self.from) {
            Arc::new(constructor.substitute(&self.from, &self.to))
        } else {
            Arc::clone(constructor)
        }
    }

    fn scope(&self) -> RetargetScope<'_> {
        RetargetScope {
            retargeter: self,
            parameters: RefCell::new(FxHashMap::default()),
        }
    }
}

impl Visitor for MemberRetargeter {
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

/// State of a single retargeting rewrite.
struct RetargetScope<'a> {
    retargeter: &'a MemberRetargeter,
    /// original parameter identity -> retyped parameter
    parameters: RefCell<FxHashMap<ParameterId, ParameterExpr>>,
}

impl Visitor for RetargetScope<'_> {
    fn visit_parameter(&self, node: &ParameterExpr) -> Result<ParameterExpr> {
        if !node.ty.mentions(&self.retargeter.from) {
            return Ok(node.clone());
        }
        let mut parameters = self.parameters.borrow_mut();
        let replacement = parameters.entry(node.id).or_insert_with(|| {
            let replacement = node.retyped(self.retargeter.retype(&node.ty));
            debug!(name = %node.name, from = %node.ty, to = %replacement.ty, "retyped parameter");
            replacement
        });
        Ok(replacement.clone())
    }

    fn visit_member_access(&self, node: &MemberExpr) -> Result<MemberExpr> {
        let object = self.visit(node.object.as_ref())?;
        Ok(MemberExpr::new(object, self.retargeter.member(&node.member)))
    }

    fn visit_unary(&self, node: &UnaryExpr) -> Result<UnaryExpr> {
        let mut rebuilt = reconstruct::unary(self, node)?;
        rebuilt.ty = self.retargeter.retype(&rebuilt.ty);
        rebuilt.method = rebuilt.method.map(|m| self.retargeter.method(&m));
        Ok(rebuilt)
    }

    fn visit_binary(&self, node: &BinaryExpr) -> Result<BinaryExpr> {
        let mut rebuilt = reconstruct::binary(self, node)?;
        rebuilt.method = rebuilt.method.map(|m| self.retargeter.method(&m));
        Ok(rebuilt)
    }

    fn visit_type_test(&self, node: &TypeTestExpr) -> Result<TypeTestExpr> {
        let mut rebuilt = reconstruct::type_test(self, node)?;
        rebuilt.type_operand = self.retargeter.retype(&rebuilt.type_operand);
        Ok(rebuilt)
    }

    fn visit_call(&self, node: &CallExpr) -> Result<CallExpr> {
        let mut rebuilt = reconstruct::call(self, node)?;
        rebuilt.method = self.retargeter.method(&rebuilt.method);
        Ok(rebuilt)
    }

    fn visit_lambda(&self, node: &LambdaExpr) -> Result<LambdaExpr> {
        let mut rebuilt = reconstruct::lambda(self, node)?;
        rebuilt.delegate_type = self.retargeter.retype(&rebuilt.delegate_type);
        Ok(rebuilt)
    }

    fn visit_new(&self, node: &NewExpr) -> Result<NewExpr> {
        let arguments = reconstruct::expressions(self, &node.arguments)?;
        let constructor = self.retargeter.constructor(&node.constructor);
        match node.members() {
            Some(members) => Ok(NewExpr::with_members(
                constructor,
                arguments.iter().cloned(),
                members.iter().map(|m| self.retargeter.member(m)),
            )),
            None => Ok(NewExpr::new(constructor, arguments.iter().cloned())),
        }
    }

    fn visit_new_array(&self, node: &NewArrayExpr) -> Result<NewArrayExpr> {
        let mut rebuilt = reconstruct::new_array(self, node)?;
        rebuilt.element_type = self.retargeter.retype(&rebuilt.element_type);
        Ok(rebuilt)
    }

    fn visit_member_assignment(&self, binding: &MemberAssignment) -> Result<MemberAssignment> {
        let mut rebuilt = reconstruct::member_assignment(self, binding)?;
        rebuilt.member = self.retargeter.member(&rebuilt.member);
        Ok(rebuilt)
    }

    fn visit_member_member_binding(&self, binding: &MemberMemberBinding) -> Result<MemberMemberBinding> {
        let mut rebuilt = reconstruct::member_member_binding(self, binding)?;
        rebuilt.member = self.retargeter.member(&rebuilt.member);
        Ok(rebuilt)
    }

    fn visit_member_list_binding(&self, binding: &MemberListBinding) -> Result<MemberListBinding> {
        let mut rebuilt = reconstruct::member_list_binding(self, binding)?;
        rebuilt.member = self.retargeter.member(&rebuilt.member);
        Ok(rebuilt)
    }

    fn visit_element_init(&self, initializer: &ElementInit) -> Result<ElementInit> {
        let mut rebuilt = reconstruct::element_init(self, initializer)?;
        rebuilt.add_method = self.retargeter.method(&rebuilt.add_method);
        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes() -> (Shape, Shape) {
        let iproduct = TypeRef::named("IProduct");
        let product = TypeRef::named("Product");
        let from = Shape::new(
            iproduct.clone(),
            vec![
                MemberRef::property(iproduct.clone(), "Id", TypeRef::int32()),
                MemberRef::property(iproduct, "Name", TypeRef::string()),
            ],
        );
        let to = Shape::new(
            product.clone(),
            vec![
                MemberRef::property(product.clone(), "Id", TypeRef::int32()),
                MemberRef::property(product.clone(), "Name", TypeRef::string()),
                MemberRef::property(product, "Price", TypeRef::double()),
            ],
        );
        (from, to)
    }

    #[test]
    fn test_missing_target_member_is_rejected() {
        let (from, to) = shapes();
        assert!(MemberRetargeter::new(&from, &to).is_ok());
        let err = MemberRetargeter::new(&to, &from).err().unwrap();
        assert_eq!(
            err,
            RetargetError::MissingMember {
                member: "Price".to_string(),
                target: "IProduct".to_string(),
            }
        );
    }

    #[test]
    fn test_predicate_is_moved_onto_target_shape() {
        let (from, to) = shapes();
        let retargeter = MemberRetargeter::new(&from, &to).unwrap();

        let p = ParameterExpr::new("p", from.ty.clone());
        let name = Arc::clone(from.member("Name").unwrap());
        let predicate = Expr::lambda(
            vec![p.clone()],
            Expr::equal(Expr::property(Expr::parameter(&p), name), Expr::string("widget")),
        );

        let output = retargeter.visit_node(&predicate).unwrap();
        let Expr::Lambda(rewritten) = &*output else {
            panic!("expected lambda");
        };
        let param = &rewritten.parameters[0];
        assert_eq!(param.ty, to.ty);
        assert_ne!(param.id, p.id);
        assert_eq!(
            rewritten.delegate_type,
            TypeRef::function(vec![to.ty.clone()], TypeRef::boolean())
        );

        let Expr::Binary(eq) = &*rewritten.body else {
            panic!("expected comparison");
        };
        let Expr::MemberAccess(access) = &*eq.left else {
            panic!("expected member access");
        };
        assert!(Arc::ptr_eq(&access.member, to.member("Name").unwrap()));
        assert_eq!(access.object.as_deref(), Some(&Expr::Parameter(param.clone())));
    }

    #[test]
    fn test_members_of_other_types_are_retyped() {
        let (from, to) = shapes();
        let retargeter = MemberRetargeter::new(&from, &to).unwrap();

        // o => o.Product.Name, with Order.Product typed IProduct
        let order = TypeRef::named("Order");
        let product = MemberRef::property(order.clone(), "Product", from.ty.clone());
        let o = ParameterExpr::new("o", order.clone());
        let name = Arc::clone(from.member("Name").unwrap());
        let tree = Expr::lambda(
            vec![o.clone()],
            Expr::property(Expr::property(Expr::parameter(&o), product), name),
        );

        let output = retargeter.visit_node(&tree).unwrap();
        let Expr::Lambda(rewritten) = &*output else {
            panic!("expected lambda");
        };
        // Order does not mention IProduct, so the parameter keeps its identity.
        assert_eq!(rewritten.parameters[0].id, o.id);
        let Expr::MemberAccess(outer) = &*rewritten.body else {
            panic!("expected member access");
        };
        assert!(Arc::ptr_eq(&outer.member, to.member("Name").unwrap()));
        let Some(Expr::MemberAccess(inner)) = outer.object.as_deref() else {
            panic!("expected member access");
        };
        assert_eq!(inner.member.declaring_type, order);
        assert_eq!(&*inner.member.name, "Product");
        assert_eq!(inner.member.member_type, to.ty);
    }

    #[test]
    fn test_parameter_table_does_not_outlive_a_rewrite() {
        let (from, to) = shapes();
        let retargeter = MemberRetargeter::new(&from, &to).unwrap();
        let p = ParameterExpr::new("p", from.ty.clone());
        let tree = Expr::lambda(vec![p.clone()], Expr::parameter(&p));

        let retyped: Vec<ParameterId> = (0..1_000)
            .map(|_| {
                let output = retargeter.visit_node(&tree).unwrap();
                let Expr::Lambda(lambda) = &*output else {
                    panic!("expected lambda");
                };
                assert_eq!(*lambda.body, Expr::Parameter(lambda.parameters[0].clone()));
                lambda.parameters[0].id
            })
            .collect();

        let mut distinct = retyped.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), retyped.len());
    }
}
