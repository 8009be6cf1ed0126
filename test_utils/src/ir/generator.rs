//! Random expression trees for property-based testing.
//!
//! `ArbitraryExpr` wraps a tree drawn from every supported node kind, every member
//! binding kind, both coalesce forms, both `New` forms and both array forms. Parameter
//! references are only generated inside a lambda that declares them, so generated trees
//! are well-scoped.
//!
//! Generation functions take a depth parameter to bound recursion; quickcheck's size
//! parameter caps the starting depth.

use std::sync::Arc;

use expression_rewriter::ir::expr_node::{
    BinaryExpr, BinaryOperator, ConstantValue, ElementInit, Expr, LambdaExpr, ListInitExpr, MemberBinding,
    MemberInitExpr, NewArrayExpr, NewExpr, ParameterExpr, UnaryOperator,
};
use expression_rewriter::ir::members::ConstructorRef;
use expression_rewriter::ir::types::TypeRef;
use quickcheck::{Arbitrary, Gen};

use super::builders::{product_model, ProductModel};

/// Maximum depth for generated trees to prevent excessive recursion.
const MAX_DEPTH: usize = 5;

#[derive(Clone, Debug)]
pub struct ArbitraryExpr(pub Arc<Expr>);

impl Arbitrary for ArbitraryExpr {
    fn arbitrary(g: &mut Gen) -> Self {
        let model = product_model();
        let depth = g.size().min(MAX_DEPTH);
        ArbitraryExpr(gen_expr(g, &model, depth, &[]))
    }
}

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: u32, max: u32) -> u32 {
    min + (u32::arbitrary(g) % (max - min + 1))
}

fn gen_name(g: &mut Gen) -> String {
    const NAMES: &[&str] = &["p", "q", "x", "y", "item", "acc"];
    g.choose(NAMES).unwrap().to_string()
}

fn gen_constant(g: &mut Gen) -> Arc<Expr> {
    const CHOICES: &[&str] = &["int", "bool", "string", "null", "opaque"];
    match *g.choose(CHOICES).unwrap() {
        "int" => Expr::int(i64::from(i32::arbitrary(g))),
        "bool" => Expr::boolean(bool::arbitrary(g)),
        "string" => Expr::string(&gen_name(g)),
        "null" => Expr::null(TypeRef::nullable(TypeRef::int32())),
        "opaque" => Expr::constant(ConstantValue::Opaque("products".into()), TypeRef::object()),
        _ => unreachable!(),
    }
}

fn gen_leaf(g: &mut Gen, scope: &[ParameterExpr]) -> Arc<Expr> {
    if !scope.is_empty() && bool::arbitrary(g) {
        Expr::parameter(g.choose(scope).unwrap())
    } else {
        gen_constant(g)
    }
}

fn gen_many(g: &mut Gen, model: &ProductModel, depth: usize, scope: &[ParameterExpr], max: u32) -> Vec<Arc<Expr>> {
    (0..gen_range(g, 0, max)).map(|_| gen_expr(g, model, depth, scope)).collect()
}

fn gen_lambda(g: &mut Gen, model: &ProductModel, depth: usize, scope: &[ParameterExpr]) -> LambdaExpr {
    const TYPES: &[&str] = &["product", "int"];
    let parameters: Vec<ParameterExpr> = (0..gen_range(g, 0, 2))
        .map(|_| {
            let ty = match *g.choose(TYPES).unwrap() {
                "product" => model.iproduct.ty.clone(),
                _ => TypeRef::int32(),
            };
            ParameterExpr::new(&gen_name(g), ty)
        })
        .collect();
    let mut inner = scope.to_vec();
    inner.extend(parameters.iter().cloned());
    LambdaExpr::infer(parameters, gen_expr(g, model, depth, &inner))
}

fn gen_binding(g: &mut Gen, model: &ProductModel, depth: usize, scope: &[ParameterExpr]) -> MemberBinding {
    const CHOICES: &[&str] = &["assign", "member", "list"];
    match *g.choose(CHOICES).unwrap() {
        "assign" => MemberBinding::assign(
            ProductModel::member(&model.product, "Name"),
            gen_expr(g, model, depth, scope),
        ),
        "member" => MemberBinding::member_bind(
            ProductModel::member(&model.product, "Dimensions"),
            vec![MemberBinding::assign(Arc::clone(&model.width), gen_expr(g, model, depth, scope))],
        ),
        "list" => MemberBinding::list_bind(
            ProductModel::member(&model.product, "Tags"),
            vec![ElementInit::new(Arc::clone(&model.tags_add), vec![gen_expr(g, model, depth, scope)])],
        ),
        _ => unreachable!(),
    }
}

/// Generates a random expression, recursing at most `depth` times.
pub fn gen_expr(g: &mut Gen, model: &ProductModel, depth: usize, scope: &[ParameterExpr]) -> Arc<Expr> {
    let depth = depth.min(MAX_DEPTH);
    if depth == 0 {
        return gen_leaf(g, scope);
    }
    let next = depth - 1;
    const CHOICES: &[&str] = &[
        "leaf", "unary", "binary", "coalesce", "type_test", "conditional", "member", "call", "lambda", "new",
        "new_array", "invoke", "member_init", "list_init",
    ];
    match *g.choose(CHOICES).unwrap() {
        "leaf" => gen_leaf(g, scope),
        "unary" => {
            const OPS: &[UnaryOperator] = &[UnaryOperator::Negate, UnaryOperator::Not, UnaryOperator::Convert];
            let op = *g.choose(OPS).unwrap();
            let ty = if op == UnaryOperator::Convert { TypeRef::int64() } else { TypeRef::int32() };
            Expr::unary(op, gen_expr(g, model, next, scope), ty)
        }
        "binary" => {
            const OPS: &[BinaryOperator] = &[
                BinaryOperator::Add,
                BinaryOperator::Multiply,
                BinaryOperator::Equal,
                BinaryOperator::LessThan,
                BinaryOperator::AndAlso,
                BinaryOperator::ArrayIndex,
            ];
            let op = *g.choose(OPS).unwrap();
            Expr::binary(op, gen_expr(g, model, next, scope), gen_expr(g, model, next, scope))
        }
        "coalesce" => {
            let left = gen_expr(g, model, next, scope);
            let right = gen_expr(g, model, next, scope);
            if bool::arbitrary(g) {
                let v = ParameterExpr::new("v", TypeRef::nullable(TypeRef::int32()));
                let conversion = LambdaExpr::infer(vec![v.clone()], Expr::parameter(&v));
                Arc::new(Expr::Binary(BinaryExpr::coalesce_with_conversion(left, right, conversion)))
            } else {
                Expr::coalesce(left, right)
            }
        }
        "type_test" => Expr::type_is(gen_expr(g, model, next, scope), model.product.ty.clone()),
        "conditional" => Expr::condition(
            gen_expr(g, model, next, scope),
            gen_expr(g, model, next, scope),
            gen_expr(g, model, next, scope),
        ),
        "member" => {
            if bool::arbitrary(g) {
                Expr::static_member(Arc::clone(&model.today))
            } else {
                Expr::property(
                    gen_expr(g, model, next, scope),
                    ProductModel::member(&model.iproduct, "Price"),
                )
            }
        }
        "call" => Expr::call(None, Arc::clone(&model.max), gen_many(g, model, next, scope, 3)),
        "lambda" => Arc::new(Expr::Lambda(gen_lambda(g, model, next, scope))),
        "new" => {
            if bool::arbitrary(g) {
                let point = model.point_with_members(gen_expr(g, model, next, scope), gen_expr(g, model, next, scope));
                Arc::new(Expr::New(point))
            } else {
                Expr::new_object(Arc::clone(&model.point_ctor), gen_many(g, model, next, scope, 2))
            }
        }
        "new_array" => {
            let elements = gen_many(g, model, next, scope, 3);
            let array = if bool::arbitrary(g) {
                NewArrayExpr::init(TypeRef::int32(), elements)
            } else {
                NewArrayExpr::bounds(TypeRef::int32(), elements)
            };
            Arc::new(Expr::NewArray(array))
        }
        "invoke" => {
            let target = Arc::new(Expr::Lambda(gen_lambda(g, model, next, scope)));
            Expr::invoke(target, gen_many(g, model, next, scope, 2))
        }
        "member_init" => {
            let bindings: Vec<MemberBinding> =
                (0..gen_range(g, 0, 3)).map(|_| gen_binding(g, model, next, scope)).collect();
            let new_product = NewExpr::new(
                ConstructorRef::new(model.product.ty.clone(), Vec::new()),
                Vec::new(),
            );
            Arc::new(Expr::MemberInit(MemberInitExpr::new(new_product, bindings)))
        }
        "list_init" => {
            let initializers: Vec<ElementInit> = (0..gen_range(g, 1, 2))
                .map(|_| ElementInit::new(Arc::clone(&model.tags_add), vec![gen_expr(g, model, next, scope)]))
                .collect();
            Arc::new(Expr::ListInit(ListInitExpr::new(
                NewExpr::new(Arc::clone(&model.tags_ctor), Vec::new()),
                initializers,
            )))
        }
        _ => unreachable!(),
    }
}
