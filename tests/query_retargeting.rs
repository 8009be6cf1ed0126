//! Moving product queries from the `IProduct` shape onto `Product`, alone and as part of
//! a transformation pipeline.

use std::sync::Arc;

use anyhow::Result;
use expression_rewriter::ir::expr_node::{Expr, ExprKind, KindCollector, NodeObserver, ParameterExpr};
use expression_rewriter::ir::pipeline::{Pipeline, PipelineError, Transform};
use expression_rewriter::ir::transforms::{rewrite_with, MemberRetargeter, ParameterRenamer, RetargetError, Shape};
use expression_rewriter::ir::types::TypeRef;
use expression_rewriter::{RewriteRules, Visitor};
use indoc::indoc;
use parking_lot::Mutex;
use test_utils::ir::builders::{product_model, ProductModel};
use test_utils::ir::inspect::{as_call, as_lambda, as_member};

#[test]
fn test_where_query_is_retargeted() -> Result<()> {
    let _ = expression_rewriter::logging::init_logger(false, Some("warn"));

    let model = product_model();
    let (query, p) = model.name_query();
    let retargeter = MemberRetargeter::new(&model.iproduct, &model.product)?;
    let rewritten = retargeter.visit_node(&query)?;

    let call = as_call(&rewritten)?;
    assert_eq!(call.method.generic_args, vec![model.product.ty.clone()]);
    assert_eq!(call.method.to_string(), "Queryable.Where<Product>");
    // Constants are not retargeted: the source keeps its type until the caller swaps it.
    assert_eq!(call.arguments[0].ty(), TypeRef::generic("IQueryable", vec![model.iproduct.ty.clone()]));

    let predicate = as_lambda(&call.arguments[1])?;
    assert_eq!(predicate.parameters[0].ty, model.product.ty);
    assert_ne!(predicate.parameters[0].id, p.id);
    let Expr::Binary(eq) = &*predicate.body else {
        anyhow::bail!("expected comparison, found {}", predicate.body);
    };
    let access = as_member(&eq.left)?;
    assert!(Arc::ptr_eq(&access.member, &ProductModel::member(&model.product, "Name")));
    Ok(())
}

#[test]
fn test_initializers_and_casts_are_retargeted() -> Result<()> {
    let model = product_model();
    let p = ParameterExpr::new("p", model.iproduct.ty.clone());
    let name = ProductModel::member(&model.iproduct, "Name");
    let tree = Expr::lambda(
        vec![p.clone()],
        Expr::condition(
            Expr::type_is(Expr::parameter(&p), model.iproduct.ty.clone()),
            Expr::convert(Expr::parameter(&p), model.iproduct.ty.clone()),
            Expr::property(Expr::parameter(&p), name),
        ),
    );

    let retargeter = MemberRetargeter::new(&model.iproduct, &model.product)?;
    let rewritten = retargeter.visit_node(&tree)?;
    assert_eq!(
        rewritten.to_string(),
        "p => IIF((p Is Product), Convert(p, Product), p.Name)"
    );
    assert!(!rewritten.ty().mentions(&model.iproduct.ty));
    Ok(())
}

#[test]
fn test_retargeting_requires_every_member() {
    let model = product_model();
    let narrow = Shape::new(
        model.product.ty.clone(),
        vec![ProductModel::member(&model.product, "Id")],
    );
    match MemberRetargeter::new(&model.iproduct, &narrow) {
        Err(RetargetError::MissingMember { member, target }) => {
            assert_eq!(member, "Name");
            assert_eq!(target, "Product");
        }
        Ok(_) => panic!("narrow target accepted"),
    }
}

#[derive(Default)]
struct MemberNames(Vec<String>);

impl NodeObserver for MemberNames {
    fn observe(&mut self, node: &Expr, _depth: usize) {
        if let Expr::MemberAccess(access) = node {
            self.0.push(access.member.to_string());
        }
    }
}

#[test]
fn test_pipeline_retargets_then_renames_then_observes() -> Result<()> {
    let model = product_model();
    let (query, _) = model.name_query();

    let members = Arc::new(Mutex::new(MemberNames::default()));
    let kinds = Arc::new(Mutex::new(KindCollector::default()));
    let mut pipeline = Pipeline::new().with_depth_limit(16);
    pipeline.add_transform(Transform::observe("members", &["rename"], members.clone()));
    pipeline.add_transform(Transform::rewrite(
        "rename",
        &["retarget"],
        Arc::new(ParameterRenamer::new([("p", "product")])),
    ));
    pipeline.add_transform(Transform::rewrite(
        "retarget",
        &[],
        Arc::new(MemberRetargeter::new(&model.iproduct, &model.product)?),
    ));
    pipeline.add_transform(Transform::observe("kinds", &["retarget"], kinds.clone()));

    let order = pipeline.order()?;
    assert_eq!(order.first().map(String::as_str), Some("retarget"));
    let position = |id: &str| order.iter().position(|o| o == id);
    assert!(position("rename") < position("members"));

    let rewritten = pipeline.apply(&query)?;
    assert_eq!(
        rewritten.to_string(),
        r#"Queryable.Where<Product>(products, product => (product.Name == "widget"))"#
    );
    assert_eq!(members.lock().0, vec!["Product.Name".to_string()]);
    assert_eq!(kinds.lock().kinds[0], ExprKind::Call);
    Ok(())
}

#[test]
fn test_pipeline_depth_limit() {
    let model = product_model();
    let (query, _) = model.name_query();
    let mut pipeline = Pipeline::new().with_depth_limit(3);
    pipeline.add_transform(Transform::rewrite("clone", &[], Arc::new(RewriteRules::new())));
    assert!(matches!(
        pipeline.apply(&query),
        Err(PipelineError::DepthLimitExceeded { depth: 5, limit: 3 })
    ));
}

#[test]
fn test_delegate_substitution_and_rendering() -> Result<()> {
    let model = product_model();
    let (query, _) = model.name_query();
    let rewritten = rewrite_with(&query, |node| match &**node {
        Expr::Constant(c) if c.ty == TypeRef::string() => Some(Expr::string("gadget")),
        _ => None,
    })?;

    let rendered = format!(
        "{}\n{}\n",
        as_call(&rewritten)?.method,
        as_call(&rewritten)?.arguments[1]
    );
    assert_eq!(
        rendered,
        indoc! {r#"
            Queryable.Where<IProduct>
            p => (p.Name == "gadget")
        "#}
    );
    Ok(())
}

#[test]
fn test_shared_renamer_serves_independent_queries() -> Result<()> {
    let renamer = Arc::new(ParameterRenamer::new([("x", "item")]));
    let mut pipeline = Pipeline::new();
    pipeline.add_transform(Transform::rewrite("rename", &[], renamer.clone()));

    let mut seen = Vec::new();
    for _ in 0..10_000 {
        let x = ParameterExpr::new("x", TypeRef::int32());
        let rewritten = pipeline.apply(&Expr::lambda(vec![x.clone()], Expr::parameter(&x)))?;
        let lambda = as_lambda(&rewritten)?;
        assert_eq!(&*lambda.parameters[0].name, "item");
        assert_eq!(*lambda.body, Expr::Parameter(lambda.parameters[0].clone()));
        seen.push(lambda.parameters[0].id);
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 10_000);

    // Nothing from the earlier queries is carried into the next one.
    let x = ParameterExpr::new("x", TypeRef::int32());
    let renamed = renamer.rename(&Expr::lambda(vec![x.clone()], Expr::parameter(&x)))?;
    assert_eq!(renamed.replacements.len(), 1);
    Ok(())
}
