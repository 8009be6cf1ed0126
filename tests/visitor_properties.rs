//! Reconstruction rules of the stock engine, checked one node kind at a time.

use std::sync::Arc;

use anyhow::Result;
use expression_rewriter::ir::expr_node::{
    BinaryExpr, BinaryOperator, ConstantValue, Expr, ExprKind, ExtensionBinding, ExtensionExpr, LambdaExpr,
    MemberBinding, MemberInitExpr, NewExpr, ParameterExpr, UnaryOperator,
};
use expression_rewriter::ir::members::{MethodRef, MemberRef};
use expression_rewriter::ir::transforms::{deep_clone, ParameterRenamer, StructuralCloner};
use expression_rewriter::ir::types::TypeRef;
use expression_rewriter::{RewriteRules, TransformError, Visitor};
use test_utils::ir::builders::{product_model, ProductModel};
use test_utils::ir::inspect::{as_binary, as_call, as_constant, as_lambda, as_member_init, as_new, as_parameter};

fn nullable_int() -> TypeRef {
    TypeRef::nullable(TypeRef::int32())
}

#[test]
fn test_absent_input_gives_absent_output() {
    assert_eq!(StructuralCloner.visit(None), Ok(None));
    assert_eq!(RewriteRules::new().visit(None), Ok(None));
}

#[test]
fn test_plain_coalesce_stays_plain() -> Result<()> {
    let _ = expression_rewriter::logging::init_logger(false, Some("warn"));

    let left = Expr::null(nullable_int());
    let right = Expr::int(5);
    let tree = Expr::coalesce(Arc::clone(&left), Arc::clone(&right));

    let cloned = deep_clone(&tree)?;
    let binary = as_binary(&cloned)?;
    assert_eq!(binary.op, BinaryOperator::Coalesce);
    assert!(binary.conversion().is_none());
    assert_eq!(binary.left, left);
    assert_eq!(binary.right, right);
    assert_eq!(cloned.ty(), TypeRef::int32());
    Ok(())
}

#[test]
fn test_coalesce_with_conversion_keeps_cloned_conversion() -> Result<()> {
    let v = ParameterExpr::new("v", nullable_int());
    let conversion = LambdaExpr::infer(vec![v.clone()], Expr::parameter(&v));
    let tree = Arc::new(Expr::Binary(BinaryExpr::coalesce_with_conversion(
        Expr::null(nullable_int()),
        Expr::int(5),
        conversion.clone(),
    )));

    let cloned = deep_clone(&tree)?;
    let binary = as_binary(&cloned)?;
    assert_eq!(binary.op, BinaryOperator::Coalesce);
    assert_eq!(binary.conversion(), Some(&conversion));
    assert_eq!(cloned, tree);
    Ok(())
}

#[test]
fn test_coalesce_conversion_is_visited() -> Result<()> {
    let v = ParameterExpr::new("v", nullable_int());
    let conversion = LambdaExpr::infer(vec![v.clone()], Expr::parameter(&v));
    let tree = Arc::new(Expr::Binary(BinaryExpr::coalesce_with_conversion(
        Expr::null(nullable_int()),
        Expr::int(5),
        conversion,
    )));

    let renamer = ParameterRenamer::new([("v", "w")]);
    let rewritten = renamer.visit_node(&tree)?;
    let converted = as_binary(&rewritten)?
        .conversion()
        .map(|c| c.parameters[0].name.to_string());
    assert_eq!(converted.as_deref(), Some("w"));
    Ok(())
}

#[test]
fn test_lifted_comparison_keeps_flag_and_method() -> Result<()> {
    let compare = MethodRef::static_method(
        TypeRef::named("Decimal"),
        "op_LessThan",
        vec![nullable_int(), nullable_int()],
        TypeRef::boolean(),
    );
    let tree = Arc::new(Expr::Binary(BinaryExpr::make(
        BinaryOperator::LessThan,
        Expr::null(nullable_int()),
        Expr::null(nullable_int()),
        true,
        Some(Arc::clone(&compare)),
    )));

    let cloned = deep_clone(&tree)?;
    let binary = as_binary(&cloned)?;
    assert!(binary.lifted_to_null);
    assert!(Arc::ptr_eq(binary.method.as_ref().unwrap(), &compare));
    assert_eq!(cloned.ty(), TypeRef::nullable(TypeRef::boolean()));
    Ok(())
}

#[test]
fn test_new_with_and_without_member_correspondence() -> Result<()> {
    let model = product_model();

    let plain = Expr::new_object(Arc::clone(&model.point_ctor), vec![Expr::int(1), Expr::int(2)]);
    let plain_clone = deep_clone(&plain)?;
    let rebuilt = as_new(&plain_clone)?;
    assert_eq!(rebuilt.members().map_or(0, |m| m.len()), 0);
    assert!(!rebuilt.has_member_correspondence());

    let with_members = Arc::new(Expr::New(model.point_with_members(Expr::int(1), Expr::int(2))));
    let members_clone = deep_clone(&with_members)?;
    let rebuilt = as_new(&members_clone)?;
    let members = rebuilt.members().expect("members kept");
    assert_eq!(members.len(), 2);
    assert_eq!(&*members[0].name, "X");
    assert_eq!(&*members[1].name, "Y");
    Ok(())
}

#[test]
fn test_call_arguments_keep_order() -> Result<()> {
    let sum = MethodRef::static_method(
        TypeRef::named("Math"),
        "Sum",
        vec![TypeRef::int32(); 3],
        TypeRef::int32(),
    );
    let tree = Expr::call(None, sum, vec![Expr::int(1), Expr::int(2), Expr::int(3)]);

    let cloned = deep_clone(&tree)?;
    let values: Vec<ConstantValue> = as_call(&cloned)?
        .arguments
        .iter()
        .map(|a| as_constant(a).map(|c| (*c.value).clone()))
        .collect::<Result<_>>()?;
    assert_eq!(
        values,
        vec![ConstantValue::Int(1), ConstantValue::Int(2), ConstantValue::Int(3)]
    );
    Ok(())
}

#[test]
fn test_renamed_lambda_parameter_matches_body_reference() -> Result<()> {
    let x = ParameterExpr::new("x", TypeRef::int32());
    let tree = Expr::lambda(vec![x.clone()], Expr::add(Expr::parameter(&x), Expr::int(1)));

    let renamer = ParameterRenamer::new([("x", "y")]);
    let rewritten = renamer.visit_node(&tree)?;
    let lambda = as_lambda(&rewritten)?;

    let declared = &lambda.parameters[0];
    let referenced = as_parameter(&as_binary(&lambda.body)?.left)?;
    assert_eq!(&*declared.name, "y");
    assert_eq!(declared.id, referenced.id);
    assert_ne!(declared.id, x.id);
    assert_eq!(rewritten.to_string(), "y => (y + 1)");
    Ok(())
}

#[test]
fn test_rules_parameter_override_is_seen_by_list_and_body() -> Result<()> {
    let x = ParameterExpr::new("x", TypeRef::int32());
    let replacement = ParameterExpr::new("z", TypeRef::int32());
    let tree = Expr::lambda(vec![x.clone()], Expr::add(Expr::parameter(&x), Expr::int(1)));

    let (original, substitute) = (x.id, replacement.clone());
    let rules = RewriteRules::new().on_parameter(move |_, p| {
        Ok(if p.id == original { substitute.clone() } else { p.clone() })
    });
    let rewritten = rules.visit_node(&tree)?;
    let expected = Expr::lambda(
        vec![replacement.clone()],
        Expr::add(Expr::parameter(&replacement), Expr::int(1)),
    );
    assert_eq!(rewritten, expected);
    Ok(())
}

#[test]
fn test_structural_clone_is_idempotent_and_fresh() -> Result<()> {
    let model = product_model();
    let (query, _) = model.name_query();

    let once = deep_clone(&query)?;
    let twice = deep_clone(&once)?;
    assert_eq!(once, query);
    assert_eq!(twice, once);
    assert!(!Arc::ptr_eq(&once, &query));

    let original_source = &as_call(&query)?.arguments[0];
    let cloned_source = &as_call(&once)?.arguments[0];
    assert!(!Arc::ptr_eq(original_source, cloned_source));
    assert!(Arc::ptr_eq(
        &as_constant(original_source)?.value,
        &as_constant(cloned_source)?.value
    ));
    assert!(Arc::ptr_eq(&as_call(&query)?.method, &as_call(&once)?.method));
    Ok(())
}

#[test]
fn test_every_kind_is_preserved() -> Result<()> {
    let model = product_model();
    let p = ParameterExpr::new("p", model.iproduct.ty.clone());
    let price = ProductModel::member(&model.iproduct, "Price");
    let samples = vec![
        Expr::negate(Expr::int(1)),
        Expr::unary(UnaryOperator::TypeAs, Expr::parameter(&p), model.product.ty.clone()),
        Expr::add(Expr::int(1), Expr::int(2)),
        Expr::type_is(Expr::parameter(&p), model.product.ty.clone()),
        Expr::condition(Expr::boolean(true), Expr::int(1), Expr::int(2)),
        Expr::string("bolt"),
        Expr::parameter(&p),
        Expr::property(Expr::parameter(&p), price),
        Expr::static_member(Arc::clone(&model.today)),
        Expr::call(None, Arc::clone(&model.max), vec![Expr::int(1), Expr::int(2)]),
        Expr::lambda(vec![p.clone()], Expr::boolean(true)),
        Expr::new_object(Arc::clone(&model.point_ctor), vec![Expr::int(1), Expr::int(2)]),
        Arc::new(Expr::NewArray(expression_rewriter::ir::expr_node::NewArrayExpr::bounds(
            TypeRef::int32(),
            vec![Expr::int(4)],
        ))),
        Expr::invoke(Expr::lambda(vec![p.clone()], Expr::int(0)), vec![Expr::parameter(&p)]),
        model.dimensions_init(Expr::int(2), Expr::int(3)),
        model.tags_init(["new", "sale"]),
    ];

    for sample in samples {
        let cloned = deep_clone(&sample)?;
        assert_eq!(cloned.kind(), sample.kind());
        assert_eq!(cloned, sample, "structural mismatch for {}", sample);
        assert_eq!(cloned.node_count(), sample.node_count());
    }
    Ok(())
}

#[test]
fn test_nested_member_and_list_bindings() -> Result<()> {
    let model = product_model();
    let product_ctor = expression_rewriter::ir::members::ConstructorRef::new(model.product.ty.clone(), Vec::new());
    let tree = Arc::new(Expr::MemberInit(MemberInitExpr::new(
        NewExpr::new(product_ctor, Vec::new()),
        vec![
            MemberBinding::assign(ProductModel::member(&model.product, "Name"), Expr::string("bolt")),
            MemberBinding::member_bind(
                ProductModel::member(&model.product, "Dimensions"),
                vec![MemberBinding::assign(Arc::clone(&model.width), Expr::int(2))],
            ),
            MemberBinding::list_bind(
                ProductModel::member(&model.product, "Tags"),
                vec![expression_rewriter::ir::expr_node::ElementInit::new(
                    Arc::clone(&model.tags_add),
                    vec![Expr::string("sale")],
                )],
            ),
        ],
    )));

    let cloned = deep_clone(&tree)?;
    assert_eq!(cloned, tree);
    let kinds: Vec<_> = as_member_init(&cloned)?.bindings.iter().map(|b| b.kind()).collect();
    assert_eq!(kinds.len(), 3);
    assert_eq!(
        cloned.to_string(),
        r#"new Product() {Name = "bolt", Dimensions = {Width = 2}, Tags = {Add("sale")}}"#
    );
    Ok(())
}

#[test]
fn test_unknown_kinds_are_rejected() {
    let unknown = Arc::new(Expr::Extension(ExtensionExpr::new("Switch", 4, vec![Expr::int(1)])));
    let tree = Expr::condition(Expr::boolean(true), unknown, Expr::int(0));
    assert!(matches!(
        deep_clone(&tree),
        Err(TransformError::UnsupportedNodeKind { ref kind, .. }) if kind == "Switch"
    ));

    let model = product_model();
    let product_ctor = expression_rewriter::ir::members::ConstructorRef::new(model.product.ty.clone(), Vec::new());
    let name: Arc<MemberRef> = ProductModel::member(&model.product, "Name");
    let with_unknown_binding = Arc::new(Expr::MemberInit(MemberInitExpr::new(
        NewExpr::new(product_ctor, Vec::new()),
        vec![MemberBinding::Extension(ExtensionBinding {
            kind: "Spread".into(),
            member: name,
        })],
    )));
    assert!(matches!(
        deep_clone(&with_unknown_binding),
        Err(TransformError::UnsupportedBindingKind { .. })
    ));
    assert_eq!(with_unknown_binding.kind(), ExprKind::MemberInit);
}
