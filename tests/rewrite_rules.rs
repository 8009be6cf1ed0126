use std::sync::Arc;
use std::thread;

use anyhow::Result;
use expression_rewriter::ir::expr_node::{ConstantExpr, ConstantValue, Expr, MemberExpr, ParameterExpr};
use expression_rewriter::ir::members::MemberRef;
use expression_rewriter::ir::visitor::reconstruct;
use expression_rewriter::{RewriteRules, Visitor};
use test_utils::ir::builders::{product_model, ProductModel};

/// Rewrites `DateTime.Today` to `<date>.Date` so queries become reproducible.
fn pin_today(date: &'static str) -> RewriteRules {
    RewriteRules::new().on_member_access(move |rules, node| {
        if node.object.is_none() && &*node.member.name == "Today" {
            return Ok(MemberExpr::new(
                Some(Expr::constant(ConstantValue::Opaque(date.into()), node.member.member_type.clone())),
                Arc::new(MemberRef {
                    name: "Date".into(),
                    is_static: false,
                    ..(*node.member).clone()
                }),
            ));
        }
        reconstruct::member_access(rules, node)
    })
}

#[test]
fn test_member_access_override() -> Result<()> {
    let model = product_model();
    let tree = Expr::equal(Expr::static_member(Arc::clone(&model.today)), Expr::string("x"));
    let rewritten = pin_today("2024-01-01").visit_node(&tree)?;
    assert_eq!(rewritten.to_string(), r#"(2024-01-01.Date == "x")"#);
    Ok(())
}

#[test]
fn test_overrides_compose_across_kinds() -> Result<()> {
    let model = product_model();
    let p = ParameterExpr::new("p", model.iproduct.ty.clone());
    let price = ProductModel::member(&model.iproduct, "Price");
    let tree = Expr::lambda(
        vec![p.clone()],
        Expr::condition(
            Expr::equal(Expr::property(Expr::parameter(&p), price), Expr::int(0)),
            Expr::int(1),
            Expr::int(2),
        ),
    );

    // Scale every integer constant and flip every conditional.
    let rules = RewriteRules::new()
        .on_constant(|_, c| {
            Ok(match *c.value {
                ConstantValue::Int(n) => ConstantExpr::new(
                    ConstantValue::Int(n * 100),
                    c.ty.clone(),
                ),
                _ => c.clone(),
            })
        })
        .on_conditional(|rules, c| {
            let mut rebuilt = reconstruct::conditional(rules, c)?;
            std::mem::swap(&mut rebuilt.if_true, &mut rebuilt.if_false);
            Ok(rebuilt)
        });

    let rewritten = rules.visit_node(&tree)?;
    assert_eq!(rewritten.to_string(), "p => IIF((p.Price == 0), 200, 100)");
    Ok(())
}

#[test]
fn test_rules_shared_between_threads() {
    let rules = Arc::new(RewriteRules::new().on_constant(|_, c| {
        Ok(match *c.value {
            ConstantValue::Int(n) => {
                ConstantExpr::new(ConstantValue::Int(-n), c.ty.clone())
            }
            _ => c.clone(),
        })
    }));

    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let rules = Arc::clone(&rules);
            thread::spawn(move || {
                let tree = Expr::add(Expr::int(n), Expr::int(n + 1));
                rules.visit_node(&tree).map(|t| t.to_string())
            })
        })
        .collect();

    let rendered: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(rendered, vec!["(-1 + -2)", "(-2 + -3)", "(-3 + -4)", "(-4 + -5)"]);
}
