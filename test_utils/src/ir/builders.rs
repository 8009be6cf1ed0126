//! A small product catalogue model shared by tests and benchmarks.
//!
//! Two shapes with identical member names (`IProduct` and `Product`), a nested
//! `Dimensions` record, a two-argument `Point` record, a string list, and the static
//! methods queries are built from.

use std::sync::Arc;

use expression_rewriter::ir::expr_node::{
    ConstantValue, ElementInit, Expr, ListInitExpr, MemberBinding, MemberInitExpr, NewExpr, ParameterExpr,
};
use expression_rewriter::ir::members::{ConstructorRef, MemberRef, MethodRef};
use expression_rewriter::ir::transforms::Shape;
use expression_rewriter::ir::types::TypeRef;

#[derive(Clone, Debug)]
pub struct ProductModel {
    pub iproduct: Shape,
    pub product: Shape,
    pub dimensions: TypeRef,
    pub width: Arc<MemberRef>,
    pub height: Arc<MemberRef>,
    pub dimensions_ctor: Arc<ConstructorRef>,
    pub point: TypeRef,
    pub point_ctor: Arc<ConstructorRef>,
    pub point_x: Arc<MemberRef>,
    pub point_y: Arc<MemberRef>,
    pub tags: TypeRef,
    pub tags_ctor: Arc<ConstructorRef>,
    pub tags_add: Arc<MethodRef>,
    pub max: Arc<MethodRef>,
    pub today: Arc<MemberRef>,
}

fn product_shape(name: &str, dimensions: &TypeRef, tags: &TypeRef) -> Shape {
    let ty = TypeRef::named(name);
    Shape::new(
        ty.clone(),
        vec![
            MemberRef::property(ty.clone(), "Id", TypeRef::int32()),
            MemberRef::property(ty.clone(), "Name", TypeRef::string()),
            MemberRef::property(ty.clone(), "Price", TypeRef::double()),
            MemberRef::property(ty.clone(), "Dimensions", dimensions.clone()),
            MemberRef::property(ty, "Tags", tags.clone()),
        ],
    )
}

pub fn product_model() -> ProductModel {
    let dimensions = TypeRef::named("Dimensions");
    let tags = TypeRef::generic("List", vec![TypeRef::string()]);
    let point = TypeRef::named("Point");
    ProductModel {
        iproduct: product_shape("IProduct", &dimensions, &tags),
        product: product_shape("Product", &dimensions, &tags),
        width: MemberRef::property(dimensions.clone(), "Width", TypeRef::double()),
        height: MemberRef::property(dimensions.clone(), "Height", TypeRef::double()),
        dimensions_ctor: ConstructorRef::new(dimensions.clone(), Vec::new()),
        dimensions,
        point_ctor: ConstructorRef::new(point.clone(), vec![TypeRef::int32(), TypeRef::int32()]),
        point_x: MemberRef::property(point.clone(), "X", TypeRef::int32()),
        point_y: MemberRef::property(point.clone(), "Y", TypeRef::int32()),
        point,
        tags_ctor: ConstructorRef::new(tags.clone(), Vec::new()),
        tags_add: MethodRef::instance(tags.clone(), "Add", vec![TypeRef::string()], TypeRef::void()),
        tags,
        max: MethodRef::static_method(
            TypeRef::named("Math"),
            "Max",
            vec![TypeRef::int32(), TypeRef::int32()],
            TypeRef::int32(),
        ),
        today: MemberRef::static_property(TypeRef::named("DateTime"), "Today", TypeRef::named("DateTime")),
    }
}

impl ProductModel {
    /// Member of the given shape by name; panics on unknown names.
    pub fn member(shape: &Shape, name: &str) -> Arc<MemberRef> {
        match shape.member(name) {
            Some(member) => Arc::clone(member),
            None => panic!("shape {} has no member {}", shape.ty, name),
        }
    }

    /// `Queryable.Where<T>(IQueryable<T>, Func<T, Boolean>)` closed over `element`.
    pub fn where_method(&self, element: &TypeRef) -> Arc<MethodRef> {
        let queryable = TypeRef::generic("IQueryable", vec![element.clone()]);
        let method = MethodRef::static_method(
            TypeRef::named("Queryable"),
            "Where",
            vec![
                queryable.clone(),
                TypeRef::function(vec![element.clone()], TypeRef::boolean()),
            ],
            queryable,
        );
        Arc::new((*method).clone().with_generic_args(vec![element.clone()]))
    }

    /// `Queryable.Where<IProduct>(products, p => (p.Name == "widget"))`
    pub fn name_query(&self) -> (Arc<Expr>, ParameterExpr) {
        let ty = self.iproduct.ty.clone();
        let p = ParameterExpr::new("p", ty.clone());
        let predicate = Expr::lambda(
            vec![p.clone()],
            Expr::equal(
                Expr::property(Expr::parameter(&p), Self::member(&self.iproduct, "Name")),
                Expr::string("widget"),
            ),
        );
        let source = Expr::constant(
            ConstantValue::Opaque("products".into()),
            TypeRef::generic("IQueryable", vec![ty.clone()]),
        );
        (Expr::call(None, self.where_method(&ty), vec![source, predicate]), p)
    }

    /// `new Dimensions() {Width = width, Height = height}`
    pub fn dimensions_init(&self, width: Arc<Expr>, height: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::MemberInit(MemberInitExpr::new(
            NewExpr::new(Arc::clone(&self.dimensions_ctor), Vec::new()),
            vec![
                MemberBinding::assign(Arc::clone(&self.width), width),
                MemberBinding::assign(Arc::clone(&self.height), height),
            ],
        )))
    }

    /// `new List<String>() {Add(tag), ...}`
    pub fn tags_init<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> Arc<Expr> {
        Arc::new(Expr::ListInit(ListInitExpr::new(
            NewExpr::new(Arc::clone(&self.tags_ctor), Vec::new()),
            tags.into_iter()
                .map(|tag| ElementInit::new(Arc::clone(&self.tags_add), vec![Expr::string(tag)])),
        )))
    }

    /// `new Point(x, y)` naming `X` and `Y` as the initialized members.
    pub fn point_with_members(&self, x: Arc<Expr>, y: Arc<Expr>) -> NewExpr {
        NewExpr::with_members(
            Arc::clone(&self.point_ctor),
            vec![x, y],
            vec![Arc::clone(&self.point_x), Arc::clone(&self.point_y)],
        )
    }
}
