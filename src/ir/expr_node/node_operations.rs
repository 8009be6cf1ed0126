use std::borrow::Cow;
use std::ops::ControlFlow;

use super::node_types::*;

/// Read-only observer driven by [`walk`].
///
/// Observers never change the tree; they collect information about it (counts,
/// referenced members, depth). Used by observation steps of a transformation pipeline.
pub trait NodeObserver {
    /// Called once per node, parents before children. `depth` is 1 for the root.
    fn observe(&mut self, node: &Expr, depth: usize);

    /// Called once per member binding, before the expressions it contains.
    fn observe_binding(&mut self, _binding: &MemberBinding, _depth: usize) {}
}

impl Expr {
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Unary(_) => ExprKind::Unary,
            Expr::Binary(_) => ExprKind::Binary,
            Expr::TypeTest(_) => ExprKind::TypeTest,
            Expr::Conditional(_) => ExprKind::Conditional,
            Expr::Constant(_) => ExprKind::Constant,
            Expr::Parameter(_) => ExprKind::Parameter,
            Expr::MemberAccess(_) => ExprKind::MemberAccess,
            Expr::Call(_) => ExprKind::Call,
            Expr::Lambda(_) => ExprKind::Lambda,
            Expr::New(_) => ExprKind::New,
            Expr::NewArray(_) => ExprKind::NewArray,
            Expr::Invoke(_) => ExprKind::Invoke,
            Expr::MemberInit(_) => ExprKind::MemberInit,
            Expr::ListInit(_) => ExprKind::ListInit,
            Expr::Extension(_) => ExprKind::Extension,
        }
    }

    /// Direct child nodes, in the order the rewriting engine visits them.
    ///
    /// Children held by value inside their parent (a coalesce conversion, the `New` of an
    /// initializer, lambda parameters) are materialized as owned nodes. Expressions inside
    /// member bindings are not included; see [`walk`].
    pub fn children(&self) -> Vec<Cow<'_, Expr>> {
        let mut children = Vec::new();
        match self {
            Expr::Unary(e) => children.push(Cow::Borrowed(&*e.operand)),
            Expr::Binary(e) => {
                children.push(Cow::Borrowed(&*e.left));
                children.push(Cow::Borrowed(&*e.right));
                if let Some(conversion) = e.conversion() {
                    children.push(Cow::Owned(Expr::Lambda(conversion.clone())));
                }
            }
            Expr::TypeTest(e) => children.push(Cow::Borrowed(&*e.operand)),
            Expr::Conditional(e) => {
                children.push(Cow::Borrowed(&*e.test));
                children.push(Cow::Borrowed(&*e.if_true));
                children.push(Cow::Borrowed(&*e.if_false));
            }
            Expr::Constant(_) | Expr::Parameter(_) => {}
            Expr::MemberAccess(e) => {
                if let Some(object) = &e.object {
                    children.push(Cow::Borrowed(&**object));
                }
            }
            Expr::Call(e) => {
                if let Some(object) = &e.object {
                    children.push(Cow::Borrowed(&**object));
                }
                push_all(&mut children, &e.arguments);
            }
            Expr::Lambda(e) => {
                for parameter in e.parameters.iter() {
                    children.push(Cow::Owned(Expr::Parameter(parameter.clone())));
                }
                children.push(Cow::Borrowed(&*e.body));
            }
            Expr::New(e) => push_all(&mut children, &e.arguments),
            Expr::NewArray(e) => push_all(&mut children, &e.expressions),
            Expr::Invoke(e) => {
                children.push(Cow::Borrowed(&*e.target));
                push_all(&mut children, &e.arguments);
            }
            Expr::MemberInit(e) => children.push(Cow::Owned(Expr::New(e.new_expression.clone()))),
            Expr::ListInit(e) => {
                children.push(Cow::Owned(Expr::New(e.new_expression.clone())));
                for initializer in e.initializers.iter() {
                    push_all(&mut children, &initializer.arguments);
                }
            }
            Expr::Extension(e) => push_all(&mut children, &e.operands),
        }
        children
    }

    /// Number of nodes in the tree, bindings' expressions included.
    pub fn node_count(&self) -> usize {
        let mut counter = NodeCounter::default();
        walk(self, &mut counter);
        counter.count
    }

    /// Length of the longest root-to-leaf path; a leaf has depth 1.
    ///
    /// Rewriting recurses once per level, so this bounds the stack the engine needs.
    /// Measuring it uses heap memory only.
    pub fn depth(&self) -> usize {
        let mut counter = NodeCounter::default();
        walk(self, &mut counter);
        counter.max_depth
    }

    /// Whether some path is longer than `limit`, stopping at the first node past it.
    pub fn exceeds_depth(&self, limit: usize) -> bool {
        let mut exceeded = false;
        traverse(self, |visited, depth| {
            if matches!(visited, Visited::Node(_)) && depth > limit {
                exceeded = true;
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });
        exceeded
    }
}

fn push_all<'a>(children: &mut Vec<Cow<'a, Expr>>, nodes: &'a ExprVector) {
    children.extend(nodes.iter().map(|n| Cow::Borrowed(&**n)));
}

/// Pre-order walk over every node, descending into member bindings.
///
/// The walk keeps its own stack, so arbitrarily deep trees can be observed.
pub fn walk(root: &Expr, observer: &mut dyn NodeObserver) {
    traverse(root, |visited, depth| {
        match visited {
            Visited::Node(node) => observer.observe(node, depth),
            Visited::Binding(binding) => observer.observe_binding(binding, depth),
        }
        ControlFlow::Continue(())
    });
}

enum Visited<'a> {
    Node(&'a Expr),
    Binding(&'a MemberBinding),
}

/// Work left on the traversal stack. Owned entries come from children that only exist
/// as values (see [`Expr::children`]).
enum Pending<'a> {
    Node(Cow<'a, Expr>, usize),
    Binding(Cow<'a, MemberBinding>, usize),
}

impl Pending<'_> {
    fn into_owned<'b>(self) -> Pending<'b> {
        match self {
            Pending::Node(node, depth) => Pending::Node(Cow::Owned(node.into_owned()), depth),
            Pending::Binding(binding, depth) => Pending::Binding(Cow::Owned(binding.into_owned()), depth),
        }
    }
}

fn traverse<'a>(root: &'a Expr, mut visit: impl FnMut(Visited<'_>, usize) -> ControlFlow<()>) {
    let mut stack = vec![Pending::Node(Cow::Borrowed(root), 1)];
    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Node(Cow::Borrowed(node), depth) => {
                if visit(Visited::Node(node), depth).is_break() {
                    return;
                }
                stack.extend(node_successors(node, depth).into_iter().rev());
            }
            Pending::Node(Cow::Owned(node), depth) => {
                if visit(Visited::Node(&node), depth).is_break() {
                    return;
                }
                stack.extend(node_successors(&node, depth).into_iter().rev().map(Pending::into_owned));
            }
            Pending::Binding(Cow::Borrowed(binding), depth) => {
                if visit(Visited::Binding(binding), depth).is_break() {
                    return;
                }
                stack.extend(binding_successors(binding, depth).into_iter().rev());
            }
            Pending::Binding(Cow::Owned(binding), depth) => {
                if visit(Visited::Binding(&binding), depth).is_break() {
                    return;
                }
                stack.extend(binding_successors(&binding, depth).into_iter().rev().map(Pending::into_owned));
            }
        }
    }
}

/// Children first, then the bindings of an object initializer.
fn node_successors(node: &Expr, depth: usize) -> Vec<Pending<'_>> {
    let mut next: Vec<Pending<'_>> = node
        .children()
        .into_iter()
        .map(|child| Pending::Node(child, depth + 1))
        .collect();
    if let Expr::MemberInit(e) = node {
        next.extend(e.bindings.iter().map(|b| Pending::Binding(Cow::Borrowed(b), depth + 1)));
    }
    next
}

fn binding_successors(binding: &MemberBinding, depth: usize) -> Vec<Pending<'_>> {
    match binding {
        MemberBinding::Assignment(b) => vec![Pending::Node(Cow::Borrowed(&*b.expression), depth + 1)],
        MemberBinding::MemberBinding(b) => b
            .bindings
            .iter()
            .map(|nested| Pending::Binding(Cow::Borrowed(nested), depth + 1))
            .collect(),
        MemberBinding::ListBinding(b) => b
            .initializers
            .iter()
            .flat_map(|initializer| initializer.arguments.iter())
            .map(|argument| Pending::Node(Cow::Borrowed(&**argument), depth + 1))
            .collect(),
        MemberBinding::Extension(_) => Vec::new(),
    }
}

#[derive(Default)]
struct NodeCounter {
    count: usize,
    max_depth: usize,
}

impl NodeObserver for NodeCounter {
    fn observe(&mut self, _node: &Expr, depth: usize) {
        self.count += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// Collects every node kind encountered, in walk order.
#[derive(Debug, Default)]
pub struct KindCollector {
    pub kinds: Vec<ExprKind>,
}

impl NodeObserver for KindCollector {
    fn observe(&mut self, node: &Expr, _depth: usize) {
        self.kinds.push(node.kind());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ir::members::MemberRef;
    use crate::ir::types::TypeRef;

    #[test]
    fn test_depth_and_count() {
        let x = ParameterExpr::new("x", TypeRef::int32());
        // x => ((x + 1) + 2)
        let body = Expr::add(Expr::add(Expr::parameter(&x), Expr::int(1)), Expr::int(2));
        let lambda = Expr::lambda(vec![x], body);
        // lambda, param, outer add, inner add, x, 1, 2
        assert_eq!(lambda.node_count(), 7);
        assert_eq!(lambda.depth(), 4);
        assert_eq!(Expr::int(1).depth(), 1);
    }

    #[test]
    fn test_depth_of_chain_longer_than_the_stack() {
        let mut chain = Expr::int(0);
        for _ in 0..100_000 {
            chain = Expr::negate(chain);
        }
        assert_eq!(chain.depth(), 100_001);
        assert!(chain.exceeds_depth(16));
        assert!(!chain.exceeds_depth(100_001));
        std::mem::forget(chain);
    }

    #[test]
    fn test_exceeds_depth_counts_binding_levels() {
        let product = TypeRef::named("Product");
        let ctor = crate::ir::members::ConstructorRef::new(product.clone(), vec![]);
        let name = MemberRef::property(product, "Name", TypeRef::string());
        // MemberInit (1), binding (2), constant (3)
        let init = Arc::new(Expr::MemberInit(MemberInitExpr::new(
            NewExpr::new(ctor, Vec::new()),
            vec![MemberBinding::assign(name, Expr::string("bolt"))],
        )));
        assert_eq!(init.depth(), 3);
        assert!(init.exceeds_depth(2));
        assert!(!init.exceeds_depth(3));
    }

    #[test]
    fn test_walk_descends_into_bindings() {
        let product = TypeRef::named("Product");
        let ctor = crate::ir::members::ConstructorRef::new(product.clone(), vec![]);
        let name = MemberRef::property(product, "Name", TypeRef::string());
        let init = Arc::new(Expr::MemberInit(MemberInitExpr::new(
            NewExpr::new(ctor, Vec::new()),
            vec![MemberBinding::assign(name, Expr::string("bolt"))],
        )));

        let mut collector = KindCollector::default();
        walk(&init, &mut collector);
        assert_eq!(
            collector.kinds,
            vec![ExprKind::MemberInit, ExprKind::New, ExprKind::Constant]
        );
    }
}
