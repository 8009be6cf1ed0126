//! Compact C#-like rendering of expression trees.
//!
//! `x => ((x + 1) * 2)`, `IIF(t, a, b)`, `new Product() {Id = 1}`. Every binary node is
//! fully parenthesized, so the rendering never depends on operator precedence. Used by
//! logging and by tests comparing whole trees at a glance.

use std::fmt;

use crate::ir::expr_node::{
    BinaryExpr, BinaryOperator, CallExpr, ConstantValue, ElementInit, Expr, ExprVector, LambdaExpr, MemberBinding,
    NewArrayKind, NewExpr, UnaryExpr, UnaryOperator,
};

impl BinaryOperator {
    /// Source symbol of the operator; `None` for array indexing, which renders as `a[i]`.
    pub fn symbol(&self) -> Option<&'static str> {
        use BinaryOperator::*;
        Some(match self {
            Add | AddChecked => "+",
            Subtract | SubtractChecked => "-",
            Multiply | MultiplyChecked => "*",
            Divide => "/",
            Modulo => "%",
            And => "&",
            AndAlso => "&&",
            Or => "|",
            OrElse => "||",
            LessThan => "<",
            LessThanOrEqual => "<=",
            GreaterThan => ">",
            GreaterThanOrEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            Coalesce => "??",
            RightShift => ">>",
            LeftShift => "<<",
            ExclusiveOr => "^",
            ArrayIndex => return None,
        })
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl IntoIterator<Item = T>) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &ExprVector) -> fmt::Result {
    write!(f, "(")?;
    write_list(f, arguments.iter())?;
    write!(f, ")")
}

fn write_unary(f: &mut fmt::Formatter<'_>, node: &UnaryExpr) -> fmt::Result {
    match node.op {
        UnaryOperator::Negate | UnaryOperator::NegateChecked => write!(f, "-{}", node.operand),
        UnaryOperator::Not => write!(f, "!{}", node.operand),
        UnaryOperator::Convert => write!(f, "Convert({}, {})", node.operand, node.ty),
        UnaryOperator::ConvertChecked => write!(f, "ConvertChecked({}, {})", node.operand, node.ty),
        UnaryOperator::ArrayLength => write!(f, "ArrayLength({})", node.operand),
        UnaryOperator::Quote => write!(f, "{}", node.operand),
        UnaryOperator::TypeAs => write!(f, "({} As {})", node.operand, node.ty),
    }
}

fn write_binary(f: &mut fmt::Formatter<'_>, node: &BinaryExpr) -> fmt::Result {
    match node.op.symbol() {
        Some(symbol) => write!(f, "({} {} {})", node.left, symbol, node.right),
        None => write!(f, "{}[{}]", node.left, node.right),
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, node: &CallExpr) -> fmt::Result {
    match &node.object {
        Some(object) => write!(f, "{}.{}", object, node.method.name)?,
        None => write!(f, "{}", node.method)?,
    }
    write_arguments(f, &node.arguments)
}

fn write_new(f: &mut fmt::Formatter<'_>, node: &NewExpr) -> fmt::Result {
    write!(f, "new {}", node.constructor.declaring_type)?;
    write_arguments(f, &node.arguments)
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Bool(true) => write!(f, "True"),
            ConstantValue::Bool(false) => write!(f, "False"),
            ConstantValue::Int(n) => write!(f, "{}", n),
            ConstantValue::Float(x) => write!(f, "{:?}", x),
            ConstantValue::Str(s) => write!(f, "{:?}", &**s),
            ConstantValue::Opaque(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for LambdaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.len() == 1 {
            write!(f, "{}", self.parameters[0].name)?;
        } else {
            write!(f, "(")?;
            write_list(f, self.parameters.iter().map(|p| &p.name))?;
            write!(f, ")")?;
        }
        write!(f, " => {}", self.body)
    }
}

impl fmt::Display for ElementInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.add_method.name)?;
        write_arguments(f, &self.arguments)
    }
}

impl fmt::Display for MemberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberBinding::Assignment(b) => write!(f, "{} = {}", b.member.name, b.expression),
            MemberBinding::MemberBinding(b) => {
                write!(f, "{} = {{", b.member.name)?;
                write_list(f, b.bindings.iter())?;
                write!(f, "}}")
            }
            MemberBinding::ListBinding(b) => {
                write!(f, "{} = {{", b.member.name)?;
                write_list(f, b.initializers.iter())?;
                write!(f, "}}")
            }
            MemberBinding::Extension(b) => write!(f, "{} = <{}>", b.member.name, b.kind),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Unary(e) => write_unary(f, e),
            Expr::Binary(e) => write_binary(f, e),
            Expr::TypeTest(e) => write!(f, "({} Is {})", e.operand, e.type_operand),
            Expr::Conditional(e) => write!(f, "IIF({}, {}, {})", e.test, e.if_true, e.if_false),
            Expr::Constant(e) => write!(f, "{}", e.value),
            Expr::Parameter(e) => write!(f, "{}", e.name),
            Expr::MemberAccess(e) => match &e.object {
                Some(object) => write!(f, "{}.{}", object, e.member.name),
                None => write!(f, "{}", e.member),
            },
            Expr::Call(e) => write_call(f, e),
            Expr::Lambda(e) => write!(f, "{}", e),
            Expr::New(e) => write_new(f, e),
            Expr::NewArray(e) => match e.kind {
                NewArrayKind::Init => {
                    write!(f, "new {}[] {{", e.element_type)?;
                    write_list(f, e.expressions.iter())?;
                    write!(f, "}}")
                }
                NewArrayKind::Bounds => {
                    write!(f, "new {}[", e.element_type)?;
                    write_list(f, e.expressions.iter())?;
                    write!(f, "]")
                }
            },
            Expr::Invoke(e) => {
                write!(f, "Invoke({}", e.target)?;
                for argument in e.arguments.iter() {
                    write!(f, ", {}", argument)?;
                }
                write!(f, ")")
            }
            Expr::MemberInit(e) => {
                write_new(f, &e.new_expression)?;
                write!(f, " {{")?;
                write_list(f, e.bindings.iter())?;
                write!(f, "}}")
            }
            Expr::ListInit(e) => {
                write_new(f, &e.new_expression)?;
                write!(f, " {{")?;
                write_list(f, e.initializers.iter())?;
                write!(f, "}}")
            }
            Expr::Extension(e) => {
                write!(f, "{}(", e.kind)?;
                write_list(f, e.operands.iter())?;
                write!(f, ")")
            }
        }
    }
}
