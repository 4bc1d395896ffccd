use std::fmt;

use crate::{
    database::ValueType,
    expr::{BinaryOp, CaseExpr, Column, Function, Literal, Predicate, UnaryOp},
    query::QueryDescriptor,
};

/// Untyped expression tree. Every node has a static [`ValueType`].
#[derive(Clone, PartialEq)]
pub enum Expr {
    Column(Column),
    Literal(Literal),
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    Function(Function),
    Case(CaseExpr),
    /// Scalar subquery: one row, one column.
    SubQuery(Box<QueryDescriptor>),
}

/// What [`Expr::visit`] and [`Predicate::visit`] report. Subqueries are
/// reported but not descended into; they carry their own scope.
pub enum Node<'a> {
    Column(&'a Column),
    SubQuery(&'a QueryDescriptor),
}

impl Expr {
    pub fn value_type(&self) -> ValueType {
        match self {
            Expr::Column(c) => c.ty,
            Expr::Literal(l) => l.value_type(),
            Expr::Unary { op: UnaryOp::Neg, expr } => expr.value_type(),
            Expr::Unary { op: UnaryOp::StringValue, .. } => ValueType::String,
            Expr::Unary { op: UnaryOp::ToFloat, .. } => ValueType::Float,
            Expr::Binary { op: BinaryOp::Concat, .. } => ValueType::String,
            Expr::Binary { left, right, .. } => ValueType::promote(left.value_type(), right.value_type()),
            Expr::Function(f) => f.value_type(),
            Expr::Case(c) => c.value_type(),
            Expr::SubQuery(q) => q.scalar_type(),
        }
    }

    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(Node<'a>)) {
        match self {
            Expr::Column(c) => f(Node::Column(c)),
            Expr::Literal(_) => {}
            Expr::Unary { expr, .. } => expr.visit(f),
            Expr::Binary { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expr::Function(func) => func.args.iter().for_each(|a| a.visit(f)),
            Expr::Case(c) => {
                for branch in &c.branches {
                    branch.when.visit(f);
                    branch.then.visit(f);
                }
                if let Some(o) = &c.otherwise {
                    o.visit(f);
                }
            }
            Expr::SubQuery(q) => f(Node::SubQuery(q)),
        }
    }

    /// Whether an aggregate call appears outside of any nested subquery.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Function(func) => func.kind.is_aggregate() || func.args.iter().any(Expr::contains_aggregate),
            Expr::Unary { expr, .. } => expr.contains_aggregate(),
            Expr::Binary { left, right, .. } => left.contains_aggregate() || right.contains_aggregate(),
            Expr::Case(c) => {
                c.branches.iter().any(|b| b.when.contains_aggregate() || b.then.contains_aggregate())
                    || c.otherwise.as_ref().is_some_and(|o| o.contains_aggregate())
            }
            Expr::Column(_) | Expr::Literal(_) | Expr::SubQuery(_) => false,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Expr::Column(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Column> for Expr {
    fn from(c: Column) -> Self {
        Expr::Column(c)
    }
}

impl From<Literal> for Expr {
    fn from(l: Literal) -> Self {
        Expr::Literal(l)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{:?}", c),
            Expr::Literal(l) => write!(f, "{:?}", l),
            Expr::Unary { op, expr } => write!(f, "{:?}({:?})", op, expr),
            Expr::Binary { left, op, right } => write!(f, "({:?} {} {:?})", left, op, right),
            Expr::Function(func) => write!(f, "{}{}({:?})", func.kind.name(), if func.distinct { " distinct" } else { "" }, func.args),
            Expr::Case(c) => write!(f, "{:?}", c),
            Expr::SubQuery(_) => write!(f, "SubQuery(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::FunctionKind;

    fn age() -> Expr {
        Expr::Column(Column::new("member", "age", ValueType::Int, false))
    }

    #[test]
    fn static_types_follow_operators() {
        let half = Expr::Binary { left: Box::new(age()), op: BinaryOp::Div, right: Box::new(Literal::float(2.0).into()) };
        assert_eq!(half.value_type(), ValueType::Float);

        let text = Expr::Unary { op: UnaryOp::StringValue, expr: Box::new(age()) };
        assert_eq!(text.value_type(), ValueType::String);

        let widened = Expr::Unary { op: UnaryOp::ToFloat, expr: Box::new(age()) };
        assert_eq!(widened.value_type(), ValueType::Float);

        let avg = Expr::Function(Function::new(FunctionKind::Avg, vec![age()]));
        assert_eq!(avg.value_type(), ValueType::Float);
        let sum = Expr::Function(Function::new(FunctionKind::Sum, vec![age()]));
        assert_eq!(sum.value_type(), ValueType::Int);
    }

    #[test]
    fn aggregates_are_detected_through_nesting() {
        let max = Expr::Function(Function::new(FunctionKind::Max, vec![age()]));
        let wrapped = Expr::Binary { left: Box::new(max), op: BinaryOp::Add, right: Box::new(Literal::Int(1).into()) };
        assert!(wrapped.contains_aggregate());
        assert!(!age().contains_aggregate());
    }

    #[test]
    fn visit_reports_every_column() {
        let e = Expr::Binary { left: Box::new(age()), op: BinaryOp::Add, right: Box::new(age()) };
        let mut seen = Vec::new();
        e.visit(&mut |n| if let Node::Column(c) = n { seen.push(c.key()) });
        assert_eq!(seen, vec!["member.age", "member.age"]);
    }
}
