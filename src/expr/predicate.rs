use crate::{
    database::ValueType,
    error::QueryError,
    expr::{ComparatorOp, Expr, Node, Truth},
    query::QueryDescriptor,
};

/// Boolean-valued expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),

    Compare { left: Expr, op: ComparatorOp, right: Expr },
    IsNull { expr: Expr, negated: bool },
    InList { expr: Expr, list: Vec<Expr>, negated: bool },
    InSubQuery { expr: Expr, query: Box<QueryDescriptor>, negated: bool },
    Exists { query: Box<QueryDescriptor>, negated: bool },
    Between { expr: Expr, low: Expr, high: Expr },
    Like { expr: Expr, pattern: Expr, negated: bool },
    Const3(Truth),
}

fn check_compatible(context: &str, left: &Expr, right: &Expr) -> Result<(), QueryError> {
    let (l, r) = (left.value_type(), right.value_type());
    if ValueType::is_compatible(l, r) {
        Ok(())
    } else {
        Err(QueryError::type_mismatch(context, l, r))
    }
}

impl Predicate {
    /// Comparison over untyped expressions, checked for operand compatibility.
    pub fn compare(left: Expr, op: ComparatorOp, right: Expr) -> Result<Self, QueryError> {
        check_compatible(&format!("{:?} {} {:?}", left, op, right), &left, &right)?;
        if op.is_ordering() && left.value_type() == ValueType::Bool {
            return Err(QueryError::type_mismatch(format!("ordering comparison `{}`", op), ValueType::Int, ValueType::Bool));
        }
        Ok(Predicate::Compare { left, op, right })
    }

    /// `low <= expr <= high` over untyped expressions, checked like [`Predicate::compare`].
    pub fn between(expr: Expr, low: Expr, high: Expr) -> Result<Self, QueryError> {
        check_compatible("between lower bound", &expr, &low)?;
        check_compatible("between upper bound", &expr, &high)?;
        Ok(Predicate::Between { expr, low, high })
    }

    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut v) => {
                v.push(other);
                Predicate::And(v)
            }
            p => Predicate::And(vec![p, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut v) => {
                v.push(other);
                Predicate::Or(v)
            }
            p => Predicate::Or(vec![p, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction of `preds`; the empty conjunction is true.
    pub fn all(preds: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut v: Vec<_> = preds.into_iter().collect();
        match v.len() {
            0 => Predicate::Const3(Truth::True),
            1 => v.remove(0),
            _ => Predicate::And(v),
        }
    }

    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(Node<'a>)) {
        match self {
            Predicate::And(v) | Predicate::Or(v) => v.iter().for_each(|p| p.visit(f)),
            Predicate::Not(p) => p.visit(f),
            Predicate::Compare { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Predicate::IsNull { expr, .. } => expr.visit(f),
            Predicate::InList { expr, list, .. } => {
                expr.visit(f);
                list.iter().for_each(|e| e.visit(f));
            }
            Predicate::InSubQuery { expr, query, .. } => {
                expr.visit(f);
                f(Node::SubQuery(query));
            }
            Predicate::Exists { query, .. } => f(Node::SubQuery(query)),
            Predicate::Between { expr, low, high } => {
                expr.visit(f);
                low.visit(f);
                high.visit(f);
            }
            Predicate::Like { expr, pattern, .. } => {
                expr.visit(f);
                pattern.visit(f);
            }
            Predicate::Const3(_) => {}
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            Predicate::And(v) | Predicate::Or(v) => v.iter().any(Predicate::contains_aggregate),
            Predicate::Not(p) => p.contains_aggregate(),
            Predicate::Compare { left, right, .. } => left.contains_aggregate() || right.contains_aggregate(),
            Predicate::IsNull { expr, .. } | Predicate::InSubQuery { expr, .. } => expr.contains_aggregate(),
            Predicate::InList { expr, list, .. } => expr.contains_aggregate() || list.iter().any(Expr::contains_aggregate),
            Predicate::Between { expr, low, high } => {
                expr.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate()
            }
            Predicate::Like { expr, pattern, .. } => expr.contains_aggregate() || pattern.contains_aggregate(),
            Predicate::Exists { .. } | Predicate::Const3(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Column, Literal};

    fn col(name: &str, ty: ValueType) -> Expr {
        Expr::Column(Column::new("member", name, ty, true))
    }

    #[test]
    fn compare_rejects_text_against_number() {
        let err = Predicate::compare(col("age", ValueType::Int), ComparatorOp::Eq, Literal::String("ten".into()).into());
        assert!(matches!(err, Err(QueryError::TypeMismatch { .. })));

        let ok = Predicate::compare(col("age", ValueType::Int), ComparatorOp::Gt, Literal::float(9.5).into());
        assert!(ok.is_ok());
        let null = Predicate::compare(col("username", ValueType::String), ComparatorOp::Eq, Literal::Null.into());
        assert!(null.is_ok());
    }

    #[test]
    fn compare_rejects_ordering_booleans() {
        let err = Predicate::compare(col("active", ValueType::Bool), ComparatorOp::Lt, Literal::Bool(true).into());
        assert!(matches!(err, Err(QueryError::TypeMismatch { .. })));
    }

    #[test]
    fn between_checks_both_bounds() {
        let age = col("age", ValueType::Int);
        assert!(Predicate::between(age.clone(), Literal::Int(10).into(), Literal::Int(30).into()).is_ok());
        assert!(Predicate::between(age, Literal::Int(10).into(), Literal::String("z".into()).into()).is_err());
    }

    #[test]
    fn and_or_flatten_and_all_handles_edges() {
        let a = Predicate::Const3(Truth::True);
        let b = Predicate::Const3(Truth::False);
        let c = Predicate::Const3(Truth::Unknown);
        match a.clone().and(b.clone()).and(c.clone()) {
            Predicate::And(v) => assert_eq!(v.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
        assert_eq!(Predicate::all(vec![]), Predicate::Const3(Truth::True));
        assert_eq!(Predicate::all(vec![b.clone()]), b);
        assert!(matches!(a.or(c), Predicate::Or(v) if v.len() == 2));
    }
}
