use crate::{
    expr::{CaseBranch, CaseExpr, Column, Expr, Function, FunctionKind, Predicate},
};

/// Alias under which aggregate outputs and computed group keys live in
/// aggregated rows. `#` never appears in entity aliases.
pub const AGGREGATE_SCOPE: &str = "#agg";

/// A normalized aggregate call extracted from expressions.
#[derive(Clone, PartialEq, Debug)]
pub struct AggregateCall {
    pub kind: FunctionKind,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

impl From<&Function> for AggregateCall {
    fn from(f: &Function) -> Self {
        Self { kind: f.kind, args: f.args.clone(), distinct: f.distinct }
    }
}

impl AggregateCall {
    pub fn to_expr(&self) -> Expr {
        Expr::Function(Function { kind: self.kind, args: self.args.clone(), distinct: self.distinct })
    }

    /// Collect aggregate calls of `expr` into `calls`, deduplicated, in first
    /// appearance order. Subqueries aggregate on their own.
    pub fn collect_in_expr(expr: &Expr, calls: &mut Vec<AggregateCall>) {
        match expr {
            Expr::Function(f) if f.kind.is_aggregate() => {
                let call = AggregateCall::from(f);
                if !calls.contains(&call) {
                    calls.push(call);
                }
            }
            Expr::Function(f) => f.args.iter().for_each(|a| Self::collect_in_expr(a, calls)),
            Expr::Unary { expr, .. } => Self::collect_in_expr(expr, calls),
            Expr::Binary { left, right, .. } => {
                Self::collect_in_expr(left, calls);
                Self::collect_in_expr(right, calls);
            }
            Expr::Case(c) => {
                for b in &c.branches {
                    Self::collect_in_predicate(&b.when, calls);
                    Self::collect_in_expr(&b.then, calls);
                }
                if let Some(o) = &c.otherwise {
                    Self::collect_in_expr(o, calls);
                }
            }
            Expr::Column(_) | Expr::Literal(_) | Expr::SubQuery(_) => {}
        }
    }

    pub fn collect_in_predicate(p: &Predicate, calls: &mut Vec<AggregateCall>) {
        match p {
            Predicate::And(v) | Predicate::Or(v) => v.iter().for_each(|x| Self::collect_in_predicate(x, calls)),
            Predicate::Not(x) => Self::collect_in_predicate(x, calls),
            Predicate::Compare { left, right, .. } => {
                Self::collect_in_expr(left, calls);
                Self::collect_in_expr(right, calls);
            }
            Predicate::IsNull { expr, .. } | Predicate::InSubQuery { expr, .. } => Self::collect_in_expr(expr, calls),
            Predicate::InList { expr, list, .. } => {
                Self::collect_in_expr(expr, calls);
                list.iter().for_each(|e| Self::collect_in_expr(e, calls));
            }
            Predicate::Between { expr, low, high } => {
                Self::collect_in_expr(expr, calls);
                Self::collect_in_expr(low, calls);
                Self::collect_in_expr(high, calls);
            }
            Predicate::Like { expr, pattern, .. } => {
                Self::collect_in_expr(expr, calls);
                Self::collect_in_expr(pattern, calls);
            }
            Predicate::Exists { .. } | Predicate::Const3(_) => {}
        }
    }

    /// Replace every expression found in `names` by the column holding its
    /// value in the aggregated row.
    pub fn rewrite_expr(expr: &Expr, names: &[(Expr, Column)]) -> Expr {
        if let Some((_, column)) = names.iter().find(|(e, _)| e == expr) {
            return Expr::Column(column.clone());
        }
        match expr {
            Expr::Function(f) => Expr::Function(Function {
                kind: f.kind,
                args: f.args.iter().map(|a| Self::rewrite_expr(a, names)).collect(),
                distinct: f.distinct,
            }),
            Expr::Unary { op, expr } => Expr::Unary { op: *op, expr: Box::new(Self::rewrite_expr(expr, names)) },
            Expr::Binary { left, op, right } => Expr::Binary {
                left: Box::new(Self::rewrite_expr(left, names)),
                op: *op,
                right: Box::new(Self::rewrite_expr(right, names)),
            },
            Expr::Case(c) => Expr::Case(CaseExpr {
                branches: c.branches.iter()
                    .map(|b| CaseBranch {
                        when: Self::rewrite_predicate(&b.when, names),
                        then: Self::rewrite_expr(&b.then, names),
                    })
                    .collect(),
                otherwise: c.otherwise.as_ref().map(|o| Box::new(Self::rewrite_expr(o, names))),
            }),
            _ => expr.clone(),
        }
    }

    pub fn rewrite_predicate(p: &Predicate, names: &[(Expr, Column)]) -> Predicate {
        let rw = |e: &Expr| Self::rewrite_expr(e, names);
        match p {
            Predicate::And(v) => Predicate::And(v.iter().map(|x| Self::rewrite_predicate(x, names)).collect()),
            Predicate::Or(v) => Predicate::Or(v.iter().map(|x| Self::rewrite_predicate(x, names)).collect()),
            Predicate::Not(x) => Predicate::Not(Box::new(Self::rewrite_predicate(x, names))),
            Predicate::Compare { left, op, right } => Predicate::Compare { left: rw(left), op: *op, right: rw(right) },
            Predicate::IsNull { expr, negated } => Predicate::IsNull { expr: rw(expr), negated: *negated },
            Predicate::InList { expr, list, negated } => Predicate::InList {
                expr: rw(expr),
                list: list.iter().map(rw).collect(),
                negated: *negated,
            },
            Predicate::InSubQuery { expr, query, negated } => Predicate::InSubQuery {
                expr: rw(expr),
                query: query.clone(),
                negated: *negated,
            },
            Predicate::Between { expr, low, high } => Predicate::Between { expr: rw(expr), low: rw(low), high: rw(high) },
            Predicate::Like { expr, pattern, negated } => Predicate::Like { expr: rw(expr), pattern: rw(pattern), negated: *negated },
            Predicate::Exists { .. } | Predicate::Const3(_) => p.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::ValueType,
        expr::{BinaryOp, ComparatorOp, Literal, Truth},
    };

    fn col(name: &str) -> Expr {
        Expr::Column(Column::new("t", name, ValueType::Int, true))
    }

    fn agg(kind: FunctionKind, arg: Expr, distinct: bool) -> Expr {
        Expr::Function(Function { kind, args: vec![arg], distinct })
    }

    fn out(name: &str) -> Column {
        Column::new(AGGREGATE_SCOPE, name, ValueType::Int, true)
    }

    #[test]
    fn collect_deduplicates_and_keeps_order() {
        let mut calls = Vec::new();
        let sum = agg(FunctionKind::Sum, col("amt"), false);
        let twice = Expr::Binary { left: Box::new(sum.clone()), op: BinaryOp::Add, right: Box::new(sum.clone()) };
        AggregateCall::collect_in_expr(&twice, &mut calls);
        AggregateCall::collect_in_predicate(
            &Predicate::Compare { left: agg(FunctionKind::Max, col("x"), false), op: ComparatorOp::Gt, right: Literal::Int(1).into() },
            &mut calls,
        );
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, FunctionKind::Sum);
        assert_eq!(calls[1].kind, FunctionKind::Max);
    }

    #[test]
    fn distinct_and_plain_calls_are_different() {
        let mut calls = Vec::new();
        AggregateCall::collect_in_expr(&agg(FunctionKind::Count, col("id"), true), &mut calls);
        AggregateCall::collect_in_expr(&agg(FunctionKind::Count, col("id"), false), &mut calls);
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn rewrite_replaces_nested_aggregates() {
        let sum = agg(FunctionKind::Sum, col("amt"), false);
        let names = vec![(sum.clone(), out("sum"))];
        let e = Expr::Function(Function::new(FunctionKind::Coalesce, vec![sum, Literal::Int(0).into()]));
        match AggregateCall::rewrite_expr(&e, &names) {
            Expr::Function(f) => assert_eq!(f.args[0], Expr::Column(out("sum"))),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn rewrite_walks_predicates_and_keeps_constants() {
        let cnt = agg(FunctionKind::Count, col("id"), false);
        let names = vec![(cnt.clone(), out("count"))];
        let p = Predicate::And(vec![
            Predicate::Between { expr: cnt, low: Literal::Int(1).into(), high: Literal::Int(3).into() },
            Predicate::Const3(Truth::Unknown),
        ]);
        let Predicate::And(v) = AggregateCall::rewrite_predicate(&p, &names) else { panic!("expected And") };
        assert!(matches!(&v[0], Predicate::Between { expr: Expr::Column(c), .. } if c.name == "count"));
        assert_eq!(v[1], Predicate::Const3(Truth::Unknown));
    }
}
