use std::marker::PhantomData;

use crate::{
    database::ValueType,
    expr::{ComparatorOp, Expr, Expression, IntoExpression, Operand, Predicate, SqlType},
};

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub when: Predicate,
    pub then: Expr,
}

/// Searched case: branches are tried in order, first match wins, and the
/// fallback (null when absent) applies when nothing matches.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub branches: Vec<CaseBranch>,
    pub otherwise: Option<Box<Expr>>,
}

impl CaseExpr {
    pub fn value_type(&self) -> ValueType {
        self.branches.iter()
            .map(|b| b.then.value_type())
            .chain(self.otherwise.iter().map(|o| o.value_type()))
            .fold(ValueType::Null, ValueType::promote)
    }
}

/// Entry point for searched case expressions:
/// `CaseBuilder::new().when(p).then(v).when(q).then(w).otherwise(x)`.
#[derive(Debug, Default)]
pub struct CaseBuilder;

impl CaseBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn when(self, when: Predicate) -> FirstWhen {
        FirstWhen { when }
    }
}

pub struct FirstWhen {
    when: Predicate,
}

impl FirstWhen {
    /// The first `then` fixes the result type of the whole case.
    pub fn then<R: SqlType>(self, value: impl IntoExpression<R>) -> CaseChain<R> {
        CaseChain {
            branches: vec![CaseBranch { when: self.when, then: value.into_expression().into_expr() }],
            _r: PhantomData,
        }
    }
}

pub struct CaseChain<R> {
    branches: Vec<CaseBranch>,
    _r: PhantomData<fn() -> R>,
}

impl<R: SqlType> CaseChain<R> {
    pub fn when(self, when: Predicate) -> CaseWhen<R> {
        CaseWhen { chain: self, when }
    }

    pub fn otherwise(self, value: impl IntoExpression<R>) -> Expression<R> {
        self.finish(Some(value.into_expression().into_expr()))
    }

    /// Close without a fallback: rows matching no branch yield null.
    pub fn end(self) -> Expression<R> {
        self.finish(None)
    }

    fn finish(self, otherwise: Option<Expr>) -> Expression<R> {
        Expression::from_expr(Expr::Case(CaseExpr {
            branches: self.branches,
            otherwise: otherwise.map(Box::new),
        }))
    }
}

pub struct CaseWhen<R> {
    chain: CaseChain<R>,
    when: Predicate,
}

impl<R: SqlType> CaseWhen<R> {
    pub fn then(mut self, value: impl IntoExpression<R>) -> CaseChain<R> {
        self.chain.branches.push(CaseBranch { when: self.when, then: value.into_expression().into_expr() });
        self.chain
    }
}

/// Simple case over a subject expression, lowered to equality branches:
/// `age.when(10).then("ten").when(20).then("twenty").otherwise("other")`.
pub struct SimpleWhen<T> {
    subject: Expr,
    value: Expr,
    _t: PhantomData<fn() -> T>,
}

impl<T: SqlType> SimpleWhen<T> {
    pub(crate) fn new(subject: Expr, value: Operand<T::Class>) -> Self {
        Self { subject, value: value.into_expr(), _t: PhantomData }
    }

    pub fn then<R: SqlType>(self, result: impl IntoExpression<R>) -> SimpleCase<T, R> {
        let when = Predicate::Compare { left: self.subject.clone(), op: ComparatorOp::Eq, right: self.value };
        SimpleCase {
            subject: self.subject,
            chain: CaseChain {
                branches: vec![CaseBranch { when, then: result.into_expression().into_expr() }],
                _r: PhantomData,
            },
            _t: PhantomData,
        }
    }
}

pub struct SimpleCase<T, R> {
    subject: Expr,
    chain: CaseChain<R>,
    _t: PhantomData<fn() -> T>,
}

impl<T: SqlType, R: SqlType> SimpleCase<T, R> {
    pub fn when(self, value: impl Into<Operand<T::Class>>) -> SimpleCaseWhen<T, R> {
        let when = Predicate::Compare {
            left: self.subject.clone(),
            op: ComparatorOp::Eq,
            right: value.into().into_expr(),
        };
        SimpleCaseWhen { case: self, when }
    }

    pub fn otherwise(self, value: impl IntoExpression<R>) -> Expression<R> {
        self.chain.otherwise(value)
    }

    pub fn end(self) -> Expression<R> {
        self.chain.end()
    }
}

pub struct SimpleCaseWhen<T, R> {
    case: SimpleCase<T, R>,
    when: Predicate,
}

impl<T: SqlType, R: SqlType> SimpleCaseWhen<T, R> {
    pub fn then(mut self, result: impl IntoExpression<R>) -> SimpleCase<T, R> {
        self.case.chain.branches.push(CaseBranch { when: self.when, then: result.into_expression().into_expr() });
        self.case
    }
}
