use std::{fmt, marker::PhantomData};

use serde_json::Value;

use crate::{
    database::ValueType,
    error::QueryError,
    expr::{BinaryOp, ComparatorOp, Expr, Function, FunctionKind, Literal, OrderSpecifier, Predicate, SimpleWhen, UnaryOp},
    query::{SelectItem, SubQuery},
};

/// Comparison class of a value type. Operands of one class may be compared
/// with each other; the classes never mix.
pub trait TypeClass: 'static {}

/// Classes with a total order, usable with `gt`, `between`, `max`...
pub trait Ordered: TypeClass {}

pub struct Numeric;
pub struct Text;
pub struct Boolean;

impl TypeClass for Numeric {}
impl TypeClass for Text {}
impl TypeClass for Boolean {}
impl Ordered for Numeric {}
impl Ordered for Text {}

/// Rust types that have a column counterpart.
pub trait SqlType: Sized + Clone + 'static {
    const VALUE_TYPE: ValueType;
    type Class: TypeClass;

    fn into_literal(self) -> Literal;

    /// Read a non-null value.
    fn from_value(v: &Value) -> Result<Self, QueryError>;
}

fn unexpected(expected: ValueType, v: &Value) -> QueryError {
    QueryError::mapping(format!("expected {:?}, got {}", expected, v))
}

impl SqlType for i64 {
    const VALUE_TYPE: ValueType = ValueType::Int;
    type Class = Numeric;

    fn into_literal(self) -> Literal {
        Literal::Int(self)
    }

    fn from_value(v: &Value) -> Result<Self, QueryError> {
        v.as_i64().ok_or_else(|| unexpected(Self::VALUE_TYPE, v))
    }
}

impl SqlType for f64 {
    const VALUE_TYPE: ValueType = ValueType::Float;
    type Class = Numeric;

    fn into_literal(self) -> Literal {
        Literal::float(self)
    }

    fn from_value(v: &Value) -> Result<Self, QueryError> {
        v.as_f64().ok_or_else(|| unexpected(Self::VALUE_TYPE, v))
    }
}

impl SqlType for String {
    const VALUE_TYPE: ValueType = ValueType::String;
    type Class = Text;

    fn into_literal(self) -> Literal {
        Literal::String(self)
    }

    fn from_value(v: &Value) -> Result<Self, QueryError> {
        v.as_str().map(str::to_string).ok_or_else(|| unexpected(Self::VALUE_TYPE, v))
    }
}

impl SqlType for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;
    type Class = Boolean;

    fn into_literal(self) -> Literal {
        Literal::Bool(self)
    }

    fn from_value(v: &Value) -> Result<Self, QueryError> {
        v.as_bool().ok_or_else(|| unexpected(Self::VALUE_TYPE, v))
    }
}

/// Right-hand side of a comparison: a literal, an expression or a subquery
/// of the same type class as the left-hand side.
pub struct Operand<C> {
    expr: Expr,
    _class: PhantomData<fn() -> C>,
}

impl<C: TypeClass> Operand<C> {
    pub(crate) fn new(expr: Expr) -> Self {
        Self { expr, _class: PhantomData }
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

macro_rules! literal_operand {
    ($($t:ty => $class:ty),* $(,)?) => {
        $(
            impl From<$t> for Operand<$class> {
                fn from(v: $t) -> Self {
                    Operand::new(Expr::Literal(SqlType::into_literal(v)))
                }
            }
        )*
    };
}

literal_operand!(i64 => Numeric, f64 => Numeric, String => Text, bool => Boolean);

impl From<i32> for Operand<Numeric> {
    fn from(v: i32) -> Self {
        Operand::new(Expr::Literal(Literal::Int(i64::from(v))))
    }
}

impl From<&str> for Operand<Text> {
    fn from(v: &str) -> Self {
        Operand::new(Expr::Literal(Literal::String(v.to_string())))
    }
}

impl<T: SqlType> From<Expression<T>> for Operand<T::Class> {
    fn from(e: Expression<T>) -> Self {
        Operand::new(e.expr)
    }
}

impl<T: SqlType> From<&Expression<T>> for Operand<T::Class> {
    fn from(e: &Expression<T>) -> Self {
        Operand::new(e.expr.clone())
    }
}

impl<T: SqlType> From<SubQuery<T>> for Operand<T::Class> {
    fn from(q: SubQuery<T>) -> Self {
        Operand::new(Expr::SubQuery(Box::new(q.into_descriptor())))
    }
}

/// Values that can stand in an expression position of type `T`: literals of
/// `T` and expressions of `T`.
pub trait IntoExpression<T> {
    fn into_expression(self) -> Expression<T>;
}

macro_rules! literal_expression {
    ($($t:ty => $target:ty),* $(,)?) => {
        $(
            impl IntoExpression<$target> for $t {
                fn into_expression(self) -> Expression<$target> {
                    Expression::from_expr(Expr::Literal(<$target>::from(self).into_literal()))
                }
            }
        )*
    };
}

literal_expression!(i64 => i64, i32 => i64, f64 => f64, String => String, &str => String, bool => bool);

impl<T: SqlType> IntoExpression<T> for Expression<T> {
    fn into_expression(self) -> Expression<T> {
        self
    }
}

impl<T: SqlType> IntoExpression<T> for &Expression<T> {
    fn into_expression(self) -> Expression<T> {
        self.clone()
    }
}

/// Typed view over an [`Expr`]. Comparison methods only accept operands of
/// the same type class, so mismatched comparisons do not compile.
pub struct Expression<T> {
    expr: Expr,
    _t: PhantomData<fn() -> T>,
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self { expr: self.expr.clone(), _t: PhantomData }
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({:?})", self.expr)
    }
}

/// Literal expression usable as a select item or operand.
pub fn constant<T: SqlType>(value: T) -> Expression<T> {
    Expression::from_expr(Expr::Literal(value.into_literal()))
}

impl<T: SqlType> Expression<T> {
    /// Wrap an untyped expression without checking its static type.
    pub fn from_expr(expr: Expr) -> Self {
        Self { expr, _t: PhantomData }
    }

    /// Wrap an untyped expression, checking that its static type fits `T`.
    pub fn try_from_expr(expr: Expr) -> Result<Self, QueryError> {
        let found = expr.value_type();
        if ValueType::is_assignable(T::VALUE_TYPE, found) {
            Ok(Self::from_expr(expr))
        } else {
            Err(QueryError::type_mismatch(format!("{:?}", expr), T::VALUE_TYPE, found))
        }
    }

    /// Typed null.
    pub fn null() -> Self {
        Self::from_expr(Expr::Literal(Literal::Null))
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    fn compare(&self, op: ComparatorOp, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        Predicate::Compare { left: self.expr.clone(), op, right: rhs.into().into_expr() }
    }

    fn unary(&self, op: UnaryOp) -> Expr {
        Expr::Unary { op, expr: Box::new(self.expr.clone()) }
    }

    fn binary(&self, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary { left: Box::new(self.expr.clone()), op, right: Box::new(rhs) }
    }

    fn call(&self, kind: FunctionKind, distinct: bool) -> Expr {
        Expr::Function(Function { kind, args: vec![self.expr.clone()], distinct })
    }

    pub fn eq(&self, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        self.compare(ComparatorOp::Eq, rhs)
    }

    pub fn ne(&self, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        self.compare(ComparatorOp::NotEq, rhs)
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull { expr: self.expr.clone(), negated: false }
    }

    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNull { expr: self.expr.clone(), negated: true }
    }

    pub fn in_list<O: Into<Operand<T::Class>>>(&self, list: impl IntoIterator<Item = O>) -> Predicate {
        Predicate::InList {
            expr: self.expr.clone(),
            list: list.into_iter().map(|o| o.into().into_expr()).collect(),
            negated: false,
        }
    }

    pub fn not_in<O: Into<Operand<T::Class>>>(&self, list: impl IntoIterator<Item = O>) -> Predicate {
        match self.in_list(list) {
            Predicate::InList { expr, list, .. } => Predicate::InList { expr, list, negated: true },
            other => other,
        }
    }

    /// Membership in the single-column result of a subquery.
    pub fn in_sub<U: SqlType<Class = T::Class>>(&self, query: SubQuery<U>) -> Predicate {
        Predicate::InSubQuery { expr: self.expr.clone(), query: Box::new(query.into_descriptor()), negated: false }
    }

    pub fn not_in_sub<U: SqlType<Class = T::Class>>(&self, query: SubQuery<U>) -> Predicate {
        Predicate::InSubQuery { expr: self.expr.clone(), query: Box::new(query.into_descriptor()), negated: true }
    }

    /// Select item carrying an explicit name, used by field binding and tuple lookup.
    pub fn as_(&self, alias: &str) -> SelectItem {
        SelectItem::expr(self.expr.clone()).with_alias(alias)
    }

    pub fn item(&self) -> SelectItem {
        SelectItem::expr(self.expr.clone())
    }

    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.expr.clone(), true)
    }

    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.expr.clone(), false)
    }

    pub fn count(&self) -> Expression<i64> {
        Expression::from_expr(self.call(FunctionKind::Count, false))
    }

    pub fn count_distinct(&self) -> Expression<i64> {
        Expression::from_expr(self.call(FunctionKind::Count, true))
    }

    /// Explicit conversion to text.
    pub fn string_value(&self) -> Expression<String> {
        Expression::from_expr(self.unary(UnaryOp::StringValue))
    }

    /// First non-null of this expression and `fallback`.
    pub fn coalesce(&self, fallback: impl Into<Operand<T::Class>>) -> Expression<T> {
        Expression::from_expr(Expr::Function(Function::new(
            FunctionKind::Coalesce,
            vec![self.expr.clone(), fallback.into().into_expr()],
        )))
    }

    /// Start a simple case expression over this value.
    pub fn when(&self, value: impl Into<Operand<T::Class>>) -> SimpleWhen<T> {
        SimpleWhen::new(self.expr.clone(), value.into())
    }
}

impl<T: SqlType> Expression<T>
where
    T::Class: Ordered,
{
    pub fn gt(&self, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        self.compare(ComparatorOp::Gt, rhs)
    }

    pub fn goe(&self, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        self.compare(ComparatorOp::GtEq, rhs)
    }

    pub fn lt(&self, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        self.compare(ComparatorOp::Lt, rhs)
    }

    pub fn loe(&self, rhs: impl Into<Operand<T::Class>>) -> Predicate {
        self.compare(ComparatorOp::LtEq, rhs)
    }

    /// Inclusive range.
    pub fn between(&self, low: impl Into<Operand<T::Class>>, high: impl Into<Operand<T::Class>>) -> Predicate {
        Predicate::Between { expr: self.expr.clone(), low: low.into().into_expr(), high: high.into().into_expr() }
    }

    pub fn max(&self) -> Expression<T> {
        Expression::from_expr(self.call(FunctionKind::Max, false))
    }

    pub fn min(&self) -> Expression<T> {
        Expression::from_expr(self.call(FunctionKind::Min, false))
    }
}

impl<T: SqlType<Class = Numeric>> Expression<T> {
    pub fn sum(&self) -> Expression<T> {
        Expression::from_expr(self.call(FunctionKind::Sum, false))
    }

    /// Always floating point; integer input is never truncated.
    pub fn avg(&self) -> Expression<f64> {
        Expression::from_expr(self.call(FunctionKind::Avg, false))
    }

    /// Operands share `T`; widen integers with [`Expression::to_float`] to
    /// mix them with floats.
    pub fn add(&self, rhs: impl IntoExpression<T>) -> Expression<T> {
        Expression::from_expr(self.binary(BinaryOp::Add, rhs.into_expression().into_expr()))
    }

    pub fn subtract(&self, rhs: impl IntoExpression<T>) -> Expression<T> {
        Expression::from_expr(self.binary(BinaryOp::Sub, rhs.into_expression().into_expr()))
    }

    pub fn multiply(&self, rhs: impl IntoExpression<T>) -> Expression<T> {
        Expression::from_expr(self.binary(BinaryOp::Mul, rhs.into_expression().into_expr()))
    }

    /// Integer operands divide with truncation, as in SQL.
    pub fn divide(&self, rhs: impl IntoExpression<T>) -> Expression<T> {
        Expression::from_expr(self.binary(BinaryOp::Div, rhs.into_expression().into_expr()))
    }

    pub fn negate(&self) -> Expression<T> {
        Expression::from_expr(self.unary(UnaryOp::Neg))
    }
}

impl Expression<i64> {
    /// Explicit widening to floating point, rendered as a cast.
    pub fn to_float(&self) -> Expression<f64> {
        Expression::from_expr(self.unary(UnaryOp::ToFloat))
    }
}

impl Expression<String> {
    pub fn concat(&self, rhs: impl Into<Operand<Text>>) -> Expression<String> {
        Expression::from_expr(self.binary(BinaryOp::Concat, rhs.into().into_expr()))
    }

    /// SQL `LIKE` with `%` and `_` wildcards; case-sensitive.
    pub fn like(&self, pattern: &str) -> Predicate {
        Predicate::Like {
            expr: self.expr.clone(),
            pattern: Expr::Literal(Literal::String(pattern.to_string())),
            negated: false,
        }
    }

    pub fn not_like(&self, pattern: &str) -> Predicate {
        Predicate::Like {
            expr: self.expr.clone(),
            pattern: Expr::Literal(Literal::String(pattern.to_string())),
            negated: true,
        }
    }

    pub fn contains(&self, needle: &str) -> Predicate {
        self.like(&format!("%{}%", escape_like(needle)))
    }

    pub fn starts_with(&self, prefix: &str) -> Predicate {
        self.like(&format!("{}%", escape_like(prefix)))
    }

    pub fn ends_with(&self, suffix: &str) -> Predicate {
        self.like(&format!("%{}", escape_like(suffix)))
    }

    pub fn upper(&self) -> Expression<String> {
        Expression::from_expr(self.call(FunctionKind::Upper, false))
    }

    pub fn lower(&self) -> Expression<String> {
        Expression::from_expr(self.call(FunctionKind::Lower, false))
    }

    pub fn length(&self) -> Expression<i64> {
        Expression::from_expr(self.call(FunctionKind::Length, false))
    }
}

impl Expression<bool> {
    pub fn is_true(&self) -> Predicate {
        self.eq(true)
    }

    pub fn is_false(&self) -> Predicate {
        self.eq(false)
    }
}

/// Escape `LIKE` wildcards with a backslash so `s` matches literally.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Column;
    use serde_json::json;

    fn age() -> Expression<i64> {
        Expression::from_expr(Expr::Column(Column::new("member", "age", ValueType::Int, false)))
    }

    fn username() -> Expression<String> {
        Expression::from_expr(Expr::Column(Column::new("member", "username", ValueType::String, true)))
    }

    #[test]
    fn comparisons_build_expected_predicates() {
        match age().goe(10) {
            Predicate::Compare { op: ComparatorOp::GtEq, right, .. } => assert_eq!(right, Expr::Literal(Literal::Int(10))),
            other => panic!("unexpected {other:?}"),
        }
        match age().in_list([10, 20]) {
            Predicate::InList { list, negated: false, .. } => assert_eq!(list.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(age().not_in([1]), Predicate::InList { negated: true, .. }));
        assert!(matches!(username().eq("member1"), Predicate::Compare { op: ComparatorOp::Eq, .. }));
        assert!(matches!(username().is_null(), Predicate::IsNull { negated: false, .. }));
    }

    #[test]
    fn numeric_class_mixes_int_and_float() {
        let p = age().gt(age().avg());
        let Predicate::Compare { right, .. } = p else { panic!("expected compare") };
        assert_eq!(right.value_type(), ValueType::Float);
    }

    #[test]
    fn arithmetic_static_type_matches_the_typed_result() {
        assert_eq!(age().divide(4).expr().value_type(), ValueType::Int);
        assert_eq!(age().add(age()).expr().value_type(), ValueType::Int);

        let quarter = age().to_float().divide(4.0);
        assert_eq!(quarter.expr().value_type(), ValueType::Float);
        let Expr::Binary { left, .. } = quarter.expr() else { panic!("expected binary") };
        assert!(matches!(left.as_ref(), Expr::Unary { op: UnaryOp::ToFloat, .. }));
    }

    #[test]
    fn aggregate_types() {
        assert_eq!(age().count().expr().value_type(), ValueType::Int);
        assert_eq!(age().sum().expr().value_type(), ValueType::Int);
        assert_eq!(age().avg().expr().value_type(), ValueType::Float);
        assert_eq!(username().max().expr().value_type(), ValueType::String);
        match age().count_distinct().expr() {
            Expr::Function(f) => assert!(f.distinct),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn string_helpers_escape_wildcards() {
        match username().contains("50%") {
            Predicate::Like { pattern, .. } => assert_eq!(pattern, Expr::Literal(Literal::String("%50\\%%".into()))),
            other => panic!("unexpected {other:?}"),
        }
        let joined = username().concat("_").concat(age().string_value());
        assert_eq!(joined.expr().value_type(), ValueType::String);
    }

    #[test]
    fn try_from_expr_checks_the_static_type() {
        assert!(Expression::<String>::try_from_expr(age().into_expr()).is_err());
        assert!(Expression::<f64>::try_from_expr(age().into_expr()).is_ok());
        assert!(Expression::<i64>::try_from_expr(age().avg().into_expr()).is_err());
    }

    #[test]
    fn from_value_reads_typed_values() {
        assert_eq!(i64::from_value(&json!(40)).unwrap(), 40);
        assert_eq!(f64::from_value(&json!(25)).unwrap(), 25.0);
        assert!(String::from_value(&json!(1)).is_err());
        assert!(bool::from_value(&json!(true)).unwrap());
        assert_eq!(constant(1i64).expr(), &Expr::Literal(Literal::Int(1)));
    }
}
