use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::{
    database::Db,
    executor::{helpers::Helpers, EngineError, PlanExecutor},
    expr::{BinaryOp, CaseExpr, ComparatorOp, Expr, Function, FunctionKind, Predicate, Truth, UnaryOp},
    planner::{PlanBuilder, PlanScope},
    query::QueryDescriptor,
};

/// A row flowing through the engine, keyed `alias.field`.
pub type Row = Map<String, Value>;

/// Evaluates expressions and predicates over a row. Columns missing from the
/// row are looked up in the enclosing query's row, which is how correlated
/// subqueries see their outer bindings.
pub struct Eval<'a> {
    db: &'a Db,
    outer: Option<&'a Row>,
}

impl<'a> Eval<'a> {
    pub fn new(db: &'a Db, outer: Option<&'a Row>) -> Self {
        Self { db, outer }
    }

    pub fn eval_scalar(&self, expr: &Expr, row: &Row) -> Result<Value, EngineError> {
        match expr {
            Expr::Literal(l) => Ok(l.to_json()),
            Expr::Column(c) => {
                let key = c.key();
                Ok(row.get(&key)
                    .or_else(|| self.outer.and_then(|o| o.get(&key)))
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            Expr::Unary { op, expr } => {
                let v = self.eval_scalar(expr, row)?;
                Self::unary(*op, v)
            }
            Expr::Binary { left, op, right } => {
                let l = self.eval_scalar(left, row)?;
                let r = self.eval_scalar(right, row)?;
                Self::binary(*op, &l, &r)
            }
            Expr::Function(f) => self.eval_scalar_function(f, row),
            Expr::Case(c) => self.eval_case(c, row),
            Expr::SubQuery(q) => {
                let mut rows = self.subquery_rows(q, row)?;
                match rows.len() {
                    0 => Ok(Value::Null),
                    1 => Ok(rows.swap_remove(0).into_iter().next().unwrap_or(Value::Null)),
                    n => Err(EngineError::ScalarSubqueryRows(n)),
                }
            }
        }
    }

    fn unary(op: UnaryOp, v: Value) -> Result<Value, EngineError> {
        match (op, v) {
            (_, Value::Null) => Ok(Value::Null),
            (UnaryOp::Neg, Value::Number(n)) => match n.as_i64() {
                Some(i) => i.checked_neg()
                    .map(Self::json_i)
                    .ok_or_else(|| EngineError::operand("-", &Value::Null, &Value::Number(n.clone()))),
                None => Ok(Self::json_f(-n.as_f64().unwrap_or_default())),
            },
            (UnaryOp::StringValue, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (UnaryOp::StringValue, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (UnaryOp::StringValue, Value::String(s)) => Ok(Value::String(s)),
            (UnaryOp::ToFloat, Value::Number(n)) => Ok(Self::json_f(n.as_f64().unwrap_or_default())),
            (op, other) => Err(EngineError::operand(format!("{:?}", op), &Value::Null, &other)),
        }
    }

    fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EngineError> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        if op == BinaryOp::Concat {
            return match (l, r) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(EngineError::operand(op, l, r)),
            };
        }
        let (Value::Number(a), Value::Number(b)) = (l, r) else {
            return Err(EngineError::operand(op, l, r));
        };

        // integer arithmetic stays integral; division truncates toward zero
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            let out = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Sub => x.checked_sub(y),
                BinaryOp::Mul => x.checked_mul(y),
                BinaryOp::Div if y == 0 => return Err(EngineError::DivisionByZero),
                BinaryOp::Div => x.checked_div(y),
                BinaryOp::Concat => None,
            };
            return out.map(Self::json_i).ok_or_else(|| EngineError::operand(op, l, r));
        }

        let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
            return Err(EngineError::operand(op, l, r));
        };
        let out = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div if y == 0.0 => return Err(EngineError::DivisionByZero),
            BinaryOp::Div => x / y,
            BinaryOp::Concat => return Err(EngineError::operand(op, l, r)),
        };
        Ok(Self::json_f(out))
    }

    fn eval_scalar_function(&self, f: &Function, row: &Row) -> Result<Value, EngineError> {
        if f.kind.is_aggregate() {
            // the planner replaces aggregates by columns of the aggregated row
            return Err(EngineError::UngroupedAggregate(f.kind.name().to_string()));
        }
        let args = f.args.iter().map(|a| self.eval_scalar(a, row)).collect::<Result<Vec<_>, _>>()?;
        match (f.kind, args.as_slice()) {
            (FunctionKind::Coalesce, _) => Ok(args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null)),
            (_, [Value::Null]) => Ok(Value::Null),
            (FunctionKind::Upper, [Value::String(s)]) => Ok(Value::String(s.to_uppercase())),
            (FunctionKind::Lower, [Value::String(s)]) => Ok(Value::String(s.to_lowercase())),
            (FunctionKind::Length, [Value::String(s)]) => Ok(Self::json_i(s.chars().count() as i64)),
            (kind, _) => Err(EngineError::operand(kind.name(), &Value::Array(args.clone()), &Value::Null)),
        }
    }

    fn eval_case(&self, c: &CaseExpr, row: &Row) -> Result<Value, EngineError> {
        for branch in &c.branches {
            if self.eval_predicate3(&branch.when, row)?.is_true() {
                return self.eval_scalar(&branch.then, row);
            }
        }
        match &c.otherwise {
            Some(o) => self.eval_scalar(o, row),
            None => Ok(Value::Null),
        }
    }

    pub fn eval_predicate3(&self, predicate: &Predicate, row: &Row) -> Result<Truth, EngineError> {
        let t = match predicate {
            Predicate::And(v) => {
                let mut acc = Truth::True;
                for p in v {
                    acc = acc.and(self.eval_predicate3(p, row)?);
                }
                acc
            }
            Predicate::Or(v) => {
                let mut acc = Truth::False;
                for p in v {
                    acc = acc.or(self.eval_predicate3(p, row)?);
                }
                acc
            }
            Predicate::Not(p) => self.eval_predicate3(p, row)?.not(),
            Predicate::Compare { left, op, right } => {
                let l = self.eval_scalar(left, row)?;
                let r = self.eval_scalar(right, row)?;
                Self::lit_cmp3(&l, *op, &r)
            }
            Predicate::IsNull { expr, negated } => {
                let t = Truth::from(self.eval_scalar(expr, row)?.is_null());
                if *negated { t.not() } else { t }
            }
            Predicate::InList { expr, list, negated } => {
                let v = self.eval_scalar(expr, row)?;
                let candidates = list.iter().map(|e| self.eval_scalar(e, row)).collect::<Result<Vec<_>, _>>()?;
                let t = Self::in3(&v, &candidates);
                if *negated { t.not() } else { t }
            }
            Predicate::InSubQuery { expr, query, negated } => {
                let v = self.eval_scalar(expr, row)?;
                let candidates: Vec<Value> = self.subquery_rows(query, row)?
                    .into_iter()
                    .map(|r| r.into_iter().next().unwrap_or(Value::Null))
                    .collect();
                let t = Self::in3(&v, &candidates);
                if *negated { t.not() } else { t }
            }
            Predicate::Exists { query, negated } => {
                let t = Truth::from(!self.subquery_rows(query, row)?.is_empty());
                if *negated { t.not() } else { t }
            }
            Predicate::Between { expr, low, high } => {
                let v = self.eval_scalar(expr, row)?;
                let lo = self.eval_scalar(low, row)?;
                let hi = self.eval_scalar(high, row)?;
                Self::lit_cmp3(&v, ComparatorOp::GtEq, &lo).and(Self::lit_cmp3(&v, ComparatorOp::LtEq, &hi))
            }
            Predicate::Like { expr, pattern, negated } => {
                let v = self.eval_scalar(expr, row)?;
                let p = self.eval_scalar(pattern, row)?;
                let t = match (&v, &p) {
                    (Value::String(s), Value::String(pat)) => Truth::from(Self::like_regex(pat)?.is_match(s)),
                    (Value::Null, _) | (_, Value::Null) => Truth::Unknown,
                    _ => return Err(EngineError::operand("LIKE", &v, &p)),
                };
                if *negated { t.not() } else { t }
            }
            Predicate::Const3(t) => *t,
        };
        Ok(t)
    }

    fn lit_cmp3(l: &Value, op: ComparatorOp, r: &Value) -> Truth {
        if l.is_null() || r.is_null() {
            return Truth::Unknown;
        }
        let Some(ord) = Helpers::compare_values(l, r) else {
            return Truth::Unknown;
        };
        let ordering_on_bools = matches!(l, Value::Bool(_)) && op.is_ordering();
        if ordering_on_bools {
            return Truth::Unknown;
        }
        Truth::from(match op {
            ComparatorOp::Eq => ord == Ordering::Equal,
            ComparatorOp::NotEq => ord != Ordering::Equal,
            ComparatorOp::Lt => ord == Ordering::Less,
            ComparatorOp::LtEq => ord != Ordering::Greater,
            ComparatorOp::Gt => ord == Ordering::Greater,
            ComparatorOp::GtEq => ord != Ordering::Less,
        })
    }

    /// `v IN (candidates)` under three-valued logic.
    fn in3(v: &Value, candidates: &[Value]) -> Truth {
        if v.is_null() {
            return if candidates.is_empty() { Truth::False } else { Truth::Unknown };
        }
        let mut has_null = false;
        for c in candidates {
            if c.is_null() {
                has_null = true;
            } else if Helpers::value_equal(v, c) {
                return Truth::True;
            }
        }
        if has_null { Truth::Unknown } else { Truth::False }
    }

    /// `%` any run, `_` one char, backslash escapes the next char.
    pub fn like_regex(pattern: &str) -> Result<Regex, EngineError> {
        let mut re = String::from("(?s)^");
        let mut chars = pattern.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '%' => re.push_str(".*"),
                '_' => re.push('.'),
                '\\' => {
                    if let Some(next) = chars.next() {
                        re.push_str(&regex::escape(&next.to_string()));
                    }
                }
                other => re.push_str(&regex::escape(&other.to_string())),
            }
        }
        re.push('$');
        Ok(Regex::new(&re)?)
    }

    /// Rows of a nested query evaluated against the current row, which
    /// becomes part of its outer scope.
    fn subquery_rows(&self, query: &QueryDescriptor, row: &Row) -> Result<Vec<Vec<Value>>, EngineError> {
        let plan = PlanBuilder::from_descriptor(query, PlanScope::Nested)
            .map_err(|e| EngineError::Plan(Box::new(e)))?;
        let mut scope = self.outer.cloned().unwrap_or_default();
        scope.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
        PlanExecutor::with_outer(self.db, &scope).execute(&plan)
    }

    fn json_i(i: i64) -> Value {
        Value::Number(Number::from(i))
    }

    fn json_f(f: f64) -> Value {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}
