use serde_json::Value;

use crate::{
    expr::{CaseExpr, Expr, Function, FunctionKind, Literal, OrderSpecifier, NullOrdering, Predicate, Truth, UnaryOp},
    translator::Dialect,
};

/// Accumulates SQL text and the parameters its placeholders refer to, in
/// textual order.
pub struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect, sql: String::new(), params: Vec::new() }
    }

    pub fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Write `intro` followed by the items separated by `ligature`; nothing
    /// when there are no items.
    pub fn optional_clause<T>(&mut self, intro: &str, ligature: &str, items: &[T], mut render: impl FnMut(&mut Self, &T)) {
        if let Some((first, rest)) = items.split_first() {
            self.push(" ");
            self.push(intro);
            self.push(" ");
            render(self, first);
            for item in rest {
                self.push(ligature);
                render(self, item);
            }
        }
    }

    /// Null is inlined; every other literal becomes a parameter.
    pub fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Null => self.push("NULL"),
            other => {
                self.params.push(other.to_json());
                let placeholder = self.dialect.placeholder(self.params.len());
                self.push(&placeholder);
            }
        }
    }

    pub fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Column(c) => self.push(&format!("{}.{}", c.alias, c.name)),
            Expr::Literal(l) => self.literal(l),
            Expr::Unary { op: UnaryOp::Neg, expr } => {
                self.push("-(");
                self.expr(expr);
                self.push(")");
            }
            Expr::Unary { op: UnaryOp::StringValue, expr } => {
                self.push("CAST(");
                self.expr(expr);
                self.push(" AS VARCHAR)");
            }
            Expr::Unary { op: UnaryOp::ToFloat, expr } => {
                self.push("CAST(");
                self.expr(expr);
                self.push(" AS DOUBLE PRECISION)");
            }
            Expr::Binary { left, op, right } => {
                self.push("(");
                self.expr(left);
                self.push(&format!(" {} ", op));
                self.expr(right);
                self.push(")");
            }
            Expr::Function(f) => self.function(f),
            Expr::Case(c) => self.case(c),
            Expr::SubQuery(q) => {
                self.push("(");
                self.nested_select(q);
                self.push(")");
            }
        }
    }

    fn function(&mut self, f: &Function) {
        self.push(&f.kind.name().to_uppercase());
        self.push("(");
        if f.kind == FunctionKind::Count && f.args.is_empty() {
            self.push("*");
        }
        if f.distinct {
            self.push("DISTINCT ");
        }
        for (i, arg) in f.args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(arg);
        }
        self.push(")");
    }

    fn case(&mut self, c: &CaseExpr) {
        self.push("CASE");
        for branch in &c.branches {
            self.push(" WHEN ");
            self.predicate(&branch.when);
            self.push(" THEN ");
            self.expr(&branch.then);
        }
        if let Some(otherwise) = &c.otherwise {
            self.push(" ELSE ");
            self.expr(otherwise);
        }
        self.push(" END");
    }

    pub fn predicate(&mut self, p: &Predicate) {
        match p {
            Predicate::And(v) => self.junction(v, " AND "),
            Predicate::Or(v) => self.junction(v, " OR "),
            Predicate::Not(inner) => {
                self.push("NOT ");
                self.nested(inner);
            }
            Predicate::Compare { left, op, right } => {
                self.expr(left);
                self.push(&format!(" {} ", op));
                self.expr(right);
            }
            Predicate::IsNull { expr, negated } => {
                self.expr(expr);
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            // An empty list matches nothing.
            Predicate::InList { list, negated, .. } if list.is_empty() => {
                self.push(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Predicate::InList { expr, list, negated } => {
                self.expr(expr);
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(item);
                }
                self.push(")");
            }
            Predicate::InSubQuery { expr, query, negated } => {
                self.expr(expr);
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                self.nested_select(query);
                self.push(")");
            }
            Predicate::Exists { query, negated } => {
                self.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                self.nested_select(query);
                self.push(")");
            }
            Predicate::Between { expr, low, high } => {
                self.expr(expr);
                self.push(" BETWEEN ");
                self.expr(low);
                self.push(" AND ");
                self.expr(high);
            }
            Predicate::Like { expr, pattern, negated } => {
                self.expr(expr);
                self.push(if *negated { " NOT LIKE " } else { " LIKE " });
                self.expr(pattern);
                self.push(" ESCAPE '\\'");
            }
            Predicate::Const3(Truth::True) => self.push("1 = 1"),
            Predicate::Const3(Truth::False) => self.push("1 = 0"),
            Predicate::Const3(Truth::Unknown) => self.push("NULL"),
        }
    }

    fn junction(&mut self, items: &[Predicate], ligature: &str) {
        match items {
            [] => self.push(if ligature == " AND " { "1 = 1" } else { "1 = 0" }),
            [single] => self.predicate(single),
            _ => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(ligature);
                    }
                    self.nested(item);
                }
            }
        }
    }

    /// Compound predicates nested in another are parenthesised.
    fn nested(&mut self, p: &Predicate) {
        if matches!(p, Predicate::And(v) | Predicate::Or(v) if v.len() > 1) {
            self.push("(");
            self.predicate(p);
            self.push(")");
        } else {
            self.predicate(p);
        }
    }

    pub fn order(&mut self, order: &OrderSpecifier) {
        self.expr(&order.expr);
        if !order.ascending {
            self.push(" DESC");
        }
        match order.nulls {
            NullOrdering::Default => {}
            NullOrdering::First => self.push(" NULLS FIRST"),
            NullOrdering::Last => self.push(" NULLS LAST"),
        }
    }
}
