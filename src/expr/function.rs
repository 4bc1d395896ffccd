use crate::{database::ValueType, expr::Expr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Upper,
    Lower,
    Length,
    Coalesce,
}

impl FunctionKind {
    /// Canonical lowercase name, also the aggregate registry key.
    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Count => "count",
            FunctionKind::Sum => "sum",
            FunctionKind::Avg => "avg",
            FunctionKind::Min => "min",
            FunctionKind::Max => "max",
            FunctionKind::Upper => "upper",
            FunctionKind::Lower => "lower",
            FunctionKind::Length => "length",
            FunctionKind::Coalesce => "coalesce",
        }
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, FunctionKind::Count | FunctionKind::Sum | FunctionKind::Avg | FunctionKind::Min | FunctionKind::Max)
    }
}

/// A function call. `Count` with no arguments is `COUNT(*)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub kind: FunctionKind,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

impl Function {
    pub fn new(kind: FunctionKind, args: Vec<Expr>) -> Self {
        Self { kind, args, distinct: false }
    }

    pub fn count_star() -> Self {
        Self::new(FunctionKind::Count, Vec::new())
    }

    pub fn value_type(&self) -> ValueType {
        let arg = || self.args.first().map(Expr::value_type).unwrap_or(ValueType::Null);
        match self.kind {
            FunctionKind::Count | FunctionKind::Length => ValueType::Int,
            FunctionKind::Avg => ValueType::Float,
            FunctionKind::Upper | FunctionKind::Lower => ValueType::String,
            FunctionKind::Sum | FunctionKind::Min | FunctionKind::Max => arg(),
            FunctionKind::Coalesce => self.args.iter()
                .map(Expr::value_type)
                .fold(ValueType::Null, ValueType::promote),
        }
    }
}
