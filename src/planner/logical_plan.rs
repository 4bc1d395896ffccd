use crate::{
    expr::{Expr, OrderSpecifier, Predicate},
    planner::AggregateCall,
    query::{EntityPath, JoinKind},
};

#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// Scan the table backing `path`; row keys are `alias.field`.
    Scan { path: EntityPath },

    /// Nested-loop join. The right side is always a scan; its columns are
    /// null-extended for unmatched left rows of a left join.
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        kind: JoinKind,
        on: Predicate,
    },

    /// Row-level filter (WHERE or HAVING depending on position in the tree).
    Filter { input: Box<LogicalPlan>, predicate: Predicate },

    /// Group-by aggregation. Output rows hold each group key under its key
    /// and each aggregate under its output name.
    Aggregate {
        input: Box<LogicalPlan>,
        group_keys: Vec<(Expr, String)>,
        aggs: Vec<(AggregateCall, String)>,
    },

    /// Stable sort, nulls placed per key.
    Sort { input: Box<LogicalPlan>, keys: Vec<OrderSpecifier> },

    /// Select list in layout order.
    Project { input: Box<LogicalPlan>, exprs: Vec<Expr> },

    /// Drop repeated projected rows, keeping the first.
    Distinct { input: Box<LogicalPlan> },

    Limit { input: Box<LogicalPlan>, limit: Option<u64>, offset: Option<u64> },
}

impl LogicalPlan {
    /// Number of values in each output row, when the plan projects.
    pub fn width(&self) -> Option<usize> {
        match self {
            LogicalPlan::Project { exprs, .. } => Some(exprs.len()),
            LogicalPlan::Distinct { input } | LogicalPlan::Limit { input, .. } => input.width(),
            _ => None,
        }
    }
}
