use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::{
    database::{Db, DbCommon},
    executor::{
        aggregators::{Accumulator, AggregateRegistry},
        eval::{Eval, Row},
        helpers::Helpers,
        EngineError,
    },
    expr::Expr,
    planner::{AggregateCall, LogicalPlan},
    query::JoinKind,
};

type GroupEntry = (Vec<Value>, Vec<Box<dyn Accumulator>>);

/// Key of the `i`-th projected value in a row leaving a `Project` node.
fn projected_key(i: usize) -> String {
    format!("#{}", i)
}

/// Runs logical plans against the tables of a [`Db`].
pub struct PlanExecutor<'a> {
    db: &'a Db,
    outer: Option<&'a Row>,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db, outer: None }
    }

    /// Executor for a subquery correlated with `outer`.
    pub fn with_outer(db: &'a Db, outer: &'a Row) -> Self {
        Self { db, outer: Some(outer) }
    }

    fn eval(&self) -> Eval<'a> {
        Eval::new(self.db, self.outer)
    }

    /// Run `plan` and return its projected rows as value sequences.
    pub fn execute(&self, plan: &LogicalPlan) -> Result<Vec<Vec<Value>>, EngineError> {
        let width = plan.width().unwrap_or(0);
        let rows = self.run_plan(plan)?;
        Ok(rows.into_iter()
            .map(|mut row| (0..width).map(|i| row.remove(&projected_key(i)).unwrap_or(Value::Null)).collect())
            .collect())
    }

    pub fn run_plan(&self, plan: &LogicalPlan) -> Result<Vec<Row>, EngineError> {
        match plan {
            LogicalPlan::Scan { path } => {
                let table = self.db.require(path.table())?;
                let columns = path.columns();
                let guard = table.read();
                let mut out = Vec::with_capacity(guard.count());
                for v in guard.rows() {
                    let Value::Object(map) = v else { continue };
                    // only declared fields, prefixed with the alias
                    let row: Row = columns.iter()
                        .map(|c| (c.key(), map.get(&c.name).cloned().unwrap_or(Value::Null)))
                        .collect();
                    out.push(row);
                }
                trace!(table = %path.table(), alias = %path.alias(), rows = out.len(), "scan");
                Ok(out)
            }
            LogicalPlan::Filter { input, predicate } => {
                let rows = self.run_plan(input)?;
                let eval = self.eval();
                let mut out = Vec::new();
                for row in rows {
                    if eval.eval_predicate3(predicate, &row)?.is_true() {
                        out.push(row);
                    }
                }
                Ok(out)
            }
            LogicalPlan::Join { left, right, kind, on } => {
                let left_rows = self.run_plan(left)?;
                let right_rows = self.run_plan(right)?;
                let right_nulls = Self::null_row(right, &right_rows);
                let eval = self.eval();

                let mut out = Vec::new();
                for l in &left_rows {
                    let mut matched = false;
                    for r in &right_rows {
                        let mut merged = l.clone();
                        merged.extend(r.iter().map(|(k, v)| (k.clone(), v.clone())));
                        if eval.eval_predicate3(on, &merged)?.is_true() {
                            out.push(merged);
                            matched = true;
                        }
                    }
                    if *kind == JoinKind::Left && !matched {
                        // left row survives with the right side null-extended
                        let mut merged = l.clone();
                        merged.extend(right_nulls.iter().map(|(k, v)| (k.clone(), v.clone())));
                        out.push(merged);
                    }
                }
                trace!(?kind, left = left_rows.len(), right = right_rows.len(), rows = out.len(), "join");
                Ok(out)
            }
            LogicalPlan::Aggregate { input, group_keys, aggs } => {
                let rows = self.run_plan(input)?;
                self.aggregate_rows(&rows, group_keys, aggs)
            }
            LogicalPlan::Sort { input, keys } => {
                let rows = self.run_plan(input)?;
                let eval = self.eval();
                let mut keyed = rows.into_iter()
                    .map(|row| -> Result<_, EngineError> {
                        let values = keys.iter().map(|k| eval.eval_scalar(&k.expr, &row)).collect::<Result<Vec<_>, _>>()?;
                        Ok((values, row))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                // stable sort
                keyed.sort_by(|(a, _), (b, _)| {
                    for (i, k) in keys.iter().enumerate() {
                        let ord = Helpers::cmp_json_for_sort(&a[i], &b[i], k.ascending, k.nulls_last_effective());
                        if ord.is_ne() {
                            return ord;
                        }
                    }
                    Ordering::Equal
                });
                Ok(keyed.into_iter().map(|(_, row)| row).collect())
            }
            LogicalPlan::Project { input, exprs } => {
                let rows = self.run_plan(input)?;
                let eval = self.eval();
                let mut out = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut projected = Row::new();
                    for (i, e) in exprs.iter().enumerate() {
                        projected.insert(projected_key(i), eval.eval_scalar(e, &row)?);
                    }
                    out.push(projected);
                }
                Ok(out)
            }
            LogicalPlan::Distinct { input } => {
                let rows = self.run_plan(input)?;
                let mut seen = HashSet::new();
                Ok(rows.into_iter().filter(|row| seen.insert(Helpers::canonical_row(row))).collect())
            }
            LogicalPlan::Limit { input, limit, offset } => {
                let rows = self.run_plan(input)?;
                let start = offset.map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
                let take = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
                Ok(rows.into_iter().skip(start).take(take).collect())
            }
        }
    }

    /// All-null row for the right side of a left join. Scans know their
    /// columns from the schema even when the table is empty.
    fn null_row(side: &LogicalPlan, rows: &[Row]) -> Row {
        match side {
            LogicalPlan::Scan { path } => path.columns().into_iter().map(|c| (c.key(), Value::Null)).collect(),
            _ => rows.iter().flat_map(|r| r.keys()).map(|k| (k.clone(), Value::Null)).collect(),
        }
    }

    fn aggregate_rows(
        &self,
        rows: &[Row],
        group_keys: &[(Expr, String)],
        aggs: &[(AggregateCall, String)],
    ) -> Result<Vec<Row>, EngineError> {
        let registry = AggregateRegistry::shared();
        let impls = aggs.iter()
            .map(|(call, _)| {
                registry.get(call.kind.name()).ok_or_else(|| EngineError::UnknownAggregate(call.kind.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let new_accumulators = || impls.iter().map(|i| i.create_accumulator()).collect::<Vec<_>>();

        let eval = self.eval();
        // first-seen order keeps group output deterministic
        let mut groups: IndexMap<String, GroupEntry> = IndexMap::new();
        let mut distinct: HashMap<(String, usize), HashSet<String>> = HashMap::new();

        for row in rows {
            let gb_vals = group_keys.iter().map(|(e, _)| eval.eval_scalar(e, row)).collect::<Result<Vec<_>, _>>()?;
            let gk = Helpers::canonical_tuple(&gb_vals);
            let entry = groups.entry(gk.clone()).or_insert_with(|| (gb_vals, new_accumulators()));

            for (i, (call, _)) in aggs.iter().enumerate() {
                let args = call.args.iter().map(|a| eval.eval_scalar(a, row)).collect::<Result<Vec<_>, _>>()?;
                if call.distinct {
                    let seen = distinct.entry((gk.clone(), i)).or_default();
                    if !seen.insert(Helpers::canonical_tuple(&args)) {
                        continue;
                    }
                }
                entry.1[i].update(&args)?;
            }
        }

        // without GROUP BY an empty input is still one group
        if groups.is_empty() && group_keys.is_empty() {
            groups.insert(String::new(), (Vec::new(), new_accumulators()));
        }

        let mut out = Vec::with_capacity(groups.len());
        for (gb_vals, accs) in groups.into_values() {
            let mut m = Row::new();
            for ((_, key), v) in group_keys.iter().zip(gb_vals) {
                m.insert(key.clone(), v);
            }
            for ((_, name), acc) in aggs.iter().zip(&accs) {
                m.insert(name.clone(), acc.finalize());
            }
            out.push(m);
        }
        trace!(groups = out.len(), aggregates = aggs.len(), "aggregate");
        Ok(out)
    }
}
