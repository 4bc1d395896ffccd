use crate::{
    error::QueryError,
    expr::{Column, Expr, OrderSpecifier, Predicate, Truth},
    planner::{AggregateCall, LogicalPlan, AGGREGATE_SCOPE},
    query::{JoinKind, QueryDescriptor, SelectLayout},
};

/// Which trailing clauses a plan keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanScope {
    /// Outermost query: order, offset and limit.
    Top,
    /// Subquery: neither order nor window.
    Nested,
    /// Row count of the query: neither order nor window.
    Counted,
}

pub struct PlanBuilder;

impl PlanBuilder {
    pub fn from_descriptor(d: &QueryDescriptor, scope: PlanScope) -> Result<LogicalPlan, QueryError> {
        // sources: from-list as a cross product, then joins in order
        let mut from: Option<LogicalPlan> = None;
        for path in &d.from {
            let scan = LogicalPlan::Scan { path: path.clone() };
            from = Some(match from {
                None => scan,
                Some(left) => LogicalPlan::Join {
                    left: Box::new(left),
                    right: Box::new(scan),
                    kind: JoinKind::Cross,
                    on: Predicate::Const3(Truth::True),
                },
            });
        }
        let mut plan = from.ok_or(QueryError::MissingSource)?;

        for join in &d.joins {
            plan = LogicalPlan::Join {
                left: Box::new(plan),
                right: Box::new(LogicalPlan::Scan { path: join.target.clone() }),
                kind: join.kind,
                on: Predicate::all(join.on.iter().cloned()),
            };
        }

        if !d.filter.is_empty() {
            plan = LogicalPlan::Filter { input: Box::new(plan), predicate: Predicate::all(d.filter.iter().cloned()) };
        }

        let mut exprs: Vec<Expr> = SelectLayout::of(d).columns.into_iter().map(|c| c.expr).collect();
        let mut order: Vec<OrderSpecifier> = if scope == PlanScope::Top { d.order_by.clone() } else { Vec::new() };

        if d.is_aggregate() {
            // 1) aggregate calls from SELECT, HAVING and ORDER BY
            let mut calls: Vec<AggregateCall> = Vec::new();
            exprs.iter().for_each(|e| AggregateCall::collect_in_expr(e, &mut calls));
            d.having.iter().for_each(|p| AggregateCall::collect_in_predicate(p, &mut calls));
            order.iter().for_each(|o| AggregateCall::collect_in_expr(&o.expr, &mut calls));

            // 2) group keys: columns keep their key, computed keys get one
            let mut names: Vec<(Expr, Column)> = Vec::new();
            let mut used: Vec<String> = Vec::new();
            let mut group_keys = Vec::new();
            for (i, key_expr) in d.group_by.iter().enumerate() {
                let key = match key_expr {
                    Expr::Column(c) => c.key(),
                    other => {
                        let column = Column::new(AGGREGATE_SCOPE, &format!("group_{}", i), other.value_type(), true);
                        names.push((other.clone(), column.clone()));
                        column.key()
                    }
                };
                used.push(key.clone());
                group_keys.push((key_expr.clone(), key));
            }

            // 3) output names per call: func, func_1, func_2, ...
            let mut aggs = Vec::new();
            for call in calls {
                let base = call.kind.name();
                let mut name = base.to_string();
                let mut k = 1usize;
                while used.contains(&format!("{}.{}", AGGREGATE_SCOPE, name)) {
                    name = format!("{}_{}", base, k);
                    k += 1;
                }
                let call_expr = call.to_expr();
                let column = Column::new(AGGREGATE_SCOPE, &name, call_expr.value_type(), true);
                used.push(column.key());
                names.push((call_expr, column.clone()));
                aggs.push((call, column.key()));
            }

            plan = LogicalPlan::Aggregate { input: Box::new(plan), group_keys, aggs };

            // 4) HAVING over aggregate outputs
            if !d.having.is_empty() {
                let having = AggregateCall::rewrite_predicate(&Predicate::all(d.having.iter().cloned()), &names);
                plan = LogicalPlan::Filter { input: Box::new(plan), predicate: having };
            }

            // 5) select list and order keys read the aggregated row
            exprs = exprs.iter().map(|e| AggregateCall::rewrite_expr(e, &names)).collect();
            for o in &mut order {
                o.expr = AggregateCall::rewrite_expr(&o.expr, &names);
            }
        }

        if !order.is_empty() {
            plan = LogicalPlan::Sort { input: Box::new(plan), keys: order };
        }

        plan = LogicalPlan::Project { input: Box::new(plan), exprs };

        if d.distinct {
            plan = LogicalPlan::Distinct { input: Box::new(plan) };
        }

        if scope == PlanScope::Top && (d.limit.is_some() || d.offset.is_some()) {
            plan = LogicalPlan::Limit { input: Box::new(plan), limit: d.limit, offset: d.offset };
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{EntitySchema, Schema, ValueType},
        expr::Expression,
        query::{select, select_from, select_tuple, EntityPath},
    };

    fn paths() -> (EntityPath, EntityPath) {
        let s = Schema::new()
            .with_entity(EntitySchema::new("Team").field("name", ValueType::String, true))
            .with_entity(
                EntitySchema::new("Member")
                    .field("username", ValueType::String, true)
                    .field("age", ValueType::Int, false)
                    .field("team_id", ValueType::Int, true)
                    .relation("team", "Team", "team_id", "id"),
            );
        (s.entity("Member", "member").unwrap(), s.entity("Team", "team").unwrap())
    }

    #[test]
    fn plan_for_simple_select_where_order_limit() {
        let (member, _) = paths();
        let age: Expression<i64> = member.path("age").unwrap();
        let q = select_from(&member).filter(age.gt(10)).order_by(age.asc()).offset(10).limit(5);

        let plan = PlanBuilder::from_descriptor(q.descriptor(), PlanScope::Top).unwrap();
        let LogicalPlan::Limit { input, limit, offset } = plan else { panic!("expected Limit") };
        assert_eq!((limit, offset), (Some(5), Some(10)));
        let LogicalPlan::Project { input, exprs } = *input else { panic!("expected Project") };
        assert_eq!(exprs.len(), 4);
        let LogicalPlan::Sort { input, keys } = *input else { panic!("expected Sort") };
        assert_eq!(keys.len(), 1);
        let LogicalPlan::Filter { input, .. } = *input else { panic!("expected Filter") };
        assert!(matches!(*input, LogicalPlan::Scan { ref path } if path.alias() == "member"));
    }

    #[test]
    fn nested_and_counted_plans_drop_order_and_window() {
        let (member, _) = paths();
        let age: Expression<i64> = member.path("age").unwrap();
        let q = select_from(&member).order_by(age.desc()).limit(2);
        for scope in [PlanScope::Nested, PlanScope::Counted] {
            let plan = PlanBuilder::from_descriptor(q.descriptor(), scope).unwrap();
            let LogicalPlan::Project { input, .. } = plan else { panic!("expected Project on top") };
            assert!(matches!(*input, LogicalPlan::Scan { .. }));
        }
    }

    #[test]
    fn theta_sources_and_joins_nest_left_deep() {
        let (member, team) = paths();
        let q = select_from(&member).from(&team).left_join_unrelated(&member.aliased("m2"));
        let plan = PlanBuilder::from_descriptor(q.descriptor(), PlanScope::Top).unwrap();
        let LogicalPlan::Project { input, .. } = plan else { panic!("expected Project") };
        let LogicalPlan::Join { left, kind, on, .. } = *input else { panic!("expected Join") };
        assert_eq!(kind, JoinKind::Left);
        assert_eq!(on, Predicate::Const3(Truth::True));
        assert!(matches!(*left, LogicalPlan::Join { kind: JoinKind::Cross, .. }));
    }

    #[test]
    fn aggregate_plan_names_calls_and_rewrites_having() {
        let (member, team) = paths();
        let name: Expression<String> = team.path("name").unwrap();
        let age: Expression<i64> = member.path("age").unwrap();
        let q = select_tuple([name.item(), age.avg().item()])
            .from(&member)
            .join(member.relation("team").unwrap(), &team)
            .group_by(&name)
            .having(age.avg().gt(10.0))
            .having(age.count().goe(1));

        let plan = PlanBuilder::from_descriptor(q.descriptor(), PlanScope::Top).unwrap();
        let LogicalPlan::Project { input, exprs } = plan else { panic!("expected Project") };
        assert!(matches!(&exprs[1], Expr::Column(c) if c.alias == AGGREGATE_SCOPE && c.name == "avg"));
        let LogicalPlan::Filter { input, predicate } = *input else { panic!("expected having Filter") };
        assert!(!predicate.contains_aggregate());
        let LogicalPlan::Aggregate { group_keys, aggs, .. } = *input else { panic!("expected Aggregate") };
        assert_eq!(group_keys[0].1, "team.name");
        let names: Vec<_> = aggs.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["#agg.avg", "#agg.count"]);
    }

    #[test]
    fn distinct_sits_between_project_and_limit() {
        let (member, _) = paths();
        let username: Expression<String> = member.path("username").unwrap();
        let q = select(username).from(&member).distinct().limit(1);
        let plan = PlanBuilder::from_descriptor(q.descriptor(), PlanScope::Top).unwrap();
        let LogicalPlan::Limit { input, .. } = plan else { panic!("expected Limit") };
        assert!(matches!(*input, LogicalPlan::Distinct { .. }));
    }
}
