use std::sync::Arc;

use crate::{
    error::QueryError,
    expr::Predicate,
    query::{JoinClause, JoinKind, QueryDescriptor, SelectLayout},
    translator::{Dialect, SqlWriter, Statement, StatementKind},
};

/// Which trailing clauses a rendered select carries.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Outermost query: order and window.
    Top,
    /// Subquery: offset and limit never apply.
    Nested,
    /// Inside a count: neither order nor window.
    Counted,
}

/// Lowers validated descriptors into SQL. Pure: the same descriptor always
/// renders the same text and parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    dialect: Dialect,
}

impl Translator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn translate(&self, descriptor: &QueryDescriptor) -> Result<Statement, QueryError> {
        descriptor.validate()?;
        let mut w = SqlWriter::new(self.dialect);
        w.select(descriptor, Scope::Top);
        Ok(Self::statement(w, StatementKind::Select, descriptor))
    }

    /// Number of rows `descriptor` yields, ignoring order, offset and limit.
    /// Grouped or distinct queries are counted through a derived table.
    pub fn translate_count(&self, descriptor: &QueryDescriptor) -> Result<Statement, QueryError> {
        descriptor.validate()?;
        let mut w = SqlWriter::new(self.dialect);
        if descriptor.distinct || descriptor.is_aggregate() {
            w.push("SELECT COUNT(*) FROM (");
            w.select(descriptor, Scope::Counted);
            w.push(") counted");
        } else {
            w.push("SELECT COUNT(*)");
            w.body(descriptor);
        }
        Ok(Self::statement(w, StatementKind::Count, descriptor))
    }

    fn statement(w: SqlWriter, kind: StatementKind, descriptor: &QueryDescriptor) -> Statement {
        let (sql, params) = w.finish();
        Statement { sql, params, kind, descriptor: Arc::new(descriptor.clone()) }
    }
}

impl SqlWriter {
    fn select(&mut self, d: &QueryDescriptor, scope: Scope) {
        self.push(if d.distinct { "SELECT DISTINCT " } else { "SELECT " });
        let layout = SelectLayout::of(d);
        for (i, column) in layout.columns.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(&column.expr);
            if let Some(alias) = &column.alias {
                self.push(" AS ");
                self.push(alias);
            }
        }
        self.body(d);

        if scope == Scope::Counted {
            return;
        }
        self.optional_clause("ORDER BY", ", ", &d.order_by, |w, o| w.order(o));
        if scope == Scope::Top {
            if let Some(limit) = d.limit {
                self.push(&format!(" LIMIT {}", limit));
            }
            // no LIMIT is synthesized for a bare offset
            if let Some(offset) = d.offset {
                self.push(&format!(" OFFSET {}", offset));
            }
        }
    }

    pub(crate) fn nested_select(&mut self, d: &QueryDescriptor) {
        self.select(d, Scope::Nested);
    }

    /// Sources, joins, filter and grouping: everything a count shares with
    /// the content query.
    fn body(&mut self, d: &QueryDescriptor) {
        self.optional_clause("FROM", ", ", &d.from, |w, source| {
            w.push(&format!("{} {}", source.table(), source.alias()));
        });
        for join in &d.joins {
            self.join(join);
        }
        if !d.filter.is_empty() {
            self.push(" WHERE ");
            self.predicate(&Predicate::all(d.filter.iter().cloned()));
        }
        self.optional_clause("GROUP BY", ", ", &d.group_by, |w, e| w.expr(e));
        if !d.having.is_empty() {
            self.push(" HAVING ");
            self.predicate(&Predicate::all(d.having.iter().cloned()));
        }
    }

    fn join(&mut self, join: &JoinClause) {
        let target = format!("{} {}", join.target.table(), join.target.alias());
        match (join.kind, join.on.is_empty()) {
            (JoinKind::Cross, _) | (JoinKind::Inner, true) => {
                self.push(&format!(" CROSS JOIN {}", target));
                return;
            }
            (JoinKind::Inner, false) => self.push(&format!(" INNER JOIN {} ON ", target)),
            (JoinKind::Left, _) => self.push(&format!(" LEFT JOIN {} ON ", target)),
        }
        self.predicate(&Predicate::all(join.on.iter().cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{EntitySchema, Schema, ValueType},
        expr::{CaseBuilder, Expression},
        query::{select, select_from, select_tuple, sub_select, EntityPath, SelectItem},
    };
    use serde_json::json;

    const MEMBER_COLUMNS: &str = "member.id, member.username, member.age, member.team_id";

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

    fn fields(member: &EntityPath, team: &EntityPath) -> (Expression<String>, Expression<i64>, Expression<String>) {
        (member.path("username").unwrap(), member.path("age").unwrap(), team.path("name").unwrap())
    }

    #[test]
    fn window_and_order_render_on_the_outer_query() {
        let (member, team) = paths();
        let (username, age, _) = fields(&member, &team);
        let q = select_from(&member).filter(username.eq("member1")).order_by(age.desc()).offset(1).limit(2);
        let stmt = Translator::default().translate(q.descriptor()).unwrap();
        assert_eq!(
            stmt.sql,
            format!("SELECT {MEMBER_COLUMNS} FROM member member WHERE member.username = ? ORDER BY member.age DESC LIMIT 2 OFFSET 1")
        );
        assert_eq!(stmt.params, vec![json!("member1")]);
        assert_eq!(stmt.kind, StatementKind::Select);
    }

    #[test]
    fn offset_without_limit_renders_bare() {
        let (member, team) = paths();
        let (username, _, _) = fields(&member, &team);
        let q = select(&username).from(&member).order_by(username.asc()).offset(2);
        let sql = Translator::default().translate(q.descriptor()).unwrap().sql;
        assert_eq!(sql, "SELECT member.username FROM member member ORDER BY member.username OFFSET 2");
    }

    #[test]
    fn translation_is_deterministic() {
        let (member, team) = paths();
        let (username, age, name) = fields(&member, &team);
        let q = select_tuple([username.item(), name.as_("teamName")])
            .from(&member)
            .left_join(member.relation("team").unwrap(), &team)
            .filter(age.between(10, 30).or(username.is_null()))
            .order_by(age.desc())
            .order_by(username.asc().nulls_last());
        let t = Translator::new(Dialect::Postgres);
        let (a, b) = (t.translate(q.descriptor()).unwrap(), t.translate(q.descriptor()).unwrap());
        assert_eq!(a, b);
        assert_eq!(
            a.sql,
            "SELECT member.username, team.name AS teamName FROM member member \
             LEFT JOIN team team ON member.team_id = team.id \
             WHERE member.age BETWEEN $1 AND $2 OR member.username IS NULL \
             ORDER BY member.age DESC, member.username NULLS LAST"
        );
    }

    #[test]
    fn postgres_placeholders_number_in_textual_order() {
        let (member, team) = paths();
        let (username, age, _) = fields(&member, &team);
        let q = select(age.clone()).from(&member).filter(age.gt(10)).filter(username.ne("x"));
        let stmt = Translator::new(Dialect::Postgres).translate(q.descriptor()).unwrap();
        assert_eq!(stmt.sql, "SELECT member.age FROM member member WHERE member.age > $1 AND member.username <> $2");
        assert_eq!(stmt.params, vec![json!(10), json!("x")]);
    }

    #[test]
    fn joins_render_by_kind() {
        let (member, team) = paths();
        let (username, _, name) = fields(&member, &team);

        let inner = select_from(&member).join(member.relation("team").unwrap(), &team).filter(name.eq("teamA"));
        let sql = Translator::default().translate(inner.descriptor()).unwrap().sql;
        assert_eq!(
            sql,
            format!("SELECT {MEMBER_COLUMNS} FROM member member INNER JOIN team team ON member.team_id = team.id WHERE team.name = ?")
        );

        let left_on = select_tuple([SelectItem::from(&member), SelectItem::from(&team)])
            .from(&member)
            .left_join_unrelated(&team)
            .on(username.eq(&name));
        let sql = Translator::default().translate(left_on.descriptor()).unwrap().sql;
        assert_eq!(
            sql,
            format!("SELECT {MEMBER_COLUMNS}, team.id, team.name FROM member member LEFT JOIN team team ON member.username = team.name")
        );

        let left_bare = select_from(&member).left_join_unrelated(&team);
        let sql = Translator::default().translate(left_bare.descriptor()).unwrap().sql;
        assert!(sql.ends_with("LEFT JOIN team team ON 1 = 1"));

        let cross = select_from(&member).join_unrelated(&team);
        let sql = Translator::default().translate(cross.descriptor()).unwrap().sql;
        assert!(sql.ends_with("FROM member member CROSS JOIN team team"));
    }

    #[test]
    fn theta_join_lists_sources() {
        let (member, team) = paths();
        let (username, _, name) = fields(&member, &team);
        let q = select_from(&member).from(&team).filter(username.eq(&name));
        let sql = Translator::default().translate(q.descriptor()).unwrap().sql;
        assert_eq!(sql, format!("SELECT {MEMBER_COLUMNS} FROM member member, team team WHERE member.username = team.name"));
    }

    #[test]
    fn fetch_join_extends_the_select_list() {
        let (member, team) = paths();
        let q = select_from(&member).join(member.relation("team").unwrap(), &team).fetch_join();
        let sql = Translator::default().translate(q.descriptor()).unwrap().sql;
        assert!(sql.starts_with(&format!("SELECT {MEMBER_COLUMNS}, team.id, team.name FROM")));
    }

    #[test]
    fn subqueries_render_inline_without_window() {
        let (member, team) = paths();
        let (_, age, _) = fields(&member, &team);
        let member_sub = member.aliased("memberSub");
        let sub_age: Expression<i64> = member_sub.path("age").unwrap();

        let q = select_from(&member)
            .filter(age.in_sub(sub_select(sub_age.clone()).from(&member_sub).filter(sub_age.gt(10))))
            .limit(3);
        let stmt = Translator::default().translate(q.descriptor()).unwrap();
        assert_eq!(
            stmt.sql,
            format!(
                "SELECT {MEMBER_COLUMNS} FROM member member \
                 WHERE member.age IN (SELECT memberSub.age FROM member memberSub WHERE memberSub.age > ?) LIMIT 3"
            )
        );
        assert_eq!(stmt.params, vec![json!(10)]);

        let scalar = select_tuple([age.item(), sub_select(sub_age.avg()).from(&member_sub).as_("avgAge")]).from(&member);
        let sql = Translator::default().translate(scalar.descriptor()).unwrap().sql;
        assert_eq!(sql, "SELECT member.age, (SELECT AVG(memberSub.age) FROM member memberSub) AS avgAge FROM member member");
    }

    #[test]
    fn count_drops_order_and_window() {
        let (member, team) = paths();
        let (_, age, name) = fields(&member, &team);
        let q = select_from(&member).filter(age.goe(10)).order_by(age.desc()).offset(1).limit(2);
        let stmt = Translator::default().translate_count(q.descriptor()).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(*) FROM member member WHERE member.age >= ?");
        assert_eq!(stmt.kind, StatementKind::Count);

        let grouped = select(name.clone())
            .from(&member)
            .join(member.relation("team").unwrap(), &team)
            .group_by(&name)
            .order_by(name.asc());
        let sql = Translator::default().translate_count(grouped.descriptor()).unwrap().sql;
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM (SELECT team.name FROM member member \
             INNER JOIN team team ON member.team_id = team.id GROUP BY team.name) counted"
        );
    }

    #[test]
    fn expressions_render_explicitly() {
        let (member, team) = paths();
        let (username, age, _) = fields(&member, &team);

        let case = CaseBuilder::new().when(age.eq(10)).then("ten").otherwise("other");
        let stmt = Translator::default().translate(select(case).from(&member).descriptor()).unwrap();
        assert_eq!(stmt.sql, "SELECT CASE WHEN member.age = ? THEN ? ELSE ? END FROM member member");
        assert_eq!(stmt.params, vec![json!(10), json!("ten"), json!("other")]);

        let concat = username.concat("_").concat(age.string_value());
        let sql = Translator::default().translate(select(concat).from(&member).descriptor()).unwrap().sql;
        assert_eq!(sql, "SELECT ((member.username || ?) || CAST(member.age AS VARCHAR)) FROM member member");

        let quarter = select(age.to_float().divide(4.0)).from(&member);
        let stmt = Translator::default().translate(quarter.descriptor()).unwrap();
        assert_eq!(stmt.sql, "SELECT (CAST(member.age AS DOUBLE PRECISION) / ?) FROM member member");
        assert_eq!(stmt.params, vec![json!(4.0)]);

        let like = select_from(&member).filter(username.starts_with("mem_"));
        let stmt = Translator::default().translate(like.descriptor()).unwrap();
        assert!(stmt.sql.ends_with("WHERE member.username LIKE ? ESCAPE '\\'"));
        assert_eq!(stmt.params, vec![json!("mem\\_%")]);

        let aggregates = select_tuple([age.count_distinct().item(), age.sum().item(), age.avg().item()]).from(&member);
        let sql = Translator::default().translate(aggregates.descriptor()).unwrap().sql;
        assert_eq!(sql, "SELECT COUNT(DISTINCT member.age), SUM(member.age), AVG(member.age) FROM member member");
    }

    #[test]
    fn null_literals_are_inlined() {
        let (member, team) = paths();
        let (username, _, _) = fields(&member, &team);
        let q = select_from(&member).filter(username.coalesce(Expression::<String>::null()).in_list(Vec::<&str>::new()));
        let stmt = Translator::default().translate(q.descriptor()).unwrap();
        assert!(stmt.sql.ends_with("WHERE 1 = 0"));
        assert!(stmt.params.is_empty());

        let q = select(Expression::<String>::null()).from(&member);
        let stmt = Translator::default().translate(q.descriptor()).unwrap();
        assert_eq!(stmt.sql, "SELECT NULL FROM member member");
    }

    #[test]
    fn invalid_descriptors_are_rejected_before_rendering() {
        let (member, team) = paths();
        let (_, _, name) = fields(&member, &team);
        let q = select_from(&member).filter(name.eq("teamA"));
        assert!(matches!(Translator::default().translate(q.descriptor()), Err(QueryError::UnboundAlias(_))));
        assert!(matches!(Translator::default().translate_count(q.descriptor()), Err(QueryError::UnboundAlias(_))));
    }
}
