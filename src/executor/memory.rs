use tracing::trace;

use crate::{
    database::Db,
    error::TransportError,
    executor::{PlanExecutor, RowSet, Transport},
    planner::{PlanBuilder, PlanScope},
    translator::{Statement, StatementKind},
};

/// Transport answering statements from an in-memory [`Db`]. It evaluates the
/// descriptor carried by the statement; the SQL text is not parsed.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    db: Db,
}

impl MemoryTransport {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

impl Transport for MemoryTransport {
    fn execute(&self, statement: &Statement) -> Result<RowSet, TransportError> {
        let scope = match statement.kind {
            StatementKind::Select => PlanScope::Top,
            StatementKind::Count => PlanScope::Counted,
        };
        let plan = PlanBuilder::from_descriptor(&statement.descriptor, scope)
            .map_err(|e| TransportError::with_source("cannot plan statement", e))?;
        let rows = PlanExecutor::new(&self.db).execute(&plan)?;
        trace!(kind = ?statement.kind, rows = rows.len(), "memory engine result");

        Ok(match statement.kind {
            StatementKind::Select => RowSet::new(rows),
            StatementKind::Count => RowSet::counted(rows.len() as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        database::DbCommon,
        executor::_tests::fixtures,
        query::{select, select_from},
        translator::{Dialect, Translator},
    };

    #[test]
    fn select_statements_return_projected_rows() {
        let (db, member, _) = fixtures::members_and_teams();
        let age = member.path::<i64>("age").unwrap();
        let q = select(&age).from(&member).filter(age.goe(30)).order_by(age.asc());
        let st = Translator::new(Dialect::Generic).translate(q.descriptor()).unwrap();

        let rs = MemoryTransport::new(db).execute(&st).unwrap();
        assert_eq!(rs.rows, vec![vec![json!(30)], vec![json!(40)]]);
        assert_eq!(rs.total, None);
    }

    #[test]
    fn count_statements_ignore_the_window() {
        let (db, member, _) = fixtures::members_and_teams();
        let q = select_from(&member).offset(1).limit(2);
        let st = Translator::new(Dialect::Generic).translate_count(q.descriptor()).unwrap();

        let rs = MemoryTransport::new(db).execute(&st).unwrap();
        assert_eq!(rs.total, Some(4));
        assert_eq!(rs.rows, vec![vec![json!(4)]]);
    }

    #[test]
    fn engine_failures_surface_as_transport_errors() {
        let (_, member, _) = fixtures::members_and_teams();
        let q = select_from(&member);
        let st = Translator::new(Dialect::Generic).translate(q.descriptor()).unwrap();

        // a database without the member table
        let err = MemoryTransport::new(Db::new_db()).execute(&st).unwrap_err();
        assert_eq!(err.message(), "in-memory engine failed");
    }
}
