use tracing::{debug, warn};

use crate::{
    config::QueryConfig,
    error::QueryError,
    executor::{QueryResults, RowSet, Transport},
    mapper::ResultMapper,
    query::Query,
    translator::{Statement, Translator},
};

/// Translates queries, runs them through a [`Transport`] and maps the rows.
/// Each call is one blocking round trip per statement; nothing is retried.
pub struct Executor<T> {
    transport: T,
    config: QueryConfig,
    translator: Translator,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T, config: QueryConfig) -> Self {
        let translator = Translator::new(config.dialect);
        Self { transport, config, translator }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// The statement `fetch` would send, without sending it.
    pub fn translate<R>(&self, query: &Query<R>) -> Result<Statement, QueryError> {
        self.translator.translate(query.descriptor())
    }

    pub fn fetch<R>(&self, query: &Query<R>) -> Result<Vec<R>, QueryError> {
        let statement = self.translator.translate(query.descriptor())?;
        let rs = self.run(&statement)?;
        let mapper = ResultMapper::new(query.descriptor());
        rs.rows.iter()
            .map(|row| query.convert(mapper.map_row(row)?))
            .collect()
    }

    /// At most one row; more is [`QueryError::NonUniqueResult`].
    pub fn fetch_one<R>(&self, query: &Query<R>) -> Result<Option<R>, QueryError> {
        let mut rows = self.fetch(query)?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            n => Err(QueryError::NonUniqueResult(n)),
        }
    }

    /// First row of the query with its limit replaced by one.
    pub fn fetch_first<R>(&self, query: &Query<R>) -> Result<Option<R>, QueryError> {
        let first = query.clone().limit(1);
        Ok(self.fetch(&first)?.into_iter().next())
    }

    /// Rows the query yields, ignoring its order and window.
    pub fn fetch_count<R>(&self, query: &Query<R>) -> Result<u64, QueryError> {
        let statement = self.translator.translate_count(query.descriptor())?;
        let rs = self.run(&statement)?;
        Self::read_total(&rs)
    }

    /// The query's window plus the total row count. The content statement is
    /// skipped when the count is zero.
    pub fn fetch_results<R>(&self, query: &Query<R>) -> Result<QueryResults<R>, QueryError> {
        let d = query.descriptor();
        let total = self.fetch_count(query)?;
        if total == 0 {
            return Ok(QueryResults::empty(d.limit, d.offset));
        }
        let results = self.fetch(query)?;
        Ok(QueryResults { results, total, limit: d.limit, offset: d.offset })
    }

    fn run(&self, statement: &Statement) -> Result<RowSet, QueryError> {
        debug!(sql = %statement.sql, params = statement.params.len(), kind = ?statement.kind, "executing statement");
        let rs = self.transport.execute(statement)?;
        if let Some(threshold) = self.config.warn_row_threshold {
            if rs.len() > threshold {
                warn!(rows = rs.len(), threshold, sql = %statement.sql, "result exceeds row threshold");
            }
        }
        Ok(rs)
    }

    fn read_total(rs: &RowSet) -> Result<u64, QueryError> {
        if let Some(total) = rs.total {
            return Ok(total);
        }
        rs.rows.first()
            .and_then(|row| row.first())
            .and_then(|v| v.as_u64())
            .ok_or_else(|| QueryError::mapping("count statement returned no count"))
    }
}
