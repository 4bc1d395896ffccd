/// One page of results plus the row count of the whole query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults<R> {
    pub results: Vec<R>,
    pub total: u64,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl<R> QueryResults<R> {
    pub fn empty(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { results: Vec::new(), total: 0, limit, offset }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether rows exist past this page.
    pub fn has_more(&self) -> bool {
        let seen = self.offset.unwrap_or(0) + self.results.len() as u64;
        seen < self.total
    }
}
