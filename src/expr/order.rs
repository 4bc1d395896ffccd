use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    /// Nulls sort as larger than any value: last ascending, first descending.
    #[default]
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpecifier {
    pub expr: Expr,
    pub ascending: bool,
    pub nulls: NullOrdering,
}

impl OrderSpecifier {
    pub fn new(expr: Expr, ascending: bool) -> Self {
        Self { expr, ascending, nulls: NullOrdering::Default }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::Last;
        self
    }

    /// Where nulls end up once the default is resolved against the direction.
    pub fn nulls_last_effective(&self) -> bool {
        match self.nulls {
            NullOrdering::First => false,
            NullOrdering::Last => true,
            NullOrdering::Default => self.ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Literal;

    #[test]
    fn default_null_placement_follows_direction() {
        let e = Expr::Literal(Literal::Int(1));
        assert!(OrderSpecifier::new(e.clone(), true).nulls_last_effective());
        assert!(!OrderSpecifier::new(e.clone(), false).nulls_last_effective());
        assert!(OrderSpecifier::new(e.clone(), false).nulls_last().nulls_last_effective());
        assert!(!OrderSpecifier::new(e, true).nulls_first().nulls_last_effective());
    }
}
