use std::{fmt, marker::PhantomData};

use crate::{
    error::QueryError,
    expr::{Expression, IntoExpression, OrderSpecifier, Predicate, SqlType},
    mapper::{self, Entity, Record, Tuple},
    query::{EntityPath, JoinKind, Projection, QueryDescriptor, RelationPath, SelectItem, Shape, ShapeProjection},
};

/// Clauses shared by top-level queries and subqueries.
macro_rules! source_clauses {
    () => {
        /// Add a source. Sources without a join clause form a cross product.
        pub fn from(mut self, path: &EntityPath) -> Self {
            self.descriptor.add_from(path);
            self
        }

        /// Inner join along a declared relation; the ON equality is implied.
        pub fn join(mut self, relation: RelationPath, target: &EntityPath) -> Self {
            self.descriptor.add_relation_join(JoinKind::Inner, relation, target);
            self
        }

        /// Left outer join along a declared relation.
        pub fn left_join(mut self, relation: RelationPath, target: &EntityPath) -> Self {
            self.descriptor.add_relation_join(JoinKind::Left, relation, target);
            self
        }

        /// Join without a declared relation. Without `on` this is a cross join.
        pub fn join_unrelated(mut self, target: &EntityPath) -> Self {
            self.descriptor.add_unrelated_join(JoinKind::Cross, target);
            self
        }

        pub fn left_join_unrelated(mut self, target: &EntityPath) -> Self {
            self.descriptor.add_unrelated_join(JoinKind::Left, target);
            self
        }

        /// Extend the ON condition of the last join.
        pub fn on(mut self, predicate: Predicate) -> Self {
            self.descriptor.add_on(predicate);
            self
        }

        pub fn filter(mut self, predicate: Predicate) -> Self {
            self.descriptor.filter.push(predicate);
            self
        }

        /// Several predicates at once, ANDed.
        pub fn filter_all(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
            self.descriptor.filter.extend(predicates);
            self
        }

        pub fn group_by<G: SqlType>(mut self, expr: &Expression<G>) -> Self {
            self.descriptor.group_by.push(expr.expr().clone());
            self
        }

        pub fn having(mut self, predicate: Predicate) -> Self {
            self.descriptor.having.push(predicate);
            self
        }

        pub fn distinct(mut self) -> Self {
            self.descriptor.distinct = true;
            self
        }

        pub fn descriptor(&self) -> &QueryDescriptor {
            &self.descriptor
        }

        pub fn into_descriptor(self) -> QueryDescriptor {
            self.descriptor
        }
    };
}

/// A query whose rows map to `R`.
pub struct Query<R> {
    descriptor: QueryDescriptor,
    convert: fn(Record) -> Result<R, QueryError>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self { descriptor: self.descriptor.clone(), convert: self.convert }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("descriptor", &self.descriptor).finish()
    }
}

impl<R> Query<R> {
    fn new(projection: Projection, convert: fn(Record) -> Result<R, QueryError>) -> Self {
        Self { descriptor: QueryDescriptor::new(projection), convert }
    }

    source_clauses!();

    /// Eagerly materialise the entity of the last (relation) join.
    pub fn fetch_join(mut self) -> Self {
        self.descriptor.mark_fetch();
        self
    }

    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.descriptor.order_by.push(order);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.descriptor.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.descriptor.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        self.descriptor.validate()
    }

    pub(crate) fn convert(&self, record: Record) -> Result<R, QueryError> {
        (self.convert)(record)
    }
}

/// Single value per row; null maps to `None`.
pub fn select<T: SqlType>(expr: impl IntoExpression<T>) -> Query<Option<T>> {
    Query::new(Projection::Single(expr.into_expression().item()), mapper::to_scalar::<T>)
}

/// The entity itself, with `path` as the first source.
pub fn select_from(path: &EntityPath) -> Query<Entity> {
    Query::new(Projection::Default, mapper::to_entity).from(path)
}

/// An entity that may be absent, such as the right side of an outer join.
pub fn select_entity(path: &EntityPath) -> Query<Option<Entity>> {
    Query::new(Projection::Single(SelectItem::entity(path)), mapper::to_optional_entity)
}

pub fn select_tuple(items: impl IntoIterator<Item = SelectItem>) -> Query<Tuple> {
    Query::new(Projection::Tuple(items.into_iter().collect()), mapper::to_tuple)
}

pub fn select_shape<S: Shape>(projection: ShapeProjection<S>) -> Query<S> {
    Query::new(
        Projection::Shape {
            name: S::NAME,
            binding: projection.binding,
            items: projection.items,
            targets: projection.targets,
        },
        mapper::to_shape::<S>,
    )
}

/// Nested query yielding values of `T`. Has no window: offset and limit only
/// exist on the outermost query.
pub struct SubQuery<T> {
    descriptor: QueryDescriptor,
    _t: PhantomData<fn() -> T>,
}

impl<T> Clone for SubQuery<T> {
    fn clone(&self) -> Self {
        Self { descriptor: self.descriptor.clone(), _t: PhantomData }
    }
}

impl<T> fmt::Debug for SubQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubQuery").field("descriptor", &self.descriptor).finish()
    }
}

pub fn sub_select<T: SqlType>(expr: impl IntoExpression<T>) -> SubQuery<T> {
    SubQuery {
        descriptor: QueryDescriptor::new(Projection::Single(expr.into_expression().item())),
        _t: PhantomData,
    }
}

impl<T: SqlType> SubQuery<T> {
    source_clauses!();

    pub fn exists(self) -> Predicate {
        Predicate::Exists { query: Box::new(self.descriptor), negated: false }
    }

    pub fn not_exists(self) -> Predicate {
        Predicate::Exists { query: Box::new(self.descriptor), negated: true }
    }

    /// Use as a scalar expression.
    pub fn expression(self) -> Expression<T> {
        Expression::from_expr(crate::expr::Expr::SubQuery(Box::new(self.descriptor)))
    }

    pub fn as_(self, alias: &str) -> SelectItem {
        self.expression().as_(alias)
    }

    pub fn item(self) -> SelectItem {
        self.expression().item()
    }
}
