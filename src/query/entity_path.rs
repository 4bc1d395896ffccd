use std::{fmt, sync::Arc};

use crate::{
    database::{EntitySchema, Relation, ValueType},
    error::QueryError,
    expr::{Column, ComparatorOp, Expr, Expression, Predicate, SqlType},
};

/// An entity bound under an alias, the root of typed column paths.
#[derive(Clone)]
pub struct EntityPath {
    alias: String,
    schema: Arc<EntitySchema>,
}

impl PartialEq for EntityPath {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.schema.name == other.schema.name
    }
}

impl fmt::Debug for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityPath({} {})", self.schema.name, self.alias)
    }
}

impl EntityPath {
    pub fn new(schema: Arc<EntitySchema>, alias: &str) -> Self {
        Self { alias: alias.to_string(), schema }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn entity_name(&self) -> &str {
        &self.schema.name
    }

    pub fn table(&self) -> &str {
        &self.schema.table
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Same entity under another alias, e.g. for a correlated subquery.
    pub fn aliased(&self, alias: &str) -> Self {
        Self::new(Arc::clone(&self.schema), alias)
    }

    pub fn column(&self, field: &str) -> Result<Column, QueryError> {
        let info = self.schema.field_info(field)?;
        Ok(Column::new(&self.alias, field, info.ty, info.nullable))
    }

    /// Typed path to `field`; the declared type must be exactly `T`.
    pub fn path<T: SqlType>(&self, field: &str) -> Result<Expression<T>, QueryError> {
        let column = self.column(field)?;
        if column.ty != T::VALUE_TYPE {
            return Err(QueryError::type_mismatch(column.to_string(), T::VALUE_TYPE, column.ty));
        }
        Ok(Expression::from_expr(Expr::Column(column)))
    }

    pub fn id_column(&self) -> Column {
        let ty = self.schema.get(&self.schema.id_key).map_or(ValueType::Int, |f| f.ty);
        Column::new(&self.alias, &self.schema.id_key, ty, false)
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> Vec<Column> {
        self.schema.fields.iter()
            .map(|(name, info)| Column::new(&self.alias, name, info.ty, info.nullable))
            .collect()
    }

    pub fn relation(&self, name: &str) -> Result<RelationPath, QueryError> {
        let relation = self.schema.get_relation(name)?.clone();
        Ok(RelationPath { owner: self.clone(), relation })
    }

    /// `count(alias.id)`.
    pub fn count(&self) -> Expression<i64> {
        Expression::<i64>::from_expr(Expr::Column(self.id_column())).count()
    }
}

/// A declared relation reached from an aliased owner, used as a join target.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationPath {
    pub owner: EntityPath,
    pub relation: Relation,
}

impl RelationPath {
    /// Equality implied by the relation once its target is bound to `target`.
    pub fn join_predicate(&self, target: &EntityPath) -> Result<Predicate, QueryError> {
        if self.relation.target != target.entity_name() {
            return Err(QueryError::InvalidJoin(format!(
                "relation {}.{} targets {}, not {}",
                self.owner.entity_name(),
                self.relation.name,
                self.relation.target,
                target.entity_name()
            )));
        }
        Ok(Predicate::Compare {
            left: Expr::Column(self.owner.column(&self.relation.column)?),
            op: ComparatorOp::Eq,
            right: Expr::Column(target.column(&self.relation.target_column)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Schema;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(EntitySchema::new("Team").field("name", ValueType::String, true))
            .with_entity(
                EntitySchema::new("Member")
                    .field("username", ValueType::String, true)
                    .field("age", ValueType::Int, false)
                    .field("team_id", ValueType::Int, true)
                    .relation("team", "Team", "team_id", "id"),
            )
    }

    #[test]
    fn typed_paths_check_declared_types() {
        let member = schema().entity("Member", "member").unwrap();
        assert!(member.path::<i64>("age").is_ok());
        assert!(matches!(member.path::<String>("age"), Err(QueryError::TypeMismatch { .. })));
        assert!(matches!(member.path::<i64>("salary"), Err(QueryError::UnknownField { .. })));
    }

    #[test]
    fn relation_join_predicate_requires_matching_target() {
        let s = schema();
        let member = s.entity("Member", "member").unwrap();
        let team = s.entity("Team", "team").unwrap();
        let rel = member.relation("team").unwrap();

        match rel.join_predicate(&team).unwrap() {
            Predicate::Compare { left, right, .. } => {
                assert_eq!(left.as_column().unwrap().key(), "member.team_id");
                assert_eq!(right.as_column().unwrap().key(), "team.id");
            }
            other => panic!("unexpected {other:?}"),
        }
        let other_member = member.aliased("m2");
        assert!(matches!(rel.join_predicate(&other_member), Err(QueryError::InvalidJoin(_))));
        assert!(matches!(member.relation("owner"), Err(QueryError::UnknownRelation { .. })));
    }

    #[test]
    fn columns_follow_declaration_order() {
        let member = schema().entity("Member", "m").unwrap();
        let keys: Vec<_> = member.columns().iter().map(Column::key).collect();
        assert_eq!(keys, vec!["m.id", "m.username", "m.age", "m.team_id"]);
        assert_eq!(member.count().expr().value_type(), ValueType::Int);
    }
}
