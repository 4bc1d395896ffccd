pub mod value_type;
pub use value_type::*;

pub mod field_info;
pub use field_info::*;

pub mod relation;
pub use relation::*;

pub mod entity_schema;
pub use entity_schema::*;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{error::QueryError, query::EntityPath};

/// Registry of entity schemas. Consumed read-only by the query layer.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: IndexMap<String, Arc<EntitySchema>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntitySchema) -> Self {
        self.register(entity);
        self
    }

    pub fn register(&mut self, entity: impl Into<Arc<EntitySchema>>) {
        let entity = entity.into();
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.entities.get(name).cloned()
    }

    pub fn list_entities(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    /// Bind entity `name` under `alias` for use in a query.
    pub fn entity(&self, name: &str, alias: &str) -> Result<EntityPath, QueryError> {
        let schema = self.get(name).ok_or_else(|| QueryError::UnknownEntity(name.to_string()))?;
        Ok(EntityPath::new(schema, alias))
    }

    /// Check that every relation points at a known entity and that both ends
    /// of the relation exist with compatible types.
    pub fn validate(&self) -> Result<(), QueryError> {
        for entity in self.entities.values() {
            for relation in entity.relations.values() {
                let target = self.get(&relation.target)
                    .ok_or_else(|| QueryError::UnknownEntity(relation.target.clone()))?;
                let local = entity.field_info(&relation.column)?;
                let remote = target.field_info(&relation.target_column)?;
                if !ValueType::is_compatible(local.ty, remote.ty) {
                    return Err(QueryError::type_mismatch(
                        format!("relation {}.{}", entity.name, relation.name),
                        remote.ty,
                        local.ty,
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(EntitySchema::new("Team").field("name", ValueType::String, true))
            .with_entity(
                EntitySchema::new("Member")
                    .field("username", ValueType::String, true)
                    .field("team_id", ValueType::Int, true)
                    .relation("team", "Team", "team_id", "id"),
            )
    }

    #[test]
    fn registry_binds_aliases() {
        let s = schema();
        let member = s.entity("Member", "m").unwrap();
        assert_eq!(member.alias(), "m");
        assert_eq!(member.entity_name(), "Member");
        assert!(matches!(s.entity("Order", "o"), Err(QueryError::UnknownEntity(_))));
    }

    #[test]
    fn validate_accepts_consistent_relations() {
        assert!(schema().validate().is_ok());
    }

    #[test]
    fn validate_rejects_dangling_relation_targets() {
        let s = Schema::new().with_entity(
            EntitySchema::new("Member")
                .field("team_id", ValueType::Int, true)
                .relation("team", "Team", "team_id", "id"),
        );
        assert!(matches!(s.validate(), Err(QueryError::UnknownEntity(name)) if name == "Team"));
    }

    #[test]
    fn validate_rejects_mistyped_relation_columns() {
        let s = Schema::new()
            .with_entity(EntitySchema::new("Team"))
            .with_entity(
                EntitySchema::new("Member")
                    .field("team_id", ValueType::String, true)
                    .relation("team", "Team", "team_id", "id"),
            );
        assert!(matches!(s.validate(), Err(QueryError::TypeMismatch { .. })));
    }
}
