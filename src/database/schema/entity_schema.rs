use indexmap::IndexMap;

use crate::{database::{FieldInfo, Relation, ValueType}, error::QueryError};

/// Read-only description of one entity: backing table, id key, typed fields
/// in declaration order and declared relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    pub id_key: String,
    pub fields: IndexMap<String, FieldInfo>,
    pub relations: IndexMap<String, Relation>,
}

impl EntitySchema {
    /// New entity named `name`, backed by a table of the same name in lower
    /// case, with an integer `id` key.
    pub fn new(name: &str) -> Self {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), FieldInfo::new(ValueType::Int, false));
        Self {
            name: name.to_string(),
            table: name.to_ascii_lowercase(),
            id_key: "id".to_string(),
            fields,
            relations: IndexMap::new(),
        }
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_ascii_lowercase();
        self
    }

    /// Replace the id key (and its type). The id always comes first.
    pub fn id(mut self, key: &str, ty: ValueType) -> Self {
        self.fields.shift_remove(&self.id_key);
        self.id_key = key.to_string();
        self.fields.shift_insert(0, key.to_string(), FieldInfo::new(ty, false));
        self
    }

    pub fn field(mut self, name: &str, ty: ValueType, nullable: bool) -> Self {
        self.fields.insert(name.to_string(), FieldInfo::new(ty, nullable));
        self
    }

    /// Declare `name` as a many-to-one relation to `target` through the local
    /// `column`, which must already be declared as a field.
    pub fn relation(mut self, name: &str, target: &str, column: &str, target_column: &str) -> Self {
        self.relations.insert(name.to_string(), Relation::new(name, target, column, target_column));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldInfo> {
        self.fields.get(field)
    }

    pub fn field_info(&self, field: &str) -> Result<&FieldInfo, QueryError> {
        self.fields.get(field).ok_or_else(|| QueryError::UnknownField {
            entity: self.name.clone(),
            field: field.to_string(),
        })
    }

    pub fn get_relation(&self, name: &str) -> Result<&Relation, QueryError> {
        self.relations.get(name).ok_or_else(|| QueryError::UnknownRelation {
            entity: self.name.clone(),
            relation: name.to_string(),
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
