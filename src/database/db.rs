use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::database::{DbConfig, DbError, DbTable, EntitySchema, InternalTable, Schema};

pub type Db = Arc<RwLock<InternalDb>>;

/// Named tables plus the schema registry describing the entities stored in them.
#[derive(Debug, Default)]
pub struct InternalDb {
    config: DbConfig,
    tables: IndexMap<String, DbTable>,
    schema: Schema,
}

impl InternalDb {
    pub fn new_db_with_config(config: DbConfig) -> Self {
        Self { config, tables: IndexMap::new(), schema: Schema::new() }
    }

    pub fn into_protected(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    pub fn create(&mut self, table_name: &str) -> DbTable {
        self.create_with_config(table_name, self.config.clone())
    }

    pub fn create_with_config(&mut self, table_name: &str, config: DbConfig) -> DbTable {
        let table = DbTable::new(InternalTable::new(table_name, config));
        self.tables.insert(table.name(), table.clone());
        table
    }

    /// Register `entity` in the schema and create its backing table.
    pub fn create_entity(&mut self, entity: EntitySchema) -> DbTable {
        let entity = Arc::new(entity);
        let table = DbTable::new(InternalTable::with_schema(Arc::clone(&entity), self.config.clone()));
        self.tables.insert(entity.table.clone(), table.clone());
        self.schema.register(entity);
        table
    }

    pub fn get(&self, table_name: &str) -> Option<DbTable> {
        self.tables.get(&table_name.to_ascii_lowercase()).cloned()
    }

    pub fn require(&self, table_name: &str) -> Result<DbTable, DbError> {
        self.get(table_name).ok_or_else(|| DbError::UnknownTable(table_name.to_string()))
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

pub trait DbCommon {
    fn new_db() -> Self;
    fn new_db_with_config(config: DbConfig) -> Self;
    /// Database with one table per entity of `schema`.
    fn from_schema(schema: &Schema, config: DbConfig) -> Self;
    fn create(&self, table_name: &str) -> DbTable;
    fn create_with_config(&self, table_name: &str, config: DbConfig) -> DbTable;
    fn create_entity(&self, entity: EntitySchema) -> DbTable;
    fn get(&self, table_name: &str) -> Option<DbTable>;
    fn require(&self, table_name: &str) -> Result<DbTable, DbError>;
    fn list_tables(&self) -> Vec<String>;
    fn schema(&self) -> Schema;
}

impl DbCommon for Db {
    fn new_db() -> Self {
        InternalDb::default().into_protected()
    }

    fn new_db_with_config(config: DbConfig) -> Self {
        InternalDb::new_db_with_config(config).into_protected()
    }

    fn from_schema(schema: &Schema, config: DbConfig) -> Self {
        let mut db = InternalDb::new_db_with_config(config);
        for name in schema.list_entities() {
            if let Some(entity) = schema.get(&name) {
                db.create_entity(Arc::unwrap_or_clone(entity));
            }
        }
        db.into_protected()
    }

    fn create(&self, table_name: &str) -> DbTable {
        self.write().unwrap_or_else(PoisonError::into_inner).create(table_name)
    }

    fn create_with_config(&self, table_name: &str, config: DbConfig) -> DbTable {
        self.write().unwrap_or_else(PoisonError::into_inner).create_with_config(table_name, config)
    }

    fn create_entity(&self, entity: EntitySchema) -> DbTable {
        self.write().unwrap_or_else(PoisonError::into_inner).create_entity(entity)
    }

    fn get(&self, table_name: &str) -> Option<DbTable> {
        self.read().unwrap_or_else(PoisonError::into_inner).get(table_name)
    }

    fn require(&self, table_name: &str) -> Result<DbTable, DbError> {
        self.read().unwrap_or_else(PoisonError::into_inner).require(table_name)
    }

    fn list_tables(&self) -> Vec<String> {
        self.read().unwrap_or_else(PoisonError::into_inner).list_tables()
    }

    fn schema(&self) -> Schema {
        self.read().unwrap_or_else(PoisonError::into_inner).schema().clone()
    }
}
