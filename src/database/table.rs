use std::{fs, path::Path, sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard}};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::database::{DbConfig, DbError, EntitySchema, IdManager, IdType, ValueType};

/// In-memory table: rows keyed by their id, kept in insertion order.
#[derive(Debug)]
pub struct InternalTable {
    rows: IndexMap<String, Value>,
    id_manager: IdManager,
    config: DbConfig,
    pub name: String,
    pub schema: Option<Arc<EntitySchema>>,
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Id strategy for an entity table. The declared id column type wins over
/// the configured strategy when the two disagree.
fn id_type_for(schema: &EntitySchema, configured: IdType) -> IdType {
    let declared = schema.get(&schema.id_key).map(|f| f.ty);
    match (declared, configured) {
        (Some(ValueType::String), IdType::Uuid) => IdType::Uuid,
        (Some(ValueType::String), _) => IdType::None,
        (Some(ValueType::Int), IdType::Uuid) => IdType::Int,
        (Some(ValueType::Int), configured) => configured,
        (Some(_), _) => IdType::None,
        (None, configured) => configured,
    }
}

impl InternalTable {
    pub fn new(name: &str, config: DbConfig) -> Self {
        Self {
            rows: IndexMap::new(),
            id_manager: IdManager::new(config.id_type),
            config,
            name: name.to_ascii_lowercase(),
            schema: None,
        }
    }

    pub fn with_schema(schema: Arc<EntitySchema>, config: DbConfig) -> Self {
        let config = DbConfig::from(id_type_for(&schema, config.id_type), &schema.id_key);
        let mut table = Self::new(&schema.table, config);
        table.schema = Some(schema);
        table
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Check a row against the declared schema, filling absent nullable
    /// columns with null.
    fn conform(&self, map: &mut Map<String, Value>) -> Result<(), DbError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        for (column, info) in &schema.fields {
            let value = map.entry(column.clone()).or_insert(Value::Null);
            if !info.accepts(value) {
                return Err(DbError::InvalidValue {
                    table: self.name.clone(),
                    column: column.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn get_all(&self) -> Vec<Value> {
        self.rows.values().cloned().collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Value> {
        self.rows.values()
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.rows.get(id).cloned()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Insert a row. A provided id is kept; otherwise one is generated
    /// according to the table's id strategy.
    pub fn add(&mut self, item: Value) -> Result<Value, DbError> {
        let Value::Object(mut map) = item else {
            return Err(DbError::NotAnObject);
        };
        let key = self.config.id_key.clone();

        let id = match map.get(&key).filter(|v| !v.is_null()) {
            Some(id) => {
                self.id_manager.observe(id)?;
                id.clone()
            }
            None => self.id_manager.next().ok_or_else(|| DbError::MissingId(key.clone()))?,
        };
        let id_key = id_string(&id).ok_or_else(|| DbError::InvalidId(id.to_string()))?;
        map.insert(key, id);
        self.conform(&mut map)?;

        let row = Value::Object(map);
        self.rows.insert(id_key, row.clone());
        Ok(row)
    }

    /// Insert every object of a JSON array; rows that cannot be stored are
    /// skipped with a warning. Returns the stored rows.
    pub fn add_batch(&mut self, items: Value) -> Vec<Value> {
        let Value::Array(items) = items else {
            return Vec::new();
        };
        let mut added = Vec::with_capacity(items.len());
        for item in items {
            match self.add(item) {
                Ok(row) => added.push(row),
                Err(error) => warn!(table = %self.name, %error, "skipping row"),
            }
        }
        added
    }

    pub fn delete(&mut self, id: &str) -> Option<Value> {
        self.rows.shift_remove(id)
    }

    pub fn clear(&mut self) -> usize {
        let count = self.rows.len();
        self.rows.clear();
        count
    }

    pub fn load_from_json(&mut self, json_value: Value, keep: bool) -> Result<Vec<Value>, DbError> {
        let Value::Array(_) = json_value else {
            return Err(DbError::NotAnArray);
        };
        if !keep {
            self.clear();
        }
        Ok(self.add_batch(json_value))
    }

    pub fn load_from_file(&mut self, file_path: &Path) -> Result<usize, DbError> {
        let path = file_path.display().to_string();
        let content = fs::read_to_string(file_path)
            .map_err(|source| DbError::Io { path: path.clone(), source })?;
        let json_value = serde_json::from_str::<Value>(&content)
            .map_err(|source| DbError::Json { path: path.clone(), source })?;

        let added = self.load_from_json(json_value, false)?.len();
        debug!(table = %self.name, %path, rows = added, "loaded rows from file");
        Ok(added)
    }
}

/// Thread-safe, user-facing handle to a table. Cloning shares the table.
#[derive(Debug, Clone)]
pub struct DbTable {
    inner: Arc<RwLock<InternalTable>>,
}

impl DbTable {
    pub fn new(table: InternalTable) -> Self {
        Self { inner: Arc::new(RwLock::new(table)) }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, InternalTable> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InternalTable> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn config(&self) -> DbConfig {
        self.read().config().clone()
    }

    pub fn schema(&self) -> Option<Arc<EntitySchema>> {
        self.read().schema.clone()
    }

    pub fn get_all(&self) -> Vec<Value> {
        self.read().get_all()
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.read().get(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.read().exists(id)
    }

    pub fn count(&self) -> usize {
        self.read().count()
    }

    pub fn add(&self, item: Value) -> Result<Value, DbError> {
        self.write().add(item)
    }

    pub fn add_batch(&self, items: Value) -> Vec<Value> {
        self.write().add_batch(items)
    }

    pub fn delete(&self, id: &str) -> Option<Value> {
        self.write().delete(id)
    }

    pub fn clear(&self) -> usize {
        self.write().clear()
    }

    /// Load rows from a JSON array, replacing current content unless `keep`.
    pub fn load_from_json(&self, json_value: Value, keep: bool) -> Result<Vec<Value>, DbError> {
        self.write().load_from_json(json_value, keep)
    }

    /// Load rows from a file holding a JSON array. Returns the number of rows stored.
    pub fn load_from_file(&self, file_path: impl AsRef<Path>) -> Result<usize, DbError> {
        self.write().load_from_file(file_path.as_ref())
    }
}
