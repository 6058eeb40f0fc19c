use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{RecordStore, StoreError, Table};

/// In-process store that enforces the same unique keys as the hosted one.
/// Counts every `insert` call, including rejected ones and calls made while
/// unconfigured.
pub struct MemoryStore {
    configured: bool,
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    insert_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            configured: true,
            tables: Mutex::new(HashMap::new()),
            insert_calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn records(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .map(|tables| tables.get(&table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl RecordStore for MemoryStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn insert<R>(&self, table: Table, record: &R) -> Result<Value, StoreError>
    where
        R: Serialize + Sync,
    {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return Err(StoreError::NotConfigured);
        }

        let mut row = serde_json::to_value(record)
            .map_err(|e| StoreError::Unknown(format!("Failed to serialize record. {e}")))?;
        let Value::Object(fields) = &mut row else {
            return Err(StoreError::Unknown("Records must be JSON objects.".into()));
        };
        fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));

        let mut tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::Unknown(e.to_string()))?;
        let rows = tables.entry(table).or_default();
        if let Some(key) = table.unique_key() {
            let value = &row[key];
            if rows.iter().any(|existing| &existing[key] == value) {
                return Err(StoreError::DuplicateKey(format!(
                    "Key ({key})=({value}) already exists in {}.",
                    table.name()
                )));
            }
        }
        rows.push(row.clone());
        Ok(Value::Array(vec![row]))
    }
}
