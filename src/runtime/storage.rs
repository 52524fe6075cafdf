//! Variable storage used by the interpreter

use crate::error::VmError;
use crate::types::Value;
use std::collections::HashMap;

/// Backing store for script variables
pub trait VariableStorage {
    fn get(&self, name: &str) -> Option<Value>;
    fn set(&mut self, name: &str, value: Value) -> Result<(), VmError>;
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// HashMap-backed storage.
///
/// Once a variable holds a non-null value, it only accepts values of the same type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapVariableStorage {
    values: HashMap<String, Value>,
}

impl MapVariableStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl VariableStorage for MapVariableStorage {
    fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), VmError> {
        if let Some(existing) = self.values.get(name)
            && *existing != Value::Null
            && value != Value::Null
            && existing.type_name() != value.type_name()
        {
            return Err(VmError::StorageTypeMismatch {
                name: name.to_string(),
                expected: existing.type_name(),
                found: value.type_name(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }
}
