//! Insertion-ordered mapping used by the `Dict` value kind.
//!
//! Storage preserves insertion order (`entries`) while `buckets` accelerates
//! lookup by hash. Numeric keys that compare equal hash equal, so `1`, `1.0`
//! and `True` address the same slot. Bucket collisions are resolved by value
//! equality.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::runtime::error::RuntimeError;
use crate::runtime::value::{Value, exact_integer};

#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
    buckets: FxHashMap<u64, Vec<usize>>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dict; duplicate keys keep their first position and last value.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<Self, RuntimeError> {
        let mut dict = Self::new();
        for (key, value) in entries {
            dict.insert(key, value)?;
        }
        Ok(dict)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, RuntimeError> {
        let hash = key_hash(key)?;
        Ok(self
            .find_index(hash, key)
            .map(|index| &self.entries[index].1))
    }

    pub fn contains_key(&self, key: &Value) -> Result<bool, RuntimeError> {
        Ok(self.get(key)?.is_some())
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), RuntimeError> {
        let hash = key_hash(&key)?;
        if let Some(index) = self.find_index(hash, &key) {
            self.entries[index].1 = value;
            return Ok(());
        }
        self.buckets
            .entry(hash)
            .or_default()
            .push(self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub(crate) fn equals(&self, other: &Dict) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| matches!(other.get(key), Ok(Some(found)) if found.equals(value)))
    }

    fn find_index(&self, hash: u64, key: &Value) -> Option<usize> {
        self.buckets
            .get(&hash)?
            .iter()
            .copied()
            .find(|&index| self.entries[index].0.equals(key))
    }
}

fn key_hash(key: &Value) -> Result<u64, RuntimeError> {
    let mut hasher = FxHasher::default();
    write_key(key, &mut hasher)?;
    Ok(hasher.finish())
}

fn write_key(key: &Value, state: &mut FxHasher) -> Result<(), RuntimeError> {
    if let Some(int) = key.as_integer() {
        int.hash(state);
        return Ok(());
    }
    if let Some(number) = key.as_complex() {
        match exact_integer(number.re) {
            Some(int) if number.im == 0.0 => int.hash(state),
            _ => {
                number.re.to_bits().hash(state);
                number.im.to_bits().hash(state);
            }
        }
        return Ok(());
    }
    key.kind().hash(state);
    match key {
        Value::List(_) | Value::Dict(_) => {
            return Err(RuntimeError::UnhashableKey {
                type_name: key.type_name().to_string(),
            });
        }
        Value::Tuple(items) => {
            for item in items.iter() {
                write_key(item, state)?;
            }
        }
        Value::Instance { id, .. } => id.hash(state),
        Value::String(text)
        | Value::Function(text)
        | Value::Class(text)
        | Value::Method(text)
        | Value::Property(text)
        | Value::Annotation(text) => text.hash(state),
        _ => {}
    }
    Ok(())
}
