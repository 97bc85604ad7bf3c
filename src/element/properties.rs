//! Properties resident on an in-memory element handle

use crate::codec::{PropertyMap, PropertyValue};
use std::collections::HashMap;

/// Tracks which properties a handle already knows.
///
/// A key can be resident with a value, resident as known-absent, or not
/// resident at all (needs a fetch). When `complete` is set the handle holds
/// the full row and any non-resident key is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidentProperties {
    values: HashMap<String, Option<PropertyValue>>,
    complete: bool,
}

impl ResidentProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle built from a full row read
    pub fn complete(properties: PropertyMap) -> Self {
        Self {
            values: properties.into_iter().map(|(k, v)| (k, Some(v))).collect(),
            complete: true,
        }
    }

    /// Record a subset fetch: every requested key becomes resident.
    pub fn load_subset(&mut self, keys: &[String], mut found: PropertyMap) {
        for key in keys {
            let value = found.remove(key);
            self.values.insert(key.clone(), value);
        }
    }

    pub fn load_all(&mut self, properties: PropertyMap) {
        *self = Self::complete(properties);
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// `Some(Some(v))` resident, `Some(None)` known absent, `None` unknown
    pub fn lookup(&self, key: &str) -> Option<Option<&PropertyValue>> {
        match self.values.get(key) {
            Some(v) => Some(v.as_ref()),
            None if self.complete => Some(None),
            None => None,
        }
    }

    pub fn is_resident(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.values.insert(key.into(), Some(value));
    }

    pub fn mark_absent(&mut self, key: impl Into<String>) {
        self.values.insert(key.into(), None);
    }

    /// Keys with a resident value
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn to_map(&self) -> PropertyMap {
        self.values
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect()
    }
}
