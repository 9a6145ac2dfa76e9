use crate::models::smart::{HealthStatus, SmartSupport};
use serde::Serialize;
use std::collections::BTreeMap;

/// A tokenized "label: value" value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(u64),
    Smart(SmartSupport),
    Health(HealthStatus),
    Text(String),
}

/// Canonical key → typed value for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn int(&self, key: &str) -> Option<u64> {
        match self.0.get(key) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn smart_support(&self) -> Option<SmartSupport> {
        match self.0.get("SmartSupport") {
            Some(FieldValue::Smart(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn health(&self) -> Option<HealthStatus> {
        self.0.values().find_map(|v| match v {
            FieldValue::Health(h) => Some(*h),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}
