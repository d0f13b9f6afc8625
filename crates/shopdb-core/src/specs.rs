//! Insertion-ordered specification table.
//!
//! Product specs scraped from a detail page keep the order rows were first
//! encountered in. A repeated key overwrites the earlier value but keeps the
//! earlier position. Serialized as a JSON object in table order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecTable {
    entries: Vec<(String, String)>,
}

impl SpecTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Removes `key`, shifting later entries up so relative order is kept.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns the first key (in table order) matching `predicate`.
    #[must_use]
    pub fn find_key<P>(&self, mut predicate: P) -> Option<&str>
    where
        P: FnMut(&str) -> bool,
    {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .find(|k| predicate(k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SpecTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = SpecTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl Serialize for SpecTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct SpecTableVisitor;

impl<'de> Visitor<'de> for SpecTableVisitor {
    type Value = SpecTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of specification names to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = SpecTable::new();
        while let Some((k, v)) = access.next_entry::<String, String>()? {
            table.insert(k, v);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for SpecTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SpecTableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_key_keeps_first_position_and_last_value() {
        let mut table = SpecTable::new();
        table.insert("Цвет", "чёрный");
        table.insert("Вес", "1 кг");
        let prev = table.insert("Цвет", "белый");

        assert_eq!(prev.as_deref(), Some("чёрный"));
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["Цвет", "Вес"]);
        assert_eq!(table.get("Цвет"), Some("белый"));
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut table: SpecTable = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        assert_eq!(table.remove("b").as_deref(), Some("2"));
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert!(table.remove("b").is_none());
    }

    #[test]
    fn serializes_as_object_in_table_order() {
        let table: SpecTable = [("z", "last"), ("a", "first")].into_iter().collect();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"z":"last","a":"first"}"#);
    }

    #[test]
    fn deserializes_in_document_order() {
        let table: SpecTable = serde_json::from_str(r#"{"z":"1","m":"2","a":"3"}"#).unwrap();
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["z", "m", "a"]);
    }

    #[test]
    fn find_key_returns_first_match() {
        let table: SpecTable = [("Описание 1", ""), ("Описание 2", "")].into_iter().collect();
        assert_eq!(
            table.find_key(|k| k.starts_with("Описание")),
            Some("Описание 1")
        );
    }
}
