//! Extracted records
//!
//! A `Record` is an ordered field -> value mapping. A `RecordSet` pairs the
//! records with the field list they were produced under, so an empty set still
//! knows its header.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Field holding the extracted text or attribute
pub const VALUE_FIELD: &str = "value";
/// Optional field with the element's tag name
pub const TAG_FIELD: &str = "tag";
/// Optional field with a capped outer-HTML snippet
pub const HTML_FIELD: &str = "html";

/// Stands in for anything absent; fields are always strings
pub const MISSING: &str = "";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field record `{"value": value}`
    pub fn with_value(value: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert(VALUE_FIELD, value);
        record
    }

    /// Set a field, keeping its original position if it already exists
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `name`, or the missing sentinel
    pub fn get_or_missing(&self, name: &str) -> &str {
        self.get(name).unwrap_or(MISSING)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of field names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((name, value)) = access.next_entry::<String, Value>()? {
            let value = match value {
                Value::String(s) => s,
                Value::Null => MISSING.to_string(),
                other => other.to_string(),
            };
            record.insert(name, value);
        }
        Ok(record)
    }
}

/// Records plus the fixed field list they share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    fields: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            records: Vec::new(),
        }
    }

    pub fn with_records(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self { fields, records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of `record` in header order, missing fields as the sentinel
    pub fn row<'a>(&'a self, record: &'a Record) -> Vec<&'a str> {
        self.fields
            .iter()
            .map(|field| record.get_or_missing(field))
            .collect()
    }

    /// `record` restricted and reordered to this set's fields
    pub fn aligned(&self, record: &Record) -> Record {
        let mut out = Record::new();
        for field in &self.fields {
            out.insert(field.as_str(), record.get_or_missing(field));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order() {
        let mut record = Record::new();
        record.insert("value", "a");
        record.insert("tag", "p");
        record.insert("value", "b");

        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["value", "tag"]);
        assert_eq!(record.get("value"), Some("b"));
        assert_eq!(record.get("html"), None);
        assert_eq!(record.get_or_missing("html"), MISSING);
    }

    #[test]
    fn test_json_preserves_field_order() {
        let mut record = Record::new();
        record.insert("value", "x");
        record.insert("tag", "a");
        record.insert("html", "<a>x</a>");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"value":"x","tag":"a","html":"<a>x</a>"}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_deserialize_non_string_values() {
        let record: Record = serde_json::from_str(r#"{"value": null, "n": 3}"#).unwrap();
        assert_eq!(record.get("value"), Some(""));
        assert_eq!(record.get("n"), Some("3"));
    }

    #[test]
    fn test_row_alignment() {
        let set = RecordSet::new(vec!["value".to_string(), "tag".to_string()]);
        let mut record = Record::new();
        record.insert("tag", "div");
        assert_eq!(set.row(&record), vec!["", "div"]);

        let aligned = set.aligned(&record);
        let names: Vec<&str> = aligned.field_names().collect();
        assert_eq!(names, vec!["value", "tag"]);
    }
}
