//! Aggregation report

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::record::Record;

/// Facet name to that facet's output, in facet declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    entries: Vec<(String, Vec<Record>)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a facet's output, replacing any earlier output for that name
    pub fn insert(&mut self, facet: impl Into<String>, records: Vec<Record>) {
        let facet = facet.into();
        match self.entries.iter_mut().find(|(name, _)| *name == facet) {
            Some((_, existing)) => *existing = records,
            None => self.entries.push((facet, records)),
        }
    }

    pub fn get(&self, facet: &str) -> Option<&[Record]> {
        self.entries
            .iter()
            .find(|(name, _)| name == facet)
            .map(|(_, records)| records.as_slice())
    }

    pub fn facets(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Single document with one array field per facet
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        for (name, records) in self.entries {
            let values = records.into_iter().map(Record::into_value).collect();
            record.insert(name, Value::Array(values));
        }
        record
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, records) in &self.entries {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keeps_declaration_order() {
        let mut report = Report::new();
        report.insert("b", vec![]);
        report.insert("a", vec![Record::new().with("x", 1)]);
        assert_eq!(report.facets().collect::<Vec<_>>(), vec!["b", "a"]);

        let text = report.to_pretty_json().unwrap();
        assert!(text.find("\"b\"").unwrap() < text.find("\"a\"").unwrap());
    }

    #[test]
    fn test_insert_replaces() {
        let mut report = Report::new();
        report.insert("a", vec![Record::new()]);
        report.insert("a", vec![]);
        assert_eq!(report.len(), 1);
        assert_eq!(report.get("a").map(|r| r.len()), Some(0));
    }

    #[test]
    fn test_into_record() {
        let mut report = Report::new();
        report.insert("fuel", vec![Record::new().with("CarAmount", 2)]);
        report.insert("empty", vec![]);
        let record = report.into_record();
        assert_eq!(record.get("fuel"), Some(&json!([{"CarAmount": 2}])));
        assert_eq!(record.get("empty"), Some(&json!([])));
    }
}
