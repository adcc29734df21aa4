//! Group stage
//!
//! Partitions records by key and emits one record per distinct key:
//! `{_id: <key>, <accumulator outputs>}`. Output is ordered by key, so the
//! result does not depend on input order.

use std::collections::HashMap;

use serde_json::Value;

use crate::record::{compare_values, Record};

use super::accumulator::{Accumulator, AccumulatorState};
use super::errors::{PipelineError, PipelineResult};

const STAGE: &str = "group";

/// Grouping key
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// Key is the value at one field path
    Field(String),
    /// Key is an object of (name, field path) pairs
    Composite(Vec<(String, String)>),
}

impl GroupKey {
    /// Composite key whose output names equal the field names
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupKey::Composite(
            fields
                .into_iter()
                .map(|f| {
                    let f = f.into();
                    (f.clone(), f)
                })
                .collect(),
        )
    }

    /// Field paths the key reads
    pub fn paths(&self) -> Vec<&str> {
        match self {
            GroupKey::Field(path) => vec![path.as_str()],
            GroupKey::Composite(parts) => parts.iter().map(|(_, p)| p.as_str()).collect(),
        }
    }

    /// Reads the key of one record. Missing parts group under null.
    fn extract(&self, record: &Record) -> Value {
        let read = |path: &str| record.lookup(path).map_or(Value::Null, canonical);

        match self {
            GroupKey::Field(path) => read(path),
            GroupKey::Composite(parts) => Value::Object(
                parts
                    .iter()
                    .map(|(name, path)| (name.clone(), read(path)))
                    .collect(),
            ),
        }
    }
}

/// Rewrites numbers so that numerically equal keys are identical:
/// integral values become integers, `-0.0` becomes `0`.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Value::from(f as i64)
            }
            Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => {
                Value::from(f as u64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), canonical(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Group stage configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStage {
    pub key: GroupKey,
    /// (output field, accumulator) pairs
    pub accumulators: Vec<(String, Accumulator)>,
}

impl GroupStage {
    /// Groups by a single field path
    pub fn by(path: impl Into<String>) -> Self {
        Self {
            key: GroupKey::Field(path.into()),
            accumulators: Vec::new(),
        }
    }

    /// Groups by a composite key
    pub fn by_key(key: GroupKey) -> Self {
        Self {
            key,
            accumulators: Vec::new(),
        }
    }

    /// Adds an accumulator
    pub fn accumulate(mut self, output: impl Into<String>, acc: Accumulator) -> Self {
        self.accumulators.push((output.into(), acc));
        self
    }

    pub(crate) fn check(&self) -> PipelineResult<()> {
        for (name, _) in &self.accumulators {
            if name == "_id" || name.is_empty() || name.contains('.') {
                return Err(PipelineError::InvalidStage(format!(
                    "{}: invalid output field '{}'",
                    STAGE, name
                )));
            }
        }
        if let GroupKey::Composite(parts) = &self.key {
            if parts.is_empty() {
                return Err(PipelineError::InvalidStage(format!(
                    "{}: composite key has no fields",
                    STAGE
                )));
            }
        }
        Ok(())
    }

    /// Runs the stage
    pub fn apply(&self, input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        self.check()?;

        // JSON text of the canonical key identifies the group
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(Value, Vec<AccumulatorState>)> = Vec::new();

        for record in &input {
            let key = self.key.extract(record);
            let text = key.to_string();
            let slot = match index.get(&text) {
                Some(&slot) => slot,
                None => {
                    let states = self.accumulators.iter().map(|(_, a)| a.start()).collect();
                    groups.push((key, states));
                    index.insert(text, groups.len() - 1);
                    groups.len() - 1
                }
            };

            let states = &mut groups[slot].1;
            for ((_, acc), state) in self.accumulators.iter().zip(states.iter_mut()) {
                state.add(acc, record, STAGE)?;
            }
        }

        groups.sort_by(|(a, _), (b, _)| compare_values(Some(a), Some(b)));

        Ok(groups
            .into_iter()
            .map(|(key, states)| {
                let mut out = Record::new();
                out.insert("_id", key);
                for ((name, _), state) in self.accumulators.iter().zip(states) {
                    out.insert(name.clone(), state.finish());
                }
                out
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::from_value(v).unwrap())
            .collect()
    }

    #[test]
    fn test_group_count_by_field() {
        let input = records(vec![
            json!({"FuelType": "PE"}),
            json!({"FuelType": "DI"}),
            json!({"FuelType": "PE"}),
        ]);
        let out = GroupStage::by("FuelType")
            .accumulate("CarAmount", Accumulator::Count)
            .apply(input)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("_id"), Some(&json!("DI")));
        assert_eq!(out[0].get("CarAmount"), Some(&json!(1)));
        assert_eq!(out[1].get("_id"), Some(&json!("PE")));
        assert_eq!(out[1].get("CarAmount"), Some(&json!(2)));
    }

    #[test]
    fn test_composite_key_merges_once() {
        let input = records(vec![
            json!({"Make": "A", "Model": "X"}),
            json!({"Make": "A", "Model": "X"}),
            json!({"Make": "A", "Model": "Y"}),
        ]);
        let out = GroupStage::by_key(GroupKey::fields(["Make", "Model"]))
            .apply(input)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("_id"), Some(&json!({"Make": "A", "Model": "X"})));
        assert_eq!(out[0].len(), 1);
    }

    #[test]
    fn test_group_by_nested_path() {
        let input = records(vec![
            json!({"_id": {"Make": "A", "Model": "X"}}),
            json!({"_id": {"Make": "A", "Model": "Y"}}),
            json!({"_id": {"Make": "B", "Model": "X"}}),
        ]);
        let out = GroupStage::by("_id.Make")
            .accumulate("ModelTypes", Accumulator::Count)
            .apply(input)
            .unwrap();

        assert_eq!(out[0].get("ModelTypes"), Some(&json!(2)));
        assert_eq!(out[1].get("ModelTypes"), Some(&json!(1)));
    }

    #[test]
    fn test_missing_key_groups_under_null() {
        let input = records(vec![
            json!({"Make": "A"}),
            json!({"Model": "X"}),
            json!({"Make": null}),
        ]);
        let out = GroupStage::by("Make")
            .accumulate("n", Accumulator::Count)
            .apply(input)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("_id"), Some(&Value::Null));
        assert_eq!(out[0].get("n"), Some(&json!(2)));
    }

    #[test]
    fn test_numerically_equal_keys_merge() {
        let forward = records(vec![
            json!({"k": 1}),
            json!({"k": 1.0}),
            json!({"k": -0.0}),
            json!({"k": 0}),
        ]);
        let mut backward = forward.clone();
        backward.reverse();

        let stage = GroupStage::by("k").accumulate("n", Accumulator::Count);
        let a = stage.apply(forward).unwrap();
        let b = stage.apply(backward).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            a.into_iter().map(Record::into_value).collect::<Vec<_>>(),
            vec![json!({"_id": 0, "n": 2}), json!({"_id": 1, "n": 2})]
        );
    }

    #[test]
    fn test_composite_key_numbers_merge() {
        let input = records(vec![
            json!({"Make": "A", "Year": 2001}),
            json!({"Make": "A", "Year": 2001.0}),
            json!({"Make": "A", "Year": 2001.5}),
        ]);
        let out = GroupStage::by_key(GroupKey::fields(["Make", "Year"]))
            .accumulate("n", Accumulator::Count)
            .apply(input)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("n"), Some(&json!(2)));
    }

    #[test]
    fn test_empty_input() {
        let out = GroupStage::by("Make")
            .accumulate("n", Accumulator::Count)
            .apply(Vec::new())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_output_name() {
        let err = GroupStage::by("Make")
            .accumulate("_id", Accumulator::Count)
            .apply(Vec::new())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_sum_accumulator() {
        let input = records(vec![
            json!({"Make": "A", "tests": 3}),
            json!({"Make": "A", "tests": 4}),
        ]);
        let out = GroupStage::by("Make")
            .accumulate("total", Accumulator::Sum("tests".into()))
            .apply(input)
            .unwrap();
        assert_eq!(out[0].get("total"), Some(&json!(7)));
    }
}
