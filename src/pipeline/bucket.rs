//! BucketAuto stage
//!
//! Splits records into roughly equal-sized buckets by a numeric field. Each
//! output record is `{_id: {min, max}, <accumulator outputs>}` with `min`
//! inclusive and `max` exclusive, except that without a granularity the last
//! bucket's `max` is the largest value and is inclusive.
//!
//! Runs of equal values always stay in one bucket, so fewer buckets than
//! requested may be produced.

use serde_json::{json, Number, Value};

use crate::record::{compare_values, type_name, Record};

use super::accumulator::{Accumulator, AccumulatorState};
use super::errors::{PipelineError, PipelineResult};
use super::granularity::Granularity;

const STAGE: &str = "bucketAuto";

/// BucketAuto stage configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BucketAutoStage {
    /// Numeric field path to bucket by
    pub group_by: String,
    /// Requested number of buckets
    pub buckets: usize,
    /// Optional preferred-number series for boundaries
    pub granularity: Option<Granularity>,
    /// (output field, accumulator) pairs; defaults to `count`
    pub output: Vec<(String, Accumulator)>,
}

struct Bucket<'a> {
    min: Value,
    max: Value,
    members: Vec<&'a Record>,
}

impl BucketAutoStage {
    pub fn new(group_by: impl Into<String>, buckets: usize) -> Self {
        Self {
            group_by: group_by.into(),
            buckets,
            granularity: None,
            output: Vec::new(),
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    /// Adds an output accumulator
    pub fn accumulate(mut self, output: impl Into<String>, acc: Accumulator) -> Self {
        self.output.push((output.into(), acc));
        self
    }

    /// Output accumulators, falling back to `count`
    pub fn outputs(&self) -> Vec<(String, Accumulator)> {
        if self.output.is_empty() {
            vec![("count".to_string(), Accumulator::Count)]
        } else {
            self.output.clone()
        }
    }

    pub(crate) fn check(&self) -> PipelineResult<()> {
        if self.buckets == 0 {
            return Err(PipelineError::InvalidStage(format!(
                "{}: bucket count must be at least 1",
                STAGE
            )));
        }
        for (name, _) in &self.output {
            if name == "_id" || name.is_empty() || name.contains('.') {
                return Err(PipelineError::InvalidStage(format!(
                    "{}: invalid output field '{}'",
                    STAGE, name
                )));
            }
        }
        Ok(())
    }

    /// Reads and validates the bucketing value of one record
    fn value_of<'a>(&self, record: &'a Record) -> PipelineResult<(&'a Value, f64)> {
        let value = record
            .lookup(&self.group_by)
            .ok_or_else(|| PipelineError::MissingField {
                stage: STAGE,
                field: self.group_by.clone(),
            })?;

        let number = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            other => {
                return Err(PipelineError::TypeMismatch {
                    stage: STAGE,
                    field: self.group_by.clone(),
                    expected: "number",
                    found: type_name(other),
                })
            }
        };

        if self.granularity.is_some() && (number < 0.0 || !number.is_finite()) {
            return Err(PipelineError::InvalidValue {
                stage: STAGE,
                field: self.group_by.clone(),
                value: value.to_string(),
            });
        }
        Ok((value, number))
    }

    /// Runs the stage
    pub fn apply(&self, input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        self.check()?;

        let mut entries = Vec::with_capacity(input.len());
        for record in &input {
            let (value, number) = self.value_of(record)?;
            entries.push((value, number, record));
        }
        entries.sort_by(|a, b| compare_values(Some(a.0), Some(b.0)));

        let buckets = self.fill(&entries);
        let outputs = self.outputs();

        let mut result = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let mut states: Vec<AccumulatorState> =
                outputs.iter().map(|(_, acc)| acc.start()).collect();
            for record in &bucket.members {
                for ((_, acc), state) in outputs.iter().zip(states.iter_mut()) {
                    state.add(acc, record, STAGE)?;
                }
            }

            let mut out = Record::new();
            out.insert("_id", json!({"min": bucket.min, "max": bucket.max}));
            for ((name, _), state) in outputs.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            result.push(out);
        }
        Ok(result)
    }

    fn fill<'a>(&self, entries: &[(&Value, f64, &'a Record)]) -> Vec<Bucket<'a>> {
        let Some((first, rest)) = entries.split_first() else {
            return Vec::new();
        };

        let target = ((entries.len() as f64 / self.buckets as f64).round() as usize).max(1);
        let mut closed: Vec<Bucket<'a>> = Vec::new();

        let mut current = Bucket {
            min: match self.granularity {
                Some(g) => float(g.round_down(first.1)),
                None => first.0.clone(),
            },
            max: first.0.clone(),
            members: vec![first.2],
        };
        let mut current_max = first.1;

        for &(value, number, record) in rest {
            let full = current.members.len() >= target && closed.len() + 1 < self.buckets;
            if full && number > current_max {
                let boundary = match self.granularity {
                    Some(g) => {
                        let up = g.round_up(current_max);
                        // The next value must not fall below the next bucket's min
                        (up <= number).then(|| float(up))
                    }
                    None => Some(value.clone()),
                };

                if let Some(boundary) = boundary {
                    let mut done = std::mem::replace(
                        &mut current,
                        Bucket {
                            min: boundary.clone(),
                            max: value.clone(),
                            members: vec![record],
                        },
                    );
                    done.max = boundary;
                    closed.push(done);
                    current_max = number;
                    continue;
                }
            }

            current.max = value.clone();
            current.members.push(record);
            current_max = number;
        }

        if let Some(g) = self.granularity {
            current.max = float(g.round_up(current_max));
        }
        closed.push(current);
        closed
    }
}

fn float(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(nums: &[f64]) -> Vec<Record> {
        nums.iter()
            .map(|n| Record::new().with("v", *n))
            .collect()
    }

    fn bounds(out: &[Record]) -> Vec<(f64, f64, u64)> {
        out.iter()
            .map(|r| {
                (
                    r.lookup("_id.min").and_then(Value::as_f64).unwrap(),
                    r.lookup("_id.max").and_then(Value::as_f64).unwrap(),
                    r.get("count").and_then(Value::as_u64).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_two_values_one_two_five() {
        let out = BucketAutoStage::new("v", 20)
            .with_granularity(Granularity::OneTwoFive)
            .apply(values(&[2.0, 1.0]))
            .unwrap();
        assert_eq!(bounds(&out), vec![(0.5, 2.0, 1), (2.0, 5.0, 1)]);
    }

    #[test]
    fn test_equal_values_stay_together() {
        let out = BucketAutoStage::new("v", 4)
            .apply(values(&[1.0, 1.0, 1.0, 1.0, 2.0]))
            .unwrap();
        assert_eq!(bounds(&out), vec![(1.0, 2.0, 4), (2.0, 2.0, 1)]);
    }

    #[test]
    fn test_without_granularity_boundaries_are_values() {
        let out = BucketAutoStage::new("v", 2)
            .apply(values(&[4.0, 1.0, 3.0, 2.0]))
            .unwrap();
        assert_eq!(bounds(&out), vec![(1.0, 3.0, 2), (3.0, 4.0, 2)]);
    }

    #[test]
    fn test_rounded_boundary_absorbs_close_values() {
        // round_up(1) = 2 lies above 1.5, so 1.5 joins the first bucket
        let out = BucketAutoStage::new("v", 3)
            .with_granularity(Granularity::OneTwoFive)
            .apply(values(&[1.0, 1.5, 3.0]))
            .unwrap();
        assert_eq!(bounds(&out), vec![(0.5, 2.0, 2), (2.0, 5.0, 1)]);
    }

    #[test]
    fn test_bucket_count_is_capped() {
        let nums: Vec<f64> = (1..=100).map(f64::from).collect();
        let out = BucketAutoStage::new("v", 5).apply(values(&nums)).unwrap();
        assert_eq!(out.len(), 5);
        let total: u64 = bounds(&out).iter().map(|b| b.2).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_zero_with_granularity() {
        let out = BucketAutoStage::new("v", 2)
            .with_granularity(Granularity::OneTwoFive)
            .apply(values(&[0.0, 0.0, 0.3, 4.0]))
            .unwrap();
        let b = bounds(&out);
        assert_eq!(b[0].0, 0.0);
        assert_eq!(b.iter().map(|x| x.2).sum::<u64>(), 4);
        assert!(b.last().unwrap().1 > 4.0);
    }

    #[test]
    fn test_non_numeric_fails() {
        let input = vec![Record::new().with("v", "seven")];
        let err = BucketAutoStage::new("v", 3).apply(input).unwrap_err();
        assert_eq!(err.code(), "FACET_TYPE_MISMATCH");
    }

    #[test]
    fn test_negative_with_granularity_fails() {
        let err = BucketAutoStage::new("v", 3)
            .with_granularity(Granularity::R5)
            .apply(values(&[-1.0]))
            .unwrap_err();
        assert_eq!(err.code(), "FACET_INVALID_VALUE");
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let err = BucketAutoStage::new("v", 0).apply(Vec::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_input() {
        let out = BucketAutoStage::new("v", 3).apply(Vec::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_custom_output() {
        let input = vec![
            Record::new().with("v", 1).with("name", "a"),
            Record::new().with("v", 9).with("name", "b"),
        ];
        let out = BucketAutoStage::new("v", 1)
            .accumulate("names", Accumulator::Push("name".into()))
            .apply(input)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("names"), Some(&json!(["a", "b"])));
        assert!(out[0].get("count").is_none());
    }
}
