//! Accumulators computed per group or per bucket

use serde_json::{Number, Value};

use crate::record::{type_name, Record};

use super::errors::{PipelineError, PipelineResult};

/// Aggregate computed over the records of one group
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Number of records
    Count,
    /// Numeric sum of a field
    Sum(String),
    /// Values of a field in input order
    Push(String),
    /// One object per record built from (output name, field path) pairs
    PushFields(Vec<(String, String)>),
}

impl Accumulator {
    /// Field paths this accumulator reads
    pub fn source_paths(&self) -> Vec<&str> {
        match self {
            Accumulator::Count => Vec::new(),
            Accumulator::Sum(path) | Accumulator::Push(path) => vec![path.as_str()],
            Accumulator::PushFields(fields) => fields.iter().map(|(_, p)| p.as_str()).collect(),
        }
    }

    /// Creates the running state for one group
    pub(crate) fn start(&self) -> AccumulatorState {
        match self {
            Accumulator::Count => AccumulatorState::Count(0),
            Accumulator::Sum(_) => AccumulatorState::SumInt(0),
            Accumulator::Push(_) | Accumulator::PushFields(_) => {
                AccumulatorState::Items(Vec::new())
            }
        }
    }
}

/// Running state of one accumulator for one group
#[derive(Debug, Clone)]
pub(crate) enum AccumulatorState {
    Count(u64),
    SumInt(i64),
    SumFloat(f64),
    Items(Vec<Value>),
}

impl AccumulatorState {
    /// Folds one record into the state
    pub(crate) fn add(
        &mut self,
        acc: &Accumulator,
        record: &Record,
        stage: &'static str,
    ) -> PipelineResult<()> {
        match (self, acc) {
            (AccumulatorState::Count(n), Accumulator::Count) => {
                *n += 1;
            }
            (state, Accumulator::Sum(path)) => {
                // Missing operands contribute nothing
                let number = match record.lookup(path) {
                    None | Some(Value::Null) => return Ok(()),
                    Some(Value::Number(n)) => n,
                    Some(other) => {
                        return Err(PipelineError::TypeMismatch {
                            stage,
                            field: path.clone(),
                            expected: "number",
                            found: type_name(other),
                        })
                    }
                };
                state.add_number(number);
            }
            (AccumulatorState::Items(items), Accumulator::Push(path)) => {
                items.push(record.lookup(path).cloned().unwrap_or(Value::Null));
            }
            (AccumulatorState::Items(items), Accumulator::PushFields(fields)) => {
                let mut item = Record::new();
                for (name, path) in fields {
                    if let Some(v) = record.lookup(path) {
                        item.insert(name.clone(), v.clone());
                    }
                }
                items.push(item.into_value());
            }
            _ => {
                return Err(PipelineError::InvalidStage(format!(
                    "{}: accumulator state does not match its definition",
                    stage
                )))
            }
        }
        Ok(())
    }

    fn add_number(&mut self, number: &Number) {
        let promoted = match self {
            AccumulatorState::SumInt(total) => {
                match number.as_i64().and_then(|i| total.checked_add(i)) {
                    Some(sum) => {
                        *total = sum;
                        return;
                    }
                    // Overflow or a float operand switches to float arithmetic
                    None => *total as f64 + number.as_f64().unwrap_or(0.0),
                }
            }
            AccumulatorState::SumFloat(total) => {
                *total += number.as_f64().unwrap_or(0.0);
                return;
            }
            _ => return,
        };
        *self = AccumulatorState::SumFloat(promoted);
    }

    /// Produces the output value
    pub(crate) fn finish(self) -> Value {
        match self {
            AccumulatorState::Count(n) => Value::from(n),
            AccumulatorState::SumInt(total) => Value::from(total),
            AccumulatorState::SumFloat(total) => Number::from_f64(total)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AccumulatorState::Items(items) => Value::Array(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fold(acc: &Accumulator, docs: &[Value]) -> PipelineResult<Value> {
        let mut state = acc.start();
        for doc in docs {
            let record = Record::from_value(doc.clone()).unwrap();
            state.add(acc, &record, "group")?;
        }
        Ok(state.finish())
    }

    #[test]
    fn test_count() {
        let v = fold(&Accumulator::Count, &[json!({}), json!({})]).unwrap();
        assert_eq!(v, json!(2));
    }

    #[test]
    fn test_sum_stays_integer() {
        let acc = Accumulator::Sum("n".into());
        let v = fold(&acc, &[json!({"n": 2}), json!({"n": 3}), json!({})]).unwrap();
        assert_eq!(v, json!(5));
    }

    #[test]
    fn test_sum_promotes_to_float() {
        let acc = Accumulator::Sum("n".into());
        let v = fold(&acc, &[json!({"n": 2}), json!({"n": 0.5})]).unwrap();
        assert_eq!(v.as_f64(), Some(2.5));
    }

    #[test]
    fn test_sum_rejects_strings() {
        let acc = Accumulator::Sum("n".into());
        let err = fold(&acc, &[json!({"n": "2"})]).unwrap_err();
        assert_eq!(err.code(), "FACET_TYPE_MISMATCH");
    }

    #[test]
    fn test_push_fields() {
        let acc = Accumulator::PushFields(vec![
            ("Make".into(), "_id".into()),
            ("ModelTypesCount".into(), "ModelTypes".into()),
        ]);
        let v = fold(&acc, &[json!({"_id": "FORD", "ModelTypes": 3})]).unwrap();
        assert_eq!(v, json!([{"Make": "FORD", "ModelTypesCount": 3}]));
    }
}
