//! Pipeline stages
//!
//! A stage is one of a closed set of kinds, each carrying typed
//! configuration. Stages are built once and never mutated while running.

use std::collections::BTreeSet;
use std::fmt;

use crate::record::{path_root, Record};

use super::bucket::BucketAutoStage;
use super::errors::PipelineResult;
use super::filters::{Predicate, PredicateFilter};
use super::group::GroupStage;
use super::project::ProjectStage;
use super::sorter::SortStage;

/// Match stage: keeps records satisfying every predicate
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchStage {
    pub predicates: Vec<Predicate>,
}

impl MatchStage {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Runs the stage. Order of the surviving records is preserved.
    pub fn apply(&self, input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        Ok(input
            .into_iter()
            .filter(|r| PredicateFilter::matches(r, &self.predicates))
            .collect())
    }
}

/// Stage kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Match,
    Group,
    BucketAuto,
    Project,
    Sort,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Match => "match",
            StageKind::Group => "group",
            StageKind::BucketAuto => "bucketAuto",
            StageKind::Project => "project",
            StageKind::Sort => "sort",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields known to exist on records flowing between stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Source records: any field may exist
    Open,
    /// Only these top-level fields can exist
    Closed(BTreeSet<String>),
}

impl Shape {
    fn closed<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        Shape::Closed(fields.into_iter().map(str::to_string).collect())
    }

    /// True if a field with this top-level name can exist
    pub fn provides(&self, root: &str) -> bool {
        match self {
            Shape::Open => true,
            Shape::Closed(fields) => fields.contains(root),
        }
    }
}

/// One pipeline step
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(MatchStage),
    Group(GroupStage),
    BucketAuto(BucketAutoStage),
    Project(ProjectStage),
    Sort(SortStage),
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Match(_) => StageKind::Match,
            Stage::Group(_) => StageKind::Group,
            Stage::BucketAuto(_) => StageKind::BucketAuto,
            Stage::Project(_) => StageKind::Project,
            Stage::Sort(_) => StageKind::Sort,
        }
    }

    /// Checks the stage's own configuration
    pub fn check(&self) -> PipelineResult<()> {
        match self {
            Stage::Match(_) => Ok(()),
            Stage::Group(s) => s.check(),
            Stage::BucketAuto(s) => s.check(),
            Stage::Project(s) => s.check(),
            Stage::Sort(s) => s.check(),
        }
    }

    /// Top-level fields that must exist upstream
    pub fn required_roots(&self) -> Vec<&str> {
        match self {
            Stage::Match(_) => Vec::new(),
            Stage::Group(s) => s.key.paths().into_iter().map(path_root).collect(),
            Stage::BucketAuto(s) => vec![path_root(&s.group_by)],
            Stage::Project(s) => s.source_roots(),
            Stage::Sort(s) => s.keys.iter().map(|k| path_root(&k.field)).collect(),
        }
    }

    /// Shape of this stage's output given its input shape
    pub fn output_shape(&self, input: &Shape) -> Shape {
        match self {
            Stage::Match(_) | Stage::Sort(_) => input.clone(),
            Stage::Group(s) => Shape::closed(
                std::iter::once("_id").chain(s.accumulators.iter().map(|(n, _)| n.as_str())),
            ),
            Stage::BucketAuto(s) => {
                let outputs = s.outputs();
                Shape::closed(
                    std::iter::once("_id").chain(outputs.iter().map(|(n, _)| n.as_str())),
                )
            }
            Stage::Project(s) if s.is_inclusive() => Shape::closed(s.output_fields()),
            Stage::Project(s) => match input {
                Shape::Open => Shape::Open,
                Shape::Closed(fields) => Shape::Closed(
                    fields.iter().filter(|f| !s.excludes(f)).cloned().collect(),
                ),
            },
        }
    }

    /// Runs the stage over its full input
    pub fn apply(&self, input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        match self {
            Stage::Match(s) => s.apply(input),
            Stage::Group(s) => s.apply(input),
            Stage::BucketAuto(s) => s.apply(input),
            Stage::Project(s) => s.apply(input),
            Stage::Sort(s) => s.apply(input),
        }
    }
}

impl From<MatchStage> for Stage {
    fn from(s: MatchStage) -> Self {
        Stage::Match(s)
    }
}

impl From<GroupStage> for Stage {
    fn from(s: GroupStage) -> Self {
        Stage::Group(s)
    }
}

impl From<BucketAutoStage> for Stage {
    fn from(s: BucketAutoStage) -> Self {
        Stage::BucketAuto(s)
    }
}

impl From<ProjectStage> for Stage {
    fn from(s: ProjectStage) -> Self {
        Stage::Project(s)
    }
}

impl From<SortStage> for Stage {
    fn from(s: SortStage) -> Self {
        Stage::Sort(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::accumulator::Accumulator;
    use crate::pipeline::sorter::SortSpec;
    use serde_json::json;

    #[test]
    fn test_match_preserves_order() {
        let input: Vec<Record> = (0..6).map(|i| Record::new().with("n", i)).collect();
        let stage = Stage::from(MatchStage::new(vec![Predicate::gte("n", 3)]));
        let out = stage.apply(input).unwrap();
        let ns: Vec<i64> = out.iter().map(|r| r.get("n").unwrap().as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 4, 5]);
    }

    #[test]
    fn test_group_output_shape() {
        let stage = Stage::from(GroupStage::by("Make").accumulate("n", Accumulator::Count));
        let shape = stage.output_shape(&Shape::Open);
        assert!(shape.provides("_id"));
        assert!(shape.provides("n"));
        assert!(!shape.provides("Make"));
    }

    #[test]
    fn test_exclusive_project_shape() {
        let stage = Stage::from(ProjectStage::new().exclude("b"));
        let input = Shape::closed(["a", "b"]);
        assert_eq!(stage.output_shape(&input), Shape::closed(["a"]));
        assert_eq!(stage.output_shape(&Shape::Open), Shape::Open);
    }

    #[test]
    fn test_required_roots() {
        let stage = Stage::from(SortStage::by(SortSpec::desc("_id.min")));
        assert_eq!(stage.required_roots(), vec!["_id"]);
        assert_eq!(stage.kind().as_str(), "sort");
    }

    #[test]
    fn test_stage_dispatch() {
        let input = vec![Record::new().with("a", json!(1))];
        let out = Stage::from(ProjectStage::new().exclude("a")).apply(input).unwrap();
        assert!(out[0].is_empty());
    }
}
