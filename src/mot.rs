//! Built-in facets over MOT test result records
//!
//! Input records usually carry `FuelType`, `Make` and `Model`. Records with
//! no make or model, or with the `UNCLASSIFIED` placeholder, are left out of
//! the make/model histogram.

use crate::pipeline::{
    Accumulator, BucketAutoStage, Facet, FacetSet, Granularity, GroupKey, GroupStage, MatchStage,
    PipelineResult, Predicate, ProjectStage, SortSpec, SortStage,
};

pub const FUEL_TYPE_FACET: &str = "CategorisedCarsByFuelType";
pub const UNIQUE_MODELS_FACET: &str = "BucketedCarMakesByAmountOfUniqueModels";

/// Placeholder for an unknown make or model
pub const UNCLASSIFIED: &str = "UNCLASSIFIED";

/// Bucket count for the unique-models histogram
pub const UNIQUE_MODEL_BUCKETS: usize = 20;

/// Number of records per fuel type, most common first:
/// `{FuelType, CarAmount}`
pub fn categorised_cars_by_fuel_type() -> Facet {
    Facet::new(FUEL_TYPE_FACET)
        .stage(GroupStage::by("FuelType").accumulate("CarAmount", Accumulator::Count))
        .stage(SortStage::by(SortSpec::desc("CarAmount")))
        .stage(
            ProjectStage::new()
                .exclude("_id")
                .rename("FuelType", "_id")
                .include("CarAmount"),
        )
}

/// Histogram of makes by how many distinct models each has:
/// `{MinUniqueModels, MaxUniqueModels, CarMakesInBucket}`, with boundaries
/// on the 1-2-5 series.
///
/// With `include_makes` each bucket also lists its makes as
/// `Makes: [{Make, ModelTypesCount}]`.
pub fn bucketed_car_makes_by_amount_of_unique_models(include_makes: bool) -> Facet {
    let mut buckets = BucketAutoStage::new("ModelTypes", UNIQUE_MODEL_BUCKETS)
        .with_granularity(Granularity::OneTwoFive)
        .accumulate("CarMakesInBucket", Accumulator::Count);
    let mut project = ProjectStage::new()
        .exclude("_id")
        .rename("MinUniqueModels", "_id.min")
        .rename("MaxUniqueModels", "_id.max")
        .include("CarMakesInBucket");

    if include_makes {
        buckets = buckets.accumulate(
            "Makes",
            Accumulator::PushFields(vec![
                ("Make".to_string(), "_id".to_string()),
                ("ModelTypesCount".to_string(), "ModelTypes".to_string()),
            ]),
        );
        project = project.include("Makes");
    }

    Facet::new(UNIQUE_MODELS_FACET)
        .stage(MatchStage::new(vec![
            Predicate::present("Make"),
            Predicate::present("Model"),
            Predicate::ne("Make", UNCLASSIFIED),
            Predicate::ne("Model", UNCLASSIFIED),
        ]))
        .stage(GroupStage::by_key(GroupKey::fields(["Make", "Model"])))
        .stage(GroupStage::by("_id.Make").accumulate("ModelTypes", Accumulator::Count))
        .stage(buckets)
        .stage(project)
}

/// Both MOT facets
pub fn mot_facets(include_makes: bool) -> PipelineResult<FacetSet> {
    FacetSet::new()
        .with(categorised_cars_by_fuel_type())?
        .with(bucketed_car_makes_by_amount_of_unique_models(include_makes))
}
