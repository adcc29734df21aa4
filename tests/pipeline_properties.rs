//! Pipeline property tests
//!
//! Deterministic loops over seeded random inputs:
//! - Match keeps an order-preserving subset
//! - Group output does not depend on input order or number representation
//! - BucketAuto places every record in exactly one bucket
//! - Project never changes cardinality

use motfacet::pipeline::{
    Accumulator, BucketAutoStage, Granularity, GroupStage, MatchStage, Predicate, ProjectStage,
    Stage,
};
use motfacet::record::Record;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ROUNDS: u64 = 50;

fn random_records(rng: &mut StdRng) -> Vec<Record> {
    let len = rng.gen_range(0..60);
    (0..len)
        .map(|i| {
            let make = ["FORD", "AUDI", "BMW", "KIA"][rng.gen_range(0..4)];
            Record::new()
                .with("seq", i)
                .with("Make", make)
                .with("Models", rng.gen_range(1..200))
        })
        .collect()
}

#[test]
fn test_match_is_ordered_subset() {
    let stage = Stage::from(MatchStage::new(vec![
        Predicate::ne("Make", "KIA"),
        Predicate::gte("Models", 50),
    ]));

    for seed in 0..ROUNDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = random_records(&mut rng);
        let output = stage.apply(input.clone()).unwrap();

        let expected: Vec<Record> = input
            .into_iter()
            .filter(|r| {
                r.get("Make").and_then(|v| v.as_str()) != Some("KIA")
                    && r.get("Models").and_then(|v| v.as_i64()).unwrap_or(0) >= 50
            })
            .collect();
        assert_eq!(output, expected, "seed {}", seed);
    }
}

#[test]
fn test_group_ignores_input_order() {
    let stage = Stage::from(
        GroupStage::by("Make")
            .accumulate("n", Accumulator::Count)
            .accumulate("total", Accumulator::Sum("Models".into())),
    );

    for seed in 0..ROUNDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = random_records(&mut rng);
        let mut shuffled = input.clone();
        shuffled.shuffle(&mut rng);

        let a = stage.apply(input).unwrap();
        let b = stage.apply(shuffled).unwrap();
        assert_eq!(a, b, "seed {}", seed);
    }
}

#[test]
fn test_group_merges_integer_and_float_keys() {
    let stage = Stage::from(GroupStage::by("Models").accumulate("n", Accumulator::Count));

    for seed in 0..ROUNDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let ints = random_records(&mut rng);
        // Same keys, some written as floats
        let mixed: Vec<Record> = ints
            .iter()
            .map(|r| {
                let models = r.get("Models").and_then(|v| v.as_i64()).unwrap();
                if rng.gen_bool(0.5) {
                    r.clone().with("Models", models as f64)
                } else {
                    r.clone()
                }
            })
            .collect();
        let mut shuffled = mixed.clone();
        shuffled.shuffle(&mut rng);

        let expected = stage.apply(ints).unwrap();
        assert_eq!(stage.apply(mixed).unwrap(), expected, "seed {}", seed);
        assert_eq!(stage.apply(shuffled).unwrap(), expected, "seed {}", seed);
    }
}

#[test]
fn test_bucket_auto_covers_every_record() {
    for seed in 0..ROUNDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = random_records(&mut rng);
        let buckets = rng.gen_range(1..8);
        let stage = Stage::from(
            BucketAutoStage::new("Models", buckets)
                .with_granularity(Granularity::OneTwoFive)
                .accumulate("n", Accumulator::Count),
        );

        let output = stage.apply(input.clone()).unwrap();
        assert!(output.len() <= buckets, "seed {}", seed);

        let ranges: Vec<(f64, f64)> = output
            .iter()
            .map(|b| {
                let min = b.lookup("_id.min").and_then(|v| v.as_f64()).unwrap();
                let max = b.lookup("_id.max").and_then(|v| v.as_f64()).unwrap();
                (min, max)
            })
            .collect();
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "seed {}: buckets not contiguous", seed);
        }

        let total: u64 = output
            .iter()
            .filter_map(|b| b.get("n").and_then(|v| v.as_u64()))
            .sum();
        assert_eq!(total, input.len() as u64, "seed {}", seed);

        for record in &input {
            let v = record.get("Models").and_then(|v| v.as_f64()).unwrap();
            let holding = ranges.iter().filter(|(min, max)| *min <= v && v < *max).count();
            assert_eq!(holding, 1, "seed {}: {} in {} buckets", seed, v, holding);
        }
    }
}

#[test]
fn test_project_keeps_cardinality() {
    let stage = Stage::from(
        ProjectStage::new()
            .exclude("_id")
            .rename("Manufacturer", "Make")
            .include("Missing"),
    );

    for seed in 0..ROUNDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = random_records(&mut rng);
        let output = stage.apply(input.clone()).unwrap();

        assert_eq!(output.len(), input.len(), "seed {}", seed);
        for (before, after) in input.iter().zip(&output) {
            assert_eq!(before.get("Make"), after.get("Manufacturer"));
            assert!(!after.contains("Missing"));
            assert_eq!(after.len(), 1);
        }
    }
}
