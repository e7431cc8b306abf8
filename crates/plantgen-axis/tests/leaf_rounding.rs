use plantgen_axis::leaves::{sample_plant_leaves, unbiased_round};
use plantgen_axis::{decide_child_cohorts, CohortProbabilities, LeafCountDistribution};
use plantgen_core::params::SECONDARY_STEM_LEAVES_NUMBER_COEFFICIENTS;
use plantgen_core::rng::RngHandle;
use proptest::prelude::*;

#[test]
fn round_up_frequency_matches_fraction() {
    let mut rng = RngHandle::from_seed(2024);
    let draws = 20_000;
    let ups = (0..draws)
        .filter(|_| unbiased_round(4.3, &mut rng) == 5)
        .count();
    let frequency = ups as f64 / draws as f64;
    assert!((frequency - 0.3).abs() < 0.02, "frequency {frequency}");
}

#[test]
fn tillers_keep_at_least_one_leaf() {
    let table = CohortProbabilities::from_cohorts((3..12).map(|c| (c, 1.0))).unwrap();
    let dist = LeafCountDistribution::from_entries([(2, 1.0)]).unwrap();
    let mut rng = RngHandle::from_seed(8);
    let axes = decide_child_cohorts(&table, &mut rng).into_axes();
    let leaves = sample_plant_leaves(&axes, &dist, SECONDARY_STEM_LEAVES_NUMBER_COEFFICIENTS, &mut rng);
    assert_eq!(leaves[0], 2);
    assert!(leaves.iter().all(|n| *n >= 1));
}

proptest! {
    #[test]
    fn rounding_stays_between_floor_and_ceil(value in 0.0f64..40.0, seed in any::<u64>()) {
        let mut rng = RngHandle::from_seed(seed);
        let rounded = f64::from(unbiased_round(value, &mut rng));
        prop_assert!(rounded >= value.floor());
        prop_assert!(rounded <= value.ceil());
    }
}
