#![deny(missing_docs)]
#![doc = "Stochastic tillering topology, leaf numbers, population skeletons and axis death scheduling."]

pub mod cardinality;
pub mod cohort;
pub mod death;
pub mod emergence;
pub mod leaves;
pub mod probabilities;
pub mod skeleton;
pub mod tillering;

pub use cardinality::{
    check_final_density, create_cardinality_table, theoretical_cardinalities, CardinalityRow,
};
pub use cohort::{decide_child_cohorts, PlantTopology, SampledAxis};
pub use death::{decide_time_of_death, SurvivalCurve};
pub use emergence::sample_emergence_offsets;
pub use leaves::{
    expected_tiller_leaves, sample_main_stem_leaves, sample_plant_leaves, unbiased_round,
};
pub use probabilities::{CohortProbabilities, LeafCountDistribution};
pub use skeleton::{build_axis_skeleton, AxisSkeleton, AxisSkeletonRow, PopulationIndex};
pub use tillering::{create_tillering_table, TilleringRow};
