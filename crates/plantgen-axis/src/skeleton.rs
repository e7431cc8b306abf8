//! Per axis population skeleton and its group index.

use std::collections::BTreeMap;

use log::debug;
use plantgen_core::labels::{AxisLabel, GroupKey};
use plantgen_core::params::SECONDARY_STEM_LEAVES_NUMBER_COEFFICIENTS;
use plantgen_core::rng::RngHandle;

use crate::cohort::{decide_child_cohorts, SampledAxis};
use crate::leaves::sample_plant_leaves;
use crate::probabilities::{CohortProbabilities, LeafCountDistribution};

/// One generated axis before phenology and death scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSkeletonRow {
    /// Plant identifier, starting at 1.
    pub id_plt: u32,
    /// Cohort number of the axis.
    pub id_cohort: u32,
    /// Axis label.
    pub id_axis: AxisLabel,
    /// Final leaf count.
    pub n_phytomer: u32,
}

impl AxisSkeletonRow {
    /// Dimension and phenology group of the axis.
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.id_axis.clone(), self.n_phytomer)
    }
}

/// Per-axis skeleton of a whole population, ordered by plant then axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSkeleton {
    rows: Vec<AxisSkeletonRow>,
}

impl AxisSkeleton {
    /// Assembles a skeleton from already built rows.
    pub fn from_rows(rows: Vec<AxisSkeletonRow>) -> Self {
        Self { rows }
    }

    /// Rows of the skeleton.
    pub fn rows(&self) -> &[AxisSkeletonRow] {
        &self.rows
    }

    /// Number of axes in the population.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of generated axes per cohort.
    pub fn simulated_cohort_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.id_cohort).or_insert(0) += 1;
        }
        counts
    }

    /// Group cardinalities and most frequent leaf counts of the population.
    pub fn population_index(&self) -> PopulationIndex {
        let mut groups = BTreeMap::new();
        for row in &self.rows {
            *groups.entry(row.group_key()).or_insert(0) += 1;
        }
        PopulationIndex::from_groups(groups)
    }
}

/// Summary of the generated population used to drive reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulationIndex {
    groups: BTreeMap<GroupKey, usize>,
    most_frequent: BTreeMap<AxisLabel, u32>,
}

impl PopulationIndex {
    /// Builds the index from group cardinalities.
    ///
    /// The most frequent leaf count of a label breaks ties towards the
    /// smallest leaf count.
    pub fn from_groups(groups: BTreeMap<GroupKey, usize>) -> Self {
        let mut most_frequent: BTreeMap<AxisLabel, (u32, usize)> = BTreeMap::new();
        for (key, cardinality) in &groups {
            let entry = most_frequent
                .entry(key.label.clone())
                .or_insert((key.n_phytomer, *cardinality));
            if *cardinality > entry.1 {
                *entry = (key.n_phytomer, *cardinality);
            }
        }
        Self {
            groups,
            most_frequent: most_frequent
                .into_iter()
                .map(|(label, (n, _))| (label, n))
                .collect(),
        }
    }

    /// Iterates `(group, cardinality)` pairs in key order.
    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, usize)> + '_ {
        self.groups.iter().map(|(key, count)| (key, *count))
    }

    /// Number of axes in `key`, zero when the group was not generated.
    pub fn cardinality(&self, key: &GroupKey) -> usize {
        self.groups.get(key).copied().unwrap_or(0)
    }

    /// Most frequent leaf count generated for `label`.
    pub fn most_frequent_leaf_count(&self, label: &AxisLabel) -> Option<u32> {
        self.most_frequent.get(label).copied()
    }

    /// Whether `key` is the most frequent group of its label.
    pub fn is_most_frequent(&self, key: &GroupKey) -> bool {
        self.most_frequent_leaf_count(&key.label) == Some(key.n_phytomer)
    }

    /// Labels present in the population.
    pub fn labels(&self) -> impl Iterator<Item = &AxisLabel> + '_ {
        self.most_frequent.keys()
    }
}

/// Generates the per-axis skeleton of `plant_number` plants.
///
/// Topology is drawn for every plant first, then leaf counts in row order.
pub fn build_axis_skeleton(
    plant_number: u32,
    probabilities: &CohortProbabilities,
    distribution: &LeafCountDistribution,
    rng: &mut RngHandle,
) -> AxisSkeleton {
    let topologies: Vec<Vec<SampledAxis>> = (0..plant_number)
        .map(|_| decide_child_cohorts(probabilities, rng).into_axes())
        .collect();

    let mut rows = Vec::new();
    for (plant_idx, axes) in topologies.iter().enumerate() {
        let leaves = sample_plant_leaves(
            axes,
            distribution,
            SECONDARY_STEM_LEAVES_NUMBER_COEFFICIENTS,
            rng,
        );
        rows.extend(axes.iter().zip(leaves).map(|(axis, n_phytomer)| AxisSkeletonRow {
            id_plt: plant_idx as u32 + 1,
            id_cohort: axis.cohort,
            id_axis: axis.label.clone(),
            n_phytomer,
        }));
    }
    debug!(
        "event=axis_skeleton module=axis status=ok plants={} axes={}",
        plant_number,
        rows.len()
    );
    AxisSkeleton { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(label: &str, n: u32) -> GroupKey {
        GroupKey::new(label.parse().unwrap(), n)
    }

    #[test]
    fn most_frequent_breaks_ties_towards_fewer_leaves() {
        let mut groups = BTreeMap::new();
        groups.insert(key("MS", 10), 4);
        groups.insert(key("MS", 11), 4);
        groups.insert(key("T1", 8), 1);
        groups.insert(key("T1", 9), 3);
        let index = PopulationIndex::from_groups(groups);
        assert_eq!(index.most_frequent_leaf_count(&"MS".parse().unwrap()), Some(10));
        assert_eq!(index.most_frequent_leaf_count(&"T1".parse().unwrap()), Some(9));
        assert!(index.is_most_frequent(&key("T1", 9)));
        assert_eq!(index.cardinality(&key("T2", 9)), 0);
    }

    #[test]
    fn plants_are_numbered_from_one_with_main_stem_first() {
        let probs =
            CohortProbabilities::from_axis_probabilities([("T0", 0.5), ("T1", 0.9)]).unwrap();
        let dist = LeafCountDistribution::from_entries([(11, 1.0)]).unwrap();
        let mut rng = RngHandle::from_seed(21);
        let skeleton = build_axis_skeleton(12, &probs, &dist, &mut rng);
        let mut previous_plant = 0;
        for row in skeleton.rows() {
            if row.id_plt != previous_plant {
                assert_eq!(row.id_plt, previous_plant + 1);
                assert!(row.id_axis.is_main_stem());
                assert_eq!(row.n_phytomer, 11);
                previous_plant = row.id_plt;
            }
        }
        assert_eq!(previous_plant, 12);
    }
}
