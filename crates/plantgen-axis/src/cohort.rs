//! Stochastic tillering topology of a single plant.

use std::collections::BTreeSet;

use plantgen_core::labels::AxisLabel;
use plantgen_core::params::{FIRST_CHILD_DELAY, MAIN_STEM_COHORT};
use plantgen_core::rng::RngHandle;

use crate::probabilities::CohortProbabilities;

/// One axis drawn by the cohort sampler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampledAxis {
    /// Cohort number of the axis (1 for the main stem).
    pub cohort: u32,
    /// Label encoding the parent chain of the axis.
    pub label: AxisLabel,
}

impl SampledAxis {
    fn main_stem() -> Self {
        Self {
            cohort: MAIN_STEM_COHORT,
            label: AxisLabel::main_stem(),
        }
    }
}

/// Axes present on one plant, sorted by `(cohort, label)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantTopology {
    axes: Vec<SampledAxis>,
}

impl PlantTopology {
    /// Axes of the plant, main stem first.
    pub fn axes(&self) -> &[SampledAxis] {
        &self.axes
    }

    /// Consumes the topology and returns its axes.
    pub fn into_axes(self) -> Vec<SampledAxis> {
        self.axes
    }

    /// Sorted set of the cohort numbers present on the plant.
    pub fn cohort_numbers(&self) -> BTreeSet<u32> {
        self.axes.iter().map(|axis| axis.cohort).collect()
    }
}

struct Frame {
    cohort: u32,
    label: AxisLabel,
    next: usize,
}

/// Decides which tiller cohorts emerge on one plant.
///
/// The main stem is always present. An emerged axis of cohort `p` reaches
/// every documented cohort `c >= p + FIRST_CHILD_DELAY`. A cohort is drawn
/// once per plant, the first time an emerged axis reaches it: it emerges when
/// the uniform draw is below its probability, takes its label from that axis
/// and is then expanded in turn. Later parents reaching an already drawn
/// cohort skip it, so every cohort appears at most once. The explicit stack
/// visits axes in depth-first pre-order, so a child is fully expanded before
/// its next sibling is drawn.
pub fn decide_child_cohorts(
    probabilities: &CohortProbabilities,
    rng: &mut RngHandle,
) -> PlantTopology {
    let candidates: Vec<(u32, f64)> = probabilities.iter().collect();
    let first_candidate =
        |parent: u32| candidates.partition_point(|(cohort, _)| *cohort < parent + FIRST_CHILD_DELAY);

    let mut drawn: BTreeSet<u32> = BTreeSet::new();
    let mut axes = vec![SampledAxis::main_stem()];
    let mut stack = vec![Frame {
        cohort: MAIN_STEM_COHORT,
        label: AxisLabel::main_stem(),
        next: first_candidate(MAIN_STEM_COHORT),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&(cohort, probability)) = candidates.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;
        if !drawn.insert(cohort) || rng.unit() >= probability {
            continue;
        }
        let label = frame
            .label
            .child(cohort - frame.cohort - FIRST_CHILD_DELAY);
        axes.push(SampledAxis {
            cohort,
            label: label.clone(),
        });
        stack.push(Frame {
            cohort,
            label,
            next: first_candidate(cohort),
        });
    }

    axes.sort();
    PlantTopology { axes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(entries: &[(&str, f64)]) -> CohortProbabilities {
        CohortProbabilities::from_axis_probabilities(entries.iter().copied()).unwrap()
    }

    #[test]
    fn empty_table_yields_main_stem_only() {
        let mut rng = RngHandle::from_seed(3);
        let topology = decide_child_cohorts(&CohortProbabilities::default(), &mut rng);
        assert_eq!(topology.cohort_numbers().into_iter().collect::<Vec<_>>(), vec![1]);
        assert!(topology.axes()[0].label.is_main_stem());
    }

    #[test]
    fn certain_cohorts_take_the_first_parent_reaching_them() {
        let mut rng = RngHandle::from_seed(3);
        let topology = decide_child_cohorts(&probs(&[("T0", 1.0), ("T1", 1.0), ("T3", 1.0)]), &mut rng);
        let labels: Vec<String> = topology.axes().iter().map(|a| a.label.to_string()).collect();
        // T0 (cohort 3) reaches cohort 6 before T1 (cohort 4) and the main stem do.
        assert_eq!(labels, vec!["MS", "T0", "T1", "T0.1"]);
        assert_eq!(
            topology.cohort_numbers().into_iter().collect::<Vec<_>>(),
            vec![1, 3, 4, 6]
        );
    }

    #[test]
    fn every_cohort_appears_at_most_once() {
        let table = CohortProbabilities::from_cohorts([(3, 1.0), (4, 1.0), (6, 1.0)]).unwrap();
        let mut rng = RngHandle::from_seed(1);
        let topology = decide_child_cohorts(&table, &mut rng);
        let cohorts: Vec<u32> = topology.axes().iter().map(|axis| axis.cohort).collect();
        assert_eq!(cohorts, vec![1, 3, 4, 6]);
        assert_eq!(topology.axes()[3].label.to_string(), "T0.1");
        assert_eq!(topology.axes().len(), topology.cohort_numbers().len());
    }

    #[test]
    fn labels_agree_with_cohorts() {
        let mut rng = RngHandle::from_seed(11);
        let table = probs(&[("T0", 0.6), ("T1", 0.9), ("T2", 0.8), ("T3", 0.7), ("T4", 0.3)]);
        for _ in 0..200 {
            for axis in decide_child_cohorts(&table, &mut rng).axes() {
                assert_eq!(axis.label.cohort(), axis.cohort);
            }
        }
    }
}
