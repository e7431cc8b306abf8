//! Expected axis counts per cohort and the final density check.

use std::collections::BTreeMap;

use log::info;
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::params::MAIN_STEM_COHORT;
use serde::Serialize;

use crate::probabilities::CohortProbabilities;

/// Expected number of axes per cohort over `plant_number` plants.
///
/// Every documented cohort is reachable from the main stem and drawn once per
/// plant, so a plant bears `p_c` axes of cohort `c` on average.
pub fn theoretical_cardinalities(
    probabilities: &CohortProbabilities,
    plant_number: u32,
) -> BTreeMap<u32, f64> {
    let plants = f64::from(plant_number);
    std::iter::once((MAIN_STEM_COHORT, plants))
        .chain(
            probabilities
                .iter()
                .map(|(cohort, probability)| (cohort, probability * plants)),
        )
        .collect()
}

/// Fails when the requested final density cannot be reached by the
/// expected population.
pub fn check_final_density(
    theoretical: &BTreeMap<u32, f64>,
    final_axes_density: u32,
) -> Result<(), PlantgenError> {
    let total: f64 = theoretical.values().sum();
    let reachable = total.floor();
    if f64::from(final_axes_density) > reachable {
        return Err(PlantgenError::Cardinality(
            ErrorInfo::new(
                "density-exceeds-theoretical",
                "final axes density is greater than the theoretical number of axes",
            )
            .with_context("final_axes_density", final_axes_density)
            .with_context("theoretical_total", reachable)
            .with_hint("lower final_axes_density or raise plant_number"),
        ));
    }
    info!(
        "event=density_check module=cardinality status=ok final_axes_density={} theoretical_total={}",
        final_axes_density, reachable
    );
    Ok(())
}

/// One line of the cardinality debug table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardinalityRow {
    /// Cohort number.
    pub id_cohort: u32,
    /// Expected number of axes of the cohort.
    pub theoretical_cardinality: f64,
    /// Number of axes actually generated.
    pub simulated_cardinality: usize,
}

/// Compares expected and generated axes per cohort.
///
/// Cohorts appear when they are either expected or generated.
pub fn create_cardinality_table(
    theoretical: &BTreeMap<u32, f64>,
    simulated: &BTreeMap<u32, usize>,
) -> Vec<CardinalityRow> {
    let mut cohorts: Vec<u32> = theoretical.keys().chain(simulated.keys()).copied().collect();
    cohorts.sort_unstable();
    cohorts.dedup();
    cohorts
        .into_iter()
        .map(|id_cohort| CardinalityRow {
            id_cohort,
            theoretical_cardinality: theoretical.get(&id_cohort).copied().unwrap_or(0.0),
            simulated_cardinality: simulated.get(&id_cohort).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_stem_only_population() {
        let theoretical = theoretical_cardinalities(&CohortProbabilities::default(), 40);
        assert_eq!(theoretical.len(), 1);
        assert_eq!(theoretical[&1], 40.0);
    }

    #[test]
    fn each_cohort_counts_once_per_plant() {
        let probs = CohortProbabilities::from_cohorts([(3, 1.0), (4, 0.5), (5, 1.0)]).unwrap();
        let theoretical = theoretical_cardinalities(&probs, 10);
        assert_eq!(theoretical[&1], 10.0);
        assert_eq!(theoretical[&3], 10.0);
        assert_eq!(theoretical[&4], 5.0);
        assert_eq!(theoretical[&5], 10.0);
    }

    #[test]
    fn table_lists_union_of_cohorts() {
        let theoretical = BTreeMap::from([(1, 2.0), (3, 1.5)]);
        let simulated = BTreeMap::from([(1, 2), (6, 1)]);
        let rows = create_cardinality_table(&theoretical, &simulated);
        let cohorts: Vec<u32> = rows.iter().map(|row| row.id_cohort).collect();
        assert_eq!(cohorts, vec![1, 3, 6]);
        assert_eq!(rows[1].simulated_cardinality, 0);
        assert_eq!(rows[2].theoretical_cardinality, 0.0);
    }
}
