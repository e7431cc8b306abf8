//! Validated emergence probability and leaf count distribution tables.

use std::collections::{BTreeMap, BTreeSet};

use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::AxisLabel;
use plantgen_core::params::{FIRST_CHILD_DELAY, MAIN_STEM_COHORT};

fn probability_error(code: &str, message: impl Into<String>) -> PlantgenError {
    PlantgenError::Input(ErrorInfo::new(code, message))
}

fn check_probability(key: &str, probability: f64) -> Result<(), PlantgenError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(PlantgenError::Input(
            ErrorInfo::new("invalid-probability", "probability must lie in [0, 1]")
                .with_context("key", key)
                .with_context("probability", probability),
        ));
    }
    Ok(())
}

/// Emergence probability of each tiller cohort, ordered by cohort number.
///
/// The main stem is implicit and never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortProbabilities {
    by_cohort: BTreeMap<u32, f64>,
}

impl CohortProbabilities {
    /// Builds the table from primary tiller labels (`T0`, `T1`, ...).
    pub fn from_axis_probabilities<'a, I>(entries: I) -> Result<Self, PlantgenError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut by_cohort = BTreeMap::new();
        for (raw, probability) in entries {
            let label: AxisLabel = raw.parse()?;
            if label.is_main_stem() {
                return Err(probability_error(
                    "main-stem-probability",
                    "the main stem is always present and cannot carry an emergence probability",
                ));
            }
            if label.order() != 1 {
                return Err(PlantgenError::Input(
                    ErrorInfo::new(
                        "not-a-primary-tiller",
                        "emergence probabilities are documented for primary tillers only",
                    )
                    .with_context("id_axis", &label),
                ));
            }
            check_probability(raw, probability)?;
            by_cohort.insert(label.cohort(), probability);
        }
        Ok(Self { by_cohort })
    }

    /// Builds the table directly from cohort numbers.
    pub fn from_cohorts(
        entries: impl IntoIterator<Item = (u32, f64)>,
    ) -> Result<Self, PlantgenError> {
        let mut by_cohort = BTreeMap::new();
        for (cohort, probability) in entries {
            if cohort < MAIN_STEM_COHORT + FIRST_CHILD_DELAY {
                return Err(PlantgenError::Input(
                    ErrorInfo::new("invalid-cohort", "tiller cohorts start after the first child delay")
                        .with_context("cohort", cohort),
                ));
            }
            check_probability(&cohort.to_string(), probability)?;
            by_cohort.insert(cohort, probability);
        }
        Ok(Self { by_cohort })
    }

    /// Iterates `(cohort, probability)` pairs in ascending cohort order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.by_cohort.iter().map(|(cohort, p)| (*cohort, *p))
    }

    /// Probability attached to `cohort`, if documented.
    pub fn get(&self, cohort: u32) -> Option<f64> {
        self.by_cohort.get(&cohort).copied()
    }

    /// Number of documented tiller cohorts.
    pub fn len(&self) -> usize {
        self.by_cohort.len()
    }

    /// Whether no tiller cohort is documented.
    pub fn is_empty(&self) -> bool {
        self.by_cohort.is_empty()
    }

    /// Primary tiller labels that may emerge, i.e. with a non-zero probability.
    pub fn possible_primary_axes(&self) -> BTreeSet<AxisLabel> {
        self.by_cohort
            .iter()
            .filter(|(_, p)| **p != 0.0)
            .map(|(cohort, _)| {
                AxisLabel::primary_tiller(cohort - MAIN_STEM_COHORT - FIRST_CHILD_DELAY)
            })
            .collect()
    }
}

/// Probability distribution of the main stem final leaf count.
///
/// Values are expected to sum to 1 but are not renormalized.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafCountDistribution {
    by_count: BTreeMap<u32, f64>,
}

impl LeafCountDistribution {
    /// Builds the distribution from `(leaf count, probability)` pairs.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (u32, f64)>,
    ) -> Result<Self, PlantgenError> {
        let mut by_count = BTreeMap::new();
        for (count, probability) in entries {
            if count == 0 {
                return Err(probability_error(
                    "invalid-leaf-count",
                    "main stem leaf counts must be at least 1",
                ));
            }
            check_probability(&count.to_string(), probability)?;
            by_count.insert(count, probability);
        }
        if by_count.is_empty() {
            return Err(probability_error(
                "empty-leaf-distribution",
                "the main stem leaf count distribution is empty",
            ));
        }
        Ok(Self { by_count })
    }

    /// Iterates `(leaf count, probability)` pairs in ascending leaf count order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.by_count.iter().map(|(count, p)| (*count, *p))
    }

    /// Largest documented leaf count.
    pub fn largest(&self) -> u32 {
        self.by_count.keys().next_back().copied().unwrap_or(1)
    }

    /// Leaf counts that may be drawn, i.e. with a non-zero probability.
    pub fn possible_counts(&self) -> BTreeSet<u32> {
        self.by_count
            .iter()
            .filter(|(_, p)| **p != 0.0)
            .map(|(count, _)| *count)
            .collect()
    }
}
