//! Final leaf number sampling for main stems and tillers.

use plantgen_core::params::TillerLeafCoefficients;
use plantgen_core::rng::RngHandle;

use crate::cohort::SampledAxis;
use crate::probabilities::LeafCountDistribution;

/// Draws the main stem final leaf count by inverse-CDF sampling.
///
/// Keys are walked in ascending order; the first one whose cumulative mass
/// reaches the draw is returned. When the masses sum to less than the draw the
/// largest documented count is returned.
pub fn sample_main_stem_leaves(distribution: &LeafCountDistribution, rng: &mut RngHandle) -> u32 {
    let draw = rng.unit();
    let mut cumulative = 0.0;
    for (count, probability) in distribution.iter() {
        cumulative += probability;
        if cumulative >= draw {
            return count;
        }
    }
    distribution.largest()
}

/// Expected (real valued) final leaf count of a tiller.
pub fn expected_tiller_leaves(
    main_stem_leaves: u32,
    cohort: u32,
    coefficients: TillerLeafCoefficients,
) -> f64 {
    coefficients.a_1 * f64::from(main_stem_leaves) - coefficients.a_2 * f64::from(cohort)
}

/// Rounds `value` up with probability equal to its fractional part.
///
/// The expected result equals `value`. Negative inputs round to 0.
pub fn unbiased_round(value: f64, rng: &mut RngHandle) -> u32 {
    let value = value.max(0.0);
    let integer = value.trunc();
    let fractional = value - integer;
    let rounded = if rng.unit() <= fractional {
        value.ceil()
    } else {
        integer
    };
    rounded as u32
}

/// Final leaf counts of the axes of one plant, in the order of `axes`.
///
/// `axes` must start with the main stem, whose count is the reference of every
/// tiller that follows it. Tillers own at least one phytomer.
pub fn sample_plant_leaves(
    axes: &[SampledAxis],
    distribution: &LeafCountDistribution,
    coefficients: TillerLeafCoefficients,
    rng: &mut RngHandle,
) -> Vec<u32> {
    let mut main_stem_leaves = 0;
    axes.iter()
        .map(|axis| {
            if axis.label.is_main_stem() {
                let sampled = f64::from(sample_main_stem_leaves(distribution, rng));
                main_stem_leaves = unbiased_round(sampled, rng);
                main_stem_leaves
            } else {
                let expected = expected_tiller_leaves(main_stem_leaves, axis.cohort, coefficients);
                unbiased_round(expected, rng).max(1)
            }
        })
        .collect()
}
