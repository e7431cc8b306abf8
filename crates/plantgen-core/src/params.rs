//! Empirical constants of the tillering and leaf development model.

/// Minimum cohort spacing between a parent axis and its first possible child.
pub const FIRST_CHILD_DELAY: u32 = 2;

/// Cohort number of the main stem.
pub const MAIN_STEM_COHORT: u32 = 1;

/// Regression coefficients of the tiller final leaf number:
/// `N_tiller = a_1 * N_MS - a_2 * cohort`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TillerLeafCoefficients {
    /// Slope on the main stem leaf number.
    pub a_1: f64,
    /// Slope on the tiller cohort number.
    pub a_2: f64,
}

/// Coefficients fitted on winter wheat populations.
pub const SECONDARY_STEM_LEAVES_NUMBER_COEFFICIENTS: TillerLeafCoefficients =
    TillerLeafCoefficients {
        a_1: 0.9423,
        a_2: 0.555,
    };

/// Default standard deviation of the per-plant emergence offset.
pub const EMF_1_MS_STANDARD_DEVIATION: f64 = 30.0;

/// Phyllochrons between tip emergence and ligulation of the first leaf.
pub const DELAIS_PHYLL_COL_TIP_1ST: f64 = 1.0;

/// Phyllochrons between tip emergence and ligulation of upper leaves.
pub const DELAIS_PHYLL_COL_TIP_NTH: f64 = 1.6;

/// Phyllochrons between the end of senescence and disappearance of a leaf.
pub const DELAIS_PHYLL_SEN_DISP: f64 = 3.0;
