//! Completion of the reconciled leaf dynamics into the final dynamics table.

use std::collections::BTreeMap;

use log::debug;
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::{AxisLabel, GroupKey};
use serde::Serialize;

use crate::dimensions::elongated_internode_number;
use crate::input::OrganDimensions;
use crate::reconcile::ReconciledDynamics;

/// Fully documented leaf dynamics of one axis group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicsRow {
    /// Axis label of the group.
    pub id_axis: AxisLabel,
    /// Final leaf count of the group.
    #[serde(rename = "N_phytomer")]
    pub n_phytomer: u32,
    /// Number of generated axes in the group.
    pub cardinality: usize,
    /// Haun stage rate before the break.
    pub a_cohort: f64,
    /// Thermal time at which the Haun stage is 0.
    #[serde(rename = "TT_col_0")]
    pub tt_col_0: f64,
    /// Thermal time at which the Haun stage rate changes.
    #[serde(rename = "TT_col_break")]
    pub tt_col_break: f64,
    /// Thermal time of the flag leaf ligulation.
    #[serde(rename = "TT_col_N_phytomer")]
    pub tt_col_n_phytomer: f64,
    /// Green leaves number when senescence starts.
    pub n0: f64,
    /// Green leaves number at flag leaf ligulation.
    pub n1: f64,
    /// Green leaves number at the end of the green leaf plateau.
    pub n2: f64,
    /// Delay between the flag leaf ligulation of the group and of the main stem.
    #[serde(rename = "dTT_MS_cohort")]
    pub dtt_ms_cohort: f64,
    /// Number of phytomers of the group whose internode elongates.
    pub elongated_internode_number: u32,
}

impl DynamicsRow {
    /// Group the row describes.
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.id_axis.clone(), self.n_phytomer)
    }
}

fn dynamics_info(code: &str, message: &str, key: &GroupKey) -> ErrorInfo {
    ErrorInfo::new(code, message).with_context("id_axis", key)
}

fn dynamics_error(code: &str, message: &str, key: &GroupKey) -> PlantgenError {
    PlantgenError::Dynamics(dynamics_info(code, message, key))
}

struct Reference {
    a_cohort: f64,
    tt_col_n_phytomer: f64,
    n0: f64,
    n1: f64,
    n2: f64,
}

fn reference_parameters(
    rows: &[ReconciledDynamics],
    key: &GroupKey,
) -> Result<Reference, PlantgenError> {
    let row = rows.iter().find(|row| &row.key == key).ok_or_else(|| {
        dynamics_error(
            "missing-main-stem-reference",
            "the most frequent main stem group has no dynamics",
            key,
        )
    })?;
    let p = &row.params;
    match (p.a_cohort, p.tt_col_n_phytomer, p.n0, p.n1, p.n2) {
        (Some(a_cohort), Some(tt_col_n_phytomer), Some(n0), Some(n1), Some(n2)) => Ok(Reference {
            a_cohort,
            tt_col_n_phytomer,
            n0,
            n1,
            n2,
        }),
        _ => Err(dynamics_error(
            "incomplete-main-stem",
            "the most frequent main stem group must document a_cohort, TT_col_N_phytomer, n0, n1 and n2",
            key,
        )),
    }
}

/// Fills every unset parameter and derives `dTT_MS_cohort`.
///
/// `main_stem_reference` is the most frequent main stem group; its
/// parameters stand in for the ones a group leaves unset.
/// `elongated_internode_number` is left at 0 until the dimensions are
/// known, see [`count_elongated_internodes`].
pub fn finalize_dynamics(
    rows: &[ReconciledDynamics],
    main_stem_reference: &GroupKey,
    tt_col_break: f64,
) -> Result<Vec<DynamicsRow>, PlantgenError> {
    let reference = reference_parameters(rows, main_stem_reference)?;
    let mut finalized = Vec::with_capacity(rows.len());
    for row in rows {
        let key = &row.key;
        let p = &row.params;
        let a_cohort = p.a_cohort.unwrap_or(reference.a_cohort);
        if !(a_cohort > 0.0 && a_cohort.is_finite()) {
            return Err(PlantgenError::Dynamics(
                dynamics_info("invalid-dynamics", "a_cohort must be strictly positive", key)
                    .with_context("a_cohort", a_cohort),
            ));
        }
        let n = f64::from(key.n_phytomer);
        let mut tt_col_n_phytomer = p.tt_col_n_phytomer.ok_or_else(|| {
            dynamics_error(
                "unset-parameter",
                "TT_col_N_phytomer is not documented for this axis",
                key,
            )
        })?;
        if let Some(reference_n) = row.shifted_from {
            tt_col_n_phytomer += (n - f64::from(reference_n)) / a_cohort;
        }
        let tt_col_0 = p.tt_col_0.unwrap_or(tt_col_n_phytomer - n / a_cohort);
        if tt_col_n_phytomer <= tt_col_0 {
            return Err(PlantgenError::Dynamics(
                dynamics_info(
                    "invalid-dynamics",
                    "TT_col_N_phytomer must be later than TT_col_0",
                    key,
                )
                .with_context("TT_col_0", tt_col_0)
                .with_context("TT_col_N_phytomer", tt_col_n_phytomer),
            ));
        }
        finalized.push(DynamicsRow {
            id_axis: key.label.clone(),
            n_phytomer: key.n_phytomer,
            cardinality: row.cardinality,
            a_cohort,
            tt_col_0,
            tt_col_break,
            tt_col_n_phytomer,
            n0: p.n0.unwrap_or(reference.n0),
            n1: p.n1.unwrap_or(reference.n1),
            n2: p.n2.unwrap_or(reference.n2),
            dtt_ms_cohort: tt_col_n_phytomer - reference.tt_col_n_phytomer,
            elongated_internode_number: 0,
        });
    }
    debug!(
        "event=finalize module=dynamics status=ok groups={} reference={}",
        finalized.len(),
        main_stem_reference
    );
    Ok(finalized)
}

/// Sets `elongated_internode_number` of every row from the organ dimensions
/// of its group.
pub fn count_elongated_internodes(
    rows: &mut [DynamicsRow],
    dimensions: &BTreeMap<GroupKey, Vec<OrganDimensions>>,
) {
    for row in rows.iter_mut() {
        row.elongated_internode_number = dimensions
            .get(&row.group_key())
            .map_or(0, |phytomers| elongated_internode_number(phytomers));
    }
}
