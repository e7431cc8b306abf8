//! Leaf development schedules derived from the finalized dynamics.
//!
//! Haun stage (HS) and green leaf number (GL) are piecewise linear in
//! thermal time. The senescent leaf index is `SSI = HS - GL`.

use std::collections::BTreeMap;

use log::debug;
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::GroupKey;
use plantgen_core::params::{
    DELAIS_PHYLL_COL_TIP_1ST, DELAIS_PHYLL_COL_TIP_NTH, DELAIS_PHYLL_SEN_DISP,
};
use serde::Serialize;

use crate::dynamics::DynamicsRow;

/// Piecewise linear function of thermal time, constant outside its points.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    points: Vec<(f64, f64)>,
}

impl PiecewiseLinear {
    /// Builds the function from points sorted by time.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Breakpoints of the function.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Value at thermal time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for pair in self.points.windows(2) {
            let ((ta, va), (tb, vb)) = (pair[0], pair[1]);
            if t <= tb {
                if tb == ta {
                    return vb;
                }
                return va + (vb - va) * (t - ta) / (tb - ta);
            }
        }
        last.1
    }

    /// First thermal time at which the function reaches `level` from below.
    pub fn first_time_reaching(&self, level: f64) -> Option<f64> {
        let first = self.points.first()?;
        if first.1 >= level {
            return Some(first.0);
        }
        self.points.windows(2).find_map(|pair| {
            let ((ta, va), (tb, vb)) = (pair[0], pair[1]);
            (va < level && vb >= level).then(|| ta + (level - va) * (tb - ta) / (vb - va))
        })
    }
}

/// Haun stage, green leaves and senescence of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafDevelopment {
    /// Haun stage.
    pub hs: PiecewiseLinear,
    /// Green leaf number.
    pub gl: PiecewiseLinear,
    /// Senescent leaf index.
    pub ssi: PiecewiseLinear,
}

fn haun_stage(row: &DynamicsRow) -> PiecewiseLinear {
    let n = f64::from(row.n_phytomer);
    let mut points = vec![(row.tt_col_0, 0.0)];
    if row.tt_col_0 < row.tt_col_break && row.tt_col_break < row.tt_col_n_phytomer {
        let hs_break = row.a_cohort * (row.tt_col_break - row.tt_col_0);
        if hs_break < n {
            points.push((row.tt_col_break, hs_break));
        }
    }
    points.push((row.tt_col_n_phytomer, n));
    PiecewiseLinear::new(points)
}

fn green_leaves(
    row: &DynamicsRow,
    hs: &PiecewiseLinear,
    gl_number: &[(f64, f64)],
) -> PiecewiseLinear {
    let n = f64::from(row.n_phytomer);
    let plateau = row.n0.clamp(0.0, n);
    let senescence_start = hs.first_time_reaching(plateau).unwrap_or(row.tt_col_n_phytomer);

    let mut points: Vec<(f64, f64)> = hs
        .points()
        .iter()
        .copied()
        .filter(|(t, _)| *t < senescence_start)
        .collect();
    points.push((senescence_start, plateau));
    if row.tt_col_n_phytomer > senescence_start {
        points.push((row.tt_col_n_phytomer, row.n1));
    } else if let Some(last) = points.last_mut() {
        last.1 = row.n1;
    }

    for &(t, gl) in gl_number {
        let shifted = t + row.dtt_ms_cohort;
        if points.last().map_or(true, |last| shifted > last.0) {
            points.push((shifted, gl));
        }
    }
    if let Some(&(t, gl)) = points.last() {
        if gl > 0.0 {
            points.push((t + gl / row.a_cohort, 0.0));
        }
    }
    PiecewiseLinear::new(points)
}

fn senescent_leaf_index(hs: &PiecewiseLinear, gl: &PiecewiseLinear) -> PiecewiseLinear {
    let mut times: Vec<f64> = hs
        .points()
        .iter()
        .chain(gl.points())
        .map(|(t, _)| *t)
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup();
    PiecewiseLinear::new(
        times
            .into_iter()
            .map(|t| (t, hs.value_at(t) - gl.value_at(t)))
            .collect(),
    )
}

/// Builds the leaf development model of a group.
///
/// `gl_number` holds the observed main stem green leaf numbers, sorted by
/// thermal time; it is shifted by the group's `dTT_MS_cohort`.
pub fn leaf_development(row: &DynamicsRow, gl_number: &[(f64, f64)]) -> LeafDevelopment {
    let hs = haun_stage(row);
    let gl = green_leaves(row, &hs, gl_number);
    let ssi = senescent_leaf_index(&hs, &gl);
    LeafDevelopment { hs, gl, ssi }
}

/// Absolute development stamps of one phytomer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhenologyAbsRow {
    /// Phenology group.
    pub id_phen: GroupKey,
    /// Phytomer index, 1 being the lowest leaf.
    pub index_phytomer: u32,
    /// Tip emergence.
    #[serde(rename = "TT_em_phytomer")]
    pub tt_em_phytomer: f64,
    /// Ligulation.
    #[serde(rename = "TT_col_phytomer")]
    pub tt_col_phytomer: f64,
    /// End of senescence.
    #[serde(rename = "TT_sen_phytomer")]
    pub tt_sen_phytomer: f64,
    /// Disappearance.
    #[serde(rename = "TT_del_phytomer")]
    pub tt_del_phytomer: f64,
}

/// Development stamps relative to the first phytomer of the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhenologyRow {
    /// Phenology group.
    pub id_phen: GroupKey,
    /// Phytomer index, 1 being the lowest leaf.
    pub index_phytomer: u32,
    /// Tip emergence.
    #[serde(rename = "dTT_em_phytomer")]
    pub dtt_em_phytomer: f64,
    /// Ligulation.
    #[serde(rename = "dTT_col_phytomer")]
    pub dtt_col_phytomer: f64,
    /// End of senescence.
    #[serde(rename = "dTT_sen_phytomer")]
    pub dtt_sen_phytomer: f64,
    /// Disappearance.
    #[serde(rename = "dTT_del_phytomer")]
    pub dtt_del_phytomer: f64,
}

/// Haun stage, green leaves and senescence at one breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HsGlSsiRow {
    /// Phenology group.
    pub id_phen: GroupKey,
    /// Thermal time.
    #[serde(rename = "TT")]
    pub tt: f64,
    /// Haun stage.
    #[serde(rename = "HS")]
    pub hs: f64,
    /// Green leaf number.
    #[serde(rename = "GL")]
    pub gl: f64,
    /// Senescent leaf index.
    #[serde(rename = "SSI")]
    pub ssi: f64,
}

/// Every phenology table of a population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhenologyTables {
    /// `phenT_abs`.
    pub absolute: Vec<PhenologyAbsRow>,
    /// `phenT_first`.
    pub first: Vec<PhenologyAbsRow>,
    /// `phenT`.
    pub relative: Vec<PhenologyRow>,
    /// `HS_GL_SSI_T`.
    pub hs_gl_ssi: Vec<HsGlSsiRow>,
}

impl PhenologyTables {
    /// First phytomer stamps indexed by phenology group.
    pub fn first_by_group(&self) -> BTreeMap<&GroupKey, &PhenologyAbsRow> {
        self.first.iter().map(|row| (&row.id_phen, row)).collect()
    }
}

fn unreached(key: &GroupKey, what: &str, index: u32) -> PlantgenError {
    PlantgenError::Dynamics(
        ErrorInfo::new("unreached-stage", format!("{what} is never reached"))
            .with_context("id_phen", key)
            .with_context("index_phytomer", index),
    )
}

fn phytomer_stamps(
    key: &GroupKey,
    row: &DynamicsRow,
    model: &LeafDevelopment,
) -> Result<Vec<PhenologyAbsRow>, PlantgenError> {
    let phyllochron = 1.0 / row.a_cohort;
    (1..=row.n_phytomer)
        .map(|index| {
            let level = f64::from(index);
            let tt_col = model
                .hs
                .first_time_reaching(level)
                .ok_or_else(|| unreached(key, "ligulation", index))?;
            let tip_delay = if index == 1 {
                DELAIS_PHYLL_COL_TIP_1ST
            } else {
                DELAIS_PHYLL_COL_TIP_NTH
            };
            let tt_sen = model
                .ssi
                .first_time_reaching(level)
                .ok_or_else(|| unreached(key, "senescence", index))?;
            Ok(PhenologyAbsRow {
                id_phen: key.clone(),
                index_phytomer: index,
                tt_em_phytomer: tt_col - tip_delay * phyllochron,
                tt_col_phytomer: tt_col,
                tt_sen_phytomer: tt_sen,
                tt_del_phytomer: tt_sen + DELAIS_PHYLL_SEN_DISP * phyllochron,
            })
        })
        .collect()
}

/// Derives `phenT_abs`, `phenT_first`, `phenT` and `HS_GL_SSI_T`.
pub fn derive_phenology(
    dynamics: &[DynamicsRow],
    gl_number: &[(f64, f64)],
) -> Result<PhenologyTables, PlantgenError> {
    let mut tables = PhenologyTables::default();
    for row in dynamics {
        let key = row.group_key();
        let model = leaf_development(row, gl_number);
        let stamps = phytomer_stamps(&key, row, &model)?;

        if let Some(first) = stamps.first() {
            tables.first.push(first.clone());
            tables
                .relative
                .extend(stamps.iter().map(|stamp| PhenologyRow {
                    id_phen: key.clone(),
                    index_phytomer: stamp.index_phytomer,
                    dtt_em_phytomer: stamp.tt_em_phytomer - first.tt_em_phytomer,
                    dtt_col_phytomer: stamp.tt_col_phytomer - first.tt_col_phytomer,
                    dtt_sen_phytomer: stamp.tt_sen_phytomer - first.tt_sen_phytomer,
                    dtt_del_phytomer: stamp.tt_del_phytomer - first.tt_del_phytomer,
                }));
        }
        tables.hs_gl_ssi.extend(model.ssi.points().iter().map(|&(tt, ssi)| HsGlSsiRow {
            id_phen: key.clone(),
            tt,
            hs: model.hs.value_at(tt),
            gl: model.gl.value_at(tt),
            ssi,
        }));
        tables.absolute.extend(stamps);
    }
    debug!(
        "event=phenology module=phenology status=ok groups={} phytomers={}",
        tables.first.len(),
        tables.absolute.len()
    );
    Ok(tables)
}
