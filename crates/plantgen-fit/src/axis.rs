//! Final per-axis table with emergence dates and regression schedule.

use log::info;
use plantgen_axis::death::decide_time_of_death;
use plantgen_axis::skeleton::AxisSkeleton;
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::{AxisLabel, GroupKey};
use serde::Serialize;

use crate::phenology::PhenologyTables;

/// One generated axis as handed to the reconstruction step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRow {
    /// Plant identifier, starting at 1.
    pub id_plt: u32,
    /// Axis label.
    pub id_axis: AxisLabel,
    /// Final leaf count.
    #[serde(rename = "N_phytomer")]
    pub n_phytomer: u32,
    /// Thermal time at which the axis stops growing, empty if it never does.
    #[serde(rename = "TT_stop_axis")]
    pub tt_stop_axis: Option<f64>,
    /// Thermal time at which a stopped axis disappears.
    #[serde(rename = "TT_del_axis")]
    pub tt_del_axis: Option<f64>,
    /// Dimension group.
    pub id_dim: GroupKey,
    /// Phenology group.
    pub id_phen: GroupKey,
    /// 1 when the axis bears an ear, 0 when it regresses.
    pub id_ear: u8,
    /// Tip emergence of the first leaf.
    #[serde(rename = "TT_em_phytomer1")]
    pub tt_em_phytomer1: f64,
    /// Ligulation of the first leaf.
    #[serde(rename = "TT_col_phytomer1")]
    pub tt_col_phytomer1: f64,
    /// End of senescence of the first leaf.
    #[serde(rename = "TT_sen_phytomer1")]
    pub tt_sen_phytomer1: f64,
    /// Disappearance of the first leaf.
    #[serde(rename = "TT_del_phytomer1")]
    pub tt_del_phytomer1: f64,
}

/// Population level dates driving axis regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionSchedule {
    /// Start of stem elongation.
    pub bolting: f64,
    /// Date by which regression is over.
    pub flowering: f64,
    /// Axes still alive at flowering.
    pub final_axes_density: u32,
    /// Delay between an axis stopping and its disappearance.
    pub delais_tt_stop_del_axis: f64,
}

/// Builds `axeT` from the skeleton, per plant emergence offsets and the
/// first phytomer schedule of each phenology group.
///
/// `offsets[p]` shifts every axis of plant `p + 1`.
pub fn create_axis_table(
    skeleton: &AxisSkeleton,
    offsets: &[f64],
    phenology: &PhenologyTables,
    schedule: &RegressionSchedule,
) -> Result<Vec<AxisRow>, PlantgenError> {
    let first = phenology.first_by_group();
    let mut rows = Vec::with_capacity(skeleton.len());
    for axis in skeleton.rows() {
        let key = axis.group_key();
        let offset = (axis.id_plt as usize)
            .checked_sub(1)
            .and_then(|plant| offsets.get(plant))
            .copied()
            .ok_or_else(|| {
                PlantgenError::Input(
                    ErrorInfo::new("missing-emergence-offset", "plant has no emergence offset")
                        .with_context("id_plt", axis.id_plt),
                )
            })?;
        let stamps = first.get(&key).ok_or_else(|| {
            PlantgenError::Reconcile(
                ErrorInfo::new("undocumented-phenology", "group has no phenology")
                    .with_context("id_phen", &key),
            )
        })?;
        rows.push(AxisRow {
            id_plt: axis.id_plt,
            id_axis: axis.id_axis.clone(),
            n_phytomer: axis.n_phytomer,
            tt_stop_axis: None,
            tt_del_axis: None,
            id_dim: key.clone(),
            id_phen: key,
            id_ear: 1,
            tt_em_phytomer1: offset + stamps.tt_em_phytomer,
            tt_col_phytomer1: offset + stamps.tt_col_phytomer,
            tt_sen_phytomer1: offset + stamps.tt_sen_phytomer,
            tt_del_phytomer1: offset + stamps.tt_del_phytomer,
        });
    }

    let emergence: Vec<f64> = rows.iter().map(|row| row.tt_em_phytomer1).collect();
    let stops = decide_time_of_death(
        rows.len(),
        schedule.final_axes_density as usize,
        &emergence,
        schedule.bolting,
        schedule.flowering,
    )?;
    for (row, stop) in rows.iter_mut().zip(stops) {
        row.tt_stop_axis = stop;
        row.tt_del_axis = stop.map(|t| t + schedule.delais_tt_stop_del_axis);
        row.id_ear = u8::from(stop.is_none());
    }
    info!(
        "event=axis_table module=axis status=ok axes={} ears={}",
        rows.len(),
        rows.iter().filter(|row| row.id_ear == 1).count()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantgen_axis::skeleton::AxisSkeletonRow;

    fn stamps(key: &GroupKey, tt_em: f64) -> crate::phenology::PhenologyAbsRow {
        crate::phenology::PhenologyAbsRow {
            id_phen: key.clone(),
            index_phytomer: 1,
            tt_em_phytomer: tt_em,
            tt_col_phytomer: tt_em + 100.0,
            tt_sen_phytomer: tt_em + 500.0,
            tt_del_phytomer: tt_em + 800.0,
        }
    }

    fn skeleton() -> AxisSkeleton {
        let row = |id_plt, id_cohort, label: &str, n_phytomer| AxisSkeletonRow {
            id_plt,
            id_cohort,
            id_axis: label.parse().unwrap(),
            n_phytomer,
        };
        AxisSkeleton::from_rows(vec![
            row(1, 1, "MS", 11),
            row(1, 4, "T1", 8),
            row(2, 1, "MS", 11),
        ])
    }

    fn phenology() -> PhenologyTables {
        let ms = GroupKey::new(AxisLabel::main_stem(), 11);
        let t1 = GroupKey::new(AxisLabel::primary_tiller(1), 8);
        PhenologyTables {
            first: vec![stamps(&ms, 0.0), stamps(&t1, 50.0)],
            ..PhenologyTables::default()
        }
    }

    const SCHEDULE: RegressionSchedule = RegressionSchedule {
        bolting: 100.0,
        flowering: 200.0,
        final_axes_density: 2,
        delais_tt_stop_del_axis: 600.0,
    };

    #[test]
    fn youngest_axis_regresses() {
        let rows = create_axis_table(&skeleton(), &[0.0, 10.0], &phenology(), &SCHEDULE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].tt_em_phytomer1, 10.0);
        assert_eq!(rows[2].tt_col_phytomer1, 110.0);

        let tiller = &rows[1];
        assert_eq!(tiller.id_ear, 0);
        let stop = tiller.tt_stop_axis.unwrap();
        assert!((100.0..=200.0).contains(&stop));
        assert_eq!(tiller.tt_del_axis, Some(stop + 600.0));
        assert!(rows[0].id_ear == 1 && rows[2].id_ear == 1);
        assert_eq!(rows[0].id_dim.to_string(), "MS11");
    }

    #[test]
    fn missing_offset_is_reported() {
        let err = create_axis_table(&skeleton(), &[0.0], &phenology(), &SCHEDULE).unwrap_err();
        assert_eq!(err.info().code, "missing-emergence-offset");
        assert_eq!(err.info().context["id_plt"], "2");
    }
}
