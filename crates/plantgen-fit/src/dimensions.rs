//! Final organ dimension table.

use std::collections::BTreeMap;

use plantgen_core::labels::{AxisLabel, GroupKey};
use serde::Serialize;

use crate::input::OrganDimensions;

/// Organ dimensions of one phytomer of a dimension group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRow {
    /// Dimension group.
    pub id_dim: GroupKey,
    /// Phytomer index, 1 being the lowest leaf.
    pub index_phytomer: u32,
    /// Blade length.
    #[serde(rename = "L_blade")]
    pub l_blade: f64,
    /// Blade width.
    #[serde(rename = "W_blade")]
    pub w_blade: f64,
    /// Sheath length.
    #[serde(rename = "L_sheath")]
    pub l_sheath: f64,
    /// Sheath width.
    #[serde(rename = "W_sheath")]
    pub w_sheath: f64,
    /// Internode length.
    #[serde(rename = "L_internode")]
    pub l_internode: f64,
    /// Internode width.
    #[serde(rename = "W_internode")]
    pub w_internode: f64,
}

/// Flattens the reconciled dimensions into `dimT`, one row per phytomer.
pub fn create_dimension_table(groups: &BTreeMap<GroupKey, Vec<OrganDimensions>>) -> Vec<DimensionRow> {
    groups
        .iter()
        .flat_map(|(key, phytomers)| {
            phytomers.iter().zip(1..).map(move |(dims, index_phytomer)| DimensionRow {
                id_dim: key.clone(),
                index_phytomer,
                l_blade: dims.l_blade,
                w_blade: dims.w_blade,
                l_sheath: dims.l_sheath,
                w_sheath: dims.w_sheath,
                l_internode: dims.l_internode,
                w_internode: dims.w_internode,
            })
        })
        .collect()
}

/// Organ dimensions of one phytomer, keyed by axis label and leaf count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionAbsRow {
    /// Axis label of the group.
    pub id_axis: AxisLabel,
    /// Final leaf count of the group.
    #[serde(rename = "N_phytomer")]
    pub n_phytomer: u32,
    /// Phytomer index, 1 being the lowest leaf.
    pub index_phytomer: u32,
    /// Whether the internode of the phytomer elongates.
    pub is_elongated: bool,
    /// Blade length.
    #[serde(rename = "L_blade")]
    pub l_blade: f64,
    /// Blade width.
    #[serde(rename = "W_blade")]
    pub w_blade: f64,
    /// Sheath length.
    #[serde(rename = "L_sheath")]
    pub l_sheath: f64,
    /// Sheath width.
    #[serde(rename = "W_sheath")]
    pub w_sheath: f64,
    /// Internode length.
    #[serde(rename = "L_internode")]
    pub l_internode: f64,
    /// Internode width.
    #[serde(rename = "W_internode")]
    pub w_internode: f64,
}

/// Builds `dimT_abs`, the reconciled dimensions listed per axis group.
pub fn create_dimension_abs_table(
    groups: &BTreeMap<GroupKey, Vec<OrganDimensions>>,
) -> Vec<DimensionAbsRow> {
    groups
        .iter()
        .flat_map(|(key, phytomers)| {
            phytomers.iter().zip(1..).map(move |(dims, index_phytomer)| DimensionAbsRow {
                id_axis: key.label.clone(),
                n_phytomer: key.n_phytomer,
                index_phytomer,
                is_elongated: dims.l_internode > 0.0,
                l_blade: dims.l_blade,
                w_blade: dims.w_blade,
                l_sheath: dims.l_sheath,
                w_sheath: dims.w_sheath,
                l_internode: dims.l_internode,
                w_internode: dims.w_internode,
            })
        })
        .collect()
}

/// Number of phytomers whose internode has a positive length.
pub fn elongated_internode_number(phytomers: &[OrganDimensions]) -> u32 {
    phytomers.iter().filter(|dims| dims.l_internode > 0.0).count() as u32
}
