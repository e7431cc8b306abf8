//! Mapping of user documented data onto the generated axis groups.
//!
//! Every generated group is resolved through a fixed cascade: its own label,
//! then its primary axis, then (FULL tables) the most frequent leaf count of
//! the resolved label. Anything still undocumented is fatal.

use std::collections::BTreeMap;

use log::info;
use plantgen_axis::skeleton::PopulationIndex;
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::{AxisLabel, GroupKey};
use plantgen_core::DataCompleteness;

use crate::input::{DimensionSeries, DimensionsInput, DynamicsInput, LeafDynamics, OrganDimensions};

/// Dynamics assigned to one generated group, before finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledDynamics {
    /// Group the parameters belong to.
    pub key: GroupKey,
    /// Number of generated axes in the group.
    pub cardinality: usize,
    /// Parameters copied from the user table; unset cells stay `None`.
    pub params: LeafDynamics,
    /// Leaf count of the group the parameters were documented for, when
    /// it differs from this group's.
    pub shifted_from: Option<u32>,
}

/// Names the primary axis the lookup ended on; the generated label is kept
/// under `generated_axis` when it differs.
fn undocumented_axis(table: &str, label: &AxisLabel) -> PlantgenError {
    let primary = label.primary();
    let mut info = ErrorInfo::new(
        "undocumented-axis",
        "axis is not documented, nor its primary axis",
    )
    .with_context("table", table)
    .with_context("id_axis", &primary);
    if &primary != label {
        info = info.with_context("generated_axis", label);
    }
    PlantgenError::Reconcile(info)
}

fn undocumented_group(table: &str, label: &AxisLabel, n_phytomer: u32) -> PlantgenError {
    PlantgenError::Reconcile(
        ErrorInfo::new(
            "undocumented-group",
            "no row documents this axis with this leaf number, nor its most frequent leaf number",
        )
        .with_context("table", table)
        .with_context("id_axis", label)
        .with_context("N_phytomer", n_phytomer),
    )
}

/// Resolves `label` to itself or to its primary axis, whichever is documented.
fn resolve_label(
    label: &AxisLabel,
    documented: impl Fn(&AxisLabel) -> bool,
) -> Option<AxisLabel> {
    if documented(label) {
        return Some(label.clone());
    }
    let primary = label.primary();
    documented(&primary).then_some(primary)
}

/// Looks up `(label, n)` then `(label, most frequent n of label)`.
fn resolve_group<'a, T>(
    table: &str,
    label: &AxisLabel,
    n_phytomer: u32,
    index: &PopulationIndex,
    lookup: impl Fn(&AxisLabel, u32) -> Option<&'a T>,
) -> Result<&'a T, PlantgenError> {
    if let Some(found) = lookup(label, n_phytomer) {
        return Ok(found);
    }
    index
        .most_frequent_leaf_count(label)
        .and_then(|most_frequent| lookup(label, most_frequent))
        .ok_or_else(|| undocumented_group(table, label, n_phytomer))
}

/// Assigns user leaf dynamics to every generated group.
///
/// MIN and SHORT rows feed the most frequent group of their label; the other
/// groups of that label are flagged with `shifted_from` and derived during
/// finalization. MIN tiller rows only contribute `TT_col_N_phytomer`.
pub fn reconcile_dynamics(
    index: &PopulationIndex,
    input: &DynamicsInput,
    table: &str,
) -> Result<Vec<ReconciledDynamics>, PlantgenError> {
    let level = input.level();
    let mut rows = Vec::new();
    for (key, cardinality) in index.groups() {
        let resolved = resolve_label(&key.label, |label| input.documents_label(label))
            .ok_or_else(|| undocumented_axis(table, &key.label))?;
        let (params, shifted_from) = match level {
            DataCompleteness::Full => {
                let params = resolve_group(table, &resolved, key.n_phytomer, index, |label, n| {
                    input.by_group(label, n)
                })?;
                (*params, None)
            }
            DataCompleteness::Min | DataCompleteness::Short => {
                let user = input
                    .by_label(&resolved)
                    .ok_or_else(|| undocumented_axis(table, &key.label))?;
                let params = if level == DataCompleteness::Min && !key.label.is_main_stem() {
                    LeafDynamics {
                        tt_col_n_phytomer: user.tt_col_n_phytomer,
                        ..LeafDynamics::default()
                    }
                } else {
                    *user
                };
                let shifted_from = if index.is_most_frequent(key) {
                    None
                } else {
                    index.most_frequent_leaf_count(&key.label)
                };
                (params, shifted_from)
            }
        };
        rows.push(ReconciledDynamics {
            key: key.clone(),
            cardinality,
            params,
            shifted_from,
        });
    }
    info!(
        "event=reconcile module=dynamics status=ok level={} groups={}",
        level,
        rows.len()
    );
    Ok(rows)
}

fn take_phytomers(
    table: &str,
    label: &AxisLabel,
    n_phytomer: u32,
    series: Option<&DimensionSeries>,
) -> Result<Vec<OrganDimensions>, PlantgenError> {
    (1..=n_phytomer)
        .map(|idx| {
            series.and_then(|series| series.get(&idx)).copied().ok_or_else(|| {
                PlantgenError::Reconcile(
                    ErrorInfo::new("undocumented-index", "phytomer dimensions are not documented")
                        .with_context("table", table)
                        .with_context("id_axis", label)
                        .with_context("index_phytomer", idx),
                )
            })
        })
        .collect()
}

/// Assigns user organ dimensions to every phytomer of every generated group.
pub fn reconcile_dimensions(
    index: &PopulationIndex,
    input: &DimensionsInput,
    table: &str,
) -> Result<BTreeMap<GroupKey, Vec<OrganDimensions>>, PlantgenError> {
    let mut groups = BTreeMap::new();
    for (key, _) in index.groups() {
        let dims = match input.level() {
            DataCompleteness::Min => {
                take_phytomers(table, &key.label, key.n_phytomer, input.shared_series())?
            }
            DataCompleteness::Short => {
                let resolved = resolve_label(&key.label, |label| input.documents_label(label))
                    .ok_or_else(|| undocumented_axis(table, &key.label))?;
                take_phytomers(table, &resolved, key.n_phytomer, input.by_label(&resolved))?
            }
            DataCompleteness::Full => {
                let resolved = resolve_label(&key.label, |label| input.documents_label(label))
                    .ok_or_else(|| undocumented_axis(table, &key.label))?;
                let series = resolve_group(table, &resolved, key.n_phytomer, index, |label, n| {
                    input.by_group(label, n)
                })?;
                take_phytomers(table, &resolved, key.n_phytomer, Some(series))?
            }
        };
        groups.insert(key.clone(), dims);
    }
    info!(
        "event=reconcile module=dimensions status=ok level={} groups={}",
        input.level(),
        groups.len()
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{dimension_columns, dynamics_columns};
    use crate::table::UserTable;

    fn cells(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|c| c.to_string()).collect()
    }

    fn key(label: &str, n: u32) -> GroupKey {
        GroupKey::new(label.parse().unwrap(), n)
    }

    fn index(groups: &[(&str, u32, usize)]) -> PopulationIndex {
        PopulationIndex::from_groups(
            groups
                .iter()
                .map(|(label, n, count)| (key(label, *n), *count))
                .collect(),
        )
    }

    #[test]
    fn short_sub_tiller_falls_back_to_primary() {
        let table = UserTable::new(
            "dynT_user",
            &dynamics_columns(DataCompleteness::Short),
            vec![
                cells(&["MS", "0.01", "100", "1000", "4", "3", "5"]),
                cells(&["T1", "0.012", "", "1040", "", "", ""]),
            ],
        );
        let input = DynamicsInput::from_table(&table, DataCompleteness::Short).unwrap();
        let population = index(&[("MS", 11, 5), ("T1", 9, 3), ("T1.1", 6, 1)]);
        let rows = reconcile_dynamics(&population, &input, "dynT_user").unwrap();
        let sub = rows.iter().find(|row| row.key == key("T1.1", 6)).unwrap();
        assert_eq!(sub.params.tt_col_n_phytomer, Some(1040.0));
        assert_eq!(sub.params.a_cohort, Some(0.012));
        assert_eq!(sub.shifted_from, None);
    }

    #[test]
    fn short_sub_tiller_without_primary_names_the_primary() {
        let table = UserTable::new(
            "dynT_user",
            &dynamics_columns(DataCompleteness::Short),
            vec![cells(&["MS", "0.01", "100", "1000", "4", "3", "5"])],
        );
        let input = DynamicsInput::from_table(&table, DataCompleteness::Short).unwrap();
        let population = index(&[("MS", 11, 5), ("T1.1", 6, 1)]);
        let err = reconcile_dynamics(&population, &input, "dynT_user").unwrap_err();
        assert!(matches!(err, PlantgenError::Reconcile(_)));
        assert_eq!(err.info().code, "undocumented-axis");
        assert_eq!(err.info().context["id_axis"], "T1");
        assert_eq!(err.info().context["generated_axis"], "T1.1");
        assert_eq!(err.info().context["table"], "dynT_user");
    }

    #[test]
    fn short_dimensions_without_primary_name_the_primary() {
        let rows = (1..=12)
            .map(|i| cells(&["MS", i.to_string().as_str(), "5", "1", "3", "0.5", "0", "0.3"]))
            .collect();
        let table = UserTable::new("dimT_user", &dimension_columns(DataCompleteness::Short), rows);
        let input = DimensionsInput::from_table(&table, DataCompleteness::Short).unwrap();
        let population = index(&[("MS", 11, 5), ("T2.0", 5, 1)]);
        let err = reconcile_dimensions(&population, &input, "dimT_user").unwrap_err();
        assert_eq!(err.info().code, "undocumented-axis");
        assert_eq!(err.info().context["id_axis"], "T2");
    }

    #[test]
    fn min_dynamics_keeps_only_tiller_ligulation() {
        let table = UserTable::new(
            "dynT_user",
            &dynamics_columns(DataCompleteness::Min),
            vec![
                cells(&["MS", "0.01", "100", "1000", "4", "3", "5"]),
                cells(&["T1", "0.5", "7", "1040", "1", "1", "1"]),
            ],
        );
        let input = DynamicsInput::from_table(&table, DataCompleteness::Min).unwrap();
        let population = index(&[("MS", 11, 5), ("MS", 12, 1), ("T1", 9, 3)]);
        let rows = reconcile_dynamics(&population, &input, "dynT_user").unwrap();
        let tiller = rows.iter().find(|row| row.key == key("T1", 9)).unwrap();
        assert_eq!(
            tiller.params,
            LeafDynamics {
                tt_col_n_phytomer: Some(1040.0),
                ..LeafDynamics::default()
            }
        );
        let ms12 = rows.iter().find(|row| row.key == key("MS", 12)).unwrap();
        assert_eq!(ms12.shifted_from, Some(11));
    }

    #[test]
    fn full_dynamics_use_most_frequent_leaf_count() {
        let table = UserTable::new(
            "dynT_user",
            &dynamics_columns(DataCompleteness::Full),
            vec![
                cells(&["MS", "11", "0.01", "100", "1000", "4", "3", "5"]),
                cells(&["T1", "9", "0.01", "150", "1040", "4", "3", "5"]),
            ],
        );
        let input = DynamicsInput::from_table(&table, DataCompleteness::Full).unwrap();
        let population = index(&[("MS", 11, 5), ("T1", 8, 1), ("T1", 9, 3)]);
        let rows = reconcile_dynamics(&population, &input, "dynT_user").unwrap();
        let t1_8 = rows.iter().find(|row| row.key == key("T1", 8)).unwrap();
        assert_eq!(t1_8.params.tt_col_0, Some(150.0));
    }

    #[test]
    fn full_dynamics_fail_without_any_documented_count() {
        let table = UserTable::new(
            "dynT_user",
            &dynamics_columns(DataCompleteness::Full),
            vec![
                cells(&["MS", "11", "0.01", "100", "1000", "4", "3", "5"]),
                cells(&["T1", "7", "0.01", "150", "1040", "4", "3", "5"]),
            ],
        );
        let input = DynamicsInput::from_table(&table, DataCompleteness::Full).unwrap();
        let population = index(&[("MS", 11, 5), ("T1", 8, 1), ("T1", 9, 3)]);
        let err = reconcile_dynamics(&population, &input, "dynT_user").unwrap_err();
        assert_eq!(err.info().code, "undocumented-group");
        assert_eq!(err.info().context["id_axis"], "T1");
        assert_eq!(err.info().context["N_phytomer"], "8");
    }

    #[test]
    fn min_dimensions_name_missing_index() {
        let rows = (1..=10)
            .map(|i| cells(&[i.to_string().as_str(), "5", "1", "3", "0.5", "0", "0.3"]))
            .collect();
        let table = UserTable::new("dimT_user", &dimension_columns(DataCompleteness::Min), rows);
        let input = DimensionsInput::from_table(&table, DataCompleteness::Min).unwrap();
        let population = index(&[("MS", 11, 5)]);
        let err = reconcile_dimensions(&population, &input, "dimT_user").unwrap_err();
        assert!(matches!(err, PlantgenError::Reconcile(_)));
        assert_eq!(err.info().code, "undocumented-index");
        assert_eq!(err.info().context["index_phytomer"], "11");
    }
}
