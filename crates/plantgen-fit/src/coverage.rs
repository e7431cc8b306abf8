//! Non-fatal checks of what the user tables document against what the
//! population may contain.

use std::collections::BTreeSet;

use log::warn;
use plantgen_core::labels::AxisLabel;
use plantgen_core::DataCompleteness;
use serde::{Deserialize, Serialize};

use crate::input::{DimensionsInput, DynamicsInput};

/// Kind of gap detected between a user table and the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageGap {
    /// Primary axes that may emerge are not documented.
    MissingAxes,
    /// Main stem leaf counts that may be drawn are not documented.
    MissingMainStemLeafCounts,
    /// The largest possible main stem exceeds the documented phytomers.
    MainStemIndexBeyondDocumented,
}

/// Warning raised when a generated axis might later fail to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageWarning {
    /// Name of the user table.
    pub table: String,
    /// Kind of gap.
    pub gap: CoverageGap,
    /// What the user table documents.
    pub documented: Vec<String>,
    /// What the population may contain.
    pub possible: Vec<String>,
}

impl CoverageWarning {
    fn new(
        table: &str,
        gap: CoverageGap,
        documented: impl IntoIterator<Item = String>,
        possible: impl IntoIterator<Item = String>,
    ) -> Self {
        let warning = Self {
            table: table.to_string(),
            gap,
            documented: documented.into_iter().collect(),
            possible: possible.into_iter().collect(),
        };
        warn!(
            "event=coverage module=coverage status=warn table={} gap={:?} documented=[{}] possible=[{}]",
            warning.table,
            warning.gap,
            warning.documented.join(","),
            warning.possible.join(",")
        );
        warning
    }
}

/// What the population may contain, derived from the probability tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PossiblePopulation {
    /// Primary axes with a non-zero emergence probability.
    pub axes: BTreeSet<AxisLabel>,
    /// Main stem leaf counts with a non-zero probability.
    pub main_stem_leaf_counts: BTreeSet<u32>,
}

fn missing_axes(
    table: &str,
    documented: BTreeSet<AxisLabel>,
    possible: &PossiblePopulation,
) -> Option<CoverageWarning> {
    if possible.axes.is_subset(&documented) {
        return None;
    }
    Some(CoverageWarning::new(
        table,
        CoverageGap::MissingAxes,
        documented.iter().map(ToString::to_string),
        possible.axes.iter().map(ToString::to_string),
    ))
}

fn missing_leaf_counts(
    table: &str,
    documented: BTreeSet<u32>,
    possible: &PossiblePopulation,
) -> Option<CoverageWarning> {
    if possible.main_stem_leaf_counts.is_subset(&documented) {
        return None;
    }
    Some(CoverageWarning::new(
        table,
        CoverageGap::MissingMainStemLeafCounts,
        documented.iter().map(ToString::to_string),
        possible.main_stem_leaf_counts.iter().map(ToString::to_string),
    ))
}

/// Coverage warnings of a dynamics table.
pub fn check_dynamics_coverage(
    input: &DynamicsInput,
    table: &str,
    possible: &PossiblePopulation,
) -> Vec<CoverageWarning> {
    let mut warnings = Vec::new();
    warnings.extend(missing_axes(table, input.documented_labels(), possible));
    if input.level() == DataCompleteness::Full {
        warnings.extend(missing_leaf_counts(
            table,
            input.main_stem_leaf_counts(),
            possible,
        ));
    }
    warnings
}

/// Coverage warnings of a dimensions table.
pub fn check_dimensions_coverage(
    input: &DimensionsInput,
    table: &str,
    possible: &PossiblePopulation,
) -> Vec<CoverageWarning> {
    let mut warnings = Vec::new();
    if input.level() != DataCompleteness::Min {
        warnings.extend(missing_axes(table, input.documented_labels(), possible));
    }
    if input.level() == DataCompleteness::Full {
        warnings.extend(missing_leaf_counts(
            table,
            input.main_stem_leaf_counts(),
            possible,
        ));
    } else if let Some(largest) = possible.main_stem_leaf_counts.iter().next_back() {
        let documented = input.main_stem_max_index();
        if documented.map_or(true, |max| *largest > max) {
            warnings.push(CoverageWarning::new(
                table,
                CoverageGap::MainStemIndexBeyondDocumented,
                documented.map(|max| max.to_string()),
                [largest.to_string()],
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{dimension_columns, dynamics_columns};
    use crate::table::UserTable;

    fn possible() -> PossiblePopulation {
        PossiblePopulation {
            axes: ["T1", "T2"].iter().map(|raw| raw.parse().unwrap()).collect(),
            main_stem_leaf_counts: [10, 11].into_iter().collect(),
        }
    }

    fn cells(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn undocumented_axes_are_reported() {
        let table = UserTable::new(
            "dynT_user",
            &dynamics_columns(DataCompleteness::Short),
            vec![
                cells(&["MS", "0.01", "100", "1000", "4", "3", "5"]),
                cells(&["T1", "", "", "1040", "", "", ""]),
            ],
        );
        let input = DynamicsInput::from_table(&table, DataCompleteness::Short).unwrap();
        let warnings = check_dynamics_coverage(&input, "dynT_user", &possible());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].gap, CoverageGap::MissingAxes);
        assert_eq!(warnings[0].possible, vec!["T1", "T2"]);
    }

    #[test]
    fn short_main_stem_series_is_reported() {
        let rows = (1..=10)
            .map(|i| cells(&[i.to_string().as_str(), "5", "1", "3", "0.5", "0", "0.3"]))
            .collect();
        let table = UserTable::new("dimT_user", &dimension_columns(DataCompleteness::Min), rows);
        let input = DimensionsInput::from_table(&table, DataCompleteness::Min).unwrap();
        let warnings = check_dimensions_coverage(&input, "dimT_user", &possible());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].gap, CoverageGap::MainStemIndexBeyondDocumented);
        assert_eq!(warnings[0].documented, vec!["10"]);
    }
}
