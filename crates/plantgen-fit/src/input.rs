//! Typed user tables validated against their completeness level.

use std::collections::{BTreeMap, BTreeSet};

use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::AxisLabel;
use plantgen_core::DataCompleteness;
use serde::Serialize;

use crate::table::{CellRef, UserTable};

/// Leaf dynamics parameter columns, in schema order.
pub const DYNAMICS_PARAMETERS: [&str; 6] =
    ["a_cohort", "TT_col_0", "TT_col_N_phytomer", "n0", "n1", "n2"];

/// Organ dimension columns, in schema order.
pub const ORGAN_DIMENSIONS: [&str; 6] = [
    "L_blade",
    "W_blade",
    "L_sheath",
    "W_sheath",
    "L_internode",
    "W_internode",
];

/// Exact header of a dynamics table at `level`.
pub fn dynamics_columns(level: DataCompleteness) -> Vec<&'static str> {
    let mut columns = vec!["id_axis"];
    if level == DataCompleteness::Full {
        columns.push("N_phytomer");
    }
    columns.extend(DYNAMICS_PARAMETERS);
    columns
}

/// Exact header of a dimensions table at `level`.
pub fn dimension_columns(level: DataCompleteness) -> Vec<&'static str> {
    let mut columns = Vec::new();
    if level != DataCompleteness::Min {
        columns.push("id_axis");
    }
    if level == DataCompleteness::Full {
        columns.push("N_phytomer");
    }
    columns.push("index_phytomer");
    columns.extend(ORGAN_DIMENSIONS);
    columns
}

fn duplicate_key(table: &str, key: String) -> PlantgenError {
    PlantgenError::Input(
        ErrorInfo::new("duplicate-key", "table contains a duplicated key")
            .with_context("table", table)
            .with_context("key", key),
    )
}

/// Leaf dynamics parameters of one axis group; unset cells are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LeafDynamics {
    /// Rate of Haun stage progression before the break (leaves per degree day).
    pub a_cohort: Option<f64>,
    /// Thermal time at which the Haun stage is 0.
    #[serde(rename = "TT_col_0")]
    pub tt_col_0: Option<f64>,
    /// Thermal time of the flag leaf ligulation.
    #[serde(rename = "TT_col_N_phytomer")]
    pub tt_col_n_phytomer: Option<f64>,
    /// Green leaves number when senescence starts.
    pub n0: Option<f64>,
    /// Green leaves number at flag leaf ligulation.
    pub n1: Option<f64>,
    /// Green leaves number at the end of the green leaf plateau.
    pub n2: Option<f64>,
}

impl LeafDynamics {
    fn from_cells(table: &str, row: usize, cells: &[String]) -> Result<Self, PlantgenError> {
        let mut values = [None; 6];
        for ((value, column), raw) in values.iter_mut().zip(DYNAMICS_PARAMETERS).zip(cells) {
            *value = CellRef { table, row, column }.optional_f64(raw)?;
        }
        let [a_cohort, tt_col_0, tt_col_n_phytomer, n0, n1, n2] = values;
        Ok(Self {
            a_cohort,
            tt_col_0,
            tt_col_n_phytomer,
            n0,
            n1,
            n2,
        })
    }

    /// Whether every parameter is documented.
    pub fn is_complete(&self) -> bool {
        [
            self.a_cohort,
            self.tt_col_0,
            self.tt_col_n_phytomer,
            self.n0,
            self.n1,
            self.n2,
        ]
        .iter()
        .all(Option::is_some)
    }
}

/// A dynamics table keyed by axis label, and by leaf count at FULL level.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsInput {
    level: DataCompleteness,
    entries: BTreeMap<(AxisLabel, Option<u32>), LeafDynamics>,
}

impl DynamicsInput {
    /// Validates `table` against the schema of `level`.
    ///
    /// At MIN and SHORT levels the main stem row must document every
    /// parameter.
    pub fn from_table(table: &UserTable, level: DataCompleteness) -> Result<Self, PlantgenError> {
        table.expect_columns(&dynamics_columns(level))?;
        let name = table.name();
        let first_param = if level == DataCompleteness::Full { 2 } else { 1 };
        let mut entries = BTreeMap::new();
        for (row, cells) in table.rows().iter().enumerate() {
            let label: AxisLabel = cells[0].parse()?;
            let n_phytomer = if level == DataCompleteness::Full {
                Some(
                    CellRef {
                        table: name,
                        row,
                        column: "N_phytomer",
                    }
                    .required_index(&cells[1])?,
                )
            } else {
                None
            };
            let params = LeafDynamics::from_cells(name, row, &cells[first_param..])?;
            let key = (label, n_phytomer);
            if entries.contains_key(&key) {
                let rendered = match key.1 {
                    Some(n) => format!("({}, {n})", key.0),
                    None => key.0.to_string(),
                };
                return Err(duplicate_key(name, rendered));
            }
            entries.insert(key, params);
        }

        if level != DataCompleteness::Full {
            let complete = entries
                .get(&(AxisLabel::main_stem(), None))
                .is_some_and(LeafDynamics::is_complete);
            if !complete {
                return Err(PlantgenError::Input(
                    ErrorInfo::new(
                        "incomplete-main-stem",
                        "the main stem row must document every leaf dynamics parameter",
                    )
                    .with_context("table", name)
                    .with_context("level", level),
                ));
            }
        }
        Ok(Self { level, entries })
    }

    /// Completeness level of the table.
    pub fn level(&self) -> DataCompleteness {
        self.level
    }

    /// Row documented for `label` (MIN and SHORT levels).
    pub fn by_label(&self, label: &AxisLabel) -> Option<&LeafDynamics> {
        self.entries.get(&(label.clone(), None))
    }

    /// Row documented for `(label, n_phytomer)` (FULL level).
    pub fn by_group(&self, label: &AxisLabel, n_phytomer: u32) -> Option<&LeafDynamics> {
        self.entries.get(&(label.clone(), Some(n_phytomer)))
    }

    /// Whether any row documents `label`.
    pub fn documents_label(&self, label: &AxisLabel) -> bool {
        self.entries.keys().any(|(documented, _)| documented == label)
    }

    /// Labels documented by the table.
    pub fn documented_labels(&self) -> BTreeSet<AxisLabel> {
        self.entries.keys().map(|(label, _)| label.clone()).collect()
    }

    /// Main stem leaf counts documented by a FULL table.
    pub fn main_stem_leaf_counts(&self) -> BTreeSet<u32> {
        self.entries
            .keys()
            .filter(|(label, _)| label.is_main_stem())
            .filter_map(|(_, n)| *n)
            .collect()
    }
}

/// Blade, sheath and internode dimensions of one phytomer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrganDimensions {
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

impl OrganDimensions {
    fn from_cells(table: &str, row: usize, cells: &[String]) -> Result<Self, PlantgenError> {
        let mut values = [0.0; 6];
        for ((value, column), raw) in values.iter_mut().zip(ORGAN_DIMENSIONS).zip(cells) {
            *value = CellRef { table, row, column }.required_f64(raw)?;
        }
        let [l_blade, w_blade, l_sheath, w_sheath, l_internode, w_internode] = values;
        Ok(Self {
            l_blade,
            w_blade,
            l_sheath,
            w_sheath,
            l_internode,
            w_internode,
        })
    }
}

/// Key of a documented dimension series.
///
/// MIN tables hold a single series, SHORT tables one per label and FULL
/// tables one per `(label, leaf count)`.
pub type SeriesKey = (Option<AxisLabel>, Option<u32>);

/// Phytomer dimensions by base-counted index.
pub type DimensionSeries = BTreeMap<u32, OrganDimensions>;

/// A dimensions table split into per-axis series.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionsInput {
    level: DataCompleteness,
    series: BTreeMap<SeriesKey, DimensionSeries>,
}

impl DimensionsInput {
    /// Validates `table` against the schema of `level`.
    pub fn from_table(table: &UserTable, level: DataCompleteness) -> Result<Self, PlantgenError> {
        table.expect_columns(&dimension_columns(level))?;
        let name = table.name();
        let mut series: BTreeMap<SeriesKey, DimensionSeries> = BTreeMap::new();
        for (row, cells) in table.rows().iter().enumerate() {
            let mut cursor = 0;
            let label = if level == DataCompleteness::Min {
                None
            } else {
                cursor += 1;
                Some(cells[0].parse::<AxisLabel>()?)
            };
            let n_phytomer = if level == DataCompleteness::Full {
                cursor += 1;
                Some(
                    CellRef {
                        table: name,
                        row,
                        column: "N_phytomer",
                    }
                    .required_index(&cells[1])?,
                )
            } else {
                None
            };
            let index = CellRef {
                table: name,
                row,
                column: "index_phytomer",
            }
            .required_index(&cells[cursor])?;
            let dims = OrganDimensions::from_cells(name, row, &cells[cursor + 1..])?;

            let entries = series.entry((label.clone(), n_phytomer)).or_default();
            if entries.insert(index, dims).is_some() {
                let mut key: Vec<String> = Vec::new();
                if let Some(label) = &label {
                    key.push(label.to_string());
                }
                if let Some(n) = n_phytomer {
                    key.push(n.to_string());
                }
                key.push(index.to_string());
                return Err(duplicate_key(name, format!("({})", key.join(", "))));
            }
        }
        Ok(Self { level, series })
    }

    /// Completeness level of the table.
    pub fn level(&self) -> DataCompleteness {
        self.level
    }

    /// The single series of a MIN table.
    pub fn shared_series(&self) -> Option<&DimensionSeries> {
        self.series.get(&(None, None))
    }

    /// Series documented for `label` (SHORT level).
    pub fn by_label(&self, label: &AxisLabel) -> Option<&DimensionSeries> {
        self.series.get(&(Some(label.clone()), None))
    }

    /// Series documented for `(label, n_phytomer)` (FULL level).
    pub fn by_group(&self, label: &AxisLabel, n_phytomer: u32) -> Option<&DimensionSeries> {
        self.series.get(&(Some(label.clone()), Some(n_phytomer)))
    }

    /// Whether any series documents `label`.
    pub fn documents_label(&self, label: &AxisLabel) -> bool {
        self.series
            .keys()
            .any(|(documented, _)| documented.as_ref() == Some(label))
    }

    /// Labels documented by the table.
    pub fn documented_labels(&self) -> BTreeSet<AxisLabel> {
        self.series
            .keys()
            .filter_map(|(label, _)| label.clone())
            .collect()
    }

    /// Main stem leaf counts documented by a FULL table.
    pub fn main_stem_leaf_counts(&self) -> BTreeSet<u32> {
        self.series
            .keys()
            .filter(|(label, _)| label.as_ref().is_some_and(AxisLabel::is_main_stem))
            .filter_map(|(_, n)| *n)
            .collect()
    }

    /// Largest phytomer index documented for the main stem.
    ///
    /// MIN tables document every axis through their single series.
    pub fn main_stem_max_index(&self) -> Option<u32> {
        let series = match self.level {
            DataCompleteness::Min => self.shared_series(),
            _ => self.by_label(&AxisLabel::main_stem()),
        };
        series.and_then(|series| series.keys().next_back().copied())
    }
}
