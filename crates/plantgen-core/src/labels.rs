//! Axis labels and the `(axis, leaf count)` group keys derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::errors::{ErrorInfo, PlantgenError};
use crate::params::{FIRST_CHILD_DELAY, MAIN_STEM_COHORT};

/// Label of an axis: `MS` for the main stem, `T<k>` for a primary tiller and
/// `T<k>.<j>...` for tillers borne by other tillers.
///
/// Internally the label is the path of child indices from the main stem, so
/// the derived ordering is `MS < T0 < T0.0 < T0.1 < T1 < ...`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AxisLabel {
    path: Vec<u32>,
}

impl AxisLabel {
    /// The main stem label.
    pub fn main_stem() -> Self {
        Self { path: Vec::new() }
    }

    /// Label of the primary tiller `T<index>`.
    pub fn primary_tiller(index: u32) -> Self {
        Self { path: vec![index] }
    }

    /// Whether the label designates the main stem.
    pub fn is_main_stem(&self) -> bool {
        self.path.is_empty()
    }

    /// Child indices from the main stem down to this axis.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// Tiller order: 0 for the main stem, 1 for primary tillers, and so on.
    pub fn order(&self) -> usize {
        self.path.len()
    }

    /// Label of the child with index `index` borne on this axis.
    pub fn child(&self, index: u32) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self { path }
    }

    /// Label with the sub-order suffix stripped (`T1.1` becomes `T1`).
    ///
    /// The main stem and primary tillers are their own primary axis.
    pub fn primary(&self) -> Self {
        Self {
            path: self.path.iter().take(1).copied().collect(),
        }
    }

    /// Cohort number implied by the label.
    pub fn cohort(&self) -> u32 {
        self.path
            .iter()
            .fold(MAIN_STEM_COHORT, |cohort, index| {
                cohort + FIRST_CHILD_DELAY + index
            })
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "MS");
        }
        write!(f, "T")?;
        for (idx, index) in self.path.iter().enumerate() {
            if idx > 0 {
                write!(f, ".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl FromStr for AxisLabel {
    type Err = PlantgenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed == "MS" {
            return Ok(Self::main_stem());
        }
        let invalid = || {
            PlantgenError::Input(
                ErrorInfo::new("invalid-axis-label", "axis label is neither MS nor T<k>[.<j>...]")
                    .with_context("id_axis", trimmed),
            )
        };
        let Some(rest) = trimmed.strip_prefix('T') else {
            return Err(invalid());
        };
        let path = rest
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { path })
    }
}

impl TryFrom<String> for AxisLabel {
    type Error = PlantgenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AxisLabel> for String {
    fn from(label: AxisLabel) -> Self {
        label.to_string()
    }
}

/// Key bucketing axes that share one dimension and phenology profile.
///
/// Rendered as the axis label followed by the leaf count padded to two
/// digits, e.g. `MS11` or `T1.109`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    /// Axis label shared by the group.
    pub label: AxisLabel,
    /// Final leaf count shared by the group.
    pub n_phytomer: u32,
}

impl GroupKey {
    /// Creates a new group key.
    pub fn new(label: AxisLabel, n_phytomer: u32) -> Self {
        Self { label, n_phytomer }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.label, self.n_phytomer)
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
