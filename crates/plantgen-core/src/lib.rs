#![deny(missing_docs)]
#![doc = "Core types, error surface and deterministic randomness shared by the plantgen crates."]

pub mod errors;
pub mod labels;
pub mod params;
pub mod provenance;
pub mod rng;

pub use errors::{ErrorInfo, PlantgenError};
pub use labels::{AxisLabel, GroupKey};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};

/// Completeness level of a user-supplied table.
///
/// The level fixes the exact column set a table must carry and the key the
/// reconciliation step indexes it by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataCompleteness {
    /// Data documented by phytomer index only, or by the main stem alone.
    Min,
    /// Data documented per axis label.
    Short,
    /// Data documented per axis label and final leaf count.
    Full,
}

impl std::fmt::Display for DataCompleteness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DataCompleteness::Min => "MIN",
            DataCompleteness::Short => "SHORT",
            DataCompleteness::Full => "FULL",
        };
        f.write_str(label)
    }
}
