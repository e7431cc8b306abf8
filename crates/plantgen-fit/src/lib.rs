#![deny(missing_docs)]
#![doc = "Reconciliation of user measurements onto generated plant populations and table export."]

/// Per-axis output table and regression schedule.
pub mod axis;
/// YAML configuration schema and defaults.
pub mod config;
/// Non-fatal coverage checks of the user tables.
pub mod coverage;
/// Organ dimension output table.
pub mod dimensions;
/// Completion of the leaf dynamics table.
pub mod dynamics;
/// CSV rendering, digests and run manifests.
pub mod export;
/// Typed user tables.
pub mod input;
/// Haun stage, green leaf and senescence models.
pub mod phenology;
/// End to end generation entry points.
pub mod pipeline;
/// Mapping of user data onto generated groups.
pub mod reconcile;
/// Raw CSV user tables.
pub mod table;

pub use axis::{create_axis_table, AxisRow, RegressionSchedule};
pub use config::{GenerationConfig, GreenLeafObservation, LeafCountKey};
pub use coverage::{CoverageGap, CoverageWarning, PossiblePopulation};
pub use dimensions::{
    create_dimension_abs_table, create_dimension_table, elongated_internode_number,
    DimensionAbsRow, DimensionRow,
};
pub use dynamics::{count_elongated_internodes, finalize_dynamics, DynamicsRow};
pub use export::{
    combined_digest, input_hash, render_tables, stable_hash_string, write_tables,
    GenerationManifest, TableArtifact,
};
pub use input::{DimensionsInput, DynamicsInput, LeafDynamics, OrganDimensions};
pub use phenology::{derive_phenology, PhenologyTables, PiecewiseLinear};
pub use pipeline::{generate, generate_with_rng, GenerationOutput};
pub use reconcile::{reconcile_dimensions, reconcile_dynamics, ReconciledDynamics};
pub use table::UserTable;
