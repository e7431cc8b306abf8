//! Provenance and schema descriptors attached to generated table sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of the emitted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented when a column is renamed or removed.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance information attached to every generated table set.
///
/// Carries no wall-clock timestamp: two runs with the same seed and inputs
/// serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Schema version of the output tables.
    pub schema_version: SchemaVersion,
    /// Hash of the input configuration and user tables.
    pub input_hash: String,
    /// Master deterministic seed used for all randomness.
    pub seed: u64,
    /// Version map for all crates involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}
