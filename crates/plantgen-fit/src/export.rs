//! CSV rendering of the generated tables and the run manifest.

use std::fs;
use std::path::Path;

use log::{debug, info};
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::provenance::RunProvenance;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::GenerationConfig;
use crate::coverage::CoverageWarning;
use crate::pipeline::GenerationOutput;
use crate::table::UserTable;

/// File name of `axeT`.
pub const AXIS_TABLE_FILE: &str = "axeT.csv";
/// File name of `dimT`.
pub const DIMENSION_TABLE_FILE: &str = "dimT.csv";
/// File name of `dimT_abs`.
pub const DIMENSION_ABS_TABLE_FILE: &str = "dimT_abs.csv";
/// File name of `phenT`.
pub const PHENOLOGY_TABLE_FILE: &str = "phenT.csv";
/// File name of `phenT_abs`.
pub const PHENOLOGY_ABS_TABLE_FILE: &str = "phenT_abs.csv";
/// File name of `phenT_first`.
pub const PHENOLOGY_FIRST_TABLE_FILE: &str = "phenT_first.csv";
/// File name of `dynT`.
pub const DYNAMICS_TABLE_FILE: &str = "dynT.csv";
/// File name of `HS_GL_SSI_T`.
pub const HS_GL_SSI_TABLE_FILE: &str = "HS_GL_SSI_T.csv";
/// File name of `tilleringT`.
pub const TILLERING_TABLE_FILE: &str = "tilleringT.csv";
/// File name of `cardinalityT`.
pub const CARDINALITY_TABLE_FILE: &str = "cardinalityT.csv";
/// File name of the run manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Computes a stable hexadecimal hash for the provided serializable payload.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, PlantgenError> {
    let bytes =
        serde_json::to_vec(value).map_err(|err| PlantgenError::serde("hash-serialize", err))?;
    Ok(format!("{:x}", Sha256::digest(bytes)))
}

/// Hash of everything a generation depends on besides the seed.
pub fn input_hash(
    config: &GenerationConfig,
    dynamics_table: &UserTable,
    dimensions_table: &UserTable,
) -> Result<String, PlantgenError> {
    stable_hash_string(&(config, dynamics_table, dimensions_table))
}

/// One rendered CSV table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableArtifact {
    /// File name inside the output directory.
    pub file_name: String,
    /// Number of data rows.
    pub rows: usize,
    /// SHA-256 of the rendered bytes.
    pub sha256: String,
    /// Rendered CSV, header included.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

fn render<T: Serialize>(file_name: &str, rows: &[T]) -> Result<TableArtifact, PlantgenError> {
    let csv_error = |err: String| {
        PlantgenError::Serde(
            ErrorInfo::new("csv-write", err).with_context("file", file_name),
        )
    };
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).map_err(|err| csv_error(err.to_string()))?;
    }
    let bytes = wtr.into_inner().map_err(|err| csv_error(err.to_string()))?;
    debug!(
        "event=render module=export status=ok file={} rows={}",
        file_name,
        rows.len()
    );
    Ok(TableArtifact {
        file_name: file_name.to_string(),
        rows: rows.len(),
        sha256: format!("{:x}", Sha256::digest(&bytes)),
        bytes,
    })
}

/// Renders every generated table, in a fixed order.
pub fn render_tables(output: &GenerationOutput) -> Result<Vec<TableArtifact>, PlantgenError> {
    Ok(vec![
        render(AXIS_TABLE_FILE, &output.axis_table)?,
        render(DIMENSION_TABLE_FILE, &output.dimension_table)?,
        render(DIMENSION_ABS_TABLE_FILE, &output.dimension_abs_table)?,
        render(PHENOLOGY_TABLE_FILE, &output.phenology.relative)?,
        render(PHENOLOGY_ABS_TABLE_FILE, &output.phenology.absolute)?,
        render(PHENOLOGY_FIRST_TABLE_FILE, &output.phenology.first)?,
        render(DYNAMICS_TABLE_FILE, &output.dynamics)?,
        render(HS_GL_SSI_TABLE_FILE, &output.phenology.hs_gl_ssi)?,
        render(TILLERING_TABLE_FILE, &output.tillering)?,
        render(CARDINALITY_TABLE_FILE, &output.cardinality)?,
    ])
}

/// Writes the rendered tables into `dir`, creating it when needed.
pub fn write_tables(artifacts: &[TableArtifact], dir: &Path) -> Result<(), PlantgenError> {
    fs::create_dir_all(dir).map_err(|err| {
        PlantgenError::Serde(
            ErrorInfo::new("output-mkdir", err.to_string())
                .with_context("path", dir.display().to_string()),
        )
    })?;
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("table-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
    }
    info!(
        "event=write_tables module=export status=ok dir={} tables={}",
        dir.display(),
        artifacts.len()
    );
    Ok(())
}

/// SHA-256 over the per-table digests, in rendering order.
pub fn combined_digest(artifacts: &[TableArtifact]) -> String {
    let mut hasher = Sha256::new();
    for artifact in artifacts {
        hasher.update(artifact.file_name.as_bytes());
        hasher.update(artifact.sha256.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Structured manifest describing one generated replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Configuration used for the run.
    pub config: GenerationConfig,
    /// Replicate number, 0 for a single run.
    pub replicate: u64,
    /// Seed and input digests.
    pub provenance: RunProvenance,
    /// Flowering date actually used.
    #[serde(rename = "TT_flowering")]
    pub tt_flowering: f64,
    /// Coverage warnings raised on the user tables.
    pub warnings: Vec<CoverageWarning>,
    /// Rendered tables with their digests.
    pub tables: Vec<TableArtifact>,
    /// Digest of the whole table set.
    pub tables_digest: String,
}

impl GenerationManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), PlantgenError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                PlantgenError::Serde(
                    ErrorInfo::new("manifest-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("manifest-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, PlantgenError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("manifest-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
