use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use log::{info, warn};
use plantgen_core::errors::PlantgenError;
use plantgen_core::provenance::RunProvenance;
use plantgen_core::rng::RngHandle;
use plantgen_fit::export::MANIFEST_FILE;
use plantgen_fit::{
    combined_digest, generate_with_rng, input_hash, render_tables, write_tables,
    GenerationConfig, GenerationManifest, UserTable,
};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// YAML configuration of the population.
    #[arg(long)]
    pub config: PathBuf,
    /// User leaf dynamics table (CSV).
    #[arg(long)]
    pub dynamics: PathBuf,
    /// User organ dimensions table (CSV).
    #[arg(long)]
    pub dimensions: PathBuf,
    /// Output directory for the generated tables.
    #[arg(long)]
    pub out: PathBuf,
    /// Master seed overriding the configuration.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of independent populations to generate.
    #[arg(long, default_value_t = 1)]
    pub replicates: u64,
}

fn tool_versions() -> BTreeMap<String, String> {
    let mut versions = BTreeMap::new();
    versions.insert("plantgen-sim".to_string(), env!("CARGO_PKG_VERSION").to_string());
    versions
}

/// Output directory of replicate `k`; a single replicate writes into `out`.
fn replicate_dir(out: &Path, replicates: u64, k: u64) -> PathBuf {
    if replicates <= 1 {
        out.to_path_buf()
    } else {
        out.join(format!("replicate_{k}"))
    }
}

/// Random stream of replicate `k`; a single replicate uses the master seed.
fn replicate_rng(seed: u64, replicates: u64, k: u64) -> RngHandle {
    if replicates <= 1 {
        RngHandle::from_seed(seed)
    } else {
        RngHandle::substream(seed, k)
    }
}

pub fn run(args: &GenerateArgs) -> Result<Vec<GenerationManifest>, Box<dyn Error>> {
    if args.replicates == 0 {
        return Err(Box::new(PlantgenError::input(
            "invalid-replicates",
            "--replicates must be at least 1",
        )));
    }
    let mut config = GenerationConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let dynamics = UserTable::from_path("dynT_user", &args.dynamics)?;
    let dimensions = UserTable::from_path("dimT_user", &args.dimensions)?;
    let input_hash = input_hash(&config, &dynamics, &dimensions)?;

    let mut manifests = Vec::new();
    for k in 0..args.replicates {
        let mut rng = replicate_rng(config.seed, args.replicates, k);
        let output = generate_with_rng(&config, &dynamics, &dimensions, &mut rng)?;
        for warning in &output.warnings {
            warn!(
                "event=replicate module=sim status=warn replicate={} table={} gap={:?}",
                k, warning.table, warning.gap
            );
        }
        let tables = render_tables(&output)?;
        let dir = replicate_dir(&args.out, args.replicates, k);
        write_tables(&tables, &dir)?;

        let manifest = GenerationManifest {
            config: config.clone(),
            replicate: k,
            provenance: RunProvenance {
                input_hash: input_hash.clone(),
                seed: config.seed,
                tool_versions: tool_versions(),
                ..RunProvenance::default()
            },
            tt_flowering: output.tt_flowering,
            warnings: output.warnings,
            tables_digest: combined_digest(&tables),
            tables,
        };
        manifest.write(&dir.join(MANIFEST_FILE))?;
        info!(
            "event=replicate module=sim status=ok replicate={} axes={} dir={} digest={}",
            k,
            output.axis_table.len(),
            dir.display(),
            manifest.tables_digest
        );
        manifests.push(manifest);
    }
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::tempdir;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("fixtures")
            .join("short")
            .join(name)
    }

    fn args(out: &Path, replicates: u64) -> GenerateArgs {
        GenerateArgs {
            config: fixture("config.yaml"),
            dynamics: fixture("dynT_user.csv"),
            dimensions: fixture("dimT_user.csv"),
            out: out.to_path_buf(),
            seed: None,
            replicates,
        }
    }

    #[test]
    fn single_run_writes_tables_and_manifest() {
        let dir = tempdir().unwrap();
        let manifests = run(&args(dir.path(), 1)).unwrap();
        assert_eq!(manifests.len(), 1);
        let expected = [
            "axeT.csv",
            "dimT.csv",
            "dimT_abs.csv",
            "phenT.csv",
            "tilleringT.csv",
            MANIFEST_FILE,
        ];
        for name in expected {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
        let axis = fs::read_to_string(dir.path().join("axeT.csv")).unwrap();
        assert!(axis.starts_with("id_plt,id_axis,N_phytomer,TT_stop_axis,TT_del_axis,id_dim,"));

        let loaded = GenerationManifest::load(&dir.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(loaded.provenance.seed, 7);
        assert_eq!(loaded.tables_digest, manifests[0].tables_digest);
        assert_eq!(loaded.tables.len(), 10);
    }

    #[test]
    fn reruns_are_byte_identical() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        run(&args(first.path(), 1)).unwrap();
        run(&args(second.path(), 1)).unwrap();
        for name in ["axeT.csv", "dynT.csv", "HS_GL_SSI_T.csv", MANIFEST_FILE] {
            let a = fs::read(first.path().join(name)).unwrap();
            let b = fs::read(second.path().join(name)).unwrap();
            assert_eq!(a, b, "{name} differs");
        }
    }

    #[test]
    fn replicates_get_their_own_directories() {
        let dir = tempdir().unwrap();
        let manifests = run(&args(dir.path(), 2)).unwrap();
        assert!(dir.path().join("replicate_0").join("axeT.csv").exists());
        assert!(dir.path().join("replicate_1").join(MANIFEST_FILE).exists());
        assert_eq!(manifests[0].provenance.input_hash, manifests[1].provenance.input_hash);
        assert_ne!(manifests[0].tables_digest, manifests[1].tables_digest);
    }

    #[test]
    fn zero_replicates_is_rejected() {
        let dir = tempdir().unwrap();
        let err = run(&args(dir.path(), 0)).unwrap_err();
        assert!(err.to_string().contains("invalid-replicates"));
    }

    #[test]
    fn seed_flag_overrides_config() {
        let dir = tempdir().unwrap();
        let mut overridden = args(dir.path(), 1);
        overridden.seed = Some(99);
        let manifests = run(&overridden).unwrap();
        assert_eq!(manifests[0].config.seed, 99);
        assert_eq!(manifests[0].provenance.seed, 99);
    }
}
