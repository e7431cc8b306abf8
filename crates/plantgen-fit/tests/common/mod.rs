#![allow(dead_code)]

use std::path::PathBuf;

use plantgen_fit::{GenerationConfig, UserTable};

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .canonicalize()
        .unwrap()
}

pub struct Fixture {
    pub config: GenerationConfig,
    pub dynamics: UserTable,
    pub dimensions: UserTable,
}

/// Loads `fixtures/<name>/{config.yaml,dynT_user.csv,dimT_user.csv}`.
pub fn load_fixture(name: &str) -> Fixture {
    let dir = workspace_root().join("fixtures").join(name);
    Fixture {
        config: GenerationConfig::load(&dir.join("config.yaml")).unwrap(),
        dynamics: UserTable::from_path("dynT_user", &dir.join("dynT_user.csv")).unwrap(),
        dimensions: UserTable::from_path("dimT_user", &dir.join("dimT_user.csv")).unwrap(),
    }
}
