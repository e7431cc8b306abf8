use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use plantgen_axis::probabilities::{CohortProbabilities, LeafCountDistribution};
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::params::EMF_1_MS_STANDARD_DEVIATION;
use plantgen_core::DataCompleteness;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Main stem leaf count used as a map key; accepts integers and numeric
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LeafCountKey(pub u32);

struct LeafCountKeyVisitor;

impl<'de> Visitor<'de> for LeafCountKeyVisitor {
    type Value = LeafCountKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a positive leaf count, as an integer or a numeric string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        u32::try_from(value)
            .map(LeafCountKey)
            .map_err(|_| E::custom(format!("leaf count {value} is out of range")))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        u64::try_from(value)
            .map_err(|_| E::custom(format!("leaf count {value} is negative")))
            .and_then(|value| self.visit_u64(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value
            .trim()
            .parse::<u32>()
            .map(LeafCountKey)
            .map_err(|_| E::custom(format!("`{value}` is not a leaf count")))
    }
}

impl<'de> Deserialize<'de> for LeafCountKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LeafCountKeyVisitor)
    }
}

/// Green leaf number observed on the main stem at one thermal time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreenLeafObservation {
    /// Thermal time since sowing.
    #[serde(rename = "TT")]
    pub tt: f64,
    /// Decimal number of green leaves.
    #[serde(rename = "GL")]
    pub gl: f64,
}

/// YAML-configurable parameters of a population generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of plants to generate.
    #[serde(default = "default_plant_number")]
    pub plant_number: u32,
    /// Emergence probability of each primary tiller when its parent is present.
    #[serde(default = "default_axis_probabilities")]
    pub decide_child_axis_probabilities: BTreeMap<String, f64>,
    /// Distribution of the main stem final leaf count.
    #[serde(
        rename = "MS_leaves_number_probabilities",
        default = "default_leaves_number_probabilities"
    )]
    pub ms_leaves_number_probabilities: BTreeMap<LeafCountKey, f64>,
    /// Start of stem elongation, in degree days.
    #[serde(rename = "TT_bolting", default = "default_tt_bolting")]
    pub tt_bolting: f64,
    /// Flowering date; the main stem flag leaf ligulation when absent.
    #[serde(rename = "TT_flowering", default, skip_serializing_if = "Option::is_none")]
    pub tt_flowering: Option<f64>,
    /// Axes still alive at flowering.
    #[serde(default = "default_final_axes_density")]
    pub final_axes_density: u32,
    /// Green leaf numbers of the main stem after flag leaf ligulation.
    #[serde(rename = "GL_number", default = "default_gl_number")]
    pub gl_number: Vec<GreenLeafObservation>,
    /// Delay between an axis stopping and its disappearance.
    #[serde(rename = "delais_TT_stop_del_axis", default = "default_delais_tt_stop_del_axis")]
    pub delais_tt_stop_del_axis: f64,
    /// Thermal time at which the Haun stage rate changes; 0 for a constant rate.
    #[serde(rename = "TT_col_break", default)]
    pub tt_col_break: f64,
    /// Standard deviation of the per plant emergence offset.
    #[serde(
        rename = "emf_1_MS_standard_deviation",
        default = "default_emergence_deviation"
    )]
    pub emf_1_ms_standard_deviation: f64,
    /// Master seed of the run.
    #[serde(default)]
    pub seed: u64,
    /// Completeness of the user dynamics table.
    #[serde(rename = "dynT_user_completeness")]
    pub dyn_t_user_completeness: DataCompleteness,
    /// Completeness of the user dimensions table.
    #[serde(rename = "dimT_user_completeness")]
    pub dim_t_user_completeness: DataCompleteness,
}

fn default_plant_number() -> u32 {
    100
}

fn default_axis_probabilities() -> BTreeMap<String, f64> {
    [
        ("T0", 0.0),
        ("T1", 0.900),
        ("T2", 0.983),
        ("T3", 0.817),
        ("T4", 0.117),
    ]
    .into_iter()
    .map(|(label, p)| (label.to_string(), p))
    .collect()
}

fn default_leaves_number_probabilities() -> BTreeMap<LeafCountKey, f64> {
    [(10, 0.145), (11, 0.818), (12, 0.037), (13, 0.0), (14, 0.0)]
        .into_iter()
        .map(|(n, p)| (LeafCountKey(n), p))
        .collect()
}

fn default_tt_bolting() -> f64 {
    500.0
}

fn default_final_axes_density() -> u32 {
    250
}

fn default_gl_number() -> Vec<GreenLeafObservation> {
    [
        (1117.0, 5.6),
        (1212.1, 5.4),
        (1368.7, 4.9),
        (1686.8, 2.4),
        (1880.0, 0.0),
    ]
    .into_iter()
    .map(|(tt, gl)| GreenLeafObservation { tt, gl })
    .collect()
}

fn default_delais_tt_stop_del_axis() -> f64 {
    600.0
}

fn default_emergence_deviation() -> f64 {
    EMF_1_MS_STANDARD_DEVIATION
}

fn invalid_scalar(name: &str, value: impl ToString, message: &str) -> PlantgenError {
    PlantgenError::Input(
        ErrorInfo::new("invalid-parameter", message)
            .with_context("parameter", name)
            .with_context("value", value),
    )
}

impl GenerationConfig {
    /// Default configuration for the given user table levels.
    pub fn with_levels(dynamics: DataCompleteness, dimensions: DataCompleteness) -> Self {
        Self {
            plant_number: default_plant_number(),
            decide_child_axis_probabilities: default_axis_probabilities(),
            ms_leaves_number_probabilities: default_leaves_number_probabilities(),
            tt_bolting: default_tt_bolting(),
            tt_flowering: None,
            final_axes_density: default_final_axes_density(),
            gl_number: default_gl_number(),
            delais_tt_stop_del_axis: default_delais_tt_stop_del_axis(),
            tt_col_break: 0.0,
            emf_1_ms_standard_deviation: default_emergence_deviation(),
            seed: 0,
            dyn_t_user_completeness: dynamics,
            dim_t_user_completeness: dimensions,
        }
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, PlantgenError> {
        serde_yaml::from_str(raw).map_err(|err| PlantgenError::serde("config-parse", err))
    }

    /// Loads a YAML file.
    pub fn load(path: &Path) -> Result<Self, PlantgenError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display()),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Checks scalar parameters.
    pub fn validate(&self) -> Result<(), PlantgenError> {
        if self.plant_number == 0 {
            return Err(invalid_scalar(
                "plant_number",
                self.plant_number,
                "at least one plant is required",
            ));
        }
        if self.final_axes_density == 0 {
            return Err(invalid_scalar(
                "final_axes_density",
                self.final_axes_density,
                "at least one axis must reach flowering",
            ));
        }
        let non_negative = [
            ("TT_bolting", self.tt_bolting),
            ("delais_TT_stop_del_axis", self.delais_tt_stop_del_axis),
            ("emf_1_MS_standard_deviation", self.emf_1_ms_standard_deviation),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid_scalar(name, value, "must be finite and non-negative"));
            }
        }
        if !self.tt_col_break.is_finite() {
            return Err(invalid_scalar("TT_col_break", self.tt_col_break, "must be finite"));
        }
        if let Some(flowering) = self.tt_flowering {
            if !flowering.is_finite() || flowering <= self.tt_bolting {
                return Err(invalid_scalar(
                    "TT_flowering",
                    flowering,
                    "must be finite and later than TT_bolting",
                ));
            }
        }
        for pair in self.gl_number.windows(2) {
            if pair[1].tt <= pair[0].tt {
                return Err(invalid_scalar(
                    "GL_number",
                    pair[1].tt,
                    "thermal times must be strictly increasing",
                ));
            }
        }
        if let Some(obs) = self
            .gl_number
            .iter()
            .find(|obs| !obs.tt.is_finite() || !obs.gl.is_finite() || obs.gl < 0.0)
        {
            return Err(invalid_scalar(
                "GL_number",
                obs.gl,
                "observations must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Emergence probabilities indexed by cohort.
    pub fn cohort_probabilities(&self) -> Result<CohortProbabilities, PlantgenError> {
        CohortProbabilities::from_axis_probabilities(
            self.decide_child_axis_probabilities
                .iter()
                .map(|(label, p)| (label.as_str(), *p)),
        )
    }

    /// Main stem leaf count distribution.
    pub fn leaf_count_distribution(&self) -> Result<LeafCountDistribution, PlantgenError> {
        LeafCountDistribution::from_entries(
            self.ms_leaves_number_probabilities
                .iter()
                .map(|(key, p)| (key.0, *p)),
        )
    }

    /// Green leaf observations as `(thermal time, green leaves)` pairs.
    pub fn gl_points(&self) -> Vec<(f64, f64)> {
        self.gl_number.iter().map(|obs| (obs.tt, obs.gl)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_takes_defaults() {
        let config = GenerationConfig::from_yaml_str(
            "dynT_user_completeness: MIN\ndimT_user_completeness: FULL\n",
        )
        .unwrap();
        assert_eq!(config, GenerationConfig::with_levels(DataCompleteness::Min, DataCompleteness::Full));
        assert_eq!(config.plant_number, 100);
        assert_eq!(config.ms_leaves_number_probabilities[&LeafCountKey(11)], 0.818);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn leaf_count_keys_accept_strings_and_integers() {
        let yaml = "dynT_user_completeness: SHORT\n\
                    dimT_user_completeness: SHORT\n\
                    MS_leaves_number_probabilities:\n  '10': 0.5\n  11: 0.5\n";
        let config = GenerationConfig::from_yaml_str(yaml).unwrap();
        let keys: Vec<u32> = config
            .ms_leaves_number_probabilities
            .keys()
            .map(|key| key.0)
            .collect();
        assert_eq!(keys, vec![10, 11]);
    }

    #[test]
    fn levels_are_mandatory() {
        let err = GenerationConfig::from_yaml_str("plant_number: 3\n").unwrap_err();
        assert_eq!(err.info().code, "config-parse");
    }

    #[test]
    fn unsorted_green_leaves_are_rejected() {
        let mut config = GenerationConfig::with_levels(DataCompleteness::Min, DataCompleteness::Min);
        config.gl_number.swap(0, 1);
        let err = config.validate().unwrap_err();
        assert_eq!(err.info().context["parameter"], "GL_number");
    }

    #[test]
    fn zero_final_density_is_rejected() {
        let mut config = GenerationConfig::with_levels(DataCompleteness::Min, DataCompleteness::Min);
        config.final_axes_density = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PlantgenError::Input(_)));
        assert_eq!(err.info().code, "invalid-parameter");
        assert_eq!(err.info().context["parameter"], "final_axes_density");
    }

    #[test]
    fn json_roundtrip_preserves_config() {
        let config = GenerationConfig::with_levels(DataCompleteness::Full, DataCompleteness::Short);
        let json = serde_json::to_string(&config).unwrap();
        let back: GenerationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
