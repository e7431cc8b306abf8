//! End to end generation of a plant population.

use log::info;
use plantgen_axis::cardinality::{
    check_final_density, create_cardinality_table, theoretical_cardinalities, CardinalityRow,
};
use plantgen_axis::emergence::sample_emergence_offsets;
use plantgen_axis::skeleton::build_axis_skeleton;
use plantgen_axis::tillering::{create_tillering_table, TilleringRow};
use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::labels::{AxisLabel, GroupKey};
use plantgen_core::rng::RngHandle;

use crate::axis::{create_axis_table, AxisRow, RegressionSchedule};
use crate::config::GenerationConfig;
use crate::coverage::{
    check_dimensions_coverage, check_dynamics_coverage, CoverageWarning, PossiblePopulation,
};
use crate::dimensions::{
    create_dimension_abs_table, create_dimension_table, DimensionAbsRow, DimensionRow,
};
use crate::dynamics::{count_elongated_internodes, finalize_dynamics, DynamicsRow};
use crate::input::{DimensionsInput, DynamicsInput};
use crate::phenology::{derive_phenology, PhenologyTables};
use crate::reconcile::{reconcile_dimensions, reconcile_dynamics};
use crate::table::UserTable;

/// Every table produced for one population.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    /// `axeT`.
    pub axis_table: Vec<AxisRow>,
    /// `dimT`.
    pub dimension_table: Vec<DimensionRow>,
    /// `dimT_abs`.
    pub dimension_abs_table: Vec<DimensionAbsRow>,
    /// `phenT`, `phenT_abs`, `phenT_first` and `HS_GL_SSI_T`.
    pub phenology: PhenologyTables,
    /// `dynT`.
    pub dynamics: Vec<DynamicsRow>,
    /// `tilleringT`.
    pub tillering: Vec<TilleringRow>,
    /// `cardinalityT`.
    pub cardinality: Vec<CardinalityRow>,
    /// Coverage warnings raised on the user tables.
    pub warnings: Vec<CoverageWarning>,
    /// Flowering date actually used.
    pub tt_flowering: f64,
}

/// Generates a population with the seed carried by `config`.
pub fn generate(
    config: &GenerationConfig,
    dynamics_table: &UserTable,
    dimensions_table: &UserTable,
) -> Result<GenerationOutput, PlantgenError> {
    let mut rng = RngHandle::from_seed(config.seed);
    generate_with_rng(config, dynamics_table, dimensions_table, &mut rng)
}

/// Generates a population drawing every random value from `rng`.
pub fn generate_with_rng(
    config: &GenerationConfig,
    dynamics_table: &UserTable,
    dimensions_table: &UserTable,
    rng: &mut RngHandle,
) -> Result<GenerationOutput, PlantgenError> {
    config.validate()?;
    let probabilities = config.cohort_probabilities()?;
    let distribution = config.leaf_count_distribution()?;

    let theoretical = theoretical_cardinalities(&probabilities, config.plant_number);
    check_final_density(&theoretical, config.final_axes_density)?;

    let dynamics_input = DynamicsInput::from_table(dynamics_table, config.dyn_t_user_completeness)?;
    let dimensions_input =
        DimensionsInput::from_table(dimensions_table, config.dim_t_user_completeness)?;

    let possible = PossiblePopulation {
        axes: probabilities.possible_primary_axes(),
        main_stem_leaf_counts: distribution.possible_counts(),
    };
    let mut warnings = check_dynamics_coverage(&dynamics_input, dynamics_table.name(), &possible);
    warnings.extend(check_dimensions_coverage(
        &dimensions_input,
        dimensions_table.name(),
        &possible,
    ));

    let skeleton = build_axis_skeleton(config.plant_number, &probabilities, &distribution, rng);
    let index = skeleton.population_index();
    let cardinality = create_cardinality_table(&theoretical, &skeleton.simulated_cohort_counts());

    let reconciled = reconcile_dynamics(&index, &dynamics_input, dynamics_table.name())?;
    let dimension_groups = reconcile_dimensions(&index, &dimensions_input, dimensions_table.name())?;

    let main_stem = AxisLabel::main_stem();
    let reference_n = index.most_frequent_leaf_count(&main_stem).ok_or_else(|| {
        PlantgenError::Reconcile(ErrorInfo::new(
            "missing-main-stem",
            "the generated population has no main stem",
        ))
    })?;
    let reference = GroupKey::new(main_stem, reference_n);
    let mut dynamics = finalize_dynamics(&reconciled, &reference, config.tt_col_break)?;
    count_elongated_internodes(&mut dynamics, &dimension_groups);
    let phenology = derive_phenology(&dynamics, &config.gl_points())?;

    let tt_flowering = match config.tt_flowering {
        Some(flowering) => flowering,
        None => dynamics
            .iter()
            .find(|row| row.group_key() == reference)
            .map(|row| row.tt_col_n_phytomer)
            .ok_or_else(|| {
                PlantgenError::Dynamics(
                    ErrorInfo::new("missing-main-stem-reference", "no dynamics for the main stem")
                        .with_context("id_axis", &reference),
                )
            })?,
    };

    let offsets = sample_emergence_offsets(
        config.plant_number,
        config.emf_1_ms_standard_deviation,
        rng,
    )?;
    let schedule = RegressionSchedule {
        bolting: config.tt_bolting,
        flowering: tt_flowering,
        final_axes_density: config.final_axes_density,
        delais_tt_stop_del_axis: config.delais_tt_stop_del_axis,
    };
    let axis_table = create_axis_table(&skeleton, &offsets, &phenology, &schedule)?;

    let stops: Vec<Option<f64>> = axis_table.iter().map(|row| row.tt_stop_axis).collect();
    let tillering =
        create_tillering_table(config.plant_number, &stops, config.tt_bolting, tt_flowering);
    let dimension_table = create_dimension_table(&dimension_groups);
    let dimension_abs_table = create_dimension_abs_table(&dimension_groups);

    info!(
        "event=generate module=pipeline status=ok plants={} axes={} groups={} warnings={} flowering={}",
        config.plant_number,
        axis_table.len(),
        dynamics.len(),
        warnings.len(),
        tt_flowering
    );
    Ok(GenerationOutput {
        axis_table,
        dimension_table,
        dimension_abs_table,
        phenology,
        dynamics,
        tillering,
        cardinality,
        warnings,
        tt_flowering,
    })
}
