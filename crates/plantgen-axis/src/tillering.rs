//! Living axes summary at key developmental stages.

use serde::Serialize;

/// Number of living axes at one thermal time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilleringRow {
    /// Thermal time since sowing.
    #[serde(rename = "TT")]
    pub tt: f64,
    /// Axes alive at `tt`.
    #[serde(rename = "NbrAxes")]
    pub nbr_axes: usize,
}

/// Living axes at sowing, bolting and flowering.
///
/// Only main stems exist at sowing. Later, an axis stopped at `t` is no
/// longer counted at `t`.
pub fn create_tillering_table(
    plant_number: u32,
    stop_times: &[Option<f64>],
    bolting: f64,
    flowering: f64,
) -> Vec<TilleringRow> {
    let alive_at = |tt: f64| {
        stop_times
            .iter()
            .filter(|stop| stop.map_or(true, |stop| stop > tt))
            .count()
    };
    vec![
        TilleringRow {
            tt: 0.0,
            nbr_axes: plant_number as usize,
        },
        TilleringRow {
            tt: bolting,
            nbr_axes: alive_at(bolting),
        },
        TilleringRow {
            tt: flowering,
            nbr_axes: alive_at(flowering),
        },
    ]
}
