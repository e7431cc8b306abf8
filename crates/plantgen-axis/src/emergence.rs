//! Plant to plant variability of the main stem emergence date.

use plantgen_core::errors::{ErrorInfo, PlantgenError};
use plantgen_core::rng::RngHandle;
use rand_distr::{Distribution, Normal};

/// Per plant shift of the main stem emergence.
///
/// Offsets are drawn from `N(0, sigma)` and redrawn until they fall within
/// half a standard deviation of zero. A zero `sigma` yields zero offsets
/// without consuming draws.
pub fn sample_emergence_offsets(
    plant_number: u32,
    sigma: f64,
    rng: &mut RngHandle,
) -> Result<Vec<f64>, PlantgenError> {
    if sigma == 0.0 {
        return Ok(vec![0.0; plant_number as usize]);
    }
    let normal = Normal::new(0.0, sigma).map_err(|err| {
        PlantgenError::Input(
            ErrorInfo::new("invalid-standard-deviation", err.to_string())
                .with_context("emf_1_MS_standard_deviation", sigma),
        )
    })?;
    let bound = sigma.abs() / 2.0;
    let offsets = (0..plant_number)
        .map(|_| loop {
            let offset = normal.sample(rng.inner_mut());
            if offset.abs() <= bound {
                break offset;
            }
        })
        .collect();
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_truncated() {
        let mut rng = RngHandle::from_seed(17);
        let offsets = sample_emergence_offsets(500, 30.0, &mut rng).unwrap();
        assert_eq!(offsets.len(), 500);
        assert!(offsets.iter().all(|x| x.abs() <= 15.0));
    }

    #[test]
    fn zero_deviation_is_flat() {
        let mut rng = RngHandle::from_seed(17);
        let offsets = sample_emergence_offsets(3, 0.0, &mut rng).unwrap();
        assert_eq!(offsets, vec![0.0; 3]);
    }

    #[test]
    fn negative_deviation_is_rejected() {
        let mut rng = RngHandle::from_seed(17);
        let err = sample_emergence_offsets(3, -1.0, &mut rng).unwrap_err();
        assert_eq!(err.info().code, "invalid-standard-deviation");
    }
}
