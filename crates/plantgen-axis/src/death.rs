//! Scheduling of axis regression between bolting and flowering.

use log::debug;
use plantgen_core::errors::{ErrorInfo, PlantgenError};

fn schedule_error(message: &str) -> ErrorInfo {
    ErrorInfo::new("invalid-schedule", message)
}

/// Linear decline of the living axes between bolting and flowering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalCurve {
    bolting: f64,
    flowering: f64,
    max_count: usize,
    final_count: usize,
}

impl SurvivalCurve {
    /// Validates the anchors of the curve.
    pub fn new(
        max_count: usize,
        final_count: usize,
        bolting: f64,
        flowering: f64,
    ) -> Result<Self, PlantgenError> {
        for (name, value) in [("bolting", bolting), ("flowering", flowering)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PlantgenError::Schedule(
                    schedule_error("thermal times must be finite and non-negative")
                        .with_context(name, value),
                ));
            }
        }
        if bolting >= flowering {
            return Err(PlantgenError::Schedule(
                schedule_error("bolting must happen strictly before flowering")
                    .with_context("bolting", bolting)
                    .with_context("flowering", flowering),
            ));
        }
        if final_count >= max_count {
            return Err(PlantgenError::Schedule(
                schedule_error("the final number of axes must be lower than the initial one")
                    .with_context("max_count", max_count)
                    .with_context("final_count", final_count),
            ));
        }
        Ok(Self {
            bolting,
            flowering,
            max_count,
            final_count,
        })
    }

    /// Number of axes that should still be alive at thermal time `t`.
    pub fn target_at(&self, t: f64) -> usize {
        let span = (self.max_count - self.final_count) as f64;
        let remaining = (self.flowering - t) / (self.flowering - self.bolting);
        let target = (self.final_count as f64 + span * remaining).floor();
        if target <= self.final_count as f64 {
            self.final_count
        } else if target >= self.max_count as f64 {
            self.max_count
        } else {
            target as usize
        }
    }

    /// Culling step `k`: `bolting + k` while it does not pass flowering,
    /// flowering itself afterwards.
    fn step(&self, k: f64) -> f64 {
        let t = self.bolting + k;
        if t <= self.flowering {
            t
        } else {
            self.flowering
        }
    }

    /// First culling step at which fewer than `count` axes should be alive.
    ///
    /// Solves the linear target for the threshold instead of walking every
    /// integer step, then checks the neighbouring steps against `target_at`.
    fn first_step_below(&self, count: usize) -> f64 {
        let level = count.saturating_sub(1).max(self.final_count);
        let span = (self.max_count - self.final_count) as f64;
        let fraction = (level + 1 - self.final_count) as f64 / span;
        let threshold = self.flowering - fraction * (self.flowering - self.bolting);
        let k = ((threshold - self.bolting).floor() + 1.0).max(0.0);
        [k - 1.0, k, k + 1.0]
            .into_iter()
            .filter(|k| *k >= 0.0)
            .map(|k| self.step(k))
            .find(|t| self.target_at(*t) <= level)
            .unwrap_or(self.flowering)
    }
}

/// Decides when axes stop growing.
///
/// Returns one entry per emergence time: `Some(t)` for axes killed at `t`,
/// `None` for axes that survive. The youngest living axis dies first; among
/// axes emerged at the same time the later row dies first.
pub fn decide_time_of_death(
    max_count: usize,
    final_count: usize,
    emergence: &[f64],
    bolting: f64,
    flowering: f64,
) -> Result<Vec<Option<f64>>, PlantgenError> {
    let curve = SurvivalCurve::new(max_count, final_count, bolting, flowering)?;
    if emergence.len() != max_count {
        return Err(PlantgenError::Schedule(
            schedule_error("one emergence time is required per initial axis")
                .with_context("max_count", max_count)
                .with_context("emergence_times", emergence.len()),
        ));
    }

    let mut alive: Vec<usize> = (0..emergence.len()).collect();
    alive.sort_by(|a, b| emergence[*a].total_cmp(&emergence[*b]).then(a.cmp(b)));

    let mut death = vec![None; emergence.len()];
    while alive.len() > final_count {
        let t = curve.first_step_below(alive.len());
        let target = curve.target_at(t);
        while alive.len() > target {
            match alive.pop() {
                Some(row) => death[row] = Some(t),
                None => break,
            }
        }
    }
    debug!(
        "event=time_of_death module=death status=ok max_count={} final_count={} killed={}",
        max_count,
        final_count,
        max_count - alive.len()
    );
    Ok(death)
}
