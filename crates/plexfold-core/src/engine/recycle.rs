use super::runners::{FeatureSet, FoldingModel, ModelError};
use crate::core::models::seed::Seed;
use crate::core::models::structure::Structure;
use tracing::{debug, instrument};

/// Pluggable definition of the structural deviation between two consecutive
/// recycle iterations. The exact numeric definition is deliberately not fixed
/// by the controller.
pub trait ConvergenceMetric: Sync {
    fn deviation(&self, previous: &Structure, current: &Structure) -> f64;
}

/// Root-mean-square deviation over paired Cα positions; the shorter structure
/// bounds the pairing. Structures without common residues are maximally far.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaRmsDeviation;

impl ConvergenceMetric for CaRmsDeviation {
    fn deviation(&self, previous: &Structure, current: &Structure) -> f64 {
        let paired = previous.len().min(current.len());
        if paired == 0 {
            return f64::INFINITY;
        }
        let sum_sq: f64 = previous.ca_positions()[..paired]
            .iter()
            .zip(&current.ca_positions()[..paired])
            .map(|(p, c)| (p - c).norm_squared())
            .sum();
        (sum_sq / paired as f64).sqrt()
    }
}

/// Why a recycle loop reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Consecutive estimates moved less than the configured tolerance.
    Converged,
    /// The iteration cap was reached regardless of the deviation.
    BudgetExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StopReason::Converged => "converged",
            StopReason::BudgetExhausted => "budget_exhausted",
        };
        write!(f, "{label}")
    }
}

/// Terminal output of one recycle loop run.
#[derive(Debug, Clone)]
pub struct RecycleOutcome {
    pub structure: Structure,
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// Deviation observed at the last iteration; `None` when only one
    /// iteration ran.
    pub last_deviation: Option<f64>,
}

/// Per-(model, seed) mutable loop state. Owned by the loop and destroyed on
/// termination, so concurrent grid cells cannot interfere.
struct RecycleState {
    iteration: usize,
    previous: Option<Structure>,
    last_deviation: Option<f64>,
}

/// Drives one candidate through iterative refinement.
///
/// The first iteration runs on bare features; every later iteration feeds the
/// previous structure estimate back into the model. Early stop requires at
/// least one completed iteration before the check and is disabled entirely by
/// a tolerance of zero, since no deviation is ever negative.
#[instrument(skip_all, fields(model = model.id(), seed))]
pub fn run(
    model: &dyn FoldingModel,
    features: &FeatureSet,
    seed: Seed,
    budget: usize,
    tolerance: f64,
    metric: &dyn ConvergenceMetric,
) -> Result<RecycleOutcome, ModelError> {
    let mut state = RecycleState {
        iteration: 0,
        previous: None,
        last_deviation: None,
    };

    loop {
        state.iteration += 1;
        let structure = model.predict(features, state.previous.as_ref(), seed)?;

        if let Some(previous) = &state.previous {
            let deviation = metric.deviation(previous, &structure);
            state.last_deviation = Some(deviation);
            debug!(iteration = state.iteration, deviation, "Recycle iteration finished.");

            if tolerance > 0.0 && deviation <= tolerance {
                return Ok(RecycleOutcome {
                    structure,
                    iterations: state.iteration,
                    stop_reason: StopReason::Converged,
                    last_deviation: state.last_deviation,
                });
            }
        } else {
            debug!(iteration = state.iteration, "Recycle iteration finished.");
        }

        if state.iteration >= budget {
            return Ok(RecycleOutcome {
                structure,
                iterations: state.iteration,
                stop_reason: StopReason::BudgetExhausted,
                last_deviation: state.last_deviation,
            });
        }

        state.previous = Some(structure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use std::sync::Mutex;

    /// Model scripted with one Cα x-coordinate per iteration; consecutive
    /// deviations under [`CaRmsDeviation`] equal the coordinate differences.
    struct ScriptedModel {
        positions: Vec<f64>,
        calls: Mutex<usize>,
    }

    impl ScriptedModel {
        fn new(positions: Vec<f64>) -> Self {
            Self {
                positions,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl FoldingModel for ScriptedModel {
        fn id(&self) -> &str {
            "scripted"
        }

        fn supports_ptm(&self) -> bool {
            false
        }

        fn predict(
            &self,
            _features: &FeatureSet,
            _recycled: Option<&Structure>,
            _seed: Seed,
        ) -> Result<Structure, ModelError> {
            let mut calls = self.calls.lock().unwrap();
            let x = self.positions[(*calls).min(self.positions.len() - 1)];
            *calls += 1;
            Structure::new(vec![Point3::new(x, 0.0, 0.0)], vec![90.0])
                .map_err(|e| ModelError::new(e.to_string()))
        }
    }

    fn features() -> FeatureSet {
        FeatureSet {
            assembly_sequence: "ACDE".to_string(),
            chain_lengths: vec![4],
            alignments: vec![],
            retained_templates: 4,
        }
    }

    #[test]
    fn converges_once_consecutive_estimates_settle() {
        // Deviations between consecutive calls: 0.2, then 0.1.
        let model = ScriptedModel::new(vec![0.0, 0.2, 0.3]);
        let outcome = run(&model, &features(), 1, 3, 0.3, &CaRmsDeviation).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Converged);
        assert_eq!(outcome.iterations, 2);
        assert!(outcome.last_deviation.unwrap() <= 0.3);
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn runs_to_budget_when_estimates_keep_moving() {
        // Deviations: 0.6, then 0.5 — never within 0.3.
        let model = ScriptedModel::new(vec![0.0, 0.6, 1.1, 1.5]);
        let outcome = run(&model, &features(), 2, 3, 0.3, &CaRmsDeviation).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn tight_schedule_converges_at_iteration_two() {
        // Deviation 0.05 at the second call.
        let model = ScriptedModel::new(vec![0.0, 0.05]);
        let outcome = run(&model, &features(), 3, 3, 0.3, &CaRmsDeviation).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Converged);
        assert_eq!(outcome.iterations, 2);
    }

    #[test]
    fn zero_tolerance_disables_early_stop() {
        // Identical estimates every iteration: deviation 0 throughout.
        let model = ScriptedModel::new(vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        let outcome = run(&model, &features(), 1, 5, 0.0, &CaRmsDeviation).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(outcome.iterations, 5);
        assert_eq!(outcome.last_deviation, Some(0.0));
    }

    #[test]
    fn budget_of_one_never_computes_a_deviation() {
        let model = ScriptedModel::new(vec![0.0]);
        let outcome = run(&model, &features(), 1, 1, 0.3, &CaRmsDeviation).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.last_deviation, None);
    }

    #[test]
    fn model_failure_propagates() {
        struct FailingModel;
        impl FoldingModel for FailingModel {
            fn id(&self) -> &str {
                "failing"
            }
            fn supports_ptm(&self) -> bool {
                false
            }
            fn predict(
                &self,
                _features: &FeatureSet,
                _recycled: Option<&Structure>,
                _seed: Seed,
            ) -> Result<Structure, ModelError> {
                Err(ModelError::new("accelerator out of memory"))
            }
        }

        let err = run(&FailingModel, &features(), 1, 3, 0.3, &CaRmsDeviation).unwrap_err();
        assert!(err.to_string().contains("out of memory"));
    }

    #[test]
    fn rms_deviation_pairs_to_the_shorter_structure() {
        let a = Structure::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            vec![90.0, 90.0],
        )
        .unwrap();
        let b = Structure::new(vec![Point3::new(3.0, 4.0, 0.0)], vec![90.0]).unwrap();

        assert!((CaRmsDeviation.deviation(&a, &b) - 5.0).abs() < 1e-12);

        let empty = Structure::new(vec![], vec![]).unwrap();
        assert!(CaRmsDeviation.deviation(&a, &empty).is_infinite());
    }
}
