use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::recycle::{self, ConvergenceMetric, StopReason};
use super::runners::{FeatureSet, FoldingModel};
use crate::core::models::job::Composition;
use crate::core::models::seed::Seed;
use crate::core::models::structure::Structure;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cooperative cancellation flag checked between grid cells, never
/// mid-iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal output of one grid cell.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub model_id: String,
    pub seed: Seed,
    pub structure: Structure,
    pub iterations: usize,
    pub stop_reason: StopReason,
    pub duration: Duration,
}

impl Candidate {
    /// Whole-chain confidence: pTM where the model emits one, mean pLDDT
    /// otherwise.
    pub fn confidence(&self) -> f64 {
        self.structure
            .ptm()
            .unwrap_or_else(|| self.structure.mean_plddt())
    }
}

/// A failure isolated to one (model, seed) pair.
#[derive(Debug, Clone)]
pub struct CellFailure {
    pub model_id: String,
    pub seed: Seed,
    pub message: String,
}

/// Everything the grid produced, success or not.
#[derive(Debug)]
pub struct GridOutcome {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<CellFailure>,
    pub cancelled: bool,
}

enum CellResult {
    Produced(Candidate),
    Failed(CellFailure),
    Skipped,
}

/// Picks the models matching the job composition: standard models for
/// monomers and homomers, pTM-capable models for heteromers.
pub fn select_models<'a>(
    models: &'a [Box<dyn FoldingModel>],
    composition: Composition,
) -> Result<Vec<&'a dyn FoldingModel>, EngineError> {
    let want_ptm = matches!(composition, Composition::Heteromer);
    let selected: Vec<&dyn FoldingModel> = models
        .iter()
        .filter(|m| m.supports_ptm() == want_ptm)
        .map(|m| m.as_ref())
        .collect();

    if selected.is_empty() {
        return Err(EngineError::NoSuitableModels {
            composition,
            expected: if want_ptm { "pTM-capable" } else { "standard" },
        });
    }
    Ok(selected)
}

/// Runs the recycle loop once per (model, seed) grid cell.
///
/// Cells are independent: one cell's failure is recorded and the rest of the
/// grid continues. Only a grid with zero surviving candidates fails the job.
#[instrument(skip_all, fields(models = models.len(), seeds = seeds.len()))]
pub fn run(
    models: &[&dyn FoldingModel],
    seeds: &[Seed],
    features: &FeatureSet,
    budget: usize,
    tolerance: f64,
    metric: &dyn ConvergenceMetric,
    cancel: &CancelToken,
    reporter: &ProgressReporter,
) -> Result<GridOutcome, EngineError> {
    let cells: Vec<(&dyn FoldingModel, Seed)> = models
        .iter()
        .flat_map(|&model| seeds.iter().map(move |&seed| (model, seed)))
        .collect();

    info!(cells = cells.len(), "Starting sampling grid.");
    reporter.report(Progress::TaskStart {
        total: cells.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = cells.iter();

    #[cfg(feature = "parallel")]
    let iterator = cells.par_iter();

    let results: Vec<CellResult> = iterator
        .map(|&(model, seed)| {
            run_cell(model, seed, features, budget, tolerance, metric, cancel, reporter)
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let cancelled = cancel.is_cancelled();
    let mut candidates = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            CellResult::Produced(candidate) => candidates.push(candidate),
            CellResult::Failed(failure) => failures.push(failure),
            CellResult::Skipped => {}
        }
    }

    if candidates.is_empty() {
        return Err(EngineError::NoCandidates { cells: cells.len() });
    }

    info!(
        produced = candidates.len(),
        failed = failures.len(),
        cancelled,
        "Sampling grid finished."
    );
    Ok(GridOutcome {
        candidates,
        failures,
        cancelled,
    })
}

fn run_cell(
    model: &dyn FoldingModel,
    seed: Seed,
    features: &FeatureSet,
    budget: usize,
    tolerance: f64,
    metric: &dyn ConvergenceMetric,
    cancel: &CancelToken,
    reporter: &ProgressReporter,
) -> CellResult {
    if cancel.is_cancelled() {
        return CellResult::Skipped;
    }

    let started = Instant::now();
    let result = recycle::run(model, features, seed, budget, tolerance, metric);
    reporter.report(Progress::TaskIncrement { amount: 1 });

    match result {
        Ok(outcome) => CellResult::Produced(Candidate {
            model_id: model.id().to_string(),
            seed,
            structure: outcome.structure,
            iterations: outcome.iterations,
            stop_reason: outcome.stop_reason,
            duration: started.elapsed(),
        }),
        Err(error) => {
            warn!(
                model = model.id(),
                seed,
                %error,
                "Grid cell failed; continuing with remaining cells."
            );
            CellResult::Failed(CellFailure {
                model_id: model.id().to_string(),
                seed,
                message: error.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recycle::CaRmsDeviation;
    use crate::engine::runners::ModelError;
    use nalgebra::Point3;

    struct ConstantModel {
        id: String,
        ptm: bool,
    }

    impl ConstantModel {
        fn new(id: &str, ptm: bool) -> Box<dyn FoldingModel> {
            Box::new(Self {
                id: id.to_string(),
                ptm,
            })
        }
    }

    impl FoldingModel for ConstantModel {
        fn id(&self) -> &str {
            &self.id
        }
        fn supports_ptm(&self) -> bool {
            self.ptm
        }
        fn predict(
            &self,
            _features: &FeatureSet,
            _recycled: Option<&Structure>,
            seed: Seed,
        ) -> Result<Structure, ModelError> {
            let structure =
                Structure::new(vec![Point3::new(seed as f64, 0.0, 0.0)], vec![80.0])
                    .map_err(|e| ModelError::new(e.to_string()))?;
            Ok(if self.ptm {
                structure.with_ptm(0.7)
            } else {
                structure
            })
        }
    }

    struct FailForSeed {
        bad_seed: Seed,
    }

    impl FoldingModel for FailForSeed {
        fn id(&self) -> &str {
            "flaky"
        }
        fn supports_ptm(&self) -> bool {
            false
        }
        fn predict(
            &self,
            _features: &FeatureSet,
            _recycled: Option<&Structure>,
            seed: Seed,
        ) -> Result<Structure, ModelError> {
            if seed == self.bad_seed {
                return Err(ModelError::new("resource exhausted"));
            }
            Structure::new(vec![Point3::origin()], vec![70.0])
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
    fn model_selection_follows_composition() {
        let models = vec![
            ConstantModel::new("model_1", false),
            ConstantModel::new("model_1_ptm", true),
            ConstantModel::new("model_2", false),
        ];

        let standard = select_models(&models, Composition::Monomer).unwrap();
        assert_eq!(
            standard.iter().map(|m| m.id()).collect::<Vec<_>>(),
            vec!["model_1", "model_2"]
        );

        let ptm = select_models(&models, Composition::Heteromer).unwrap();
        assert_eq!(ptm.iter().map(|m| m.id()).collect::<Vec<_>>(), vec!["model_1_ptm"]);
    }

    #[test]
    fn missing_model_class_is_an_error() {
        let models = vec![ConstantModel::new("model_1_ptm", true)];
        let err = match select_models(&models, Composition::Monomer) {
            Ok(_) => panic!("expected NoSuitableModels error"),
            Err(e) => e,
        };
        assert!(matches!(err, EngineError::NoSuitableModels { .. }));
    }

    #[test]
    fn every_grid_cell_produces_one_candidate() {
        let owned = vec![
            ConstantModel::new("model_1", false),
            ConstantModel::new("model_2", false),
        ];
        let models: Vec<&dyn FoldingModel> = owned.iter().map(|m| m.as_ref()).collect();
        let seeds = vec![1, 2, 3];

        let outcome = run(
            &models,
            &seeds,
            &features(),
            2,
            0.0,
            &CaRmsDeviation,
            &CancelToken::new(),
            &ProgressReporter::default(),
        )
        .unwrap();

        assert_eq!(outcome.candidates.len(), 6);
        assert!(outcome.failures.is_empty());
        assert!(!outcome.cancelled);

        // No two candidates share a (model, seed) pair.
        for (i, c) in outcome.candidates.iter().enumerate() {
            assert!(
                !outcome.candidates[..i]
                    .iter()
                    .any(|o| o.model_id == c.model_id && o.seed == c.seed)
            );
        }
    }

    #[test]
    fn one_failing_cell_does_not_abort_the_grid() {
        let failing: Box<dyn FoldingModel> = Box::new(FailForSeed { bad_seed: 2 });
        let owned = vec![failing];
        let models: Vec<&dyn FoldingModel> = owned.iter().map(|m| m.as_ref()).collect();

        let outcome = run(
            &models,
            &[1, 2, 3],
            &features(),
            1,
            0.0,
            &CaRmsDeviation,
            &CancelToken::new(),
            &ProgressReporter::default(),
        )
        .unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].seed, 2);
        assert!(outcome.failures[0].message.contains("resource exhausted"));
    }

    #[test]
    fn all_cells_failing_fails_the_job() {
        let failing: Box<dyn FoldingModel> = Box::new(FailForSeed { bad_seed: 1 });
        let owned = vec![failing];
        let models: Vec<&dyn FoldingModel> = owned.iter().map(|m| m.as_ref()).collect();

        let err = run(
            &models,
            &[1],
            &features(),
            1,
            0.0,
            &CaRmsDeviation,
            &CancelToken::new(),
            &ProgressReporter::default(),
        )
        .unwrap_err();

        assert!(matches!(err, EngineError::NoCandidates { cells: 1 }));
    }

    #[test]
    fn per_seed_convergence_schedules_yield_expected_iteration_counts() {
        use std::collections::HashMap;
        use std::sync::Mutex;

        // One Cα x-coordinate per call and seed; consecutive differences are
        // the deviations the recycle loop sees.
        struct ScheduledModel {
            schedules: HashMap<Seed, Vec<f64>>,
            calls: Mutex<HashMap<Seed, usize>>,
        }

        impl FoldingModel for ScheduledModel {
            fn id(&self) -> &str {
                "model_1"
            }
            fn supports_ptm(&self) -> bool {
                false
            }
            fn predict(
                &self,
                _features: &FeatureSet,
                _recycled: Option<&Structure>,
                seed: Seed,
            ) -> Result<Structure, ModelError> {
                let mut calls = self.calls.lock().unwrap();
                let call = calls.entry(seed).or_insert(0);
                let schedule = &self.schedules[&seed];
                let x = schedule[(*call).min(schedule.len() - 1)];
                *call += 1;
                Structure::new(vec![Point3::new(x, 0.0, 0.0)], vec![75.0])
                    .map_err(|e| ModelError::new(e.to_string()))
            }
        }

        // Deviation schedules per seed: 0.2 (converges at iteration 2),
        // 0.6/0.5 (runs to the budget of 3), 0.05 (converges at iteration 2).
        let model: Box<dyn FoldingModel> = Box::new(ScheduledModel {
            schedules: HashMap::from([
                (1, vec![0.0, 0.2, 0.3]),
                (2, vec![0.0, 0.6, 1.1]),
                (3, vec![0.0, 0.05]),
            ]),
            calls: Mutex::new(HashMap::new()),
        });
        let owned = vec![model];
        let models: Vec<&dyn FoldingModel> = owned.iter().map(|m| m.as_ref()).collect();

        let outcome = run(
            &models,
            &[1, 2, 3],
            &features(),
            3,
            0.3,
            &CaRmsDeviation,
            &CancelToken::new(),
            &ProgressReporter::default(),
        )
        .unwrap();

        let mut by_seed: Vec<(Seed, usize, StopReason)> = outcome
            .candidates
            .iter()
            .map(|c| (c.seed, c.iterations, c.stop_reason))
            .collect();
        by_seed.sort_by_key(|&(seed, _, _)| seed);

        assert_eq!(
            by_seed,
            vec![
                (1, 2, StopReason::Converged),
                (2, 3, StopReason::BudgetExhausted),
                (3, 2, StopReason::Converged),
            ]
        );
    }

    #[test]
    fn cancellation_skips_remaining_cells_but_keeps_produced_candidates() {
        struct CancellingModel {
            token: CancelToken,
        }
        impl FoldingModel for CancellingModel {
            fn id(&self) -> &str {
                "cancelling"
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
                self.token.cancel();
                Structure::new(vec![Point3::origin()], vec![60.0])
                    .map_err(|e| ModelError::new(e.to_string()))
            }
        }

        let token = CancelToken::new();
        let owned: Vec<Box<dyn FoldingModel>> = vec![Box::new(CancellingModel {
            token: token.clone(),
        })];
        let models: Vec<&dyn FoldingModel> = owned.iter().map(|m| m.as_ref()).collect();
        let seeds: Vec<Seed> = (0..32).collect();

        let outcome = run(
            &models,
            &seeds,
            &features(),
            1,
            0.0,
            &CaRmsDeviation,
            &token,
            &ProgressReporter::default(),
        )
        .unwrap();

        assert!(outcome.cancelled);
        assert!(!outcome.candidates.is_empty());
        assert!(outcome.candidates.len() + outcome.failures.len() <= seeds.len());
    }
}
