use crate::core::io::artifacts::ArtifactKind;
use crate::core::io::fasta::{self, FastaRecord};
use crate::core::io::summary::{self, RankingRow, RunConfigSnapshot};
use crate::core::models::component::Component;
use crate::core::models::job::{Composition, Job};
use crate::core::models::seed::Seed;
use crate::engine::config::TemplatePolicy;
use crate::engine::context::FoldContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::runners::{FeatureSet, ResolvedArtifact};
use crate::engine::sampling::{self, Candidate, CellFailure};
use crate::engine::selection::{self, CandidateStats, Selection};
use crate::engine::versioning;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Subfolder receiving per-component sequence extracts for complex jobs.
const HETEROMER_DIR: &str = "heteromers";
/// Machine-readable per-candidate summary table.
const RANKING_FILE: &str = "ranking.csv";
/// Snapshot of the configuration values the run executed with.
const CONFIG_SNAPSHOT_FILE: &str = "run_config.toml";

/// Everything a finished folding job hands to the downstream relaxation and
/// report collaborators.
#[derive(Debug)]
pub struct FoldReport {
    pub job: Job,
    pub seeds: Vec<Seed>,
    /// Index of the versioned subfolder the prior run was moved into, if any.
    pub run_version: Option<u32>,
    pub resolutions: Vec<ResolvedArtifact>,
    pub candidates: Vec<Candidate>,
    pub selection: Selection,
    pub stats: CandidateStats,
    pub failures: Vec<CellFailure>,
    pub cancelled: bool,
}

/// Runs one complete folding job: input assembly, cache-aware alignment
/// resolution, output versioning, grid sampling, and candidate selection.
#[instrument(skip_all, name = "fold_workflow", fields(job = name))]
pub fn run(
    name: &str,
    records: &[FastaRecord],
    output_dir: &Path,
    context: &FoldContext,
) -> Result<FoldReport, EngineError> {
    // === Phase 0: Job assembly ===
    context.reporter.report(Progress::PhaseStart {
        name: "Job Assembly",
    });
    let job = Job::assemble(name, records)?;
    let seeds = context.config.seeds.resolve()?;
    let models = sampling::select_models(context.models, job.composition())?;
    let templates = TemplatePolicy::for_composition(job.composition());

    info!(
        composition = %job.composition(),
        components = job.components().len(),
        total_length = job.total_length(),
        seeds = seeds.len(),
        models = models.len(),
        "Job assembled."
    );
    context.reporter.report(Progress::PhaseFinish);

    // === Phase 1: Output versioning ===
    // Must complete before anything is written below the output directory;
    // a failed move aborts the run rather than mixing run generations.
    context.reporter.report(Progress::PhaseStart {
        name: "Output Versioning",
    });
    let run_version = versioning::version_existing_output(output_dir)?;
    if let Some(index) = run_version {
        context.reporter.report(Progress::Message(format!(
            "Moved prior output into result_{index}/."
        )));
    }
    context.reporter.report(Progress::PhaseFinish);

    // === Phase 2: Per-component extracts for complex jobs ===
    if job.composition() != Composition::Monomer {
        let heteromer_dir = output_dir.join(HETEROMER_DIR);
        fs::create_dir_all(&heteromer_dir).map_err(|source| EngineError::Io {
            path: heteromer_dir.clone(),
            source,
        })?;
        for component in job.components() {
            fasta::write_single_record(
                &heteromer_dir,
                component.description(),
                component.sequence(),
            )?;
        }
    }

    // === Phase 3: Alignment and template resolution ===
    context.reporter.report(Progress::PhaseStart {
        name: "Alignment Resolution",
    });
    let resolutions = resolve_alignments(&job, &templates, context)?;
    context.reporter.report(Progress::PhaseFinish);

    // === Phase 4: Feature assembly ===
    let features = FeatureSet {
        assembly_sequence: job.assembly_sequence(),
        chain_lengths: job.chain_lengths(),
        alignments: resolutions.clone(),
        retained_templates: templates.retained_templates,
    };

    // === Phase 5: Structure sampling ===
    context.reporter.report(Progress::PhaseStart {
        name: "Structure Sampling",
    });
    let grid = sampling::run(
        &models,
        &seeds,
        &features,
        context.config.recycle_budget,
        context.config.recycle_tolerance,
        context.metric,
        context.cancel,
        context.reporter,
    )?;
    context.reporter.report(Progress::PhaseFinish);

    // === Phase 6: Candidate selection ===
    context.reporter.report(Progress::PhaseStart {
        name: "Candidate Selection",
    });
    let focus = context.config.focus_region;
    let selection = selection::select(
        &grid.candidates,
        focus.as_ref(),
        context.config.max_candidates,
    );
    let stats = selection::statistics(&grid.candidates, focus.as_ref()).ok_or_else(|| {
        EngineError::Internal("statistics missing for a non-empty candidate set".to_string())
    })?;
    context.reporter.report(Progress::PhaseFinish);

    // === Phase 7: Run summary ===
    context.reporter.report(Progress::PhaseStart {
        name: "Run Summary",
    });
    write_summaries(
        output_dir,
        &job,
        &seeds,
        &models.iter().map(|m| m.id().to_string()).collect::<Vec<_>>(),
        &grid.candidates,
        &selection,
        context,
    )?;
    context.reporter.report(Progress::PhaseFinish);

    info!(
        produced = grid.candidates.len(),
        selected = selection.len(),
        failed = grid.failures.len(),
        "Folding job complete."
    );

    Ok(FoldReport {
        job,
        seeds,
        run_version,
        resolutions,
        candidates: grid.candidates,
        selection,
        stats,
        failures: grid.failures,
        cancelled: grid.cancelled,
    })
}

/// Resolves every requested artifact per searchable component: a structurally
/// valid library entry is reused, anything else triggers the external search
/// and an atomic publish back into the namespace.
fn resolve_alignments(
    job: &Job,
    templates: &TemplatePolicy,
    context: &FoldContext,
) -> Result<Vec<ResolvedArtifact>, EngineError> {
    let kinds = context.config.database_preset.requested_artifacts();
    let mut resolutions = Vec::new();

    for component in job.components() {
        if component.is_peptide() {
            info!(component = component.description(), "Skipping searches for peptide.");
            continue;
        }
        context.reporter.report(Progress::Message(format!(
            "Resolving alignments and templates for {}",
            component.description()
        )));

        for &kind in kinds {
            let resolution = match context.library.resolve(component.description(), kind) {
                Some(path) => {
                    info!(
                        component = component.description(),
                        ?kind,
                        "Reusing library artifact."
                    );
                    let content =
                        fs::read_to_string(&path).map_err(|source| EngineError::Io {
                            path: path.clone(),
                            source,
                        })?;
                    ResolvedArtifact {
                        component: component.description().to_string(),
                        kind,
                        path,
                        from_cache: true,
                        alignment_depth: kind.alignment_depth(&content),
                    }
                }
                None => run_search(component, kind, templates, context)?,
            };
            resolutions.push(resolution);
        }
    }

    Ok(resolutions)
}

fn run_search(
    component: &Component,
    kind: ArtifactKind,
    templates: &TemplatePolicy,
    context: &FoldContext,
) -> Result<ResolvedArtifact, EngineError> {
    let hit_cap = context.config.database_preset.search_hit_cap(kind, templates);
    info!(
        component = component.description(),
        ?kind,
        hit_cap,
        "Cache miss; invoking external search."
    );

    let content = context
        .search
        .search(component, kind, hit_cap)
        .map_err(|e| EngineError::Search {
            component: component.description().to_string(),
            kind,
            message: e.to_string(),
        })?;

    if !kind.is_well_formed(&content) {
        warn!(
            component = component.description(),
            ?kind,
            "Search returned an artifact without the expected format marker."
        );
    }

    let path = context
        .library
        .publish(component.description(), kind, &content)
        .map_err(|source| EngineError::CachePublish {
            component: component.description().to_string(),
            kind,
            source,
        })?;

    Ok(ResolvedArtifact {
        component: component.description().to_string(),
        kind,
        path,
        from_cache: false,
        alignment_depth: kind.alignment_depth(&content),
    })
}

fn write_summaries(
    output_dir: &Path,
    job: &Job,
    seeds: &[Seed],
    model_ids: &[String],
    candidates: &[Candidate],
    selection: &Selection,
    context: &FoldContext,
) -> Result<(), EngineError> {
    let focus = context.config.focus_region;
    let rows: Vec<RankingRow> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let rank = selection.rank_of(index);
            RankingRow {
                model: candidate.model_id.clone(),
                seed: candidate.seed,
                score: selection::score(candidate, focus.as_ref()),
                iterations: candidate.iterations,
                stop_reason: candidate.stop_reason.to_string(),
                duration_ms: candidate.duration.as_millis() as u64,
                selected: rank.is_some(),
                rank,
            }
        })
        .collect();
    summary::write_ranking(&output_dir.join(RANKING_FILE), &rows)?;

    let snapshot = RunConfigSnapshot {
        job: job.name().to_string(),
        composition: job.composition().to_string(),
        database_preset: context.config.database_preset.to_string(),
        recycle_budget: context.config.recycle_budget,
        recycle_tolerance: context.config.recycle_tolerance,
        seeds: seeds.to_vec(),
        models: model_ids.to_vec(),
        focus_region: focus.map(|r| [r.start(), r.end()]),
        max_candidates: context.config.max_candidates,
    };
    summary::write_config_snapshot(&output_dir.join(CONFIG_SNAPSHOT_FILE), &snapshot)?;
    Ok(())
}
