use crate::cli::FoldArgs;
use crate::config::{PartialSettings, Settings};
use crate::error::{CliError, Result};
use crate::runners::{CommandModel, CommandSearch};
use crate::utils::progress::CliProgressHandler;
use plexfold::core::io::fasta;
use plexfold::engine::cache::MsaLibrary;
use plexfold::engine::context::FoldContext;
use plexfold::engine::progress::ProgressReporter;
use plexfold::engine::recycle::CaRmsDeviation;
use plexfold::engine::runners::FoldingModel;
use plexfold::engine::sampling::CancelToken;
use plexfold::workflows;
use tracing::{info, warn};

pub fn run(args: FoldArgs) -> Result<()> {
    let partial = match &args.config {
        Some(path) => PartialSettings::from_file(path)?,
        None => PartialSettings::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial.merge_with_cli(&args)?;

    info!("Reading input records from {:?}", &args.input);
    let records = fasta::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    let job_name = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fold_job".to_string());

    let library_root = settings
        .msa_library
        .clone()
        .unwrap_or_else(|| args.output.join("msas"));
    info!("Using MSA library at {:?}", &library_root);
    let library = MsaLibrary::open(library_root);

    let models = build_models(&settings);
    let search = CommandSearch::new(settings.tools.search_command.clone());
    let cancel = CancelToken::new();

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting folding job '{}'...", job_name);
    let context = FoldContext::new(
        &settings.config,
        &library,
        &search,
        &models,
        &CaRmsDeviation,
        &cancel,
        &reporter,
    );
    let report = workflows::fold::run(&job_name, &records, &args.output, &context)?;

    if let Some(index) = report.run_version {
        println!("Prior output moved to result_{index}/.");
    }

    println!(
        "Produced {} candidate(s) over {} seed(s); {} failed cell(s).",
        report.stats.produced,
        report.seeds.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        warn!(
            model = %failure.model_id,
            seed = failure.seed,
            "Grid cell failed: {}",
            failure.message
        );
    }

    for entry in report.selection.entries() {
        let candidate = &report.candidates[entry.candidate];
        let line = format!(
            "{} seed {} (score {:.3}, {} after {} recycle(s))",
            candidate.model_id,
            candidate.seed,
            entry.score,
            candidate.stop_reason,
            candidate.iterations
        );
        match report.selection.rank_of(entry.candidate) {
            Some(1) => println!("✓ Best candidate: {line}"),
            Some(rank) => println!("  Candidate {rank}: {line}"),
            None => {}
        }
    }

    println!(
        "Summary written to {}",
        args.output.join("ranking.csv").display()
    );
    Ok(())
}

fn build_models(settings: &Settings) -> Vec<Box<dyn FoldingModel>> {
    let program = &settings.tools.model_command;
    settings
        .tools
        .models
        .iter()
        .map(|id| (id, false))
        .chain(settings.tools.ptm_models.iter().map(|id| (id, true)))
        .map(|(id, ptm)| {
            Box::new(CommandModel::new(id.as_str(), ptm, program.clone())) as Box<dyn FoldingModel>
        })
        .collect()
}
