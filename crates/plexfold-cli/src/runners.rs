use plexfold::core::io::artifacts::ArtifactKind;
use plexfold::core::io::fasta;
use plexfold::core::models::component::Component;
use plexfold::core::models::seed::Seed;
use plexfold::core::models::structure::Structure;
use nalgebra::Point3;
use plexfold::engine::runners::{
    AlignmentSearch, FeatureSet, FoldingModel, ModelError, SearchError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// One Cα record in the structure exchange format. The optional pTM column is
/// populated (identically on every row) only by pTM-capable models.
#[derive(Debug, Serialize, Deserialize)]
struct CaRecord {
    x: f64,
    y: f64,
    z: f64,
    plddt: f64,
    ptm: Option<f64>,
}

/// Adapter invoking the external search-tool executable.
///
/// Invocation contract: `<program> <query.fa> <kind> <max-hits>`, artifact
/// text on stdout, non-zero exit on failure.
pub struct CommandSearch {
    program: Option<PathBuf>,
}

impl CommandSearch {
    pub fn new(program: Option<PathBuf>) -> Self {
        Self { program }
    }
}

impl AlignmentSearch for CommandSearch {
    fn search(
        &self,
        component: &Component,
        kind: ArtifactKind,
        hit_cap: usize,
    ) -> Result<String, SearchError> {
        let Some(program) = &self.program else {
            return Err(SearchError::new(
                "no search tool configured (set tools.search-command or pass --search-command)",
            ));
        };

        let workdir = tempfile::tempdir()?;
        let query = fasta::write_single_record(
            workdir.path(),
            component.description(),
            component.sequence(),
        )
        .map_err(|e| SearchError::new(e.to_string()))?;

        debug!(
            program = %program.display(),
            component = component.description(),
            ?kind,
            hit_cap,
            "Invoking external search tool."
        );
        let output = Command::new(program)
            .arg(&query)
            .arg(kind_label(kind))
            .arg(hit_cap.to_string())
            .output()?;

        if !output.status.success() {
            return Err(SearchError::new(format!(
                "search tool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Adapter invoking the external folding-model executable for one model id.
///
/// Invocation contract:
/// `<program> --model <id> --seed <seed> --features <query.fa> --output <ca.csv> [--recycled <prev.csv>]`,
/// with the structure estimate written as [`CaRecord`] rows.
pub struct CommandModel {
    id: String,
    ptm: bool,
    program: PathBuf,
}

impl CommandModel {
    pub fn new(id: impl Into<String>, ptm: bool, program: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            ptm,
            program: program.into(),
        }
    }
}

impl FoldingModel for CommandModel {
    fn id(&self) -> &str {
        &self.id
    }

    fn supports_ptm(&self) -> bool {
        self.ptm
    }

    fn predict(
        &self,
        features: &FeatureSet,
        recycled: Option<&Structure>,
        seed: Seed,
    ) -> Result<Structure, ModelError> {
        let workdir = tempfile::tempdir()?;
        let query = fasta::write_single_record(
            workdir.path(),
            "assembly",
            &features.assembly_sequence,
        )
        .map_err(|e| ModelError::new(e.to_string()))?;
        let output_path = workdir.path().join("ca.csv");

        let mut command = Command::new(&self.program);
        command
            .arg("--model")
            .arg(&self.id)
            .arg("--seed")
            .arg(seed.to_string())
            .arg("--features")
            .arg(&query)
            .arg("--output")
            .arg(&output_path);

        if let Some(previous) = recycled {
            let recycled_path = workdir.path().join("recycled.csv");
            write_structure_csv(&recycled_path, previous).map_err(|e| ModelError::new(e.to_string()))?;
            command.arg("--recycled").arg(&recycled_path);
        }

        debug!(model = self.id, seed, "Invoking external folding model.");
        let output = command.output()?;
        if !output.status.success() {
            return Err(ModelError::new(format!(
                "model exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        read_structure_csv(&output_path).map_err(|e| ModelError::new(e.to_string()))
    }
}

fn kind_label(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Uniref90 => "uniref90",
        ArtifactKind::Mgnify => "mgnify",
        ArtifactKind::SmallBfd => "small_bfd",
        ArtifactKind::BfdUniclust => "bfd_uniclust",
        ArtifactKind::Pdb70Templates => "pdb70",
    }
}

fn write_structure_csv(path: &Path, structure: &Structure) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for (position, &plddt) in structure.ca_positions().iter().zip(structure.plddt()) {
        writer.serialize(CaRecord {
            x: position.x,
            y: position.y,
            z: position.z,
            plddt,
            ptm: structure.ptm(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn read_structure_csv(path: &Path) -> anyhow::Result<Structure> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut positions = Vec::new();
    let mut plddt = Vec::new();
    let mut ptm = None;

    for record in reader.deserialize() {
        let record: CaRecord = record?;
        positions.push(Point3::new(record.x, record.y, record.z));
        plddt.push(record.plddt);
        if ptm.is_none() {
            ptm = record.ptm;
        }
    }

    let structure = Structure::new(positions, plddt)?;
    Ok(match ptm {
        Some(value) => structure.with_ptm(value),
        None => structure,
    })
}
